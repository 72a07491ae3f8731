//! Video classification for trailer lookups.

use serde::Serialize;

use crate::normalize::release_year;
use crate::tmdb::{TmdbMovieDetail, TmdbVideo};

pub const SUPPORTED_SITE: &str = "YouTube";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VideoKind {
    Trailer,
    Teaser,
    Clip,
    #[serde(rename = "Behind the Scenes")]
    BehindTheScenes,
    Featurette,
    Other,
}

impl VideoKind {
    pub fn from_catalog(raw: &str) -> Self {
        match raw {
            "Trailer" => VideoKind::Trailer,
            "Teaser" => VideoKind::Teaser,
            "Clip" => VideoKind::Clip,
            "Behind the Scenes" => VideoKind::BehindTheScenes,
            "Featurette" => VideoKind::Featurette,
            _ => VideoKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Video {
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: VideoKind,
    pub key: String,
    #[serde(rename = "YouTubeUrl")]
    pub youtube_url: String,
    pub embed_url: String,
    pub thumbnail_url: String,
    pub official: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VideosByType {
    pub trailers: Vec<Video>,
    pub teasers: Vec<Video>,
    pub clips: Vec<Video>,
    pub behind_the_scenes: Vec<Video>,
    pub featurettes: Vec<Video>,
    pub other: Vec<Video>,
}

impl VideosByType {
    pub fn total(&self) -> usize {
        self.trailers.len()
            + self.teasers.len()
            + self.clips.len()
            + self.behind_the_scenes.len()
            + self.featurettes.len()
            + self.other.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VideoBundle {
    pub movie_title: String,
    pub movie_year: Option<i32>,
    pub total_video_count: usize,
    pub main_trailer: Option<Video>,
    pub videos: VideosByType,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InlineTrailer {
    pub has_trailer: bool,
    pub name: String,
    #[serde(rename = "YouTubeUrl")]
    pub youtube_url: String,
    pub embed_url: String,
    pub thumbnail_url: String,
    pub display_inline: bool,
    pub allow_full_screen: bool,
}

impl InlineTrailer {
    fn none() -> Self {
        Self {
            has_trailer: false,
            name: "No trailer available".to_string(),
            youtube_url: String::new(),
            embed_url: String::new(),
            thumbnail_url: String::new(),
            display_inline: false,
            allow_full_screen: false,
        }
    }
}

pub const INLINE_DISPLAY_TYPE: &str = "movie-with-inline-trailer";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MovieWithTrailer {
    pub movie_id: String,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub imdb_id: String,
    pub display_type: &'static str,
    pub trailer: InlineTrailer,
    pub chat_message: &'static str,
}

pub fn watch_url(key: &str) -> String {
    format!("https://www.youtube.com/watch?v={key}")
}

pub fn embed_url(key: &str) -> String {
    format!("https://www.youtube.com/embed/{key}")
}

pub fn thumbnail_url(key: &str) -> String {
    format!("https://img.youtube.com/vi/{key}/maxresdefault.jpg")
}

fn on_supported_site(v: &TmdbVideo) -> bool {
    v.site.eq_ignore_ascii_case(SUPPORTED_SITE)
}

/// Drops videos hosted elsewhere, keeping catalog order.
pub fn playable_videos(raw: &[TmdbVideo]) -> Vec<Video> {
    raw.iter()
        .filter(|v| on_supported_site(v))
        .map(|v| Video {
            name: v.name.clone(),
            kind: VideoKind::from_catalog(&v.video_type),
            key: v.key.clone(),
            youtube_url: watch_url(&v.key),
            embed_url: embed_url(&v.key),
            thumbnail_url: thumbnail_url(&v.key),
            official: v.official,
        })
        .collect()
}

pub fn classify(videos: &[Video]) -> VideosByType {
    let mut buckets = VideosByType::default();
    for v in videos {
        let bucket = match v.kind {
            VideoKind::Trailer => &mut buckets.trailers,
            VideoKind::Teaser => &mut buckets.teasers,
            VideoKind::Clip => &mut buckets.clips,
            VideoKind::BehindTheScenes => &mut buckets.behind_the_scenes,
            VideoKind::Featurette => &mut buckets.featurettes,
            VideoKind::Other => &mut buckets.other,
        };
        bucket.push(v.clone());
    }
    buckets
}

/// First official trailer, else first trailer, else first video of any kind.
pub fn select_main_video(videos: &[Video]) -> Option<&Video> {
    let mut trailers = videos.iter().filter(|v| v.kind == VideoKind::Trailer);
    videos
        .iter()
        .find(|v| v.kind == VideoKind::Trailer && v.official)
        .or_else(|| trailers.next())
        .or_else(|| videos.first())
}

pub fn video_bundle(detail: &TmdbMovieDetail, raw: &[TmdbVideo]) -> VideoBundle {
    let videos = playable_videos(raw);
    let buckets = classify(&videos);
    let summary = if videos.is_empty() {
        format!("No video content available for {}", detail.title)
    } else {
        format!(
            "Found {} video(s) for {} including trailers, clips, and behind-the-scenes content",
            videos.len(),
            detail.title
        )
    };
    VideoBundle {
        movie_title: detail.title.clone(),
        movie_year: release_year(detail.release_date.as_deref()),
        total_video_count: videos.len(),
        main_trailer: select_main_video(&videos).cloned(),
        videos: buckets,
        summary,
    }
}

/// At most one trailer: official ones first, then any trailer.
pub fn inline_trailer(raw: &[TmdbVideo]) -> Option<&TmdbVideo> {
    let mut trailers = raw
        .iter()
        .filter(|v| on_supported_site(v) && v.video_type == "Trailer");
    raw.iter()
        .find(|v| on_supported_site(v) && v.video_type == "Trailer" && v.official)
        .or_else(|| trailers.next())
}

pub fn movie_with_trailer(
    movie_id: i32,
    detail: &TmdbMovieDetail,
    raw: &[TmdbVideo],
) -> MovieWithTrailer {
    let chosen = inline_trailer(raw);
    let chat_message = if chosen.is_some() {
        "Here's the movie info with trailer - tap to watch full screen!"
    } else {
        "Here's the movie info (no trailer available)"
    };
    let trailer = chosen
        .map(|v| InlineTrailer {
            has_trailer: true,
            name: v.name.clone(),
            youtube_url: watch_url(&v.key),
            embed_url: embed_url(&v.key),
            thumbnail_url: thumbnail_url(&v.key),
            display_inline: true,
            allow_full_screen: true,
        })
        .unwrap_or_else(InlineTrailer::none);

    MovieWithTrailer {
        movie_id: movie_id.to_string(),
        title: detail.title.clone(),
        overview: detail.overview.clone(),
        release_date: crate::normalize::iso_date(detail.release_date.as_deref()),
        imdb_id: detail.imdb_id.clone().unwrap_or_default(),
        display_type: INLINE_DISPLAY_TYPE,
        trailer,
        chat_message,
    }
}
