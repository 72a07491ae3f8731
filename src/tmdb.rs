use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::TmdbConfig;
use crate::discover::DiscoverQuery;
use crate::error::{ToolError, ToolResult};

/// Read-only capabilities of the movie catalog used by the tool layer.
///
/// Every call is one round trip and may fail; every field of the returned
/// shapes may be missing upstream.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn movie_genres(&self) -> ToolResult<Vec<TmdbGenre>>;
    async fn search_person(&self, name: &str) -> ToolResult<Vec<TmdbPerson>>;
    async fn search_movie(&self, title: &str, year: Option<i32>) -> ToolResult<Vec<TmdbMovieSummary>>;
    async fn movie_external_ids(&self, id: i32) -> ToolResult<TmdbExternalIds>;
    async fn movie(&self, id: i32) -> ToolResult<TmdbMovieDetail>;
    async fn movie_videos(&self, id: i32) -> ToolResult<Vec<TmdbVideo>>;
    async fn movie_credits(&self, id: i32) -> ToolResult<TmdbCredits>;
    async fn search_keyword(&self, term: &str) -> ToolResult<Vec<TmdbKeyword>>;
    async fn discover_movies(&self, query: &DiscoverQuery) -> ToolResult<Vec<TmdbMovieSummary>>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> anyhow::Result<Self> {
        let user_agent = format!("movie_desk/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        })
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}{}?api_key={}", self.base_url, path, self.api_key);
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> ToolResult<T> {
        debug!(path = %path, "TMDB request");
        let res = self
            .client
            .get(self.url(path, params))
            .send()
            .await
            .map_err(|e| ToolError::service(format!("{path}: request failed: {}", e.without_url())))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| ToolError::service(format!("{path}: reading body failed: {}", e.without_url())))?;
        match status {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(ToolError::NotFound(path.to_string())),
            StatusCode::UNAUTHORIZED => {
                return Err(ToolError::service(format!("{path}: authentication failed")))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(ToolError::service(format!("{path}: rate limited")))
            }
            s => return Err(ToolError::service(format!("{path} -> {s}: {text}"))),
        }
        serde_json::from_str(&text)
            .map_err(|e| ToolError::service(format!("{path}: JSON parse failed: {e}")))
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn movie_genres(&self) -> ToolResult<Vec<TmdbGenre>> {
        #[derive(Deserialize)]
        struct GenreList {
            #[serde(default)]
            genres: Vec<TmdbGenre>,
        }
        let data: GenreList = self
            .get_json("/genre/movie/list", &[("language", "en-US".to_string())])
            .await?;
        Ok(data.genres)
    }

    async fn search_person(&self, name: &str) -> ToolResult<Vec<TmdbPerson>> {
        let params = [
            ("query", name.to_string()),
            ("include_adult", "false".to_string()),
            ("language", "en-US".to_string()),
        ];
        let data: Paged<TmdbPerson> = self.get_json("/search/person", &params).await?;
        Ok(data.results)
    }

    async fn search_movie(&self, title: &str, year: Option<i32>) -> ToolResult<Vec<TmdbMovieSummary>> {
        let mut params = vec![("query", title.to_string())];
        if let Some(year) = year {
            params.push(("year", year.to_string()));
        }
        let data: Paged<TmdbMovieSummary> = self.get_json("/search/movie", &params).await?;
        Ok(data.results)
    }

    async fn movie_external_ids(&self, id: i32) -> ToolResult<TmdbExternalIds> {
        self.get_json(&format!("/movie/{id}/external_ids"), &[]).await
    }

    async fn movie(&self, id: i32) -> ToolResult<TmdbMovieDetail> {
        self.get_json(&format!("/movie/{id}"), &[("language", "en-US".to_string())])
            .await
    }

    async fn movie_videos(&self, id: i32) -> ToolResult<Vec<TmdbVideo>> {
        let data: Paged<TmdbVideo> = self.get_json(&format!("/movie/{id}/videos"), &[]).await?;
        Ok(data.results)
    }

    async fn movie_credits(&self, id: i32) -> ToolResult<TmdbCredits> {
        self.get_json(&format!("/movie/{id}/credits"), &[]).await
    }

    async fn search_keyword(&self, term: &str) -> ToolResult<Vec<TmdbKeyword>> {
        let data: Paged<TmdbKeyword> = self
            .get_json("/search/keyword", &[("query", term.to_string())])
            .await?;
        Ok(data.results)
    }

    async fn discover_movies(&self, query: &DiscoverQuery) -> ToolResult<Vec<TmdbMovieSummary>> {
        let data: Paged<TmdbMovieSummary> = self
            .get_json("/discover/movie", &query.params())
            .await?;
        Ok(data.results)
    }
}

#[derive(Debug, Deserialize)]
struct Paged<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbGenre {
    pub id: i32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbPerson {
    pub id: i32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbMovieSummary {
    pub id: i32,
    #[serde(default)]
    pub title: String,
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbExternalIds {
    pub imdb_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbMovieDetail {
    pub id: i32,
    #[serde(default)]
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    pub runtime: Option<i32>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub imdb_id: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub tagline: Option<String>,
    pub original_language: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbVideo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub site: String,
    #[serde(rename = "type", default)]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbCastMember {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbKeyword {
    pub id: i32,
    #[serde(default)]
    pub name: String,
}
