use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::discover::{DiscoverArgs, DiscoveryFilter};
use crate::error::{ToolError, ToolResult};
use crate::normalize::{self, MovieSearchResult};
use crate::tmdb::{TmdbApi, TmdbMovieSummary};
use crate::videos;

/// Year value the agent sends when it has no year in mind. Treated as "no filter",
/// as is any string that does not parse as an integer.
pub const UNFILTERED_YEAR: i32 = 0;

/// Movie lookups exposed to the agent. Every operation returns one JSON string.
#[derive(Clone)]
pub struct MovieTools {
    tmdb: Arc<dyn TmdbApi>,
}

impl MovieTools {
    pub fn new(tmdb: Arc<dyn TmdbApi>) -> Self {
        Self { tmdb }
    }

    pub async fn get_genres_list(&self) -> ToolResult<String> {
        let genres = self.tmdb.movie_genres().await?;
        compact(&genres.iter().map(normalize::genre).collect::<Vec<_>>())
    }

    pub async fn search_for_people(&self, person_name: &str) -> ToolResult<String> {
        let name = person_name.trim();
        if name.is_empty() {
            return Err(ToolError::validation("personName must not be blank"));
        }
        let people = self.tmdb.search_person(name).await?;
        compact(&people.iter().map(normalize::person).collect::<Vec<_>>())
    }

    pub async fn search_movies(
        &self,
        movie_title: &str,
        release_year: Option<&str>,
    ) -> ToolResult<String> {
        let year = year_filter(release_year);
        let found = self.tmdb.search_movie(movie_title, year).await?;
        debug!(title = %movie_title, ?year, results = found.len(), "movie search");
        compact(&self.with_external_ids(&found).await?)
    }

    pub async fn get_movie_trailers(&self, movie_id: &str) -> ToolResult<String> {
        let id = parse_movie_id(movie_id)?;
        let raw = self.tmdb.movie_videos(id).await?;
        let detail = self.tmdb.movie(id).await?;
        compact(&videos::video_bundle(&detail, &raw))
    }

    pub async fn get_movie_with_trailer(&self, movie_id: &str) -> ToolResult<String> {
        let id = parse_movie_id(movie_id)?;
        let detail = self.tmdb.movie(id).await?;
        let raw = self.tmdb.movie_videos(id).await?;
        compact(&videos::movie_with_trailer(id, &detail, &raw))
    }

    /// Used when the agent cannot tell which movie the user means. Never calls out.
    pub fn handle_generic_trailer_request(&self, user_query: &str) -> ToolResult<String> {
        debug!(query = %user_query, "trailer request without a movie");
        compact(&json!({
            "Type": "clarification-needed",
            "Message": "I'd be happy to show you a trailer! Which movie are you interested in?",
            "Suggestions": [
                "Try: 'Show me the Inception trailer'",
                "Or: 'Play the Batman trailer'",
                "Or: 'Trailer for Top Gun Maverick'"
            ],
            "FollowUp": "Just tell me the movie name and I'll find the trailer for you!"
        }))
    }

    pub async fn get_movie_details(&self, movie_id: &str) -> ToolResult<String> {
        let id = parse_movie_id(movie_id)?;
        let detail = self.tmdb.movie(id).await?;
        compact(&normalize::movie_details(id, &detail))
    }

    pub async fn search_keywords(&self, keyword: &str) -> ToolResult<String> {
        let keywords = self.tmdb.search_keyword(keyword).await?;
        compact(&keywords.iter().map(normalize::keyword).collect::<Vec<_>>())
    }

    /// Indented output, unlike every other tool.
    pub async fn describe_movie(&self, movie_id: &str) -> ToolResult<String> {
        let id = parse_movie_id(movie_id)?;
        let detail = self.tmdb.movie(id).await?;
        let credits = match self.tmdb.movie_credits(detail.id).await {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("Credits unavailable for movie {}: {}", id, e);
                None
            }
        };
        let description = normalize::movie_description(id, &detail, credits.as_ref());
        Ok(serde_json::to_string_pretty(&description)?)
    }

    pub async fn discover_movies(&self, args: &DiscoverArgs) -> ToolResult<String> {
        let filter = DiscoveryFilter::from_args(args)?;
        let query = filter.to_query();
        let found = self.tmdb.discover_movies(&query).await?;
        debug!(filters = query.params().len(), results = found.len(), "movie discovery");
        compact(&self.with_external_ids(&found).await?)
    }

    /// One cross-reference lookup per result, in result order. Any failure fails the call.
    async fn with_external_ids(
        &self,
        movies: &[TmdbMovieSummary],
    ) -> ToolResult<Vec<MovieSearchResult>> {
        let mut out = Vec::with_capacity(movies.len());
        for movie in movies {
            let ids = self.tmdb.movie_external_ids(movie.id).await?;
            out.push(normalize::search_result(movie, &ids));
        }
        Ok(out)
    }
}

fn compact<T: Serialize + ?Sized>(value: &T) -> ToolResult<String> {
    Ok(serde_json::to_string(value)?)
}

pub fn parse_movie_id(raw: &str) -> ToolResult<i32> {
    raw.trim()
        .parse()
        .map_err(|_| ToolError::validation(format!("movieId '{raw}' is not a numeric id")))
}

/// `None`, blank, unparsable and `"0"` all mean "any year".
pub fn year_filter(raw: Option<&str>) -> Option<i32> {
    raw.and_then(|s| s.trim().parse::<i32>().ok())
        .filter(|y| *y != UNFILTERED_YEAR)
}
