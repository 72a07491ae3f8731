//! Explicit tool registry handed to the agent runtime.
//!
//! Built once at startup: every entry carries its stable name, a description
//! for the model, a JSON schema for its parameters and the handler itself.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::future::{ready, Future};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::datetime_tools::DateTimeTools;
use crate::discover::DiscoverArgs;
use crate::error::{ToolError, ToolResult};
use crate::movie_tools::MovieTools;

pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult<String>> + Send>>;
type Handler = Arc<dyn Fn(Value) -> ToolFuture + Send + Sync>;

#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

struct ToolEntry {
    spec: ToolSpec,
    handler: Handler,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolEntry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&mut self, name: &str, description: &str, parameters: Value, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult<String>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |args| Box::pin(handler(args)) as ToolFuture);
        self.tools.insert(
            name.to_string(),
            ToolEntry {
                spec: ToolSpec {
                    name: name.to_string(),
                    description: description.to_string(),
                    parameters,
                },
                handler,
            },
        );
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|t| t.spec.clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// `arguments` is the raw JSON object text the model produced; blank means `{}`.
    pub async fn call(&self, name: &str, arguments: &str) -> ToolResult<String> {
        let entry = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::validation(format!("unknown tool '{name}'")))?;
        let args = if arguments.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(arguments).map_err(|e| {
                ToolError::validation(format!("arguments for '{name}' are not valid JSON: {e}"))
            })?
        };
        if !args.is_object() {
            return Err(ToolError::validation(format!(
                "arguments for '{name}' must be a JSON object"
            )));
        }

        let handler = entry.handler.clone();
        let result = handler(args).await;
        match &result {
            Ok(out) => debug!(tool = %name, bytes = out.len(), "tool call succeeded"),
            Err(e) => warn!(tool = %name, kind = e.kind(), "tool call failed: {}", e),
        }
        result
    }
}

/// Typed accessors over a JSON argument object. Numbers may arrive as strings
/// and strings as numbers; both are accepted.
struct Args<'a>(&'a Value);

impl<'a> Args<'a> {
    fn raw(&self, key: &str) -> Option<&'a Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    fn optional_str(&self, key: &str) -> ToolResult<Option<String>> {
        match self.raw(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(ToolError::validation(format!(
                "{key} must be a string, got {other}"
            ))),
        }
    }

    fn required_str(&self, key: &str) -> ToolResult<String> {
        self.optional_str(key)?
            .ok_or_else(|| ToolError::validation(format!("missing required argument {key}")))
    }

    fn optional_i64(&self, key: &str) -> ToolResult<Option<i64>> {
        match self.raw(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| ToolError::validation(format!("{key} must be an integer"))),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ToolError::validation(format!("{key} must be an integer, got '{s}'"))),
            Some(other) => Err(ToolError::validation(format!(
                "{key} must be an integer, got {other}"
            ))),
        }
    }

    fn required_i32(&self, key: &str) -> ToolResult<i32> {
        let value = self
            .optional_i64(key)?
            .ok_or_else(|| ToolError::validation(format!("missing required argument {key}")))?;
        i32::try_from(value).map_err(|_| ToolError::validation(format!("{key} is out of range")))
    }

    fn optional_f64(&self, key: &str) -> ToolResult<Option<f64>> {
        match self.raw(key) {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ToolError::validation(format!("{key} must be a number, got '{s}'"))),
            Some(other) => Err(ToolError::validation(format!(
                "{key} must be a number, got {other}"
            ))),
        }
    }
}

fn string_param(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn nullable(kind: &str, description: &str) -> Value {
    json!({ "type": [kind, "null"], "description": description })
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn no_params() -> Value {
    object(json!({}), &[])
}

pub fn build_registry(movies: MovieTools, dates: DateTimeTools) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_date_tools(&mut registry, dates);
    register_movie_tools(&mut registry, movies);
    registry
}

fn register_date_tools(registry: &mut ToolRegistry, dates: DateTimeTools) {
    let d = dates.clone();
    registry.register(
        "today",
        "Today in ISO format (YYYY-MM-DD)",
        no_params(),
        move |_| ready(Ok(d.today())),
    );
    let d = dates.clone();
    registry.register(
        "this_month",
        "This month in ISO format (YYYY-MM)",
        no_params(),
        move |_| ready(Ok(d.this_month())),
    );
    let d = dates.clone();
    registry.register(
        "this_year",
        "This year in ISO format (YYYY)",
        no_params(),
        move |_| ready(Ok(d.this_year())),
    );

    let d = dates.clone();
    registry.register(
        "past_years_range",
        "ISO-8601 interval for the past <years> years up to today. Example: past_years_range(3) -> 2022-06-13/2025-06-13",
        object(
            json!({ "years": { "type": "integer", "description": "Number of years to look back (e.g. 3 = last three years)" } }),
            &["years"],
        ),
        move |args| ready(Args(&args).required_i32("years").and_then(|n| d.past_years_range(n))),
    );
    let d = dates.clone();
    registry.register(
        "past_months_range",
        "ISO-8601 interval for the past <months> months up to today. Example: past_months_range(6) -> 2024-12-13/2025-06-13",
        object(
            json!({ "months": { "type": "integer", "description": "Number of months to look back" } }),
            &["months"],
        ),
        move |args| ready(Args(&args).required_i32("months").and_then(|n| d.past_months_range(n))),
    );
    let d = dates.clone();
    registry.register(
        "past_days_range",
        "ISO-8601 interval for the past <days> days up to today.",
        object(
            json!({ "days": { "type": "integer", "description": "Number of days to look back" } }),
            &["days"],
        ),
        move |args| ready(Args(&args).required_i32("days").and_then(|n| d.past_days_range(n))),
    );

    registry.register(
        "offset_date",
        "Offset any ISO date (YYYY-MM-DD) by N units. Units = d, m, y. Example: offset_date(\"2022-05-20\", 10, \"d\")",
        object(
            json!({
                "isoDate": string_param("The date to shift (YYYY-MM-DD)"),
                "amount": { "type": "integer", "description": "Number of units to shift by, negative to go back" },
                "unit": { "type": "string", "enum": ["d", "m", "y"], "description": "Unit (d=days, m=months, y=years)" }
            }),
            &["isoDate", "amount", "unit"],
        ),
        move |args| ready(offset_date(&dates, &args)),
    );
}

fn offset_date(dates: &DateTimeTools, args: &Value) -> ToolResult<String> {
    let a = Args(args);
    let iso_date = a.required_str("isoDate")?;
    let amount = a.required_i32("amount")?;
    let unit = a.required_str("unit")?;
    dates.offset_date(&iso_date, amount, &unit)
}

fn register_movie_tools(registry: &mut ToolRegistry, movies: MovieTools) {
    let m = movies.clone();
    registry.register(
        "get_genres_list",
        "Get the list of official genres for movies. Returns a JSON list with GenreId and GenreName.",
        no_params(),
        move |_| {
            let m = m.clone();
            async move { m.get_genres_list().await }
        },
    );

    let m = movies.clone();
    registry.register(
        "search_for_people",
        "Search for people / cast by their name and also known as names. Returns a JSON list with PersonId and PersonName.",
        object(
            json!({ "personName": string_param("The name of the person or cast member") }),
            &["personName"],
        ),
        move |args| search_for_people(m.clone(), args),
    );

    let m = movies.clone();
    registry.register(
        "search_movies",
        "Search for movies by their title and release year. You can search by movie name or part of a movie name. Returns a JSON list with MovieId, MovieName, ReleaseDate and ImdbId.",
        object(
            json!({
                "movieTitle": string_param("The title of the movie, or part of the title"),
                "releaseYear": nullable("string", "Optional: The year the movie was released")
            }),
            &["movieTitle"],
        ),
        move |args| search_movies(m.clone(), args),
    );

    let movie_id_only = || {
        object(
            json!({ "movieId": string_param("The TMDb movie ID") }),
            &["movieId"],
        )
    };

    let m = movies.clone();
    registry.register(
        "get_movie_trailers",
        "Get movie trailers, teasers, video clips, behind-the-scenes content and featurettes for a specific movie. Use this when users ask to 'show trailer', 'play trailer', 'watch video', 'preview movie', 'see teaser' or any video-related request for a movie.",
        movie_id_only(),
        move |args| by_movie_id(m.clone(), args, MovieIdTool::Trailers),
    );

    let m = movies.clone();
    registry.register(
        "get_movie_with_trailer",
        "Get movie information with a trailer included for inline chat display. Use when users ask to 'show movie', 'tell me about movie', or want general movie info that should include a trailer preview.",
        movie_id_only(),
        move |args| by_movie_id(m.clone(), args, MovieIdTool::WithTrailer),
    );

    let m = movies.clone();
    registry.register(
        "handle_generic_trailer_request",
        "Handle generic video/trailer requests when context is unclear, e.g. 'trailer please', 'play trailer', 'movie trailer?' with no specific movie mentioned. Returns a clarification request.",
        object(
            json!({ "userQuery": string_param("The user's generic trailer request") }),
            &["userQuery"],
        ),
        move |args| {
            let query = Args(&args).required_str("userQuery");
            ready(query.and_then(|q| m.handle_generic_trailer_request(&q)))
        },
    );

    let m = movies.clone();
    registry.register(
        "get_movie_details",
        "Get detailed information about a specific movie by its ID: title, overview, release date, genres, runtime, votes and ImdbId.",
        object(
            json!({ "movieId": string_param("The ID of the movie") }),
            &["movieId"],
        ),
        move |args| by_movie_id(m.clone(), args, MovieIdTool::Details),
    );

    let m = movies.clone();
    registry.register(
        "search_keywords",
        "Search for keywords related to movies. Returns a JSON list with KeywordId and Name.",
        object(
            json!({ "keyword": string_param("The name or partial name of the keyword") }),
            &["keyword"],
        ),
        move |args| search_keywords(m.clone(), args),
    );

    let m = movies.clone();
    registry.register(
        "describe_movie",
        "Returns detailed information about a specific movie, including tagline, language, top cast and ImdbId, as indented JSON.",
        object(
            json!({ "movieId": string_param("The movie ID of a specific movie") }),
            &["movieId"],
        ),
        move |args| by_movie_id(m.clone(), args, MovieIdTool::Describe),
    );

    registry.register(
        "discover_movies",
        "Discover movies based on optional filters; all supplied filters must match. Returns a JSON list with MovieId, MovieName, ReleaseDate and ImdbId.",
        object(
            json!({
                "releaseDateFrom": nullable("string", "Optional: Start release date (YYYY-MM-DD)"),
                "releaseDateTo": nullable("string", "Optional: End release date (YYYY-MM-DD)"),
                "castIds": nullable("string", "Optional: Include movies with all of these cast IDs (comma-separated)"),
                "genreIds": nullable("string", "Optional: Include movies with all of these genre IDs (comma-separated)"),
                "keywordIds": nullable("string", "Optional: Include movies with all of these keyword IDs (comma-separated)"),
                "minVoteAverage": nullable("number", "Optional: Minimum vote average (1-10)"),
                "maxVoteAverage": nullable("number", "Optional: Maximum vote average (1-10)"),
                "minVoteCount": nullable("integer", "Optional: Minimum vote count"),
                "maxVoteCount": nullable("integer", "Optional: Maximum vote count")
            }),
            &[],
        ),
        move |args| discover_movies(movies.clone(), args),
    );
}

async fn search_for_people(movies: MovieTools, args: Value) -> ToolResult<String> {
    let name = Args(&args).required_str("personName")?;
    movies.search_for_people(&name).await
}

async fn search_movies(movies: MovieTools, args: Value) -> ToolResult<String> {
    let a = Args(&args);
    let title = a.required_str("movieTitle")?;
    let year = a.optional_str("releaseYear")?;
    movies.search_movies(&title, year.as_deref()).await
}

async fn search_keywords(movies: MovieTools, args: Value) -> ToolResult<String> {
    let keyword = Args(&args).required_str("keyword")?;
    movies.search_keywords(&keyword).await
}

#[derive(Debug, Clone, Copy)]
enum MovieIdTool {
    Trailers,
    WithTrailer,
    Details,
    Describe,
}

async fn by_movie_id(movies: MovieTools, args: Value, tool: MovieIdTool) -> ToolResult<String> {
    let movie_id = Args(&args).required_str("movieId")?;
    match tool {
        MovieIdTool::Trailers => movies.get_movie_trailers(&movie_id).await,
        MovieIdTool::WithTrailer => movies.get_movie_with_trailer(&movie_id).await,
        MovieIdTool::Details => movies.get_movie_details(&movie_id).await,
        MovieIdTool::Describe => movies.describe_movie(&movie_id).await,
    }
}

async fn discover_movies(movies: MovieTools, args: Value) -> ToolResult<String> {
    let a = Args(&args);
    let discover = DiscoverArgs {
        release_date_from: a.optional_str("releaseDateFrom")?,
        release_date_to: a.optional_str("releaseDateTo")?,
        cast_ids: a.optional_str("castIds")?,
        genre_ids: a.optional_str("genreIds")?,
        keyword_ids: a.optional_str("keywordIds")?,
        min_vote_average: a.optional_f64("minVoteAverage")?,
        max_vote_average: a.optional_f64("maxVoteAverage")?,
        min_vote_count: a.optional_i64("minVoteCount")?,
        max_vote_count: a.optional_i64("maxVoteCount")?,
    };
    movies.discover_movies(&discover).await
}
