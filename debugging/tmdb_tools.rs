//! Invoke one registered tool against the live catalog and print its output.
//! Usage:
//!   cargo run --bin tmdb_tools -- list
//!   cargo run --bin tmdb_tools -- search_movies '{"movieTitle":"Heat","releaseYear":"1995"}'
//!   cargo run --bin tmdb_tools -- get_movie_trailers '{"movieId":"949"}'
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use movie_desk::config::{TmdbConfig, DEFAULT_TMDB_BASE};
use movie_desk::datetime_tools::DateTimeTools;
use movie_desk::movie_tools::MovieTools;
use movie_desk::registry::build_registry;
use movie_desk::tmdb::TmdbClient;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let mut args = env::args().skip(1);
    let tool = args
        .next()
        .context("Usage: tmdb_tools <tool_name|list> [json_arguments]")?;
    let arguments = args.next().unwrap_or_default();

    let config = TmdbConfig {
        api_key: env::var("TMDB_API_KEY").context("Missing TMDB_API_KEY in environment")?,
        base_url: env::var("TMDB_BASE_URL").unwrap_or_else(|_| DEFAULT_TMDB_BASE.to_string()),
    };
    let client = Arc::new(TmdbClient::new(&config)?);
    let registry = build_registry(MovieTools::new(client), DateTimeTools::new());

    if tool == "list" {
        for spec in registry.specs() {
            println!("{}", serde_json::to_string_pretty(&spec)?);
        }
        return Ok(());
    }

    let output = registry
        .call(&tool, &arguments)
        .await
        .with_context(|| format!("Tool '{}' failed", tool))?;
    println!("{}", output);
    Ok(())
}
