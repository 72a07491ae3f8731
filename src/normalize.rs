//! Agent-facing records and the pure mappings from catalog responses into them.
//!
//! Identifiers are always rendered as decimal strings. Keys are PascalCase;
//! downstream prompts and clients already read them that way.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::tmdb::{
    TmdbCredits, TmdbExternalIds, TmdbGenre, TmdbKeyword, TmdbMovieDetail, TmdbMovieSummary,
    TmdbPerson,
};

pub const DESCRIBE_CAST_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenreItem {
    pub genre_id: String,
    pub genre_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersonItem {
    pub person_id: String,
    pub person_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeywordItem {
    pub keyword_id: String,
    pub name: String,
}

/// `release_date` is empty when unknown, `imdb_id` is empty when unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MovieSearchResult {
    pub movie_id: String,
    pub movie_name: String,
    pub release_date: String,
    pub imdb_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenreRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MovieDetails {
    pub movie_id: String,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub genres: Vec<GenreRef>,
    pub runtime: Option<i32>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub imdb_id: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MovieDescription {
    pub movie_id: String,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub genres: Vec<String>,
    pub runtime: Option<i32>,
    pub tagline: Option<String>,
    pub rating: Option<f64>,
    pub language: Option<String>,
    pub imdb_id: String,
    pub cast: Vec<String>,
}

/// Unknown dates become an empty string, matching the search contract.
pub fn iso_date_or_empty(raw: Option<&str>) -> String {
    iso_date(raw).unwrap_or_default()
}

/// The catalog sends `""` or `null` for unknown dates; both map to `None`.
pub fn iso_date(raw: Option<&str>) -> Option<String> {
    parse_date(raw).map(|d| d.format("%Y-%m-%d").to_string())
}

pub fn release_year(raw: Option<&str>) -> Option<i32> {
    parse_date(raw).map(|d| d.year())
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

pub fn genre(g: &TmdbGenre) -> GenreItem {
    GenreItem {
        genre_id: g.id.to_string(),
        genre_name: g.name.clone(),
    }
}

pub fn person(p: &TmdbPerson) -> PersonItem {
    PersonItem {
        person_id: p.id.to_string(),
        person_name: p.name.clone(),
    }
}

pub fn keyword(k: &TmdbKeyword) -> KeywordItem {
    KeywordItem {
        keyword_id: k.id.to_string(),
        name: k.name.clone(),
    }
}

pub fn search_result(movie: &TmdbMovieSummary, ids: &TmdbExternalIds) -> MovieSearchResult {
    MovieSearchResult {
        movie_id: movie.id.to_string(),
        movie_name: movie.title.clone(),
        release_date: iso_date_or_empty(movie.release_date.as_deref()),
        imdb_id: ids.imdb_id.clone().unwrap_or_default(),
    }
}

pub fn movie_details(movie_id: i32, detail: &TmdbMovieDetail) -> MovieDetails {
    MovieDetails {
        movie_id: movie_id.to_string(),
        title: detail.title.clone(),
        overview: detail.overview.clone(),
        release_date: iso_date(detail.release_date.as_deref()),
        genres: detail
            .genres
            .iter()
            .map(|g| GenreRef {
                id: g.id.to_string(),
                name: g.name.clone(),
            })
            .collect(),
        runtime: detail.runtime,
        vote_average: detail.vote_average,
        vote_count: detail.vote_count,
        imdb_id: detail.imdb_id.clone().unwrap_or_default(),
        poster_path: detail.poster_path.clone(),
        backdrop_path: detail.backdrop_path.clone(),
    }
}

/// Missing credits yield an empty cast rather than an error.
pub fn movie_description(
    movie_id: i32,
    detail: &TmdbMovieDetail,
    credits: Option<&TmdbCredits>,
) -> MovieDescription {
    let cast = credits
        .map(|c| {
            c.cast
                .iter()
                .take(DESCRIBE_CAST_LIMIT)
                .map(|m| m.name.clone())
                .collect()
        })
        .unwrap_or_default();

    MovieDescription {
        movie_id: movie_id.to_string(),
        title: detail.title.clone(),
        overview: detail.overview.clone(),
        release_date: iso_date(detail.release_date.as_deref()),
        genres: detail.genres.iter().map(|g| g.name.clone()).collect(),
        runtime: detail.runtime,
        tagline: detail.tagline.clone(),
        rating: detail.vote_average,
        language: detail.original_language.clone(),
        imdb_id: detail.imdb_id.clone().unwrap_or_default(),
        cast,
    }
}
