//! Discovery filters and the query they compile into.
//!
//! Each criterion is independent: absent criteria add nothing to the query,
//! present ones narrow it further (AND across criteria, and AND across the
//! ids inside a list criterion).

use chrono::NaiveDate;

use crate::datetime_tools::parse_iso_date;
use crate::error::{ToolError, ToolResult};

/// Raw discovery arguments as the agent supplies them.
#[derive(Debug, Clone, Default)]
pub struct DiscoverArgs {
    pub release_date_from: Option<String>,
    pub release_date_to: Option<String>,
    pub cast_ids: Option<String>,
    pub genre_ids: Option<String>,
    pub keyword_ids: Option<String>,
    pub min_vote_average: Option<f64>,
    pub max_vote_average: Option<f64>,
    pub min_vote_count: Option<i64>,
    pub max_vote_count: Option<i64>,
}

/// Validated discovery criteria.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryFilter {
    pub release_date_from: Option<NaiveDate>,
    pub release_date_to: Option<NaiveDate>,
    pub cast_ids: Option<Vec<i32>>,
    pub genre_ids: Option<Vec<i32>>,
    pub keyword_ids: Option<Vec<i32>>,
    pub min_vote_average: Option<f64>,
    pub max_vote_average: Option<f64>,
    pub min_vote_count: Option<i64>,
    pub max_vote_count: Option<i64>,
}

impl DiscoveryFilter {
    /// Empty strings count as "not supplied", matching how the agent omits values.
    pub fn from_args(args: &DiscoverArgs) -> ToolResult<Self> {
        Ok(Self {
            release_date_from: present(&args.release_date_from)
                .map(parse_iso_date)
                .transpose()?,
            release_date_to: present(&args.release_date_to)
                .map(parse_iso_date)
                .transpose()?,
            cast_ids: present(&args.cast_ids)
                .map(|s| parse_id_list("castIds", s))
                .transpose()?,
            genre_ids: present(&args.genre_ids)
                .map(|s| parse_id_list("genreIds", s))
                .transpose()?,
            keyword_ids: present(&args.keyword_ids)
                .map(|s| parse_id_list("keywordIds", s))
                .transpose()?,
            min_vote_average: finite("minVoteAverage", args.min_vote_average)?,
            max_vote_average: finite("maxVoteAverage", args.max_vote_average)?,
            min_vote_count: args.min_vote_count,
            max_vote_count: args.max_vote_count,
        })
    }

    pub fn to_query(&self) -> DiscoverQuery {
        let mut query = DiscoverQuery::new();
        if let Some(date) = self.release_date_from {
            query = query.primary_release_on_or_after(date);
        }
        if let Some(date) = self.release_date_to {
            query = query.primary_release_on_or_before(date);
        }
        if let Some(ids) = &self.cast_ids {
            query = query.with_all_of_cast(ids);
        }
        if let Some(ids) = &self.genre_ids {
            query = query.with_all_of_genres(ids);
        }
        if let Some(ids) = &self.keyword_ids {
            query = query.with_all_of_keywords(ids);
        }
        if let Some(v) = self.min_vote_average {
            query = query.vote_average_at_least(v);
        }
        if let Some(v) = self.max_vote_average {
            query = query.vote_average_at_most(v);
        }
        if let Some(v) = self.min_vote_count {
            query = query.vote_count_at_least(v);
        }
        if let Some(v) = self.max_vote_count {
            query = query.vote_count_at_most(v);
        }
        query
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn finite(field: &str, value: Option<f64>) -> ToolResult<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() => Err(ToolError::validation(format!(
            "{field} must be a finite number, got {v}"
        ))),
        other => Ok(other),
    }
}

/// Every comma-separated segment must be an integer; an empty segment is an error.
pub fn parse_id_list(field: &str, raw: &str) -> ToolResult<Vec<i32>> {
    raw.split(',')
        .map(|segment| {
            segment.trim().parse::<i32>().map_err(|_| {
                ToolError::validation(format!(
                    "{field}: '{segment}' is not an integer id (expected e.g. \"28,12\")"
                ))
            })
        })
        .collect()
}

/// Query parameters for the catalog's discovery endpoint, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverQuery {
    params: Vec<(&'static str, String)>,
}

impl DiscoverQuery {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, key: &'static str, value: String) -> Self {
        self.params.push((key, value));
        self
    }

    pub fn primary_release_on_or_after(self, date: NaiveDate) -> Self {
        self.with("primary_release_date.gte", date.format("%Y-%m-%d").to_string())
    }

    pub fn primary_release_on_or_before(self, date: NaiveDate) -> Self {
        self.with("primary_release_date.lte", date.format("%Y-%m-%d").to_string())
    }

    // Comma-joined ids are ANDed by the catalog; pipes would mean OR.
    pub fn with_all_of_cast(self, ids: &[i32]) -> Self {
        self.with("with_cast", join_all(ids))
    }

    pub fn with_all_of_genres(self, ids: &[i32]) -> Self {
        self.with("with_genres", join_all(ids))
    }

    pub fn with_all_of_keywords(self, ids: &[i32]) -> Self {
        self.with("with_keywords", join_all(ids))
    }

    pub fn vote_average_at_least(self, value: f64) -> Self {
        self.with("vote_average.gte", value.to_string())
    }

    pub fn vote_average_at_most(self, value: f64) -> Self {
        self.with("vote_average.lte", value.to_string())
    }

    pub fn vote_count_at_least(self, value: i64) -> Self {
        self.with("vote_count.gte", value.to_string())
    }

    pub fn vote_count_at_most(self, value: i64) -> Self {
        self.with("vote_count.lte", value.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        self.params.clone()
    }
}

fn join_all(ids: &[i32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
