pub mod agent;
pub mod app;
pub mod config;
pub mod datetime_tools;
pub mod discover;
pub mod error;
pub mod movie_tools;
pub mod normalize;
pub mod registry;
pub mod tmdb;
pub mod videos;
