//! FilmMatch - movie discovery backend
//!
//! REST API behind the FilmMatch swipe app: accounts (password and Google
//! sign-in), the movie catalog, per-movie swipe decisions ("matches"),
//! ratings, preferences, and the shuffled discover feed.

pub mod auth;
pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{DiscoverFeed, FeedResult};
pub use error::{ApiError, ApiResult};
pub use models::{MatchType, Movie, UserMatch};
pub use routes::AppState;
