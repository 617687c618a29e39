use serde::{Deserialize, Serialize};

use crate::models::domain::{Movie, RatingSummary, User, UserMatch, UserRating};

/// Token plus the authenticated user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Response for the discover feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverResponse {
    pub movies: Vec<Movie>,
    pub total_candidates: usize,
}

/// A match together with the movie it refers to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchWithMovie {
    #[serde(flatten)]
    pub user_match: UserMatch,
    pub movie: Movie,
}

/// Response for create/update match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    #[serde(rename = "match")]
    pub user_match: UserMatch,
    pub created: bool,
}

/// Paginated list of matches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchListResponse {
    pub matches: Vec<MatchWithMovie>,
    pub limit: i64,
    pub offset: i64,
}

/// Paginated catalog listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieListResponse {
    pub movies: Vec<Movie>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// Movie with aggregate rating and, when authenticated, the caller's own data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetailResponse {
    pub movie: Movie,
    pub rating: RatingSummary,
    #[serde(rename = "userRating")]
    pub user_rating: Option<UserRating>,
    #[serde(rename = "userMatch")]
    pub user_match: Option<UserMatch>,
}

/// Result of a TMDB import
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncResponse {
    pub categories_upserted: usize,
    pub movies_upserted: usize,
    pub pages_fetched: u32,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
