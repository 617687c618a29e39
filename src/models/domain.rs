use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Registered user account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing, default)]
    pub google_id: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Movie genre
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    #[serde(rename = "tmdbId")]
    pub tmdb_id: Option<i32>,
}

/// Movie card data, with genre names resolved from its categories
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i32,
    #[serde(rename = "tmdbId")]
    pub tmdb_id: Option<i32>,
    pub title: String,
    pub overview: Option<String>,
    #[serde(rename = "releaseDate")]
    pub release_date: Option<NaiveDate>,
    #[serde(rename = "posterPath")]
    pub poster_path: Option<String>,
    #[serde(rename = "backdropPath")]
    pub backdrop_path: Option<String>,
    #[serde(rename = "voteAverage")]
    pub vote_average: f64,
    #[serde(rename = "voteCount")]
    pub vote_count: i32,
    pub popularity: f64,
    #[serde(rename = "originalLanguage")]
    pub original_language: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Fields written when importing or refreshing a movie
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub tmdb_id: i32,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: f64,
    pub vote_count: i32,
    pub popularity: f64,
    pub original_language: Option<String>,
}

/// A user's swipe decision on a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Like,
    Dislike,
    Superlike,
}

impl MatchType {
    pub const ALL: [MatchType; 3] = [MatchType::Like, MatchType::Dislike, MatchType::Superlike];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Like => "like",
            MatchType::Dislike => "dislike",
            MatchType::Superlike => "superlike",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "like" => Ok(MatchType::Like),
            "dislike" => Ok(MatchType::Dislike),
            "superlike" => Ok(MatchType::Superlike),
            other => Err(format!(
                "unknown match type '{}', expected one of: like, dislike, superlike",
                other
            )),
        }
    }
}

/// Stored match, one per (user, movie) pair
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserMatch {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "movieId")]
    pub movie_id: i32,
    #[serde(rename = "matchType")]
    pub match_type: MatchType,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Stored rating, one per (user, movie) pair
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRating {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "movieId")]
    pub movie_id: i32,
    pub score: i16,
    pub review: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Discover-feed preferences
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserPreferences {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "favoriteGenres")]
    pub favorite_genres: Vec<i32>,
    #[serde(rename = "minReleaseYear")]
    pub min_release_year: Option<i32>,
    #[serde(rename = "maxReleaseYear")]
    pub max_release_year: Option<i32>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    /// Preferences for a user who never saved any
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            favorite_genres: Vec::new(),
            min_release_year: None,
            max_release_year: None,
            updated_at: Utc::now(),
        }
    }
}

/// Per-type match counts for a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    pub total: i64,
    pub like: i64,
    pub dislike: i64,
    pub superlike: i64,
    #[serde(rename = "lastMatchedAt")]
    pub last_matched_at: Option<DateTime<Utc>>,
}

/// Aggregate of all user ratings for a movie
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    #[serde(rename = "averageScore")]
    pub average_score: Option<f64>,
    #[serde(rename = "ratingCount")]
    pub rating_count: i64,
}

/// Candidate selection filter for the discover feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverFilter {
    /// Category ids; empty means no genre restriction
    pub genres: Vec<i32>,
    pub min_release_year: Option<i32>,
    pub max_release_year: Option<i32>,
}

impl DiscoverFilter {
    pub fn from_preferences(preferences: &UserPreferences) -> Self {
        Self {
            genres: preferences.favorite_genres.clone(),
            min_release_year: preferences.min_release_year,
            max_release_year: preferences.max_release_year,
        }
    }

    /// Filter for one discover request; explicit genres replace the
    /// favorites while the year bounds still come from preferences
    pub fn for_request(preferences: Option<&UserPreferences>, genres: &[i32]) -> Self {
        let mut filter = preferences.map(Self::from_preferences).unwrap_or_default();
        if !genres.is_empty() {
            filter.genres = genres.to_vec();
        }
        filter
    }

    pub fn has_genres(&self) -> bool {
        !self.genres.is_empty()
    }

    /// Same year bounds, no genre restriction
    pub fn without_genres(&self) -> Self {
        Self {
            genres: Vec::new(),
            ..self.clone()
        }
    }
}
