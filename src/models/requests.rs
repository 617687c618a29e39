use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::models::domain::MatchType;

/// Request to create an account with email and password
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 64))]
    #[serde(alias = "display_name", rename = "displayName")]
    pub display_name: String,
}

/// Request to log in with email and password
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Query parameters Google sends back to the OAuth callback
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: String,
    pub error: Option<String>,
}

/// Request to record a swipe decision
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMatchRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "movie_id", rename = "movieId")]
    pub movie_id: i32,
    #[serde(alias = "match_type", rename = "matchType")]
    pub match_type: MatchType,
}

/// Request to change the decision on an existing match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMatchRequest {
    #[serde(alias = "match_type", rename = "matchType")]
    pub match_type: MatchType,
}

/// Query for listing a user's matches
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ListMatchesQuery {
    #[serde(rename = "type")]
    pub match_type: Option<MatchType>,
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_page_size")]
    pub limit: i64,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub offset: i64,
}

/// Query for the discover feed
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DiscoverQuery {
    #[validate(range(min = 1))]
    pub limit: Option<u16>,
    /// Movie ids the client already holds in its card stack
    #[validate(length(max = 500))]
    #[serde(default, deserialize_with = "comma_separated")]
    pub exclude: Vec<i32>,
    /// Explicit genre ids, overriding stored favorites
    #[serde(default, deserialize_with = "comma_separated")]
    pub genres: Vec<i32>,
    #[serde(default = "default_true", alias = "usePreferences")]
    pub use_preferences: bool,
}

/// Query for browsing the catalog
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ListMoviesQuery {
    #[validate(range(min = 1, max = 100_000))]
    #[serde(default = "default_movie_page")]
    pub page: i64,
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_page_size", alias = "perPage")]
    pub per_page: i64,
    pub genre: Option<i32>,
    #[validate(length(max = 200))]
    pub search: Option<String>,
}

/// Query for importing movies from TMDB
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SyncMoviesQuery {
    #[validate(range(min = 1, max = 20))]
    #[serde(default = "default_page")]
    pub pages: u32,
}

/// Request to rate a movie
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RateMovieRequest {
    #[validate(range(min = 1, max = 10))]
    pub score: i16,
    #[validate(length(max = 2000))]
    pub review: Option<String>,
}

/// Request to replace discover preferences
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_year_range"))]
pub struct UpdatePreferencesRequest {
    #[validate(length(max = 50))]
    #[serde(default, alias = "favorite_genres", rename = "favoriteGenres")]
    pub favorite_genres: Vec<i32>,
    #[validate(range(min = 1870, max = 2100))]
    #[serde(default, alias = "min_release_year", rename = "minReleaseYear")]
    pub min_release_year: Option<i32>,
    #[validate(range(min = 1870, max = 2100))]
    #[serde(default, alias = "max_release_year", rename = "maxReleaseYear")]
    pub max_release_year: Option<i32>,
}

fn validate_year_range(req: &UpdatePreferencesRequest) -> Result<(), ValidationError> {
    match (req.min_release_year, req.max_release_year) {
        (Some(min), Some(max)) if min > max => {
            let mut err = ValidationError::new("year_range");
            err.message = Some("minReleaseYear must not exceed maxReleaseYear".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

fn default_true() -> bool { true }
fn default_page() -> u32 { 1 }
fn default_movie_page() -> i64 { 1 }
fn default_page_size() -> i64 { 20 }

/// Accepts `1,2,3` (query strings) as well as a JSON array
fn comma_separated<'de, D>(deserializer: D) -> Result<Vec<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        List(Vec<i32>),
    }

    match Raw::deserialize(deserializer)? {
        Raw::List(ids) => Ok(ids),
        Raw::Text(text) => text
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<i32>().map_err(serde::de::Error::custom))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            display_name: String::new(),
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("display_name"));
    }

    #[test]
    fn test_year_range_validation() {
        let req = UpdatePreferencesRequest {
            favorite_genres: vec![],
            min_release_year: Some(2010),
            max_release_year: Some(2000),
        };
        assert!(req.validate().is_err());

        let ok = UpdatePreferencesRequest {
            min_release_year: Some(2000),
            max_release_year: Some(2010),
            ..req
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_rating_score_bounds() {
        let too_high = RateMovieRequest { score: 11, review: None };
        assert!(too_high.validate().is_err());

        let fine = RateMovieRequest { score: 7, review: Some("Great".into()) };
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn test_create_match_accepts_both_casings() {
        let camel: CreateMatchRequest =
            serde_json::from_str(r#"{"movieId": 3, "matchType": "superlike"}"#).unwrap();
        let snake: CreateMatchRequest =
            serde_json::from_str(r#"{"movie_id": 3, "match_type": "like"}"#).unwrap();

        assert_eq!(camel.match_type, MatchType::Superlike);
        assert_eq!(snake.movie_id, 3);
    }

    #[test]
    fn test_discover_exclude_from_json_list() {
        let query: DiscoverQuery = serde_json::from_str(r#"{"exclude": [4, 5]}"#).unwrap();
        assert_eq!(query.exclude, vec![4, 5]);
        assert!(query.use_preferences);
    }

    #[test]
    fn test_discover_exclude_from_text() {
        let query: DiscoverQuery =
            serde_json::from_str(r#"{"exclude": "1, 2,,3", "genres": ""}"#).unwrap();
        assert_eq!(query.exclude, vec![1, 2, 3]);
        assert!(query.genres.is_empty());
    }

    #[test]
    fn test_discover_exclude_is_bounded() {
        let query = DiscoverQuery {
            exclude: (1..=501).collect(),
            ..DiscoverQuery::default()
        };
        assert!(query.validate().is_err());

        let query = DiscoverQuery {
            exclude: (1..=500).collect(),
            ..DiscoverQuery::default()
        };
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_movie_page_defaults_and_bounds() {
        let query: ListMoviesQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 20);

        let query: ListMoviesQuery =
            serde_json::from_str(r#"{"page": 9223372036854775807}"#).unwrap();
        assert!(query.validate().is_err());
    }
}
