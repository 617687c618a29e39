// Service exports
pub mod cache;
pub mod oauth;
pub mod postgres;
pub mod tmdb;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use oauth::{GoogleOAuthClient, GoogleProfile, OAuthError};
pub use postgres::{PostgresClient, PostgresError};
pub use tmdb::{TmdbClient, TmdbError, TmdbGenre, TmdbMovie, TmdbPage};
