use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::NewMovie;

/// Errors that can occur when talking to TMDB
#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid TMDB API key")]
    Unauthorized,
}

/// Genre as listed by `/genre/movie/list`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct GenreList {
    genres: Vec<TmdbGenre>,
}

/// Movie entry from a TMDB list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i32,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

impl TmdbMovie {
    /// Convert to the catalog row; TMDB sends `""` for unknown dates
    pub fn to_new_movie(&self) -> NewMovie {
        NewMovie {
            tmdb_id: self.id,
            title: self.title.clone(),
            overview: self.overview.clone().filter(|s| !s.is_empty()),
            release_date: self
                .release_date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            poster_path: self.poster_path.clone(),
            backdrop_path: self.backdrop_path.clone(),
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            popularity: self.popularity,
            original_language: self.original_language.clone(),
        }
    }
}

/// One page of a TMDB list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage {
    pub page: u32,
    pub results: Vec<TmdbMovie>,
    pub total_pages: u32,
}

/// TMDB v3 API client
///
/// Used to import genres and popular movies into the local catalog.
pub struct TmdbClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl TmdbClient {
    /// Create a new TMDB client
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, TmdbError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, TmdbError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = self.url(path);
        tracing::debug!("Fetching from TMDB: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(TmdbError::Unauthorized),
            status if !status.is_success() => Err(TmdbError::ApiError(format!(
                "{} returned {}",
                path, status
            ))),
            _ => Ok(response.json().await?),
        }
    }

    /// Fetch the movie genre list
    pub async fn fetch_genres(&self) -> Result<Vec<TmdbGenre>, TmdbError> {
        let list: GenreList = self
            .get("/genre/movie/list", &[("language", "en-US".to_string())])
            .await?;
        Ok(list.genres)
    }

    /// Fetch one page of popular movies
    pub async fn fetch_popular(&self, page: u32) -> Result<TmdbPage, TmdbError> {
        self.get(
            "/movie/popular",
            &[("language", "en-US".to_string()), ("page", page.to_string())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(base_url: String) -> TmdbClient {
        TmdbClient::new(base_url, "test-key".to_string(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_genres() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/genre/movie/list")
            .match_query(Matcher::UrlEncoded("api_key".into(), "test-key".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"genres":[{"id":28,"name":"Action"},{"id":18,"name":"Drama"}]}"#)
            .create_async()
            .await;

        let genres = client(server.url()).fetch_genres().await.unwrap();

        mock.assert_async().await;
        assert_eq!(genres.len(), 2);
        assert_eq!(genres[0].name, "Action");
    }

    #[tokio::test]
    async fn test_fetch_popular_page() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/movie/popular")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"page":2,"total_pages":10,"results":[
                    {"id":603,"title":"The Matrix","overview":"Neo","release_date":"1999-03-30",
                     "poster_path":"/m.jpg","vote_average":8.2,"vote_count":25000,
                     "popularity":90.5,"original_language":"en","genre_ids":[28,878]},
                    {"id":1,"title":"Untitled","release_date":"","overview":""}
                ]}"#,
            )
            .create_async()
            .await;

        let page = client(server.url()).fetch_popular(2).await.unwrap();

        assert_eq!(page.page, 2);
        assert_eq!(page.results.len(), 2);

        let matrix = page.results[0].to_new_movie();
        assert_eq!(matrix.release_date, NaiveDate::from_ymd_opt(1999, 3, 30));
        assert_eq!(page.results[0].genre_ids, vec![28, 878]);

        let untitled = page.results[1].to_new_movie();
        assert!(untitled.release_date.is_none());
        assert!(untitled.overview.is_none());
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/genre/movie/list")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let err = client(server.url()).fetch_genres().await.unwrap_err();
        assert!(matches!(err, TmdbError::Unauthorized));
    }
}
