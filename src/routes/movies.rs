use actix_web::{web, HttpResponse};
use std::collections::HashMap;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Category, ListMoviesQuery, Movie, MovieDetailResponse, MovieListResponse, SyncMoviesQuery,
    SyncResponse,
};
use crate::routes::AppState;
use crate::services::{CacheKey, PostgresClient, TmdbClient};

/// Configure catalog routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/movies", web::get().to(list_movies))
        .route("/movies/sync", web::post().to(sync_movies))
        .route("/movies/{movie_id}", web::get().to(get_movie))
        .route("/categories", web::get().to(list_categories));
}

/// Browse the catalog
///
/// GET /api/movies?page={page}&per_page={n}&genre={category_id}&search={text}
async fn list_movies(
    state: web::Data<AppState>,
    query: web::Query<ListMoviesQuery>,
) -> ApiResult<HttpResponse> {
    query.validate()?;

    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let offset = (query.page - 1) * query.per_page;

    let movies = state
        .postgres
        .list_movies(query.genre, search, query.per_page, offset)
        .await?;
    let total = state.postgres.count_movies(query.genre, search).await?;

    Ok(HttpResponse::Ok().json(MovieListResponse {
        movies,
        page: query.page,
        per_page: query.per_page,
        total,
    }))
}

/// Movie detail; includes the caller's rating and match when authenticated
///
/// GET /api/movies/{movie_id}
async fn get_movie(
    state: web::Data<AppState>,
    auth: Option<AuthUser>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let movie_id = path.into_inner();
    let cache_key = CacheKey::movie(movie_id);

    let movie = match state.cache.get::<Movie>(&cache_key).await {
        Ok(movie) => movie,
        Err(_) => {
            let movie = state
                .postgres
                .get_movie(movie_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Movie {} not found", movie_id)))?;

            if let Err(e) = state.cache.set(&cache_key, &movie).await {
                tracing::warn!("Failed to cache movie {}: {}", movie_id, e);
            }
            movie
        }
    };

    let rating = state.postgres.movie_rating_summary(movie_id).await?;

    let (user_rating, user_match) = match &auth {
        Some(user) => (
            state.postgres.get_rating(user.user_id, movie_id).await?,
            state.postgres.get_match(user.user_id, movie_id).await?,
        ),
        None => (None, None),
    };

    Ok(HttpResponse::Ok().json(MovieDetailResponse {
        movie,
        rating,
        user_rating,
        user_match,
    }))
}

/// All genres
///
/// GET /api/categories
async fn list_categories(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let cache_key = CacheKey::categories();

    if let Ok(categories) = state.cache.get::<Vec<Category>>(&cache_key).await {
        return Ok(HttpResponse::Ok().json(categories));
    }

    let categories = state.postgres.list_categories().await?;
    if let Err(e) = state.cache.set(&cache_key, &categories).await {
        tracing::warn!("Failed to cache categories: {}", e);
    }

    Ok(HttpResponse::Ok().json(categories))
}

/// Import genres and popular movies from TMDB
///
/// POST /api/movies/sync?pages={1..=20}
async fn sync_movies(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<SyncMoviesQuery>,
) -> ApiResult<HttpResponse> {
    query.validate()?;

    let tmdb = state
        .tmdb
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("TMDB import is not configured".to_string()))?;

    tracing::info!("User {} started TMDB sync of {} page(s)", auth.user_id, query.pages);

    let result = import_catalog(&state.postgres, tmdb, query.pages).await;

    // A failed import may still have written rows
    if let Err(e) = state.cache.invalidate_pattern(CacheKey::CATALOG_PATTERN).await {
        tracing::warn!("Failed to invalidate catalog cache after sync: {}", e);
    }

    let summary = result?;

    tracing::info!(
        "TMDB sync finished: {} categories, {} movies from {} page(s)",
        summary.categories_upserted,
        summary.movies_upserted,
        summary.pages_fetched
    );

    Ok(HttpResponse::Ok().json(summary))
}

/// Upsert TMDB genres, then up to `pages` pages of popular movies
async fn import_catalog(
    postgres: &PostgresClient,
    tmdb: &TmdbClient,
    pages: u32,
) -> ApiResult<SyncResponse> {
    let mut summary = SyncResponse::default();

    // TMDB genre id -> local category id
    let mut genre_map = HashMap::new();
    for genre in tmdb.fetch_genres().await? {
        let category = postgres.upsert_category(&genre.name, Some(genre.id)).await?;
        genre_map.insert(genre.id, category.id);
        summary.categories_upserted += 1;
    }

    for page in 1..=pages {
        let listing = tmdb.fetch_popular(page).await?;
        summary.pages_fetched += 1;

        for entry in &listing.results {
            let movie_id = postgres.upsert_movie(&entry.to_new_movie()).await?;
            let category_ids: Vec<i32> = entry
                .genre_ids
                .iter()
                .filter_map(|id| genre_map.get(id).copied())
                .collect();
            postgres.set_movie_categories(movie_id, &category_ids).await?;
            summary.movies_upserted += 1;
        }

        if page >= listing.total_pages {
            break;
        }
    }

    Ok(summary)
}
