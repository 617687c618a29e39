use actix_web::{web, HttpResponse};
use std::collections::{HashMap, HashSet};
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateMatchRequest, DiscoverFilter, DiscoverQuery, DiscoverResponse, ListMatchesQuery,
    MatchListResponse, MatchResponse, MatchWithMovie, Movie, UpdateMatchRequest,
};
use crate::routes::AppState;

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/matches", web::post().to(create_match))
        .route("/matches", web::get().to(list_matches))
        .route("/matches/discover", web::get().to(discover))
        .route("/matches/stats", web::get().to(match_stats))
        .route("/matches/{movie_id}", web::get().to(get_match))
        .route("/matches/{movie_id}", web::patch().to(update_match))
        .route("/matches/{movie_id}", web::delete().to(delete_match));
}

/// Record a swipe
///
/// POST /api/matches
///
/// Request body:
/// ```json
/// { "movieId": 42, "matchType": "like|dislike|superlike" }
/// ```
///
/// Responds 201 for a new pair, 200 when an earlier decision was replaced.
async fn create_match(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<CreateMatchRequest>,
) -> ApiResult<HttpResponse> {
    req.validate()?;

    if !state.postgres.movie_exists(req.movie_id).await? {
        return Err(ApiError::NotFound(format!("Movie {} not found", req.movie_id)));
    }

    let (user_match, created) = state
        .postgres
        .upsert_match(auth.user_id, req.movie_id, req.match_type)
        .await?;

    tracing::info!(
        "User {} {} movie {}",
        auth.user_id,
        req.match_type,
        req.movie_id
    );

    let body = MatchResponse { user_match, created };
    if created {
        Ok(HttpResponse::Created().json(body))
    } else {
        Ok(HttpResponse::Ok().json(body))
    }
}

/// List the caller's matches, newest first
///
/// GET /api/matches?type={type}&limit={limit}&offset={offset}
async fn list_matches(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<ListMatchesQuery>,
) -> ApiResult<HttpResponse> {
    query.validate()?;

    let matches = state
        .postgres
        .list_matches(auth.user_id, query.match_type, query.limit, query.offset)
        .await?;

    let ids: Vec<i32> = matches.iter().map(|m| m.movie_id).collect();
    let mut movies: HashMap<i32, Movie> = state
        .postgres
        .get_movies_by_ids(&ids)
        .await?
        .into_iter()
        .map(|movie| (movie.id, movie))
        .collect();

    let entries: Vec<MatchWithMovie> = matches
        .into_iter()
        .filter_map(|user_match| {
            let movie = movies.remove(&user_match.movie_id)?;
            Some(MatchWithMovie { user_match, movie })
        })
        .collect();

    Ok(HttpResponse::Ok().json(MatchListResponse {
        matches: entries,
        limit: query.limit,
        offset: query.offset,
    }))
}

/// Discover feed
///
/// GET /api/matches/discover?limit={n}&exclude={id,id}&genres={id,id}&use_preferences={bool}
///
/// Returns unmatched movies, filtered by the caller's favorite genres
/// unless `genres` overrides them, shuffled within an over-fetched pool.
async fn discover(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<DiscoverQuery>,
) -> ApiResult<HttpResponse> {
    query.validate()?;

    let limit = state.feed.resolve_limit(query.limit);
    let excluded: HashSet<i32> = query.exclude.iter().copied().collect();

    let preferences = if query.use_preferences {
        state.postgres.get_preferences(auth.user_id).await?
    } else {
        None
    };
    let filter = DiscoverFilter::for_request(preferences.as_ref(), &query.genres);

    let pool_size = state.feed.pool_size(limit, excluded.len());
    let candidates = state
        .postgres
        .discover_pool(auth.user_id, &filter, pool_size)
        .await?;

    let result = state
        .feed
        .select(candidates, &excluded, limit, &mut rand::rng());

    tracing::info!(
        "Returning {} discover movies for user {} (from {} candidates)",
        result.movies.len(),
        auth.user_id,
        result.total_candidates
    );

    Ok(HttpResponse::Ok().json(DiscoverResponse {
        movies: result.movies,
        total_candidates: result.total_candidates,
    }))
}

/// Per-type match counts
///
/// GET /api/matches/stats
async fn match_stats(state: web::Data<AppState>, auth: AuthUser) -> ApiResult<HttpResponse> {
    let stats = state.postgres.match_stats(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// GET /api/matches/{movie_id}
async fn get_match(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let movie_id = path.into_inner();

    let user_match = state
        .postgres
        .get_match(auth.user_id, movie_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No match for movie {}", movie_id)))?;

    Ok(HttpResponse::Ok().json(user_match))
}

/// Change an existing decision
///
/// PATCH /api/matches/{movie_id}
async fn update_match(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i32>,
    req: web::Json<UpdateMatchRequest>,
) -> ApiResult<HttpResponse> {
    let movie_id = path.into_inner();

    let user_match = state
        .postgres
        .update_match_type(auth.user_id, movie_id, req.match_type)
        .await?;

    tracing::info!("User {} changed movie {} to {}", auth.user_id, movie_id, req.match_type);

    Ok(HttpResponse::Ok().json(MatchResponse {
        user_match,
        created: false,
    }))
}

/// Forget a decision so the movie can show up in discover again
///
/// DELETE /api/matches/{movie_id}
async fn delete_match(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let movie_id = path.into_inner();

    if !state.postgres.delete_match(auth.user_id, movie_id).await? {
        return Err(ApiError::NotFound(format!("No match for movie {}", movie_id)));
    }

    tracing::info!("User {} removed match for movie {}", auth.user_id, movie_id);
    Ok(HttpResponse::NoContent().finish())
}
