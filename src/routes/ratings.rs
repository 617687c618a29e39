use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::RateMovieRequest;
use crate::routes::AppState;

/// Configure rating routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/ratings", web::get().to(list_ratings))
        .route("/ratings/{movie_id}", web::put().to(rate_movie))
        .route("/ratings/{movie_id}", web::get().to(get_rating))
        .route("/ratings/{movie_id}", web::delete().to(delete_rating));
}

/// Rate a movie, replacing any earlier rating
///
/// PUT /api/ratings/{movie_id}
///
/// Request body:
/// ```json
/// { "score": 8, "review": "optional text" }
/// ```
async fn rate_movie(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i32>,
    req: web::Json<RateMovieRequest>,
) -> ApiResult<HttpResponse> {
    req.validate()?;
    let movie_id = path.into_inner();

    if !state.postgres.movie_exists(movie_id).await? {
        return Err(ApiError::NotFound(format!("Movie {} not found", movie_id)));
    }

    let review = req.review.as_deref().map(str::trim).filter(|r| !r.is_empty());
    let rating = state
        .postgres
        .upsert_rating(auth.user_id, movie_id, req.score, review)
        .await?;

    tracing::info!("User {} rated movie {}: {}", auth.user_id, movie_id, req.score);

    Ok(HttpResponse::Ok().json(rating))
}

/// GET /api/ratings
async fn list_ratings(state: web::Data<AppState>, auth: AuthUser) -> ApiResult<HttpResponse> {
    let ratings = state.postgres.list_ratings(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(ratings))
}

/// GET /api/ratings/{movie_id}
async fn get_rating(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let movie_id = path.into_inner();

    let rating = state
        .postgres
        .get_rating(auth.user_id, movie_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No rating for movie {}", movie_id)))?;

    Ok(HttpResponse::Ok().json(rating))
}

/// DELETE /api/ratings/{movie_id}
async fn delete_rating(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let movie_id = path.into_inner();

    if !state.postgres.delete_rating(auth.user_id, movie_id).await? {
        return Err(ApiError::NotFound(format!("No rating for movie {}", movie_id)));
    }

    Ok(HttpResponse::NoContent().finish())
}
