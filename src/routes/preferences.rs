use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::models::{UpdatePreferencesRequest, UserPreferences};
use crate::routes::AppState;

/// Configure preference routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/preferences", web::get().to(get_preferences))
        .route("/preferences", web::put().to(update_preferences));
}

/// Stored preferences, or empty ones for a user who never saved any
///
/// GET /api/preferences
async fn get_preferences(state: web::Data<AppState>, auth: AuthUser) -> ApiResult<HttpResponse> {
    let prefs = state
        .postgres
        .get_preferences(auth.user_id)
        .await?
        .unwrap_or_else(|| UserPreferences::empty(auth.user_id));

    Ok(HttpResponse::Ok().json(prefs))
}

/// Replace discover preferences
///
/// PUT /api/preferences
///
/// Request body:
/// ```json
/// { "favoriteGenres": [28, 878], "minReleaseYear": 1990, "maxReleaseYear": null }
/// ```
async fn update_preferences(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<UpdatePreferencesRequest>,
) -> ApiResult<HttpResponse> {
    req.validate()?;

    let mut genres = req.favorite_genres.clone();
    genres.sort_unstable();
    genres.dedup();

    let prefs = state
        .postgres
        .upsert_preferences(auth.user_id, &genres, req.min_release_year, req.max_release_year)
        .await?;

    tracing::info!("User {} updated preferences ({} genres)", auth.user_id, genres.len());

    Ok(HttpResponse::Ok().json(prefs))
}
