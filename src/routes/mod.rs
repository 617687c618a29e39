// Route exports
pub mod auth;
pub mod matches;
pub mod movies;
pub mod preferences;
pub mod ratings;

use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use crate::auth::JwtManager;
use crate::core::DiscoverFeed;
use crate::error::{handle_json_payload_error, handle_path_error, handle_query_payload_error};
use crate::models::HealthResponse;
use crate::services::{CacheManager, GoogleOAuthClient, PostgresClient, TmdbClient};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub cache: Arc<CacheManager>,
    pub jwt: Arc<JwtManager>,
    /// Absent when no TMDB key is configured
    pub tmdb: Option<Arc<TmdbClient>>,
    /// Absent when Google sign-in is not configured
    pub google: Option<Arc<GoogleOAuthClient>>,
    pub feed: DiscoverFeed,
    pub bcrypt_cost: u32,
    pub frontend_url: String,
}

/// Extractor error handlers plus every route
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
        .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
        .app_data(web::PathConfig::default().error_handler(handle_path_error));
    configure_routes(cfg);
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .configure(auth::configure)
            .configure(matches::configure)
            .configure(movies::configure)
            .configure(ratings::configure)
            .configure(preferences::configure),
    );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}
