use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use filmmatch::auth::JwtManager;
use filmmatch::config::{LoggingSettings, ServerSettings, Settings};
use filmmatch::core::DiscoverFeed;
use filmmatch::routes::{self, AppState};
use filmmatch::services::{CacheManager, GoogleOAuthClient, PostgresClient, TmdbClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

fn build_cors(server: &ServerSettings) -> Cors {
    if server.cors_origins.is_empty() {
        return Cors::permissive();
    }

    server
        .cors_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

fn io_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings.logging);

    info!("Starting FilmMatch API...");

    // Initialize cache manager (Redis optional)
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);
    let cache = Arc::new(
        CacheManager::connect(settings.cache.redis_url.as_deref(), l1_cache_size, cache_ttl).await,
    );

    info!(
        "Cache manager initialized (L1: {} entries, TTL: {}s, Redis: {})",
        l1_cache_size,
        cache_ttl,
        cache.has_redis()
    );

    // Initialize PostgreSQL client
    let db_max_conn = settings.database.max_connections.unwrap_or(10);

    let postgres = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            Some(db_max_conn),
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| io_error("PostgreSQL connection error", e))?,
    );

    info!("PostgreSQL client initialized (max: {} connections)", db_max_conn);

    let jwt = Arc::new(JwtManager::new(
        &settings.auth.jwt_secret,
        settings.auth.token_ttl_secs,
    ));

    let tmdb = match &settings.tmdb {
        Some(tmdb) => {
            let client = TmdbClient::new(
                tmdb.base_url.clone(),
                tmdb.api_key.clone(),
                Duration::from_secs(tmdb.timeout_secs),
            )
            .map_err(|e| io_error("TMDB client error", e))?;
            info!("TMDB import enabled");
            Some(Arc::new(client))
        }
        None => {
            info!("TMDB import disabled (no API key)");
            None
        }
    };

    let google = match &settings.oauth.google {
        Some(google) => {
            let client = GoogleOAuthClient::new(google.clone())
                .map_err(|e| io_error("Google OAuth client error", e))?;
            info!("Google sign-in enabled");
            Some(Arc::new(client))
        }
        None => None,
    };

    let feed = DiscoverFeed::new(
        settings.discover.default_limit as usize,
        settings.discover.max_limit as usize,
        settings.discover.overfetch_factor as usize,
    );

    info!("Discover feed initialized: {:?}", feed);

    // Build application state
    let app_state = AppState {
        postgres,
        cache,
        jwt,
        tmdb,
        google,
        feed,
        bcrypt_cost: settings.auth.bcrypt_cost,
        frontend_url: settings.server.frontend_url.clone(),
    };

    // Configure HTTP server
    let server = settings.server.clone();
    let workers = server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", server.host, server.port);

    let cors_settings = server.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(build_cors(&cors_settings))
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_app)
    })
    .workers(workers)
    .bind((server.host, server.port))?
    .run()
    .await
}
