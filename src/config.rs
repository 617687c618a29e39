use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub oauth: OAuthSettings,
    #[serde(default)]
    pub tmdb: Option<TmdbSettings>,
    #[serde(default)]
    pub discover: DiscoverSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_frontend_url() -> String { "http://localhost:5173".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    /// Redis is optional; without it only the in-process tier is used.
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_token_ttl() -> i64 { 7 * 24 * 3600 }
fn default_bcrypt_cost() -> u32 { bcrypt::DEFAULT_COST }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthSettings {
    /// Present only when both client id and secret are set
    #[serde(default, deserialize_with = "google_if_configured")]
    pub google: Option<GoogleOAuthSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleOAuthSettings {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_google_redirect")]
    pub redirect_url: String,
    #[serde(default = "default_google_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_google_token_url")]
    pub token_url: String,
    #[serde(default = "default_google_userinfo_url")]
    pub userinfo_url: String,
}

fn google_if_configured<'de, D>(deserializer: D) -> Result<Option<GoogleOAuthSettings>, D::Error>
where
    D: Deserializer<'de>,
{
    let google = Option::<GoogleOAuthSettings>::deserialize(deserializer)?;
    Ok(google.filter(|g| !g.client_id.is_empty() && !g.client_secret.is_empty()))
}

fn default_google_redirect() -> String {
    "http://localhost:4000/api/auth/google/callback".to_string()
}
fn default_google_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}
fn default_google_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}
fn default_google_userinfo_url() -> String {
    "https://openidconnect.googleapis.com/v1/userinfo".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSettings {
    pub api_key: String,
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
    #[serde(default = "default_tmdb_timeout")]
    pub timeout_secs: u64,
}

fn default_tmdb_base_url() -> String { "https://api.themoviedb.org/3".to_string() }
fn default_tmdb_timeout() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverSettings {
    #[serde(default = "default_discover_limit")]
    pub default_limit: u16,
    #[serde(default = "default_discover_max_limit")]
    pub max_limit: u16,
    #[serde(default = "default_overfetch_factor")]
    pub overfetch_factor: u16,
}

impl Default for DiscoverSettings {
    fn default() -> Self {
        Self {
            default_limit: default_discover_limit(),
            max_limit: default_discover_max_limit(),
            overfetch_factor: default_overfetch_factor(),
        }
    }
}

fn default_discover_limit() -> u16 { 20 }
fn default_discover_max_limit() -> u16 { 50 }
fn default_overfetch_factor() -> u16 { 3 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with FILMMATCH__)
    /// 5. Well-known variables such as DATABASE_URL and JWT_SECRET
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., FILMMATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("FILMMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_env_overrides(settings, |key| std::env::var(key).ok())?.try_deserialize()
    }
}

/// Variables that map onto a settings key when present in the environment.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("DATABASE_URL", "database.url"),
    ("JWT_SECRET", "auth.jwt_secret"),
    ("TMDB_API_KEY", "tmdb.api_key"),
    ("GOOGLE_CLIENT_ID", "oauth.google.client_id"),
    ("GOOGLE_CLIENT_SECRET", "oauth.google.client_secret"),
];

fn apply_env_overrides<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in ENV_OVERRIDES {
        if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
            builder = builder.set_override(*key, value)?;
        }
    }

    builder.build()
}
