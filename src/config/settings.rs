//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Redis configuration (shared cache tier)
    pub redis: RedisSettings,

    /// Token signing settings
    pub auth: AuthSettings,

    /// Cache tier settings
    pub cache: CacheSettings,

    /// Identifier of this deployment, stamped into issued tokens
    pub realm_id: String,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis connection URL
    pub url: String,

    /// Keep serving (L1 + fetch only) when Redis is unreachable at startup
    pub failover: bool,
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Symmetric signing secret
    pub secret: String,

    /// Key identifier placed in token headers, so the secret can rotate
    pub key_id: String,

    /// Access token expiry in minutes
    pub access_token_expiry_minutes: i64,

    /// Refresh token expiry in days
    pub refresh_token_expiry_days: i64,
}

/// Cache tier configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Global cache on/off switch
    pub enabled: bool,

    /// Key namespace, e.g. "roost-core"
    pub namespace: String,

    /// Schema version segment of cache keys; bump to invalidate everything
    pub schema_version: String,

    /// Base L2 TTL in seconds (jitter is added on top)
    pub ttl_seconds: u64,

    /// Jitter fraction in [0, 1] applied to the base TTL
    pub ttl_jitter: f64,

    /// In-process L1 cache switch
    pub l1_enabled: bool,

    /// L1 size bound in bytes
    pub l1_max_bytes: u64,

    /// L1 entry TTL in seconds
    pub l1_ttl_seconds: u64,

    /// Export L1 size as a gauge
    pub l1_metrics: bool,
}

/// Minimum required length for the token signing secret (256 bits).
pub const MIN_TOKEN_SECRET_LENGTH: usize = 32;

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. built-in defaults
    /// 2. config/default.toml, then config/{RUN_ENV}.toml (both optional)
    /// 3. environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed, or
    /// if validation fails (short secret, bad jitter range).
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("realm_id", "local")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8090)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("redis.url", "redis://localhost:6379")?
            .set_default("redis.failover", false)?
            .set_default("auth.key_id", "v1")?
            .set_default("auth.access_token_expiry_minutes", 24 * 60)?
            .set_default("auth.refresh_token_expiry_days", 7)?
            .set_default("cache.enabled", true)?
            .set_default("cache.namespace", "roost-core")?
            .set_default("cache.schema_version", "v1")?
            .set_default("cache.ttl_seconds", 600)?
            .set_default("cache.ttl_jitter", 0.15)?
            .set_default("cache.l1_enabled", true)?
            .set_default("cache.l1_max_bytes", 100 * 1024 * 1024_i64)?
            .set_default("cache.l1_ttl_seconds", 300)?
            .set_default("cache.l1_metrics", false)?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=8090 -> server.port = 8090
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Flat aliases for the common variables
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option("auth.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("auth.key_id", std::env::var("JWT_KEY_ID").ok())?
            .set_override_option("realm_id", std::env::var("REALM_ID").ok())?
            .set_override_option("cache.enabled", std::env::var("CACHE_ENABLED").ok())?
            .set_override_option("cache.namespace", std::env::var("CACHE_NAMESPACE").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| settings.validate())
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.auth.secret.len() < MIN_TOKEN_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "token secret must be at least {} characters, got {}",
                MIN_TOKEN_SECRET_LENGTH,
                self.auth.secret.len()
            )));
        }

        if !(0.0..=1.0).contains(&self.cache.ttl_jitter) {
            return Err(ConfigError::Message(
                "cache.ttl_jitter must be within 0..1".into(),
            ));
        }

        if self.cache.enabled && self.cache.namespace.is_empty() {
            return Err(ConfigError::Message(
                "cache.namespace is required when the cache is enabled".into(),
            ));
        }

        if self.cache.l1_enabled && self.cache.l1_max_bytes == 0 {
            return Err(ConfigError::Message(
                "cache.l1_max_bytes must be > 0 when L1 is enabled".into(),
            ));
        }

        Ok(self)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
