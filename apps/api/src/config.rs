use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use authz_application::{CacheTtls, CircuitBreakerConfig, RateLimiterConfig};
use authz_core::AppError;
use tracing_subscriber::EnvFilter;

/// Output format for structured logs, set via `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Newline-delimited JSON, for log aggregators.
    Json,
    /// Compact, human-readable text, for local development.
    Text,
}

/// Resolved configuration for the API process.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_password: Option<String>,
    pub redis_db: u8,
    pub cache_ttls: CacheTtls,
    pub circuit_breaker: CircuitBreakerConfig,
    pub rate_limiter: RateLimiterConfig,
    pub log_level: String,
    pub log_format: LogFormat,
    pub host: String,
    pub port: u16,
    pub service_token: String,
}

impl ApiConfig {
    /// Loads configuration from the process environment, failing fast on
    /// missing required variables or malformed values.
    pub fn load() -> Result<Self, AppError> {
        let database_url = required_env("DATABASE_URL")?;
        let service_token = required_env("SERVICE_TOKEN")?;

        let redis_host = env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let redis_port = parse_env_u16("REDIS_PORT", 6379)?;
        let redis_password = env::var("REDIS_PASSWORD").ok().filter(|value| !value.is_empty());
        let redis_db = parse_env_u8("REDIS_DB", 0)?;

        let cache_ttls = CacheTtls {
            decision_seconds: parse_env_u64("CACHE_TTL_AUTHORIZATION", 300)?,
            role_hierarchy_seconds: parse_env_u64("CACHE_TTL_ROLE_HIERARCHY", 3600)?,
            policy_seconds: parse_env_u64("CACHE_TTL_POLICY", 1800)?,
            tenant_config_seconds: parse_env_u64("CACHE_TTL_TENANT_CONFIG", 7200)?,
        };

        let rate_limiter = RateLimiterConfig {
            max_tokens: parse_env_u32("RATE_LIMIT_MAX_TOKENS", 100)?,
            interval_seconds: parse_env_u64("RATE_LIMIT_INTERVAL_SECONDS", 60)?,
        };

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
        let log_format = match env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_owned()).as_str() {
            "json" => LogFormat::Json,
            "text" => LogFormat::Text,
            other => {
                return Err(AppError::InvalidRequest(format!(
                    "LOG_FORMAT must be either 'json' or 'text', got '{other}'"
                )));
            }
        };

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let port = parse_env_u16("PORT", 8080)?;

        Ok(Self {
            database_url,
            redis_host,
            redis_port,
            redis_password,
            redis_db,
            cache_ttls,
            circuit_breaker: CircuitBreakerConfig::default(),
            rate_limiter,
            log_level,
            log_format,
            host,
            port,
            service_token,
        })
    }

    /// Builds the Redis connection URL from the discrete `REDIS_*` variables.
    #[must_use]
    pub fn redis_url(&self) -> String {
        let auth = self
            .redis_password
            .as_deref()
            .map(|password| format!(":{password}@"))
            .unwrap_or_default();
        format!("redis://{auth}{}:{}/{}", self.redis_host, self.redis_port, self.redis_db)
    }

    /// Resolves the address the HTTP listener should bind to.
    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.host)
            .map_err(|error| AppError::Internal(format!("invalid HOST '{}': {error}", self.host)))?;
        Ok(SocketAddr::from((host, self.port)))
    }
}

/// Initializes the global `tracing` subscriber per `LOG_LEVEL`/`LOG_FORMAT`.
pub fn init_tracing(log_level: &str, format: LogFormat) {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).json().init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).compact().init();
        }
    }
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::InvalidRequest(format!("{name} is required")))
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, AppError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<u16>()
            .map_err(|error| AppError::InvalidRequest(format!("invalid {name} value '{value}': {error}"))),
        Err(_) => Ok(default),
    }
}

fn parse_env_u8(name: &str, default: u8) -> Result<u8, AppError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<u8>()
            .map_err(|error| AppError::InvalidRequest(format!("invalid {name} value '{value}': {error}"))),
        Err(_) => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, AppError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<u32>()
            .map_err(|error| AppError::InvalidRequest(format!("invalid {name} value '{value}': {error}"))),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, AppError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .map_err(|error| AppError::InvalidRequest(format!("invalid {name} value '{value}': {error}"))),
        Err(_) => Ok(default),
    }
}
