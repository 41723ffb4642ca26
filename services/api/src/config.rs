//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::ops::RangeInclusive;
use tracing::Level;

const TOKEN_TTL_DAYS_RANGE: RangeInclusive<i64> = 1..=3650;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Credentials and routing for the hosted pub/sub relay.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub app_id: String,
    pub key: String,
    pub secret: String,
    pub cluster: String,
    /// Overrides `https://api-{cluster}.pusher.com` when set.
    pub host: Option<String>,
}

impl RelayConfig {
    pub fn base_url(&self) -> String {
        match &self.host {
            Some(host) => host.trim_end_matches('/').to_string(),
            None => format!("https://api-{}.pusher.com", self.cluster),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub relay: RelayConfig,
    /// Emails allowed to list and answer questions. Empty means every
    /// authenticated user may.
    pub admin_emails: Vec<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required =
            |key: &str| lookup(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()));

        // --- Load Server and Database Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = required("DATABASE_URL")?;
        let database_max_connections =
            parse_or("DATABASE_MAX_CONNECTIONS", lookup("DATABASE_MAX_CONNECTIONS"), 5)?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Session Token Settings ---
        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                "must not be empty".to_string(),
            ));
        }
        let token_ttl_days = parse_or("TOKEN_TTL_DAYS", lookup("TOKEN_TTL_DAYS"), 7)?;
        if !TOKEN_TTL_DAYS_RANGE.contains(&token_ttl_days) {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_DAYS".to_string(),
                format!(
                    "must be between {} and {} days",
                    TOKEN_TTL_DAYS_RANGE.start(),
                    TOKEN_TTL_DAYS_RANGE.end()
                ),
            ));
        }

        // --- Load Relay Settings ---
        let relay = RelayConfig {
            app_id: required("PUSHER_APP_ID")?,
            key: required("PUSHER_KEY")?,
            secret: required("PUSHER_SECRET")?,
            cluster: required("PUSHER_CLUSTER")?,
            host: lookup("PUSHER_HOST").filter(|h| !h.is_empty()),
        };

        let admin_emails = lookup("ADMIN_EMAILS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            log_level,
            jwt_secret,
            token_ttl_days,
            relay,
            admin_emails,
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
