//! Centralized configuration (environment variables + defaults).

use crate::domain::{PriceCatalog, DEFAULT_CATALOG};
use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(format!("expected postgres or memory, got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub storage_backend: StorageBackend,
    /// Set whenever `storage_backend` is `Postgres`.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub request_timeout: Duration,
    pub session_cookie_name: String,
    pub session_cookie_max_age: Duration,
    pub catalog: PriceCatalog,
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Unset and blank keys
    /// take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let server_host = get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let server_port = parse_or("SERVER_PORT", get("SERVER_PORT"), 3000u16)?;
        let storage_backend = parse_or("STORAGE_BACKEND", get("STORAGE_BACKEND"), StorageBackend::Postgres)?;

        let database_url = match storage_backend {
            StorageBackend::Memory => None,
            StorageBackend::Postgres => Some(database_url(&get)?),
        };

        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 5u32)?.max(1);
        let timeout_ms = parse_or("REQUEST_TIMEOUT_MS", get("REQUEST_TIMEOUT_MS"), 5000u64)?;
        let session_cookie_name =
            get("SESSION_COOKIE_NAME").unwrap_or_else(|| "ice_session_id".to_string());
        let cookie_max_age = parse_or("SESSION_COOKIE_MAX_AGE_SECS", get("SESSION_COOKIE_MAX_AGE_SECS"), 3600u64)?;
        let catalog = PriceCatalog::parse(&get("PRICE_CATALOG").unwrap_or_else(|| DEFAULT_CATALOG.to_string()))?;

        Ok(Self {
            server_host,
            server_port,
            storage_backend,
            database_url,
            db_max_connections,
            request_timeout: Duration::from_millis(timeout_ms),
            session_cookie_name,
            session_cookie_max_age: Duration::from_secs(cookie_max_age),
            catalog,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}

/// `DATABASE_URL` wins; otherwise the URL is assembled from the `DB_*` parts.
fn database_url<G>(get: &G) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    if let Some(url) = get("DATABASE_URL") {
        return Ok(url);
    }
    let (Some(host), Some(name), Some(user)) = (get("DB_HOST"), get("DB_NAME"), get("DB_USERNAME")) else {
        return Err(ConfigError::MissingDatabase);
    };
    let port = parse_or("DB_PORT", get("DB_PORT"), 5432u16)?;
    let credentials = match get("DB_PASSWORD") {
        Some(password) => format!("{}:{}", encode(&user), encode(&password)),
        None => encode(&user),
    };
    Ok(format!("postgres://{}@{}:{}/{}", credentials, host, port, name))
}

fn encode(component: &str) -> String {
    url::form_urlencoded::byte_serialize(component.as_bytes()).collect()
}
