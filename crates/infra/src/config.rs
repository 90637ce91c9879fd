//! Configuration loading and representation.
//!
//! Everything comes from environment variables. [`AppConfig::from_lookup`]
//! takes the lookup as a closure so tests never touch the process
//! environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_MONGODB_DATABASE: &str = "inventory";
pub const DEFAULT_MONGODB_COLLECTION: &str = "inventories";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5_000);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(10_000);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalConfig {
    /// `None` when neither `DATABASE_URL` nor a full `POSTGRES_*` set is given.
    pub database_url: Option<String>,
    pub max_connections: u32,
}

/// Process configuration for the HTTP service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_address: SocketAddr,
    /// `false` serves both backends from in-memory stores.
    pub use_persistent_stores: bool,
    pub document: DocumentConfig,
    pub relational: RelationalConfig,
    /// Deadline applied to requests that do not set their own.
    pub request_timeout: Duration,
    /// Budget for establishing each store connection at startup.
    pub connect_timeout: Duration,
    /// Create the relational table at startup when missing.
    pub auto_migrate: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_address = parse_or(
            "BIND_ADDRESS",
            get("BIND_ADDRESS"),
            || SocketAddr::from_str(DEFAULT_BIND_ADDRESS).map_err(|e| e.to_string()),
        )?;

        let document = DocumentConfig {
            uri: get("MONGODB_URI").unwrap_or_else(|| DEFAULT_MONGODB_URI.to_string()),
            database: get("MONGODB_DATABASE")
                .unwrap_or_else(|| DEFAULT_MONGODB_DATABASE.to_string()),
            collection: get("MONGODB_COLLECTION")
                .unwrap_or_else(|| DEFAULT_MONGODB_COLLECTION.to_string()),
        };

        let max_connections: u32 = parse_or(
            "POSTGRES_MAX_CONNECTIONS",
            get("POSTGRES_MAX_CONNECTIONS"),
            || Ok(DEFAULT_MAX_CONNECTIONS),
        )?;
        if max_connections == 0 {
            return Err(ConfigError::invalid(
                "POSTGRES_MAX_CONNECTIONS",
                "must be at least 1",
            ));
        }

        let relational = RelationalConfig {
            database_url: get("DATABASE_URL").or_else(|| postgres_url(&get)),
            max_connections,
        };

        Ok(Self {
            bind_address,
            use_persistent_stores: parse_bool(
                "USE_PERSISTENT_STORES",
                get("USE_PERSISTENT_STORES"),
                false,
            )?,
            document,
            relational,
            request_timeout: parse_millis(
                "STOCKPILE_REQUEST_TIMEOUT_MS",
                get("STOCKPILE_REQUEST_TIMEOUT_MS"),
                DEFAULT_REQUEST_TIMEOUT,
            )?,
            connect_timeout: parse_millis(
                "STOCKPILE_CONNECT_TIMEOUT_MS",
                get("STOCKPILE_CONNECT_TIMEOUT_MS"),
                DEFAULT_CONNECT_TIMEOUT,
            )?,
            auto_migrate: parse_bool(
                "STOCKPILE_AUTO_MIGRATE",
                get("STOCKPILE_AUTO_MIGRATE"),
                true,
            )?,
        })
    }
}

/// Build a connection URL from the `POSTGRES_*` variables; all five must be set.
fn postgres_url(get: &impl Fn(&str) -> Option<String>) -> Option<String> {
    let host = get("POSTGRES_HOST")?;
    let port = get("POSTGRES_PORT")?;
    let user = get("POSTGRES_USER")?;
    let password = get("POSTGRES_PASSWORD")?;
    let db = get("POSTGRES_DB")?;
    Some(format!(
        "postgres://{user}:{password}@{host}:{port}/{db}?sslmode=disable"
    ))
}

fn parse_or<T, D>(key: &'static str, raw: Option<String>, default: D) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    D: FnOnce() -> Result<T, String>,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, format!("'{raw}': {e}"))),
        None => default().map_err(|e| ConfigError::invalid(key, e)),
    }
}

fn parse_bool(key: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, format!("'{raw}' is not a boolean"))),
    }
}

fn parse_millis(
    key: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let millis: u64 = parse_or(key, raw, || Ok(default.as_millis() as u64))?;
    if millis == 0 {
        return Err(ConfigError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_millis(millis))
}
