//! Environment-driven configuration structures shared by all binaries.

use std::{env, time::Duration};

use thiserror::Error;

/// API configuration: HTTP listeners, database pool and product cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    database: DatabaseConfig,
    api_bind_address: String,
    api_unix_socket: Option<String>,
    internal_bind_address: Option<String>,
    internal_unix_socket: Option<String>,
    product_cache_ttl: Duration,
}

impl ApiConfig {
    pub const DEFAULT_PRODUCT_CACHE_TTL: Duration = Duration::from_secs(60);

    /// Loads the environment variables required by the API binary.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let database = DatabaseConfig::load_from_env()?;

        let product_cache_ttl = get_optional_number("API_PRODUCT_CACHE_TTL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(Self::DEFAULT_PRODUCT_CACHE_TTL);

        Ok(Self {
            database,
            api_bind_address: get_required_var("API_BIND_ADDRESS")?,
            api_unix_socket: get_optional_var("API_UNIX_SOCKET"),
            internal_bind_address: get_optional_var("API_INTERNAL_BIND_ADDRESS"),
            internal_unix_socket: get_optional_var("API_INTERNAL_UNIX_SOCKET"),
            product_cache_ttl,
        })
    }

    pub fn database(&self) -> &DatabaseConfig {
        &self.database
    }

    pub fn database_url(&self) -> &str {
        self.database.url()
    }

    pub fn api_bind_address(&self) -> &str {
        &self.api_bind_address
    }

    pub fn api_unix_socket(&self) -> Option<&str> {
        self.api_unix_socket.as_deref()
    }

    pub fn internal_bind_address(&self) -> Option<&str> {
        self.internal_bind_address.as_deref()
    }

    pub fn internal_unix_socket(&self) -> Option<&str> {
        self.internal_unix_socket.as_deref()
    }

    pub fn has_internal_listener(&self) -> bool {
        self.internal_bind_address.is_some() || self.internal_unix_socket.is_some()
    }

    pub fn product_cache_ttl(&self) -> Duration {
        self.product_cache_ttl
    }
}

/// Database settings shared by the API and the catalogue seeding tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    url: String,
    max_connections: Option<u32>,
}

impl DatabaseConfig {
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        let max_connections = get_optional_number("API_DB_MAX_CONNECTIONS")?
            .map(|value| {
                u32::try_from(value)
                    .ok()
                    .filter(|value| *value > 0)
                    .ok_or(ConfigError::OutOfRange {
                        key: "API_DB_MAX_CONNECTIONS",
                    })
            })
            .transpose()?;

        Ok(Self {
            url: get_required_var("DATABASE_URL")?,
            max_connections,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn max_connections(&self) -> Option<u32> {
        self.max_connections
    }
}

fn get_required_var(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(ConfigError::MissingVar { key })
            } else {
                Ok(trimmed.to_string())
            }
        }
        Err(_) => Err(ConfigError::MissingVar { key }),
    }
}

/// Reads `key`, trimmed; unset and blank values are both `None`.
pub(crate) fn get_optional_var(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn get_optional_number(key: &'static str) -> Result<Option<u64>, ConfigError> {
    get_optional_var(key)
        .map(|value| {
            value
                .parse()
                .map_err(|source| ConfigError::InvalidNumber { key, source })
        })
        .transpose()
}

pub fn hydrate_env_file() -> Result<(), ConfigError> {
    if env::var_os("STOREFRONT_SKIP_DOTENV").is_some() {
        return Ok(());
    }
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(ConfigError::Dotenv { source: err }),
    }

    Ok(())
}

/// Errors emitted when `.env` hydration or environment parsing fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{key}`")]
    MissingVar { key: &'static str },
    #[error("invalid integer in `{key}`: {source}")]
    InvalidNumber {
        key: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("value of `{key}` is out of range")]
    OutOfRange { key: &'static str },
    #[error("failed to load .env file: {source}")]
    Dotenv {
        #[from]
        source: dotenvy::Error,
    },
}
