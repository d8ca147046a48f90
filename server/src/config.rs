//! Server configuration read from the environment.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `session` (default) | `database`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=database`)
//! - `HOST`: bind host, a name or an address (default: `127.0.0.1`)
//! - `PORT`: bind port (default: `3000`)
//! - `SESSION_IDLE_MINUTES`: minutes before an untouched session is dropped (default: `1440`)

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::session::DEFAULT_IDLE_TIMEOUT;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

/// Where lists and todos are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// One in-memory store per browser session, lost when the process exits.
    #[default]
    Session,
    /// A `PostgreSQL` database shared by every session.
    Database,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "session" | "memory" | "in_memory" => Ok(Self::Session),
            "database" | "postgres" | "postgresql" | "pg" => Ok(Self::Database),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("invalid STORAGE_MODE '{0}': expected 'session' or 'database'")]
    InvalidStorageMode(String),

    #[error("DATABASE_URL is required when STORAGE_MODE=database")]
    MissingDatabaseUrl,

    #[error("invalid PORT '{0}'")]
    InvalidPort(String),

    #[error("invalid SESSION_IDLE_MINUTES '{0}': expected a positive number of minutes")]
    InvalidSessionIdle(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub storage_mode: StorageMode,
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub session_idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::default(),
            database_url: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            session_idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// # Errors
    ///
    /// Returns `ConfigurationError` when a variable holds an unusable value or
    /// `DATABASE_URL` is missing in database mode.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let storage_mode = present("STORAGE_MODE")
            .map(|value| value.parse::<StorageMode>())
            .transpose()?
            .unwrap_or_default();

        let database_url = present("DATABASE_URL");
        if storage_mode == StorageMode::Database && database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }

        let host = present("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match present("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigurationError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let session_idle_timeout = match present("SESSION_IDLE_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .and_then(|minutes| minutes.checked_mul(60))
                .map(Duration::from_secs)
                .ok_or(ConfigurationError::InvalidSessionIdle(raw))?,
            None => DEFAULT_IDLE_TIMEOUT,
        };

        Ok(Self {
            storage_mode,
            database_url,
            host,
            port,
            session_idle_timeout,
        })
    }

    /// `(host, port)` for `TcpListener::bind`, which resolves host names.
    pub fn bind_address(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigurationError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[rstest]
    #[case("session", StorageMode::Session)]
    #[case("in_memory", StorageMode::Session)]
    #[case("Database", StorageMode::Database)]
    #[case("postgres", StorageMode::Database)]
    #[case("pg", StorageMode::Database)]
    fn parses_storage_mode(#[case] raw: &str, #[case] expected: StorageMode) {
        assert_eq!(raw.parse::<StorageMode>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_storage_mode() {
        assert_eq!(
            "redis".parse::<StorageMode>(),
            Err(ConfigurationError::InvalidStorageMode("redis".into()))
        );
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(config_from(&[]), Ok(ServerConfig::default()));
    }

    #[test]
    fn database_mode_requires_url() {
        assert_eq!(
            config_from(&[("STORAGE_MODE", "database")]),
            Err(ConfigurationError::MissingDatabaseUrl)
        );
    }

    #[test]
    fn database_mode_with_url() {
        let config = config_from(&[
            ("STORAGE_MODE", "database"),
            ("DATABASE_URL", "postgres://localhost/todos"),
            ("PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(config.storage_mode, StorageMode::Database);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/todos"));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn rejects_bad_port() {
        assert_eq!(
            config_from(&[("PORT", "eighty")]),
            Err(ConfigurationError::InvalidPort("eighty".into()))
        );
    }

    #[rstest]
    #[case("0.0.0.0", "4567", ("0.0.0.0", 4567))]
    #[case("localhost", "8080", ("localhost", 8080))]
    fn bind_address_keeps_host_names(
        #[case] host: &str,
        #[case] port: &str,
        #[case] expected: (&str, u16),
    ) {
        let config = config_from(&[("HOST", host), ("PORT", port)]).unwrap();
        assert_eq!(config.bind_address(), expected);
    }

    #[tokio::test]
    async fn host_name_binds() {
        let config = config_from(&[("HOST", "localhost"), ("PORT", "0")]).unwrap();
        let listener = tokio::net::TcpListener::bind(config.bind_address())
            .await
            .unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[test]
    fn session_idle_minutes_are_read() {
        let config = config_from(&[("SESSION_IDLE_MINUTES", "30")]).unwrap();
        assert_eq!(config.session_idle_timeout, Duration::from_secs(30 * 60));
    }

    #[rstest]
    #[case("0")]
    #[case("soon")]
    fn rejects_bad_session_idle(#[case] raw: &str) {
        assert_eq!(
            config_from(&[("SESSION_IDLE_MINUTES", raw)]),
            Err(ConfigurationError::InvalidSessionIdle(raw.into()))
        );
    }
}
