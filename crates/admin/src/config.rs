//! Catalog admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required (when `CATALOG_STORE=postgres`)
//! - `CATALOG_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `CATALOG_STORE` - `postgres` (default) or `memory`
//! - `CATALOG_HOST` - Bind address (default: 127.0.0.1)
//! - `CATALOG_PORT` - Listen port (default: 3000)
//! - `CATALOG_MAX_UPLOAD_BYTES` - Request body limit for uploads (default: 2 MiB)
//! - `CATALOG_STATIC_DIR` - Stylesheet directory (default: crates/admin/static)
//! - `CATALOG_LOG_JSON` - Emit JSON logs when set to `1` or `true`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 1.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

/// Default request body limit: 2 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

const DEFAULT_STATIC_DIR: &str = "crates/admin/static";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which catalog store backs the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend {other:?} (expected postgres or memory)")),
        }
    }
}

/// Catalog admin application configuration.
///
/// Implements `Debug` manually to redact the database URL.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Store backend
    pub store: StoreBackend,
    /// `PostgreSQL` database connection URL (contains password).
    /// `None` for the memory backend.
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("store", &self.store)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("host", &self.host)
            .field("port", &self.port)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("static_dir", &self.static_dir)
            .field("log_json", &self.log_json)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .field("sentry_sample_rate", &self.sentry_sample_rate)
            .field("sentry_traces_sample_rate", &self.sentry_traces_sample_rate)
            .finish()
    }
}

impl CatalogConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let store = env.parse_or_default("CATALOG_STORE", StoreBackend::Postgres)?;
        let database_url = match store {
            StoreBackend::Postgres => Some(env.database_url("CATALOG_DATABASE_URL")?),
            StoreBackend::Memory => None,
        };
        let host = env.parse_or_default("CATALOG_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or_default("CATALOG_PORT", 3000_u16)?;
        let max_upload_bytes =
            env.parse_or_default("CATALOG_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let static_dir = PathBuf::from(
            env.optional("CATALOG_STATIC_DIR")
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
        );
        let log_json = env
            .optional("CATALOG_LOG_JSON")
            .is_some_and(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"));
        let sentry_dsn = env.optional("SENTRY_DSN");
        let sentry_environment = env.optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env
            .optional("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            store,
            database_url,
            host,
            port,
            max_upload_bytes,
            static_dir,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Configuration for an in-memory store on an ephemeral local port.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: StoreBackend::Memory,
            database_url: None,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helpers
// =============================================================================

struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get an optional, non-empty variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or_default<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<CatalogConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CatalogConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_for_postgres() {
        let config = load(&[("CATALOG_DATABASE_URL", "postgres://localhost/catalog")]).unwrap();
        assert_eq!(config.store, StoreBackend::Postgres);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.static_dir, PathBuf::from(DEFAULT_STATIC_DIR));
        assert!(!config.log_json);
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "CATALOG_DATABASE_URL"));
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fly/catalog")]).unwrap();
        assert_eq!(
            config.database_url.unwrap().expose_secret(),
            "postgres://fly/catalog"
        );
    }

    #[test]
    fn test_memory_store_needs_no_database() {
        let config = load(&[("CATALOG_STORE", "memory"), ("CATALOG_PORT", "8080")]).unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert!(config.database_url.is_none());
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = load(&[("CATALOG_STORE", "mongo")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "CATALOG_STORE"));

        let err = load(&[("CATALOG_STORE", "memory"), ("CATALOG_PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "CATALOG_PORT"));

        let err = load(&[("CATALOG_STORE", "memory"), ("CATALOG_HOST", "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "CATALOG_HOST"));
    }

    #[test]
    fn test_log_json_flag() {
        let config = load(&[("CATALOG_STORE", "memory"), ("CATALOG_LOG_JSON", "true")]).unwrap();
        assert!(config.log_json);
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = load(&[("CATALOG_DATABASE_URL", "postgres://user:hunter2@db/catalog")]).unwrap();
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
    }
}
