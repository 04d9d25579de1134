//! CLI command implementations.

pub mod migrate;
pub mod protect;
pub mod seed;

use catalog_admin::config::CatalogConfig;
use catalog_admin::db::{PgCatalogStore, create_pool};
use catalog_admin::services::CatalogService;
use secrecy::SecretString;

/// Errors shared by commands that talk to the catalog database.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] catalog_admin::config::ConfigError),

    /// No database URL is configured.
    #[error("Missing environment variable: CATALOG_DATABASE_URL")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// A catalog operation failed.
    #[error(transparent)]
    Catalog(#[from] catalog_admin::services::CatalogError),

    /// A sample record failed validation.
    #[error("Sample {kind} rejected: {errors}")]
    Rejected {
        kind: catalog_core::EntityKind,
        errors: String,
    },
}

/// Database URL from the same environment the server reads.
pub fn database_url() -> Result<SecretString, CommandError> {
    let config = CatalogConfig::from_env()?;
    config.database_url.ok_or(CommandError::MissingDatabaseUrl)
}

/// Catalog service over a fresh `PostgreSQL` pool.
pub async fn catalog_service() -> Result<CatalogService, CommandError> {
    let url = database_url()?;
    tracing::info!("Connecting to catalog database...");
    let pool = create_pool(&url).await?;
    Ok(CatalogService::new(std::sync::Arc::new(PgCatalogStore::new(
        pool,
    ))))
}
