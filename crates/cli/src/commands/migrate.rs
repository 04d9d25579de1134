//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! catalog-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Catalog migrations live in `crates/admin/migrations/`. The server never
//! applies them on startup.

use thiserror::Error;

use catalog_admin::db::create_pool;

use super::{CommandError, database_url};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Connection settings could not be resolved.
    #[error(transparent)]
    Setup(#[from] CommandError),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run catalog database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the database can't be
/// reached, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let url = database_url()?;

    tracing::info!("Connecting to catalog database...");
    let pool = create_pool(&url).await?;

    tracing::info!("Running catalog migrations...");
    sqlx::migrate!("../admin/migrations").run(&pool).await?;

    tracing::info!("Catalog migrations complete!");
    Ok(())
}
