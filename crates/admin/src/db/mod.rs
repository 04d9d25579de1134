//! Catalog persistence.
//!
//! # Tables
//!
//! - `catalog.brands` - Brands, with an optional inline image
//! - `catalog.categories` - Categories (names stored uppercased)
//! - `catalog.items` - Products, each referencing exactly one brand
//! - `catalog.item_categories` - Item ↔ category links, ordered by `position`
//! - `catalog.item_instances` - Purchasable sizes/prices of an item
//!
//! Foreign keys are `ON DELETE RESTRICT` (except the link table, which
//! cascades with its item) so the database refuses anything the catalog
//! service's delete gate would have refused.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p catalog-cli -- migrate
//! ```
//!
//! # Backends
//!
//! - [`PgCatalogStore`] - `PostgreSQL` via `sqlx`
//! - [`MemoryCatalogStore`] - process-local maps, for tests and demos

pub mod brands;
pub mod categories;
pub mod item_instances;
pub mod items;
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use catalog_core::StoredImage;

use crate::config::{CatalogConfig, StoreBackend};
use crate::models::{Brand, Category, Item, ItemInstance};
use crate::services::catalog::CatalogEntity;

pub use memory::MemoryCatalogStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The write would break a foreign key (a dependent row still exists).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The write would duplicate a unique natural key.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// The store cannot be reached.
    #[error("store unavailable")]
    Unavailable,
}

impl StoreError {
    /// Translate a sqlx error, surfacing foreign key violations as `Conflict`
    /// and unique violations as `Duplicate`.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_foreign_key_violation() {
                return Self::Conflict(db_err.message().to_string());
            }
            if db_err.is_unique_violation() {
                return Self::Duplicate(db_err.message().to_string());
            }
        }
        Self::Database(err)
    }
}

/// Ordering applied to `find_many`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    /// Store order (ascending id).
    #[default]
    Unsorted,
    /// Ascending by the record's label (brand/category name, item title,
    /// instance size), ties broken by id.
    ByLabel,
}

/// Which columns `find_many` loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// Whole records, image bytes included.
    Full,
    /// Records without their image, for listings, counts and dependency
    /// checks.
    #[default]
    Summary,
}

impl Projection {
    /// Select-list expression for an image bytes column.
    pub(crate) fn image_data(self, column: &str) -> String {
        match self {
            Self::Full => column.to_string(),
            Self::Summary => "NULL::bytea AS image_data".to_string(),
        }
    }
}

/// CRUD access to one collection of catalog records.
#[async_trait]
pub trait Collection<T: CatalogEntity>: Send + Sync {
    /// Fetch one record by id.
    async fn find_by_id(&self, id: T::Id) -> Result<Option<T>, StoreError>;

    /// Fetch every record matching `filter`.
    async fn find_many(
        &self,
        filter: &T::Filter,
        order: ListOrder,
        projection: Projection,
    ) -> Result<Vec<T>, StoreError>;

    /// Persist a new record and return it with its assigned id.
    async fn insert(&self, draft: T::Draft) -> Result<T, StoreError>;

    /// Replace the mutable fields of an existing record.
    ///
    /// Returns `None` if no record has this id.
    async fn replace_by_id(&self, id: T::Id, draft: T::Draft) -> Result<Option<T>, StoreError>;

    /// Remove a record unless it is protected.
    ///
    /// Returns whether a record was removed; `false` means the id is absent
    /// or the record is protected at the time of the delete.
    async fn delete_by_id(&self, id: T::Id) -> Result<bool, StoreError>;

    /// Fetch the first record matching `filter`, without its image.
    async fn find_one(&self, filter: &T::Filter) -> Result<Option<T>, StoreError> {
        Ok(self
            .find_many(filter, ListOrder::Unsorted, Projection::Summary)
            .await?
            .into_iter()
            .next())
    }
}

/// The catalog's document store: one collection per record kind.
///
/// Built once at startup and shared behind an `Arc`.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    fn brands(&self) -> &dyn Collection<Brand>;
    fn categories(&self) -> &dyn Collection<Category>;
    fn items(&self) -> &dyn Collection<Item>;
    fn item_instances(&self) -> &dyn Collection<ItemInstance>;

    /// Verify the store can serve requests.
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// `PostgreSQL`-backed catalog store.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    fn brands(&self) -> &dyn Collection<Brand> {
        self
    }

    fn categories(&self) -> &dyn Collection<Category> {
        self
    }

    fn items(&self) -> &dyn Collection<Item> {
        self
    }

    fn item_instances(&self) -> &dyn Collection<ItemInstance> {
        self
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Rebuild an optional image from its three nullable columns.
pub(crate) fn image_from_columns(
    file_name: Option<String>,
    content_type: Option<String>,
    data: Option<Vec<u8>>,
) -> Option<StoredImage> {
    match (file_name, content_type, data) {
        (Some(file_name), Some(content_type), Some(data)) => Some(
            StoredImage::new(file_name, content_type, data),
        ),
        _ => None,
    }
}

/// Split an optional image into its three nullable columns.
pub(crate) fn image_columns(
    image: Option<&StoredImage>,
) -> (Option<&str>, Option<&str>, Option<&[u8]>) {
    image.map_or((None, None, None), |img| {
        (
            Some(img.file_name.as_str()),
            Some(img.content_type.as_str()),
            Some(img.data.as_slice()),
        )
    })
}

/// Open the store selected by configuration.
///
/// # Errors
///
/// Returns `StoreError::Database` if the `PostgreSQL` pool cannot connect,
/// and `StoreError::Unavailable` if no database URL was configured.
pub async fn connect(config: &CatalogConfig) -> Result<Arc<dyn CatalogStore>, StoreError> {
    match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory catalog store; data is lost on exit");
            Ok(Arc::new(MemoryCatalogStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config.database_url.as_ref().ok_or(StoreError::Unavailable)?;
            let pool = create_pool(url).await?;
            tracing::info!("Database pool created");
            Ok(Arc::new(PgCatalogStore::new(pool)))
        }
    }
}
