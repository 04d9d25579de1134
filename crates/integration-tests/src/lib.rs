//! Integration tests for Catalog Keeper.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p catalog-integration-tests
//! ```
//!
//! Every test runs against a fresh [`MemoryCatalogStore`], so no database
//! is needed.
//!
//! # Test Categories
//!
//! - `catalog_service` - Validation, idempotent creation, delete gate, detail resolution
//! - `admin_routes` - The HTTP surface driven through `tower::ServiceExt::oneshot`
//! - `catalog_races` - Writes interleaved with other requests, via a store that
//!   serves stale reads

use std::sync::Arc;

use axum::Router;

use catalog_admin::config::CatalogConfig;
use catalog_admin::db::MemoryCatalogStore;
use catalog_admin::models::{
    Brand, BrandForm, Category, CategoryForm, Item, ItemForm, ItemInstance, ItemInstanceForm,
};
use catalog_admin::routes;
use catalog_admin::services::{CatalogEntity, CatalogService, WriteOutcome};
use catalog_admin::state::AppState;
use catalog_core::{BrandId, CategoryId, ItemId, ItemInstanceId};

/// A service and the in-memory store behind it.
pub struct TestCatalog {
    pub store: Arc<MemoryCatalogStore>,
    pub service: CatalogService,
}

impl TestCatalog {
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryCatalogStore::new());
        let service = CatalogService::new(store.clone());
        Self { store, service }
    }

    /// The admin router over the same store.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router_with(CatalogConfig::in_memory())
    }

    /// The admin router over the same store, with custom settings.
    #[must_use]
    pub fn router_with(&self, config: CatalogConfig) -> Router {
        routes::app(AppState::new(config, self.store.clone()))
    }

    /// Create a valid brand.
    ///
    /// # Panics
    ///
    /// Panics if the brand is rejected.
    pub async fn brand(&self, name: &str) -> BrandId {
        let form = BrandForm {
            name: name.to_string(),
            description: format!("{name} description"),
            location: "Oslo".to_string(),
        };
        created::<Brand>(self.service.create::<Brand>(form, None).await)
    }

    /// Create a valid category.
    ///
    /// # Panics
    ///
    /// Panics if the category is rejected.
    pub async fn category(&self, name: &str) -> CategoryId {
        let form = CategoryForm {
            name: name.to_string(),
            description: format!("{name} description"),
        };
        created::<Category>(self.service.create::<Category>(form, None).await)
    }

    /// Create a valid item.
    ///
    /// # Panics
    ///
    /// Panics if the item is rejected.
    pub async fn item(&self, title: &str, brand: BrandId, categories: &[CategoryId]) -> ItemId {
        created::<Item>(
            self.service
                .create::<Item>(item_form(title, brand, categories), None)
                .await,
        )
    }

    /// Create a valid item instance.
    ///
    /// # Panics
    ///
    /// Panics if the instance is rejected.
    pub async fn instance(&self, item: ItemId, size: &str) -> ItemInstanceId {
        let form = ItemInstanceForm {
            size: size.to_string(),
            price: "19.99".to_string(),
            in_stock: "3".to_string(),
            item: item.to_string(),
        };
        created::<ItemInstance>(self.service.create::<ItemInstance>(form, None).await)
    }
}

impl Default for TestCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Item form referencing `brand` and `categories`.
#[must_use]
pub fn item_form(title: &str, brand: BrandId, categories: &[CategoryId]) -> ItemForm {
    ItemForm {
        title: title.to_string(),
        description: format!("{title} description"),
        product_id: "1001".to_string(),
        brand: brand.to_string(),
        category: categories.iter().map(ToString::to_string).collect(),
    }
}

/// Boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "catalog-test-boundary";

/// An uploaded file part: file name, content type and bytes.
pub type FilePart<'a> = (&'a str, &'a str, &'a [u8]);

/// Encode text fields and an optional `image` part as `multipart/form-data`.
///
/// Returns the `Content-Type` header value and the body.
#[must_use]
pub fn multipart_body(fields: &[(&str, &str)], image: Option<FilePart<'_>>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, data)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

#[allow(clippy::panic)]
fn created<T: CatalogEntity>(
    outcome: Result<WriteOutcome<T::Id, T::Form>, catalog_admin::services::CatalogError>,
) -> T::Id {
    match outcome {
        Ok(WriteOutcome::Created(id) | WriteOutcome::Existing(id)) => id,
        other => panic!("expected {} to be created, got {other:?}", T::KIND),
    }
}
