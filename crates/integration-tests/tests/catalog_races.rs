//! Integration tests for writes that interleave with other requests.
//!
//! [`RacingStore`] wraps the in-memory store and serves one stale read or
//! one refused write on demand, reproducing what a concurrent request
//! could do between the service's checks and its write.

#![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use catalog_admin::db::{
    CatalogStore, Collection, ListOrder, MemoryCatalogStore, Projection, StoreError,
};
use catalog_admin::models::{
    Brand, BrandDraft, BrandFilter, Category, CategoryDraft, CategoryFilter, CategoryForm, Item,
    ItemDraft, ItemFilter, ItemInstance,
};
use catalog_admin::services::{BlockReason, CatalogService, ConfirmOutcome, WriteOutcome};
use catalog_core::{BrandId, CategoryId};
use catalog_integration_tests::TestCatalog;

/// Brands whose next read or delete races another request.
struct RacingBrands {
    inner: Arc<MemoryCatalogStore>,
    /// The next `find_by_id` returns the record as it was before it was
    /// protected.
    stale_unprotected: AtomicBool,
    /// The next `delete_by_id` hits an item filed under the brand after the
    /// gate ran, the way a foreign key refuses the delete.
    item_added_before_delete: AtomicBool,
}

#[async_trait]
impl Collection<Brand> for RacingBrands {
    async fn find_by_id(&self, id: BrandId) -> Result<Option<Brand>, StoreError> {
        let brand = self.inner.brands().find_by_id(id).await?;
        if self.stale_unprotected.swap(false, Ordering::SeqCst) {
            return Ok(brand.map(|brand| Brand {
                protected: false,
                ..brand
            }));
        }
        Ok(brand)
    }

    async fn find_many(
        &self,
        filter: &BrandFilter,
        order: ListOrder,
        projection: Projection,
    ) -> Result<Vec<Brand>, StoreError> {
        self.inner.brands().find_many(filter, order, projection).await
    }

    async fn insert(&self, draft: BrandDraft) -> Result<Brand, StoreError> {
        self.inner.brands().insert(draft).await
    }

    async fn replace_by_id(
        &self,
        id: BrandId,
        draft: BrandDraft,
    ) -> Result<Option<Brand>, StoreError> {
        self.inner.brands().replace_by_id(id, draft).await
    }

    async fn delete_by_id(&self, id: BrandId) -> Result<bool, StoreError> {
        if self.item_added_before_delete.swap(false, Ordering::SeqCst) {
            self.inner
                .items()
                .insert(ItemDraft {
                    title: "Late arrival".to_string(),
                    description: "Filed during the delete".to_string(),
                    product_id: 7,
                    brand_id: id,
                    category_ids: Vec::new(),
                    image: None,
                    protected: false,
                })
                .await?;
            return Err(StoreError::Conflict("items_brand_id_fkey".to_string()));
        }
        self.inner.brands().delete_by_id(id).await
    }
}

/// Categories whose next listing misses a record another request just stored.
struct RacingCategories {
    inner: Arc<MemoryCatalogStore>,
    stale_listing: AtomicBool,
}

#[async_trait]
impl Collection<Category> for RacingCategories {
    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        self.inner.categories().find_by_id(id).await
    }

    async fn find_many(
        &self,
        filter: &CategoryFilter,
        order: ListOrder,
        projection: Projection,
    ) -> Result<Vec<Category>, StoreError> {
        if self.stale_listing.swap(false, Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        self.inner
            .categories()
            .find_many(filter, order, projection)
            .await
    }

    async fn insert(&self, draft: CategoryDraft) -> Result<Category, StoreError> {
        self.inner.categories().insert(draft).await
    }

    async fn replace_by_id(
        &self,
        id: CategoryId,
        draft: CategoryDraft,
    ) -> Result<Option<Category>, StoreError> {
        self.inner.categories().replace_by_id(id, draft).await
    }

    async fn delete_by_id(&self, id: CategoryId) -> Result<bool, StoreError> {
        self.inner.categories().delete_by_id(id).await
    }
}

struct RacingStore {
    inner: Arc<MemoryCatalogStore>,
    brands: RacingBrands,
    categories: RacingCategories,
}

impl RacingStore {
    fn over(inner: &Arc<MemoryCatalogStore>) -> Arc<Self> {
        Arc::new(Self {
            inner: inner.clone(),
            brands: RacingBrands {
                inner: inner.clone(),
                stale_unprotected: AtomicBool::new(false),
                item_added_before_delete: AtomicBool::new(false),
            },
            categories: RacingCategories {
                inner: inner.clone(),
                stale_listing: AtomicBool::new(false),
            },
        })
    }
}

#[async_trait]
impl CatalogStore for RacingStore {
    fn brands(&self) -> &dyn Collection<Brand> {
        &self.brands
    }

    fn categories(&self) -> &dyn Collection<Category> {
        &self.categories
    }

    fn items(&self) -> &dyn Collection<Item> {
        self.inner.items()
    }

    fn item_instances(&self) -> &dyn Collection<ItemInstance> {
        self.inner.item_instances()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
}

fn category_form(name: &str) -> CategoryForm {
    CategoryForm {
        name: name.to_string(),
        description: format!("{name} description"),
    }
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_brand_protected_after_the_gate_is_not_deleted() {
    let catalog = TestCatalog::new();
    let brand = catalog.brand("Acme").await;
    catalog
        .service
        .set_protected::<Brand>(brand, true)
        .await
        .unwrap();

    let store = RacingStore::over(&catalog.store);
    store.brands.stale_unprotected.store(true, Ordering::SeqCst);
    let service = CatalogService::new(store.clone());

    let outcome = service.confirm_delete::<Brand>(brand).await.unwrap();
    let ConfirmOutcome::Blocked(blocked) = outcome else {
        panic!("expected Blocked, got {outcome:?}");
    };
    assert_eq!(blocked.reason, BlockReason::Protected);
    assert_eq!(blocked.redirect_path(), Some(format!("/brand/{brand}")));
    assert!(catalog.service.get::<Brand>(brand).await.is_ok());
}

#[tokio::test]
async fn test_brand_that_gains_an_item_during_delete_is_blocked() {
    let catalog = TestCatalog::new();
    let brand = catalog.brand("Acme").await;

    let store = RacingStore::over(&catalog.store);
    store
        .brands
        .item_added_before_delete
        .store(true, Ordering::SeqCst);
    let service = CatalogService::new(store.clone());

    let outcome = service.confirm_delete::<Brand>(brand).await.unwrap();
    let ConfirmOutcome::Blocked(blocked) = outcome else {
        panic!("expected Blocked, got {outcome:?}");
    };
    assert_eq!(blocked.reason, BlockReason::HasChildren);
    assert_eq!(blocked.children.len(), 1);
    assert_eq!(blocked.children[0].title, "Late arrival");
    assert!(catalog.service.get::<Brand>(brand).await.is_ok());

    let items = catalog
        .service
        .list::<Item>(&ItemFilter::default())
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
}

// =============================================================================
// Natural keys
// =============================================================================

#[tokio::test]
async fn test_concurrent_category_create_returns_the_stored_record() {
    let catalog = TestCatalog::new();
    let shoes = catalog.category("shoes").await;

    let store = RacingStore::over(&catalog.store);
    store.categories.stale_listing.store(true, Ordering::SeqCst);
    let service = CatalogService::new(store.clone());

    let outcome = service
        .create::<Category>(category_form("Shoes"), None)
        .await
        .unwrap();
    assert!(
        matches!(outcome, WriteOutcome::Existing(id) if id == shoes),
        "got {outcome:?}"
    );

    let all = catalog
        .service
        .list::<Category>(&CategoryFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_concurrent_category_rename_is_a_field_error() {
    let catalog = TestCatalog::new();
    catalog.category("shoes").await;
    let hats = catalog.category("hats").await;

    let store = RacingStore::over(&catalog.store);
    store.categories.stale_listing.store(true, Ordering::SeqCst);
    let service = CatalogService::new(store.clone());

    let outcome = service
        .update::<Category>(hats, category_form("shoes"), None)
        .await
        .unwrap();
    let WriteOutcome::Invalid(failed) = outcome else {
        panic!("expected Invalid, got {outcome:?}");
    };
    assert_eq!(
        failed.error_for("name"),
        Some("SHOES is already used by another record")
    );

    let stored = catalog.service.get::<Category>(hats).await.unwrap();
    assert_eq!(stored.name, "HATS");
}
