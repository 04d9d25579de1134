//! In-process catalog store.
//!
//! Backs the integration tests and `CATALOG_STORE=memory` demo runs. Records
//! live in ordered maps keyed by id; ids are handed out from a counter per
//! collection and never reused. Each collection can be switched offline to
//! exercise store-failure paths.
//!
//! Writes follow the database's constraints: a natural key can't be stored
//! twice, and protected records are never removed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use catalog_core::EntityKind;

use super::{CatalogStore, Collection, ListOrder, Projection, StoreError};
use crate::models::{Brand, Category, Item, ItemInstance};
use crate::services::catalog::CatalogEntity;

/// One in-memory collection.
#[derive(Debug)]
pub struct MemoryCollection<T> {
    records: RwLock<BTreeMap<i32, T>>,
    next_id: AtomicI32,
    available: AtomicBool,
}

impl<T> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI32::new(1),
            available: AtomicBool::new(true),
        }
    }
}

impl<T> MemoryCollection<T> {
    fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

/// Fail if a record other than `except` already holds the draft's natural key.
fn ensure_unique<T: CatalogEntity>(
    records: &BTreeMap<i32, T>,
    draft: &T::Draft,
    except: Option<T::Id>,
) -> Result<(), StoreError> {
    let Some((field, filter)) = T::identity(draft) else {
        return Ok(());
    };
    let taken = records
        .values()
        .any(|record| Some(record.id()) != except && record.matches(&filter));
    if taken {
        return Err(StoreError::Duplicate(format!("{} {field} is taken", T::KIND)));
    }
    Ok(())
}

#[async_trait]
impl<T: CatalogEntity> Collection<T> for MemoryCollection<T> {
    async fn find_by_id(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        self.ensure_available()?;
        Ok(self.records.read().await.get(&id.into()).cloned())
    }

    async fn find_many(
        &self,
        filter: &T::Filter,
        order: ListOrder,
        projection: Projection,
    ) -> Result<Vec<T>, StoreError> {
        self.ensure_available()?;
        let mut records: Vec<T> = self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.matches(filter))
            .cloned()
            .collect();

        if order == ListOrder::ByLabel {
            records.sort_by(|a, b| a.label().cmp(b.label()).then_with(|| a.id().cmp(&b.id())));
        }
        if projection == Projection::Summary {
            records.iter_mut().for_each(T::clear_image);
        }
        Ok(records)
    }

    async fn insert(&self, draft: T::Draft) -> Result<T, StoreError> {
        self.ensure_available()?;
        let mut records = self.records.write().await;
        ensure_unique(&records, &draft, None)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let record = T::materialize(T::Id::from(id), draft, now, now);
        records.insert(id, record.clone());
        Ok(record)
    }

    async fn replace_by_id(&self, id: T::Id, draft: T::Draft) -> Result<Option<T>, StoreError> {
        self.ensure_available()?;
        let mut records = self.records.write().await;
        let key: i32 = id.into();
        let Some(created_at) = records.get(&key).map(|record| record.created_at()) else {
            return Ok(None);
        };
        ensure_unique(&records, &draft, Some(id))?;
        let record = T::materialize(id, draft, created_at, Utc::now());
        records.insert(key, record.clone());
        Ok(Some(record))
    }

    async fn delete_by_id(&self, id: T::Id) -> Result<bool, StoreError> {
        self.ensure_available()?;
        let mut records = self.records.write().await;
        let key: i32 = id.into();
        if records.get(&key).is_none_or(|record| record.is_protected()) {
            return Ok(false);
        }
        Ok(records.remove(&key).is_some())
    }
}

/// Catalog store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    brands: MemoryCollection<Brand>,
    categories: MemoryCollection<Category>,
    items: MemoryCollection<Item>,
    item_instances: MemoryCollection<ItemInstance>,
}

impl MemoryCatalogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every collection offline (or back online).
    pub fn set_available(&self, available: bool) {
        for kind in EntityKind::ALL {
            self.set_collection_available(kind, available);
        }
    }

    /// Take one collection offline (or back online).
    pub fn set_collection_available(&self, kind: EntityKind, available: bool) {
        match kind {
            EntityKind::Brand => self.brands.set_available(available),
            EntityKind::Category => self.categories.set_available(available),
            EntityKind::Item => self.items.set_available(available),
            EntityKind::ItemInstance => self.item_instances.set_available(available),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    fn brands(&self) -> &dyn Collection<Brand> {
        &self.brands
    }

    fn categories(&self) -> &dyn Collection<Category> {
        &self.categories
    }

    fn items(&self) -> &dyn Collection<Item> {
        &self.items
    }

    fn item_instances(&self) -> &dyn Collection<ItemInstance> {
        &self.item_instances
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let online = self.brands.is_available()
            && self.categories.is_available()
            && self.items.is_available()
            && self.item_instances.is_available();
        if online {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use catalog_core::BrandId;

    use catalog_core::StoredImage;

    use super::*;
    use crate::models::{BrandDraft, BrandFilter, CategoryDraft};

    fn draft(name: &str) -> BrandDraft {
        BrandDraft {
            name: name.to_string(),
            description: "desc".to_string(),
            location: "Oslo".to_string(),
            image: None,
            protected: false,
        }
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let store = MemoryCatalogStore::new();
        let first = store.brands().insert(draft("A")).await.unwrap();
        store.brands().delete_by_id(first.id).await.unwrap();
        let second = store.brands().insert(draft("B")).await.unwrap();
        assert_eq!(first.id, BrandId::new(1));
        assert_eq!(second.id, BrandId::new(2));
    }

    #[tokio::test]
    async fn test_list_by_label() {
        let store = MemoryCatalogStore::new();
        store.brands().insert(draft("Zeta")).await.unwrap();
        store.brands().insert(draft("Alpha")).await.unwrap();
        let names: Vec<String> = store
            .brands()
            .find_many(&BrandFilter, ListOrder::ByLabel, Projection::Summary)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[tokio::test]
    async fn test_replace_keeps_created_at() {
        let store = MemoryCatalogStore::new();
        let brand = store.brands().insert(draft("A")).await.unwrap();
        let replaced = store
            .brands()
            .replace_by_id(brand.id, draft("B"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.created_at, brand.created_at);
        assert_eq!(replaced.name, "B");
        assert!(
            store
                .brands()
                .replace_by_id(BrandId::new(99), draft("C"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_summary_leaves_out_images() {
        let store = MemoryCatalogStore::new();
        let brand = store
            .brands()
            .insert(BrandDraft {
                image: Some(StoredImage::new(
                    "logo.png".to_string(),
                    "image/png".to_string(),
                    vec![1, 2, 3],
                )),
                ..draft("A")
            })
            .await
            .unwrap();

        let listed = store
            .brands()
            .find_many(&BrandFilter, ListOrder::Unsorted, Projection::Summary)
            .await
            .unwrap();
        assert!(listed.first().unwrap().image.is_none());
        let full = store
            .brands()
            .find_many(&BrandFilter, ListOrder::Unsorted, Projection::Full)
            .await
            .unwrap();
        assert!(full.first().unwrap().image.is_some());
        let fetched = store.brands().find_by_id(brand.id).await.unwrap().unwrap();
        assert_eq!(fetched.image.map(|img| img.data), Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_protected_record_is_not_deleted() {
        let store = MemoryCatalogStore::new();
        let brand = store
            .brands()
            .insert(BrandDraft {
                protected: true,
                ..draft("A")
            })
            .await
            .unwrap();
        assert!(!store.brands().delete_by_id(brand.id).await.unwrap());
        assert!(store.brands().find_by_id(brand.id).await.unwrap().is_some());
        assert!(!store.brands().delete_by_id(BrandId::new(99)).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_category_name_is_refused() {
        let store = MemoryCatalogStore::new();
        let category = |name: &str| CategoryDraft {
            name: name.to_string(),
            description: "desc".to_string(),
            image: None,
            protected: false,
        };
        let shoes = store.categories().insert(category("SHOES")).await.unwrap();
        let hats = store.categories().insert(category("HATS")).await.unwrap();

        assert!(matches!(
            store.categories().insert(category("SHOES")).await,
            Err(StoreError::Duplicate(_))
        ));
        assert!(matches!(
            store.categories().replace_by_id(hats.id, category("SHOES")).await,
            Err(StoreError::Duplicate(_))
        ));
        assert!(
            store
                .categories()
                .replace_by_id(shoes.id, category("SHOES"))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_offline_collection_fails() {
        let store = MemoryCatalogStore::new();
        store.set_collection_available(EntityKind::Brand, false);
        assert!(matches!(
            store.brands().find_by_id(BrandId::new(1)).await,
            Err(StoreError::Unavailable)
        ));
        assert!(store.health_check().await.is_err());
        store.set_available(true);
        assert!(store.health_check().await.is_ok());
    }
}
