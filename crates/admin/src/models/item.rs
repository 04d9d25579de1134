//! Item (product) records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::{BrandId, CategoryId, EntityKind, ItemId, StoredImage};

use super::{Brand, Category, ItemInstance};

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Unique item ID.
    pub id: ItemId,
    /// Display title (at most 100 characters).
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Business product number. Expected to be unique but not enforced.
    pub product_id: i64,
    /// Brand the item is sold under.
    pub brand_id: BrandId,
    /// Categories the item is filed under, in submission order.
    pub category_ids: Vec<CategoryId>,
    /// Optional product photo.
    #[serde(skip)]
    pub image: Option<StoredImage>,
    /// Vetoes deletion regardless of dependent instances.
    pub protected: bool,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Canonical detail path (`/item/{id}`).
    #[must_use]
    pub fn detail_path(&self) -> String {
        EntityKind::Item.detail_path(self.id)
    }

    /// Path the product photo is served from.
    #[must_use]
    pub fn image_path(&self) -> String {
        format!("{}/image", self.detail_path())
    }
}

/// Validated item fields, ready to be written.
#[derive(Debug, Clone)]
pub struct ItemDraft {
    pub title: String,
    pub description: String,
    pub product_id: i64,
    pub brand_id: BrandId,
    /// Deduplicated, in submission order.
    pub category_ids: Vec<CategoryId>,
    pub image: Option<StoredImage>,
    pub protected: bool,
}

/// Raw item form input.
///
/// `category` holds every submitted checkbox value. A single checked box
/// becomes a one-element list and no checked box an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemForm {
    pub title: String,
    pub description: String,
    pub product_id: String,
    pub brand: String,
    pub category: Vec<String>,
}

impl From<&Item> for ItemForm {
    fn from(item: &Item) -> Self {
        Self {
            title: item.title.clone(),
            description: item.description.clone(),
            product_id: item.product_id.to_string(),
            brand: item.brand_id.to_string(),
            category: item.category_ids.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Lookup criteria for items. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemFilter {
    pub brand: Option<BrandId>,
    pub category: Option<CategoryId>,
}

/// An item with its brand and categories resolved and its instances listed.
#[derive(Debug, Clone)]
pub struct ItemDetail {
    pub item: Item,
    pub brand: Brand,
    pub categories: Vec<Category>,
    pub instances: Vec<ItemInstance>,
}
