//! Item instance records: a concrete size/price of an item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::{EntityKind, ItemId, ItemInstanceId, Price};

use super::{Brand, Category, Item};

/// Stock level used when the form leaves `in_stock` blank.
pub const DEFAULT_IN_STOCK: i32 = 1;

/// A purchasable variant of an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemInstance {
    /// Unique instance ID.
    pub id: ItemInstanceId,
    /// Size label (e.g., "M", "42", "250ml").
    pub size: String,
    /// Unit price.
    pub price: Price,
    /// Units on hand.
    pub in_stock: i32,
    /// Item this is an instance of.
    pub item_id: ItemId,
    /// Vetoes deletion.
    pub protected: bool,
    /// When the instance was created.
    pub created_at: DateTime<Utc>,
    /// When the instance was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ItemInstance {
    /// Canonical detail path (`/iteminstance/{id}`).
    #[must_use]
    pub fn detail_path(&self) -> String {
        EntityKind::ItemInstance.detail_path(self.id)
    }

    /// Detail path of the owning item.
    #[must_use]
    pub fn item_path(&self) -> String {
        EntityKind::Item.detail_path(self.item_id)
    }
}

/// Validated instance fields, ready to be written.
#[derive(Debug, Clone)]
pub struct ItemInstanceDraft {
    pub size: String,
    pub price: Price,
    pub in_stock: i32,
    pub item_id: ItemId,
    pub protected: bool,
}

/// Raw instance form input.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemInstanceForm {
    pub size: String,
    pub price: String,
    pub in_stock: String,
    pub item: String,
}

impl From<&ItemInstance> for ItemInstanceForm {
    fn from(instance: &ItemInstance) -> Self {
        Self {
            size: instance.size.clone(),
            price: instance.price.to_string(),
            in_stock: instance.in_stock.to_string(),
            item: instance.item_id.to_string(),
        }
    }
}

/// Lookup criteria for instances. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemInstanceFilter {
    pub item: Option<ItemId>,
}

/// An instance with its item resolved, and the item's brand and categories
/// resolved in turn.
#[derive(Debug, Clone)]
pub struct ItemInstanceDetail {
    pub instance: ItemInstance,
    pub item: Item,
    pub brand: Brand,
    pub categories: Vec<Category>,
}
