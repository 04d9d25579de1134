//! Category records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::{CategoryId, EntityKind, StoredImage};

use super::Item;

/// A category items can be filed under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Uppercased, alphanumeric name. Unique.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Legacy counter. Never maintained; item counts are computed on read.
    pub item_count: i32,
    /// Optional banner image.
    #[serde(skip)]
    pub image: Option<StoredImage>,
    /// Vetoes deletion regardless of dependent items.
    pub protected: bool,
    /// When the category was created.
    pub created_at: DateTime<Utc>,
    /// When the category was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Canonical detail path (`/category/{id}`).
    #[must_use]
    pub fn detail_path(&self) -> String {
        EntityKind::Category.detail_path(self.id)
    }

    /// Path the banner image is served from.
    #[must_use]
    pub fn image_path(&self) -> String {
        format!("{}/image", self.detail_path())
    }
}

/// Validated category fields, ready to be written.
#[derive(Debug, Clone)]
pub struct CategoryDraft {
    /// Already uppercased.
    pub name: String,
    pub description: String,
    pub image: Option<StoredImage>,
    pub protected: bool,
}

/// Raw category form input.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
    pub description: String,
}

impl From<&Category> for CategoryForm {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone(),
        }
    }
}

/// Lookup criteria for categories.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    /// Exact (already folded) name.
    pub name: Option<String>,
}

/// A category together with the items filed under it.
#[derive(Debug, Clone)]
pub struct CategoryDetail {
    pub category: Category,
    pub items: Vec<Item>,
}
