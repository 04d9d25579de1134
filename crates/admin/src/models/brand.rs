//! Brand records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::{BrandId, EntityKind, StoredImage};

use super::Item;

/// A brand that items are sold under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    /// Unique brand ID.
    pub id: BrandId,
    /// Display name (at most 100 characters).
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Where the brand is based.
    pub location: String,
    /// Optional logo.
    #[serde(skip)]
    pub image: Option<StoredImage>,
    /// Vetoes deletion regardless of dependent items.
    pub protected: bool,
    /// When the brand was created.
    pub created_at: DateTime<Utc>,
    /// When the brand was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Brand {
    /// Canonical detail path (`/brand/{id}`).
    #[must_use]
    pub fn detail_path(&self) -> String {
        EntityKind::Brand.detail_path(self.id)
    }

    /// Path the logo is served from.
    #[must_use]
    pub fn image_path(&self) -> String {
        format!("{}/image", self.detail_path())
    }
}

/// Validated brand fields, ready to be written.
#[derive(Debug, Clone)]
pub struct BrandDraft {
    pub name: String,
    pub description: String,
    pub location: String,
    pub image: Option<StoredImage>,
    pub protected: bool,
}

/// Raw brand form input.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrandForm {
    pub name: String,
    pub description: String,
    pub location: String,
}

impl From<&Brand> for BrandForm {
    fn from(brand: &Brand) -> Self {
        Self {
            name: brand.name.clone(),
            description: brand.description.clone(),
            location: brand.location.clone(),
        }
    }
}

/// Brands have no lookup criteria; every brand matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrandFilter;

/// A brand together with the items sold under it.
#[derive(Debug, Clone)]
pub struct BrandDetail {
    pub brand: Brand,
    pub items: Vec<Item>,
}
