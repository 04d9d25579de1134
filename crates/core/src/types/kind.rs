//! The four record kinds held by the catalog.

use serde::{Deserialize, Serialize};

/// Kind of catalog record.
///
/// Also determines the URL namespace each record lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Brand,
    Category,
    Item,
    ItemInstance,
}

impl EntityKind {
    /// All kinds, parents before children.
    pub const ALL: [Self; 4] = [Self::Brand, Self::Category, Self::Item, Self::ItemInstance];

    /// URL path segment for this kind (`/brand`, `/iteminstance`, ...).
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Category => "category",
            Self::Item => "item",
            Self::ItemInstance => "iteminstance",
        }
    }

    /// Human-readable singular label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Brand => "Brand",
            Self::Category => "Category",
            Self::Item => "Product",
            Self::ItemInstance => "Product instance",
        }
    }

    /// Canonical detail path for a record of this kind.
    #[must_use]
    pub fn detail_path(self, id: impl std::fmt::Display) -> String {
        format!("/{}/{id}", self.path_segment())
    }

    /// Path of the listing page this kind falls back to.
    ///
    /// Categories are listed on the catalog overview at `/`. Item instances
    /// have no listing of their own and are shown on their item's page.
    #[must_use]
    pub const fn list_path(self) -> &'static str {
        match self {
            Self::Brand => "/brand",
            Self::Category => "/",
            Self::Item | Self::ItemInstance => "/item",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Brand => write!(f, "brand"),
            Self::Category => write!(f, "category"),
            Self::Item => write!(f, "item"),
            Self::ItemInstance => write!(f, "item_instance"),
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brand" => Ok(Self::Brand),
            "category" => Ok(Self::Category),
            "item" => Ok(Self::Item),
            "item_instance" | "iteminstance" => Ok(Self::ItemInstance),
            _ => Err(format!("invalid entity kind: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_paths() {
        assert_eq!(EntityKind::Brand.detail_path(3), "/brand/3");
        assert_eq!(EntityKind::Category.detail_path(4), "/category/4");
        assert_eq!(EntityKind::Item.detail_path(5), "/item/5");
        assert_eq!(EntityKind::ItemInstance.detail_path(6), "/iteminstance/6");
    }

    #[test]
    fn test_list_paths() {
        assert_eq!(EntityKind::Brand.list_path(), "/brand");
        assert_eq!(EntityKind::Category.list_path(), "/");
        assert_eq!(EntityKind::Item.list_path(), "/item");
    }

    #[test]
    fn test_display_from_str_agree() {
        for kind in EntityKind::ALL {
            let parsed: EntityKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert_eq!(
            "iteminstance".parse::<EntityKind>().unwrap(),
            EntityKind::ItemInstance
        );
        assert!("widget".parse::<EntityKind>().is_err());
    }
}
