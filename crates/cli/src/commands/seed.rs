//! Seed the catalog with a small sample data set.
//!
//! Every record goes through the same validated service path as the web
//! forms. Categories are idempotent by name, so running the command twice
//! reuses them; brands, products and instances are inserted again.
//!
//! One brand and one category are protected so the delete gate can be
//! tried out right away.

use catalog_admin::models::{
    Brand, BrandForm, Category, CategoryForm, Item, ItemForm, ItemInstance, ItemInstanceForm,
};
use catalog_admin::services::{CatalogEntity, CatalogService, WriteOutcome};

use super::{CommandError, catalog_service};

const BRANDS: &[(&str, &str, &str)] = &[
    ("Northwind", "Outdoor apparel built for wet weather.", "Bergen"),
    ("Lumen", "Minimal lighting for small spaces.", "Lisbon"),
];

const CATEGORIES: &[(&str, &str)] = &[
    ("jackets", "Shell, insulated and rain jackets."),
    ("lamps", "Desk, floor and pendant lamps."),
    ("sale", "Discounted products."),
];

/// (title, description, product id, brand index, category indexes)
const ITEMS: &[(&str, &str, &str, usize, &[usize])] = &[
    ("Fjord Shell", "Three-layer waterproof shell.", "10001", 0, &[0]),
    ("Drizzle Parka", "Insulated parka with a hood.", "10002", 0, &[0, 2]),
    ("Arc Desk Lamp", "Adjustable LED desk lamp.", "20001", 1, &[1]),
];

/// (item index, size, price, in stock)
const INSTANCES: &[(usize, &str, &str, &str)] = &[
    (0, "S", "189.00", "4"),
    (0, "M", "189.00", "7"),
    (0, "L", "199.00", "2"),
    (1, "M", "249.50", "3"),
    (2, "One size", "79.90", "12"),
];

/// Insert the sample catalog.
///
/// # Errors
///
/// Returns an error if the database can't be reached or a sample record
/// is rejected.
pub async fn run() -> Result<(), CommandError> {
    let service = catalog_service().await?;

    let mut brand_ids = Vec::with_capacity(BRANDS.len());
    for (name, description, location) in BRANDS {
        let form = BrandForm {
            name: (*name).to_string(),
            description: (*description).to_string(),
            location: (*location).to_string(),
        };
        brand_ids.push(create::<Brand>(&service, form).await?);
    }

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for (name, description) in CATEGORIES {
        let form = CategoryForm {
            name: (*name).to_string(),
            description: (*description).to_string(),
        };
        category_ids.push(create::<Category>(&service, form).await?);
    }

    let mut item_ids = Vec::with_capacity(ITEMS.len());
    for (title, description, product_id, brand, categories) in ITEMS {
        let form = ItemForm {
            title: (*title).to_string(),
            description: (*description).to_string(),
            product_id: (*product_id).to_string(),
            brand: brand_ids
                .get(*brand)
                .map(ToString::to_string)
                .unwrap_or_default(),
            category: categories
                .iter()
                .filter_map(|index| category_ids.get(*index))
                .map(ToString::to_string)
                .collect(),
        };
        item_ids.push(create::<Item>(&service, form).await?);
    }

    for (item, size, price, in_stock) in INSTANCES {
        let form = ItemInstanceForm {
            size: (*size).to_string(),
            price: (*price).to_string(),
            in_stock: (*in_stock).to_string(),
            item: item_ids
                .get(*item)
                .map(ToString::to_string)
                .unwrap_or_default(),
        };
        create::<ItemInstance>(&service, form).await?;
    }

    if let Some(id) = brand_ids.first() {
        service.set_protected::<Brand>(*id, true).await?;
    }
    if let Some(id) = category_ids.last() {
        service.set_protected::<Category>(*id, true).await?;
    }

    tracing::info!(
        brands = brand_ids.len(),
        categories = category_ids.len(),
        items = item_ids.len(),
        instances = INSTANCES.len(),
        "Seed complete"
    );
    Ok(())
}

async fn create<T: CatalogEntity>(
    service: &CatalogService,
    form: T::Form,
) -> Result<T::Id, CommandError> {
    match service.create::<T>(form, None).await? {
        WriteOutcome::Invalid(failed) => Err(CommandError::Rejected {
            kind: T::KIND,
            errors: failed
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect::<Vec<_>>()
                .join("; "),
        }),
        WriteOutcome::Created(id) | WriteOutcome::Updated(id) | WriteOutcome::Existing(id) => {
            tracing::debug!(kind = %T::KIND, %id, "Seeded record");
            Ok(id)
        }
    }
}
