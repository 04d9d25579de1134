//! Integration tests for the catalog service against the in-memory store.
//!
//! These cover creation, validation, the two-phase delete gate and detail
//! resolution end to end, without a database.

#![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

use catalog_admin::db::StoreError;
use catalog_admin::models::{
    Brand, BrandFilter, BrandForm, Category, CategoryFilter, CategoryForm, Item, ItemInstance,
    ItemInstanceForm,
};
use catalog_admin::services::{
    BlockReason, CatalogEntity, CatalogError, ConfirmOutcome, DeleteGate, WriteOutcome,
};
use catalog_core::{EntityKind, ItemId, StoredImage};
use catalog_integration_tests::{TestCatalog, item_form};

fn png(name: &str) -> StoredImage {
    StoredImage::new(name.to_string(), "image/png".to_string(), vec![0x89, 0x50, 0x4e, 0x47])
}

// =============================================================================
// Creation
// =============================================================================

#[tokio::test]
async fn test_category_create_is_idempotent_by_folded_name() {
    let catalog = TestCatalog::new();

    let first = catalog
        .service
        .create::<Category>(
            CategoryForm {
                name: "shoes".to_string(),
                description: "Footwear".to_string(),
            },
            None,
        )
        .await
        .unwrap();
    let WriteOutcome::Created(id) = first else {
        panic!("expected Created, got {first:?}");
    };

    let second = catalog
        .service
        .create::<Category>(
            CategoryForm {
                name: "SHOES".to_string(),
                description: "again".to_string(),
            },
            None,
        )
        .await
        .unwrap();
    assert!(matches!(second, WriteOutcome::Existing(existing) if existing == id));

    let all = catalog
        .service
        .list::<Category>(&CategoryFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "SHOES");
}

#[tokio::test]
async fn test_brand_with_empty_fields_reports_every_error() {
    let catalog = TestCatalog::new();

    let outcome = catalog
        .service
        .create::<Brand>(BrandForm::default(), None)
        .await
        .unwrap();

    let WriteOutcome::Invalid(failed) = outcome else {
        panic!("expected Invalid, got {outcome:?}");
    };
    assert_eq!(failed.errors.len(), 3);
    assert!(failed.error_for("name").is_some());
    assert!(failed.error_for("description").is_some());
    assert!(failed.error_for("location").is_some());

    let brands = catalog.service.list::<Brand>(&BrandFilter).await.unwrap();
    assert!(brands.is_empty());
}

#[tokio::test]
async fn test_rejected_values_come_back_escaped() {
    let catalog = TestCatalog::new();

    let form = BrandForm {
        name: "<script>alert(1)</script>".to_string(),
        description: "Fish & Chips".to_string(),
        location: String::new(),
    };
    let outcome = catalog.service.create::<Brand>(form, None).await.unwrap();

    let WriteOutcome::Invalid(failed) = outcome else {
        panic!("expected Invalid, got {outcome:?}");
    };
    assert_eq!(failed.errors.len(), 1);
    assert!(!failed.values.name.contains('<'));
    assert!(failed.values.name.starts_with("&lt;script&gt;"));
    assert_eq!(failed.values.description, "Fish &amp; Chips");
}

#[tokio::test]
async fn test_dangling_brand_reference_is_a_field_error() {
    let catalog = TestCatalog::new();
    let category = catalog.category("tops").await;

    let outcome = catalog
        .service
        .create::<Item>(item_form("Tee", 42.into(), &[category]), None)
        .await
        .unwrap();

    let WriteOutcome::Invalid(failed) = outcome else {
        panic!("expected Invalid, got {outcome:?}");
    };
    assert_eq!(failed.error_for("brand"), Some("Brand 42 does not exist"));
    assert_eq!(failed.errors.len(), 1);
}

#[tokio::test]
async fn test_dangling_item_reference_on_instance() {
    let catalog = TestCatalog::new();

    let form = ItemInstanceForm {
        size: "M".to_string(),
        price: "10".to_string(),
        in_stock: String::new(),
        item: "7".to_string(),
    };
    let outcome = catalog
        .service
        .create::<ItemInstance>(form, None)
        .await
        .unwrap();

    let WriteOutcome::Invalid(failed) = outcome else {
        panic!("expected Invalid, got {outcome:?}");
    };
    assert_eq!(failed.error_for("item"), Some("Product 7 does not exist"));
}

#[tokio::test]
async fn test_non_image_upload_is_rejected() {
    let catalog = TestCatalog::new();

    let form = BrandForm {
        name: "Acme".to_string(),
        description: "Anvils".to_string(),
        location: "Desert".to_string(),
    };
    let upload = StoredImage::new(
        "notes.txt".to_string(),
        "text/plain".to_string(),
        b"hello".to_vec(),
    );
    let outcome = catalog
        .service
        .create::<Brand>(form, Some(upload))
        .await
        .unwrap();

    let WriteOutcome::Invalid(failed) = outcome else {
        panic!("expected Invalid, got {outcome:?}");
    };
    assert_eq!(
        failed.error_for("image"),
        Some("Uploaded file must be an image")
    );
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_keeps_image_and_protected_flag() {
    let catalog = TestCatalog::new();
    let brand = catalog.brand("Acme").await;

    let outcome = catalog
        .service
        .create::<Item>(item_form("Anvil", brand, &[]), Some(png("anvil.png")))
        .await
        .unwrap();
    let id = outcome.target().unwrap();
    catalog.service.set_protected::<Item>(id, true).await.unwrap();

    let mut form = item_form("Heavy Anvil", brand, &[]);
    form.product_id = "2002".to_string();
    let outcome = catalog
        .service
        .update::<Item>(id, form, None)
        .await
        .unwrap();
    assert!(matches!(outcome, WriteOutcome::Updated(updated) if updated == id));

    let item = catalog.service.get::<Item>(id).await.unwrap();
    assert_eq!(item.title, "Heavy Anvil");
    assert_eq!(item.product_id, 2002);
    assert!(item.protected);
    assert_eq!(item.image.unwrap().file_name, "anvil.png");
}

#[tokio::test]
async fn test_update_replaces_image_when_uploaded() {
    let catalog = TestCatalog::new();
    let brand = catalog.brand("Acme").await;
    let form = BrandForm {
        name: "Acme".to_string(),
        description: "Anvils".to_string(),
        location: "Desert".to_string(),
    };

    catalog
        .service
        .update::<Brand>(brand, form.clone(), Some(png("old.png")))
        .await
        .unwrap();
    catalog
        .service
        .update::<Brand>(brand, form, Some(png("new.png")))
        .await
        .unwrap();

    let stored = catalog.service.get::<Brand>(brand).await.unwrap();
    assert_eq!(stored.image.unwrap().file_name, "new.png");
}

#[tokio::test]
async fn test_update_unknown_record_is_not_found() {
    let catalog = TestCatalog::new();

    let err = catalog
        .service
        .update::<Brand>(9.into(), BrandForm::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::NotFound {
            kind: EntityKind::Brand,
            id: 9
        }
    ));
}

#[tokio::test]
async fn test_category_rename_onto_existing_name_is_rejected() {
    let catalog = TestCatalog::new();
    catalog.category("hats").await;
    let scarves = catalog.category("scarves").await;

    let outcome = catalog
        .service
        .update::<Category>(
            scarves,
            CategoryForm {
                name: "Hats".to_string(),
                description: "Headwear".to_string(),
            },
            None,
        )
        .await
        .unwrap();

    let WriteOutcome::Invalid(failed) = outcome else {
        panic!("expected Invalid, got {outcome:?}");
    };
    assert_eq!(
        failed.error_for("name"),
        Some("HATS is already used by another record")
    );
    let stored = catalog.service.get::<Category>(scarves).await.unwrap();
    assert_eq!(stored.name, "SCARVES");
}

#[tokio::test]
async fn test_category_name_outside_ascii_is_a_field_error() {
    let catalog = TestCatalog::new();

    for name in ["Café".to_string(), "ß".repeat(60)] {
        let outcome = catalog
            .service
            .create::<Category>(
                CategoryForm {
                    name: name.clone(),
                    description: "Footwear".to_string(),
                },
                None,
            )
            .await
            .unwrap();
        let WriteOutcome::Invalid(failed) = outcome else {
            panic!("expected {name:?} to be rejected, got {outcome:?}");
        };
        assert!(
            failed
                .errors
                .iter()
                .any(|e| e.field == "name" && e.message == "Name has non-alphanumeric characters."),
            "{name:?}: {:?}",
            failed.errors
        );
    }

    let all = catalog
        .service
        .list::<Category>(&CategoryFilter::default())
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_instance_price_beyond_stored_precision_is_a_field_error() {
    let catalog = TestCatalog::new();
    let brand = catalog.brand("Acme").await;
    let item = catalog.item("Anvil", brand, &[]).await;

    let outcome = catalog
        .service
        .create::<ItemInstance>(
            ItemInstanceForm {
                size: "L".to_string(),
                price: "123456789.999".to_string(),
                in_stock: "1".to_string(),
                item: item.to_string(),
            },
            None,
        )
        .await
        .unwrap();

    let WriteOutcome::Invalid(failed) = outcome else {
        panic!("expected Invalid, got {outcome:?}");
    };
    assert_eq!(
        failed.error_for("price"),
        Some("Price can have at most 2 decimal places")
    );
    assert_eq!(failed.values.price, "123456789.999");
}

// =============================================================================
// Delete gate
// =============================================================================

#[tokio::test]
async fn test_protected_brand_without_items_is_blocked() {
    let catalog = TestCatalog::new();
    let brand = catalog.brand("Keep").await;
    catalog
        .service
        .set_protected::<Brand>(brand, true)
        .await
        .unwrap();

    let gate = catalog
        .service
        .request_delete::<Brand>(brand)
        .await
        .unwrap();
    let DeleteGate::Blocked(blocked) = gate else {
        panic!("expected Blocked, got {gate:?}");
    };
    assert_eq!(blocked.reason, BlockReason::Protected);
    assert!(blocked.children.is_empty());
}

#[tokio::test]
async fn test_item_with_instance_blocks_until_instance_is_gone() {
    let catalog = TestCatalog::new();
    let brand = catalog.brand("Acme").await;
    let item = catalog.item("Anvil", brand, &[]).await;
    let instance = catalog.instance(item, "XL").await;

    let gate = catalog.service.request_delete::<Item>(item).await.unwrap();
    let DeleteGate::Blocked(blocked) = gate else {
        panic!("expected Blocked, got {gate:?}");
    };
    assert_eq!(blocked.reason, BlockReason::HasChildren);
    assert_eq!(blocked.children.len(), 1);
    assert_eq!(blocked.children[0].id, instance);

    let confirmed = catalog.service.confirm_delete::<Item>(item).await.unwrap();
    let ConfirmOutcome::Blocked(blocked) = confirmed else {
        panic!("expected Blocked, got {confirmed:?}");
    };
    assert_eq!(blocked.reason, BlockReason::HasChildren);
    assert!(blocked.redirect_path().is_none());

    let deleted = catalog
        .service
        .confirm_delete::<ItemInstance>(instance)
        .await
        .unwrap();
    let ConfirmOutcome::Deleted(record) = deleted else {
        panic!("expected Deleted, got {deleted:?}");
    };
    assert_eq!(record.after_delete_path(), format!("/item/{item}"));

    let gate = catalog.service.request_delete::<Item>(item).await.unwrap();
    assert!(matches!(gate, DeleteGate::ClearToDelete(record) if record.id == item));
}

#[tokio::test]
async fn test_confirm_delete_refuses_protected_record() {
    let catalog = TestCatalog::new();
    let category = catalog.category("core").await;
    catalog
        .service
        .set_protected::<Category>(category, true)
        .await
        .unwrap();

    let outcome = catalog
        .service
        .confirm_delete::<Category>(category)
        .await
        .unwrap();
    let ConfirmOutcome::Blocked(blocked) = outcome else {
        panic!("expected Blocked, got {outcome:?}");
    };
    assert_eq!(blocked.reason, BlockReason::Protected);
    assert_eq!(
        blocked.redirect_path(),
        Some(format!("/category/{category}"))
    );

    assert!(catalog.service.get::<Category>(category).await.is_ok());
}

#[tokio::test]
async fn test_category_used_by_item_is_blocked() {
    let catalog = TestCatalog::new();
    let brand = catalog.brand("Acme").await;
    let category = catalog.category("tools").await;
    catalog.item("Hammer", brand, &[category]).await;

    let gate = catalog
        .service
        .request_delete::<Category>(category)
        .await
        .unwrap();
    let DeleteGate::Blocked(blocked) = gate else {
        panic!("expected Blocked, got {gate:?}");
    };
    assert_eq!(blocked.reason, BlockReason::HasChildren);
    assert_eq!(blocked.children[0].title, "Hammer");
}

#[tokio::test]
async fn test_missing_record_on_delete_depends_on_kind() {
    let catalog = TestCatalog::new();

    let gate = catalog
        .service
        .request_delete::<Brand>(5.into())
        .await
        .unwrap();
    assert!(matches!(gate, DeleteGate::Absent));

    let gate = catalog
        .service
        .request_delete::<Category>(5.into())
        .await
        .unwrap();
    assert!(matches!(gate, DeleteGate::Absent));

    let err = catalog
        .service
        .request_delete::<Item>(5.into())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::NotFound {
            kind: EntityKind::Item,
            ..
        }
    ));

    let err = catalog
        .service
        .confirm_delete::<ItemInstance>(5.into())
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete_gate_fails_when_either_read_fails() {
    let catalog = TestCatalog::new();
    let brand = catalog.brand("Acme").await;

    catalog
        .store
        .set_collection_available(EntityKind::Item, false);
    let err = catalog
        .service
        .request_delete::<Brand>(brand)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Store(StoreError::Unavailable)));

    catalog.store.set_collection_available(EntityKind::Item, true);
    catalog
        .store
        .set_collection_available(EntityKind::Brand, false);
    let err = catalog
        .service
        .confirm_delete::<Brand>(brand)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Store(StoreError::Unavailable)));

    catalog.store.set_available(true);
    assert!(catalog.service.get::<Brand>(brand).await.is_ok());
}

// =============================================================================
// Detail resolution
// =============================================================================

#[tokio::test]
async fn test_item_detail_resolves_brand_and_categories() {
    let catalog = TestCatalog::new();
    let brand = catalog.brand("Acme").await;
    let tools = catalog.category("tools").await;
    let sale = catalog.category("sale").await;
    let item = catalog.item("Hammer", brand, &[tools, sale]).await;
    catalog.instance(item, "L").await;
    catalog.instance(item, "S").await;

    let detail = catalog.service.detail::<Item>(item).await.unwrap();

    assert_eq!(detail.brand.id, brand);
    assert_eq!(detail.brand.name, "Acme");
    let names: Vec<_> = detail.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["TOOLS", "SALE"]);
    let sizes: Vec<_> = detail.instances.iter().map(|i| i.size.as_str()).collect();
    assert_eq!(sizes, ["L", "S"]);
}

#[tokio::test]
async fn test_instance_detail_resolves_item_graph() {
    let catalog = TestCatalog::new();
    let brand = catalog.brand("Acme").await;
    let tools = catalog.category("tools").await;
    let item = catalog.item("Hammer", brand, &[tools]).await;
    let instance = catalog.instance(item, "M").await;

    let detail = catalog
        .service
        .detail::<ItemInstance>(instance)
        .await
        .unwrap();

    assert_eq!(detail.item.id, item);
    assert_eq!(detail.brand.name, "Acme");
    assert_eq!(detail.categories.len(), 1);
    assert_eq!(detail.instance.price.display(), "$19.99");
}

#[tokio::test]
async fn test_brand_detail_lists_its_items() {
    let catalog = TestCatalog::new();
    let acme = catalog.brand("Acme").await;
    let other = catalog.brand("Other").await;
    catalog.item("Zither", acme, &[]).await;
    catalog.item("Anvil", acme, &[]).await;
    catalog.item("Kettle", other, &[]).await;

    let detail = catalog.service.detail::<Brand>(acme).await.unwrap();
    let titles: Vec<_> = detail.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, ["Anvil", "Zither"]);
}

#[tokio::test]
async fn test_detail_of_unknown_item_is_not_found() {
    let catalog = TestCatalog::new();

    let err = catalog
        .service
        .detail::<Item>(ItemId::new(3))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::NotFound {
            kind: EntityKind::Item,
            id: 3
        }
    ));
}

// =============================================================================
// Overview
// =============================================================================

#[tokio::test]
async fn test_overview_counts_items_per_category() {
    let catalog = TestCatalog::new();
    let brand = catalog.brand("Acme").await;
    let tools = catalog.category("tools").await;
    let sale = catalog.category("sale").await;
    let hammer = catalog.item("Hammer", brand, &[tools, sale]).await;
    catalog.item("Saw", brand, &[tools]).await;
    catalog.instance(hammer, "M").await;

    let overview = catalog.service.overview().await.unwrap();

    assert_eq!(overview.brand_count, 1);
    assert_eq!(overview.item_count, 2);
    assert_eq!(overview.instance_count, 1);
    let counts: Vec<_> = overview
        .categories
        .iter()
        .map(|summary| (summary.category.name.as_str(), summary.item_count))
        .collect();
    assert_eq!(counts, [("SALE", 1), ("TOOLS", 2)]);
}

#[tokio::test]
async fn test_listings_leave_out_images() {
    let catalog = TestCatalog::new();
    let brand = catalog
        .service
        .create::<Brand>(
            BrandForm {
                name: "Acme".to_string(),
                description: "Anvils".to_string(),
                location: "Desert".to_string(),
            },
            Some(png("logo.png")),
        )
        .await
        .unwrap()
        .target()
        .unwrap();
    catalog.item("Anvil", brand, &[]).await;

    let listed = catalog.service.list::<Brand>(&BrandFilter).await.unwrap();
    assert!(listed[0].image.is_none());

    let detail = catalog.service.detail::<Brand>(brand).await.unwrap();
    assert_eq!(detail.brand.image.unwrap().file_name, "logo.png");
    assert_eq!(detail.items.len(), 1);
}
