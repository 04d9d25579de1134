//! Per-kind catalog rules.
//!
//! Every rule that differs between brands, categories, items and item
//! instances lives in one `CatalogEntity` impl: which collection holds the
//! records, which records depend on them, what a missing record means on
//! the delete path, how a form is validated and which references it makes.
//! The service routines in the parent module are written once against this
//! trait.

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;

use catalog_core::{
    BrandId, CategoryId, EntityKind, IdParseError, ItemId, Price, PriceError, StoredImage,
};

use super::validation::{FieldError, FormValues, MAX_NAME_LEN, Validator, escape_html};
use crate::db::{CatalogStore, Collection, ListOrder, Projection, StoreError};
use crate::models::item_instance::DEFAULT_IN_STOCK;
use crate::models::{
    Brand, BrandDetail, BrandDraft, BrandFilter, BrandForm, Category, CategoryDetail,
    CategoryDraft, CategoryFilter, CategoryForm, Item, ItemDetail, ItemDraft, ItemFilter,
    ItemForm, ItemInstance, ItemInstanceDetail, ItemInstanceDraft, ItemInstanceFilter,
    ItemInstanceForm,
};

/// What the delete path does when the id doesn't resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Treat the record as already gone and send the operator back to the list.
    ReturnToList,
    /// Fail with `NotFound`.
    NotFound,
}

/// A reference from a submitted form to another record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Brand(BrandId),
    Category(CategoryId),
    Item(ItemId),
}

impl Reference {
    /// Form field the reference was submitted through.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Brand(_) => "brand",
            Self::Category(_) => "category",
            Self::Item(_) => "item",
        }
    }
}

/// A kind of catalog record and the rules that govern it.
#[async_trait]
pub trait CatalogEntity: Clone + Debug + Send + Sync + Sized + 'static {
    type Id: Copy
        + Eq
        + Ord
        + Hash
        + Display
        + Debug
        + From<i32>
        + Into<i32>
        + FromStr<Err = IdParseError>
        + Send
        + Sync
        + 'static;
    type Draft: Clone + Debug + Send + Sync + 'static;
    type Form: FormValues + Clone + Debug + Default + Send + Sync + 'static;
    type Filter: Debug + Default + Send + Sync + 'static;
    type Detail: Send + 'static;
    /// Records that reference this kind and block its deletion.
    type Child: CatalogEntity;

    const KIND: EntityKind;
    const MISSING_ON_DELETE: MissingPolicy;

    fn collection(store: &dyn CatalogStore) -> &dyn Collection<Self>;

    fn id(&self) -> Self::Id;
    fn label(&self) -> &str;
    fn is_protected(&self) -> bool;
    fn created_at(&self) -> DateTime<Utc>;
    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Assemble a stored record from a draft.
    fn materialize(
        id: Self::Id,
        draft: Self::Draft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self;

    fn to_draft(&self) -> Self::Draft;
    fn set_protected(draft: &mut Self::Draft, protected: bool);

    /// Attach an uploaded image. Kinds without images ignore it.
    fn set_image(draft: &mut Self::Draft, image: StoredImage);

    fn image(&self) -> Option<&StoredImage>;

    /// Drop the image, as a summary read returns the record.
    fn clear_image(&mut self) {}

    /// Copy over fields an update form can't change: the protected flag,
    /// and the image when no new one was uploaded.
    fn carry_over(draft: &mut Self::Draft, existing: &Self);

    /// Filter selecting the records that depend on `id`, if any can.
    fn child_filter(id: Self::Id) -> Option<<Self::Child as CatalogEntity>::Filter>;

    fn validate(form: &Self::Form) -> Result<Self::Draft, Vec<FieldError>>;

    /// Well-formed references made by a form; malformed ones are reported by `validate`.
    fn references(_form: &Self::Form) -> Vec<Reference> {
        Vec::new()
    }

    /// Natural key of a draft: the field it is submitted through and a
    /// filter finding any record already holding it.
    fn identity(_draft: &Self::Draft) -> Option<(&'static str, Self::Filter)> {
        None
    }

    /// Resolve references and list dependents.
    async fn resolve(store: &dyn CatalogStore, record: Self) -> Result<Self::Detail, StoreError>;

    fn detail_path(&self) -> String {
        Self::KIND.detail_path(self.id())
    }

    /// Where the operator lands once the record is deleted.
    fn after_delete_path(&self) -> String {
        Self::KIND.list_path().to_string()
    }
}

// =============================================================================
// Brand
// =============================================================================

#[async_trait]
impl CatalogEntity for Brand {
    type Id = BrandId;
    type Draft = BrandDraft;
    type Form = BrandForm;
    type Filter = BrandFilter;
    type Detail = BrandDetail;
    type Child = Item;

    const KIND: EntityKind = EntityKind::Brand;
    const MISSING_ON_DELETE: MissingPolicy = MissingPolicy::ReturnToList;

    fn collection(store: &dyn CatalogStore) -> &dyn Collection<Self> {
        store.brands()
    }

    fn id(&self) -> BrandId {
        self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn is_protected(&self) -> bool {
        self.protected
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn matches(&self, _filter: &BrandFilter) -> bool {
        true
    }

    fn materialize(
        id: BrandId,
        draft: BrandDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            location: draft.location,
            image: draft.image,
            protected: draft.protected,
            created_at,
            updated_at,
        }
    }

    fn to_draft(&self) -> BrandDraft {
        BrandDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            image: self.image.clone(),
            protected: self.protected,
        }
    }

    fn set_protected(draft: &mut BrandDraft, protected: bool) {
        draft.protected = protected;
    }

    fn set_image(draft: &mut BrandDraft, image: StoredImage) {
        draft.image = Some(image);
    }

    fn image(&self) -> Option<&StoredImage> {
        self.image.as_ref()
    }

    fn clear_image(&mut self) {
        self.image = None;
    }

    fn carry_over(draft: &mut BrandDraft, existing: &Self) {
        draft.protected = existing.protected;
        if draft.image.is_none() {
            draft.image.clone_from(&existing.image);
        }
    }

    fn child_filter(id: BrandId) -> Option<ItemFilter> {
        Some(ItemFilter {
            brand: Some(id),
            category: None,
        })
    }

    fn validate(form: &BrandForm) -> Result<BrandDraft, Vec<FieldError>> {
        let mut v = Validator::new();
        let name = v.required_text("name", &form.name, "Brand name required", Some(MAX_NAME_LEN));
        let description =
            v.required_text("description", &form.description, "Brand description required", None);
        let location =
            v.required_text("location", &form.location, "Brand location required", None);

        if !v.is_clean() {
            return Err(v.into_errors());
        }
        Ok(BrandDraft {
            name,
            description,
            location,
            image: None,
            protected: false,
        })
    }

    async fn resolve(store: &dyn CatalogStore, brand: Self) -> Result<BrandDetail, StoreError> {
        let filter = ItemFilter {
            brand: Some(brand.id),
            category: None,
        };
        let items = store.items().find_many(&filter, ListOrder::ByLabel, Projection::Summary).await?;
        Ok(BrandDetail { brand, items })
    }
}

impl FormValues for BrandForm {
    fn escaped(&self) -> Self {
        Self {
            name: escape_html(&self.name),
            description: escape_html(&self.description),
            location: escape_html(&self.location),
        }
    }
}

// =============================================================================
// Category
// =============================================================================

#[async_trait]
impl CatalogEntity for Category {
    type Id = CategoryId;
    type Draft = CategoryDraft;
    type Form = CategoryForm;
    type Filter = CategoryFilter;
    type Detail = CategoryDetail;
    type Child = Item;

    const KIND: EntityKind = EntityKind::Category;
    const MISSING_ON_DELETE: MissingPolicy = MissingPolicy::ReturnToList;

    fn collection(store: &dyn CatalogStore) -> &dyn Collection<Self> {
        store.categories()
    }

    fn id(&self) -> CategoryId {
        self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn is_protected(&self) -> bool {
        self.protected
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn matches(&self, filter: &CategoryFilter) -> bool {
        filter.name.as_ref().is_none_or(|name| *name == self.name)
    }

    fn materialize(
        id: CategoryId,
        draft: CategoryDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            item_count: 0,
            image: draft.image,
            protected: draft.protected,
            created_at,
            updated_at,
        }
    }

    fn to_draft(&self) -> CategoryDraft {
        CategoryDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            protected: self.protected,
        }
    }

    fn set_protected(draft: &mut CategoryDraft, protected: bool) {
        draft.protected = protected;
    }

    fn set_image(draft: &mut CategoryDraft, image: StoredImage) {
        draft.image = Some(image);
    }

    fn image(&self) -> Option<&StoredImage> {
        self.image.as_ref()
    }

    fn clear_image(&mut self) {
        self.image = None;
    }

    fn carry_over(draft: &mut CategoryDraft, existing: &Self) {
        draft.protected = existing.protected;
        if draft.image.is_none() {
            draft.image.clone_from(&existing.image);
        }
    }

    fn child_filter(id: CategoryId) -> Option<ItemFilter> {
        Some(ItemFilter {
            brand: None,
            category: Some(id),
        })
    }

    fn validate(form: &CategoryForm) -> Result<CategoryDraft, Vec<FieldError>> {
        let mut v = Validator::new();
        // Folded before the length check; stored names are uppercase.
        let name = v.required_text(
            "name",
            &form.name.to_uppercase(),
            "Category name required",
            Some(MAX_NAME_LEN),
        );
        v.alphanumeric(
            "name",
            form.name.trim(),
            "Name has non-alphanumeric characters.",
        );
        let description = v.required_text(
            "description",
            &form.description,
            "Category description required",
            None,
        );

        if !v.is_clean() {
            return Err(v.into_errors());
        }
        Ok(CategoryDraft {
            name,
            description,
            image: None,
            protected: false,
        })
    }

    fn identity(draft: &CategoryDraft) -> Option<(&'static str, CategoryFilter)> {
        Some((
            "name",
            CategoryFilter {
                name: Some(draft.name.clone()),
            },
        ))
    }

    async fn resolve(
        store: &dyn CatalogStore,
        category: Self,
    ) -> Result<CategoryDetail, StoreError> {
        let filter = ItemFilter {
            brand: None,
            category: Some(category.id),
        };
        let items = store.items().find_many(&filter, ListOrder::ByLabel, Projection::Summary).await?;
        Ok(CategoryDetail { category, items })
    }
}

impl FormValues for CategoryForm {
    fn escaped(&self) -> Self {
        Self {
            name: escape_html(&self.name),
            description: escape_html(&self.description),
        }
    }
}

// =============================================================================
// Item
// =============================================================================

/// Fetch an item's brand and categories concurrently.
///
/// A missing brand means the row is corrupt. A missing category is
/// skipped with a warning; the link is stale but the item is still usable.
async fn resolve_item_references(
    store: &dyn CatalogStore,
    item: &Item,
) -> Result<(Brand, Vec<Category>), StoreError> {
    let brand = store.brands().find_by_id(item.brand_id);
    let categories = try_join_all(
        item.category_ids
            .iter()
            .map(|id| store.categories().find_by_id(*id)),
    );
    let (brand, categories) = tokio::try_join!(brand, categories)?;

    let brand = brand.ok_or_else(|| {
        StoreError::DataCorruption(format!(
            "item {} references missing brand {}",
            item.id, item.brand_id
        ))
    })?;

    let resolved = categories.len();
    let categories: Vec<Category> = categories.into_iter().flatten().collect();
    if categories.len() != resolved {
        tracing::warn!(
            item_id = %item.id,
            missing = resolved - categories.len(),
            "Item references categories that no longer exist"
        );
    }

    Ok((brand, categories))
}

#[async_trait]
impl CatalogEntity for Item {
    type Id = ItemId;
    type Draft = ItemDraft;
    type Form = ItemForm;
    type Filter = ItemFilter;
    type Detail = ItemDetail;
    type Child = ItemInstance;

    const KIND: EntityKind = EntityKind::Item;
    const MISSING_ON_DELETE: MissingPolicy = MissingPolicy::NotFound;

    fn collection(store: &dyn CatalogStore) -> &dyn Collection<Self> {
        store.items()
    }

    fn id(&self) -> ItemId {
        self.id
    }

    fn label(&self) -> &str {
        &self.title
    }

    fn is_protected(&self) -> bool {
        self.protected
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn matches(&self, filter: &ItemFilter) -> bool {
        filter.brand.is_none_or(|brand| brand == self.brand_id)
            && filter
                .category
                .is_none_or(|category| self.category_ids.contains(&category))
    }

    fn materialize(
        id: ItemId,
        draft: ItemDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            product_id: draft.product_id,
            brand_id: draft.brand_id,
            category_ids: draft.category_ids,
            image: draft.image,
            protected: draft.protected,
            created_at,
            updated_at,
        }
    }

    fn to_draft(&self) -> ItemDraft {
        ItemDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            product_id: self.product_id,
            brand_id: self.brand_id,
            category_ids: self.category_ids.clone(),
            image: self.image.clone(),
            protected: self.protected,
        }
    }

    fn set_protected(draft: &mut ItemDraft, protected: bool) {
        draft.protected = protected;
    }

    fn set_image(draft: &mut ItemDraft, image: StoredImage) {
        draft.image = Some(image);
    }

    fn image(&self) -> Option<&StoredImage> {
        self.image.as_ref()
    }

    fn clear_image(&mut self) {
        self.image = None;
    }

    fn carry_over(draft: &mut ItemDraft, existing: &Self) {
        draft.protected = existing.protected;
        if draft.image.is_none() {
            draft.image.clone_from(&existing.image);
        }
    }

    fn child_filter(id: ItemId) -> Option<ItemInstanceFilter> {
        Some(ItemInstanceFilter { item: Some(id) })
    }

    fn validate(form: &ItemForm) -> Result<ItemDraft, Vec<FieldError>> {
        let mut v = Validator::new();
        let title = v.required_text(
            "title",
            &form.title,
            "Product title is required",
            Some(MAX_NAME_LEN),
        );
        let description = v.required_text(
            "description",
            &form.description,
            "Product description is required",
            None,
        );
        let product_id = v.parse::<i64>(
            "product_id",
            &form.product_id,
            "Product ID is required",
            "Product ID has to be a number",
        );
        let brand_id = v.parse::<BrandId>("brand", &form.brand, "Brand is required", "Brand is invalid");

        let mut category_ids: Vec<CategoryId> = Vec::with_capacity(form.category.len());
        let mut bad_category = false;
        for raw in &form.category {
            match raw.parse::<CategoryId>() {
                Ok(id) if !category_ids.contains(&id) => category_ids.push(id),
                Ok(_) => {}
                Err(_) => bad_category = true,
            }
        }
        if bad_category {
            v.push("category", "Category selection is invalid");
        }

        match (product_id, brand_id) {
            (Some(product_id), Some(brand_id)) if v.is_clean() => Ok(ItemDraft {
                title,
                description,
                product_id,
                brand_id,
                category_ids,
                image: None,
                protected: false,
            }),
            _ => Err(v.into_errors()),
        }
    }

    fn references(form: &ItemForm) -> Vec<Reference> {
        let mut refs = Vec::with_capacity(form.category.len() + 1);
        if let Ok(brand) = form.brand.parse() {
            refs.push(Reference::Brand(brand));
        }
        for raw in &form.category {
            if let Ok(category) = raw.parse() {
                let reference = Reference::Category(category);
                if !refs.contains(&reference) {
                    refs.push(reference);
                }
            }
        }
        refs
    }

    async fn resolve(store: &dyn CatalogStore, item: Self) -> Result<ItemDetail, StoreError> {
        let filter = ItemInstanceFilter {
            item: Some(item.id),
        };
        let references = resolve_item_references(store, &item);
        let instances = store.item_instances().find_many(&filter, ListOrder::ByLabel, Projection::Summary);
        let ((brand, categories), instances) = tokio::try_join!(references, instances)?;
        Ok(ItemDetail {
            item,
            brand,
            categories,
            instances,
        })
    }
}

impl FormValues for ItemForm {
    fn escaped(&self) -> Self {
        Self {
            title: escape_html(&self.title),
            description: escape_html(&self.description),
            product_id: escape_html(&self.product_id),
            brand: escape_html(&self.brand),
            category: self.category.iter().map(|c| escape_html(c)).collect(),
        }
    }
}

// =============================================================================
// Item instance
// =============================================================================

fn price_message(err: &PriceError) -> String {
    match err {
        PriceError::NotANumber(_) | PriceError::Negative => {
            "Price must be a non-negative number".to_string()
        }
        PriceError::TooPrecise => "Price can have at most 2 decimal places".to_string(),
        PriceError::TooLarge => format!("Price must be less than {}", Price::LIMIT),
    }
}

#[async_trait]
impl CatalogEntity for ItemInstance {
    type Id = catalog_core::ItemInstanceId;
    type Draft = ItemInstanceDraft;
    type Form = ItemInstanceForm;
    type Filter = ItemInstanceFilter;
    type Detail = ItemInstanceDetail;
    /// Nothing references an instance.
    type Child = Self;

    const KIND: EntityKind = EntityKind::ItemInstance;
    const MISSING_ON_DELETE: MissingPolicy = MissingPolicy::NotFound;

    fn collection(store: &dyn CatalogStore) -> &dyn Collection<Self> {
        store.item_instances()
    }

    fn id(&self) -> Self::Id {
        self.id
    }

    fn label(&self) -> &str {
        &self.size
    }

    fn is_protected(&self) -> bool {
        self.protected
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn matches(&self, filter: &ItemInstanceFilter) -> bool {
        filter.item.is_none_or(|item| item == self.item_id)
    }

    fn materialize(
        id: Self::Id,
        draft: ItemInstanceDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            size: draft.size,
            price: draft.price,
            in_stock: draft.in_stock,
            item_id: draft.item_id,
            protected: draft.protected,
            created_at,
            updated_at,
        }
    }

    fn to_draft(&self) -> ItemInstanceDraft {
        ItemInstanceDraft {
            size: self.size.clone(),
            price: self.price,
            in_stock: self.in_stock,
            item_id: self.item_id,
            protected: self.protected,
        }
    }

    fn set_protected(draft: &mut ItemInstanceDraft, protected: bool) {
        draft.protected = protected;
    }

    fn set_image(_draft: &mut ItemInstanceDraft, _image: StoredImage) {}

    fn image(&self) -> Option<&StoredImage> {
        None
    }

    fn carry_over(draft: &mut ItemInstanceDraft, existing: &Self) {
        draft.protected = existing.protected;
    }

    fn after_delete_path(&self) -> String {
        self.item_path()
    }

    fn child_filter(_id: Self::Id) -> Option<ItemInstanceFilter> {
        None
    }

    fn validate(form: &ItemInstanceForm) -> Result<ItemInstanceDraft, Vec<FieldError>> {
        let mut v = Validator::new();
        let size = v.required_text("size", &form.size, "Product size is required", None);
        let price = if form.price.trim().is_empty() {
            v.push("price", "Product price is required");
            None
        } else {
            match form.price.parse::<Price>() {
                Ok(price) => Some(price),
                Err(err) => {
                    v.push("price", price_message(&err));
                    None
                }
            }
        };
        let in_stock = if form.in_stock.trim().is_empty() {
            Some(DEFAULT_IN_STOCK)
        } else {
            match v.parse::<i32>(
                "in_stock",
                &form.in_stock,
                "In stock is required",
                "In stock needs to be a whole number",
            ) {
                Some(n) if n < 0 => {
                    v.push("in_stock", "In stock cannot be negative");
                    None
                }
                parsed => parsed,
            }
        };
        let item_id = v.parse::<ItemId>("item", &form.item, "Product is required", "Product is invalid");

        match (price, in_stock, item_id) {
            (Some(price), Some(in_stock), Some(item_id)) if v.is_clean() => Ok(ItemInstanceDraft {
                size,
                price,
                in_stock,
                item_id,
                protected: false,
            }),
            _ => Err(v.into_errors()),
        }
    }

    fn references(form: &ItemInstanceForm) -> Vec<Reference> {
        form.item
            .parse()
            .map(|item| vec![Reference::Item(item)])
            .unwrap_or_default()
    }

    async fn resolve(
        store: &dyn CatalogStore,
        instance: Self,
    ) -> Result<ItemInstanceDetail, StoreError> {
        let item = store
            .items()
            .find_by_id(instance.item_id)
            .await?
            .ok_or_else(|| {
                StoreError::DataCorruption(format!(
                    "item instance {} references missing item {}",
                    instance.id, instance.item_id
                ))
            })?;
        let (brand, categories) = resolve_item_references(store, &item).await?;
        Ok(ItemInstanceDetail {
            instance,
            item,
            brand,
            categories,
        })
    }
}

impl FormValues for ItemInstanceForm {
    fn escaped(&self) -> Self {
        Self {
            size: escape_html(&self.size),
            price: escape_html(&self.price),
            in_stock: escape_html(&self.in_stock),
            item: escape_html(&self.item),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_form() -> ItemForm {
        ItemForm {
            title: "Runner".to_string(),
            description: "Light shoe".to_string(),
            product_id: "1001".to_string(),
            brand: "1".to_string(),
            category: vec!["2".to_string(), "3".to_string(), "2".to_string()],
        }
    }

    #[test]
    fn test_category_name_is_uppercased() {
        let form = CategoryForm {
            name: " shoes ".to_string(),
            description: "Footwear".to_string(),
        };
        let draft = Category::validate(&form).unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(draft.name, "SHOES");
    }

    #[test]
    fn test_category_name_must_be_alphanumeric() {
        let form = CategoryForm {
            name: "running shoes".to_string(),
            description: "Footwear".to_string(),
        };
        let errors = Category::validate(&form).err().unwrap_or_default();
        assert_eq!(
            errors,
            vec![FieldError::new("name", "Name has non-alphanumeric characters.")]
        );
    }

    #[test]
    fn test_category_name_rejects_non_ascii() {
        let form = CategoryForm {
            name: "Café".to_string(),
            description: "Coffee".to_string(),
        };
        let errors = Category::validate(&form).err().unwrap_or_default();
        assert_eq!(
            errors,
            vec![FieldError::new("name", "Name has non-alphanumeric characters.")]
        );
    }

    #[test]
    fn test_category_name_length_counts_folded_name() {
        // "ß" uppercases to "SS": 60 characters in, 120 stored.
        let form = CategoryForm {
            name: "ß".repeat(60),
            description: "Footwear".to_string(),
        };
        let messages: Vec<String> = Category::validate(&form)
            .err()
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert!(messages.contains(&"Must be at most 100 characters".to_string()));

        let form = CategoryForm {
            name: "A".repeat(MAX_NAME_LEN),
            description: "Footwear".to_string(),
        };
        assert!(Category::validate(&form).is_ok());
    }

    #[test]
    fn test_item_categories_are_deduplicated() {
        let draft = Item::validate(&item_form()).unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(
            draft.category_ids,
            vec![CategoryId::new(2), CategoryId::new(3)]
        );
        assert_eq!(draft.brand_id, BrandId::new(1));
    }

    #[test]
    fn test_item_without_categories_is_valid() {
        let form = ItemForm {
            category: Vec::new(),
            ..item_form()
        };
        let draft = Item::validate(&form).unwrap_or_else(|e| panic!("{e:?}"));
        assert!(draft.category_ids.is_empty());
    }

    #[test]
    fn test_item_reports_every_bad_field() {
        let form = ItemForm {
            title: String::new(),
            description: " ".to_string(),
            product_id: "abc".to_string(),
            brand: String::new(),
            category: vec!["x".to_string()],
        };
        let fields: Vec<&str> = Item::validate(&form)
            .err()
            .unwrap_or_default()
            .iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(
            fields,
            vec!["title", "description", "product_id", "brand", "category"]
        );
    }

    #[test]
    fn test_item_references() {
        let refs = Item::references(&item_form());
        assert_eq!(
            refs,
            vec![
                Reference::Brand(BrandId::new(1)),
                Reference::Category(CategoryId::new(2)),
                Reference::Category(CategoryId::new(3)),
            ]
        );
    }

    #[test]
    fn test_instance_in_stock_defaults_to_one() {
        let form = ItemInstanceForm {
            size: "M".to_string(),
            price: "19.99".to_string(),
            in_stock: String::new(),
            item: "4".to_string(),
        };
        let draft = ItemInstance::validate(&form).unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(draft.in_stock, DEFAULT_IN_STOCK);
        assert_eq!(draft.item_id, ItemId::new(4));
    }

    #[test]
    fn test_instance_rejects_negative_stock_and_price() {
        let form = ItemInstanceForm {
            size: "M".to_string(),
            price: "-2".to_string(),
            in_stock: "-1".to_string(),
            item: "4".to_string(),
        };
        let fields: Vec<&str> = ItemInstance::validate(&form)
            .err()
            .unwrap_or_default()
            .iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["price", "in_stock"]);
    }

    #[test]
    fn test_instance_price_must_fit_a_stored_price() {
        let validate_price = |price: &str| {
            let form = ItemInstanceForm {
                size: "M".to_string(),
                price: price.to_string(),
                in_stock: "1".to_string(),
                item: "4".to_string(),
            };
            ItemInstance::validate(&form)
                .err()
                .unwrap_or_default()
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
        };
        assert_eq!(
            validate_price("123456789.999"),
            vec!["Price can have at most 2 decimal places"]
        );
        assert_eq!(
            validate_price("100000000"),
            vec!["Price must be less than 100000000"]
        );
        assert!(validate_price("99999999.99").is_empty());
        assert_eq!(validate_price(""), vec!["Product price is required"]);
    }

    #[test]
    fn test_item_filter_matching() {
        let now = Utc::now();
        let item = Item::materialize(
            ItemId::new(1),
            Item::validate(&item_form()).unwrap_or_else(|e| panic!("{e:?}")),
            now,
            now,
        );
        assert!(item.matches(&ItemFilter::default()));
        assert!(item.matches(&ItemFilter {
            brand: Some(BrandId::new(1)),
            category: Some(CategoryId::new(3)),
        }));
        assert!(!item.matches(&ItemFilter {
            brand: None,
            category: Some(CategoryId::new(9)),
        }));
    }

    #[test]
    fn test_escaped_form_values() {
        let form = BrandForm {
            name: "<script>".to_string(),
            description: "a & b".to_string(),
            location: "\"quoted\"".to_string(),
        };
        let escaped = form.escaped();
        assert_eq!(escaped.name, "&lt;script&gt;");
        assert_eq!(escaped.description, "a &amp; b");
        assert_eq!(escaped.location, "&quot;quoted&quot;");
    }
}
