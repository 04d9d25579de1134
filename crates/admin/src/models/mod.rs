//! Domain models for the catalog.
//!
//! Each record kind has:
//! - the stored record (`Brand`, ...)
//! - a draft holding validated, mutable fields ready to be written
//! - a form holding raw submitted text
//! - a filter used to look up dependent records
//! - a detail view with references resolved

pub mod brand;
pub mod category;
pub mod item;
pub mod item_instance;

pub use brand::{Brand, BrandDetail, BrandDraft, BrandFilter, BrandForm};
pub use category::{Category, CategoryDetail, CategoryDraft, CategoryFilter, CategoryForm};
pub use item::{Item, ItemDetail, ItemDraft, ItemFilter, ItemForm};
pub use item_instance::{
    ItemInstance, ItemInstanceDetail, ItemInstanceDraft, ItemInstanceFilter, ItemInstanceForm,
};
