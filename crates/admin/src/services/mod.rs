//! Business logic services for admin.
//!
//! # Services
//!
//! - `catalog` - Catalog lifecycle rules: validated writes, reference
//!   checks and the delete gate

pub mod catalog;

pub use catalog::{
    BlockReason, Blocked, CatalogEntity, CatalogError, CatalogOverview, CatalogService,
    ConfirmOutcome, DeleteGate, FieldError, ValidationFailed, WriteOutcome,
};
