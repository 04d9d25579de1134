//! Core types for Catalog Keeper.
//!
//! This module provides type-safe wrappers for common catalog concepts.

pub mod id;
pub mod image;
pub mod kind;
pub mod price;

pub use id::*;
pub use image::StoredImage;
pub use kind::EntityKind;
pub use price::{Price, PriceError};
