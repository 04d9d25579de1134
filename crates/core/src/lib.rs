//! Catalog Keeper Core - Shared types library.
//!
//! This crate provides common types used across all Catalog Keeper components:
//! - `admin` - The catalog management web application
//! - `cli` - Command-line tools for migrations, seeding and record protection
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, entity kinds, prices and images

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
