//! Catalog Keeper admin library.
//!
//! Server-rendered catalog management: brands, categories, items and
//! item instances, with validated writes and a delete gate that keeps
//! referenced or protected records in place.
//!
//! The binary in `main.rs` wires configuration, tracing and Sentry around
//! [`routes::app`]; the integration tests drive the same router against
//! [`db::MemoryCatalogStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
