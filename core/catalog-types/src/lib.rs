//! Core type definitions for the product catalog.
//!
//! This crate defines the records shared by every layer of the service:
//! - Product identifiers (UUID v7)
//! - Product records and their upsert form, keyed by a natural key
//! - The sync cursor persisted between importer runs

mod cursor;
mod ids;
mod product;

pub use cursor::SyncCursor;
pub use ids::ProductId;
pub use product::{NaturalKey, NewProduct, Product, INTEGRATION_CONTENTFUL};
