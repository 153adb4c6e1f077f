//! Catalog store for the order engine.
//!
//! Holds products with per-size variant stock counts and exposes the one
//! primitive everything else leans on: an atomic, per-variant conditional
//! stock adjustment. Stock is only ever mutated through that primitive.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod product;
pub mod store;

pub use error::{CatalogError, Result};
pub use memory::InMemoryCatalogStore;
pub use postgres::PostgresCatalogStore;
pub use product::Product;
pub use store::{CatalogStore, StockAdjustment};
