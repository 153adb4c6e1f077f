//! Order domain for the engine.
//!
//! This crate provides:
//! - the `Order` record and its line items
//! - the `OrderStatus`/`PaymentStatus` state machines
//! - the pricing engine (pure repricing from catalog data)
//! - the `OrderStore` persistence seam with in-memory and PostgreSQL
//!   implementations
//! - `OrderService`, the lifecycle manager orchestrating pricing,
//!   reservation, and persistence

pub mod error;
pub mod memory;
pub mod order;
pub mod postgres;
pub mod pricing;
pub mod service;
pub mod state;
pub mod store;

pub use error::OrderError;
pub use memory::InMemoryOrderStore;
pub use order::{LineItem, Order};
pub use postgres::PostgresOrderStore;
pub use pricing::{DraftItem, order_total, price_items};
pub use service::{CancelledOrder, NewOrder, OrderService};
pub use state::{OrderStatus, PaymentStatus};
pub use store::{OrderFilter, OrderStore, OrderStoreError};
