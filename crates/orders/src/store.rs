use async_trait::async_trait;
use common::{CustomerId, OrderId};
use thiserror::Error;

use crate::order::Order;
use crate::state::OrderStatus;

/// Errors that can occur in an order store.
#[derive(Debug, Error)]
pub enum OrderStoreError {
    /// No order exists with the given ID.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// An order with the given ID already exists.
    #[error("Order already exists: {0}")]
    Duplicate(OrderId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for order store results.
pub type Result<T> = std::result::Result<T, OrderStoreError>;

/// Filter for listing orders.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub customer_id: Option<CustomerId>,
    pub status: Option<OrderStatus>,
}

/// Core trait for order store implementations.
///
/// Order records are mutated only by the lifecycle manager; the store is a
/// dumb persistence seam with no business rules of its own.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order. Fails with `Duplicate` on an ID collision.
    async fn save(&self, order: Order) -> Result<()>;

    /// Retrieves an order by ID. Returns None if it doesn't exist.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Replaces an existing order. Fails with `NotFound` if absent.
    async fn update(&self, order: Order) -> Result<()>;

    /// Removes an order. Fails with `NotFound` if absent.
    async fn delete(&self, id: OrderId) -> Result<()>;

    /// Lists orders matching the filter, newest first.
    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>>;
}
