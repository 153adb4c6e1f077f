//! Order domain error types.

use catalog::CatalogError;
use common::{OrderId, ProductId};
use inventory::{InventoryError, Shortage};
use thiserror::Error;

use crate::state::{OrderStatus, PaymentStatus};
use crate::store::OrderStoreError;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A referenced product does not exist; nothing was reserved.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// One or more line items exceeded available stock; any partial
    /// reservation was rolled back and nothing was persisted.
    #[error("Insufficient stock for {} item(s)", .0.len())]
    InsufficientStock(Vec<Shortage>),

    /// A rollback/compensation step failed, leaving stock miscounted for a
    /// variant. Surfaced distinctly from an ordinary out-of-stock failure.
    #[error("Stock inconsistency: {0}")]
    StockInconsistency(#[source] InventoryError),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The requested status change is not allowed by the state machine.
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The operation is not permitted in the order's current state.
    #[error("Invalid state: cannot {action} an order in {status} status")]
    InvalidState {
        status: OrderStatus,
        action: &'static str,
    },

    /// The operation is not permitted in the order's current payment state.
    #[error("Invalid payment state: cannot {action} an order whose payment is {payment_status}")]
    InvalidPaymentState {
        payment_status: PaymentStatus,
        action: &'static str,
    },

    /// A line item quantity below 1.
    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// Negative shipping cost.
    #[error("Invalid shipping cost: {cents} cents (must be >= 0)")]
    InvalidShippingCost { cents: i64 },

    /// Order has no line items.
    #[error("Order has no items")]
    NoItems,

    /// Order store error.
    #[error("Order store error: {0}")]
    Storage(#[from] OrderStoreError),

    /// Catalog store error.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl From<InventoryError> for OrderError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::OutOfStock(shortages) => OrderError::InsufficientStock(shortages),
            fatal @ InventoryError::Inconsistent { .. } => OrderError::StockInconsistency(fatal),
            InventoryError::Catalog(e) => OrderError::Catalog(e),
        }
    }
}

impl OrderError {
    /// Returns true for server-side failures that indicate a data-integrity
    /// or storage problem rather than a business-rule rejection.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            OrderError::StockInconsistency(_) | OrderError::Storage(_) | OrderError::Catalog(_)
        )
    }
}
