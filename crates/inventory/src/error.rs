//! Inventory error types.

use catalog::CatalogError;
use common::{ProductId, Size};
use thiserror::Error;

use crate::reservation::Shortage;

/// Errors that can occur during inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// One or more items exceeded available variant stock. The reservation
    /// was aborted and every partial decrement rolled back.
    #[error("Insufficient stock for {} item(s)", .0.len())]
    OutOfStock(Vec<Shortage>),

    /// A compensating increment failed after a decrement had already been
    /// applied. Stock for this variant is now under-counted; this is a
    /// data-integrity gap, not a business-rule failure.
    #[error("Stock rollback failed for {product_id} size {size} (quantity {quantity}): {source}")]
    Inconsistent {
        product_id: ProductId,
        size: Size,
        quantity: u32,
        #[source]
        source: Box<CatalogError>,
    },

    /// Catalog store error outside the conditional-update protocol.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl InventoryError {
    /// Returns true for the fatal inconsistency case that requires manual
    /// reconciliation rather than a user-facing out-of-stock message.
    pub fn is_fatal(&self) -> bool {
        matches!(self, InventoryError::Inconsistent { .. })
    }
}

/// Convenience type alias for inventory results.
pub type Result<T> = std::result::Result<T, InventoryError>;
