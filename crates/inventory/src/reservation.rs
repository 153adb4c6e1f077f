//! The reservation engine: reserve with rollback, restore best-effort.

use catalog::{CatalogError, CatalogStore, StockAdjustment};
use common::{ProductId, Size};
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, Result};

/// A request to reserve or restore stock for one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRequest {
    pub product_id: ProductId,
    pub size: Size,
    pub quantity: u32,
}

impl StockRequest {
    /// Creates a new stock request.
    pub fn new(product_id: impl Into<ProductId>, size: Size, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            size,
            quantity,
        }
    }
}

/// One item that could not be reserved.
///
/// `available` is the stock observed when the decrement was attempted (or
/// probed); client UIs key off the `size`/`requested`/`available` fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortage {
    pub product_id: ProductId,
    pub size: Size,
    pub requested: u32,
    pub available: u32,
}

/// Result of a successful reservation: the per-item deltas that were
/// applied, in application order. Feed these back into `restore` to
/// compensate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveReceipt {
    pub applied: Vec<StockRequest>,
}

/// A restore increment that could not be applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreFailure {
    pub product_id: ProductId,
    pub size: Size,
    pub quantity: u32,
    pub reason: String,
}

/// Outcome of a best-effort restoration pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestoreReport {
    /// Number of items successfully restored.
    pub restored: usize,
    /// Items whose increment failed; stock for these remains under-counted.
    pub failures: Vec<RestoreFailure>,
}

impl RestoreReport {
    /// Returns true if every item was restored.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Applies multi-item stock reservations against a catalog store.
///
/// The engine holds no locks of its own; correctness rests entirely on the
/// store's per-record atomic conditional update. Items are processed in
/// caller order with no reordering, so the first request to complete its
/// full sequence wins contested stock.
#[derive(Clone)]
pub struct ReservationEngine<C: CatalogStore> {
    catalog: C,
}

impl<C: CatalogStore> ReservationEngine<C> {
    /// Creates a new reservation engine over the given catalog store.
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Returns a reference to the underlying catalog store.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Atomically reserves stock for all items, or none of them.
    ///
    /// Each item applies a conditional decrement in input order. On the
    /// first rejected or failed decrement the already-applied decrements
    /// are re-incremented in application order and the whole operation
    /// fails with `OutOfStock`. If a rollback increment itself fails the
    /// error escalates to the fatal `Inconsistent` variant instead.
    #[tracing::instrument(skip(self, items), fields(items = items.len()))]
    pub async fn reserve(&self, items: &[StockRequest]) -> Result<ReserveReceipt> {
        metrics::counter!("reservation_attempts_total").increment(1);

        let mut applied: Vec<StockRequest> = Vec::with_capacity(items.len());

        for (idx, item) in items.iter().enumerate() {
            let outcome = self
                .catalog
                .adjust_stock(&item.product_id, item.size, -(item.quantity as i64))
                .await;

            match outcome {
                Ok(StockAdjustment::Applied { remaining }) => {
                    tracing::debug!(
                        product_id = %item.product_id,
                        size = %item.size,
                        quantity = item.quantity,
                        remaining,
                        "stock reserved"
                    );
                    applied.push(item.clone());
                }
                Ok(StockAdjustment::Insufficient { available }) => {
                    let shortage = Shortage {
                        product_id: item.product_id.clone(),
                        size: item.size,
                        requested: item.quantity,
                        available,
                    };
                    return self.abort(applied, shortage, &items[idx + 1..]).await;
                }
                Err(
                    CatalogError::ProductNotFound(_) | CatalogError::VariantNotFound { .. },
                ) => {
                    // A missing record mid-list is a shortage from the
                    // caller's point of view: nothing can be had.
                    let shortage = Shortage {
                        product_id: item.product_id.clone(),
                        size: item.size,
                        requested: item.quantity,
                        available: 0,
                    };
                    return self.abort(applied, shortage, &items[idx + 1..]).await;
                }
                Err(e) => {
                    self.rollback(&applied).await?;
                    return Err(e.into());
                }
            }
        }

        Ok(ReserveReceipt { applied })
    }

    /// Best-effort restoration of previously-reserved stock.
    ///
    /// A failed increment is recorded and the loop continues: restoration
    /// runs inside a cancellation the user expects to succeed, and one
    /// missing variant must not block freeing stock for the rest of the
    /// order.
    #[tracing::instrument(skip(self, items), fields(items = items.len()))]
    pub async fn restore(&self, items: &[StockRequest]) -> RestoreReport {
        let mut report = RestoreReport::default();

        for item in items {
            match self
                .catalog
                .adjust_stock(&item.product_id, item.size, item.quantity as i64)
                .await
            {
                Ok(StockAdjustment::Applied { .. }) => report.restored += 1,
                Ok(StockAdjustment::Insufficient { .. }) => {
                    // Cannot happen for a positive delta on non-negative
                    // stock, but account for it rather than dropping it.
                    report.failures.push(RestoreFailure {
                        product_id: item.product_id.clone(),
                        size: item.size,
                        quantity: item.quantity,
                        reason: "conditional update rejected a positive delta".to_string(),
                    });
                }
                Err(e) => {
                    tracing::error!(
                        product_id = %item.product_id,
                        size = %item.size,
                        quantity = item.quantity,
                        error = %e,
                        "stock restore failed; variant remains under-counted"
                    );
                    report.failures.push(RestoreFailure {
                        product_id: item.product_id.clone(),
                        size: item.size,
                        quantity: item.quantity,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !report.is_clean() {
            metrics::counter!("restore_failures_total").increment(report.failures.len() as u64);
        }

        report
    }

    /// Rolls back applied decrements, probes the unattempted tail for
    /// additional shortages, and fails the reservation.
    async fn abort(
        &self,
        applied: Vec<StockRequest>,
        shortage: Shortage,
        unattempted: &[StockRequest],
    ) -> Result<ReserveReceipt> {
        metrics::counter!("reservation_conflicts_total").increment(1);
        tracing::warn!(
            product_id = %shortage.product_id,
            size = %shortage.size,
            requested = shortage.requested,
            available = shortage.available,
            rolled_back = applied.len(),
            "reservation aborted"
        );

        self.rollback(&applied).await?;

        // The first failure decided the abort; the remaining items are
        // probed read-only so the caller sees every short item at once.
        let mut shortages = vec![shortage];
        shortages.extend(self.probe_shortages(unattempted).await);

        Err(InventoryError::OutOfStock(shortages))
    }

    /// Re-applies inverse increments for every applied decrement, in the
    /// order they were applied. A failure here is fatal: the variant's
    /// stock is now under-counted and needs manual reconciliation.
    async fn rollback(&self, applied: &[StockRequest]) -> Result<()> {
        for item in applied {
            match self
                .catalog
                .adjust_stock(&item.product_id, item.size, item.quantity as i64)
                .await
            {
                Ok(StockAdjustment::Applied { .. }) => {}
                Ok(StockAdjustment::Insufficient { .. }) => {
                    // Unreachable for positive deltas; treat as a vanished
                    // record rather than ignore it.
                    return self.inconsistent(item, CatalogError::VariantNotFound {
                        product_id: item.product_id.clone(),
                        size: item.size,
                    });
                }
                Err(e) => return self.inconsistent(item, e),
            }
        }
        Ok(())
    }

    fn inconsistent(&self, item: &StockRequest, source: CatalogError) -> Result<()> {
        metrics::counter!("stock_inconsistencies_total").increment(1);
        tracing::error!(
            product_id = %item.product_id,
            size = %item.size,
            quantity = item.quantity,
            error = %source,
            "stock rollback failed; inventory is inconsistent"
        );
        Err(InventoryError::Inconsistent {
            product_id: item.product_id.clone(),
            size: item.size,
            quantity: item.quantity,
            source: Box::new(source),
        })
    }

    /// Read-only availability check for items that were never attempted.
    /// Advisory only: results may be stale under concurrency.
    async fn probe_shortages(&self, items: &[StockRequest]) -> Vec<Shortage> {
        let mut shortages = Vec::new();
        for item in items {
            let available = match self.catalog.get_product(&item.product_id).await {
                Ok(Some(product)) => product.stock_for(item.size).unwrap_or(0),
                Ok(None) => 0,
                // Probe failures don't add to the report.
                Err(_) => continue,
            };
            if available < item.quantity {
                shortages.push(Shortage {
                    product_id: item.product_id.clone(),
                    size: item.size,
                    requested: item.quantity,
                    available,
                });
            }
        }
        shortages
    }
}
