use async_trait::async_trait;
use common::{ProductId, Size};

use crate::{Product, Result};

/// Outcome of a conditional stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
    /// The adjustment was applied; `remaining` is the stock after it.
    Applied { remaining: u32 },

    /// The adjustment was rejected because it would drive stock below zero.
    /// `available` is the stock observed at attempt time.
    Insufficient { available: u32 },
}

impl StockAdjustment {
    /// Returns true if the adjustment was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, StockAdjustment::Applied { .. })
    }
}

/// Core trait for catalog store implementations.
///
/// `adjust_stock` is the atomicity unit of the whole engine: each call must
/// be applied atomically relative to every other call on the same
/// (product, size) record, so concurrent adjustments observe a linearizable
/// sequence of compare-and-adjust operations. No guarantee is required
/// across different variants.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Retrieves a product by ID. Returns None if it doesn't exist.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Inserts a new product. Fails with `AlreadyExists` on an ID collision.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Lists all products.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Atomically adds `delta` to the stock of the given variant, but only
    /// if the resulting stock stays non-negative.
    ///
    /// Returns `Insufficient` (with the observed stock) when the condition
    /// fails, `VariantNotFound`/`ProductNotFound` when the target record is
    /// missing, and `Database` for storage failures.
    async fn adjust_stock(
        &self,
        product_id: &ProductId,
        size: Size,
        delta: i64,
    ) -> Result<StockAdjustment>;
}
