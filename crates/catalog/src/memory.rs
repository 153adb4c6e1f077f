use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{ProductId, Size};
use tokio::sync::RwLock;

use crate::{
    CatalogError, Product, Result,
    store::{CatalogStore, StockAdjustment},
};

/// In-memory catalog store for testing and local runs.
///
/// The whole product map sits behind one `RwLock`; holding the write lock
/// for the duration of `adjust_stock` makes each compare-and-adjust atomic
/// relative to every other call, which is the same guarantee the PostgreSQL
/// implementation gets from a single conditional `UPDATE`.
#[derive(Clone, Default)]
pub struct InMemoryCatalogStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryCatalogStore {
    /// Creates a new empty in-memory catalog store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of products stored.
    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }

    /// Clears all products.
    pub async fn clear(&self) {
        self.products.write().await.clear();
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        let mut products = self.products.write().await;
        if products.contains_key(&product.id) {
            return Err(CatalogError::AlreadyExists(product.id));
        }
        products.insert(product.id.clone(), product);
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut all: Vec<_> = products.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn adjust_stock(
        &self,
        product_id: &ProductId,
        size: Size,
        delta: i64,
    ) -> Result<StockAdjustment> {
        let mut products = self.products.write().await;

        let product = products
            .get_mut(product_id)
            .ok_or_else(|| CatalogError::ProductNotFound(product_id.clone()))?;

        let stock = product
            .variants
            .get_mut(&size)
            .ok_or_else(|| CatalogError::VariantNotFound {
                product_id: product_id.clone(),
                size,
            })?;

        let resulting = *stock as i64 + delta;
        if resulting < 0 {
            return Ok(StockAdjustment::Insufficient { available: *stock });
        }

        *stock = resulting as u32;
        Ok(StockAdjustment::Applied { remaining: *stock })
    }
}
