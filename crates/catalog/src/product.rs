//! Product record with per-size variant stock.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{Money, ProductId, Size};
use serde::{Deserialize, Serialize};

/// A catalog product.
///
/// Variants are keyed by size, so a product can never carry two inventory
/// records for the same size. The `price` field is the authoritative unit
/// price; anything a client sends is ignored by the pricing path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    /// Stock count per size.
    pub variants: BTreeMap<Size, u32>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product with the given variant stock levels.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        variants: impl IntoIterator<Item = (Size, u32)>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            variants: variants.into_iter().collect(),
            created_at: Utc::now(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns the stock count for a size, or None if the product has no
    /// variant in that size.
    pub fn stock_for(&self, size: Size) -> Option<u32> {
        self.variants.get(&size).copied()
    }

    /// Returns the total stock across all variants.
    pub fn total_stock(&self) -> u64 {
        self.variants.values().map(|s| *s as u64).sum()
    }
}
