//! Pricing engine.
//!
//! Pure repricing over fetched catalog data. Whatever prices a caller may
//! have sent along never reach this module; a draft item carries only the
//! product, size, and quantity, and the unit price always comes from the
//! catalog record.

use std::collections::HashMap;

use catalog::Product;
use common::{Money, ProductId, Size};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::order::LineItem;

/// An unpriced line item as proposed by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftItem {
    pub product_id: ProductId,
    pub size: Size,
    pub quantity: u32,
}

impl DraftItem {
    /// Creates a new draft item.
    pub fn new(product_id: impl Into<ProductId>, size: Size, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            size,
            quantity,
        }
    }
}

/// Prices draft items against authoritative product records.
///
/// Fails with `ProductNotFound` if an item references a product absent from
/// the map. No side effects.
pub fn price_items(
    items: &[DraftItem],
    products: &HashMap<ProductId, Product>,
) -> Result<Vec<LineItem>, OrderError> {
    items
        .iter()
        .map(|item| {
            let product = products
                .get(&item.product_id)
                .ok_or_else(|| OrderError::ProductNotFound(item.product_id.clone()))?;
            Ok(LineItem::new(
                item.product_id.clone(),
                item.size,
                item.quantity,
                product.price,
            ))
        })
        .collect()
}

/// Computes the order total: Σ line totals + shipping.
pub fn order_total(items: &[LineItem], shipping_cost: Money) -> Money {
    let subtotal: Money = items.iter().map(LineItem::line_total).sum();
    subtotal + shipping_cost
}
