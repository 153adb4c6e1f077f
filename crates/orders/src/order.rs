//! The order record.

use chrono::{DateTime, Utc};
use common::{AddressId, CustomerId, Money, OrderId, PaymentMethodId, ProductId, Size};
use inventory::StockRequest;
use serde::{Deserialize, Serialize};

use crate::pricing;
use crate::state::{OrderStatus, PaymentStatus};

/// One line of an order.
///
/// `unit_price` is always server-computed from the catalog at creation
/// time; the line logically holds the stock reservation for exactly one
/// (product, size) variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub size: Size,
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(
        product_id: impl Into<ProductId>,
        size: Size,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            size,
            quantity,
            unit_price,
        }
    }

    /// Returns quantity × unit price.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A persisted order.
///
/// An order either exists fully formed or not at all; it is created only
/// after its whole stock reservation succeeded, and its line items are the
/// record from which a cancellation re-derives the stock to restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub items: Vec<LineItem>,
    pub shipping_address: AddressId,
    pub payment_method: PaymentMethodId,
    pub shipping_cost: Money,
    pub total_price: Money,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new pending order, computing the total from the priced
    /// line items and shipping cost.
    pub fn new(
        customer_id: CustomerId,
        items: Vec<LineItem>,
        shipping_address: AddressId,
        payment_method: PaymentMethodId,
        shipping_cost: Money,
    ) -> Self {
        let now = Utc::now();
        let total_price = pricing::order_total(&items, shipping_cost);
        Self {
            id: OrderId::new(),
            customer_id,
            items,
            shipping_address,
            payment_method,
            shipping_cost,
            total_price,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the sum of line totals, without shipping.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Returns the stock deltas this order's reservation holds, in line
    /// order. Cancellation feeds these to the restore pass.
    pub fn stock_requests(&self) -> Vec<StockRequest> {
        self.items
            .iter()
            .map(|item| StockRequest::new(item.product_id.clone(), item.size, item.quantity))
            .collect()
    }

    /// Returns the total quantity across all line items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        Order::new(
            CustomerId::new(),
            vec![
                LineItem::new("SKU-TEE", Size::M, 2, Money::from_cents(15000)),
                LineItem::new("SKU-HOODIE", Size::L, 1, Money::from_cents(4500)),
            ],
            AddressId::from_uuid(uuid::Uuid::new_v4()),
            PaymentMethodId::from_uuid(uuid::Uuid::new_v4()),
            Money::from_cents(5000),
        )
    }

    #[test]
    fn total_is_line_totals_plus_shipping() {
        let order = sample_order();
        assert_eq!(order.subtotal().cents(), 34500);
        assert_eq!(order.total_price.cents(), 39500);
        // The stored total is exactly the pricing formula over the stored
        // line items.
        assert_eq!(
            order.total_price,
            pricing::order_total(&order.items, order.shipping_cost)
        );
    }

    #[test]
    fn new_order_starts_pending() {
        let order = sample_order();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn stock_requests_mirror_line_items() {
        let order = sample_order();
        let requests = order.stock_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].product_id, ProductId::new("SKU-TEE"));
        assert_eq!(requests[0].size, Size::M);
        assert_eq!(requests[0].quantity, 2);
    }

    #[test]
    fn line_total() {
        let item = LineItem::new("SKU-TEE", Size::S, 3, Money::from_cents(1000));
        assert_eq!(item.line_total().cents(), 3000);
    }

    #[test]
    fn serialization_roundtrip() {
        let order = sample_order();
        let json = serde_json::to_string(&order).unwrap();
        let parsed: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, parsed);
    }
}
