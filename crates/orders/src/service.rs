//! Order lifecycle manager.
//!
//! Orchestrates the pricing engine, the reservation engine, and the order
//! store. Order creation commits to completing either the full reservation
//! or a full rollback before returning; no partial order state is ever
//! observable.

use std::collections::HashMap;

use catalog::CatalogStore;
use common::{AddressId, CustomerId, Money, OrderId, PaymentMethodId, ProductId};
use inventory::{ReservationEngine, RestoreFailure};

use crate::error::OrderError;
use crate::order::Order;
use crate::pricing::{self, DraftItem};
use crate::state::{OrderStatus, PaymentStatus};
use crate::store::{OrderFilter, OrderStore};

/// A proposed order as submitted by a caller.
///
/// Carries no prices: unit prices and the total are always recomputed from
/// the catalog, so a client-supplied amount can never leak into an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub items: Vec<DraftItem>,
    pub shipping_address: AddressId,
    pub payment_method: PaymentMethodId,
    pub shipping_cost: Money,
}

/// Result of a cancellation.
///
/// The order is always `Cancelled` on success; `restore_failures` is
/// non-empty when some stock increments could not be applied and an
/// operator needs to reconcile those variants by hand.
#[derive(Debug, Clone)]
pub struct CancelledOrder {
    pub order: Order,
    pub restore_failures: Vec<RestoreFailure>,
}

/// Service for managing orders.
///
/// The only mutator of variant stock is the reservation engine inside this
/// service, and the only mutator of order records is this service itself.
pub struct OrderService<C: CatalogStore + Clone, O: OrderStore> {
    catalog: C,
    reservations: ReservationEngine<C>,
    store: O,
}

impl<C: CatalogStore + Clone, O: OrderStore> OrderService<C, O> {
    /// Creates a new order service over the given stores.
    pub fn new(catalog: C, store: O) -> Self {
        Self {
            reservations: ReservationEngine::new(catalog.clone()),
            catalog,
            store,
        }
    }

    /// Creates an order: reprice from the catalog, reserve all stock as one
    /// atomic unit, then persist.
    ///
    /// Any failure before persistence leaves stock untouched (reservation
    /// failures roll themselves back); a persistence failure after a
    /// successful reservation restores the reserved stock before the error
    /// is surfaced.
    #[tracing::instrument(skip(self, new_order), fields(customer_id = %new_order.customer_id))]
    pub async fn create_order(&self, new_order: NewOrder) -> Result<Order, OrderError> {
        let start = std::time::Instant::now();

        self.validate(&new_order)?;

        let products = self.load_products(&new_order.items).await?;
        let priced = pricing::price_items(&new_order.items, &products)?;

        let requests: Vec<_> = new_order
            .items
            .iter()
            .map(|item| inventory::StockRequest::new(item.product_id.clone(), item.size, item.quantity))
            .collect();
        let receipt = self.reservations.reserve(&requests).await?;

        let order = Order::new(
            new_order.customer_id,
            priced,
            new_order.shipping_address,
            new_order.payment_method,
            new_order.shipping_cost,
        );

        if let Err(e) = self.store.save(order.clone()).await {
            // Same partial-failure class as a mid-reservation abort, one
            // layer up: the reservation exists but the order does not.
            let report = self.reservations.restore(&receipt.applied).await;
            if !report.is_clean() {
                tracing::error!(
                    order_id = %order.id,
                    failures = report.failures.len(),
                    "rollback after failed order save was itself incomplete"
                );
            }
            return Err(e.into());
        }

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_create_duration_seconds").record(start.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, total = %order.total_price, "order created");

        Ok(order)
    }

    /// Cancels an order, restoring its reserved stock and refunding a paid
    /// payment.
    ///
    /// Restoration is best-effort: the order transitions to `Cancelled`
    /// even when some increments fail, and the failures are reported so the
    /// caller can surface them as a server-side problem.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<CancelledOrder, OrderError> {
        let mut order = self
            .store
            .get(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        if !order.status.can_cancel() {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        let report = self.reservations.restore(&order.stock_requests()).await;

        if order.payment_status == PaymentStatus::Paid {
            order.payment_status = PaymentStatus::Refunded;
        }
        order.status = OrderStatus::Cancelled;
        order.updated_at = chrono::Utc::now();

        self.store.update(order.clone()).await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        if report.is_clean() {
            tracing::info!(order_id = %order.id, restored = report.restored, "order cancelled");
        } else {
            tracing::warn!(
                order_id = %order.id,
                restored = report.restored,
                failures = report.failures.len(),
                "order cancelled with incomplete stock restoration"
            );
        }

        Ok(CancelledOrder {
            order,
            restore_failures: report.failures,
        })
    }

    /// Applies a state-machine-validated status change.
    ///
    /// `Cancelled` is rejected as a target: cancellation restores stock and
    /// touches payment state, so it must go through `cancel_order`.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let mut order = self
            .store
            .get(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        if new_status == OrderStatus::Cancelled || !order.status.can_transition_to(new_status) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }

        order.status = new_status;
        order.updated_at = chrono::Utc::now();
        self.store.update(order.clone()).await?;

        tracing::info!(order_id = %order.id, status = %new_status, "order status updated");
        Ok(order)
    }

    /// Marks a pending payment as paid.
    #[tracing::instrument(skip(self))]
    pub async fn mark_paid(&self, order_id: OrderId) -> Result<Order, OrderError> {
        let mut order = self
            .store
            .get(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        if !order
            .payment_status
            .can_transition_to(PaymentStatus::Paid)
        {
            return Err(OrderError::InvalidPaymentState {
                payment_status: order.payment_status,
                action: "mark paid",
            });
        }

        order.payment_status = PaymentStatus::Paid;
        order.updated_at = chrono::Utc::now();
        self.store.update(order.clone()).await?;

        Ok(order)
    }

    /// Deletes an order record. Permitted only once it is cancelled; the
    /// reservation was already restored at cancellation time, so deletion
    /// has no stock side effects.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), OrderError> {
        let order = self
            .store
            .get(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        if order.status != OrderStatus::Cancelled {
            return Err(OrderError::InvalidState {
                status: order.status,
                action: "delete",
            });
        }

        self.store.delete(order_id).await?;
        Ok(())
    }

    /// Loads an order by ID. Returns None if it doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderError> {
        Ok(self.store.get(order_id).await?)
    }

    /// Lists orders matching the filter.
    #[tracing::instrument(skip(self, filter))]
    pub async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list(filter).await?)
    }

    fn validate(&self, new_order: &NewOrder) -> Result<(), OrderError> {
        if new_order.items.is_empty() {
            return Err(OrderError::NoItems);
        }
        for item in &new_order.items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity { quantity: 0 });
            }
        }
        if new_order.shipping_cost.is_negative() {
            return Err(OrderError::InvalidShippingCost {
                cents: new_order.shipping_cost.cents(),
            });
        }
        Ok(())
    }

    async fn load_products(
        &self,
        items: &[DraftItem],
    ) -> Result<HashMap<ProductId, catalog::Product>, OrderError> {
        let mut products = HashMap::new();
        for item in items {
            if products.contains_key(&item.product_id) {
                continue;
            }
            let product = self
                .catalog
                .get_product(&item.product_id)
                .await?
                .ok_or_else(|| OrderError::ProductNotFound(item.product_id.clone()))?;
            products.insert(item.product_id.clone(), product);
        }
        Ok(products)
    }
}
