use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use crate::order::Order;
use crate::store::{OrderFilter, OrderStore, OrderStoreError, Result};

/// In-memory order store for testing and local runs.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    fail_on_save: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }

    /// Configures the store to fail the next save calls, to exercise the
    /// persistence-failure compensation path.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save(&self, order: Order) -> Result<()> {
        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(OrderStoreError::Database(sqlx::Error::PoolClosed));
        }

        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(OrderStoreError::Duplicate(order.id));
        }
        orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn update(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if !orders.contains_key(&order.id) {
            return Err(OrderStoreError::NotFound(order.id));
        }
        orders.insert(order.id, order);
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.remove(&id).is_none() {
            return Err(OrderStoreError::NotFound(id));
        }
        Ok(())
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<_> = orders
            .values()
            .filter(|o| {
                if let Some(customer_id) = filter.customer_id
                    && o.customer_id != customer_id
                {
                    return false;
                }
                if let Some(status) = filter.status
                    && o.status != status
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}
