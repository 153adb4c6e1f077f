use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AddressId, CustomerId, Money, OrderId, PaymentMethodId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::order::{LineItem, Order};
use crate::state::{OrderStatus, PaymentStatus};
use crate::store::{OrderFilter, OrderStore, OrderStoreError, Result};

/// PostgreSQL-backed order store.
///
/// Line items are stored as a jsonb column; the order row is the unit of
/// persistence, so an order is never half-written.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let items_json: serde_json::Value = row.try_get("items")?;
        let items: Vec<LineItem> = serde_json::from_value(items_json)?;

        let status: OrderStatus = row
            .try_get::<String, _>("status")?
            .parse()
            .map_err(|e| OrderStoreError::Database(sqlx::Error::Decode(Box::new(e))))?;
        let payment_status: PaymentStatus = row
            .try_get::<String, _>("payment_status")?
            .parse()
            .map_err(|e| OrderStoreError::Database(sqlx::Error::Decode(Box::new(e))))?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            items,
            shipping_address: AddressId::from_uuid(row.try_get::<Uuid, _>("shipping_address")?),
            payment_method: PaymentMethodId::from_uuid(row.try_get::<Uuid, _>("payment_method")?),
            shipping_cost: Money::from_cents(row.try_get("shipping_cost_cents")?),
            total_price: Money::from_cents(row.try_get("total_cents")?),
            status,
            payment_status,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}

const ORDER_COLUMNS: &str = "id, customer_id, items, shipping_address, payment_method, \
     shipping_cost_cents, total_cents, status, payment_status, created_at, updated_at";

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn save(&self, order: Order) -> Result<()> {
        let items_json = serde_json::to_value(&order.items)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, items, shipping_address, payment_method,
                                shipping_cost_cents, total_cents, status, payment_status,
                                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(items_json)
        .bind(order.shipping_address.as_uuid())
        .bind(order.payment_method.as_uuid())
        .bind(order.shipping_cost.cents())
        .bind(order.total_price.cents())
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return OrderStoreError::Duplicate(order.id);
            }
            OrderStoreError::Database(e)
        })?;

        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn update(&self, order: Order) -> Result<()> {
        let items_json = serde_json::to_value(&order.items)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET items = $2, shipping_cost_cents = $3, total_cents = $4,
                status = $5, payment_status = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(items_json)
        .bind(order.shipping_cost.cents())
        .bind(order.total_price.cents())
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(OrderStoreError::NotFound(order.id));
        }
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> Result<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(OrderStoreError::NotFound(id));
        }
        Ok(())
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let mut builder = sqlx::QueryBuilder::new(format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE TRUE"
        ));

        if let Some(customer_id) = filter.customer_id {
            builder.push(" AND customer_id = ");
            builder.push_bind(customer_id.as_uuid());
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status.as_str());
        }
        builder.push(" ORDER BY created_at DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_order).collect()
    }
}
