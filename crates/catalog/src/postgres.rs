use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, ProductId, Size};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    CatalogError, Product, Result,
    store::{CatalogStore, StockAdjustment},
};

/// PostgreSQL-backed catalog store.
///
/// The conditional stock adjustment is a single `UPDATE ... WHERE stock +
/// delta >= 0`, so the compare and the write happen atomically inside the
/// row-level lock PostgreSQL takes for the statement.
#[derive(Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    /// Creates a new PostgreSQL catalog store.
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

    fn row_to_product(row: &PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            variants: BTreeMap::new(),
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    fn parse_size(raw: &str) -> Result<Size> {
        raw.parse::<Size>()
            .map_err(|e| CatalogError::Database(sqlx::Error::Decode(Box::new(e))))
    }

    async fn load_variants(&self, product_id: &ProductId) -> Result<BTreeMap<Size, u32>> {
        let rows = sqlx::query(
            "SELECT size, stock FROM product_variants WHERE product_id = $1 ORDER BY size",
        )
        .bind(product_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut variants = BTreeMap::new();
        for row in rows {
            let size = Self::parse_size(row.try_get::<String, _>("size")?.as_str())?;
            let stock: i64 = row.try_get("stock")?;
            variants.insert(size, stock.max(0) as u32);
        }
        Ok(variants)
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, description, price_cents, created_at FROM products WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut product = Self::row_to_product(&row)?;
        product.variants = self.load_variants(id).await?;
        Ok(Some(product))
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return CatalogError::AlreadyExists(product.id.clone());
            }
            CatalogError::Database(e)
        })?;

        for (size, stock) in &product.variants {
            sqlx::query(
                r#"
                INSERT INTO product_variants (product_id, size, stock)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(product.id.as_str())
            .bind(size.as_str())
            .bind(*stock as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, name, description, price_cents, created_at FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut products = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut product = Self::row_to_product(row)?;
            product.variants = self.load_variants(&product.id).await?;
            products.push(product);
        }
        Ok(products)
    }

    async fn adjust_stock(
        &self,
        product_id: &ProductId,
        size: Size,
        delta: i64,
    ) -> Result<StockAdjustment> {
        let updated = sqlx::query(
            r#"
            UPDATE product_variants
            SET stock = stock + $3
            WHERE product_id = $1 AND size = $2 AND stock + $3 >= 0
            RETURNING stock
            "#,
        )
        .bind(product_id.as_str())
        .bind(size.as_str())
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            let remaining: i64 = row.try_get("stock")?;
            return Ok(StockAdjustment::Applied {
                remaining: remaining.max(0) as u32,
            });
        }

        // Zero rows: either the condition failed or the variant is missing.
        let current =
            sqlx::query("SELECT stock FROM product_variants WHERE product_id = $1 AND size = $2")
                .bind(product_id.as_str())
                .bind(size.as_str())
                .fetch_optional(&self.pool)
                .await?;

        match current {
            Some(row) => {
                let available: i64 = row.try_get("stock")?;
                Ok(StockAdjustment::Insufficient {
                    available: available.max(0) as u32,
                })
            }
            None => {
                let product_exists =
                    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                        .bind(product_id.as_str())
                        .fetch_one(&self.pool)
                        .await?;

                if product_exists {
                    Err(CatalogError::VariantNotFound {
                        product_id: product_id.clone(),
                        size,
                    })
                } else {
                    Err(CatalogError::ProductNotFound(product_id.clone()))
                }
            }
        }
    }
}
