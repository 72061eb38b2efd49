//! PostgreSQL-backed commerce stores

use async_trait::async_trait;
use sqlx::PgPool;

use super::{CartStore, CatalogStore, OrderRow, OrderStore, ProductRow, PromotionRow,
    PromotionStore};
use crate::error::AgentError;

/// Order, promotion, catalog and cart access over one connection pool.
#[derive(Clone)]
pub struct PostgresStores {
    pool: PgPool,
}

impl PostgresStores {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PostgresStores {
    async fn list_recent(
        &self,
        customer_id: i64,
        limit: i64,
    ) -> Result<Vec<OrderRow>, AgentError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"SELECT id, total_amount::float8 AS total_amount, order_status, payment_status,
                      created_at
               FROM orders
               WHERE customer_id = $1
               ORDER BY created_at DESC
               LIMIT $2"#,
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl PromotionStore for PostgresStores {
    async fn list_active(&self) -> Result<Vec<PromotionRow>, AgentError> {
        let rows = sqlx::query_as::<_, PromotionRow>(
            r#"SELECT code, description, discount_type, discount_value::float8 AS discount_value
               FROM promotions
               WHERE start_date <= NOW() AND end_date >= NOW()"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl CatalogStore for PostgresStores {
    async fn search(&self, text: &str, limit: i64) -> Result<Vec<ProductRow>, AgentError> {
        let pattern = format!("%{}%", text);
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"SELECT id, name, brand, price::float8 AS price, processor_name, processor_brand,
                      ram, ssd, hdd, display_type, display_inches::float8 AS display_inches
               FROM laptops
               WHERE name ILIKE $1 OR processor_name ILIKE $1
               ORDER BY id DESC
               LIMIT $2"#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl CartStore for PostgresStores {
    async fn add_item(
        &self,
        customer_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<(), AgentError> {
        sqlx::query(
            r#"INSERT INTO cart_items (customer_id, product_id, quantity)
               VALUES ($1, $2, $3)
               ON CONFLICT (customer_id, product_id)
               DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity"#,
        )
        .bind(customer_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
