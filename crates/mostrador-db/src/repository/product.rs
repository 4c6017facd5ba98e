//! # Product Repository
//!
//! Database operations for products.
//!
//! The sale transaction reads and decrements stock through its own
//! transaction scope (see [`crate::repository::sale`]); this repository
//! covers the pool-level lookups and inserts used by seeding and tests.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use mostrador_core::Product;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product: Option<Product> = sqlx::query_as(
            r#"
            SELECT
                id,
                name,
                category,
                quantity,
                unit_cost_cents,
                created_at,
                updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - id already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, quantity, unit_cost_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.quantity)
        .bind(product.unit_cost_cents)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Restocks a product (positive delta only; sales decrement through
    /// their own transaction).
    pub async fn restock(&self, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Restocking product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sample_product(id: &str, quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: "Filtro de aceite".to_string(),
            category: "Filtros".to_string(),
            quantity,
            unit_cost_cents: Some(1200),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&sample_product("REP-000001", 10)).await.unwrap();

        let found = repo.get_by_id("REP-000001").await.unwrap().unwrap();
        assert_eq!(found.name, "Filtro de aceite");
        assert_eq!(found.quantity, 10);

        assert!(repo.get_by_id("REP-999999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&sample_product("REP-000001", 10)).await.unwrap();
        let err = repo.insert(&sample_product("REP-000001", 3)).await;

        assert!(matches!(err, Err(DbError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn test_restock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&sample_product("REP-000001", 2)).await.unwrap();
        repo.restock("REP-000001", 5).await.unwrap();

        let found = repo.get_by_id("REP-000001").await.unwrap().unwrap();
        assert_eq!(found.quantity, 7);

        assert!(matches!(
            repo.restock("REP-404404", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_count() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        assert_eq!(repo.count().await.unwrap(), 0);
        repo.insert(&sample_product("REP-000001", 1)).await.unwrap();
        repo.insert(&sample_product("REP-000002", 1)).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);
    }
}
