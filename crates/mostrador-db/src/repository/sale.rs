//! # Sale Repository
//!
//! Database operations for sales and sale line items, including the one
//! correctness-critical operation in the system: atomic sale creation.
//!
//! ## Sale Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     create_sale(items)                                  │
//! │                                                                         │
//! │  BEGIN TRANSACTION                                                     │
//! │     │                                                                   │
//! │     ├── 1. Derive next sale number (max suffix scan + 1)               │
//! │     ├── 2. Insert sale header (sale_number, total_items)               │
//! │     ├── 3. For each item, in input order:                              │
//! │     │      a. Fetch product (name, category, stock)                    │
//! │     │         └── missing? → ProductNotFound, ROLLBACK                 │
//! │     │      b. stock < quantity? → InsufficientStock, ROLLBACK          │
//! │     │      c. Insert line item (snapshots + price math in cents)       │
//! │     │      d. Guarded stock decrement                                  │
//! │     │         └── 0 rows? → Conflict, ROLLBACK                         │
//! │     │                                                                   │
//! │  COMMIT ── only point where anything becomes visible                   │
//! │     │                                                                   │
//! │     └── Re-read sale + items for the caller                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping the transaction on any error path rolls everything back; there
//! is no partially-created sale and no partially-decremented stock.
//!
//! ## Concurrency
//! Two racing sales can both pass the in-transaction stock check before
//! either commits. Two backstops make that harmless:
//! - the decrement is guarded (`AND quantity >= ?`), so the loser updates
//!   zero rows and gets a retryable [`DbError::Conflict`]
//! - `sale_number` is UNIQUE, so a sequence race surfaces as
//!   [`DbError::UniqueViolation`] instead of a duplicate code
//!
//! Retry policy belongs to the caller; nothing here retries internally.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult, SaleError, SaleResult};
use mostrador_core::types::{format_sale_number, total_items};
use mostrador_core::validation::validate_sale_items;
use mostrador_core::{
    CoreError, NewSaleItem, Sale, SaleFilter, SaleLineItem, SalePage, SaleSummary, SaleWithItems,
    SALE_NUMBER_PREFIX,
};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Creates a sale atomically: header, line items, and stock decrements
    /// commit together or not at all.
    ///
    /// ## Arguments
    /// * `items` - Requested line items, processed in the given order. An
    ///   earlier item's decrement is visible to a later item's stock check,
    ///   so a product listed twice is checked against its already-reduced
    ///   quantity.
    ///
    /// ## Returns
    /// The committed sale with its line items, re-read after commit.
    ///
    /// ## Errors
    /// * [`CoreError::Validation`] - empty or malformed item list
    /// * [`CoreError::ProductNotFound`] - a referenced product doesn't exist
    /// * [`CoreError::InsufficientStock`] - requested more than available
    /// * [`DbError::Conflict`] / [`DbError::UniqueViolation`] - lost a race
    ///   with a concurrent sale; retryable
    pub async fn create_sale(&self, items: &[NewSaleItem]) -> SaleResult<SaleWithItems> {
        // The HTTP layer validates first; re-checking here keeps the
        // invariant independent of any particular caller.
        validate_sale_items(items).map_err(CoreError::from)?;

        let now = Utc::now();
        let requested_total = total_items(items);

        debug!(items = items.len(), total = requested_total, "Creating sale");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let seq = next_sale_sequence(&mut tx).await?;
        let sale_number = format_sale_number(seq);

        let header = sqlx::query(
            r#"
            INSERT INTO sales (sale_number, total_items, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&sale_number)
        .bind(requested_total)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let sale_id = header.last_insert_rowid();

        for item in items {
            let product: Option<(String, String, i64)> = sqlx::query_as(
                r#"
                SELECT name, category, quantity
                FROM products
                WHERE id = ?1
                "#,
            )
            .bind(&item.product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DbError::from)?;

            let (name, category, available) = product
                .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;

            if available < item.quantity {
                return Err(CoreError::InsufficientStock {
                    name,
                    available,
                    requested: item.quantity,
                }
                .into());
            }

            let line_total = item.unit_price.multiply_quantity(item.quantity);

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    sale_id, product_id, product_name, category,
                    quantity, unit_price_cents, total_price_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(sale_id)
            .bind(&item.product_id)
            .bind(&name)
            .bind(&category)
            .bind(item.quantity)
            .bind(item.unit_price.cents())
            .bind(line_total.cents())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

            // The guard re-states the check above in SQL so a concurrent
            // committed sale can never push the counter below zero.
            let decrement = sqlx::query(
                r#"
                UPDATE products
                SET quantity = quantity - ?2, updated_at = ?3
                WHERE id = ?1 AND quantity >= ?2
                "#,
            )
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

            if decrement.rows_affected() == 0 {
                return Err(DbError::Conflict(format!(
                    "stock for {} changed during sale",
                    item.product_id
                ))
                .into());
            }
        }

        tx.commit().await.map_err(DbError::from)?;

        debug!(sale_id, sale_number = %sale_number, "Sale committed");

        // Re-read for caller convenience: the committed state, not what we
        // think we wrote.
        self.get_by_id(sale_id)
            .await?
            .ok_or_else(|| SaleError::Db(DbError::not_found("Sale", sale_id.to_string())))
    }

    /// Gets a sale with its line items.
    ///
    /// ## Returns
    /// * `Ok(Some(SaleWithItems))` - Sale found
    /// * `Ok(None)` - Sale not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<SaleWithItems>> {
        let sale: Option<Sale> = sqlx::query_as(
            r#"
            SELECT id, sale_number, total_items, created_at, updated_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(sale) = sale else {
            return Ok(None);
        };

        let items: Vec<SaleLineItem> = sqlx::query_as(
            r#"
            SELECT
                id, sale_id, product_id, product_name, category,
                quantity, unit_price_cents, total_price_cents, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Lists sales, newest first, with pagination and filters.
    ///
    /// ## Filters
    /// - `search`: substring match on the sale number
    /// - `start_date` / `end_date`: inclusive bounds on creation time
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<SalePage> {
        let limit = i64::from(filter.limit.max(1));
        let page = filter.page.max(1);
        let offset = (i64::from(page) - 1) * limit;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM sales s
            WHERE (?1 IS NULL OR s.sale_number LIKE '%' || ?1 || '%')
              AND (?2 IS NULL OR s.created_at >= ?2)
              AND (?3 IS NULL OR s.created_at <= ?3)
            "#,
        )
        .bind(&filter.search)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(&self.pool)
        .await?;

        let sales: Vec<SaleSummary> = sqlx::query_as(
            r#"
            SELECT
                s.id,
                s.sale_number,
                s.total_items,
                COUNT(si.id) AS items_count,
                COALESCE(SUM(si.total_price_cents), 0) AS total_amount_cents,
                s.created_at
            FROM sales s
            LEFT JOIN sale_items si ON si.sale_id = s.id
            WHERE (?1 IS NULL OR s.sale_number LIKE '%' || ?1 || '%')
              AND (?2 IS NULL OR s.created_at >= ?2)
              AND (?3 IS NULL OR s.created_at <= ?3)
            GROUP BY s.id
            ORDER BY s.created_at DESC, s.id DESC
            LIMIT ?4 OFFSET ?5
            "#,
        )
        .bind(&filter.search)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total_pages = ((total + limit - 1) / limit).max(0) as u32;

        Ok(SalePage {
            sales,
            total,
            page,
            total_pages,
        })
    }
}

/// Derives the next sale sequence value inside the given transaction.
///
/// Scans existing codes for the maximum numeric suffix and adds one. The
/// scan happens in the same transaction that inserts the header, and the
/// UNIQUE constraint on `sale_number` catches any race the transaction
/// scope doesn't.
async fn next_sale_sequence(tx: &mut Transaction<'_, Sqlite>) -> DbResult<i64> {
    // substr() is 1-based; skip the prefix, CAST the rest. Codes that don't
    // parse cast to 0 and drop out of the max.
    let suffix_start = (SALE_NUMBER_PREFIX.len() + 1) as i64;

    let max: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(MAX(CAST(substr(sale_number, ?1) AS INTEGER)), 0)
        FROM sales
        "#,
    )
    .bind(suffix_start)
    .fetch_one(&mut **tx)
    .await?;

    Ok(max + 1)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use mostrador_core::{Money, Product};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, id: &str, name: &str, category: &str, quantity: i64) {
        let now = Utc::now();
        db.products()
            .insert(&Product {
                id: id.to_string(),
                name: name.to_string(),
                category: category.to_string(),
                quantity,
                unit_cost_cents: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    fn item(product_id: &str, quantity: i64, unit_price_cents: i64) -> NewSaleItem {
        NewSaleItem {
            product_id: product_id.to_string(),
            quantity,
            unit_price: Money::from_cents(unit_price_cents),
        }
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().quantity
    }

    async fn sale_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    async fn line_item_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_happy_path_sale() {
        let db = test_db().await;
        seed_product(&db, "P1", "Filter", "Filtros", 10).await;

        let sale = db
            .sales()
            .create_sale(&[item("P1", 3, 2500)])
            .await
            .unwrap();

        assert_eq!(sale.sale.sale_number, "VENT-000001");
        assert_eq!(sale.sale.total_items, 3);
        assert_eq!(sale.items.len(), 1);

        let line = &sale.items[0];
        assert_eq!(line.product_id, "P1");
        assert_eq!(line.product_name, "Filter");
        assert_eq!(line.category, "Filtros");
        assert_eq!(line.quantity, 3);
        assert_eq!(line.unit_price_cents, 2500);
        assert_eq!(line.total_price_cents, 7500);

        assert_eq!(stock_of(&db, "P1").await, 7);
    }

    #[tokio::test]
    async fn test_missing_product_aborts_everything() {
        let db = test_db().await;

        let err = db
            .sales()
            .create_sale(&[item("DOES-NOT-EXIST", 1, 0)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SaleError::Core(CoreError::ProductNotFound(ref id)) if id == "DOES-NOT-EXIST"
        ));
        assert_eq!(sale_count(&db).await, 0);
        assert_eq!(line_item_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_zero_stock_product_cannot_be_sold() {
        let db = test_db().await;
        seed_product(&db, "P2", "Bujía", "Encendido", 0).await;

        let err = db.sales().create_sale(&[item("P2", 1, 500)]).await.unwrap_err();

        match err {
            SaleError::Core(CoreError::InsufficientStock {
                name,
                available,
                requested,
            }) => {
                assert_eq!(name, "Bujía");
                assert_eq!(available, 0);
                assert_eq!(requested, 1);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(sale_count(&db).await, 0);
        assert_eq!(stock_of(&db, "P2").await, 0);
    }

    #[tokio::test]
    async fn test_mixed_outcome_rolls_back_earlier_items() {
        let db = test_db().await;
        seed_product(&db, "P3", "Pastilla de freno", "Frenos", 5).await;
        seed_product(&db, "P4", "Amortiguador", "Suspensión", 0).await;

        let err = db
            .sales()
            .create_sale(&[item("P3", 2, 1500), item("P4", 1, 9000)])
            .await
            .unwrap_err();

        match err {
            SaleError::Core(CoreError::InsufficientStock { name, .. }) => {
                assert_eq!(name, "Amortiguador");
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // P3 was processed first but its decrement must not survive
        assert_eq!(stock_of(&db, "P3").await, 5);
        assert_eq!(sale_count(&db).await, 0);
        assert_eq!(line_item_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_stock_decrement_sequence() {
        let db = test_db().await;
        seed_product(&db, "P5", "Correa", "Transmisión", 10).await;

        db.sales().create_sale(&[item("P5", 4, 800)]).await.unwrap();
        assert_eq!(stock_of(&db, "P5").await, 6);

        let err = db.sales().create_sale(&[item("P5", 7, 800)]).await.unwrap_err();
        match err {
            SaleError::Core(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 6);
                assert_eq!(requested, 7);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(stock_of(&db, "P5").await, 6);
    }

    #[tokio::test]
    async fn test_same_product_twice_sees_earlier_decrement() {
        let db = test_db().await;
        seed_product(&db, "P6", "Filtro de aire", "Filtros", 5).await;

        // 3 + 3 exceeds 5 even though each line alone fits
        let err = db
            .sales()
            .create_sale(&[item("P6", 3, 1000), item("P6", 3, 1000)])
            .await
            .unwrap_err();

        match err {
            SaleError::Core(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(stock_of(&db, "P6").await, 5);

        // 3 + 2 fits exactly
        let sale = db
            .sales()
            .create_sale(&[item("P6", 3, 1000), item("P6", 2, 1000)])
            .await
            .unwrap();
        assert_eq!(sale.sale.total_items, 5);
        assert_eq!(stock_of(&db, "P6").await, 0);
    }

    #[tokio::test]
    async fn test_sale_numbers_are_unique_and_increasing() {
        let db = test_db().await;
        seed_product(&db, "P7", "Radiador", "Refrigeración", 100).await;

        let mut numbers = Vec::new();
        for _ in 0..3 {
            let sale = db.sales().create_sale(&[item("P7", 1, 0)]).await.unwrap();
            numbers.push(sale.sale.sale_number);
        }

        assert_eq!(numbers, vec!["VENT-000001", "VENT-000002", "VENT-000003"]);
    }

    #[tokio::test]
    async fn test_header_and_line_totals_are_consistent() {
        let db = test_db().await;
        seed_product(&db, "P8", "Bombilla", "Eléctrico", 50).await;
        seed_product(&db, "P9", "Fusible", "Eléctrico", 50).await;

        let sale = db
            .sales()
            .create_sale(&[item("P8", 3, 250), item("P9", 7, 99)])
            .await
            .unwrap();

        let item_sum: i64 = sale.items.iter().map(|i| i.quantity).sum();
        assert_eq!(sale.sale.total_items, item_sum);

        for line in &sale.items {
            assert_eq!(line.total_price_cents, line.unit_price_cents * line.quantity);
        }
    }

    #[tokio::test]
    async fn test_omitted_price_defaults_to_zero() {
        let db = test_db().await;
        seed_product(&db, "P10", "Abrazadera", "Ferretería", 10).await;

        // The DTO layer maps an omitted unit_price to Money::zero()
        let sale = db.sales().create_sale(&[item("P10", 2, 0)]).await.unwrap();

        assert_eq!(sale.items[0].unit_price_cents, 0);
        assert_eq!(sale.items[0].total_price_cents, 0);
    }

    #[tokio::test]
    async fn test_empty_items_rejected_before_any_write() {
        let db = test_db().await;

        let err = db.sales().create_sale(&[]).await.unwrap_err();
        assert!(matches!(
            err,
            SaleError::Core(CoreError::Validation(_))
        ));
        assert_eq!(sale_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let db = test_db().await;
        seed_product(&db, "P11", "Manguera", "Refrigeración", 4).await;

        let created = db.sales().create_sale(&[item("P11", 2, 1200)]).await.unwrap();

        let fetched = db
            .sales()
            .get_by_id(created.sale.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.sale.sale_number, created.sale.sale_number);
        assert_eq!(fetched.items.len(), 1);

        assert!(db.sales().get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_pagination_and_search() {
        let db = test_db().await;
        seed_product(&db, "P12", "Tornillo", "Ferretería", 100).await;

        for _ in 0..5 {
            db.sales().create_sale(&[item("P12", 1, 100)]).await.unwrap();
        }

        let page = db
            .sales()
            .list(&SaleFilter {
                limit: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.sales.len(), 2);
        // Newest first
        assert_eq!(page.sales[0].sale_number, "VENT-000005");
        assert_eq!(page.sales[0].items_count, 1);
        assert_eq!(page.sales[0].total_amount_cents, 100);

        let last_page = db
            .sales()
            .list(&SaleFilter {
                limit: 2,
                page: 3,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(last_page.sales.len(), 1);

        let searched = db
            .sales()
            .list(&SaleFilter {
                search: Some("000003".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.total, 1);
        assert_eq!(searched.sales[0].sale_number, "VENT-000003");
    }

    #[tokio::test]
    async fn test_list_empty_database() {
        let db = test_db().await;

        let page = db.sales().list(&SaleFilter::default()).await.unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.sales.is_empty());
    }
}
