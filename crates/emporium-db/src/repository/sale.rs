//! # Sale Repository
//!
//! Persistence and lookup for immutable sale records.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       One Sale, One Transaction                         │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    INSERT INTO sales      (id, total, created_at)                      │
//! │    INSERT INTO sale_items (sale_id, 0, A, ...)                         │
//! │    INSERT INTO sale_items (sale_id, 1, B, ...)                         │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Readers see either no sale or the whole sale. Triggers reject any     │
//! │  later UPDATE or DELETE on both tables.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DbError, DbResult};
use emporium_core::{AggregationWindow, Money, Sale, SaleItem};

#[derive(sqlx::FromRow)]
struct SaleRow {
    id: String,
    total: Money,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SaleItemRow {
    sale_id: String,
    product_code: String,
    product_name: String,
    quantity: i64,
    unit_price: Money,
    unit_cost: Money,
    line_total: Money,
}

impl From<SaleItemRow> for SaleItem {
    fn from(row: SaleItemRow) -> Self {
        SaleItem {
            product_code: row.product_code,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            unit_cost: row.unit_cost,
            line_total: row.line_total,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Writes the sale and all of its items in one transaction.
    ///
    /// ## Errors
    /// * `UniqueViolation` - a sale with this id is already stored
    /// * anything else - nothing was written
    pub async fn insert(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, items = sale.items.len(), total = %sale.total, "Inserting sale");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let inserted = sqlx::query("INSERT INTO sales (id, total, created_at) VALUES (?1, ?2, ?3)")
            .bind(&sale.id)
            .bind(sale.total)
            .bind(sale.created_at)
            .execute(&mut *tx)
            .await;

        if let Err(e) = inserted {
            return Err(match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("sale id", &sale.id),
                other => other,
            });
        }

        for (position, item) in sale.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    sale_id, position, product_code, product_name,
                    quantity, unit_price, unit_cost, line_total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&sale.id)
            .bind(position as i64)
            .bind(&item.product_code)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.unit_cost)
            .bind(item.line_total)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Gets a sale with its items.
    pub async fn get(&self, id: &str) -> DbResult<Sale> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, SaleRow>(
            "SELECT id, total, created_at FROM sales WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))?;

        let items = sqlx::query_as::<_, SaleItemRow>(
            r#"
            SELECT sale_id, product_code, product_name, quantity,
                   unit_price, unit_cost, line_total
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        assemble(vec![row], items)
            .pop()
            .ok_or_else(|| DbError::not_found("Sale", id))
    }

    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Sales created inside `window`, newest first.
    pub async fn list(&self, window: &AggregationWindow) -> DbResult<Vec<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_in_window(&mut conn, window).await
    }

    /// The `limit` most recent sales, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, total, created_at
            FROM sales
            ORDER BY created_at DESC, id
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;

        let items = sqlx::query_as::<_, SaleItemRow>(
            r#"
            SELECT i.sale_id, i.product_code, i.product_name, i.quantity,
                   i.unit_price, i.unit_cost, i.line_total
            FROM sale_items i
            WHERE i.sale_id IN (
                SELECT id FROM sales ORDER BY created_at DESC, id LIMIT ?1
            )
            ORDER BY i.sale_id, i.position
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;

        Ok(assemble(rows, items))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Sales in `window` with their items, newest first.
///
/// Two indexed range scans on `sales.created_at`; no full-history scan.
pub(crate) async fn fetch_in_window(
    conn: &mut SqliteConnection,
    window: &AggregationWindow,
) -> DbResult<Vec<Sale>> {
    let rows = sqlx::query_as::<_, SaleRow>(
        r#"
        SELECT id, total, created_at
        FROM sales
        WHERE created_at >= ?1 AND created_at < ?2
        ORDER BY created_at DESC, id
        "#,
    )
    .bind(window.start)
    .bind(window.end)
    .fetch_all(&mut *conn)
    .await?;

    let items = sqlx::query_as::<_, SaleItemRow>(
        r#"
        SELECT i.sale_id, i.product_code, i.product_name, i.quantity,
               i.unit_price, i.unit_cost, i.line_total
        FROM sale_items i
        JOIN sales s ON s.id = i.sale_id
        WHERE s.created_at >= ?1 AND s.created_at < ?2
        ORDER BY i.sale_id, i.position
        "#,
    )
    .bind(window.start)
    .bind(window.end)
    .fetch_all(&mut *conn)
    .await?;

    debug!(sales = rows.len(), items = items.len(), window = %window, "Loaded sales");
    Ok(assemble(rows, items))
}

/// Joins item rows onto their sales, keeping the order of `rows`.
fn assemble(rows: Vec<SaleRow>, items: Vec<SaleItemRow>) -> Vec<Sale> {
    let mut items_by_sale: HashMap<String, Vec<SaleItem>> = HashMap::new();
    for item in items {
        items_by_sale
            .entry(item.sale_id.clone())
            .or_default()
            .push(item.into());
    }

    rows.into_iter()
        .map(|row| Sale {
            items: items_by_sale.remove(&row.id).unwrap_or_default(),
            id: row.id,
            total: row.total,
            created_at: row.created_at,
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use emporium_core::WindowPreset;

    async fn setup() -> (Database, SaleRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sales = db.sales();
        (db, sales)
    }

    fn sale(id: &str, at: DateTime<Utc>, lines: &[(&str, i64, i64)]) -> Sale {
        let items = lines
            .iter()
            .map(|(code, qty, price)| {
                let (price, cost) = (Money::from_cents(*price), Money::from_cents(price / 2));
                SaleItem::new(*code, format!("Product {code}"), *qty, price, cost).unwrap()
            })
            .collect();
        Sale::from_items(id, items, at).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let (_db, repo) = setup().await;
        let original = sale("s1", Utc::now(), &[("B", 1, 700), ("A", 2, 300)]);

        repo.insert(&original).await.unwrap();
        let loaded = repo.get("s1").await.unwrap();

        assert_eq!(loaded.id, original.id);
        assert_eq!(loaded.total.cents(), 1300);
        assert_eq!(loaded.items, original.items);
        assert_eq!(loaded.items[0].product_code, "B");
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let (_db, repo) = setup().await;
        assert!(matches!(repo.get("nope").await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_id_is_unique_violation() {
        let (_db, repo) = setup().await;
        let s = sale("s1", Utc::now(), &[("A", 1, 100)]);

        repo.insert(&s).await.unwrap();
        let err = repo.insert(&s).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sales_are_immutable() {
        let (db, repo) = setup().await;
        repo.insert(&sale("s1", Utc::now(), &[("A", 1, 100)])).await.unwrap();

        let update = sqlx::query("UPDATE sales SET total = 0 WHERE id = 's1'")
            .execute(db.pool())
            .await;
        assert!(update.is_err());

        let delete = sqlx::query("DELETE FROM sale_items WHERE sale_id = 's1'")
            .execute(db.pool())
            .await;
        assert!(delete.is_err());

        assert_eq!(repo.get("s1").await.unwrap().total.cents(), 100);
    }

    #[tokio::test]
    async fn test_list_filters_by_window_newest_first() {
        let (_db, repo) = setup().await;
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 14, 0, 0).unwrap();

        repo.insert(&sale("old", now - Duration::days(1), &[("A", 1, 100)])).await.unwrap();
        repo.insert(&sale("morning", now - Duration::hours(5), &[("A", 1, 100)])).await.unwrap();
        repo.insert(&sale("noon", now - Duration::hours(2), &[("B", 2, 100)])).await.unwrap();

        let today = WindowPreset::Today.resolve(now);
        let ids: Vec<String> = repo.list(&today).await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["noon", "morning"]);
    }

    #[tokio::test]
    async fn test_window_boundaries_are_half_open() {
        let (_db, repo) = setup().await;
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 14, 0, 0).unwrap();
        let today = WindowPreset::Today.resolve(now);

        repo.insert(&sale("at-start", today.start, &[("A", 1, 100)])).await.unwrap();
        repo.insert(&sale("at-end", today.end, &[("A", 1, 100)])).await.unwrap();
        repo.insert(
            &sale("just-before-end", today.end - Duration::milliseconds(1), &[("A", 1, 100)]),
        )
        .await
        .unwrap();

        let mut ids: Vec<String> = repo.list(&today).await.unwrap().into_iter().map(|s| s.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["at-start", "just-before-end"]);
    }

    #[tokio::test]
    async fn test_recent_limits_results() {
        let (_db, repo) = setup().await;
        let now = Utc::now();
        for i in 0..7 {
            repo.insert(&sale(&format!("s{i}"), now - Duration::minutes(i), &[("A", 1, 100)]))
                .await
                .unwrap();
        }

        let recent = repo.recent(5).await.unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].id, "s0");
        assert!(recent.iter().all(|s| s.items.len() == 1));
    }
}
