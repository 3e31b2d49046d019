//! # Product Store
//!
//! Product records and the only code paths that move stock.
//!
//! ## Conditional Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 How Overselling Is Prevented                            │
//! │                                                                         │
//! │  ❌ WRONG: read, check in Rust, write                                   │
//! │     SELECT quantity_on_hand ... → 1                                     │
//! │     (another checkout sells the last unit here)                         │
//! │     UPDATE products SET quantity_on_hand = 0      → sold twice          │
//! │                                                                         │
//! │  ✅ CORRECT: one conditional statement                                  │
//! │     UPDATE products                                                     │
//! │        SET quantity_on_hand = quantity_on_hand - :q                     │
//! │      WHERE code = :code AND quantity_on_hand >= :q                      │
//! │     RETURNING name, sale_price, purchase_price, quantity_on_hand        │
//! │                                                                         │
//! │  SQLite serializes writers, so exactly one of two racing checkouts     │
//! │  for the last unit gets a row back. The other gets zero rows.          │
//! │  The RETURNING clause reads prices in the same statement, so the       │
//! │  sale records the price that was current when stock was taken.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `release` is the compensating increment used when a multi-line checkout
//! is rolled back. Nothing else writes `quantity_on_hand` after creation:
//! [`ProductStore::update`] edits catalog fields only.

use chrono::Utc;
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use emporium_core::validation::{validate_new_product, validate_product_update, validate_quantity};
use emporium_core::{Money, NewProduct, Product, ProductUpdate};

/// Stock taken by a successful conditional decrement.
///
/// Carries the product data read by the same statement; the sale item is
/// built from this snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reservation {
    pub code: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub unit_cost: Money,

    /// Stock left after this reservation.
    pub remaining: i64,
}

#[derive(sqlx::FromRow)]
struct ReservedRow {
    name: String,
    sale_price: Money,
    purchase_price: Money,
    quantity_on_hand: i64,
}

#[derive(Debug, Clone)]
pub struct ProductStore {
    pool: SqlitePool,
}

impl ProductStore {
    pub fn new(pool: SqlitePool) -> Self {
        ProductStore { pool }
    }

    /// Gets a product by code.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Product found
    /// * `Err(DbError::NotFound)` - No product with that code
    pub async fn get(&self, code: &str) -> DbResult<Product> {
        self.find(code)
            .await?
            .ok_or_else(|| DbError::not_found("Product", code))
    }

    pub async fn find(&self, code: &str) -> DbResult<Option<Product>> {
        debug!(code = %code, "Fetching product");

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT code, name, purchase_price, sale_price, quantity_on_hand,
                   created_at, updated_at
            FROM products
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Fetches every product among `codes` that exists, in one query.
    ///
    /// Missing codes are simply absent from the result.
    pub async fn get_many(&self, codes: &[String]) -> DbResult<Vec<Product>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = codes.len(), "Fetching products by code");

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT code, name, purchase_price, sale_price, quantity_on_hand, \
             created_at, updated_at FROM products WHERE code IN (",
        );
        let mut separated = query.separated(", ");
        for code in codes {
            separated.push_bind(code.as_str());
        }
        separated.push_unseparated(") ORDER BY code");

        let products = query
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// All products, ordered by name then code.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT code, name, purchase_price, sale_price, quantity_on_hand,
                   created_at, updated_at
            FROM products
            ORDER BY name, code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Products with `quantity_on_hand <= threshold`, lowest stock first.
    pub async fn at_or_below(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_at_or_below(&mut conn, threshold).await
    }

    /// Creates a product.
    ///
    /// ## Errors
    /// * `InvalidInput` - every validation problem at once
    /// * `UniqueViolation` - the code is taken
    pub async fn create(&self, new: NewProduct) -> DbResult<Product> {
        validate_new_product(&new)?;

        debug!(code = %new.code, "Inserting product");

        let now = Utc::now();
        let product = Product {
            code: new.code,
            name: new.name.trim().to_string(),
            purchase_price: new.purchase_price,
            sale_price: new.sale_price,
            quantity_on_hand: new.quantity_on_hand,
            created_at: now,
            updated_at: now,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                code, name, purchase_price, sale_price, quantity_on_hand,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.purchase_price)
        .bind(product.sale_price)
        .bind(product.quantity_on_hand)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(product),
            Err(e) => match DbError::from(e) {
                DbError::UniqueViolation { .. } => Err(DbError::duplicate("code", &product.code)),
                other => Err(other),
            },
        }
    }

    /// Edits name and prices. Stock is never touched here.
    pub async fn update(&self, code: &str, update: ProductUpdate) -> DbResult<Product> {
        validate_product_update(&update)?;

        debug!(code = %code, "Updating product");

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET
                name = COALESCE(?2, name),
                purchase_price = COALESCE(?3, purchase_price),
                sale_price = COALESCE(?4, sale_price),
                updated_at = ?5
            WHERE code = ?1
            RETURNING code, name, purchase_price, sale_price, quantity_on_hand,
                      created_at, updated_at
            "#,
        )
        .bind(code)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.purchase_price)
        .bind(update.sale_price)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        product.ok_or_else(|| DbError::not_found("Product", code))
    }

    /// Takes `quantity` units if, and only if, that many are on hand.
    ///
    /// ## Errors
    /// * `InvalidInput` - `quantity` outside `1..=MAX_ITEM_QUANTITY`
    /// * `NotFound` - unknown code
    /// * `InsufficientStock` - fewer than `quantity` on hand; nothing changed
    pub async fn reserve_and_decrement(&self, code: &str, quantity: i64) -> DbResult<Reservation> {
        validate_quantity("quantity", quantity).map_err(|e| DbError::InvalidInput(e.into()))?;

        let row = sqlx::query_as::<_, ReservedRow>(
            r#"
            UPDATE products
            SET
                quantity_on_hand = quantity_on_hand - ?2,
                updated_at = ?3
            WHERE code = ?1 AND quantity_on_hand >= ?2
            RETURNING name, sale_price, purchase_price, quantity_on_hand
            "#,
        )
        .bind(code)
        .bind(quantity)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                debug!(
                    code = %code,
                    quantity = quantity,
                    remaining = row.quantity_on_hand,
                    "Stock reserved"
                );
                Ok(Reservation {
                    code: code.to_string(),
                    name: row.name,
                    quantity,
                    unit_price: row.sale_price,
                    unit_cost: row.purchase_price,
                    remaining: row.quantity_on_hand,
                })
            }
            None => {
                // Zero rows: either the code is unknown or stock is short.
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT quantity_on_hand FROM products WHERE code = ?1")
                        .bind(code)
                        .fetch_optional(&self.pool)
                        .await?;

                match available {
                    None => Err(DbError::not_found("Product", code)),
                    Some(available) => {
                        debug!(
                            code = %code,
                            available = available,
                            requested = quantity,
                            "Reservation refused"
                        );
                        Err(DbError::InsufficientStock {
                            code: code.to_string(),
                            available,
                            requested: quantity,
                        })
                    }
                }
            }
        }
    }

    /// Gives back the units taken by `reservation`.
    pub async fn release(&self, reservation: &Reservation) -> DbResult<()> {
        debug!(
            code = %reservation.code,
            quantity = reservation.quantity,
            "Releasing reservation"
        );

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                quantity_on_hand = quantity_on_hand + ?2,
                updated_at = ?3
            WHERE code = ?1
            "#,
        )
        .bind(&reservation.code)
        .bind(reservation.quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &reservation.code));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Critical-stock query, usable on a pooled connection or inside a snapshot.
pub(crate) async fn fetch_at_or_below(
    conn: &mut SqliteConnection,
    threshold: i64,
) -> DbResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT code, name, purchase_price, sale_price, quantity_on_hand,
               created_at, updated_at
        FROM products
        WHERE quantity_on_hand <= ?1
        ORDER BY quantity_on_hand, code
        "#,
    )
    .bind(threshold)
    .fetch_all(&mut *conn)
    .await?;

    Ok(products)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use emporium_core::MAX_ITEM_QUANTITY;

    async fn setup() -> ProductStore {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
    }

    fn new_product(code: &str, name: &str, sale: i64, qty: i64) -> NewProduct {
        NewProduct {
            code: code.to_string(),
            name: name.to_string(),
            purchase_price: Money::from_cents(sale / 2),
            sale_price: Money::from_cents(sale),
            quantity_on_hand: qty,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = setup().await;
        store.create(new_product("A", "Apple", 300, 10)).await.unwrap();

        let product = store.get("A").await.unwrap();
        assert_eq!(product.name, "Apple");
        assert_eq!(product.sale_price.cents(), 300);
        assert_eq!(product.purchase_price.cents(), 150);
        assert_eq!(product.quantity_on_hand, 10);
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let store = setup().await;
        let err = store.get("NOPE").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected() {
        let store = setup().await;
        store.create(new_product("A", "Apple", 300, 10)).await.unwrap();

        let err = store.create(new_product("A", "Other", 100, 1)).await.unwrap_err();
        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "code");
                assert_eq!(value, "A");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_product_is_rejected() {
        let store = setup().await;
        let err = store.create(new_product("A", "", -100, -1)).await.unwrap_err();
        match err {
            DbError::InvalidInput(errors) => {
                assert!(errors.has_field("name"));
                assert!(errors.has_field("sale_price"));
                assert!(errors.has_field("quantity_on_hand"));
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_price_above_ceiling_is_rejected() {
        let store = setup().await;
        let mut product = new_product("A", "Apple", 1, 3);
        product.purchase_price = Money::from_cents(i64::MAX / 2);

        let err = store.create(product).await.unwrap_err();
        match err {
            DbError::InvalidInput(errors) => assert!(errors.has_field("purchase_price")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
        assert_eq!(store.count().await.unwrap(), 0);

        store.create(new_product("B", "Bread", 300, 3)).await.unwrap();
        let update = ProductUpdate {
            sale_price: Some(Money::from_cents(i64::MAX)),
            ..Default::default()
        };
        assert!(matches!(
            store.update("B", update).await,
            Err(DbError::InvalidInput(_))
        ));
        assert_eq!(store.get("B").await.unwrap().sale_price.cents(), 300);
    }

    #[tokio::test]
    async fn test_list_is_sorted_by_name() {
        let store = setup().await;
        store.create(new_product("Z1", "Banana", 100, 1)).await.unwrap();
        store.create(new_product("A1", "Cherry", 100, 1)).await.unwrap();
        store.create(new_product("M1", "Apple", 100, 1)).await.unwrap();

        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Apple", "Banana", "Cherry"]);
    }

    #[tokio::test]
    async fn test_get_many_skips_missing() {
        let store = setup().await;
        store.create(new_product("A", "Apple", 100, 1)).await.unwrap();
        store.create(new_product("B", "Bread", 100, 1)).await.unwrap();

        let found = store
            .get_many(&["B".to_string(), "X".to_string(), "A".to_string()])
            .await
            .unwrap();
        let codes: Vec<_> = found.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_update_changes_prices_not_stock() {
        let store = setup().await;
        store.create(new_product("A", "Apple", 300, 10)).await.unwrap();

        let updated = store
            .update(
                "A",
                ProductUpdate {
                    sale_price: Some(Money::from_cents(350)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.sale_price.cents(), 350);
        assert_eq!(updated.purchase_price.cents(), 150);
        assert_eq!(updated.name, "Apple");
        assert_eq!(updated.quantity_on_hand, 10);

        let err = store
            .update(
                "NOPE",
                ProductUpdate {
                    name: Some("x".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_reserve_and_decrement() {
        let store = setup().await;
        store.create(new_product("A", "Apple", 300, 10)).await.unwrap();

        let reservation = store.reserve_and_decrement("A", 3).await.unwrap();
        assert_eq!(reservation.name, "Apple");
        assert_eq!(reservation.unit_price.cents(), 300);
        assert_eq!(reservation.unit_cost.cents(), 150);
        assert_eq!(reservation.remaining, 7);
        assert_eq!(store.get("A").await.unwrap().quantity_on_hand, 7);
    }

    #[tokio::test]
    async fn test_reserve_exact_stock_reaches_zero() {
        let store = setup().await;
        store.create(new_product("A", "Apple", 300, 2)).await.unwrap();

        store.reserve_and_decrement("A", 2).await.unwrap();
        assert_eq!(store.get("A").await.unwrap().quantity_on_hand, 0);
    }

    #[tokio::test]
    async fn test_reserve_insufficient_leaves_stock_unchanged() {
        let store = setup().await;
        store.create(new_product("A", "Apple", 300, 3)).await.unwrap();

        let err = store.reserve_and_decrement("A", 5).await.unwrap_err();
        match err {
            DbError::InsufficientStock {
                code,
                available,
                requested,
            } => {
                assert_eq!(code, "A");
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(store.get("A").await.unwrap().quantity_on_hand, 3);
    }

    #[tokio::test]
    async fn test_reserve_unknown_and_invalid() {
        let store = setup().await;
        store.create(new_product("A", "Apple", 300, 3)).await.unwrap();

        assert!(matches!(
            store.reserve_and_decrement("NOPE", 1).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            store.reserve_and_decrement("A", 0).await,
            Err(DbError::InvalidInput(_))
        ));
        assert!(matches!(
            store.reserve_and_decrement("A", MAX_ITEM_QUANTITY + 1).await,
            Err(DbError::InvalidInput(_))
        ));
        assert_eq!(store.get("A").await.unwrap().quantity_on_hand, 3);
    }

    #[tokio::test]
    async fn test_release_restores_stock() {
        let store = setup().await;
        store.create(new_product("A", "Apple", 300, 10)).await.unwrap();

        let reservation = store.reserve_and_decrement("A", 4).await.unwrap();
        store.release(&reservation).await.unwrap();
        assert_eq!(store.get("A").await.unwrap().quantity_on_hand, 10);
    }

    #[tokio::test]
    async fn test_at_or_below() {
        let store = setup().await;
        store.create(new_product("A", "Apple", 100, 5)).await.unwrap();
        store.create(new_product("B", "Bread", 100, 6)).await.unwrap();
        store.create(new_product("C", "Cheese", 100, 0)).await.unwrap();

        let codes: Vec<String> = store
            .at_or_below(5)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.code)
            .collect();
        assert_eq!(codes, vec!["C", "A"]);
    }
}
