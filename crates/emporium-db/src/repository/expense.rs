//! # Expense Ledger
//!
//! Append-only store of operating expenses. There is no update or delete;
//! a mistaken entry is corrected by recording another one.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use emporium_core::validation::validate_new_expense;
use emporium_core::{AggregationWindow, Expense, NewExpense};

#[derive(Debug, Clone)]
pub struct ExpenseLedger {
    pool: SqlitePool,
}

impl ExpenseLedger {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseLedger { pool }
    }

    /// Records an expense.
    ///
    /// ## Errors
    /// * `InvalidInput` - empty description or negative amount
    pub async fn add(&self, new: NewExpense) -> DbResult<Expense> {
        validate_new_expense(&new)?;

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            date: new.date,
            description: new.description.trim().to_string(),
            category: new.category.trim().to_string(),
            amount: new.amount,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO expenses (id, date, description, category, amount, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&expense.id)
        .bind(expense.date)
        .bind(&expense.description)
        .bind(&expense.category)
        .bind(expense.amount)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        info!(
            id = %expense.id,
            date = %expense.date,
            amount = %expense.amount,
            "Expense recorded"
        );
        Ok(expense)
    }

    pub async fn get(&self, id: &str) -> DbResult<Expense> {
        sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, date, description, category, amount, created_at
            FROM expenses
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Expense", id))
    }

    /// Expenses dated inside `window`, newest date first.
    pub async fn list(&self, window: &AggregationWindow) -> DbResult<Vec<Expense>> {
        let mut conn = self.pool.acquire().await?;
        fetch_in_window(&mut conn, window).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM expenses")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Range scan on `expenses.date`. Ties on date go newest entry first.
pub(crate) async fn fetch_in_window(
    conn: &mut SqliteConnection,
    window: &AggregationWindow,
) -> DbResult<Vec<Expense>> {
    let (from, to) = window.date_range();

    let expenses = sqlx::query_as::<_, Expense>(
        r#"
        SELECT id, date, description, category, amount, created_at
        FROM expenses
        WHERE date >= ?1 AND date < ?2
        ORDER BY date DESC, created_at DESC, id
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(&mut *conn)
    .await?;

    debug!(count = expenses.len(), window = %window, "Loaded expenses");
    Ok(expenses)
}

// =============================================================================
// Unit Tests
// =============================================================================
