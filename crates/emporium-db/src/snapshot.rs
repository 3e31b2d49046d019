//! # Read Snapshots
//!
//! A [`ReadSnapshot`] wraps one read transaction so that a dashboard sees
//! sales, expenses and stock levels as of a single instant.
//!
//! ```text
//!   checkout commits ─────┐
//!                         ▼
//! ──────────┬─────────────●──────────────────────────────► time
//!           │ BEGIN (first read pins the snapshot)
//!           │  sales_in(window)        ← same committed state
//!           │  expenses_in(window)     ← same committed state
//!           │  critical_products(5)    ← same committed state
//!           │ ROLLBACK
//! ```
//!
//! Without the transaction, a sale committed between the sales query and the
//! stock query would show up in stock but not in revenue.

use sqlx::{Sqlite, Transaction};

use crate::error::{DbError, DbResult};
use crate::repository::{expense, product, sale};
use emporium_core::{AggregationWindow, Expense, Product, Sale};

pub struct ReadSnapshot {
    tx: Transaction<'static, Sqlite>,
}

impl ReadSnapshot {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx }
    }

    pub async fn sales_in(&mut self, window: &AggregationWindow) -> DbResult<Vec<Sale>> {
        sale::fetch_in_window(&mut self.tx, window).await
    }

    pub async fn expenses_in(&mut self, window: &AggregationWindow) -> DbResult<Vec<Expense>> {
        expense::fetch_in_window(&mut self.tx, window).await
    }

    pub async fn products_at_or_below(&mut self, threshold: i64) -> DbResult<Vec<Product>> {
        product::fetch_at_or_below(&mut self.tx, threshold).await
    }

    /// Ends the read transaction. Dropping the snapshot does the same.
    pub async fn finish(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }
}
