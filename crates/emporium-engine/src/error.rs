//! # Engine Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Engine Error Categories                          │
//! │                                                                         │
//! │  ┌──────────────────────┐  ┌──────────────────────┐  ┌───────────────┐ │
//! │  │  Caller mistakes     │  │  Stock conditions    │  │  Store faults │ │
//! │  │  (nothing changed)   │  │  (nothing changed)   │  │               │ │
//! │  │                      │  │                      │  │  Store        │ │
//! │  │  InvalidInput        │  │  NotFound            │  │  Aborted      │ │
//! │  │                      │  │  InsufficientStock   │  │               │ │
//! │  └──────────────────────┘  └──────────────────────┘  └───────────────┘ │
//! │                                                                         │
//! │  ┌───────────────────────────────────────────────────────────────────┐ │
//! │  │  Operator-visible (stock and records disagree)                    │ │
//! │  │                                                                   │ │
//! │  │  PersistenceFailed  stock decremented, sale not recorded          │ │
//! │  │  RollbackFailed     a reservation could not be given back         │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use emporium_core::{CoreError, Sale, ValidationErrors};
use emporium_db::DbError;

pub type SaleResult<T> = Result<T, SaleError>;
pub type EngineResult<T> = Result<T, EngineError>;

/// One sale line that asked for more than is on hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Shortfall {
    pub code: String,
    pub available: i64,
    pub requested: i64,
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (available {}, requested {})",
            self.code, self.available, self.requested
        )
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Sale Errors
// =============================================================================

/// Failure of [`SaleRecorder::record_sale`](crate::SaleRecorder::record_sale).
///
/// Unless the variant says otherwise, stock is exactly as it was before
/// the call and no sale was recorded.
#[derive(Debug, Error)]
pub enum SaleError {
    #[error("Invalid sale request: {0}")]
    InvalidInput(#[from] ValidationErrors),

    #[error("Unknown product code(s): {}", .codes.join(", "))]
    NotFound { codes: Vec<String> },

    /// Never clamped to what is available.
    #[error("Insufficient stock: {}", join(.shortfalls))]
    InsufficientStock { shortfalls: Vec<Shortfall> },

    #[error("Store error: {0}")]
    Store(DbError),

    /// Stock stays decremented; the sale is carried so it can be recorded
    /// by hand.
    #[error("Sale {} could not be recorded after {attempts} attempt(s): {reason}", .sale.id)]
    PersistenceFailed {
        sale: Box<Sale>,
        attempts: u32,
        reason: String,
    },

    /// Reservations for `codes` are still held.
    #[error("Rollback failed for {}: {reason}", .codes.join(", "))]
    RollbackFailed { codes: Vec<String>, reason: String },

    /// The unit of work panicked or was cancelled by the runtime.
    #[error("Sale aborted: {0}")]
    Aborted(String),
}

impl SaleError {
    /// True when stock and sale records may disagree and someone has to
    /// reconcile them by hand.
    pub fn is_operator_visible(&self) -> bool {
        matches!(
            self,
            SaleError::PersistenceFailed { .. }
                | SaleError::RollbackFailed { .. }
                | SaleError::Aborted(_)
        )
    }

    /// True when the same request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            SaleError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Codes the failure is about, for display next to the cart.
    pub fn product_codes(&self) -> Vec<String> {
        match self {
            SaleError::NotFound { codes } | SaleError::RollbackFailed { codes, .. } => {
                codes.clone()
            }
            SaleError::InsufficientStock { shortfalls } => {
                shortfalls.iter().map(|s| s.code.clone()).collect()
            }
            SaleError::PersistenceFailed { sale, .. } => {
                sale.items.iter().map(|i| i.product_code.clone()).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl From<DbError> for SaleError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { id, .. } => SaleError::NotFound { codes: vec![id] },
            DbError::InsufficientStock {
                code,
                available,
                requested,
            } => SaleError::InsufficientStock {
                shortfalls: vec![Shortfall {
                    code,
                    available,
                    requested,
                }],
            },
            DbError::InvalidInput(errors) => SaleError::InvalidInput(errors),
            other => SaleError::Store(other),
        }
    }
}

// =============================================================================
// Engine Errors
// =============================================================================

/// Bootstrap, configuration and read-side failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Sale(#[from] SaleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use emporium_core::{Money, SaleItem};

    #[test]
    fn test_db_errors_map_to_sale_errors() {
        let err: SaleError = DbError::not_found("Product", "A").into();
        assert!(matches!(err, SaleError::NotFound { ref codes } if codes == &["A"]));

        let err: SaleError = DbError::InsufficientStock {
            code: "B".into(),
            available: 1,
            requested: 3,
        }
        .into();
        assert_eq!(err.product_codes(), vec!["B".to_string()]);
        assert_eq!(
            err.to_string(),
            "Insufficient stock: B (available 1, requested 3)"
        );

        let err: SaleError = DbError::Busy("locked".into()).into();
        assert!(matches!(err, SaleError::Store(_)));
        assert!(err.is_retryable());
        assert!(!err.is_operator_visible());
    }

    #[test]
    fn test_operator_visible_variants() {
        let item = SaleItem::new("A", "Apple", 1, Money::from_cents(300), Money::from_cents(100))
            .unwrap();
        let sale = Sale::from_items("s1", vec![item], Utc::now()).unwrap();
        let err = SaleError::PersistenceFailed {
            sale: Box::new(sale),
            attempts: 3,
            reason: "disk unavailable".into(),
        };
        assert!(err.is_operator_visible());
        assert!(err.to_string().contains("after 3 attempt(s)"));

        let err = SaleError::RollbackFailed {
            codes: vec!["A".into()],
            reason: "locked".into(),
        };
        assert!(err.is_operator_visible());
        assert!(!SaleError::NotFound { codes: vec![] }.is_operator_visible());
    }
}
