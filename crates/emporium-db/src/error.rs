//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        ValidationErrors (emporium-core)    │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleError / EngineError (emporium-engine)                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use emporium_core::ValidationErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// ## When This Occurs
    /// - Creating a product with an existing code
    /// - Re-inserting a sale id that was already committed
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// The conditional decrement found fewer units than requested.
    ///
    /// ```text
    /// reserve_and_decrement("COKE", 5)
    ///      │
    ///      ▼
    /// UPDATE ... WHERE quantity_on_hand >= 5  → 0 rows
    ///      │
    ///      ▼
    /// InsufficientStock { code: "COKE", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationErrors),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// All connections in use, or the database stayed locked past the
    /// busy timeout.
    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether retrying the same operation could succeed.
    ///
    /// ## Categories
    /// ```text
    /// Busy, ConnectionFailed, TransactionFailed,
    /// QueryFailed, Internal                      → retryable (transient I/O)
    /// NotFound, UniqueViolation, InsufficientStock,
    /// InvalidInput, ConstraintViolation,
    /// MigrationFailed                            → permanent
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DbError::Busy(_)
                | DbError::ConnectionFailed(_)
                | DbError::TransactionFailed(_)
                | DbError::QueryFailed(_)
                | DbError::Internal(_)
        )
    }
}

/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound       → DbError::NotFound
/// sqlx::Error::Database          → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut      → DbError::Busy
/// Other                          → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite messages: "UNIQUE constraint failed: <table>.<column>",
                // "CHECK constraint failed: <expr>", "database is locked"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("constraint failed") {
                    DbError::ConstraintViolation(msg.to_string())
                } else if msg.contains("database is locked") || msg.contains("database is busy") {
                    DbError::Busy(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::Busy("connection pool exhausted".to_string()),

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DbError::InsufficientStock {
            code: "COKE-330".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for COKE-330: available 3, requested 5"
        );
        assert_eq!(
            DbError::not_found("Product", "X").to_string(),
            "Product not found: X"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(DbError::Busy("locked".into()).is_retryable());
        assert!(DbError::QueryFailed("disk I/O error".into()).is_retryable());
        assert!(!DbError::duplicate("sales.id", "abc").is_retryable());
        assert!(!DbError::not_found("Product", "X").is_retryable());
        assert!(!DbError::InsufficientStock {
            code: "A".into(),
            available: 0,
            requested: 1
        }
        .is_retryable());
    }
}
