//! # emporium-core: Pure Business Logic for Emporium
//!
//! Everything the sale engine decides without touching a database lives
//! here: money arithmetic, input validation, aggregation windows and the
//! dashboard metric computation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emporium Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 emporium-engine (services)                      │   │
//! │  │      SaleRecorder ──► stock reservation ──► sale persistence    │   │
//! │  │      AggregationEngine ──► snapshot read ──► metrics            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ emporium-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌────────────┐ ┌────────┐ ┌─────────┐ │   │
//! │  │   │  types  │ │  money  │ │ validation │ │ window │ │ metrics │ │   │
//! │  │   └─────────┘ └─────────┘ └────────────┘ └────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 emporium-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product, Sale, SaleItem, Expense
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain and validation errors
//! - [`validation`] - Request validation and sale-line normalization
//! - [`window`] - Aggregation windows and period presets
//! - [`metrics`] - Dashboard metric computation
//!
//! ## Example Usage
//!
//! ```rust
//! use emporium_core::{Money, SaleItem, Sale};
//! use chrono::Utc;
//!
//! let items = vec![
//!     SaleItem::new("A", "Apple", 2, Money::from_cents(300), Money::from_cents(100)).unwrap(),
//!     SaleItem::new("B", "Bread", 1, Money::from_cents(700), Money::from_cents(350)).unwrap(),
//! ];
//! let sale = Sale::from_items("sale-1", items, Utc::now()).unwrap();
//! assert_eq!(sale.total.cents(), 1300);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod metrics;
pub mod money;
pub mod types;
pub mod validation;
pub mod window;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError, ValidationErrors};
pub use metrics::{DashboardAlert, DashboardMetrics, MetricsSettings};
pub use money::Money;
pub use types::*;
pub use window::{AggregationWindow, WindowPreset};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in one checkout request.
pub const MAX_SALE_LINES: usize = 100;

pub const MAX_CODE_LEN: usize = 50;

pub const MAX_NAME_LEN: usize = 200;

pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Largest quantity accepted on one sale line, after merging duplicates.
pub const MAX_ITEM_QUANTITY: i64 = 100_000;

/// Largest opening stock accepted for a product.
pub const MAX_STOCK_QUANTITY: i64 = 10_000_000;

/// Ceiling for any price or expense amount: $100,000,000.00.
///
/// With [`MAX_ITEM_QUANTITY`] and [`MAX_SALE_LINES`] this keeps every line
/// total, line cost and sale total far inside `i64`.
pub const MAX_MONEY_CENTS: i64 = 10_000_000_000;

/// Products at or below this quantity are flagged as critical.
pub const DEFAULT_CRITICAL_STOCK_THRESHOLD: i64 = 5;

pub const DEFAULT_TOP_PRODUCTS_LIMIT: usize = 5;
