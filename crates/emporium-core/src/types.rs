//! # Domain Types
//!
//! Core domain types used throughout Emporium.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Expense      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code (PK)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  items[]        │   │  date           │       │
//! │  │  purchase_price │   │  total          │   │  description    │       │
//! │  │  sale_price     │   │  created_at     │   │  category       │       │
//! │  │  qty_on_hand    │   └────────┬────────┘   │  amount         │       │
//! │  └─────────────────┘            │            └─────────────────┘       │
//! │           ▲                     ▼                                       │
//! │           │ code        ┌─────────────────┐                            │
//! │           └─────────────│    SaleItem     │  name/price/cost are       │
//! │             (weak ref)  │  snapshot copy  │  copied at sale time       │
//! │                         └─────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Rule
//! A sale never reads a product again after it is recorded. Renaming a
//! product, repricing it or removing it leaves every historical sale intact.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog product with its current stock level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Business identifier, unique and immutable.
    pub code: String,

    pub name: String,

    /// What the shop paid per unit.
    pub purchase_price: Money,

    /// What the customer pays per unit.
    pub sale_price: Money,

    /// Never negative. Only changed by stock reservation and its compensation.
    pub quantity_on_hand: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether this product counts as critical stock at `threshold`.
    #[inline]
    pub fn is_critical(&self, threshold: i64) -> bool {
        self.quantity_on_hand <= threshold
    }

    /// Whether `quantity` units can be sold right now.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.quantity_on_hand >= quantity
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub purchase_price: Money,
    pub sale_price: Money,
    #[serde(default)]
    pub quantity_on_hand: i64,
}

/// Catalog edit. Stock is deliberately absent: it only moves through sales.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub purchase_price: Option<Money>,
    pub sale_price: Option<Money>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.purchase_price.is_none() && self.sale_price.is_none()
    }
}

// =============================================================================
// Sale Request
// =============================================================================

/// One line of a checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub product_code: String,
    pub quantity: i64,
}

impl SaleLine {
    pub fn new(product_code: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_code: product_code.into(),
            quantity,
        }
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A recorded sale line with the product data copied at sale time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleItem {
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,

    /// Sale price snapshot.
    pub unit_price: Money,

    /// Purchase price snapshot.
    pub unit_cost: Money,

    /// `unit_price × quantity`
    pub line_total: Money,
}

impl SaleItem {
    /// Builds an item, computing the line total.
    ///
    /// Fails if the line total or the line cost does not fit in an `i64`
    /// of cents.
    pub fn new(
        product_code: impl Into<String>,
        product_name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
        unit_cost: Money,
    ) -> Result<Self, ValidationError> {
        let product_code = product_code.into();
        let line_total = unit_price
            .checked_mul(quantity)
            .ok_or_else(|| ValidationError::Overflow {
                field: format!("{product_code}.line_total"),
            })?;
        if unit_cost.checked_mul(quantity).is_none() {
            return Err(ValidationError::Overflow {
                field: format!("{product_code}.cost"),
            });
        }

        Ok(Self {
            product_code,
            product_name: product_name.into(),
            quantity,
            unit_price,
            unit_cost,
            line_total,
        })
    }

    /// Cost of goods for this line.
    #[inline]
    pub fn cost(&self) -> Money {
        self.unit_cost.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// An immutable sale record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,

    /// Non-empty, in order of first appearance in the request.
    pub items: Vec<SaleItem>,

    /// Sum of line totals, fixed at creation.
    pub total: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Builds a sale from its items, computing the total once.
    pub fn from_items(
        id: impl Into<String>,
        items: Vec<SaleItem>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            });
        }

        let total = items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.line_total))
            .ok_or_else(|| ValidationError::Overflow {
                field: "total".to_string(),
            })?;

        Ok(Self {
            id: id.into(),
            items,
            total,
            created_at,
        })
    }

    /// Total units across all lines.
    pub fn units(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Total cost of goods across all lines.
    pub fn cost_of_goods(&self) -> Money {
        self.items.iter().map(SaleItem::cost).sum()
    }
}

// =============================================================================
// Expense
// =============================================================================

/// An operating expense entry. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,

    #[ts(as = "String")]
    pub date: NaiveDate,

    pub description: String,

    /// Free text, empty when uncategorized.
    pub category: String,

    pub amount: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Input for recording an expense.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewExpense {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub amount: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(code: &str, qty: i64, price: i64, cost: i64) -> SaleItem {
        SaleItem::new(code, code, qty, Money::from_cents(price), Money::from_cents(cost)).unwrap()
    }

    #[test]
    fn test_sale_total_is_sum_of_lines() {
        let sale = Sale::from_items(
            "s1",
            vec![item("A", 2, 300, 100), item("B", 1, 700, 400)],
            Utc::now(),
        )
        .unwrap();

        assert_eq!(sale.total.cents(), 1300);
        assert_eq!(sale.units(), 3);
        assert_eq!(sale.cost_of_goods().cents(), 600);
    }

    #[test]
    fn test_sale_requires_items() {
        let err = Sale::from_items("s1", Vec::new(), Utc::now()).unwrap_err();
        assert_eq!(err.field(), "items");
    }

    #[test]
    fn test_line_total_overflow_is_rejected() {
        let err = SaleItem::new("A", "A", 2, Money::from_cents(i64::MAX), Money::zero());
        assert!(matches!(err, Err(ValidationError::Overflow { .. })));
    }

    #[test]
    fn test_line_cost_overflow_is_rejected() {
        let err = SaleItem::new(
            "A",
            "A",
            3,
            Money::from_cents(1),
            Money::from_cents(i64::MAX / 2),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::Overflow { field: "A.cost".into() });
    }

    #[test]
    fn test_product_stock_checks() {
        let now = Utc::now();
        let product = Product {
            code: "A".to_string(),
            name: "Apple".to_string(),
            purchase_price: Money::from_cents(100),
            sale_price: Money::from_cents(300),
            quantity_on_hand: 5,
            created_at: now,
            updated_at: now,
        };

        assert!(product.can_sell(5));
        assert!(!product.can_sell(6));
        assert!(!product.can_sell(0));
        assert!(product.is_critical(5));
        assert!(!product.is_critical(4));
    }

    #[test]
    fn test_new_expense_category_defaults_to_empty() {
        let expense: NewExpense = serde_json::from_str(
            r#"{"date":"2024-03-01","description":"Rent","amount":150000}"#,
        )
        .unwrap();
        assert_eq!(expense.category, "");
        assert_eq!(expense.amount.cents(), 150000);
    }
}
