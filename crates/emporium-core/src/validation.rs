//! # Validation Module
//!
//! Input validation for catalog edits, checkout requests and expenses.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (pure)                                           │
//! │  ├── Format checks (empty, length, charset)                            │
//! │  ├── Sign and range checks (prices, quantities, amounts)               │
//! │  └── Every problem collected into one ValidationErrors                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── CHECK (quantity_on_hand >= 0)                                     │
//! │  ├── UNIQUE product code                                               │
//! │  └── Immutability triggers on sales                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use emporium_core::validation::normalize_sale_request;
//! use emporium_core::SaleLine;
//!
//! let lines = normalize_sale_request(&[
//!     SaleLine::new("A", 2),
//!     SaleLine::new("B", 1),
//!     SaleLine::new("A", 1),
//! ])
//! .unwrap();
//!
//! assert_eq!(lines, vec![SaleLine::new("A", 3), SaleLine::new("B", 1)]);
//! ```

use std::collections::HashMap;

use crate::error::{ValidationError, ValidationErrors};
use crate::money::Money;
use crate::types::{NewExpense, NewProduct, ProductUpdate, SaleLine};
use crate::{
    MAX_CODE_LEN, MAX_DESCRIPTION_LEN, MAX_ITEM_QUANTITY, MAX_MONEY_CENTS, MAX_NAME_LEN,
    MAX_SALE_LINES, MAX_STOCK_QUANTITY,
};

pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, `-`, `_` and `.` only (no whitespace)
///
/// ```rust
/// use emporium_core::validation::validate_code;
///
/// assert!(validate_code("code", "COKE-330").is_ok());
/// assert!(validate_code("code", "").is_err());
/// assert!(validate_code("code", " A").is_err());
/// ```
pub fn validate_code(field: &str, code: &str) -> ValidationResult<()> {
    if code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if code.chars().count() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, '-', '_' and '.'".to_string(),
        });
    }

    Ok(())
}

/// Validates a required free-text field with a length cap.
pub fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_text("name", name, MAX_NAME_LEN)
}

/// Validates a price or expense amount.
///
/// ## Rules
/// - Zero is allowed, negatives are not
/// - At most [`MAX_MONEY_CENTS`]
///
/// ```rust
/// use emporium_core::validation::validate_money;
/// use emporium_core::Money;
///
/// assert!(validate_money("sale_price", Money::from_cents(1099)).is_ok());
/// assert!(validate_money("sale_price", Money::zero()).is_ok());
/// assert!(validate_money("sale_price", Money::from_cents(-1)).is_err());
/// assert!(validate_money("sale_price", Money::from_cents(i64::MAX / 2)).is_err());
/// ```
pub fn validate_money(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if amount.cents() > MAX_MONEY_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_MONEY_CENTS,
        });
    }

    Ok(())
}

/// Validates a sale or reservation quantity: `1..=MAX_ITEM_QUANTITY`.
pub fn validate_quantity(field: &str, quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Opening stock may be zero but never negative or above [`MAX_STOCK_QUANTITY`].
pub fn validate_stock_quantity(field: &str, quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if quantity > MAX_STOCK_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_STOCK_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a product creation request, collecting every problem.
pub fn validate_new_product(product: &NewProduct) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let checks = [
        validate_code("code", &product.code),
        validate_product_name(&product.name),
        validate_money("purchase_price", product.purchase_price),
        validate_money("sale_price", product.sale_price),
        validate_stock_quantity("quantity_on_hand", product.quantity_on_hand),
    ];
    checks
        .into_iter()
        .filter_map(Result::err)
        .for_each(|e| errors.push(e));

    errors.into_result(())
}

/// Validates a catalog edit.
pub fn validate_product_update(update: &ProductUpdate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if update.is_empty() {
        errors.push(ValidationError::Required {
            field: "update".to_string(),
        });
    }
    if let Some(name) = &update.name {
        if let Err(e) = validate_product_name(name) {
            errors.push(e);
        }
    }
    if let Some(price) = update.purchase_price {
        if let Err(e) = validate_money("purchase_price", price) {
            errors.push(e);
        }
    }
    if let Some(price) = update.sale_price {
        if let Err(e) = validate_money("sale_price", price) {
            errors.push(e);
        }
    }

    errors.into_result(())
}

/// Validates an expense entry.
pub fn validate_new_expense(expense: &NewExpense) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if let Err(e) = validate_text("description", &expense.description, MAX_DESCRIPTION_LEN) {
        errors.push(e);
    }
    if expense.category.chars().count() > MAX_NAME_LEN {
        errors.push(ValidationError::TooLong {
            field: "category".to_string(),
            max: MAX_NAME_LEN,
        });
    }
    if let Err(e) = validate_money("amount", expense.amount) {
        errors.push(e);
    }

    errors.into_result(())
}

// =============================================================================
// Sale Request Normalization
// =============================================================================

/// Validates a checkout request and merges repeated product codes.
///
/// ## Steps
/// ```text
/// [(A,2), (B,1), (A,1)]
///      │  validate every line, collect all problems
///      ▼
/// [(A,3), (B,1)]   ← quantities summed, first-appearance order kept
/// ```
///
/// ## Errors
/// - empty request or more than [`MAX_SALE_LINES`] lines
/// - invalid product code or a quantity outside `1..=MAX_ITEM_QUANTITY` on any line
/// - merged quantity above [`MAX_ITEM_QUANTITY`], reported on the line that pushed it over
pub fn normalize_sale_request(lines: &[SaleLine]) -> Result<Vec<SaleLine>, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if lines.is_empty() {
        errors.push(ValidationError::Required {
            field: "lines".to_string(),
        });
        return Err(errors);
    }

    if lines.len() > MAX_SALE_LINES {
        errors.push(ValidationError::TooMany {
            field: "lines".to_string(),
            max: MAX_SALE_LINES,
        });
        return Err(errors);
    }

    let mut merged: Vec<SaleLine> = Vec::with_capacity(lines.len());
    let mut index_by_code: HashMap<&str, usize> = HashMap::new();

    for (i, line) in lines.iter().enumerate() {
        let mut line_ok = true;

        if let Err(e) = validate_code(&format!("lines[{i}].product_code"), &line.product_code) {
            errors.push(e);
            line_ok = false;
        }
        if let Err(e) = validate_quantity(&format!("lines[{i}].quantity"), line.quantity) {
            errors.push(e);
            line_ok = false;
        }
        if !line_ok {
            continue;
        }

        match index_by_code.get(line.product_code.as_str()) {
            Some(&at) => {
                // Both terms are already bounded, so the sum cannot wrap.
                let sum = merged[at].quantity + line.quantity;
                match validate_quantity(&format!("lines[{i}].quantity"), sum) {
                    Ok(()) => merged[at].quantity = sum,
                    Err(e) => errors.push(e),
                }
            }
            None => {
                index_by_code.insert(line.product_code.as_str(), merged.len());
                merged.push(line.clone());
            }
        }
    }

    errors.into_result(merged)
}

// =============================================================================
// Unit Tests
// =============================================================================
