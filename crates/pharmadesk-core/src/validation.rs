//! # Validation Module
//!
//! Input validation utilities for PharmaDesk.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Terminal (command parsing)                                   │
//! │  ├── Argument count, numeric parsing                                   │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Business rule validation before any request is sent               │
//! │  └── Lenient parsing of free-text amounts                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── Authoritative stock and billing checks                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pharmadesk_core::validation::{parse_amount_lenient, validate_search_query};
//!
//! assert_eq!(parse_amount_lenient("12.5abc").minor(), 1250);
//! assert_eq!(validate_search_query("  para ").unwrap(), "para");
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::NewMedicine;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_QUERY_LEN: usize = 100;
const MAX_CODE_LEN: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a medicine name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
///
/// ```rust
/// use pharmadesk_core::validation::validate_medicine_name;
///
/// assert!(validate_medicine_name("Paracetamol 500mg").is_ok());
/// assert!(validate_medicine_name("").is_err());
/// ```
pub fn validate_medicine_name(name: &str) -> ValidationResult<()> {
    required("medicine_name", name, MAX_NAME_LEN)
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string. Empty is allowed (lists everything).
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > MAX_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LEN,
        });
    }

    Ok(query.to_string())
}

/// Validates login credentials before they are sent.
pub fn validate_credentials(email: &str, password: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }
    if !email.contains('@') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be an email address".to_string(),
        });
    }
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    Ok(())
}

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
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

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stock quantity on a medicine record (zero allowed).
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a price. Zero is allowed (free samples).
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "gst_percent".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

/// Validates a look-ahead window for the expiry report.
pub fn validate_expiry_window(days: i64) -> ValidationResult<()> {
    if !(1..=3650).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "days".to_string(),
            min: 1,
            max: 3650,
        });
    }
    Ok(())
}

/// Parses a free-text amount the way a lenient form field would.
///
/// Reads the leading numeric prefix (`"12.5abc"` → 12.50). Input with no
/// numeric prefix reads as zero, and negatives clamp to zero.
///
/// ```rust
/// use pharmadesk_core::validation::parse_amount_lenient;
///
/// assert_eq!(parse_amount_lenient(" 25 ").minor(), 2500);
/// assert!(parse_amount_lenient("abc").is_zero());
/// assert!(parse_amount_lenient("-4").is_zero());
/// ```
pub fn parse_amount_lenient(input: &str) -> Money {
    let trimmed = input.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (i, c) in trimmed.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    if !seen_digit {
        return Money::zero();
    }

    trimmed[..end]
        .trim_end_matches('.')
        .parse::<f64>()
        .map(Money::from_decimal)
        .unwrap_or_default()
        .floor_zero()
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates the "add medicine" form.
pub fn validate_new_medicine(form: &NewMedicine) -> ValidationResult<()> {
    validate_medicine_name(&form.name)?;
    required("category", &form.category, MAX_NAME_LEN)?;
    validate_stock_quantity(form.quantity)?;
    validate_price("purchase_price", form.purchase_price)?;
    validate_price("selling_price", form.selling_price)?;
    validate_tax_rate_bps(form.tax_rate.bps())?;

    for (field, value) in [
        ("batch_number", &form.batch_number),
        ("barcode", &form.barcode),
    ] {
        if let Some(v) = value {
            if v.trim().len() > MAX_CODE_LEN {
                return Err(ValidationError::TooLong {
                    field: field.to_string(),
                    max: MAX_CODE_LEN,
                });
            }
        }
    }

    Ok(())
}

/// Validates a report period.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> ValidationResult<()> {
    if start > end {
        return Err(ValidationError::Inconsistent(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
