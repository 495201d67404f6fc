//! # Error Types
//!
//! Domain-specific error types for pharmadesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pharmadesk-core errors (this file)                                    │
//! │  ├── CoreError        - Cart rule violations                           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pharmadesk-client errors (separate crate)                             │
//! │  └── ClientError      - Transport, session, config failures            │
//! │                                                                         │
//! │  Terminal errors (in app)                                              │
//! │  └── ApiError         - What the cashier sees                          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → ApiError            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A rejected cart mutation always leaves the cart exactly as it was; the
//! error is the only observable effect.

use thiserror::Error;

use crate::types::MedicineId;

// =============================================================================
// Core Error
// =============================================================================

/// Cart and checkout rule violations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// The medicine is not in the current catalog snapshot.
    #[error("Medicine not found: {0}")]
    ItemNotFound(MedicineId),

    /// First add of a medicine with nothing on hand.
    #[error("{name} is out of stock")]
    OutOfStock { id: MedicineId, name: String },

    /// The cart line would exceed what is on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Click "+" on Paracetamol (in cart: 3)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// CapacityExceeded { available: 3, requested: 4 }
    ///      │
    ///      ▼
    /// Warning toast: "Maximum stock limit reached in cart"
    /// ```
    #[error("Only {available} of {name} in stock, requested {requested}")]
    CapacityExceeded {
        id: MedicineId,
        name: String,
        available: i64,
        requested: i64,
    },

    /// A quantity change would go below zero.
    #[error("Quantity {requested} is out of range")]
    QuantityOutOfRange { id: MedicineId, requested: i64 },

    /// Update or remove of a medicine that has no cart line.
    #[error("Medicine {0} is not in the cart")]
    LineNotInCart(MedicineId),

    /// Cart has reached its line limit.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Checkout of a cart with no lines.
    #[error("Please add items to cart")]
    EmptyCart,

    /// A bill is being submitted; the cart is frozen until it settles.
    #[error("A bill is already being submitted")]
    CheckoutInProgress,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Capacity and range errors are warnings, not failures.
    pub fn is_stock_limit(&self) -> bool {
        matches!(
            self,
            CoreError::CapacityExceeded { .. } | CoreError::OutOfStock { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any request leaves the client.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two fields disagree (e.g., a date range running backwards).
    #[error("{0}")]
    Inconsistent(String),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::CapacityExceeded {
            id: MedicineId(4),
            name: "Amoxicillin".to_string(),
            available: 3,
            requested: 4,
        };
        assert_eq!(
            err.to_string(),
            "Only 3 of Amoxicillin in stock, requested 4"
        );
        assert_eq!(CoreError::EmptyCart.to_string(), "Please add items to cart");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "medicine_name".to_string(),
        };
        assert_eq!(err.to_string(), "medicine_name is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Negative {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_stock_limit_classification() {
        assert!(CoreError::OutOfStock {
            id: MedicineId(1),
            name: "X".to_string()
        }
        .is_stock_limit());
        assert!(!CoreError::LineNotInCart(MedicineId(1)).is_stock_limit());
    }
}
