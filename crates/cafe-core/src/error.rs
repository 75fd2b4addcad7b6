//! # Error Types
//!
//! Domain-specific error types for cafe-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cafe-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations (invalid argument)    │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cafe-db errors (separate crate)                                       │
//! │  └── DbError          - Not found, uniqueness, version conflicts       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller (4xx / 409)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` is a synchronous usage error. Nothing here is transient
//! and nothing is retried: an operation that returns an error has left the
//! aggregate exactly as it found it.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by aggregate operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Removing more stock than is on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Kitchen uses 3 kg of flour
    ///      │
    ///      ▼
    /// Check stock: available=2.5
    ///      │
    ///      ▼
    /// InsufficientStock { item: "Flour", available: "2.5", requested: "3" }
    /// ```
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: String,
        requested: String,
    },

    /// Redeeming more loyalty points than the balance holds.
    #[error("Cannot redeem {requested} points, only {available} available")]
    InsufficientPoints { available: i32, requested: i32 },

    /// A discount larger than the amount it applies to.
    #[error("Discount {discount} exceeds {target} amount {base}")]
    DiscountExceedsBase {
        target: &'static str,
        discount: String,
        base: String,
    },

    /// The order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Processing payment on an order that is not `Created`
    /// - Marking items prepared on a finished order
    #[error("Order {order} is {status}, cannot {operation}")]
    InvalidOrderStatus {
        order: String,
        status: String,
        operation: &'static str,
    },

    /// Items and discounts can only change before payment.
    #[error("Order {order} is {status}; items and discounts can no longer change")]
    OrderNotModifiable { order: String, status: String },

    /// No line with this number on the order.
    #[error("Order {order} has no item line {line}")]
    ItemNotFound { order: String, line: u32 },

    /// Order numbers are assigned exactly once.
    #[error("Order already has number {0}")]
    OrderNumberAlreadyAssigned(String),

    /// A customer was supplied that is not the order's customer.
    #[error("Customer {supplied:?} does not match order customer {expected:?}")]
    CustomerMismatch {
        expected: Option<i64>,
        supplied: Option<i64>,
    },

    /// Referenced category does not exist in the tree.
    #[error("Category not found: {0}")]
    CategoryNotFound(i64),

    /// Re-parenting would make a category its own ancestor.
    #[error("Moving category {category} under {parent} would create a cycle")]
    CategoryCycle { category: i64, parent: i64 },

    /// Inactive users cannot obtain a principal.
    #[error("User {0} is inactive")]
    InactiveUser(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when an argument doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed order number, phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
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
        let err = CoreError::InsufficientStock {
            item: "Oat Milk".to_string(),
            available: "1.5".to_string(),
            requested: "2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Oat Milk: available 1.5, requested 2"
        );

        let err = CoreError::InsufficientPoints {
            available: 40,
            requested: 50,
        };
        assert_eq!(err.to_string(), "Cannot redeem 50 points, only 40 available");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
