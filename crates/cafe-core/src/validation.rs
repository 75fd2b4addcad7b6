//! # Validation Module
//!
//! Argument validation shared by the aggregates.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: API layer (external)                                         │
//! │  └── Request shape, deserialization                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Aggregate operation                                          │
//! │  └── THIS MODULE: quantities, amounts, percentages, formats            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: cafe-db                                                      │
//! │  ├── UNIQUE keys (barcode, email, order number, ...)                   │
//! │  └── Version checks                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every validator runs before the aggregate mutates anything.

use rust_decimal::Decimal;

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (product, ingredient, category, customer).
///
/// ## Rules
/// - Must not be blank
/// - At most `max` characters
///
/// ## Example
/// ```rust
/// use cafe_core::validation::validate_name;
///
/// assert!(validate_name("name", "Flat White", 100).is_ok());
/// assert!(validate_name("name", "   ", 100).is_err());
/// ```
pub fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
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

/// Validates a phone number: optional leading `+`, then 10 to 15 digits.
///
/// ## Example
/// ```rust
/// use cafe_core::validation::validate_phone_number;
///
/// assert!(validate_phone_number("+4915112345678").is_ok());
/// assert!(validate_phone_number("12345").is_err());
/// ```
pub fn validate_phone_number(phone: &str) -> ValidationResult<()> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);

    if !(10..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone_number".to_string(),
            reason: "must be between 10 and 15 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address shape (`local@domain.tld`).
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    if email.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an item or stock quantity.
///
/// ## Rules
/// - Must be positive (> 0)
///
/// ## Example
/// ```rust
/// use cafe_core::validation::validate_quantity;
///
/// assert!(validate_quantity("quantity", 2).is_ok());
/// assert!(validate_quantity("quantity", 0).is_err());
/// ```
pub fn validate_quantity(field: &str, qty: i32) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a decimal amount that must be strictly positive.
pub fn validate_positive_amount(field: &str, amount: Decimal) -> ValidationResult<()> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a discount percentage.
///
/// ## Rules
/// - Must be in (0, 100]
///
/// ## Example
/// ```rust
/// use cafe_core::validation::validate_percentage;
/// use rust_decimal::Decimal;
///
/// assert!(validate_percentage(Decimal::ONE_HUNDRED).is_ok());
/// assert!(validate_percentage(Decimal::ZERO).is_err());
/// ```
pub fn validate_percentage(pct: Decimal) -> ValidationResult<()> {
    if pct <= Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "percentage".to_string(),
            min: "0 (exclusive)".to_string(),
            max: "100".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Espresso", 100).is_ok());
        assert!(validate_name("name", "", 100).is_err());
        assert!(validate_name("name", "   ", 100).is_err());
        assert!(validate_name("name", &"A".repeat(101), 100).is_err());
    }

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("0123456789").is_ok());
        assert!(validate_phone_number("+441234567890").is_ok());
        assert!(validate_phone_number("123456789").is_err());
        assert!(validate_phone_number("+1234567890123456").is_err());
        assert!(validate_phone_number("012-345-6789").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@cafe.example").is_ok());
        assert!(validate_email("ana.cafe.example").is_err());
        assert!(validate_email("@cafe.example").is_err());
        assert!(validate_email("ana@cafe").is_err());
        assert!(validate_email("ana@@cafe.example").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity("quantity", 1).is_ok());
        assert!(validate_quantity("quantity", 0).is_err());
        assert!(validate_quantity("quantity", -3).is_err());
    }

    #[test]
    fn test_validate_positive_amount() {
        assert!(validate_positive_amount("amount", dec!(0.001)).is_ok());
        assert!(validate_positive_amount("amount", dec!(0)).is_err());
        assert!(validate_positive_amount("amount", dec!(-1)).is_err());
    }

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage(dec!(0.5)).is_ok());
        assert!(validate_percentage(dec!(100)).is_ok());
        assert!(validate_percentage(dec!(0)).is_err());
        assert!(validate_percentage(dec!(100.5)).is_err());
    }
}
