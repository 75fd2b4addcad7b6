//! # Order Numbers
//!
//! Human-facing order references of the form `YYYYMMDD-XXXX`, where `XXXX`
//! is four uppercase alphanumerics taken from a random UUID.
//!
//! ```text
//! 20261019-7F3A
//! ├──────┘ └──┘
//! │        random (uppercase hex from a v4 UUID)
//! order date
//! ```
//!
//! Uniqueness across orders is the store's job: it regenerates on collision.

use chrono::NaiveDate;
use uuid::Uuid;

/// Generates a candidate order number for `date`.
///
/// ## Example
/// ```rust
/// use cafe_core::order_number;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
/// let n = order_number::generate(date);
/// assert!(n.starts_with("20261019-"));
/// assert!(order_number::is_valid(&n));
/// ```
pub fn generate(date: NaiveDate) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}",
        date.format("%Y%m%d"),
        random[..4].to_ascii_uppercase()
    )
}

/// Checks the `YYYYMMDD-XXXX` shape, including that the date exists.
pub fn is_valid(candidate: &str) -> bool {
    let Some((date, suffix)) = candidate.split_once('-') else {
        return false;
    };

    date.len() == 8
        && date.chars().all(|c| c.is_ascii_digit())
        && NaiveDate::parse_from_str(date, "%Y%m%d").is_ok()
        && suffix.len() == 4
        && suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        for _ in 0..50 {
            let n = generate(date);
            assert_eq!(n.len(), 13);
            assert!(n.starts_with("20240229-"));
            assert!(is_valid(&n), "{n} should be valid");
        }
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid("20261019-AB12"));
        assert!(!is_valid("20261019-ab12"));
        assert!(!is_valid("20261019-AB1"));
        assert!(!is_valid("20261319-AB12"));
        assert!(!is_valid("2026101-AB123"));
        assert!(!is_valid("20261019AB12"));
        assert!(!is_valid("20261019-AB-2"));
    }
}
