//! # Ingredients
//!
//! Inventory units with a decimal stock ledger and dietary/allergen flags.
//!
//! ## Stock Ledger
//! ```text
//! add_stock(2.5)      stock 10.0 ──► 12.5   last_restocked = now
//! remove_stock(3)     stock 12.5 ──►  9.5   last_restocked unchanged
//! remove_stock(20)    stock  9.5 ──►  9.5   Err(InsufficientStock)
//! ```
//! Stock never goes negative.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{round_half_up, Money};
use crate::types::{impl_entity, AuditInfo};
use crate::validation::{validate_name, validate_positive_amount};

// =============================================================================
// Unit of Measure
// =============================================================================

/// How an ingredient's stock is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitOfMeasure {
    Gram,
    Kilogram,
    Milliliter,
    Liter,
    Teaspoon,
    Tablespoon,
    Ounce,
    Pound,
    Piece,
    Cup,
    Pinch,
    #[default]
    Each,
}

impl UnitOfMeasure {
    /// Short label used on stock sheets.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            UnitOfMeasure::Gram => "g",
            UnitOfMeasure::Kilogram => "kg",
            UnitOfMeasure::Milliliter => "ml",
            UnitOfMeasure::Liter => "l",
            UnitOfMeasure::Teaspoon => "tsp",
            UnitOfMeasure::Tablespoon => "tbsp",
            UnitOfMeasure::Ounce => "oz",
            UnitOfMeasure::Pound => "lb",
            UnitOfMeasure::Piece => "pc",
            UnitOfMeasure::Cup => "cup",
            UnitOfMeasure::Pinch => "pinch",
            UnitOfMeasure::Each => "ea",
        }
    }
}

impl fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

// =============================================================================
// Ingredient
// =============================================================================

/// An ingredient tracked for allergens, dietary suitability, stock and cost.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Ingredient {
    pub id: Option<i64>,

    /// Unique across the catalog (enforced by the store).
    pub name: String,

    pub description: Option<String>,

    pub contains_allergens: bool,

    /// e.g. "nuts", "dairy". Only meaningful when `contains_allergens`.
    pub allergen_type: Option<String>,

    pub vegetarian: bool,
    pub vegan: bool,
    pub gluten_free: bool,

    /// Never negative; changed only through the stock operations.
    #[ts(as = "String")]
    stock_level: Decimal,

    /// Stock at or below this level should be reordered.
    #[ts(as = "Option<String>")]
    pub reorder_threshold: Option<Decimal>,

    pub unit: UnitOfMeasure,

    pub cost_per_unit: Option<Money>,

    pub supplier: Option<String>,

    #[ts(as = "Option<String>")]
    last_restocked: Option<DateTime<Utc>>,

    pub version: i64,

    pub audit: AuditInfo,
}

impl_entity!(Ingredient, "ingredient");

impl Ingredient {
    /// Creates an ingredient with no stock and no dietary flags set.
    pub fn new(name: impl Into<String>, unit: UnitOfMeasure) -> CoreResult<Self> {
        let name = name.into();
        validate_name("name", &name, 100)?;

        Ok(Ingredient {
            id: None,
            name,
            description: None,
            contains_allergens: false,
            allergen_type: None,
            vegetarian: false,
            vegan: false,
            gluten_free: false,
            stock_level: Decimal::ZERO,
            reorder_threshold: None,
            unit,
            cost_per_unit: None,
            supplier: None,
            last_restocked: None,
            version: 0,
            audit: AuditInfo::default(),
        })
    }

    /// Current stock on hand.
    pub fn stock_level(&self) -> Decimal {
        self.stock_level
    }

    /// When stock was last added.
    pub fn last_restocked(&self) -> Option<DateTime<Utc>> {
        self.last_restocked
    }

    /// Adds stock and stamps the restock time.
    ///
    /// ## Errors
    /// `amount` ≤ 0, or a total past `Decimal::MAX` (stock unchanged).
    pub fn add_stock(&mut self, amount: Decimal) -> CoreResult<Decimal> {
        self.add_stock_at(amount, Utc::now())
    }

    /// [`Ingredient::add_stock`] with an explicit clock.
    pub fn add_stock_at(&mut self, amount: Decimal, now: DateTime<Utc>) -> CoreResult<Decimal> {
        validate_positive_amount("amount", amount)?;

        self.stock_level = self.stock_level.checked_add(amount).ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "amount".to_string(),
                min: "0 (exclusive)".to_string(),
                max: (Decimal::MAX - self.stock_level).to_string(),
            }
        })?;
        self.last_restocked = Some(now);

        debug!(ingredient = %self.name, %amount, stock = %self.stock_level, "Ingredient restocked");
        Ok(self.stock_level)
    }

    /// Removes stock.
    ///
    /// ## Errors
    /// - `amount` ≤ 0
    /// - `amount` > current stock (stock is left unchanged)
    pub fn remove_stock(&mut self, amount: Decimal) -> CoreResult<Decimal> {
        validate_positive_amount("amount", amount)?;

        if amount > self.stock_level {
            return Err(CoreError::InsufficientStock {
                item: self.name.clone(),
                available: self.stock_level.to_string(),
                requested: amount.to_string(),
            });
        }

        self.stock_level -= amount;

        debug!(ingredient = %self.name, %amount, stock = %self.stock_level, "Ingredient stock removed");
        Ok(self.stock_level)
    }

    /// True iff a threshold is configured and stock is at or below it.
    pub fn needs_reordering(&self) -> bool {
        self.reorder_threshold
            .is_some_and(|threshold| self.stock_level <= threshold)
    }

    /// Value of the stock on hand, `None` without a unit cost.
    pub fn stock_value(&self) -> CoreResult<Option<Money>> {
        match self.cost_per_unit {
            Some(cost) => {
                let value = round_half_up(cost.to_decimal() * self.stock_level, 2);
                Ok(Some(Money::from_decimal(value)?))
            }
            None => Ok(None),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flour() -> Ingredient {
        Ingredient::new("Flour", UnitOfMeasure::Kilogram).unwrap()
    }

    #[test]
    fn test_new_rejects_blank_name() {
        assert!(Ingredient::new("  ", UnitOfMeasure::Gram).is_err());
    }

    #[test]
    fn test_add_stock_stamps_restock_time() {
        let mut ing = flour();
        assert!(ing.last_restocked().is_none());

        let stock = ing.add_stock(dec!(2.5)).unwrap();
        assert_eq!(stock, dec!(2.5));
        assert!(ing.last_restocked().is_some());
    }

    #[test]
    fn test_add_stock_rejects_non_positive() {
        let mut ing = flour();
        assert!(ing.add_stock(dec!(0)).is_err());
        assert!(ing.add_stock(dec!(-1)).is_err());
        assert_eq!(ing.stock_level(), Decimal::ZERO);
        assert!(ing.last_restocked().is_none());
    }

    #[test]
    fn test_add_stock_overflow_leaves_stock() {
        let mut ing = flour();
        ing.add_stock(Decimal::MAX).unwrap();
        let restocked = ing.last_restocked();

        let err = ing.add_stock(Decimal::ONE).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
        assert_eq!(ing.stock_level(), Decimal::MAX);
        assert_eq!(ing.last_restocked(), restocked);
    }

    #[test]
    fn test_remove_more_than_available_leaves_stock() {
        let mut ing = flour();
        ing.add_stock(dec!(2)).unwrap();

        let err = ing.remove_stock(dec!(3)).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(ing.stock_level(), dec!(2));

        assert!(ing.remove_stock(dec!(0)).is_err());
        assert_eq!(ing.remove_stock(dec!(2)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_add_then_remove_round_trip_keeps_restock_stamp() {
        let mut ing = flour();
        ing.add_stock(dec!(4)).unwrap();

        let stamped = Utc::now() - chrono::Duration::days(1);
        ing.add_stock_at(dec!(1.25), stamped).unwrap();
        ing.remove_stock(dec!(1.25)).unwrap();

        assert_eq!(ing.stock_level(), dec!(4));
        assert_eq!(ing.last_restocked(), Some(stamped));
    }

    #[test]
    fn test_needs_reordering() {
        let mut ing = flour();
        ing.add_stock(dec!(5)).unwrap();
        assert!(!ing.needs_reordering());

        ing.reorder_threshold = Some(dec!(5));
        assert!(ing.needs_reordering());

        ing.reorder_threshold = Some(dec!(4.99));
        assert!(!ing.needs_reordering());
    }

    #[test]
    fn test_stock_value() {
        let mut ing = flour();
        assert!(ing.stock_value().unwrap().is_none());

        ing.cost_per_unit = Some(Money::from_cents(133));
        ing.add_stock(dec!(2.5)).unwrap();
        // 1.33 × 2.5 = 3.325 → 3.33
        assert_eq!(ing.stock_value().unwrap(), Some(Money::from_cents(333)));
    }

    #[test]
    fn test_unit_abbreviation() {
        assert_eq!(UnitOfMeasure::Tablespoon.to_string(), "tbsp");
        assert_eq!(UnitOfMeasure::default(), UnitOfMeasure::Each);
    }
}
