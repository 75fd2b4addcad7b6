//! # Products
//!
//! Menu items: price, integer stock ledger, ingredient set and the dietary
//! flags derived from it.
//!
//! ## Derived Flags
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  contains_allergens  = ANY ingredient is an allergen                   │
//! │                        refreshed on every add/remove_ingredient        │
//! │                                                                         │
//! │  vegetarian / vegan  = ALL ingredients qualify                         │
//! │  gluten_free           refreshed ONLY by calculate_dietary_attributes  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The asymmetry is part of the contract: callers that change ingredients
//! and want fresh dietary flags must call `calculate_dietary_attributes`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ingredient::Ingredient;
use crate::money::Money;
use crate::types::{impl_entity, AuditInfo};
use crate::validation::{validate_name, validate_quantity};

// =============================================================================
// Ingredient Summary
// =============================================================================

/// The dietary profile of an ingredient as seen by the product that uses it.
///
/// Captured when the ingredient is added; adding the same ingredient again
/// refreshes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IngredientSummary {
    pub id: i64,
    pub name: String,
    pub contains_allergens: bool,
    pub allergen_type: Option<String>,
    pub vegetarian: bool,
    pub vegan: bool,
    pub gluten_free: bool,
}

impl IngredientSummary {
    fn from_ingredient(id: i64, ingredient: &Ingredient) -> Self {
        IngredientSummary {
            id,
            name: ingredient.name.clone(),
            contains_allergens: ingredient.contains_allergens,
            allergen_type: ingredient.allergen_type.clone(),
            vegetarian: ingredient.vegetarian,
            vegan: ingredient.vegan,
            gluten_free: ingredient.gluten_free,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A menu item that can be ordered.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: Option<i64>,

    pub name: String,

    pub description: Option<String>,

    /// Current menu price. Order items snapshot it at add-time.
    pub price: Money,

    pub active: bool,

    /// Many-to-one reference into the category tree.
    pub category_id: Option<i64>,

    /// Keyed by ingredient id.
    ingredients: BTreeMap<i64, IngredientSummary>,

    stock_level: i32,

    pub reorder_threshold: Option<i32>,

    contains_allergens: bool,
    vegetarian: bool,
    vegan: bool,
    gluten_free: bool,

    /// Unique across the catalog (enforced by the store).
    pub barcode: Option<String>,

    pub preparation_time_minutes: Option<u32>,

    pub version: i64,

    pub audit: AuditInfo,
}

impl_entity!(Product, "product");

impl Product {
    /// Creates an active product with no ingredients and no stock.
    ///
    /// ## Errors
    /// Blank name or negative price.
    pub fn new(name: impl Into<String>, price: Money) -> CoreResult<Self> {
        let name = name.into();
        validate_name("name", &name, 100)?;

        if price.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "price".to_string(),
                min: "0".to_string(),
                max: i64::MAX.to_string(),
            }
            .into());
        }

        Ok(Product {
            id: None,
            name,
            description: None,
            price,
            active: true,
            category_id: None,
            ingredients: BTreeMap::new(),
            stock_level: 0,
            reorder_threshold: None,
            contains_allergens: false,
            vegetarian: false,
            vegan: false,
            gluten_free: false,
            barcode: None,
            preparation_time_minutes: None,
            version: 0,
            audit: AuditInfo::default(),
        })
    }

    // =========================================================================
    // Ingredients & Dietary Flags
    // =========================================================================

    /// The ingredient set, ordered by ingredient id.
    pub fn ingredients(&self) -> impl Iterator<Item = &IngredientSummary> {
        self.ingredients.values()
    }

    pub fn has_ingredient(&self, ingredient_id: i64) -> bool {
        self.ingredients.contains_key(&ingredient_id)
    }

    /// Adds an ingredient and refreshes `contains_allergens`.
    ///
    /// Returns false if the ingredient was already present (its summary is
    /// refreshed either way). The ingredient must have been saved.
    pub fn add_ingredient(&mut self, ingredient: &Ingredient) -> CoreResult<bool> {
        let id = ingredient.id.ok_or_else(|| ValidationError::Required {
            field: "ingredient id".to_string(),
        })?;

        let added = self
            .ingredients
            .insert(id, IngredientSummary::from_ingredient(id, ingredient))
            .is_none();
        self.refresh_allergen_flag();

        debug!(product = %self.name, ingredient = %ingredient.name, added, "Ingredient attached");
        Ok(added)
    }

    /// Removes an ingredient and refreshes `contains_allergens`.
    pub fn remove_ingredient(&mut self, ingredient_id: i64) -> bool {
        let removed = self.ingredients.remove(&ingredient_id).is_some();
        if removed {
            self.refresh_allergen_flag();
        }
        removed
    }

    fn refresh_allergen_flag(&mut self) {
        self.contains_allergens = self.ingredients.values().any(|i| i.contains_allergens);
    }

    /// Recomputes vegetarian / vegan / gluten-free as "all ingredients qualify".
    ///
    /// With no ingredients every flag is vacuously true.
    pub fn calculate_dietary_attributes(&mut self) {
        self.vegetarian = self.ingredients.values().all(|i| i.vegetarian);
        self.vegan = self.ingredients.values().all(|i| i.vegan);
        self.gluten_free = self.ingredients.values().all(|i| i.gluten_free);
    }

    pub fn contains_allergens(&self) -> bool {
        self.contains_allergens
    }

    pub fn is_vegetarian(&self) -> bool {
        self.vegetarian
    }

    pub fn is_vegan(&self) -> bool {
        self.vegan
    }

    pub fn is_gluten_free(&self) -> bool {
        self.gluten_free
    }

    /// Distinct allergen types across the ingredient set.
    pub fn allergen_types(&self) -> BTreeSet<&str> {
        self.ingredients
            .values()
            .filter(|i| i.contains_allergens)
            .filter_map(|i| i.allergen_type.as_deref())
            .collect()
    }

    // =========================================================================
    // Stock
    // =========================================================================

    pub fn stock_level(&self) -> i32 {
        self.stock_level
    }

    /// Adds `amount` units of stock.
    ///
    /// ## Errors
    /// `amount` ≤ 0, or a total past `i32::MAX` (stock unchanged).
    pub fn restock_product(&mut self, amount: i32) -> CoreResult<i32> {
        validate_quantity("amount", amount)?;

        self.stock_level = self.stock_level.checked_add(amount).ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "amount".to_string(),
                min: "1".to_string(),
                max: (i32::MAX - self.stock_level).to_string(),
            }
        })?;

        debug!(product = %self.name, amount, stock = self.stock_level, "Product restocked");
        Ok(self.stock_level)
    }

    /// Removes `amount` units of stock; never below zero.
    pub fn reduce_stock(&mut self, amount: i32) -> CoreResult<i32> {
        validate_quantity("amount", amount)?;

        if amount > self.stock_level {
            return Err(CoreError::InsufficientStock {
                item: self.name.clone(),
                available: self.stock_level.to_string(),
                requested: amount.to_string(),
            });
        }

        self.stock_level -= amount;

        debug!(product = %self.name, amount, stock = self.stock_level, "Product stock reduced");
        Ok(self.stock_level)
    }

    /// True iff a threshold is configured and stock is at or below it.
    pub fn needs_reordering(&self) -> bool {
        self.reorder_threshold
            .is_some_and(|threshold| self.stock_level <= threshold)
    }

    /// Active, and either stock isn't tracked (no threshold) or some is left.
    pub fn is_available(&self) -> bool {
        self.active && (self.reorder_threshold.is_none() || self.stock_level > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredient::UnitOfMeasure;

    fn ingredient(id: i64, name: &str, allergen: bool, veg: bool, vegan: bool, gf: bool) -> Ingredient {
        let mut ing = Ingredient::new(name, UnitOfMeasure::Gram).unwrap();
        ing.id = Some(id);
        ing.contains_allergens = allergen;
        ing.vegetarian = veg;
        ing.vegan = vegan;
        ing.gluten_free = gf;
        ing
    }

    fn croissant() -> Product {
        Product::new("Croissant", Money::from_cents(320)).unwrap()
    }

    #[test]
    fn test_new_validates() {
        assert!(Product::new("", Money::from_cents(100)).is_err());
        assert!(Product::new("Tea", Money::from_cents(-1)).is_err());
        assert!(Product::new("Water", Money::zero()).is_ok());
    }

    #[test]
    fn test_allergen_flag_tracks_add_and_remove() {
        let mut p = croissant();
        let butter = ingredient(1, "Butter", true, true, false, true);
        let flour = ingredient(2, "Flour", false, true, true, false);

        p.add_ingredient(&flour).unwrap();
        assert!(!p.contains_allergens());

        p.add_ingredient(&butter).unwrap();
        assert!(p.contains_allergens());

        assert!(p.remove_ingredient(1));
        assert!(!p.contains_allergens());
        assert!(!p.remove_ingredient(1));
    }

    #[test]
    fn test_dietary_flags_need_explicit_recompute() {
        let mut p = croissant();
        let flour = ingredient(2, "Flour", false, true, true, false);
        let butter = ingredient(1, "Butter", true, true, false, true);

        p.add_ingredient(&flour).unwrap();
        p.add_ingredient(&butter).unwrap();
        assert!(!p.is_vegetarian());
        assert!(!p.is_vegan());
        assert!(!p.is_gluten_free());

        p.calculate_dietary_attributes();
        assert!(p.is_vegetarian());
        assert!(!p.is_vegan());
        assert!(!p.is_gluten_free());

        // Removing butter does not touch the dietary flags until recomputed.
        p.remove_ingredient(1);
        assert!(!p.is_vegan());
        p.calculate_dietary_attributes();
        assert!(p.is_vegan());
    }

    #[test]
    fn test_empty_ingredient_set_is_vacuously_dietary() {
        let mut p = croissant();
        p.calculate_dietary_attributes();
        assert!(p.is_vegetarian());
        assert!(p.is_vegan());
        assert!(p.is_gluten_free());
        assert!(!p.contains_allergens());
    }

    #[test]
    fn test_add_ingredient_twice_refreshes_summary() {
        let mut p = croissant();
        let mut milk = ingredient(3, "Milk", false, true, false, true);
        assert!(p.add_ingredient(&milk).unwrap());

        milk.contains_allergens = true;
        milk.allergen_type = Some("dairy".to_string());
        assert!(!p.add_ingredient(&milk).unwrap());
        assert!(p.contains_allergens());
        assert_eq!(p.allergen_types().into_iter().collect::<Vec<_>>(), vec!["dairy"]);
        assert_eq!(p.ingredients().count(), 1);
    }

    #[test]
    fn test_unsaved_ingredient_rejected() {
        let mut p = croissant();
        let ing = Ingredient::new("Sugar", UnitOfMeasure::Gram).unwrap();
        assert!(p.add_ingredient(&ing).is_err());
        assert_eq!(p.ingredients().count(), 0);
    }

    #[test]
    fn test_stock_never_negative() {
        let mut p = croissant();
        assert_eq!(p.restock_product(5).unwrap(), 5);
        assert!(p.restock_product(0).is_err());

        assert!(matches!(
            p.reduce_stock(6),
            Err(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(p.stock_level(), 5);
        assert!(p.reduce_stock(-1).is_err());
        assert_eq!(p.reduce_stock(5).unwrap(), 0);
    }

    #[test]
    fn test_restock_overflow_leaves_stock() {
        let mut p = croissant();
        p.restock_product(i32::MAX).unwrap();

        let err = p.restock_product(1).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
        assert_eq!(p.stock_level(), i32::MAX);
        assert!(p.is_available());
    }

    #[test]
    fn test_availability_and_reordering() {
        let mut p = croissant();
        // No threshold: stock is not tracked.
        assert!(p.is_available());
        assert!(!p.needs_reordering());

        p.reorder_threshold = Some(2);
        assert!(!p.is_available());
        assert!(p.needs_reordering());

        p.restock_product(3).unwrap();
        assert!(p.is_available());
        assert!(!p.needs_reordering());

        p.active = false;
        assert!(!p.is_available());
    }
}
