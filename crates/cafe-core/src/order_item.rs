//! # Order Items
//!
//! A priced order line. Uses the snapshot pattern: the product's name and
//! price are frozen when the line is created, so later catalog changes never
//! touch existing orders.
//!
//! ## Line Math
//! ```text
//! base     = unit_price × quantity
//! subtotal = base − discount          (0 ≤ discount ≤ base)
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::product::Product;
use crate::validation::validate_quantity;

/// A line in an [`Order`](crate::order::Order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    /// Order-local key, stable while the line exists.
    pub(crate) line_no: u32,

    /// Persistence id of the line, assigned by the store.
    pub id: Option<i64>,

    pub(crate) product_id: i64,

    /// Product name at time of ordering (frozen).
    pub(crate) product_name: String,

    pub(crate) quantity: i32,

    /// Product price at time of ordering (frozen).
    pub(crate) unit_price: Money,

    pub special_instructions: Option<String>,

    pub(crate) prepared: bool,

    pub(crate) discount_amount: Money,

    pub(crate) discount_reason: Option<String>,
}

impl OrderItem {
    /// Creates a line for `quantity` units of `product` at its current price.
    ///
    /// ## Errors
    /// - product has not been saved (no id)
    /// - quantity ≤ 0
    pub fn new(
        line_no: u32,
        product: &Product,
        quantity: i32,
        special_instructions: Option<String>,
    ) -> CoreResult<Self> {
        let product_id = product.id.ok_or_else(|| ValidationError::Required {
            field: "product id".to_string(),
        })?;
        validate_quantity("quantity", quantity)?;

        Ok(OrderItem {
            line_no,
            id: None,
            product_id,
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
            special_instructions,
            prepared: false,
            discount_amount: Money::zero(),
            discount_reason: None,
        })
    }

    pub fn line_no(&self) -> u32 {
        self.line_no
    }

    pub fn product_id(&self) -> i64 {
        self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn discount_amount(&self) -> Money {
        self.discount_amount
    }

    pub fn discount_reason(&self) -> Option<&str> {
        self.discount_reason.as_deref()
    }

    /// `unit_price × quantity`, before any discount.
    pub fn base_amount(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// `base_amount − discount_amount`.
    pub fn subtotal(&self) -> Money {
        self.base_amount() - self.discount_amount
    }

    /// Discounts `pct` percent of the base amount, rounded half-up.
    ///
    /// Returns the discount applied.
    pub fn apply_percentage_discount(
        &mut self,
        pct: Decimal,
        reason: impl Into<String>,
    ) -> CoreResult<Money> {
        let discount = self.base_amount().percentage(pct)?;

        self.discount_amount = discount;
        self.discount_reason = Some(reason.into());
        Ok(discount)
    }

    /// Discounts a fixed amount.
    ///
    /// ## Errors
    /// - amount is negative
    /// - amount exceeds the base amount (discount left unchanged)
    pub fn apply_fixed_discount(
        &mut self,
        amount: Money,
        reason: impl Into<String>,
    ) -> CoreResult<Money> {
        if amount.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: "discount".to_string(),
            }
            .into());
        }

        let base = self.base_amount();
        if amount > base {
            return Err(CoreError::DiscountExceedsBase {
                target: "item",
                discount: amount.to_string(),
                base: base.to_string(),
            });
        }

        self.discount_amount = amount;
        self.discount_reason = Some(reason.into());
        Ok(amount)
    }

    /// Clears the discount and its reason.
    pub fn remove_discount(&mut self) {
        self.discount_amount = Money::zero();
        self.discount_reason = None;
    }

    /// One-way: there is no "unprepare".
    pub fn mark_as_prepared(&mut self) {
        self.prepared = true;
    }

    /// Changes the quantity, clamping the discount to the new base amount.
    pub(crate) fn set_quantity(&mut self, quantity: i32) {
        self.quantity = quantity;

        let base = self.base_amount();
        if self.discount_amount > base {
            self.discount_amount = base;
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

    fn item(price_cents: i64, qty: i32) -> OrderItem {
        let mut product = Product::new("Scone", Money::from_cents(price_cents)).unwrap();
        product.id = Some(7);
        OrderItem::new(1, &product, qty, None).unwrap()
    }

    #[test]
    fn test_new_snapshots_product() {
        let mut product = Product::new("Scone", Money::from_cents(275)).unwrap();
        product.id = Some(7);
        let line = OrderItem::new(1, &product, 2, Some("warm".into())).unwrap();

        product.price = Money::from_cents(999);
        product.name = "Big Scone".to_string();

        assert_eq!(line.unit_price(), Money::from_cents(275));
        assert_eq!(line.product_name(), "Scone");
        assert_eq!(line.subtotal(), Money::from_cents(550));
        assert!(!line.is_prepared());
    }

    #[test]
    fn test_new_rejects_bad_input() {
        let product = Product::new("Scone", Money::from_cents(275)).unwrap();
        assert!(OrderItem::new(1, &product, 1, None).is_err());

        let mut saved = product.clone();
        saved.id = Some(1);
        assert!(OrderItem::new(1, &saved, 0, None).is_err());
    }

    #[test]
    fn test_percentage_discount_rounds_half_up() {
        let mut line = item(333, 3); // base 9.99
        // 9.99 × 15% = 1.4985 → 1.50
        let d = line.apply_percentage_discount(dec!(15), "HAPPY_HOUR").unwrap();
        assert_eq!(d, Money::from_cents(150));
        assert_eq!(line.subtotal(), Money::from_cents(849));
        assert_eq!(line.discount_reason(), Some("HAPPY_HOUR"));

        assert!(line.apply_percentage_discount(dec!(0), "x").is_err());
        assert!(line.apply_percentage_discount(dec!(101), "x").is_err());
        assert_eq!(line.discount_amount(), Money::from_cents(150));
    }

    #[test]
    fn test_fixed_discount_cannot_exceed_base() {
        let mut line = item(500, 2); // base 10.00

        let err = line
            .apply_fixed_discount(Money::from_cents(1500), "too much")
            .unwrap_err();
        assert!(matches!(err, CoreError::DiscountExceedsBase { .. }));
        assert_eq!(line.discount_amount(), Money::zero());
        assert!(line.discount_reason().is_none());

        line.apply_fixed_discount(Money::from_cents(1000), "free").unwrap();
        assert_eq!(line.subtotal(), Money::zero());

        assert!(line.apply_fixed_discount(Money::from_cents(-1), "neg").is_err());
    }

    #[test]
    fn test_remove_discount_and_prepare() {
        let mut line = item(500, 1);
        line.apply_fixed_discount(Money::from_cents(100), "staff").unwrap();
        line.remove_discount();
        assert_eq!(line.discount_amount(), Money::zero());
        assert!(line.discount_reason().is_none());

        line.mark_as_prepared();
        assert!(line.is_prepared());
    }

    #[test]
    fn test_lower_quantity_clamps_discount() {
        let mut line = item(500, 3);
        line.apply_fixed_discount(Money::from_cents(1200), "promo").unwrap();

        line.set_quantity(2);
        assert_eq!(line.discount_amount(), Money::from_cents(1000));
        assert_eq!(line.subtotal(), Money::zero());
    }
}
