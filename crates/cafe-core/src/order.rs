//! # Orders
//!
//! The order aggregate: its lines, the monetary engine that keeps totals in
//! step with them, payment, and the status machine.
//!
//! ## Monetary Engine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Totals                                     │
//! │                                                                         │
//! │  items ──► Σ item.subtotal() ──► subtotal                              │
//! │                                    │                                    │
//! │                                    ├──► tax = subtotal × 10% (half-up) │
//! │                                    │                                    │
//! │  total = subtotal + tax − discount (order-level, ≤ subtotal)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Every operation that touches items or discounts recomputes all four
//! amounts before it returns. Callers never see stale totals.
//!
//! ## Mutability
//! Lines and discounts can only change while the order is `Created`. Once
//! paid, the order moves through the status machine only.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::customer::Customer;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::order_item::OrderItem;
use crate::order_number;
use crate::product::Product;
use crate::types::{impl_entity, AuditInfo, OrderStatus, PaymentMethod};
use crate::ORDER_TAX_RATE;

// =============================================================================
// Order
// =============================================================================

/// A customer order.
///
/// ## Identity
/// - `id` is assigned by the store on first save
/// - `order_number` is assigned once, at first save, and never changes
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: Option<i64>,

    order_number: Option<String>,

    /// Ordering customer, if any.
    pub customer_id: Option<i64>,

    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,

    status: OrderStatus,

    items: Vec<OrderItem>,

    /// Last line number handed out; lines are never renumbered.
    next_line: u32,

    subtotal: Money,

    tax_amount: Money,

    total_amount: Money,

    discount_amount: Money,

    discount_reason: Option<String>,

    payment_method: Option<PaymentMethod>,

    payment_reference: Option<String>,

    #[ts(as = "Option<String>")]
    payment_date: Option<DateTime<Utc>>,

    pub notes: Option<String>,

    pub takeaway: bool,

    pub table_number: Option<i32>,

    loyalty_points_earned: i32,

    loyalty_points_used: i32,

    pub version: i64,

    pub audit: AuditInfo,
}

impl_entity!(Order, "order");

impl Default for Order {
    fn default() -> Self {
        Order::new()
    }
}

impl Order {
    /// An empty, unnumbered order in `Created`.
    pub fn new() -> Self {
        Order {
            id: None,
            order_number: None,
            customer_id: None,
            order_date: Utc::now(),
            status: OrderStatus::Created,
            items: Vec::new(),
            next_line: 0,
            subtotal: Money::zero(),
            tax_amount: Money::zero(),
            total_amount: Money::zero(),
            discount_amount: Money::zero(),
            discount_reason: None,
            payment_method: None,
            payment_reference: None,
            payment_date: None,
            notes: None,
            takeaway: false,
            table_number: None,
            loyalty_points_earned: 0,
            loyalty_points_used: 0,
            version: 0,
            audit: AuditInfo::default(),
        }
    }

    /// An empty order for `customer`.
    pub fn for_customer(customer: &Customer) -> Self {
        Order {
            customer_id: customer.id,
            ..Order::new()
        }
    }

    // -------------------------------------------------------------------------
    // Getters
    // -------------------------------------------------------------------------

    pub fn order_number(&self) -> Option<&str> {
        self.order_number.as_deref()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn item(&self, line: u32) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.line_no == line)
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn tax_amount(&self) -> Money {
        self.tax_amount
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn discount_amount(&self) -> Money {
        self.discount_amount
    }

    pub fn discount_reason(&self) -> Option<&str> {
        self.discount_reason.as_deref()
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.payment_reference.as_deref()
    }

    pub fn payment_date(&self) -> Option<DateTime<Utc>> {
        self.payment_date
    }

    pub fn loyalty_points_earned(&self) -> i32 {
        self.loyalty_points_earned
    }

    pub fn loyalty_points_used(&self) -> i32 {
        self.loyalty_points_used
    }

    /// Order number or a placeholder, for errors and logs.
    fn label(&self) -> String {
        self.order_number
            .clone()
            .unwrap_or_else(|| "(unnumbered)".to_string())
    }

    fn ensure_modifiable(&self) -> CoreResult<()> {
        if self.status != OrderStatus::Created {
            return Err(CoreError::OrderNotModifiable {
                order: self.label(),
                status: self.status.to_string(),
            });
        }
        Ok(())
    }

    fn line_mut(&mut self, line: u32) -> CoreResult<&mut OrderItem> {
        let order = self.label();
        self.items
            .iter_mut()
            .find(|i| i.line_no == line)
            .ok_or(CoreError::ItemNotFound { order, line })
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    /// Adds `quantity` units of `product` at its current price.
    ///
    /// Returns the new line.
    ///
    /// ## Errors
    /// - order already paid (`OrderNotModifiable`)
    /// - product has no id, or quantity ≤ 0
    pub fn add_item(
        &mut self,
        product: &Product,
        quantity: i32,
        special_instructions: Option<String>,
    ) -> CoreResult<&OrderItem> {
        self.ensure_modifiable()?;

        let line = self.next_line + 1;
        let item = OrderItem::new(line, product, quantity, special_instructions)?;

        self.next_line = line;
        self.items.push(item);
        self.recalculate_amounts();

        debug!(order = %self.label(), line, product_id = ?product.id, quantity, "Order item added");
        let last = self.items.len() - 1;
        Ok(&self.items[last])
    }

    /// Removes a line. Returns false if no such line exists.
    pub fn remove_item(&mut self, line: u32) -> CoreResult<bool> {
        self.ensure_modifiable()?;

        let Some(pos) = self.items.iter().position(|i| i.line_no == line) else {
            return Ok(false);
        };

        self.items.remove(pos);
        self.recalculate_amounts();

        debug!(order = %self.label(), line, "Order item removed");
        Ok(true)
    }

    /// Changes a line's quantity; a quantity ≤ 0 removes the line.
    ///
    /// Returns false if no such line exists.
    pub fn update_item_quantity(&mut self, line: u32, quantity: i32) -> CoreResult<bool> {
        if quantity <= 0 {
            return self.remove_item(line);
        }
        self.ensure_modifiable()?;

        let Some(item) = self.items.iter_mut().find(|i| i.line_no == line) else {
            return Ok(false);
        };

        item.set_quantity(quantity);
        self.recalculate_amounts();

        debug!(order = %self.label(), line, quantity, "Order item quantity updated");
        Ok(true)
    }

    /// Item-level percentage discount; totals are recomputed.
    pub fn apply_item_percentage_discount(
        &mut self,
        line: u32,
        pct: Decimal,
        reason: impl Into<String>,
    ) -> CoreResult<Money> {
        self.ensure_modifiable()?;

        let discount = self.line_mut(line)?.apply_percentage_discount(pct, reason)?;
        self.recalculate_amounts();
        Ok(discount)
    }

    /// Item-level fixed discount; totals are recomputed.
    pub fn apply_item_fixed_discount(
        &mut self,
        line: u32,
        amount: Money,
        reason: impl Into<String>,
    ) -> CoreResult<Money> {
        self.ensure_modifiable()?;

        let discount = self.line_mut(line)?.apply_fixed_discount(amount, reason)?;
        self.recalculate_amounts();
        Ok(discount)
    }

    pub fn remove_item_discount(&mut self, line: u32) -> CoreResult<()> {
        self.ensure_modifiable()?;

        self.line_mut(line)?.remove_discount();
        self.recalculate_amounts();
        Ok(())
    }

    /// Kitchen marks a line done. Allowed while the order is still active.
    pub fn mark_item_prepared(&mut self, line: u32) -> CoreResult<()> {
        if !self.status.is_active() {
            return Err(CoreError::InvalidOrderStatus {
                order: self.label(),
                status: self.status.to_string(),
                operation: "prepare items",
            });
        }

        self.line_mut(line)?.mark_as_prepared();

        debug!(order = %self.label(), line, progress = self.preparation_progress(), "Order item prepared");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Monetary Engine
    // -------------------------------------------------------------------------

    /// Recomputes subtotal, tax and total from the lines and the discount.
    ///
    /// An order-level discount larger than the new subtotal is clamped to it.
    pub fn recalculate_amounts(&mut self) {
        self.subtotal = self.items.iter().map(OrderItem::subtotal).sum();

        if self.discount_amount > self.subtotal {
            self.discount_amount = self.subtotal;
        }

        self.tax_amount = self.subtotal.calculate_tax(ORDER_TAX_RATE);
        self.total_amount = self.subtotal + self.tax_amount - self.discount_amount;
    }

    /// Order-level discount of `pct` percent of the subtotal.
    ///
    /// Returns the discount applied.
    pub fn apply_percentage_discount(
        &mut self,
        pct: Decimal,
        reason: impl Into<String>,
    ) -> CoreResult<Money> {
        self.ensure_modifiable()?;

        let discount = self.subtotal.percentage(pct)?;
        self.discount_amount = discount;
        self.discount_reason = Some(reason.into());
        self.recalculate_amounts();

        debug!(order = %self.label(), discount = %discount, "Order discount applied");
        Ok(self.discount_amount)
    }

    /// Order-level fixed discount.
    ///
    /// ## Errors
    /// - negative amount
    /// - amount greater than the subtotal (`DiscountExceedsBase`)
    pub fn apply_fixed_discount(
        &mut self,
        amount: Money,
        reason: impl Into<String>,
    ) -> CoreResult<Money> {
        self.ensure_modifiable()?;

        if amount.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: "discount".to_string(),
            }
            .into());
        }

        if amount > self.subtotal {
            return Err(CoreError::DiscountExceedsBase {
                target: "order subtotal",
                discount: amount.to_string(),
                base: self.subtotal.to_string(),
            });
        }

        self.discount_amount = amount;
        self.discount_reason = Some(reason.into());
        self.recalculate_amounts();

        debug!(order = %self.label(), discount = %amount, "Order discount applied");
        Ok(self.discount_amount)
    }

    pub fn remove_discount(&mut self) -> CoreResult<()> {
        self.ensure_modifiable()?;

        self.discount_amount = Money::zero();
        self.discount_reason = None;
        self.recalculate_amounts();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Payment & Status
    // -------------------------------------------------------------------------

    /// Takes payment and moves the order to `Paid`.
    ///
    /// When the order belongs to `customer`, the customer is enrolled and
    /// the method earns points, `floor(total)` points are credited.
    ///
    /// ## Errors
    /// - order is not `Created`
    /// - `customer` is not the order's customer, or is missing for an
    ///   order that has one (see [`Order::detach_customer`])
    ///
    /// Both are checked before anything is changed.
    pub fn process_payment(
        &mut self,
        method: PaymentMethod,
        reference: impl Into<String>,
        customer: Option<&mut Customer>,
    ) -> CoreResult<()> {
        if self.status != OrderStatus::Created {
            return Err(CoreError::InvalidOrderStatus {
                order: self.label(),
                status: self.status.to_string(),
                operation: "process payment",
            });
        }

        let supplied = customer.as_deref().map(|c| c.id);
        if let Some(supplied) = supplied {
            if self.customer_id.is_none() || supplied != self.customer_id {
                return Err(CoreError::CustomerMismatch {
                    expected: self.customer_id,
                    supplied,
                });
            }
        } else if self.customer_id.is_some() {
            return Err(CoreError::CustomerMismatch {
                expected: self.customer_id,
                supplied: None,
            });
        }

        let points = i32::try_from(self.total_amount.whole_units()).unwrap_or(i32::MAX);
        let program = customer.and_then(Customer::loyalty_program_mut);

        // Credit first: it is the only step that can still fail.
        let earned = match program {
            Some(program) if method.is_eligible_for_loyalty_points() && points > 0 => {
                program.add_points(points)?;
                points
            }
            _ => 0,
        };

        self.payment_method = Some(method);
        self.payment_reference = Some(reference.into());
        self.payment_date = Some(Utc::now());
        self.status = OrderStatus::Paid;
        self.loyalty_points_earned = earned;

        debug!(
            order = %self.label(),
            method = ?method,
            total = %self.total_amount,
            points = earned,
            "Order paid"
        );
        Ok(())
    }

    /// Drops the customer link of an unpaid order whose customer is gone.
    ///
    /// Returns the previous customer id.
    pub fn detach_customer(&mut self) -> CoreResult<Option<i64>> {
        self.ensure_modifiable()?;

        let previous = self.customer_id.take();
        debug!(order = %self.label(), customer = ?previous, "Customer detached");
        Ok(previous)
    }

    /// Moves the order to `new_status` if the status machine allows it.
    ///
    /// ## Rules (first match wins)
    /// 1. Finished orders only accept `Refunded`
    /// 2. `Cancelled` when the current status can cancel
    /// 3. `Refunded` when the current status can refund
    /// 4. Otherwise only the next status of the linear chain
    ///
    /// Returns false, leaving the order unchanged, on rejection.
    pub fn update_status(&mut self, new_status: OrderStatus) -> bool {
        let current = self.status;

        let accepted = if !current.can_progress() && new_status != OrderStatus::Refunded {
            false
        } else if new_status == OrderStatus::Cancelled && current.can_cancel() {
            true
        } else if new_status == OrderStatus::Refunded && current.can_refund() {
            true
        } else {
            current.next_status() == Some(new_status)
        };

        if accepted {
            self.status = new_status;
            debug!(order = %self.label(), from = %current, to = %new_status, "Order status changed");
        } else {
            debug!(order = %self.label(), from = %current, to = %new_status, "Order status change rejected");
        }
        accepted
    }

    /// Assigns the order number. Happens exactly once, at first save.
    pub fn assign_order_number(&mut self, number: impl Into<String>) -> CoreResult<()> {
        if let Some(existing) = &self.order_number {
            return Err(CoreError::OrderNumberAlreadyAssigned(existing.clone()));
        }

        let number = number.into();
        if !order_number::is_valid(&number) {
            return Err(ValidationError::InvalidFormat {
                field: "order_number".to_string(),
                reason: "expected YYYYMMDD-XXXX".to_string(),
            }
            .into());
        }

        self.order_number = Some(number);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Progress
    // -------------------------------------------------------------------------

    /// Sum of line quantities.
    pub fn total_item_count(&self) -> i32 {
        self.items.iter().map(OrderItem::quantity).sum()
    }

    /// False for an empty order.
    pub fn are_all_items_prepared(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(OrderItem::is_prepared)
    }

    /// Percentage of prepared lines, rounded down.
    pub fn preparation_progress(&self) -> u8 {
        if self.items.is_empty() {
            return 0;
        }
        let prepared = self.items.iter().filter(|i| i.is_prepared()).count();
        (prepared * 100 / self.items.len()) as u8
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
