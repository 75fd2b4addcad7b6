//! # Order Repository
//!
//! Orders keyed by id, with a unique order number and a per-customer index.
//!
//! ## Order Numbering
//! ```text
//! first save of an unnumbered order
//!      │
//!      ├── generate YYYYMMDD-XXXX from the order date
//!      ├── taken? try again (bounded by `order_number_attempts`)
//!      │          └── all taken → OrderNumberExhausted, nothing stored
//!      └── Order::assign_order_number → stored
//!
//! later saves keep the number untouched
//! ```

use std::collections::{BTreeMap, BTreeSet};

use cafe_core::{order_number, Order};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::{Table, UniqueIndex};
use crate::error::{DbError, DbResult};

/// Produces candidate order numbers for a business date.
pub type NumberSource = fn(NaiveDate) -> String;

#[derive(Debug, Clone)]
pub struct OrderRepository {
    table: Table<Order>,
    numbers: UniqueIndex,
    by_customer: BTreeMap<i64, BTreeSet<i64>>,
    attempts: u32,
    number_source: NumberSource,
}

impl OrderRepository {
    pub fn new(actor: impl Into<String>, attempts: u32) -> Self {
        OrderRepository {
            table: Table::new(actor),
            numbers: UniqueIndex::new("order number"),
            by_customer: BTreeMap::new(),
            attempts,
            number_source: order_number::generate,
        }
    }

    /// Replaces the order number generator. Mainly for tests.
    pub fn set_number_source(&mut self, source: NumberSource) {
        self.number_source = source;
    }

    /// Inserts or updates an order, numbering it on first save.
    ///
    /// ## Errors
    /// - `VersionConflict` if `order` is a stale copy
    /// - `UniqueViolation` if a caller-assigned number is already taken
    /// - `OrderNumberExhausted` if no free number was found
    pub fn save(&mut self, order: &mut Order) -> DbResult<i64> {
        let old = self
            .table
            .check_version(order)?
            .map(|stored| (stored.order_number().map(str::to_string), stored.customer_id));

        // Caller-assigned numbers are checked like generated ones.
        self.numbers.ensure_free(order.order_number(), order.id)?;
        if order.order_number().is_none() {
            let number = self.free_number(order.order_date.date_naive())?;
            order.assign_order_number(number)?;
        }

        let id = self.table.write(order);

        let (old_number, old_customer) = old.clone().unzip();
        self.numbers
            .replace(old_number.flatten().as_deref(), order.order_number(), id);
        self.unindex_customer(old_customer.flatten(), id);
        if let Some(customer) = order.customer_id {
            self.by_customer.entry(customer).or_default().insert(id);
        }

        if old.is_none() {
            info!(
                id,
                number = order.order_number().unwrap_or_default(),
                customer = ?order.customer_id,
                total = %order.total_amount(),
                "Order created"
            );
        } else {
            debug!(id, version = order.version, status = %order.status(), "Order updated");
        }
        Ok(id)
    }

    fn free_number(&self, date: NaiveDate) -> DbResult<String> {
        for attempt in 1..=self.attempts {
            let candidate = (self.number_source)(date);
            if self.numbers.get(&candidate).is_none() {
                return Ok(candidate);
            }
            debug!(attempt, number = %candidate, "Order number taken, retrying");
        }

        warn!(attempts = self.attempts, "No free order number");
        Err(DbError::OrderNumberExhausted {
            attempts: self.attempts,
        })
    }

    fn unindex_customer(&mut self, customer: Option<i64>, id: i64) {
        if let Some(customer) = customer {
            if let Some(ids) = self.by_customer.get_mut(&customer) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.by_customer.remove(&customer);
                }
            }
        }
    }

    pub fn get(&self, id: i64) -> Option<&Order> {
        self.table.get(id)
    }

    pub fn load(&self, id: i64) -> DbResult<Order> {
        self.table.load(id)
    }

    pub fn find_by_number(&self, number: &str) -> Option<&Order> {
        self.numbers.get(number).and_then(|id| self.table.get(id))
    }

    /// A customer's orders, oldest first.
    pub fn list_for_customer(&self, customer_id: i64) -> Vec<&Order> {
        self.by_customer
            .get(&customer_id)
            .map(|ids| ids.iter().filter_map(|id| self.table.get(*id)).collect())
            .unwrap_or_default()
    }

    pub fn list(&self) -> impl Iterator<Item = &Order> {
        self.table.iter()
    }

    pub fn count(&self) -> usize {
        self.table.len()
    }

    pub fn delete(&mut self, id: i64) -> DbResult<Order> {
        let removed = self.table.remove(id)?;
        self.numbers.remove(removed.order_number(), id);
        self.unindex_customer(removed.customer_id, id);
        info!(id, "Order deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cafe_core::{Customer, Money, OrderStatus, Product};

    fn fixed_number(date: NaiveDate) -> String {
        format!("{}-AAAA", date.format("%Y%m%d"))
    }

    fn order_with_latte() -> Order {
        let mut latte = Product::new("Latte", Money::from_cents(450)).unwrap();
        latte.id = Some(1);
        let mut order = Order::new();
        order.add_item(&latte, 2, None).unwrap();
        order
    }

    #[test]
    fn test_number_assigned_once() {
        let mut repo = OrderRepository::new("test", 10);
        let mut order = order_with_latte();
        repo.save(&mut order).unwrap();

        let number = order.order_number().unwrap().to_string();
        assert!(order_number::is_valid(&number));

        order.update_status(OrderStatus::Cancelled);
        repo.save(&mut order).unwrap();
        assert_eq!(order.order_number(), Some(number.as_str()));
        assert_eq!(order.version, 2);
        assert_eq!(repo.find_by_number(&number).unwrap().status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_exhausted_numbers() {
        let mut repo = OrderRepository::new("test", 3);
        repo.set_number_source(fixed_number);
        repo.save(&mut order_with_latte()).unwrap();

        let mut second = order_with_latte();
        second.order_date = repo.get(1).unwrap().order_date;
        let err = repo.save(&mut second).unwrap_err();
        assert!(matches!(err, DbError::OrderNumberExhausted { attempts: 3 }));
        assert!(second.id.is_none());
        assert!(second.order_number().is_none());
        assert_eq!(repo.count(), 1);
    }

    #[test]
    fn test_preassigned_number_must_be_free() {
        let mut repo = OrderRepository::new("test", 10);
        let mut first = order_with_latte();
        first.assign_order_number("20261019-AAAA").unwrap();
        repo.save(&mut first).unwrap();

        let mut second = order_with_latte();
        second.assign_order_number("20261019-AAAA").unwrap();
        let err = repo.save(&mut second).unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert!(second.id.is_none());
        assert_eq!(repo.count(), 1);
        assert_eq!(repo.find_by_number("20261019-AAAA").unwrap().id, first.id);

        // The owner can still be saved with its own number.
        first.notes = Some("window seat".to_string());
        repo.save(&mut first).unwrap();
        assert_eq!(repo.find_by_number("20261019-AAAA").unwrap().version, 2);
    }

    #[test]
    fn test_list_for_customer() {
        let mut repo = OrderRepository::new("test", 10);
        let mut customer = Customer::new("Ana", "Tester").unwrap();
        customer.id = Some(7);

        let mut a = Order::for_customer(&customer);
        let mut b = Order::for_customer(&customer);
        repo.save(&mut a).unwrap();
        repo.save(&mut Order::new()).unwrap();
        repo.save(&mut b).unwrap();

        let ids: Vec<Option<i64>> = repo.list_for_customer(7).into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![Some(1), Some(3)]);

        repo.delete(1).unwrap();
        assert_eq!(repo.list_for_customer(7).len(), 1);
        assert!(repo.list_for_customer(8).is_empty());
    }
}
