//! # Database
//!
//! The store handle: one repository per aggregate plus the operations that
//! span more than one of them.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database (owned value, &mut self serializes writers)                   │
//! │                                                                         │
//! │   ingredients ─ products ─ categories ─ customers ─ orders ─ users     │
//! │                                                                         │
//! │  Cross-aggregate operations                                            │
//! │   delete_category  → categories (cascade) + products (detach)          │
//! │   pay_order        → orders + customers (loyalty credit)               │
//! │   is_category_visible → categories + products (read only)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use cafe_core::{Order, PaymentMethod};
use tracing::{debug, info};

use crate::config::DbConfig;
use crate::error::DbResult;
use crate::repository::category::CategoryRepository;
use crate::repository::customer::CustomerRepository;
use crate::repository::ingredient::IngredientRepository;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;
use crate::repository::user::UserRepository;

/// Main store handle providing repository access.
///
/// ## Example
/// ```rust
/// use cafe_core::Ingredient;
/// use cafe_core::UnitOfMeasure;
/// use cafe_db::Database;
///
/// let mut db = Database::in_memory();
/// let mut milk = Ingredient::new("Milk", UnitOfMeasure::Liter).unwrap();
/// db.ingredients_mut().save(&mut milk).unwrap();
/// assert_eq!(db.ingredients().count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    config: DbConfig,
    ingredients: IngredientRepository,
    products: ProductRepository,
    categories: CategoryRepository,
    customers: CustomerRepository,
    orders: OrderRepository,
    users: UserRepository,
}

impl Database {
    /// Creates an empty store from a validated configuration.
    pub fn new(config: DbConfig) -> DbResult<Self> {
        config.validate()?;

        let actor = config.audit_actor.as_str();
        let db = Database {
            ingredients: IngredientRepository::new(actor),
            products: ProductRepository::new(actor),
            categories: CategoryRepository::new(actor),
            customers: CustomerRepository::new(actor),
            orders: OrderRepository::new(actor, config.order_number_attempts),
            users: UserRepository::new(actor),
            config,
        };

        info!(
            actor = %db.config.audit_actor,
            order_number_attempts = db.config.order_number_attempts,
            "Store initialized"
        );
        Ok(db)
    }

    /// An empty store with [`DbConfig::in_memory`] settings (for tests).
    pub fn in_memory() -> Self {
        let config = DbConfig::in_memory();
        let actor = config.audit_actor.as_str();
        Database {
            ingredients: IngredientRepository::new(actor),
            products: ProductRepository::new(actor),
            categories: CategoryRepository::new(actor),
            customers: CustomerRepository::new(actor),
            orders: OrderRepository::new(actor, config.order_number_attempts),
            users: UserRepository::new(actor),
            config,
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Repositories
    // -------------------------------------------------------------------------

    pub fn ingredients(&self) -> &IngredientRepository {
        &self.ingredients
    }

    pub fn ingredients_mut(&mut self) -> &mut IngredientRepository {
        &mut self.ingredients
    }

    pub fn products(&self) -> &ProductRepository {
        &self.products
    }

    pub fn products_mut(&mut self) -> &mut ProductRepository {
        &mut self.products
    }

    pub fn categories(&self) -> &CategoryRepository {
        &self.categories
    }

    pub fn categories_mut(&mut self) -> &mut CategoryRepository {
        &mut self.categories
    }

    pub fn customers(&self) -> &CustomerRepository {
        &self.customers
    }

    pub fn customers_mut(&mut self) -> &mut CustomerRepository {
        &mut self.customers
    }

    pub fn orders(&self) -> &OrderRepository {
        &self.orders
    }

    pub fn orders_mut(&mut self) -> &mut OrderRepository {
        &mut self.orders
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    pub fn users_mut(&mut self) -> &mut UserRepository {
        &mut self.users
    }

    // -------------------------------------------------------------------------
    // Cross-aggregate operations
    // -------------------------------------------------------------------------

    /// Deletes a category subtree and detaches its products.
    ///
    /// Products survive with `category_id` cleared. Returns the ids of the
    /// deleted categories.
    pub fn delete_category(&mut self, id: i64) -> DbResult<Vec<i64>> {
        let removed: Vec<i64> = self
            .categories
            .delete(id)?
            .into_iter()
            .filter_map(|c| c.id)
            .collect();

        let mut detached = 0usize;
        for category in &removed {
            let product_ids: Vec<i64> = self
                .products
                .list_by_category(*category)
                .into_iter()
                .filter_map(|p| p.id)
                .collect();

            for product_id in product_ids {
                let mut product = self.products.load(product_id)?;
                product.category_id = None;
                self.products.save(&mut product)?;
                detached += 1;
            }
        }

        info!(id, categories = removed.len(), detached, "Category subtree deleted");
        Ok(removed)
    }

    /// Whether the category would show in the menu right now.
    ///
    /// Unknown ids are not visible.
    pub fn is_category_visible(&self, id: i64) -> bool {
        self.categories
            .get(id)
            .is_some_and(|c| c.is_visible(self.products.list_by_category(id)))
    }

    /// Pays a stored order, crediting the customer's loyalty points.
    ///
    /// ## Flow
    /// ```text
    /// load order ──► load its customer (if any; a deleted customer
    ///      │          is detached from the order)
    ///      ▼
    /// Order::process_payment ──► save order ──► save customer
    /// ```
    ///
    /// Returns the saved order.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown order id
    /// - `Core(InvalidOrderStatus)` if the order is not `Created`
    /// - `Core(OrderNotModifiable)` for a paid order whose customer was deleted
    pub fn pay_order(
        &mut self,
        order_id: i64,
        method: PaymentMethod,
        reference: impl Into<String>,
    ) -> DbResult<Order> {
        let mut order = self.orders.load(order_id)?;
        let mut customer = match order.customer_id {
            Some(customer_id) => self.customers.load(customer_id).ok(),
            None => None,
        };

        if order.customer_id.is_some() && customer.is_none() {
            let gone = order.detach_customer()?;
            debug!(order = order_id, customer = ?gone, "Customer no longer stored, paying without loyalty");
        }

        order.process_payment(method, reference, customer.as_mut())?;
        self.orders.save(&mut order)?;

        if let Some(customer) = customer.as_mut() {
            if order.loyalty_points_earned() > 0 {
                self.customers.save(customer)?;
            }
        }

        info!(
            order = order_id,
            number = order.order_number().unwrap_or_default(),
            total = %order.total_amount(),
            points = order.loyalty_points_earned(),
            "Order paid"
        );
        Ok(order)
    }
}

impl Default for Database {
    fn default() -> Self {
        Database::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use cafe_core::{Category, Money, Product};

    #[test]
    fn test_new_validates_config() {
        let err = Database::new(DbConfig::in_memory().order_number_attempts(0)).unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig(_)));

        let db = Database::new(DbConfig::in_memory().audit_actor("till-1")).unwrap();
        assert_eq!(db.config().audit_actor, "till-1");
    }

    #[test]
    fn test_category_visibility() {
        let mut db = Database::in_memory();
        let mut drinks = Category::new("Drinks").unwrap();
        let id = db.categories_mut().insert(&mut drinks, None).unwrap();
        assert!(!db.is_category_visible(id));

        let mut tea = Product::new("Tea", Money::from_cents(250)).unwrap();
        tea.category_id = Some(id);
        db.products_mut().save(&mut tea).unwrap();
        assert!(db.is_category_visible(id));

        tea.active = false;
        db.products_mut().save(&mut tea).unwrap();
        assert!(!db.is_category_visible(id));
        assert!(!db.is_category_visible(99));
    }

    #[test]
    fn test_pay_unknown_order() {
        let mut db = Database::in_memory();
        let err = db.pay_order(1, PaymentMethod::Cash, "R-1").unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
