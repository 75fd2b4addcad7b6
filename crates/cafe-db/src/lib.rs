//! # cafe-db: Persistence Layer for the Café Ordering System
//!
//! This crate stores the aggregates defined in `cafe-core`. Storage is
//! in-process: each aggregate type lives in an id-keyed table with the
//! lookup indexes and unique constraints the domain needs.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Café Data Flow                                   │
//! │                                                                         │
//! │  Caller (till, seed binary, tests)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     cafe-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │   DbConfig   │  │   │
//! │  │   │  (store.rs)   │    │ (order.rs...) │    │ (config.rs)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ pay_order     │◄───│ Table<T>      │    │ cafe.toml    │  │   │
//! │  │   │ delete_cat... │    │ UniqueIndex   │    │ CAFE_* env   │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  cafe-core aggregates (Order, Customer, Product, ...)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Store configuration (TOML file + environment)
//! - [`error`] - Persistence error types
//! - [`repository`] - One repository per aggregate
//! - [`store`] - The [`Database`] handle and cross-aggregate operations
//!
//! ## Usage
//!
//! ```rust
//! use cafe_core::{Money, Order, PaymentMethod, Product};
//! use cafe_db::Database;
//!
//! let mut db = Database::in_memory();
//!
//! let mut latte = Product::new("Latte", Money::from_cents(450)).unwrap();
//! db.products_mut().save(&mut latte).unwrap();
//!
//! let mut order = Order::new();
//! order.add_item(&latte, 2, None).unwrap();
//! let id = db.orders_mut().save(&mut order).unwrap();
//!
//! let paid = db.pay_order(id, PaymentMethod::Cash, "R-1").unwrap();
//! assert!(paid.order_number().is_some());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::DbConfig;
pub use error::{DbError, DbResult};
pub use store::Database;

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::customer::CustomerRepository;
pub use repository::ingredient::IngredientRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::user::UserRepository;
