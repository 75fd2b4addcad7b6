//! # cafe-core: Domain Model for the Café Ordering System
//!
//! This crate holds the café's business rules: catalog, stock, orders,
//! discounts, payment and loyalty. Everything here is pure domain logic with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Café Ordering Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Caller (API layer, seed tool, tests)            │   │
//! │  │      load aggregate ──► call operation ──► save aggregate       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cafe-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ catalog   │  │   order   │  │  loyalty  │  │   user    │  │   │
//! │  │   │ Product   │  │  Order    │  │  Program  │  │   Role    │  │   │
//! │  │   │ Ingredient│  │ OrderItem │  │   Tier    │  │ Principal │  │   │
//! │  │   │ Category  │  │  Money    │  │ Customer  │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO LOCKS                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cafe-db (Persistence Layer)                  │   │
//! │  │      ids, uniqueness, version checks, order numbers, audit      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic and half-up rounding
//! - [`types`] - Shared enums, audit info and the [`Entity`] trait
//! - [`ingredient`] / [`product`] / [`category`] - The catalog
//! - [`order_item`] / [`order`] / [`order_number`] - Orders and their totals
//! - [`customer`] / [`loyalty`] - Customers and points
//! - [`user`] - Staff accounts and authorities
//! - [`error`] / [`validation`] - Typed errors and input checks
//!
//! ## Design Principles
//!
//! 1. **Validate, then mutate**: an operation that fails changes nothing
//! 2. **No stale totals**: order amounts are recomputed before any mutation returns
//! 3. **Integer Money**: all monetary values are in cents (i64)
//! 4. **Ids, not pointers**: aggregates reference each other by id
//!
//! ## Example Usage
//!
//! ```rust
//! use cafe_core::money::Money;
//! use cafe_core::ORDER_TAX_RATE;
//!
//! let price = Money::from_cents(1099); // $10.99
//!
//! // $10.99 × 10% = $1.099 → $1.10
//! let tax = price.calculate_tax(ORDER_TAX_RATE);
//! assert_eq!(tax.cents(), 110);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod category;
pub mod customer;
pub mod error;
pub mod ingredient;
pub mod loyalty;
pub mod money;
pub mod order;
pub mod order_item;
pub mod order_number;
pub mod product;
pub mod types;
pub mod user;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use category::{Category, CategoryTree};
pub use customer::Customer;
pub use error::{CoreError, CoreResult, ValidationError};
pub use ingredient::{Ingredient, UnitOfMeasure};
pub use loyalty::{LoyaltyProgram, Tier};
pub use money::Money;
pub use order::Order;
pub use order_item::OrderItem;
pub use product::{IngredientSummary, Product};
pub use types::*;
pub use user::{Role, RoleName, User, UserPrincipal};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Flat order tax: 10%.
///
/// Not configurable in the core; every order uses it.
pub const ORDER_TAX_RATE: TaxRate = TaxRate::from_bps(1000);
