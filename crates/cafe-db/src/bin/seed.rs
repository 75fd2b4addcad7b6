//! # Seed Data Generator
//!
//! Builds a demo café in an in-memory store and prints it as JSON.
//!
//! ## Usage
//! ```bash
//! # Seed the demo café with 3 paid orders (default)
//! cargo run -p cafe-db --bin seed
//!
//! # More orders, with a specific config file
//! cargo run -p cafe-db --bin seed -- --orders 10 --config ./cafe.toml
//!
//! # Verbose store logging
//! RUST_LOG=cafe_db=debug,cafe_core=debug cargo run -p cafe-db --bin seed
//! ```
//!
//! ## Generated Data
//! - Ingredients with stock and dietary flags
//! - A small category tree (Drinks → Hot Drinks, Bakery)
//! - Products built from the ingredients
//! - One loyalty customer and one staff user
//! - Paid orders for the customer, earning loyalty points

use std::env;
use std::path::PathBuf;

use cafe_core::{
    Category, Customer, Ingredient, Money, Order, PaymentMethod, Product, Role, RoleName,
    UnitOfMeasure, User,
};
use cafe_db::{Database, DbConfig};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// (name, unit, stock, allergen, vegetarian, vegan, gluten free)
const INGREDIENTS: &[(&str, UnitOfMeasure, i64, Option<&str>, bool, bool, bool)] = &[
    ("Espresso Beans", UnitOfMeasure::Kilogram, 5, None, true, true, true),
    ("Whole Milk", UnitOfMeasure::Liter, 20, Some("dairy"), true, false, true),
    ("Oat Milk", UnitOfMeasure::Liter, 10, None, true, true, false),
    ("Butter", UnitOfMeasure::Kilogram, 3, Some("dairy"), true, false, true),
    ("Wheat Flour", UnitOfMeasure::Kilogram, 10, Some("gluten"), true, true, false),
];

/// (name, price in cents, category, ingredient names, stock)
const PRODUCTS: &[(&str, i64, &str, &[&str], i32)] = &[
    ("Espresso", 280, "Hot Drinks", &["Espresso Beans"], 100),
    ("Latte", 450, "Hot Drinks", &["Espresso Beans", "Whole Milk"], 100),
    ("Oat Latte", 490, "Hot Drinks", &["Espresso Beans", "Oat Milk"], 100),
    ("Croissant", 320, "Bakery", &["Butter", "Wheat Flour"], 24),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut orders: usize = 3;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--orders" | "-o" => {
                if i + 1 < args.len() {
                    orders = args[i + 1].parse().unwrap_or(3);
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Café Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -o, --orders <N>     Number of paid orders to create (default: 3)");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = DbConfig::load(config_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut db = Database::new(config)?;
    let start = std::time::Instant::now();

    // Ingredients
    for (name, unit, stock, allergen, vegetarian, vegan, gluten_free) in INGREDIENTS {
        let mut ingredient = Ingredient::new(*name, *unit)?;
        ingredient.contains_allergens = allergen.is_some();
        ingredient.allergen_type = allergen.map(str::to_string);
        ingredient.vegetarian = *vegetarian;
        ingredient.vegan = *vegan;
        ingredient.gluten_free = *gluten_free;
        ingredient.reorder_threshold = Some(Decimal::ONE);
        ingredient.add_stock(Decimal::new(*stock, 0))?;
        db.ingredients_mut().save(&mut ingredient)?;
    }

    // Categories
    let mut drinks = Category::new("Drinks")?;
    let drinks_id = db.categories_mut().insert(&mut drinks, None)?;
    let mut hot = Category::new("Hot Drinks")?;
    db.categories_mut().insert(&mut hot, Some(drinks_id))?;
    let mut bakery = Category::new("Bakery")?;
    db.categories_mut().insert(&mut bakery, None)?;

    // Products
    for (name, price, category, ingredients, stock) in PRODUCTS {
        let mut product = Product::new(*name, Money::from_cents(*price))?;
        product.category_id = db.categories().find_by_name(category).and_then(|c| c.id);
        product.reorder_threshold = Some(5);
        for ingredient in *ingredients {
            if let Some(found) = db.ingredients().find_by_name(ingredient) {
                product.add_ingredient(found)?;
            }
        }
        product.calculate_dietary_attributes();
        product.restock_product(*stock)?;
        db.products_mut().save(&mut product)?;
    }

    // People
    let mut customer = Customer::new("Ada", "Lovelace")?.with_email("ada@example.com")?;
    customer.marketing_consent = true;
    customer.enroll_in_loyalty_program();
    let customer_id = db.customers_mut().save(&mut customer)?;

    let staff = Role::new(RoleName::Staff).with_description("Takes orders and serves customers");
    let mut barista = User::new("barista", "barista@cafe.example", "$argon2id$demo")?;
    barista.grant(&staff);
    db.users_mut().save(&mut barista)?;

    // Orders
    let menu: Vec<Product> = db.products().list_available().into_iter().cloned().collect();
    for n in 0..orders {
        if menu.is_empty() {
            break;
        }

        let mut order = Order::for_customer(&customer);
        let first = &menu[n % menu.len()];
        let second = &menu[(n + 1) % menu.len()];
        order.add_item(first, 1, None)?;
        order.add_item(second, 2, Some("to share".to_string()))?;
        if n % 2 == 1 {
            order.takeaway = true;
        }

        let order_id = db.orders_mut().save(&mut order)?;
        db.pay_order(order_id, PaymentMethod::CreditCard, format!("CARD-{:04}", n + 1))?;
    }

    let elapsed = start.elapsed();
    info!(orders, elapsed = ?elapsed, "Seed complete");

    let customer = db.customers().load(customer_id)?;
    let summary = json!({
        "categories": db.categories().tree().iter().collect::<Vec<_>>(),
        "products": db.products().list().collect::<Vec<_>>(),
        "customer": customer,
        "orders": db.orders().list().collect::<Vec<_>>(),
        "staff": db.users().list().collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
