//! # Product Repository
//!
//! Products keyed by id, with a unique barcode index and a category index.
//!
//! ## Indexes
//! ```text
//! barcodes:    "5901234123457" ──► product id
//! by_category: category id     ──► {product ids}
//! ```

use std::collections::{BTreeMap, BTreeSet};

use cafe_core::Product;
use tracing::{debug, info};

use super::{Table, UniqueIndex};
use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct ProductRepository {
    table: Table<Product>,
    barcodes: UniqueIndex,
    by_category: BTreeMap<i64, BTreeSet<i64>>,
}

impl ProductRepository {
    pub fn new(actor: impl Into<String>) -> Self {
        ProductRepository {
            table: Table::new(actor),
            barcodes: UniqueIndex::new("barcode"),
            by_category: BTreeMap::new(),
        }
    }

    /// Inserts or updates a product.
    ///
    /// ## Errors
    /// - `VersionConflict` if `product` is a stale copy
    /// - `UniqueViolation` if another product has the same barcode
    pub fn save(&mut self, product: &mut Product) -> DbResult<i64> {
        let old = self
            .table
            .check_version(product)?
            .map(|stored| (stored.barcode.clone(), stored.category_id));
        self.barcodes
            .ensure_free(product.barcode.as_deref(), product.id)?;

        let id = self.table.write(product);

        let (old_barcode, old_category) = old.clone().unwrap_or_default();
        self.barcodes
            .replace(old_barcode.as_deref(), product.barcode.as_deref(), id);
        self.unindex_category(old_category, id);
        if let Some(category) = product.category_id {
            self.by_category.entry(category).or_default().insert(id);
        }

        if old.is_none() {
            info!(id, name = %product.name, price = %product.price, "Product created");
        } else {
            debug!(id, version = product.version, stock = product.stock_level(), "Product updated");
        }
        Ok(id)
    }

    fn unindex_category(&mut self, category: Option<i64>, id: i64) {
        if let Some(category) = category {
            if let Some(ids) = self.by_category.get_mut(&category) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.by_category.remove(&category);
                }
            }
        }
    }

    pub fn get(&self, id: i64) -> Option<&Product> {
        self.table.get(id)
    }

    pub fn load(&self, id: i64) -> DbResult<Product> {
        self.table.load(id)
    }

    pub fn find_by_barcode(&self, barcode: &str) -> Option<&Product> {
        self.barcodes.get(barcode).and_then(|id| self.table.get(id))
    }

    /// Products filed under `category_id`, by id.
    pub fn list_by_category(&self, category_id: i64) -> Vec<&Product> {
        self.by_category
            .get(&category_id)
            .map(|ids| ids.iter().filter_map(|id| self.table.get(*id)).collect())
            .unwrap_or_default()
    }

    /// Products that can be sold right now.
    pub fn list_available(&self) -> Vec<&Product> {
        self.table.iter().filter(|p| p.is_available()).collect()
    }

    pub fn needing_reorder(&self) -> Vec<&Product> {
        self.table.iter().filter(|p| p.needs_reordering()).collect()
    }

    pub fn list(&self) -> impl Iterator<Item = &Product> {
        self.table.iter()
    }

    pub fn count(&self) -> usize {
        self.table.len()
    }

    pub fn delete(&mut self, id: i64) -> DbResult<Product> {
        let removed = self.table.remove(id)?;
        self.barcodes.remove(removed.barcode.as_deref(), id);
        self.unindex_category(removed.category_id, id);
        info!(id, name = %removed.name, "Product deleted");
        Ok(removed)
    }
}
