//! # Ingredient Repository
//!
//! Ingredients keyed by id, with a unique name index.

use cafe_core::Ingredient;
use tracing::{debug, info};

use super::{Table, UniqueIndex};
use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct IngredientRepository {
    table: Table<Ingredient>,
    names: UniqueIndex,
}

impl IngredientRepository {
    pub fn new(actor: impl Into<String>) -> Self {
        IngredientRepository {
            table: Table::new(actor),
            names: UniqueIndex::new("ingredient name"),
        }
    }

    /// Inserts or updates an ingredient.
    ///
    /// ## Errors
    /// - `VersionConflict` if `ingredient` is a stale copy
    /// - `UniqueViolation` if another ingredient has the same name
    pub fn save(&mut self, ingredient: &mut Ingredient) -> DbResult<i64> {
        let old_name = self
            .table
            .check_version(ingredient)?
            .map(|stored| stored.name.clone());
        self.names
            .ensure_free(Some(ingredient.name.as_str()), ingredient.id)?;

        let id = self.table.write(ingredient);
        self.names
            .replace(old_name.as_deref(), Some(ingredient.name.as_str()), id);

        if old_name.is_none() {
            info!(id, name = %ingredient.name, "Ingredient created");
        } else {
            debug!(id, version = ingredient.version, stock = %ingredient.stock_level(), "Ingredient updated");
        }
        Ok(id)
    }

    pub fn get(&self, id: i64) -> Option<&Ingredient> {
        self.table.get(id)
    }

    pub fn load(&self, id: i64) -> DbResult<Ingredient> {
        self.table.load(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Ingredient> {
        self.names.get(name).and_then(|id| self.table.get(id))
    }

    pub fn list(&self) -> impl Iterator<Item = &Ingredient> {
        self.table.iter()
    }

    /// Ingredients at or below their reorder threshold.
    pub fn needing_reorder(&self) -> Vec<&Ingredient> {
        self.table.iter().filter(|i| i.needs_reordering()).collect()
    }

    pub fn count(&self) -> usize {
        self.table.len()
    }

    /// Deletes an ingredient. Products keep their snapshot of it.
    pub fn delete(&mut self, id: i64) -> DbResult<Ingredient> {
        let removed = self.table.remove(id)?;
        self.names.remove(Some(removed.name.as_str()), id);
        info!(id, name = %removed.name, "Ingredient deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use cafe_core::UnitOfMeasure;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unique_name() {
        let mut repo = IngredientRepository::new("test");
        let mut milk = Ingredient::new("Milk", UnitOfMeasure::Liter).unwrap();
        repo.save(&mut milk).unwrap();

        let mut dup = Ingredient::new("Milk", UnitOfMeasure::Milliliter).unwrap();
        assert!(matches!(
            repo.save(&mut dup).unwrap_err(),
            DbError::UniqueViolation { .. }
        ));
        assert!(dup.id.is_none());

        // Renaming frees the old name.
        milk.name = "Whole Milk".to_string();
        repo.save(&mut milk).unwrap();
        repo.save(&mut dup).unwrap();
        assert_eq!(repo.find_by_name("Milk").unwrap().id, dup.id);
        assert_eq!(repo.count(), 2);
    }

    #[test]
    fn test_needing_reorder() {
        let mut repo = IngredientRepository::new("test");
        let mut beans = Ingredient::new("Coffee Beans", UnitOfMeasure::Kilogram).unwrap();
        beans.reorder_threshold = Some(dec!(2));
        beans.add_stock(dec!(1.5)).unwrap();
        repo.save(&mut beans).unwrap();

        let mut sugar = Ingredient::new("Sugar", UnitOfMeasure::Kilogram).unwrap();
        sugar.reorder_threshold = Some(dec!(1));
        sugar.add_stock(dec!(5)).unwrap();
        repo.save(&mut sugar).unwrap();

        let low: Vec<&str> = repo.needing_reorder().into_iter().map(|i| i.name.as_str()).collect();
        assert_eq!(low, vec!["Coffee Beans"]);
    }

    #[test]
    fn test_delete_releases_name() {
        let mut repo = IngredientRepository::new("test");
        let mut oats = Ingredient::new("Oats", UnitOfMeasure::Gram).unwrap();
        let id = repo.save(&mut oats).unwrap();

        repo.delete(id).unwrap();
        assert!(repo.find_by_name("Oats").is_none());
        assert!(repo.load(id).is_err());
    }
}
