//! # Repository Module
//!
//! One repository per aggregate, all built on [`Table`].
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Save Flow (every repository)                         │
//! │                                                                         │
//! │  repo.save(&mut aggregate)                                             │
//! │       │                                                                 │
//! │       ├── 1. Table::check_version  (stale copy → VersionConflict)      │
//! │       ├── 2. UniqueIndex::ensure_free  (→ UniqueViolation)             │
//! │       │      nothing has been changed up to here                        │
//! │       ├── 3. Table::write  (id, version + 1, audit stamp, store copy)  │
//! │       └── 4. refresh lookup indexes                                    │
//! │                                                                         │
//! │  The caller's aggregate is updated in place with the new id/version,   │
//! │  so it can be saved again without reloading.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`IngredientRepository`](ingredient::IngredientRepository) - unique name
//! - [`ProductRepository`](product::ProductRepository) - unique barcode, by category
//! - [`CategoryRepository`](category::CategoryRepository) - the category tree
//! - [`CustomerRepository`](customer::CustomerRepository) - contacts, loyalty members
//! - [`OrderRepository`](order::OrderRepository) - order numbers, by customer
//! - [`UserRepository`](user::UserRepository) - staff accounts

use std::collections::{BTreeMap, HashMap};

use cafe_core::Entity;
use chrono::Utc;
use tracing::warn;

use crate::error::{DbError, DbResult};

pub mod category;
pub mod customer;
pub mod ingredient;
pub mod order;
pub mod product;
pub mod user;

// =============================================================================
// Table
// =============================================================================

/// Id-keyed rows of one aggregate type.
#[derive(Debug, Clone)]
pub struct Table<T> {
    rows: BTreeMap<i64, T>,
    last_id: i64,
    actor: String,
}

impl<T: Entity + Clone> Table<T> {
    /// An empty table stamping writes with `actor`.
    pub fn new(actor: impl Into<String>) -> Self {
        Table {
            rows: BTreeMap::new(),
            last_id: 0,
            actor: actor.into(),
        }
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.rows.get(&id)
    }

    /// A detached copy for the load → mutate → save cycle.
    pub fn load(&self, id: i64) -> DbResult<T> {
        self.rows
            .get(&id)
            .cloned()
            .ok_or_else(|| DbError::not_found(T::KIND, id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Id the next insert will receive.
    pub fn peek_next_id(&self) -> i64 {
        self.last_id + 1
    }

    /// The stored row `entity` would overwrite, after checking its version.
    ///
    /// `None` for an entity that has never been saved.
    pub fn check_version(&self, entity: &T) -> DbResult<Option<&T>> {
        let Some(id) = entity.id() else {
            return Ok(None);
        };

        let stored = self
            .rows
            .get(&id)
            .ok_or_else(|| DbError::not_found(T::KIND, id))?;

        if stored.version() != entity.version() {
            warn!(
                entity = T::KIND,
                id,
                loaded = entity.version(),
                stored = stored.version(),
                "Rejected stale save"
            );
            return Err(DbError::VersionConflict {
                entity: T::KIND.to_string(),
                id,
                loaded: entity.version(),
                stored: stored.version(),
            });
        }

        Ok(Some(stored))
    }

    /// Stores `entity`, assigning an id on first write.
    ///
    /// Bumps the version and stamps audit info on both the stored row and
    /// the caller's copy. Call [`Table::check_version`] first.
    pub fn write(&mut self, entity: &mut T) -> i64 {
        let id = match entity.id() {
            Some(id) => id,
            None => {
                self.last_id += 1;
                entity.set_id(self.last_id);
                self.last_id
            }
        };

        entity.set_version(entity.version() + 1);
        entity.audit_mut().touch(&self.actor, Utc::now());

        self.rows.insert(id, entity.clone());
        id
    }

    pub fn remove(&mut self, id: i64) -> DbResult<T> {
        self.rows
            .remove(&id)
            .ok_or_else(|| DbError::not_found(T::KIND, id))
    }
}

// =============================================================================
// Unique Index
// =============================================================================

/// A unique key → owning id map for one column.
#[derive(Debug, Clone)]
pub struct UniqueIndex {
    field: &'static str,
    keys: HashMap<String, i64>,
}

impl UniqueIndex {
    pub fn new(field: &'static str) -> Self {
        UniqueIndex {
            field,
            keys: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.keys.get(key).copied()
    }

    /// Fails if `key` is held by anyone other than `owner`.
    pub fn ensure_free(&self, key: Option<&str>, owner: Option<i64>) -> DbResult<()> {
        let Some(key) = key else {
            return Ok(());
        };

        match self.keys.get(key) {
            Some(holder) if Some(*holder) != owner => {
                warn!(field = self.field, value = %key, "Unique constraint violated");
                Err(DbError::duplicate(self.field, key))
            }
            _ => Ok(()),
        }
    }

    /// Moves `owner` from its `old` key to its `new` one.
    pub fn replace(&mut self, old: Option<&str>, new: Option<&str>, owner: i64) {
        self.remove(old, owner);
        if let Some(key) = new {
            self.keys.insert(key.to_string(), owner);
        }
    }

    pub fn remove(&mut self, key: Option<&str>, owner: i64) {
        if let Some(key) = key {
            if self.keys.get(key) == Some(&owner) {
                self.keys.remove(key);
            }
        }
    }
}
