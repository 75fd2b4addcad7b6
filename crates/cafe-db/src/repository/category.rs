//! # Category Repository
//!
//! Stores categories in a [`CategoryTree`] rather than a flat [`Table`](super::Table):
//! parent links and cascades belong to the tree, while this repository adds
//! ids, versions, audit stamps and the unique name index on top.

use cafe_core::{Category, CategoryTree, CoreError, Entity};
use chrono::Utc;
use tracing::{debug, info, warn};

use super::UniqueIndex;
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    tree: CategoryTree,
    names: UniqueIndex,
    last_id: i64,
    actor: String,
}

impl CategoryRepository {
    pub fn new(actor: impl Into<String>) -> Self {
        CategoryRepository {
            tree: CategoryTree::new(),
            names: UniqueIndex::new("category name"),
            last_id: 0,
            actor: actor.into(),
        }
    }

    /// Inserts a new category under `parent` (or as a root).
    ///
    /// The caller's copy receives the id, version and parent link.
    pub fn insert(&mut self, category: &mut Category, parent: Option<i64>) -> DbResult<i64> {
        if let Some(id) = category.id {
            return Err(DbError::duplicate("category id", id.to_string()));
        }
        self.names.ensure_free(Some(category.name.as_str()), None)?;
        if let Some(parent) = parent {
            if !self.tree.contains(parent) {
                return Err(CoreError::CategoryNotFound(parent).into());
            }
        }

        let id = self.last_id + 1;
        let mut stored = category.clone();
        stored.set_id(id);
        stored.set_version(1);
        stored.audit_mut().touch(&self.actor, Utc::now());
        self.tree.insert(stored, parent)?;

        self.last_id = id;
        self.names.replace(None, Some(category.name.as_str()), id);
        self.refresh(category, id);

        info!(id, name = %category.name, parent = ?parent, "Category created");
        Ok(id)
    }

    /// Updates a stored category's own fields. Use
    /// [`CategoryRepository::move_category`] to re-parent.
    pub fn update(&mut self, category: &mut Category) -> DbResult<()> {
        let id = category
            .id
            .ok_or_else(|| DbError::not_found(Category::KIND, "(unsaved)"))?;
        let stored = self
            .tree
            .get(id)
            .ok_or_else(|| DbError::not_found(Category::KIND, id))?;

        if stored.version != category.version {
            warn!(id, loaded = category.version, stored = stored.version, "Rejected stale category save");
            return Err(DbError::VersionConflict {
                entity: Category::KIND.to_string(),
                id,
                loaded: category.version,
                stored: stored.version,
            });
        }
        let old_name = stored.name.clone();
        self.names.ensure_free(Some(category.name.as_str()), Some(id))?;

        let mut next = category.clone();
        next.set_version(category.version + 1);
        next.audit_mut().touch(&self.actor, Utc::now());
        self.tree.replace(next)?;

        self.names
            .replace(Some(old_name.as_str()), Some(category.name.as_str()), id);
        self.refresh(category, id);

        debug!(id, version = category.version, "Category updated");
        Ok(())
    }

    /// Re-parents a category, refusing moves that would create a cycle.
    pub fn move_category(&mut self, id: i64, new_parent: Option<i64>) -> DbResult<()> {
        self.tree.move_category(id, new_parent)?;

        if let Some(node) = self.tree.get_mut(id) {
            node.set_version(node.version + 1);
            node.audit_mut().touch(&self.actor, Utc::now());
        }
        Ok(())
    }

    /// Deletes a category and all of its subcategories.
    ///
    /// Products are not touched here; see [`crate::Database::delete_category`].
    pub fn delete(&mut self, id: i64) -> DbResult<Vec<Category>> {
        let removed = self.tree.remove(id)?;
        for category in &removed {
            if let Some(cid) = category.id {
                self.names.remove(Some(category.name.as_str()), cid);
            }
        }

        info!(id, removed = removed.len(), "Category deleted");
        Ok(removed)
    }

    pub fn get(&self, id: i64) -> Option<&Category> {
        self.tree.get(id)
    }

    pub fn load(&self, id: i64) -> DbResult<Category> {
        self.tree
            .get(id)
            .cloned()
            .ok_or_else(|| DbError::not_found(Category::KIND, id))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Category> {
        self.names.get(name).and_then(|id| self.tree.get(id))
    }

    /// Read access to the whole tree (children, paths, roots).
    pub fn tree(&self) -> &CategoryTree {
        &self.tree
    }

    pub fn count(&self) -> usize {
        self.tree.len()
    }

    fn refresh(&self, category: &mut Category, id: i64) {
        if let Some(stored) = self.tree.get(id) {
            *category = stored.clone();
        }
    }
}
