//! # Categories
//!
//! Hierarchical grouping of products, stored as a flat arena keyed by id.
//!
//! ## Tree Representation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CategoryTree                                                           │
//! │                                                                         │
//! │  nodes:    { 1: Drinks, 2: Hot Drinks, 3: Cold Drinks, 4: Food }       │
//! │  children: { 1: [2, 3] }            roots: [1, 4]                      │
//! │                                                                         │
//! │  Category.parent_id points up, `children` indexes down.                │
//! │  No category holds another category or a product by value.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Removing a category removes its whole subtree. Products only reference a
//! category by id and are never removed with it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::product::Product;
use crate::types::{impl_entity, AuditInfo};
use crate::validation::validate_name;

// =============================================================================
// Category
// =============================================================================

/// A menu section such as "Hot Drinks" or "Pastries".
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: Option<i64>,

    /// Unique across the catalog (enforced by the store).
    pub name: String,

    pub description: Option<String>,

    /// Set through [`CategoryTree`] so the child index stays in sync.
    parent_id: Option<i64>,

    /// Sort key among siblings (ties keep insertion order).
    pub display_order: i32,

    pub active: bool,

    pub show_in_menu: bool,

    pub version: i64,

    pub audit: AuditInfo,
}

impl_entity!(Category, "category");

impl Category {
    /// Creates an active, menu-visible root category.
    pub fn new(name: impl Into<String>) -> CoreResult<Self> {
        let name = name.into();
        validate_name("name", &name, 50)?;

        Ok(Category {
            id: None,
            name,
            description: None,
            parent_id: None,
            display_order: 0,
            active: true,
            show_in_menu: true,
            version: 0,
            audit: AuditInfo::default(),
        })
    }

    pub fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Active, shown in the menu, and holding at least one active product.
    ///
    /// `products` may be the whole catalog; only products whose
    /// `category_id` is this category count.
    pub fn is_visible<'a>(&self, products: impl IntoIterator<Item = &'a Product>) -> bool {
        if !self.active || !self.show_in_menu {
            return false;
        }

        let Some(id) = self.id else {
            return false;
        };

        products
            .into_iter()
            .any(|p| p.active && p.category_id == Some(id))
    }
}

// =============================================================================
// Category Tree
// =============================================================================

/// Arena of categories with a parent → children index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryTree {
    nodes: BTreeMap<i64, Category>,
    children: BTreeMap<i64, Vec<i64>>,
}

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Category> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut Category> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.nodes.values()
    }

    /// Adds a category under `parent_id` (or as a root).
    ///
    /// ## Errors
    /// - category has no id
    /// - id already present
    /// - parent does not exist
    pub fn insert(&mut self, mut category: Category, parent_id: Option<i64>) -> CoreResult<()> {
        let id = category.id.ok_or_else(|| ValidationError::Required {
            field: "category id".to_string(),
        })?;

        if self.nodes.contains_key(&id) {
            return Err(ValidationError::InvalidFormat {
                field: "category id".to_string(),
                reason: format!("{id} is already in the tree"),
            }
            .into());
        }

        if let Some(parent) = parent_id {
            if !self.nodes.contains_key(&parent) {
                return Err(CoreError::CategoryNotFound(parent));
            }
            self.children.entry(parent).or_default().push(id);
        }

        category.parent_id = parent_id;
        self.nodes.insert(id, category);
        Ok(())
    }

    /// Replaces the stored data of an existing category, keeping its place.
    pub fn replace(&mut self, mut category: Category) -> CoreResult<()> {
        let id = category.id.ok_or_else(|| ValidationError::Required {
            field: "category id".to_string(),
        })?;
        let existing = self
            .nodes
            .get_mut(&id)
            .ok_or(CoreError::CategoryNotFound(id))?;

        category.parent_id = existing.parent_id;
        *existing = category;
        Ok(())
    }

    pub fn parent(&self, id: i64) -> Option<&Category> {
        self.nodes
            .get(&id)
            .and_then(|c| c.parent_id)
            .and_then(|p| self.nodes.get(&p))
    }

    /// Direct subcategories, sorted by display order then insertion.
    pub fn children(&self, id: i64) -> Vec<&Category> {
        let mut kids: Vec<&Category> = self
            .children
            .get(&id)
            .map(|ids| ids.iter().filter_map(|c| self.nodes.get(c)).collect())
            .unwrap_or_default();
        kids.sort_by_key(|c| c.display_order);
        kids
    }

    /// Top-level categories, sorted by display order.
    pub fn roots(&self) -> Vec<&Category> {
        let mut roots: Vec<&Category> = self.nodes.values().filter(|c| c.is_root()).collect();
        roots.sort_by_key(|c| c.display_order);
        roots
    }

    /// Ancestor ids from the direct parent up to the root.
    pub fn ancestors(&self, id: i64) -> Vec<i64> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(&id).and_then(|c| c.parent_id);

        while let Some(parent) = current {
            // A corrupted tree must not spin forever.
            if out.contains(&parent) || parent == id {
                break;
            }
            out.push(parent);
            current = self.nodes.get(&parent).and_then(|c| c.parent_id);
        }
        out
    }

    /// Names from the root down to `id`, e.g. `["Drinks", "Hot Drinks"]`.
    pub fn path(&self, id: i64) -> Vec<&str> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };

        let mut names: Vec<&str> = self
            .ancestors(id)
            .into_iter()
            .rev()
            .filter_map(|a| self.nodes.get(&a))
            .map(|c| c.name.as_str())
            .collect();
        names.push(node.name.as_str());
        names
    }

    /// Number of ancestors (roots have depth 0).
    pub fn depth(&self, id: i64) -> usize {
        self.ancestors(id).len()
    }

    /// Re-parents a category.
    ///
    /// ## Errors
    /// - either category is unknown
    /// - the new parent is the category itself or one of its descendants
    pub fn move_category(&mut self, id: i64, new_parent: Option<i64>) -> CoreResult<()> {
        if !self.nodes.contains_key(&id) {
            return Err(CoreError::CategoryNotFound(id));
        }

        if let Some(parent) = new_parent {
            if !self.nodes.contains_key(&parent) {
                return Err(CoreError::CategoryNotFound(parent));
            }
            if parent == id || self.ancestors(parent).contains(&id) {
                return Err(CoreError::CategoryCycle {
                    category: id,
                    parent,
                });
            }
        }

        self.detach_from_parent(id);
        if let Some(parent) = new_parent {
            self.children.entry(parent).or_default().push(id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent_id = new_parent;
        }

        debug!(category = id, parent = ?new_parent, "Category moved");
        Ok(())
    }

    /// Removes a category and every descendant.
    ///
    /// Returns the removed categories, the requested one first.
    pub fn remove(&mut self, id: i64) -> CoreResult<Vec<Category>> {
        if !self.nodes.contains_key(&id) {
            return Err(CoreError::CategoryNotFound(id));
        }

        self.detach_from_parent(id);

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(kids) = self.children.remove(&current) {
                stack.extend(kids.into_iter().rev());
            }
            if let Some(node) = self.nodes.remove(&current) {
                removed.push(node);
            }
        }

        debug!(category = id, removed = removed.len(), "Category subtree removed");
        Ok(removed)
    }

    fn detach_from_parent(&mut self, id: i64) {
        let parent = self.nodes.get(&id).and_then(|c| c.parent_id);
        if let Some(parent) = parent {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|c| *c != id);
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
