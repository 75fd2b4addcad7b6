//! # User Repository
//!
//! Staff accounts with unique usernames and emails, plus the login lookup.

use cafe_core::{User, UserPrincipal};
use tracing::{debug, info};

use super::{Table, UniqueIndex};
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct UserRepository {
    table: Table<User>,
    usernames: UniqueIndex,
    emails: UniqueIndex,
}

impl UserRepository {
    pub fn new(actor: impl Into<String>) -> Self {
        UserRepository {
            table: Table::new(actor),
            usernames: UniqueIndex::new("username"),
            emails: UniqueIndex::new("user email"),
        }
    }

    /// Inserts or updates a user.
    ///
    /// ## Errors
    /// - `VersionConflict` if `user` is a stale copy
    /// - `UniqueViolation` on username or email
    pub fn save(&mut self, user: &mut User) -> DbResult<i64> {
        let old = self
            .table
            .check_version(user)?
            .map(|stored| (stored.username.clone(), stored.email.clone()));
        self.usernames
            .ensure_free(Some(user.username.as_str()), user.id)?;
        self.emails.ensure_free(Some(user.email.as_str()), user.id)?;

        let id = self.table.write(user);

        let (old_username, old_email) = old.clone().unzip();
        self.usernames
            .replace(old_username.as_deref(), Some(user.username.as_str()), id);
        self.emails
            .replace(old_email.as_deref(), Some(user.email.as_str()), id);

        if old.is_none() {
            info!(id, username = %user.username, roles = ?user.roles, "User created");
        } else {
            debug!(id, version = user.version, active = user.active, "User updated");
        }
        Ok(id)
    }

    pub fn get(&self, id: i64) -> Option<&User> {
        self.table.get(id)
    }

    pub fn load(&self, id: i64) -> DbResult<User> {
        self.table.load(id)
    }

    pub fn find_by_username(&self, username: &str) -> Option<&User> {
        self.usernames.get(username).and_then(|id| self.table.get(id))
    }

    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        self.emails.get(email).and_then(|id| self.table.get(id))
    }

    /// Looks up `username` and builds its principal.
    ///
    /// Password verification is the caller's business; the principal
    /// carries the stored hash for that.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown username
    /// - `Core(InactiveUser)` for a disabled account
    pub fn authenticate(&self, username: &str) -> DbResult<UserPrincipal> {
        let user = self
            .find_by_username(username)
            .ok_or_else(|| DbError::not_found("user", username))?;
        let principal = UserPrincipal::authenticate(user)?;

        debug!(username, authorities = ?principal.authorities, "Principal loaded");
        Ok(principal)
    }

    pub fn list(&self) -> impl Iterator<Item = &User> {
        self.table.iter()
    }

    pub fn count(&self) -> usize {
        self.table.len()
    }

    pub fn delete(&mut self, id: i64) -> DbResult<User> {
        let removed = self.table.remove(id)?;
        self.usernames.remove(Some(removed.username.as_str()), id);
        self.emails.remove(Some(removed.email.as_str()), id);
        info!(id, username = %removed.username, "User deleted");
        Ok(removed)
    }
}
