//! # Users & Roles
//!
//! Staff accounts and the authority mapping the authentication layer needs.
//! Customers are a separate aggregate ([`crate::customer::Customer`]).
//!
//! ## Roles
//! ```text
//! ADMIN    ──► ROLE_ADMIN     full access
//! MANAGER  ──► ROLE_MANAGER   products, reports
//! STAFF    ──► ROLE_STAFF     orders, customers
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{impl_entity, AuditInfo};
use crate::validation::{validate_email, validate_name};

// =============================================================================
// Roles
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleName {
    Admin,
    Manager,
    Staff,
}

impl RoleName {
    /// Authority string handed to the authentication layer.
    pub fn authority(&self) -> &'static str {
        match self {
            RoleName::Admin => "ROLE_ADMIN",
            RoleName::Manager => "ROLE_MANAGER",
            RoleName::Staff => "ROLE_STAFF",
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.authority())
    }
}

/// A stored role. Two roles are equal when their names are.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Role {
    pub id: Option<i64>,
    pub name: RoleName,
    pub description: Option<String>,
}

impl Role {
    pub fn new(name: RoleName) -> Self {
        Role {
            id: None,
            name,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Role {}

impl Hash for Role {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

// =============================================================================
// User
// =============================================================================

/// A staff account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: Option<i64>,

    /// Unique (enforced by the store).
    pub username: String,

    /// Unique (enforced by the store).
    pub email: String,

    /// Never leaves the process.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,

    pub first_name: Option<String>,
    pub last_name: Option<String>,

    pub active: bool,

    pub roles: BTreeSet<RoleName>,

    pub version: i64,

    pub audit: AuditInfo,
}

impl_entity!(User, "user");

impl User {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> CoreResult<Self> {
        let username = username.into();
        let email = email.into();
        validate_name("username", &username, 50)?;
        validate_email(&email)?;

        Ok(User {
            id: None,
            username,
            email,
            password_hash: password_hash.into(),
            first_name: None,
            last_name: None,
            active: true,
            roles: BTreeSet::new(),
            version: 0,
            audit: AuditInfo::default(),
        })
    }

    pub fn with_role(mut self, role: RoleName) -> Self {
        self.roles.insert(role);
        self
    }

    /// Grants a stored role. Returns false if the user already held it.
    pub fn grant(&mut self, role: &Role) -> bool {
        self.roles.insert(role.name)
    }

    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.contains(&role)
    }
}

/// `ROLE_*` strings for every role the user holds.
pub fn authorities(user: &User) -> BTreeSet<String> {
    user.roles.iter().map(|r| r.authority().to_string()).collect()
}

// =============================================================================
// Principal
// =============================================================================

/// What the authentication layer sees of a [`User`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserPrincipal {
    pub id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: String,
    pub email: String,

    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,

    pub active: bool,

    pub authorities: BTreeSet<String>,
}

impl UserPrincipal {
    pub fn from_user(user: &User) -> Self {
        UserPrincipal {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            active: user.active,
            authorities: authorities(user),
        }
    }

    /// Builds the principal at login; inactive accounts are refused.
    pub fn authenticate(user: &User) -> CoreResult<Self> {
        if !user.active {
            tracing::debug!(username = %user.username, "Login refused for inactive user");
            return Err(CoreError::InactiveUser(user.username.clone()));
        }
        Ok(UserPrincipal::from_user(user))
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn barista() -> User {
        User::new("sam", "sam@cafe.test", "$argon2id$hash")
            .unwrap()
            .with_role(RoleName::Staff)
    }

    #[test]
    fn test_authorities() {
        let user = barista().with_role(RoleName::Manager).with_role(RoleName::Staff);
        let auths = authorities(&user);
        assert_eq!(auths.len(), 2);
        assert!(auths.contains("ROLE_MANAGER"));
        assert!(auths.contains("ROLE_STAFF"));
        assert!(user.has_role(RoleName::Manager));
        assert!(!user.has_role(RoleName::Admin));
    }

    #[test]
    fn test_role_equality_by_name() {
        let mut a = Role::new(RoleName::Admin);
        a.id = Some(1);
        let mut b = Role::new(RoleName::Admin);
        b.id = Some(2);
        b.description = Some("dup".into());
        assert_eq!(a, b);
        assert_ne!(a, Role::new(RoleName::Staff));
    }

    #[test]
    fn test_grant_same_role_twice() {
        let staff = Role::new(RoleName::Staff).with_description("Takes orders");
        let mut copy = Role::new(RoleName::Staff);
        copy.id = Some(9);

        let mut user = User::new("kim", "kim@cafe.test", "$argon2id$hash").unwrap();
        assert!(user.grant(&staff));
        assert!(!user.grant(&copy));
        assert!(user.grant(&Role::new(RoleName::Manager)));

        assert_eq!(user.roles.len(), 2);
        assert!(user.has_role(RoleName::Staff));
        assert_eq!(
            authorities(&user),
            BTreeSet::from(["ROLE_MANAGER".to_string(), "ROLE_STAFF".to_string()])
        );
    }

    #[test]
    fn test_principal_hides_password_hash() {
        let principal = UserPrincipal::authenticate(&barista()).unwrap();
        assert!(principal.has_authority("ROLE_STAFF"));

        let json = serde_json::to_string(&principal).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password_hash"));

        let json = serde_json::to_string(&barista()).unwrap();
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn test_inactive_user_rejected() {
        let mut user = barista();
        user.active = false;
        let err = UserPrincipal::authenticate(&user).unwrap_err();
        assert!(matches!(err, CoreError::InactiveUser(name) if name == "sam"));

        // The principal itself can still be built for display.
        assert!(!UserPrincipal::from_user(&user).active);
    }

    #[test]
    fn test_user_validation() {
        assert!(User::new("", "a@b.co", "h").is_err());
        assert!(User::new("sam", "not-an-email", "h").is_err());
    }
}
