//! # Database Error Types
//!
//! Error types for persistence operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  ValidationError / CoreError (cafe-core)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds persistence failures                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller maps: Core → 4xx, VersionConflict / UniqueViolation → 409/412  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use cafe_core::CoreError;
use thiserror::Error;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found.
    ///
    /// ## When This Occurs
    /// - Loading an id that was never saved or has been deleted
    /// - Updating an aggregate whose row was deleted meanwhile
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate barcode, ingredient or category name
    /// - Duplicate customer email/phone, user username/email
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// The stored aggregate has moved on since the caller loaded it.
    ///
    /// ## User Workflow
    /// ```text
    /// Till A loads order v3      Till B loads order v3
    ///      │                           │
    ///      ▼                           ▼
    /// saves → v4 ✓               saves (still v3) → VersionConflict
    /// ```
    #[error("{entity} {id} was modified concurrently (loaded version {loaded}, stored version {stored})")]
    VersionConflict {
        entity: String,
        id: i64,
        loaded: i64,
        stored: i64,
    },

    /// Every generated order number collided with an existing one.
    #[error("Could not find a free order number after {attempts} attempts")]
    OrderNumberExhausted { attempts: u32 },

    /// Configuration is present but unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read or parsed.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Domain rule violation raised while the store drove an operation.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True for failures a caller should surface as a conflict (409/412).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { .. }
                | DbError::VersionConflict { .. }
                | DbError::OrderNumberExhausted { .. }
        )
    }
}

impl From<toml::de::Error> for DbError {
    fn from(err: toml::de::Error) -> Self {
        DbError::ConfigLoadFailed(err.to_string())
    }
}

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        DbError::ConfigLoadFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
