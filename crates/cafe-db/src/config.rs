//! # Store Configuration
//!
//! Settings for the persistence layer and the binaries built on it.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CAFE_AUDIT_ACTOR=till-1                                            │
//! │     CAFE_ORDER_NUMBER_ATTEMPTS=20                                      │
//! │     CAFE_LOG=debug                                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/cafe-orders/cafe.toml (Linux)                            │
//! │     ~/Library/Application Support/com.cafe.orders/cafe.toml (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # cafe.toml
//! audit_actor = "front-counter"
//! order_number_attempts = 10
//! log_filter = "info,cafe_db=debug"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};

fn default_audit_actor() -> String {
    "system".to_string()
}

fn default_order_number_attempts() -> u32 {
    10
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Store configuration.
///
/// ## Example
/// ```rust
/// use cafe_db::DbConfig;
///
/// let config = DbConfig::in_memory()
///     .audit_actor("till-2")
///     .order_number_attempts(5);
/// assert_eq!(config.order_number_attempts, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    /// Name stamped into `created_by` / `updated_by` on every write.
    #[serde(default = "default_audit_actor")]
    pub audit_actor: String,

    /// How many order numbers to try before giving up on a save.
    #[serde(default = "default_order_number_attempts")]
    pub order_number_attempts: u32,

    /// `tracing-subscriber` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            audit_actor: default_audit_actor(),
            order_number_attempts: default_order_number_attempts(),
            log_filter: default_log_filter(),
        }
    }
}

impl DbConfig {
    /// Defaults with a test actor; touches neither the filesystem nor the environment.
    pub fn in_memory() -> Self {
        DbConfig {
            audit_actor: "test".to_string(),
            ..DbConfig::default()
        }
    }

    /// Sets the audit actor.
    pub fn audit_actor(mut self, actor: impl Into<String>) -> Self {
        self.audit_actor = actor.into();
        self
    }

    /// Sets the order-number retry bound.
    pub fn order_number_attempts(mut self, attempts: u32) -> Self {
        self.order_number_attempts = attempts;
        self
    }

    /// Sets the default log filter.
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Loads configuration.
    ///
    /// ## Priority (highest to lowest)
    /// 1. Environment variables
    /// 2. Config file (`cafe.toml`)
    /// 3. Default values
    pub fn load(config_path: Option<PathBuf>) -> DbResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Like [`DbConfig::load`], falling back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load store config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_file(path: &Path) -> DbResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> DbResult<Self> {
        let config: DbConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the store cannot run with.
    pub fn validate(&self) -> DbResult<()> {
        if self.audit_actor.trim().is_empty() {
            return Err(DbError::InvalidConfig(
                "audit_actor must not be empty".to_string(),
            ));
        }

        if self.order_number_attempts == 0 {
            return Err(DbError::InvalidConfig(
                "order_number_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(actor) = std::env::var("CAFE_AUDIT_ACTOR") {
            debug!(actor = %actor, "Overriding audit actor from environment");
            self.audit_actor = actor;
        }

        if let Ok(attempts) = std::env::var("CAFE_ORDER_NUMBER_ATTEMPTS") {
            match attempts.parse::<u32>() {
                Ok(n) => self.order_number_attempts = n,
                Err(_) => warn!(value = %attempts, "Ignoring non-numeric CAFE_ORDER_NUMBER_ATTEMPTS"),
            }
        }

        if let Ok(filter) = std::env::var("CAFE_LOG") {
            self.log_filter = filter;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "cafe", "orders")
            .map(|dirs| dirs.config_dir().join("cafe.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.audit_actor, "system");
        assert_eq!(config.order_number_attempts, 10);
        assert_eq!(config.log_filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DbConfig::from_toml_str("audit_actor = \"till-3\"").unwrap();
        assert_eq!(config.audit_actor, "till-3");
        assert_eq!(config.order_number_attempts, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = DbConfig::from_toml_str("order_number_attempts = 0").unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig(_)));

        let err = DbConfig::from_toml_str("audit_actor = \"  \"").unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig(_)));

        let err = DbConfig::from_toml_str("order_number_attempts = \"many\"").unwrap_err();
        assert!(matches!(err, DbError::ConfigLoadFailed(_)));
    }

    #[test]
    fn test_builder_and_round_trip() {
        let config = DbConfig::in_memory()
            .audit_actor("kitchen")
            .order_number_attempts(3)
            .log_filter("debug");

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("audit_actor = \"kitchen\""));
        assert_eq!(DbConfig::from_toml_str(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_an_error_for_from_file() {
        let path = PathBuf::from("/nonexistent/cafe/cafe.toml");
        assert!(DbConfig::from_file(&path).is_err());
    }
}
