//! Core runtime configuration.
//!
//! # Responsibility
//! - Hold tunables for logging, storage, pagination and notifications.
//! - Load from JSON documents; every field falls back to its default.
//!
//! # Invariants
//! - A config returned by `from_json_str`/`from_file` has passed `validate()`.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 100;
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_ORDER_ID_PREFIX: &str = "ORD";
pub const DEFAULT_TOP_CUSTOMER_LIMIT: usize = 10;

/// What to do when an invoice upload fails during order creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentPolicy {
    /// Log the failure and create the order without an invoice.
    #[default]
    BestEffort,
    /// Abort creation.
    Required,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CoreConfig {
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<String>,
    /// SQLite database file; the in-memory store is used when unset.
    pub database_path: Option<PathBuf>,
    pub notification_capacity: usize,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
    pub order_id_prefix: String,
    pub top_customer_limit: usize,
    pub attachment_policy: AttachmentPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            database_path: None,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
            default_page_limit: DEFAULT_PAGE_LIMIT,
            max_page_limit: MAX_PAGE_LIMIT,
            order_id_prefix: DEFAULT_ORDER_ID_PREFIX.to_string(),
            top_customer_limit: DEFAULT_TOP_CUSTOMER_LIMIT,
            attachment_policy: AttachmentPolicy::default(),
        }
    }
}

impl CoreConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notification_capacity == 0 {
            return Err(ConfigError::Invalid(
                "notification_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_page_limit == 0 || self.max_page_limit > MAX_PAGE_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_page_limit must be within 1..={MAX_PAGE_LIMIT}"
            )));
        }
        if self.default_page_limit == 0 || self.default_page_limit > self.max_page_limit {
            return Err(ConfigError::Invalid(format!(
                "default_page_limit must be within 1..={}",
                self.max_page_limit
            )));
        }
        if self.order_id_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "order_id_prefix must not be blank".to_string(),
            ));
        }
        if self.top_customer_limit == 0 {
            return Err(ConfigError::Invalid(
                "top_customer_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
