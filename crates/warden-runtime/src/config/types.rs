//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use crate::auth::DEFAULT_FORWARDED_HEADER;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use warden_auth::Requirement;

/// Main configuration structure, after all layers are merged.
///
/// # Example
///
/// ```
/// use warden_runtime::config::WardenConfig;
///
/// let config = WardenConfig::default();
/// assert!(!config.debug);
/// assert!(config.engine.deny_unregistered_operations);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WardenConfig {
    /// Enable debug mode (debug-level audit logging).
    pub debug: bool,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Request context extraction.
    pub context: ContextConfig,

    /// Decision engine behaviour.
    pub engine: EngineConfig,

    /// Operation id → requirement.
    pub operations: BTreeMap<String, Requirement>,
}

impl WardenConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Merges another config into this one.
    ///
    /// Scalar values from `other` override only if they differ from the
    /// default. Operation entries are added, replacing same-named ones.
    pub fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.debug != default.debug {
            self.debug = other.debug;
        }

        self.logging.merge(&other.logging);
        self.context.merge(&other.context);
        self.engine.merge(&other.engine);
        self.operations
            .extend(other.operations.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl LoggingConfig {
    fn merge(&mut self, other: &Self) {
        if other.level != Self::default().level {
            self.level = other.level.clone();
        }
    }
}

/// Request context extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContextConfig {
    /// Take the source address from the forwarded header.
    ///
    /// Enable only behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,

    /// Header carrying the client address chain.
    pub forwarded_header: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            trust_forwarded_for: false,
            forwarded_header: DEFAULT_FORWARDED_HEADER.into(),
        }
    }
}

impl ContextConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.trust_forwarded_for != default.trust_forwarded_for {
            self.trust_forwarded_for = other.trust_forwarded_for;
        }
        if other.forwarded_header != default.forwarded_header {
            self.forwarded_header = other.forwarded_header.clone();
        }
    }
}

/// Decision engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Deny operations that have no registered requirement.
    ///
    /// When `false`, such operations only require authentication.
    pub deny_unregistered_operations: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            deny_unregistered_operations: true,
        }
    }
}

impl EngineConfig {
    fn merge(&mut self, other: &Self) {
        if other.deny_unregistered_operations != Self::default().deny_unregistered_operations {
            self.deny_unregistered_operations = other.deny_unregistered_operations;
        }
    }
}
