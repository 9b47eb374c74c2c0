//! Configuration management with hierarchical layering.
//!
//! # Architecture
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌───────────────────────────────────────────┐
//! │  1. CLI flags (ConfigResolver)            │
//! ├───────────────────────────────────────────┤
//! │  2. Environment Variables (WARDEN_*)      │
//! ├───────────────────────────────────────────┤
//! │  3. Project Config (.warden/config.toml)  │
//! ├───────────────────────────────────────────┤
//! │  4. Global Config (~/.warden/config.toml) │
//! ├───────────────────────────────────────────┤
//! │  5. Default Values (compile-time)         │
//! └───────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `WARDEN_DEBUG` | `debug` | bool |
//! | `WARDEN_LOG_LEVEL` | `logging.level` | String |
//! | `WARDEN_TRUST_FORWARDED_FOR` | `context.trust_forwarded_for` | bool |
//! | `WARDEN_FORWARDED_HEADER` | `context.forwarded_header` | String |
//! | `WARDEN_DENY_UNREGISTERED` | `engine.deny_unregistered_operations` | bool |
//!
//! # Example Configuration
//!
//! ```toml
//! # <project>/.warden/config.toml
//! debug = false
//!
//! [logging]
//! level = "info"
//!
//! [context]
//! trust_forwarded_for = true
//! forwarded_header = "x-forwarded-for"
//!
//! [engine]
//! deny_unregistered_operations = true
//!
//! [operations."policies.delete"]
//! permissions = ["policy:delete"]
//!
//! [operations."documents.update"]
//! policies = ["office-hours"]
//! resource = { type = "document", action = "update", id = { param = "id" } }
//! ```

mod error;
mod loader;
mod resolver;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resolver::{ConfigResolver, NoOpResolver};
pub use types::{ContextConfig, EngineConfig, LoggingConfig, WardenConfig};

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".warden";

/// Config file name, in both the global and project directories.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(PROJECT_CONFIG_DIR)
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join(PROJECT_CONFIG_FILE)
}
