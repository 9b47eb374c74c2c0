//! Configuration resolver trait for layered overrides.
//!
//! ```text
//! ConfigLoader.load()  →  WardenConfig (base)
//!                              │
//!                              ▼
//!                     ConfigResolver.apply()   (CLI flags)
//!                              │
//!                              ▼
//!                     WardenConfig (final)
//! ```

use super::WardenConfig;

/// Applies overrides on top of a loaded configuration.
pub trait ConfigResolver {
    /// Applies overrides to `config`.
    ///
    /// Options the resolver has no value for must be left untouched.
    fn apply(&self, config: &mut WardenConfig);
}

/// Resolver that makes no changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResolver;

impl ConfigResolver for NoOpResolver {
    fn apply(&self, _config: &mut WardenConfig) {}
}
