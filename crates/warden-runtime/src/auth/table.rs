//! Operation requirement table.
//!
//! Maps operation ids to their [`Requirement`]. The table is assembled
//! once at startup, from code and/or the `[operations]` configuration
//! section, and is read-only afterwards.

use std::collections::BTreeMap;
use warden_auth::Requirement;

/// Static operation → requirement map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementTable {
    entries: BTreeMap<String, Requirement>,
}

impl RequirementTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry.
    #[must_use]
    pub fn with(mut self, operation: impl Into<String>, requirement: Requirement) -> Self {
        self.entries.insert(operation.into(), requirement);
        self
    }

    /// Adds every entry of `operations`, replacing existing ones.
    #[must_use]
    pub fn with_all(mut self, operations: &BTreeMap<String, Requirement>) -> Self {
        self.entries
            .extend(operations.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Requirement registered for `operation`.
    #[must_use]
    pub fn get(&self, operation: &str) -> Option<&Requirement> {
        self.entries.get(operation)
    }

    /// Registered operation ids, sorted.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
