//! Named policies.

use crate::{AuthError, Condition, Lifecycle, RecordStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_true() -> bool {
    true
}

/// What a policy does when it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyEffect {
    /// Grants access when the condition tree holds.
    Allow,
    /// Always evaluates negative.
    Deny,
}

/// A named policy with a stored condition document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Unique policy name; requirements refer to policies by name.
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Effect.
    pub effect: PolicyEffect,
    /// Raw condition document, see [`Condition::parse`].
    #[serde(default)]
    pub conditions: Value,
    /// Administrative enable flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Persistence status.
    #[serde(default)]
    pub status: RecordStatus,
}

impl Policy {
    /// Creates an active `ALLOW` policy.
    #[must_use]
    pub fn allow(name: impl Into<String>, conditions: Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            effect: PolicyEffect::Allow,
            conditions,
            is_active: true,
            status: RecordStatus::Active,
        }
    }

    /// Creates an active `DENY` policy.
    #[must_use]
    pub fn deny(name: impl Into<String>, conditions: Value) -> Self {
        Self {
            effect: PolicyEffect::Deny,
            ..Self::allow(name, conditions)
        }
    }

    /// Parses the condition document.
    ///
    /// # Errors
    ///
    /// [`AuthError::MalformedCondition`] naming this policy.
    pub fn compile(&self) -> Result<Condition, AuthError> {
        Condition::parse(&self.conditions).map_err(|source| AuthError::MalformedCondition {
            policy: self.name.clone(),
            source,
        })
    }
}

impl Lifecycle for Policy {
    fn status(&self) -> RecordStatus {
        self.status
    }

    fn is_enabled(&self) -> bool {
        self.is_active
    }
}
