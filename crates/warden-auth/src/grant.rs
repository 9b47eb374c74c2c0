//! Per-resource grants.
//!
//! A grant maps one `(principal, resource type, resource id)` key to the
//! complete set of actions allowed on it. Writes replace the set.

use crate::{Lifecycle, RecordStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use warden_types::PrincipalId;

/// Unique key of a [`ResourceGrant`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantKey {
    /// Grantee.
    pub principal_id: PrincipalId,
    /// Resource type, e.g. `"document"`.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
}

impl GrantKey {
    /// Creates a key.
    pub fn new(
        principal_id: impl Into<PrincipalId>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            principal_id: principal_id.into(),
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    /// Same resource, different principal.
    #[must_use]
    pub fn for_principal(&self, principal_id: PrincipalId) -> Self {
        Self {
            principal_id,
            ..self.clone()
        }
    }
}

impl fmt::Display for GrantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.principal_id, self.resource_type, self.resource_id
        )
    }
}

/// The action set granted on one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGrant {
    /// Grant key.
    #[serde(flatten)]
    pub key: GrantKey,
    /// Allowed actions.
    pub actions: BTreeSet<String>,
    /// Persistence status.
    #[serde(default)]
    pub status: RecordStatus,
}

impl ResourceGrant {
    /// Creates an active grant.
    pub fn new<I, S>(key: GrantKey, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key,
            actions: actions.into_iter().map(Into::into).collect(),
            status: RecordStatus::Active,
        }
    }

    /// Returns `true` if the grant is live and contains `action`.
    #[must_use]
    pub fn allows(&self, action: &str) -> bool {
        self.is_available() && self.actions.contains(action)
    }

    /// Actions in `wanted` that this grant does not hold, in input order.
    #[must_use]
    pub fn missing<'a>(&self, wanted: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        wanted
            .into_iter()
            .filter(|action| !self.actions.contains(*action))
            .cloned()
            .collect()
    }
}

impl Lifecycle for ResourceGrant {
    fn status(&self) -> RecordStatus {
        self.status
    }
}
