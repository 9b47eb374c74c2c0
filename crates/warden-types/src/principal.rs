//! Principal (authenticated actor) types.
//!
//! A [`Principal`] is the identity the engine decides about. It is
//! produced by the authentication collaborator and only ever read here.
//!
//! Authentication layers usually hand over a richer, nested user object
//! (roles with their permissions embedded). [`PrincipalProfile`] models
//! that shape and flattens it into a [`Principal`].
//!
//! ```text
//! PrincipalProfile { id, isActive, roles[].role.permissions[].permission.name, ..attrs }
//!        │
//!        └── into_principal()  → Principal { id, roles: {RoleId}, attributes, active }
//! ```

use crate::{PrincipalId, RoleId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// The actor a decision is made for.
///
/// # Example
///
/// ```
/// use warden_types::{Principal, RoleId};
/// use serde_json::json;
///
/// let alice = Principal::new("u-alice")
///     .with_role("manager")
///     .with_attribute("department", json!("finance"));
///
/// assert!(alice.holds_role(&RoleId::new("manager")));
/// assert_eq!(alice.attribute("department"), Some(&json!("finance")));
/// assert!(alice.active);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal identifier.
    pub id: PrincipalId,

    /// Ids of the roles assigned to this principal.
    #[serde(default)]
    pub roles: BTreeSet<RoleId>,

    /// Free-form attributes used by attribute conditions.
    #[serde(default)]
    pub attributes: Map<String, Value>,

    /// Inactive principals are treated as unauthenticated.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Principal {
    /// Creates an active principal with no roles and no attributes.
    #[must_use]
    pub fn new(id: impl Into<PrincipalId>) -> Self {
        Self {
            id: id.into(),
            roles: BTreeSet::new(),
            attributes: Map::new(),
            active: true,
        }
    }

    /// Adds a held role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<RoleId>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Sets an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Marks the principal inactive.
    #[must_use]
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// Returns `true` if the principal holds the role id.
    #[must_use]
    pub fn holds_role(&self, role: &RoleId) -> bool {
        self.roles.contains(role)
    }

    /// Returns the attribute value for `key`, if any.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "principal:{}", self.id)
    }
}

/// The nested user object supplied by the authentication layer.
///
/// Every top-level field other than `id`, `isActive` and `roles` is kept
/// as an attribute, so `{"id": "u1", "department": "finance"}` yields a
/// principal whose `department` attribute is `"finance"`.
///
/// # Example
///
/// ```
/// use warden_types::PrincipalProfile;
/// use serde_json::json;
///
/// let profile: PrincipalProfile = serde_json::from_value(json!({
///     "id": "u1",
///     "department": "finance",
///     "roles": [
///         { "role": { "id": "r-admin", "name": "admin",
///                     "permissions": [ { "permission": { "name": "user:read" } } ] } }
///     ]
/// })).unwrap();
///
/// let principal = profile.into_principal();
/// assert_eq!(principal.id.as_str(), "u1");
/// assert_eq!(principal.roles.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalProfile {
    /// Principal identifier.
    pub id: PrincipalId,

    /// Account active flag.
    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Role assignments with their embedded permissions.
    #[serde(default)]
    pub roles: Vec<RoleAssignment>,

    /// Remaining top-level fields.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// One `roles[]` entry of a [`PrincipalProfile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// The assigned role.
    pub role: AssignedRole,
}

/// The role embedded in a [`RoleAssignment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedRole {
    /// Role identifier.
    pub id: RoleId,

    /// Role name.
    #[serde(default)]
    pub name: String,

    /// Permission edges directly attached to the role.
    #[serde(default)]
    pub permissions: Vec<PermissionEdge>,
}

/// One `permissions[]` entry of an [`AssignedRole`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionEdge {
    /// The attached permission.
    pub permission: EmbeddedPermission,
}

/// The permission embedded in a [`PermissionEdge`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedPermission {
    /// Canonical `"{resource}:{action}"` name.
    pub name: String,
}

impl PrincipalProfile {
    /// Converts the profile into the engine's [`Principal`].
    #[must_use]
    pub fn into_principal(self) -> Principal {
        Principal {
            id: self.id,
            roles: self.roles.into_iter().map(|a| a.role.id).collect(),
            attributes: self.attributes,
            active: self.is_active,
        }
    }
}
