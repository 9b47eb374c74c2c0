//! Permission records and canonical permission names.
//!
//! A permission name is `"{resource}:{action}"`, lowercase. It is built
//! once by [`PermissionName::try_new`] (or parsed by [`PermissionName::parse`])
//! and compared by exact string equality afterwards.

use crate::{AuthError, Lifecycle, RecordStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use warden_types::{PermissionId, TryNew};

/// Canonical `"{resource}:{action}"` permission name.
///
/// # Example
///
/// ```
/// use warden_auth::PermissionName;
/// use warden_types::TryNew;
///
/// let name = PermissionName::try_new(("Policy".into(), " Delete ".into())).unwrap();
/// assert_eq!(name.as_str(), "policy:delete");
/// assert_eq!(name.resource(), "policy");
/// assert_eq!(name.action(), "delete");
///
/// assert!(PermissionName::try_new((String::new(), "read".into())).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionName {
    full: String,
    split: usize,
}

fn normalize_token(token: &str, part: &str, input: &str) -> Result<String, AuthError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::invalid_permission(input, format!("{part} is empty")));
    }
    if token.contains(':') || token.chars().any(char::is_whitespace) {
        return Err(AuthError::invalid_permission(
            input,
            format!("{part} must not contain ':' or whitespace"),
        ));
    }
    Ok(token.to_lowercase())
}

impl TryNew for PermissionName {
    type Error = AuthError;
    type Args = (String, String);

    fn try_new((resource, action): Self::Args) -> Result<Self, Self::Error> {
        Self::from_parts(&resource, &action)
    }
}

impl PermissionName {
    /// Builds a name from borrowed parts.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidPermission`] if either part is empty or holds
    /// a colon or whitespace.
    pub fn from_parts(resource: &str, action: &str) -> Result<Self, AuthError> {
        let input = format!("{resource}:{action}");
        let resource = normalize_token(resource, "resource", &input)?;
        let action = normalize_token(action, "action", &input)?;
        Ok(Self {
            split: resource.len(),
            full: format!("{resource}:{action}"),
        })
    }

    /// Parses `"resource:action"`.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidPermission`] if there is no colon or either
    /// side is invalid.
    pub fn parse(name: &str) -> Result<Self, AuthError> {
        let (resource, action) = name
            .split_once(':')
            .ok_or_else(|| AuthError::invalid_permission(name, "expected 'resource:action'"))?;
        Self::from_parts(resource, action)
    }

    /// The full canonical name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// Resource part.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.full[..self.split]
    }

    /// Action part.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.full[self.split + 1..]
    }
}

impl fmt::Display for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl TryFrom<String> for PermissionName {
    type Error = AuthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PermissionName> for String {
    fn from(name: PermissionName) -> Self {
        name.full
    }
}

fn default_true() -> bool {
    true
}

/// A stored permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    /// Permission identifier.
    pub id: PermissionId,
    /// Canonical name; resource and action are derived from it.
    pub name: PermissionName,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Administrative enable flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Persistence status.
    #[serde(default)]
    pub status: RecordStatus,
}

impl Permission {
    /// Creates an active permission.
    #[must_use]
    pub fn new(id: impl Into<PermissionId>, name: PermissionName) -> Self {
        Self {
            id: id.into(),
            name,
            description: None,
            is_active: true,
            status: RecordStatus::Active,
        }
    }

    /// Resource part of the name.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.name.resource()
    }

    /// Action part of the name.
    #[must_use]
    pub fn action(&self) -> &str {
        self.name.action()
    }
}

impl Lifecycle for Permission {
    fn status(&self) -> RecordStatus {
        self.status
    }

    fn is_enabled(&self) -> bool {
        self.is_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_normalizes_case() {
        let name = PermissionName::parse("User:READ").expect("valid");
        assert_eq!(name.as_str(), "user:read");
        assert_eq!(name.to_string(), "user:read");
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        for bad in ["userread", ":read", "user:", "user:read:all", "us er:read", ""] {
            assert!(PermissionName::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn parts() {
        let name = PermissionName::from_parts("document", "update").expect("valid");
        assert_eq!(name.resource(), "document");
        assert_eq!(name.action(), "update");
    }

    #[test]
    fn serde_goes_through_parse() {
        let perm: Permission =
            serde_json::from_value(json!({ "id": "p1", "name": "Policy:Delete" })).expect("json");
        assert_eq!(perm.name.as_str(), "policy:delete");
        assert_eq!(perm.resource(), "policy");
        assert!(perm.is_available());

        let err = serde_json::from_value::<Permission>(json!({ "id": "p2", "name": "broken" }));
        assert!(err.is_err());

        let out = serde_json::to_value(&perm).expect("serialize");
        assert_eq!(out["name"], json!("policy:delete"));
    }

    #[test]
    fn inactive_permission_unavailable() {
        let mut perm = Permission::new("p1", PermissionName::parse("a:b").expect("valid"));
        perm.is_active = false;
        assert!(!perm.is_available());
    }
}
