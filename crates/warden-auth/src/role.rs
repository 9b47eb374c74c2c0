//! Role records.

use crate::{AuthError, Lifecycle, RecordStatus};
use serde::{Deserialize, Serialize};
use warden_types::RoleId;

fn default_true() -> bool {
    true
}

/// A named role with an optional parent.
///
/// Parent links form a forest. A role inherits every permission of its
/// ancestors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Role identifier.
    pub id: RoleId,
    /// Unique role name.
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parent role, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<RoleId>,
    /// Administrative enable flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Persistence status.
    #[serde(default)]
    pub status: RecordStatus,
}

impl Role {
    /// Creates an active root role.
    #[must_use]
    pub fn new(id: impl Into<RoleId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            parent_id: None,
            is_active: true,
            status: RecordStatus::Active,
        }
    }

    /// Sets the parent role.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<RoleId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Marks the role inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Checks the invariants that can be verified on a single record.
    ///
    /// Indirect cycles need the whole hierarchy and are caught when the
    /// hierarchy is walked.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidRole`] if the name is blank or the role is its
    /// own parent.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.name.trim().is_empty() {
            return Err(AuthError::invalid_role(self.id.clone(), "name must not be empty"));
        }
        if self.parent_id.as_ref() == Some(&self.id) {
            return Err(AuthError::invalid_role(
                self.id.clone(),
                "role cannot be its own parent",
            ));
        }
        Ok(())
    }
}

impl Lifecycle for Role {
    fn status(&self) -> RecordStatus {
        self.status
    }

    fn is_enabled(&self) -> bool {
        self.is_active
    }
}

/// A role with its descendants, as returned by a hierarchy view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleTree {
    /// The role at this node.
    pub role: Role,
    /// Available child roles, ordered by name.
    pub children: Vec<RoleTree>,
}

impl RoleTree {
    /// Number of roles in the tree, this node included.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(RoleTree::len).sum::<usize>()
    }

    /// A tree always holds at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Renders the tree as indented lines of role names.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(0, &mut out);
        out
    }

    fn render_into(&self, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&self.role.name);
        out.push_str(" (");
        out.push_str(self.role.id.as_str());
        out.push_str(")\n");
        for child in &self.children {
            child.render_into(depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    #[test]
    fn self_parent_rejected() {
        let role = Role::new("r1", "admin").with_parent("r1");
        let err = role.validate().expect_err("self parent must be rejected");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn blank_name_rejected() {
        assert!(Role::new("r1", "  ").validate().is_err());
    }

    #[test]
    fn parent_accepted() {
        assert!(Role::new("r2", "manager").with_parent("r1").validate().is_ok());
    }

    #[test]
    fn lifecycle_follows_flag_and_status() {
        let mut role = Role::new("r1", "admin");
        assert!(role.is_available());
        role.status = RecordStatus::Deleted;
        assert!(!role.is_available());
        assert!(!Role::new("r2", "x").inactive().is_available());
    }

    #[test]
    fn deserialize_camel_case_with_defaults() {
        let role: Role = serde_json::from_value(json!({
            "id": "r2",
            "name": "manager",
            "parentId": "r1"
        }))
        .expect("role json");
        assert_eq!(role.parent_id, Some(RoleId::new("r1")));
        assert!(role.is_active);
        assert_eq!(role.status, RecordStatus::Active);
    }

    #[test]
    fn tree_render_and_len() {
        let tree = RoleTree {
            role: Role::new("r1", "admin"),
            children: vec![RoleTree {
                role: Role::new("r2", "manager").with_parent("r1"),
                children: vec![],
            }],
        };
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.render(), "admin (r1)\n  manager (r2)\n");
    }
}
