//! JSON snapshot of a directory.
//!
//! ```json
//! {
//!   "roles":           [{ "id": "r1", "name": "admin", "parentId": null }],
//!   "permissions":     [{ "id": "p1", "name": "policy:delete" }],
//!   "rolePermissions": [{ "roleId": "r1", "permissionId": "p1" }],
//!   "policies":        [{ "name": "office", "effect": "ALLOW", "conditions": {} }],
//!   "grants":          [{ "principalId": "u1", "resourceType": "document",
//!                         "resourceId": "d1", "actions": ["read"] }]
//! }
//! ```
//!
//! Every section is optional.

use super::MemoryDirectory;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use warden_auth::{AuthError, Permission, Policy, ResourceGrant, Role};
use warden_types::{ErrorCode, PermissionId, RoleId};

/// One role → permission edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePermission {
    pub role_id: RoleId,
    pub permission_id: PermissionId,
}

/// Serializable contents of a [`MemoryDirectory`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snapshot {
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
    pub role_permissions: Vec<RolePermission>,
    pub policies: Vec<Policy>,
    pub grants: Vec<ResourceGrant>,
}

/// Snapshot loading errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Failed to read the snapshot file.
    #[error("failed to read snapshot '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid snapshot document.
    #[error("failed to parse snapshot '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The records break a directory write rule.
    #[error("invalid snapshot: {0}")]
    Invalid(#[from] AuthError),
}

impl ErrorCode for SnapshotError {
    fn code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "SNAPSHOT_READ",
            Self::Parse { .. } => "SNAPSHOT_PARSE",
            Self::Invalid(_) => "SNAPSHOT_INVALID",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

impl Snapshot {
    /// Parses a snapshot document.
    ///
    /// # Errors
    ///
    /// Returns the JSON error for malformed input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads and parses a snapshot file.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Read`] or [`SnapshotError::Parse`].
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| SnapshotError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl MemoryDirectory {
    /// Loads a directory from a snapshot file.
    ///
    /// # Errors
    ///
    /// Read, parse and write-rule failures.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let snapshot = Snapshot::load(path)?;
        let directory = Self::from_snapshot(snapshot)?;
        tracing::debug!(path = %path.display(), "loaded directory snapshot");
        Ok(directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use warden_auth::{ErrorKind, RoleStore};
    use warden_types::assert_error_codes;

    const FIXTURE: &str = r#"{
        "roles": [
            { "id": "r2", "name": "manager", "parentId": "r1" },
            { "id": "r1", "name": "admin" }
        ],
        "permissions": [ { "id": "p1", "name": "Policy:Delete" } ],
        "rolePermissions": [ { "roleId": "r1", "permissionId": "p1" } ],
        "policies": [ { "name": "open", "effect": "ALLOW", "conditions": null } ],
        "grants": [
            { "principalId": "u1", "resourceType": "document", "resourceId": "d1", "actions": ["read"] }
        ]
    }"#;

    #[test]
    fn parses_fixture_with_defaults() {
        let snapshot = Snapshot::from_json(FIXTURE).expect("parse");
        assert_eq!(snapshot.roles.len(), 2);
        assert!(snapshot.roles[0].is_active);
        assert_eq!(snapshot.permissions[0].name.as_str(), "policy:delete");
        assert!(snapshot.grants[0].status == warden_auth::RecordStatus::Active);

        let empty = Snapshot::from_json("{}").expect("empty");
        assert_eq!(empty, Snapshot::default());
    }

    #[tokio::test]
    async fn parents_resolve_regardless_of_order() {
        let dir = MemoryDirectory::from_snapshot(Snapshot::from_json(FIXTURE).expect("parse"))
            .expect("directory");
        let children = dir.find_children(&RoleId::new("r1")).await.expect("children");
        assert_eq!(children.len(), 1);
        assert_eq!(dir.snapshot().role_permissions.len(), 1);
    }

    #[test]
    fn dangling_edge_is_invalid() {
        let snapshot = Snapshot::from_json(
            r#"{ "roles": [{ "id": "r1", "name": "admin" }],
                 "rolePermissions": [{ "roleId": "r1", "permissionId": "p9" }] }"#,
        )
        .expect("parse");
        let err = MemoryDirectory::from_snapshot(snapshot).expect_err("dangling");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(FIXTURE.as_bytes()).expect("write");
        let dir = MemoryDirectory::load(file.path()).expect("load");
        assert_eq!(dir.snapshot().roles.len(), 2);
    }

    #[test]
    fn load_errors() {
        let missing = MemoryDirectory::load(Path::new("/nonexistent/warden/snapshot.json"))
            .expect_err("missing");
        assert!(matches!(missing, SnapshotError::Read { .. }));

        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(b"{ not json").expect("write");
        let parse = MemoryDirectory::load(file.path()).expect_err("parse");
        assert!(matches!(parse, SnapshotError::Parse { .. }));

        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(br#"{ "roles": [{ "id": "r1", "name": "a", "parentId": "r1" }] }"#)
            .expect("write");
        let invalid = MemoryDirectory::load(file.path()).expect_err("invalid");
        assert!(matches!(invalid, SnapshotError::Invalid(_)));

        assert_error_codes(&[missing, parse, invalid], "SNAPSHOT_");
    }
}
