//! Collaborator store contracts.
//!
//! The engine owns no persistent state. It reads roles, permissions,
//! policies and grants through these traits at decision time.
//!
//! Stores return records regardless of lifecycle; the engine filters
//! them through [`Lifecycle`](crate::Lifecycle) at every lookup site.
//!
//! ```text
//! ┌──────────────────────────── Stores ─────────────────────────────┐
//! │ roles: Arc<dyn RoleStore>          permissions: Arc<dyn ...>    │
//! │ policies: Arc<dyn PolicyStore>     grants: Arc<dyn ...>         │
//! └─────────────────────────────────────────────────────────────────┘
//!            ▲ one implementation may back all four
//! ```
//!
//! All traits are object-safe (`async_trait`) and `Send + Sync`, so a
//! single store instance can be shared by every concurrent decision.

use crate::{AuthError, GrantKey, Permission, Policy, ResourceGrant, Role};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;
use warden_types::{PermissionId, PrincipalId, RoleId};

/// Role records and role-permission edges.
#[async_trait]
pub trait RoleStore: Send + Sync + Debug {
    /// Looks a role up by id.
    async fn find_by_id(&self, id: &RoleId) -> Result<Option<Role>, AuthError>;

    /// Looks a role up by its unique name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AuthError>;

    /// Roles whose parent is `parent`.
    async fn find_children(&self, parent: &RoleId) -> Result<Vec<Role>, AuthError>;

    /// Permission ids directly attached to `role`.
    async fn permission_ids(&self, role: &RoleId) -> Result<Vec<PermissionId>, AuthError>;
}

/// Permission records.
#[async_trait]
pub trait PermissionStore: Send + Sync + Debug {
    /// Looks a permission up by id.
    async fn find_by_id(&self, id: &PermissionId) -> Result<Option<Permission>, AuthError>;

    /// Looks a permission up by canonical name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Permission>, AuthError>;

    /// Fetches every permission in `ids` that exists; unknown ids are skipped.
    async fn find_many(&self, ids: &[PermissionId]) -> Result<Vec<Permission>, AuthError>;
}

/// Named policies.
#[async_trait]
pub trait PolicyStore: Send + Sync + Debug {
    /// Looks a policy up by its unique name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Policy>, AuthError>;
}

/// Resource grant records.
///
/// Implementations only need per-call atomicity; the ACL component
/// serializes writers per key.
#[async_trait]
pub trait ResourceGrantStore: Send + Sync + Debug {
    /// Fetches the record for `key`, deleted or not.
    async fn find(&self, key: &GrantKey) -> Result<Option<ResourceGrant>, AuthError>;

    /// Creates or replaces the record for `key` with exactly `actions`,
    /// leaving it active.
    async fn upsert(
        &self,
        key: &GrantKey,
        actions: BTreeSet<String>,
    ) -> Result<ResourceGrant, AuthError>;

    /// Removes the record for `key`, returning it if it existed.
    async fn delete(&self, key: &GrantKey) -> Result<Option<ResourceGrant>, AuthError>;

    /// Every record held by `principal`.
    async fn list_by_principal(
        &self,
        principal: &PrincipalId,
    ) -> Result<Vec<ResourceGrant>, AuthError>;

    /// Every record on one resource.
    async fn list_by_resource(
        &self,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<Vec<ResourceGrant>, AuthError>;
}

/// The four collaborator stores, shared.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Roles and role-permission edges.
    pub roles: Arc<dyn RoleStore>,
    /// Permissions.
    pub permissions: Arc<dyn PermissionStore>,
    /// Policies.
    pub policies: Arc<dyn PolicyStore>,
    /// Resource grants.
    pub grants: Arc<dyn ResourceGrantStore>,
}

impl Stores {
    /// Uses one store for all four roles.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: RoleStore + PermissionStore + PolicyStore + ResourceGrantStore + 'static,
    {
        Self {
            roles: store.clone(),
            permissions: store.clone(),
            policies: store.clone(),
            grants: store,
        }
    }
}
