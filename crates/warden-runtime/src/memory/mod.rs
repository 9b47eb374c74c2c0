//! In-memory reference stores.
//!
//! [`MemoryDirectory`] implements all four store contracts over one
//! `RwLock`-guarded set of tables. It backs the CLI (loaded from a JSON
//! [`Snapshot`]) and the test suites.
//!
//! # Write rules
//!
//! | Operation | Rejects |
//! |-----------|---------|
//! | `insert_permission` | a name already used by another id |
//! | `insert_role` | blank name, self-parent, name taken, unknown parent |
//! | `attach_permission` | unknown role or permission |
//! | `insert_policy` | malformed conditions |
//! | `remove_role` | roles that still have children |
//!
//! Inserting an existing id replaces the record. Re-parenting is allowed,
//! so indirect cycles can be stored; the resolver detects them.

mod snapshot;

pub use snapshot::{RolePermission, Snapshot, SnapshotError};

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use warden_auth::{
    AuthError, GrantKey, Permission, PermissionStore, Policy, PolicyStore, RecordStatus,
    ResourceGrant, ResourceGrantStore, Role, RoleStore,
};
use warden_types::{PermissionId, PrincipalId, RoleId};

#[derive(Debug, Default)]
struct Tables {
    roles: BTreeMap<RoleId, Role>,
    permissions: BTreeMap<PermissionId, Permission>,
    edges: BTreeMap<RoleId, BTreeSet<PermissionId>>,
    policies: BTreeMap<String, Policy>,
    grants: BTreeMap<GrantKey, ResourceGrant>,
}

impl Tables {
    fn check_role(&self, role: &Role) -> Result<(), AuthError> {
        role.validate()?;
        if self
            .roles
            .values()
            .any(|r| r.name == role.name && r.id != role.id)
        {
            return Err(AuthError::Conflict(format!(
                "role name '{}' is already taken",
                role.name
            )));
        }
        if let Some(parent) = &role.parent_id {
            if !self.roles.contains_key(parent) {
                return Err(AuthError::not_found("parent role", parent.as_str()));
            }
        }
        Ok(())
    }

    fn check_permission(&self, permission: &Permission) -> Result<(), AuthError> {
        if self
            .permissions
            .values()
            .any(|p| p.name == permission.name && p.id != permission.id)
        {
            return Err(AuthError::Conflict(format!(
                "permission '{}' is already defined",
                permission.name
            )));
        }
        Ok(())
    }
}

/// Thread-safe in-memory roles, permissions, policies and grants.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    tables: RwLock<Tables>,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a directory from a snapshot.
    ///
    /// Roles may appear in any order; parents are resolved against the
    /// whole snapshot.
    ///
    /// # Errors
    ///
    /// The first write rule a record breaks.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, AuthError> {
        let mut tables = Tables::default();

        for permission in snapshot.permissions {
            tables.check_permission(&permission)?;
            tables.permissions.insert(permission.id.clone(), permission);
        }

        tables.roles = snapshot
            .roles
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();
        for role in tables.roles.values() {
            tables.check_role(role)?;
        }

        for edge in snapshot.role_permissions {
            if !tables.roles.contains_key(&edge.role_id) {
                return Err(AuthError::not_found("role", edge.role_id.as_str()));
            }
            if !tables.permissions.contains_key(&edge.permission_id) {
                return Err(AuthError::not_found("permission", edge.permission_id.as_str()));
            }
            tables
                .edges
                .entry(edge.role_id)
                .or_default()
                .insert(edge.permission_id);
        }

        for policy in snapshot.policies {
            policy.compile()?;
            tables.policies.insert(policy.name.clone(), policy);
        }

        for grant in snapshot.grants {
            tables.grants.insert(grant.key.clone(), grant);
        }

        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    /// Exports the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let tables = self.tables.read();
        Snapshot {
            roles: tables.roles.values().cloned().collect(),
            permissions: tables.permissions.values().cloned().collect(),
            role_permissions: tables
                .edges
                .iter()
                .flat_map(|(role, perms)| {
                    perms.iter().map(move |perm| RolePermission {
                        role_id: role.clone(),
                        permission_id: perm.clone(),
                    })
                })
                .collect(),
            policies: tables.policies.values().cloned().collect(),
            grants: tables.grants.values().cloned().collect(),
        }
    }

    /// Inserts or replaces a permission.
    ///
    /// # Errors
    ///
    /// [`AuthError::Conflict`] if another permission has the same name.
    pub fn insert_permission(&self, permission: Permission) -> Result<(), AuthError> {
        let mut tables = self.tables.write();
        tables.check_permission(&permission)?;
        tables.permissions.insert(permission.id.clone(), permission);
        Ok(())
    }

    /// Inserts or replaces a role.
    ///
    /// # Errors
    ///
    /// Validation failures, a taken name or an unknown parent.
    pub fn insert_role(&self, role: Role) -> Result<(), AuthError> {
        let mut tables = self.tables.write();
        tables.check_role(&role)?;
        tables.roles.insert(role.id.clone(), role);
        Ok(())
    }

    /// Removes a role and its permission edges.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotFound`] for an unknown role, [`AuthError::Conflict`]
    /// if other roles still name it as parent.
    pub fn remove_role(&self, id: &RoleId) -> Result<Role, AuthError> {
        let mut tables = self.tables.write();
        if tables
            .roles
            .values()
            .any(|r| r.parent_id.as_ref() == Some(id))
        {
            return Err(AuthError::Conflict(format!("role '{id}' still has children")));
        }
        let role = tables
            .roles
            .remove(id)
            .ok_or_else(|| AuthError::not_found("role", id.as_str()))?;
        tables.edges.remove(id);
        Ok(role)
    }

    /// Attaches a permission to a role.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotFound`] if either side does not exist.
    pub fn attach_permission(&self, role: &RoleId, permission: &PermissionId) -> Result<(), AuthError> {
        let mut tables = self.tables.write();
        if !tables.roles.contains_key(role) {
            return Err(AuthError::not_found("role", role.as_str()));
        }
        if !tables.permissions.contains_key(permission) {
            return Err(AuthError::not_found("permission", permission.as_str()));
        }
        tables
            .edges
            .entry(role.clone())
            .or_default()
            .insert(permission.clone());
        Ok(())
    }

    /// Detaches a permission from a role. Returns whether an edge existed.
    pub fn detach_permission(&self, role: &RoleId, permission: &PermissionId) -> bool {
        let mut tables = self.tables.write();
        tables
            .edges
            .get_mut(role)
            .is_some_and(|perms| perms.remove(permission))
    }

    /// Inserts or replaces a policy, keyed by name.
    ///
    /// # Errors
    ///
    /// [`AuthError::MalformedCondition`] if the conditions do not parse.
    pub fn insert_policy(&self, policy: Policy) -> Result<(), AuthError> {
        policy.compile()?;
        self.insert_policy_unchecked(policy);
        Ok(())
    }

    /// Inserts a policy without parsing its conditions.
    ///
    /// Mirrors a backing store that holds data written by other tools.
    pub fn insert_policy_unchecked(&self, policy: Policy) {
        self.tables.write().policies.insert(policy.name.clone(), policy);
    }

    /// Marks a role deleted.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotFound`] for an unknown role.
    pub fn soft_delete_role(&self, id: &RoleId) -> Result<(), AuthError> {
        let mut tables = self.tables.write();
        let role = tables
            .roles
            .get_mut(id)
            .ok_or_else(|| AuthError::not_found("role", id.as_str()))?;
        role.status = RecordStatus::Deleted;
        Ok(())
    }

    /// Marks a permission deleted.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotFound`] for an unknown permission.
    pub fn soft_delete_permission(&self, id: &PermissionId) -> Result<(), AuthError> {
        let mut tables = self.tables.write();
        let permission = tables
            .permissions
            .get_mut(id)
            .ok_or_else(|| AuthError::not_found("permission", id.as_str()))?;
        permission.status = RecordStatus::Deleted;
        Ok(())
    }

    /// Marks a policy deleted.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotFound`] for an unknown policy.
    pub fn soft_delete_policy(&self, name: &str) -> Result<(), AuthError> {
        let mut tables = self.tables.write();
        let policy = tables
            .policies
            .get_mut(name)
            .ok_or_else(|| AuthError::not_found("policy", name))?;
        policy.status = RecordStatus::Deleted;
        Ok(())
    }

    /// Marks a grant deleted.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotFound`] for an unknown key.
    pub fn soft_delete_grant(&self, key: &GrantKey) -> Result<(), AuthError> {
        let mut tables = self.tables.write();
        let grant = tables
            .grants
            .get_mut(key)
            .ok_or_else(|| AuthError::not_found("resource grant", key.to_string()))?;
        grant.status = RecordStatus::Deleted;
        Ok(())
    }
}

#[async_trait]
impl RoleStore for MemoryDirectory {
    async fn find_by_id(&self, id: &RoleId) -> Result<Option<Role>, AuthError> {
        Ok(self.tables.read().roles.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AuthError> {
        Ok(self
            .tables
            .read()
            .roles
            .values()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn find_children(&self, parent: &RoleId) -> Result<Vec<Role>, AuthError> {
        Ok(self
            .tables
            .read()
            .roles
            .values()
            .filter(|r| r.parent_id.as_ref() == Some(parent))
            .cloned()
            .collect())
    }

    async fn permission_ids(&self, role: &RoleId) -> Result<Vec<PermissionId>, AuthError> {
        Ok(self
            .tables
            .read()
            .edges
            .get(role)
            .map(|perms| perms.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl PermissionStore for MemoryDirectory {
    async fn find_by_id(&self, id: &PermissionId) -> Result<Option<Permission>, AuthError> {
        Ok(self.tables.read().permissions.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Permission>, AuthError> {
        Ok(self
            .tables
            .read()
            .permissions
            .values()
            .find(|p| p.name.as_str() == name)
            .cloned())
    }

    async fn find_many(&self, ids: &[PermissionId]) -> Result<Vec<Permission>, AuthError> {
        let tables = self.tables.read();
        Ok(ids
            .iter()
            .filter_map(|id| tables.permissions.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl PolicyStore for MemoryDirectory {
    async fn find_by_name(&self, name: &str) -> Result<Option<Policy>, AuthError> {
        Ok(self.tables.read().policies.get(name).cloned())
    }
}

#[async_trait]
impl ResourceGrantStore for MemoryDirectory {
    async fn find(&self, key: &GrantKey) -> Result<Option<ResourceGrant>, AuthError> {
        Ok(self.tables.read().grants.get(key).cloned())
    }

    async fn upsert(
        &self,
        key: &GrantKey,
        actions: BTreeSet<String>,
    ) -> Result<ResourceGrant, AuthError> {
        let grant = ResourceGrant::new(key.clone(), actions);
        self.tables.write().grants.insert(key.clone(), grant.clone());
        Ok(grant)
    }

    async fn delete(&self, key: &GrantKey) -> Result<Option<ResourceGrant>, AuthError> {
        Ok(self.tables.write().grants.remove(key))
    }

    async fn list_by_principal(
        &self,
        principal: &PrincipalId,
    ) -> Result<Vec<ResourceGrant>, AuthError> {
        Ok(self
            .tables
            .read()
            .grants
            .values()
            .filter(|g| &g.key.principal_id == principal)
            .cloned()
            .collect())
    }

    async fn list_by_resource(
        &self,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<Vec<ResourceGrant>, AuthError> {
        Ok(self
            .tables
            .read()
            .grants
            .values()
            .filter(|g| g.key.resource_type == resource_type && g.key.resource_id == resource_id)
            .cloned()
            .collect())
    }
}
