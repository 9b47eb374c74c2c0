//! Role hierarchy resolution.
//!
//! A role's effective permissions are its own permissions plus those of
//! every ancestor:
//!
//! ```text
//! admin   {policy:delete}
//!   └── manager   {report:read}
//!         └── analyst {report:export}
//!
//! effective(analyst) = {report:export, report:read, policy:delete}
//! ```
//!
//! The walk is a loop over parent links with a visited set. Reaching a
//! role twice is a configuration error ([`AuthError::RoleCycle`]); it is
//! never silently truncated.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use warden_auth::{
    available, AuthError, Lifecycle, PermissionStore, Role, RoleStore, RoleTree, Stores,
};
use warden_types::RoleId;

/// Computes effective permission sets over the role forest.
#[derive(Debug, Clone)]
pub struct RoleHierarchyResolver {
    roles: Arc<dyn RoleStore>,
    permissions: Arc<dyn PermissionStore>,
}

impl RoleHierarchyResolver {
    /// Creates a resolver over the given stores.
    pub fn new(roles: Arc<dyn RoleStore>, permissions: Arc<dyn PermissionStore>) -> Self {
        Self { roles, permissions }
    }

    /// Creates a resolver from a store bundle.
    #[must_use]
    pub fn from_stores(stores: &Stores) -> Self {
        Self::new(Arc::clone(&stores.roles), Arc::clone(&stores.permissions))
    }

    async fn available_role(&self, id: &RoleId) -> Result<Option<Role>, AuthError> {
        Ok(self.roles.find_by_id(id).await?.filter(Lifecycle::is_available))
    }

    /// Returns the names of every permission `role_id` holds directly or
    /// through its ancestors.
    ///
    /// An unavailable or missing ancestor ends the walk: neither it nor
    /// the roles above it contribute.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotFound`] if `role_id` itself is missing or unavailable
    /// - [`AuthError::RoleCycle`] if parent links loop
    /// - store errors as returned by the collaborators
    pub async fn resolve_effective_permissions(
        &self,
        role_id: &RoleId,
    ) -> Result<BTreeSet<String>, AuthError> {
        let start = self
            .available_role(role_id)
            .await?
            .ok_or_else(|| AuthError::not_found("role", role_id.as_str()))?;

        let mut visited: HashSet<RoleId> = HashSet::new();
        let mut effective = BTreeSet::new();
        let mut current = Some(start);

        while let Some(role) = current {
            if !visited.insert(role.id.clone()) {
                return Err(AuthError::RoleCycle { role_id: role.id });
            }

            let ids = self.roles.permission_ids(&role.id).await?;
            if !ids.is_empty() {
                effective.extend(
                    available(self.permissions.find_many(&ids).await?)
                        .into_iter()
                        .map(|p| p.name.to_string()),
                );
            }

            current = match role.parent_id {
                Some(parent_id) => {
                    let parent = self.available_role(&parent_id).await?;
                    if parent.is_none() {
                        tracing::debug!(
                            role = %role.id,
                            parent = %parent_id,
                            "parent role unavailable, stopping hierarchy walk"
                        );
                    }
                    parent
                }
                None => None,
            };
        }

        tracing::trace!(
            role = %role_id,
            depth = visited.len(),
            permissions = effective.len(),
            "resolved effective permissions"
        );
        Ok(effective)
    }

    /// Returns `role_id` with its available descendants.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotFound`] if `role_id` is missing or unavailable
    /// - [`AuthError::RoleCycle`] if a role is reached twice
    pub async fn hierarchy(&self, role_id: &RoleId) -> Result<RoleTree, AuthError> {
        let root = self
            .available_role(role_id)
            .await?
            .ok_or_else(|| AuthError::not_found("role", role_id.as_str()))?;

        let mut visited: HashSet<RoleId> = HashSet::from([root.id.clone()]);
        let mut children_of: HashMap<RoleId, Vec<Role>> = HashMap::new();
        let mut queue = VecDeque::from([root.id.clone()]);

        while let Some(id) = queue.pop_front() {
            let mut children = available(self.roles.find_children(&id).await?);
            children.sort_by(|a, b| a.name.cmp(&b.name));
            for child in &children {
                if !visited.insert(child.id.clone()) {
                    return Err(AuthError::RoleCycle {
                        role_id: child.id.clone(),
                    });
                }
                queue.push_back(child.id.clone());
            }
            children_of.insert(id, children);
        }

        Ok(assemble(root, &mut children_of))
    }
}

fn assemble(role: Role, children_of: &mut HashMap<RoleId, Vec<Role>>) -> RoleTree {
    let children = children_of.remove(&role.id).unwrap_or_default();
    RoleTree {
        children: children
            .into_iter()
            .map(|child| assemble(child, children_of))
            .collect(),
        role,
    }
}
