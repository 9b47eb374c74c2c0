//! Role and permission requirement checks.
//!
//! # Semantics
//!
//! | Requirement | Rule |
//! |-------------|------|
//! | roles | **any-of** the principal's held role names |
//! | permissions | **all-of** the union of effective permissions over held roles |
//! | neither | passes, even without a principal |
//!
//! With at least one requirement, a missing or inactive principal fails.

use super::RoleHierarchyResolver;
use std::collections::BTreeSet;
use std::sync::Arc;
use warden_auth::{AuthError, ErrorKind, Lifecycle, RoleStore, Stores};
use warden_types::Principal;

/// Boolean RBAC check against a principal.
#[derive(Debug, Clone)]
pub struct PermissionGate {
    roles: Arc<dyn RoleStore>,
    resolver: RoleHierarchyResolver,
}

impl PermissionGate {
    /// Creates a gate.
    pub fn new(roles: Arc<dyn RoleStore>, resolver: RoleHierarchyResolver) -> Self {
        Self { roles, resolver }
    }

    /// Creates a gate from a store bundle.
    #[must_use]
    pub fn from_stores(stores: &Stores) -> Self {
        Self::new(
            Arc::clone(&stores.roles),
            RoleHierarchyResolver::from_stores(stores),
        )
    }

    /// The resolver used for permission checks.
    #[must_use]
    pub fn resolver(&self) -> &RoleHierarchyResolver {
        &self.resolver
    }

    /// Checks `required_roles` (any-of) and `required_permissions` (all-of).
    ///
    /// Empty slices mean "not required".
    ///
    /// # Errors
    ///
    /// Role cycles and store failures. Missing or unavailable held roles
    /// are skipped, not errors.
    pub async fn check(
        &self,
        principal: Option<&Principal>,
        required_roles: &[String],
        required_permissions: &[String],
    ) -> Result<bool, AuthError> {
        if required_roles.is_empty() && required_permissions.is_empty() {
            return Ok(true);
        }

        let Some(principal) = principal.filter(|p| p.active) else {
            tracing::debug!("rbac check failed: no active principal");
            return Ok(false);
        };

        if !required_roles.is_empty() {
            let held = self.role_names(principal).await?;
            if !required_roles.iter().any(|r| held.contains(r)) {
                tracing::debug!(
                    principal = %principal.id,
                    required = ?required_roles,
                    held = ?held,
                    "rbac check failed: no required role held"
                );
                return Ok(false);
            }
        }

        if !required_permissions.is_empty() {
            let effective = self.effective_permissions(principal).await?;
            if let Some(missing) = required_permissions
                .iter()
                .find(|p| !effective.contains(p.as_str()))
            {
                tracing::debug!(
                    principal = %principal.id,
                    missing = %missing,
                    "rbac check failed: permission not held"
                );
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Names of the available roles the principal holds.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn role_names(&self, principal: &Principal) -> Result<BTreeSet<String>, AuthError> {
        let mut names = BTreeSet::new();
        for id in &principal.roles {
            match self.roles.find_by_id(id).await? {
                Some(role) if role.is_available() => {
                    names.insert(role.name);
                }
                _ => tracing::debug!(principal = %principal.id, role = %id, "held role unavailable"),
            }
        }
        Ok(names)
    }

    /// Union of effective permissions over every held role.
    ///
    /// # Errors
    ///
    /// Role cycles and store failures.
    pub async fn effective_permissions(
        &self,
        principal: &Principal,
    ) -> Result<BTreeSet<String>, AuthError> {
        let mut effective = BTreeSet::new();
        for id in &principal.roles {
            match self.resolver.resolve_effective_permissions(id).await {
                Ok(perms) => effective.extend(perms),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!(principal = %principal.id, role = %id, "held role unavailable");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(effective)
    }

    /// Returns `true` if the principal holds the role named `role`.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn has_role(&self, principal: &Principal, role: &str) -> Result<bool, AuthError> {
        Ok(principal.active && self.role_names(principal).await?.contains(role))
    }

    /// Returns `true` if the principal effectively holds `permission`.
    ///
    /// # Errors
    ///
    /// Role cycles and store failures.
    pub async fn has_permission(
        &self,
        principal: &Principal,
        permission: &str,
    ) -> Result<bool, AuthError> {
        Ok(principal.active && self.effective_permissions(principal).await?.contains(permission))
    }
}
