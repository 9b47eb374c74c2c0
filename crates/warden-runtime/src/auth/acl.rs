//! Per-resource access control lists.
//!
//! [`ResourceAclStore`] wraps a [`ResourceGrantStore`] with the ACL
//! rules and serializes writers per key:
//!
//! ```text
//! grant(k, A)          upsert k := A (replace, reactivate)
//! revoke(k)            delete k, NotFound if absent
//! update_actions(k, A) replace on an existing k only
//! delegate(f → t, A)   A ⊆ actions(f) ? upsert t := A : Conflict
//! check_access(k, a)   live(k) && a ∈ actions(k), never errors
//! ```
//!
//! # Locking
//!
//! Each mutation takes an async mutex scoped to its key. `delegate`
//! touches two keys and takes both in key order, so two crossing
//! delegations cannot deadlock. Reads take no lock.

use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use warden_auth::{AuthError, GrantKey, Lifecycle, ResourceGrant, ResourceGrantStore, Stores};
use warden_types::PrincipalId;

/// Key-scoped async locks.
#[derive(Debug, Default)]
struct KeyLocks {
    slots: Mutex<HashMap<GrantKey, Arc<AsyncMutex<()>>>>,
}

impl KeyLocks {
    fn slot(&self, key: &GrantKey) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock();
        // Slots nobody holds or waits on are only referenced by the map.
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    async fn lock(&self, key: &GrantKey) -> OwnedMutexGuard<()> {
        self.slot(key).lock_owned().await
    }

    async fn lock_pair(
        &self,
        a: &GrantKey,
        b: &GrantKey,
    ) -> (OwnedMutexGuard<()>, Option<OwnedMutexGuard<()>>) {
        if a == b {
            return (self.lock(a).await, None);
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first = self.lock(first).await;
        let second = self.lock(second).await;
        (first, Some(second))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

fn to_actions<I, S>(actions: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    actions.into_iter().map(Into::into).collect()
}

/// Grants, revokes, delegates and checks resource actions.
#[derive(Debug, Clone)]
pub struct ResourceAclStore {
    grants: Arc<dyn ResourceGrantStore>,
    locks: Arc<KeyLocks>,
}

impl ResourceAclStore {
    /// Creates an ACL over a grant store.
    pub fn new(grants: Arc<dyn ResourceGrantStore>) -> Self {
        Self {
            grants,
            locks: Arc::new(KeyLocks::default()),
        }
    }

    /// Creates an ACL from a store bundle.
    #[must_use]
    pub fn from_stores(stores: &Stores) -> Self {
        Self::new(Arc::clone(&stores.grants))
    }

    async fn live(&self, key: &GrantKey) -> Result<Option<ResourceGrant>, AuthError> {
        Ok(self.grants.find(key).await?.filter(Lifecycle::is_available))
    }

    /// Sets the action set for `key`, replacing any previous set.
    ///
    /// A soft-deleted record is reactivated.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn grant<I, S>(&self, key: &GrantKey, actions: I) -> Result<ResourceGrant, AuthError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let actions = to_actions(actions);
        let _guard = self.locks.lock(key).await;
        let grant = self.grants.upsert(key, actions).await?;
        tracing::info!(key = %key, actions = ?grant.actions, "resource access granted");
        Ok(grant)
    }

    /// Removes the grant for `key`.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotFound`] if there is no live grant.
    pub async fn revoke(&self, key: &GrantKey) -> Result<ResourceGrant, AuthError> {
        let _guard = self.locks.lock(key).await;
        if self.live(key).await?.is_none() {
            return Err(AuthError::not_found("resource grant", key.to_string()));
        }
        let removed = self
            .grants
            .delete(key)
            .await?
            .ok_or_else(|| AuthError::not_found("resource grant", key.to_string()))?;
        tracing::info!(key = %key, "resource access revoked");
        Ok(removed)
    }

    /// Replaces the action set of an existing grant.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotFound`] if there is no live grant.
    pub async fn update_actions<I, S>(
        &self,
        key: &GrantKey,
        actions: I,
    ) -> Result<ResourceGrant, AuthError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let actions = to_actions(actions);
        let _guard = self.locks.lock(key).await;
        if self.live(key).await?.is_none() {
            return Err(AuthError::not_found("resource grant", key.to_string()));
        }
        let grant = self.grants.upsert(key, actions).await?;
        tracing::info!(key = %key, actions = ?grant.actions, "resource actions updated");
        Ok(grant)
    }

    /// Returns `true` if `key` has a live grant containing `action`.
    ///
    /// Store failures are logged and read as "no access".
    pub async fn check_access(&self, key: &GrantKey, action: &str) -> bool {
        match self.try_check_access(key, action).await {
            Ok(allowed) => allowed,
            Err(e) => {
                tracing::error!(key = %key, action, error = %e, "resource access check failed");
                false
            }
        }
    }

    /// Like [`check_access`](Self::check_access) but surfaces store failures.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn try_check_access(&self, key: &GrantKey, action: &str) -> Result<bool, AuthError> {
        Ok(self
            .grants
            .find(key)
            .await?
            .is_some_and(|grant| grant.allows(action)))
    }

    /// Passes `actions` on one resource from `from` to `to`.
    ///
    /// The recipient's grant on that resource is replaced by exactly
    /// `actions`; anything it held before is dropped.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotFound`] if `from` has no live grant on the resource
    /// - [`AuthError::DelegationConflict`] naming the actions `from` lacks
    pub async fn delegate<I, S>(
        &self,
        from: &PrincipalId,
        to: &PrincipalId,
        resource_type: &str,
        resource_id: &str,
        actions: I,
    ) -> Result<ResourceGrant, AuthError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let actions = to_actions(actions);
        let from_key = GrantKey::new(from.clone(), resource_type, resource_id);
        let to_key = from_key.for_principal(to.clone());
        let _guards = self.locks.lock_pair(&from_key, &to_key).await;

        let source = self
            .live(&from_key)
            .await?
            .ok_or_else(|| AuthError::not_found("resource grant", from_key.to_string()))?;

        let unavailable = source.missing(&actions);
        if !unavailable.is_empty() {
            tracing::warn!(
                from = %from,
                to = %to,
                resource_type,
                resource_id,
                unavailable = ?unavailable,
                "delegation refused"
            );
            return Err(AuthError::DelegationConflict { unavailable });
        }

        let grant = self.grants.upsert(&to_key, actions).await?;
        tracing::info!(
            from = %from,
            to = %to,
            resource_type,
            resource_id,
            actions = ?grant.actions,
            "resource access delegated"
        );
        Ok(grant)
    }

    /// Live grants held by `principal`, optionally of one resource type.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn list_for_principal(
        &self,
        principal: &PrincipalId,
        resource_type: Option<&str>,
    ) -> Result<Vec<ResourceGrant>, AuthError> {
        let grants = self.grants.list_by_principal(principal).await?;
        Ok(grants
            .into_iter()
            .filter(Lifecycle::is_available)
            .filter(|g| resource_type.map_or(true, |t| g.key.resource_type == t))
            .collect())
    }

    /// Live grants on one resource.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn list_for_resource(
        &self,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<Vec<ResourceGrant>, AuthError> {
        let grants = self.grants.list_by_resource(resource_type, resource_id).await?;
        Ok(grants.into_iter().filter(Lifecycle::is_available).collect())
    }
}
