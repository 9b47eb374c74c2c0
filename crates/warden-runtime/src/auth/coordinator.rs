//! Access decision coordination.
//!
//! # Pipeline
//!
//! ```text
//! TransportRequest ──extract──► RequestContext
//!                                     │
//!   1. authenticated? ────────────────┼──► Deny(Unauthenticated)
//!   2. PermissionGate.check ──────────┼──► Deny(Forbidden)
//!   3. each policy, in order ─────────┼──► Deny(PolicyRejected)
//!   4. resource ACL ──────────────────┼──► Deny(ResourceAccessDenied)
//!                                     ▼
//!                                  Permit
//! ```
//!
//! Stages run in this order and stop at the first failure. Policy and
//! resource stages deny outright when there is no active principal.
//!
//! # Failure handling
//!
//! [`try_decide`](AccessDecisionCoordinator::try_decide) surfaces genuine
//! errors (role cycles, malformed conditions, store failures).
//! [`decide`](AccessDecisionCoordinator::decide) logs them and denies
//! with the reason of the stage that failed. An error never permits.
//!
//! # Audit logging
//!
//! - Permit: debug level
//! - Deny: warn level
//! - Errors: error level

use super::{ContextExtractor, PermissionGate, PolicyEvaluator, RequirementTable, ResourceAclStore};
use crate::config::WardenConfig;
use std::sync::Arc;
use warden_auth::{
    AuthError, Decision, DenyReason, GrantKey, RequestContext, Requirement, Stores,
    TransportRequest,
};
use warden_types::ErrorCode;

/// An error raised while a stage was running, with the denial it maps to.
struct StageError {
    deny: DenyReason,
    source: AuthError,
}

trait StageResult<T> {
    fn or_deny(self, deny: impl FnOnce() -> DenyReason) -> Result<T, StageError>;
}

impl<T> StageResult<T> for Result<T, AuthError> {
    fn or_deny(self, deny: impl FnOnce() -> DenyReason) -> Result<T, StageError> {
        self.map_err(|source| StageError {
            deny: deny(),
            source,
        })
    }
}

/// Runs the decision pipeline.
#[derive(Debug, Clone)]
pub struct AccessDecisionCoordinator {
    extractor: ContextExtractor,
    gate: PermissionGate,
    evaluator: PolicyEvaluator,
    acl: ResourceAclStore,
    table: Arc<RequirementTable>,
    deny_unregistered: bool,
}

impl AccessDecisionCoordinator {
    /// Coordinator with a default extractor and an empty table.
    /// Unregistered operations are denied.
    #[must_use]
    pub fn new(stores: &Stores) -> Self {
        Self {
            extractor: ContextExtractor::new(),
            gate: PermissionGate::from_stores(stores),
            evaluator: PolicyEvaluator::from_stores(stores),
            acl: ResourceAclStore::from_stores(stores),
            table: Arc::new(RequirementTable::new()),
            deny_unregistered: true,
        }
    }

    /// Coordinator configured from a loaded [`WardenConfig`].
    ///
    /// `[operations]` entries are added on top of `table`.
    #[must_use]
    pub fn from_config(stores: &Stores, config: &WardenConfig, table: RequirementTable) -> Self {
        Self::new(stores)
            .with_extractor(ContextExtractor::from_config(&config.context))
            .with_table(table.with_all(&config.operations))
            .deny_unregistered_operations(config.engine.deny_unregistered_operations)
    }

    /// Replaces the extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: ContextExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replaces the requirement table.
    #[must_use]
    pub fn with_table(mut self, table: RequirementTable) -> Self {
        self.table = Arc::new(table);
        self
    }

    /// Sets whether operations missing from the table are denied.
    ///
    /// When `false`, they only require an authenticated principal.
    #[must_use]
    pub fn deny_unregistered_operations(mut self, deny: bool) -> Self {
        self.deny_unregistered = deny;
        self
    }

    /// The context extractor.
    #[must_use]
    pub fn extractor(&self) -> &ContextExtractor {
        &self.extractor
    }

    /// The RBAC gate.
    #[must_use]
    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    /// The policy evaluator.
    #[must_use]
    pub fn evaluator(&self) -> &PolicyEvaluator {
        &self.evaluator
    }

    /// The resource ACL.
    #[must_use]
    pub fn acl(&self) -> &ResourceAclStore {
        &self.acl
    }

    /// The requirement table.
    #[must_use]
    pub fn table(&self) -> &RequirementTable {
        &self.table
    }

    /// Decides `request` against `requirement`. Never errors.
    pub async fn decide(&self, request: &TransportRequest, requirement: &Requirement) -> Decision {
        let ctx = self.extractor.extract(request);
        self.decide_context(&ctx, requirement).await
    }

    /// Decides `request` against `requirement`, surfacing errors.
    ///
    /// # Errors
    ///
    /// Role cycles, malformed policy conditions and store failures.
    pub async fn try_decide(
        &self,
        request: &TransportRequest,
        requirement: &Requirement,
    ) -> Result<Decision, AuthError> {
        let ctx = self.extractor.extract(request);
        self.try_decide_context(&ctx, requirement).await
    }

    /// Decides an already extracted context. Never errors.
    pub async fn decide_context(&self, ctx: &RequestContext, requirement: &Requirement) -> Decision {
        match self.run(ctx, requirement).await {
            Ok(decision) => decision,
            Err(StageError { deny, source }) => {
                tracing::error!(
                    principal = ?principal_id(ctx),
                    code = source.code(),
                    error = %source,
                    reason = deny.code(),
                    "access decision failed, denying"
                );
                Decision::Deny(deny)
            }
        }
    }

    /// Decides an already extracted context, surfacing errors.
    ///
    /// # Errors
    ///
    /// Role cycles, malformed policy conditions and store failures.
    pub async fn try_decide_context(
        &self,
        ctx: &RequestContext,
        requirement: &Requirement,
    ) -> Result<Decision, AuthError> {
        self.run(ctx, requirement).await.map_err(|e| e.source)
    }

    /// Decides `request` against the requirement registered for `operation`.
    pub async fn decide_operation(&self, operation: &str, request: &TransportRequest) -> Decision {
        match self.requirement_for(operation) {
            Some(requirement) => self.decide(request, &requirement).await,
            None => Decision::Deny(DenyReason::Forbidden),
        }
    }

    /// Like [`decide_operation`](Self::decide_operation), surfacing errors.
    ///
    /// # Errors
    ///
    /// Role cycles, malformed policy conditions and store failures.
    pub async fn try_decide_operation(
        &self,
        operation: &str,
        request: &TransportRequest,
    ) -> Result<Decision, AuthError> {
        match self.requirement_for(operation) {
            Some(requirement) => self.try_decide(request, &requirement).await,
            None => Ok(Decision::Deny(DenyReason::Forbidden)),
        }
    }

    /// Requirement that applies to `operation`.
    ///
    /// `None` means the operation is unregistered and must be denied.
    #[must_use]
    pub fn requirement_for(&self, operation: &str) -> Option<Requirement> {
        if let Some(requirement) = self.table.get(operation) {
            return Some(requirement.clone());
        }
        if self.deny_unregistered {
            tracing::warn!(operation, "access denied: operation has no registered requirement");
            None
        } else {
            tracing::debug!(operation, "unregistered operation, requiring authentication only");
            Some(Requirement::authenticated())
        }
    }

    async fn run(
        &self,
        ctx: &RequestContext,
        requirement: &Requirement,
    ) -> Result<Decision, StageError> {
        let principal = ctx.active_principal();

        if requirement.authenticated && principal.is_none() {
            return Ok(deny(ctx, DenyReason::Unauthenticated));
        }

        let rbac = self
            .gate
            .check(principal, &requirement.roles, &requirement.permissions)
            .await
            .or_deny(|| DenyReason::Forbidden)?;
        if !rbac {
            return Ok(deny(ctx, DenyReason::Forbidden));
        }

        if principal.is_none() {
            if let Some(first) = requirement.policies.first() {
                return Ok(deny(
                    ctx,
                    DenyReason::PolicyRejected {
                        policy: first.clone(),
                    },
                ));
            }
        }

        for name in &requirement.policies {
            let rejected = || DenyReason::PolicyRejected {
                policy: name.clone(),
            };
            let passed = self.evaluator.evaluate_named(name, ctx).await.or_deny(rejected)?;
            if !passed {
                return Ok(deny(ctx, rejected()));
            }
        }

        if let Some(resource) = &requirement.resource {
            let denied = || DenyReason::ResourceAccessDenied {
                resource_type: resource.resource_type.clone(),
                action: resource.action.clone(),
            };
            let (Some(principal), Some(resource_id)) = (principal, resource.id.resolve(ctx)) else {
                return Ok(deny(ctx, denied()));
            };
            let key = GrantKey::new(principal.id.clone(), &resource.resource_type, resource_id);
            let allowed = self
                .acl
                .try_check_access(&key, &resource.action)
                .await
                .or_deny(denied)?;
            if !allowed {
                return Ok(deny(ctx, denied()));
            }
        }

        tracing::debug!(principal = ?principal_id(ctx), "access permitted");
        Ok(Decision::Permit)
    }
}

fn principal_id(ctx: &RequestContext) -> Option<&str> {
    ctx.principal.as_ref().map(|p| p.id.as_str())
}

fn deny(ctx: &RequestContext, reason: DenyReason) -> Decision {
    tracing::warn!(
        principal = ?principal_id(ctx),
        ip = ?ctx.ip,
        reason = reason.code(),
        "access denied: {reason}"
    );
    Decision::Deny(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDirectory;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::BTreeSet;
    use warden_auth::{
        HttpRequest, Permission, PermissionName, Policy, PolicyStore, ResourceGrant,
        ResourceGrantStore, ResourceRequirement, Role,
    };
    use warden_types::{PermissionId, Principal, PrincipalId, RoleId};

    fn directory() -> Arc<MemoryDirectory> {
        let dir = MemoryDirectory::new();
        dir.insert_permission(Permission::new("p1", PermissionName::parse("policy:delete").expect("name")))
            .expect("permission");
        dir.insert_role(Role::new("r-admin", "admin")).expect("admin");
        dir.insert_role(Role::new("r-manager", "manager").with_parent("r-admin"))
            .expect("manager");
        dir.attach_permission(&RoleId::new("r-admin"), &PermissionId::new("p1"))
            .expect("edge");
        dir.insert_policy(Policy::allow("open", Value::Null)).expect("open");
        dir.insert_policy(Policy::deny("blocked", Value::Null)).expect("blocked");
        Arc::new(dir)
    }

    fn coordinator(dir: &Arc<MemoryDirectory>) -> AccessDecisionCoordinator {
        AccessDecisionCoordinator::new(&Stores::shared(Arc::clone(dir)))
    }

    fn manager_ctx() -> RequestContext {
        RequestContext::empty().with_principal(Principal::new("u1").with_role("r-manager"))
    }

    fn update_document() -> Requirement {
        Requirement::authenticated()
            .resource(ResourceRequirement::from_param("document", "update", "id"))
    }

    // ─── stages ───

    #[tokio::test]
    async fn manager_is_permitted_inherited_permission() {
        let dir = directory();
        let req = Requirement::authenticated().all_permissions(["policy:delete"]);
        let decision = coordinator(&dir).decide_context(&manager_ctx(), &req).await;
        assert_eq!(decision, Decision::Permit);
    }

    #[tokio::test]
    async fn missing_principal_is_unauthenticated() {
        let dir = directory();
        let decision = coordinator(&dir)
            .decide_context(&RequestContext::empty(), &Requirement::authenticated())
            .await;
        assert_eq!(decision, Decision::Deny(DenyReason::Unauthenticated));
    }

    #[tokio::test]
    async fn inactive_principal_is_unauthenticated() {
        let dir = directory();
        let ctx = RequestContext::empty().with_principal(Principal::new("u1").deactivated());
        let decision = coordinator(&dir).decide_context(&ctx, &Requirement::authenticated()).await;
        assert_eq!(decision, Decision::Deny(DenyReason::Unauthenticated));
    }

    #[tokio::test]
    async fn public_requirement_permits_anonymous() {
        let dir = directory();
        let decision = coordinator(&dir)
            .decide_context(&RequestContext::empty(), &Requirement::public())
            .await;
        assert!(decision.is_permit());
    }

    #[tokio::test]
    async fn public_requirement_with_roles_still_checks_them() {
        let dir = directory();
        let decision = coordinator(&dir)
            .decide_context(&RequestContext::empty(), &Requirement::public().any_role(["admin"]))
            .await;
        assert_eq!(decision, Decision::Deny(DenyReason::Forbidden));
    }

    #[tokio::test]
    async fn anonymous_caller_fails_unconditional_policy() {
        let dir = directory();
        let decision = coordinator(&dir)
            .decide_context(&RequestContext::empty(), &Requirement::public().policies(["open"]))
            .await;
        assert_eq!(
            decision,
            Decision::Deny(DenyReason::PolicyRejected {
                policy: "open".into()
            })
        );
    }

    #[tokio::test]
    async fn anonymous_caller_fails_principal_free_policies() {
        let dir = directory();
        dir.insert_policy(Policy::allow(
            "any-day",
            json!({ "type": "time", "daysOfWeek": [0, 1, 2, 3, 4, 5, 6] }),
        ))
        .expect("time policy");
        dir.insert_policy(Policy::allow(
            "office-ip",
            json!({ "type": "ip", "allowedIps": ["10.0.0.5"] }),
        ))
        .expect("ip policy");
        let coord = coordinator(&dir);

        let anonymous = RequestContext::empty();
        let decision = coord
            .decide_context(&anonymous, &Requirement::public().policies(["any-day", "open"]))
            .await;
        assert_eq!(
            decision,
            Decision::Deny(DenyReason::PolicyRejected {
                policy: "any-day".into()
            })
        );

        let inactive = RequestContext::empty().with_principal(Principal::new("u1").deactivated());
        let decision = coord
            .try_decide_context(&inactive, &Requirement::public().policies(["office-ip"]))
            .await
            .expect("no store errors");
        assert_eq!(
            decision,
            Decision::Deny(DenyReason::PolicyRejected {
                policy: "office-ip".into()
            })
        );

        let known = manager_ctx();
        let decision = coord
            .decide_context(&known, &Requirement::public().policies(["any-day", "open"]))
            .await;
        assert!(decision.is_permit());
    }

    #[tokio::test]
    async fn role_mismatch_is_forbidden() {
        let dir = directory();
        let req = Requirement::authenticated().any_role(["admin"]);
        let decision = coordinator(&dir).decide_context(&manager_ctx(), &req).await;
        assert_eq!(decision, Decision::Deny(DenyReason::Forbidden));
    }

    #[tokio::test]
    async fn policies_run_in_order() {
        let dir = directory();
        let req = Requirement::authenticated().policies(["open", "blocked", "missing"]);
        let decision = coordinator(&dir).decide_context(&manager_ctx(), &req).await;
        assert_eq!(
            decision,
            Decision::Deny(DenyReason::PolicyRejected {
                policy: "blocked".into()
            })
        );
    }

    #[tokio::test]
    async fn missing_policy_rejects() {
        let dir = directory();
        let req = Requirement::authenticated().policies(["missing"]);
        let decision = coordinator(&dir).decide_context(&manager_ctx(), &req).await;
        assert_eq!(
            decision,
            Decision::Deny(DenyReason::PolicyRejected {
                policy: "missing".into()
            })
        );
    }

    #[tokio::test]
    async fn resource_grant_checked_last() {
        let dir = directory();
        let coord = coordinator(&dir);
        let ctx = manager_ctx().with_param("id", "d1");

        let denied = coord.decide_context(&ctx, &update_document()).await;
        assert_eq!(
            denied,
            Decision::Deny(DenyReason::ResourceAccessDenied {
                resource_type: "document".into(),
                action: "update".into(),
            })
        );

        coord
            .acl()
            .grant(&GrantKey::new("u1", "document", "d1"), ["update"])
            .await
            .expect("grant");
        assert!(coord.decide_context(&ctx, &update_document()).await.is_permit());
    }

    #[tokio::test]
    async fn missing_resource_id_denies() {
        let dir = directory();
        let coord = coordinator(&dir);
        coord
            .acl()
            .grant(&GrantKey::new("u1", "document", "d1"), ["update"])
            .await
            .expect("grant");
        let decision = coord.decide_context(&manager_ctx(), &update_document()).await;
        assert!(matches!(
            decision,
            Decision::Deny(DenyReason::ResourceAccessDenied { .. })
        ));
    }

    // ─── failures ───

    #[tokio::test]
    async fn malformed_policy_denies_and_surfaces() {
        let dir = directory();
        let broken = Policy::allow("broken", json!({ "type": "composite", "operator": "XOR", "conditions": [] }));
        dir.insert_policy_unchecked(broken);
        let coord = coordinator(&dir);
        let req = Requirement::authenticated().policies(["broken"]);

        let decision = coord.decide_context(&manager_ctx(), &req).await;
        assert_eq!(
            decision,
            Decision::Deny(DenyReason::PolicyRejected {
                policy: "broken".into()
            })
        );
        let err = coord
            .try_decide_context(&manager_ctx(), &req)
            .await
            .expect_err("malformed");
        assert!(matches!(err, AuthError::MalformedCondition { .. }));
    }

    #[tokio::test]
    async fn role_cycle_is_forbidden_not_permitted() {
        let dir = directory();
        dir.insert_role(Role::new("r-admin", "admin").with_parent("r-manager"))
            .expect("cycle");
        let req = Requirement::authenticated().all_permissions(["policy:delete"]);
        let coord = coordinator(&dir);
        assert_eq!(
            coord.decide_context(&manager_ctx(), &req).await,
            Decision::Deny(DenyReason::Forbidden)
        );
        assert!(coord.try_decide_context(&manager_ctx(), &req).await.is_err());
    }

    #[derive(Debug)]
    struct FailingGrants;

    #[async_trait]
    impl ResourceGrantStore for FailingGrants {
        async fn find(&self, _key: &GrantKey) -> Result<Option<ResourceGrant>, AuthError> {
            Err(AuthError::Store("grant backend unavailable".into()))
        }
        async fn upsert(
            &self,
            _key: &GrantKey,
            _actions: BTreeSet<String>,
        ) -> Result<ResourceGrant, AuthError> {
            Err(AuthError::Store("grant backend unavailable".into()))
        }
        async fn delete(&self, _key: &GrantKey) -> Result<Option<ResourceGrant>, AuthError> {
            Err(AuthError::Store("grant backend unavailable".into()))
        }
        async fn list_by_principal(
            &self,
            _principal: &PrincipalId,
        ) -> Result<Vec<ResourceGrant>, AuthError> {
            Ok(Vec::new())
        }
        async fn list_by_resource(
            &self,
            _resource_type: &str,
            _resource_id: &str,
        ) -> Result<Vec<ResourceGrant>, AuthError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn store_failure_denies() {
        let dir = directory();
        let mut stores = Stores::shared(Arc::clone(&dir));
        stores.grants = Arc::new(FailingGrants);
        let coord = AccessDecisionCoordinator::new(&stores);
        let ctx = manager_ctx().with_param("id", "d1");

        assert!(matches!(
            coord.decide_context(&ctx, &update_document()).await,
            Decision::Deny(DenyReason::ResourceAccessDenied { .. })
        ));
        let err = coord
            .try_decide_context(&ctx, &update_document())
            .await
            .expect_err("store failure");
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn policy_store_is_consulted_by_name() {
        let dir = directory();
        let stores = Stores::shared(Arc::clone(&dir));
        let found = stores.policies.find_by_name("open").await.expect("lookup");
        assert!(found.is_some());
    }

    // ─── operations ───

    #[tokio::test]
    async fn registered_operation() {
        let dir = directory();
        let coord = coordinator(&dir).with_table(
            RequirementTable::new().with(
                "policies.delete",
                Requirement::authenticated().all_permissions(["policy:delete"]),
            ),
        );
        let request: TransportRequest = HttpRequest::default()
            .with_principal(json!({ "id": "u1", "roles": ["r-manager"] }))
            .into();
        assert!(coord.decide_operation("policies.delete", &request).await.is_permit());
    }

    #[tokio::test]
    async fn unregistered_operation_is_denied_by_default() {
        let dir = directory();
        let request: TransportRequest = HttpRequest::default()
            .with_principal(json!({ "id": "u1", "roles": ["r-manager"] }))
            .into();
        let coord = coordinator(&dir);
        assert_eq!(
            coord.decide_operation("unknown", &request).await,
            Decision::Deny(DenyReason::Forbidden)
        );

        let lenient = coord.deny_unregistered_operations(false);
        assert!(lenient.decide_operation("unknown", &request).await.is_permit());
        assert_eq!(
            lenient
                .decide_operation("unknown", &TransportRequest::Unsupported)
                .await,
            Decision::Deny(DenyReason::Unauthenticated)
        );
    }
}
