//! The access decision engine.
//!
//! Domain types and store contracts live in `warden-auth`. This module
//! holds the components that reason over them:
//!
//! - [`RoleHierarchyResolver`]: effective permissions through parent links
//! - [`PermissionGate`]: any-of roles, all-of permissions
//! - [`PolicyEvaluator`]: named condition trees against a request
//! - [`ResourceAclStore`]: per-resource grants, revokes and delegation
//! - [`ContextExtractor`]: transport envelope → [`RequestContext`](warden_auth::RequestContext)
//! - [`AccessDecisionCoordinator`]: runs the stages in order
//!
//! # Architecture
//!
//! ```text
//! warden-auth (types + store traits)
//!     Role, Permission, Policy, ResourceGrant, Requirement, Decision
//!         ↓
//! warden-runtime/auth (decision logic)
//!     AccessDecisionCoordinator
//!       ├── ContextExtractor
//!       ├── PermissionGate ── RoleHierarchyResolver
//!       ├── PolicyEvaluator
//!       └── ResourceAclStore
//! ```

mod acl;
mod coordinator;
mod evaluator;
mod extract;
mod gate;
mod hierarchy;
mod table;

pub use acl::ResourceAclStore;
pub use coordinator::AccessDecisionCoordinator;
pub use evaluator::{holds, PolicyEvaluator};
pub use extract::{parse_principal, ContextExtractor, DEFAULT_FORWARDED_HEADER};
pub use gate::PermissionGate;
pub use hierarchy::RoleHierarchyResolver;
pub use table::RequirementTable;
