//! Warden Runtime - the access decision engine.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  warden-types : ids, Principal, ErrorCode                   │
//! │  warden-auth  : domain records, store traits, Decision      │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Runtime Layer (THIS CRATE)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  auth/    : resolver, gate, evaluator, ACL, coordinator     │
//! │  memory/  : in-memory reference stores + JSON snapshots     │
//! │  config/  : layered TOML configuration                      │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │  warden-cli : offline decisions against a snapshot          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! ## [`auth`] - Decision Engine
//!
//! - [`AccessDecisionCoordinator`]: request + requirement → [`Decision`](warden_auth::Decision)
//! - [`PermissionGate`], [`RoleHierarchyResolver`]: RBAC
//! - [`PolicyEvaluator`]: ABAC conditions
//! - [`ResourceAclStore`]: per-resource grants
//!
//! ## [`memory`] - Reference Stores
//!
//! - [`MemoryDirectory`]: all four store contracts in memory
//!
//! ## [`config`] - Configuration Management
//!
//! - [`WardenConfig`](config::WardenConfig): merged settings
//! - [`ConfigLoader`](config::ConfigLoader): defaults → global → project → env
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use warden_auth::{Requirement, RequestContext, Role, Stores};
//! use warden_runtime::{AccessDecisionCoordinator, MemoryDirectory};
//! use warden_types::Principal;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let dir = Arc::new(MemoryDirectory::new());
//! dir.insert_role(Role::new("r1", "admin")).unwrap();
//!
//! let coordinator = AccessDecisionCoordinator::new(&Stores::shared(dir));
//! let ctx = RequestContext::empty().with_principal(Principal::new("u1").with_role("r1"));
//! let decision = coordinator
//!     .decide_context(&ctx, &Requirement::authenticated().any_role(["admin"]))
//!     .await;
//! assert!(decision.is_permit());
//! # });
//! ```

pub mod auth;
pub mod config;
pub mod memory;

pub use auth::{
    AccessDecisionCoordinator, ContextExtractor, PermissionGate, PolicyEvaluator,
    RequirementTable, ResourceAclStore, RoleHierarchyResolver,
};
pub use memory::{MemoryDirectory, Snapshot, SnapshotError};
