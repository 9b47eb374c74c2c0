//! Access-control domain for Warden.
//!
//! This crate holds the data the decision engine reasons about and the
//! contracts it reads that data through. It contains no decision logic;
//! that lives in `warden-runtime`.
//!
//! # Models
//!
//! ```text
//! ┌───────────────┬──────────────────────────────────────────────────┐
//! │ RBAC          │ Role (parent forest) ── Permission "res:action"  │
//! │ Policy        │ Policy { effect, conditions } → Condition tree   │
//! │ ACL           │ ResourceGrant { (principal, type, id) → actions }│
//! └───────────────┴──────────────────────────────────────────────────┘
//! ```
//!
//! A request reaches the engine as a [`TransportRequest`], becomes a
//! [`RequestContext`], and is checked against a [`Requirement`] to yield
//! a [`Decision`].
//!
//! # Failure model
//!
//! Denials are values ([`DenyReason`]). Genuine failures are
//! [`AuthError`]s, and every consumer must map them to a denial.

mod condition;
mod context;
mod decision;
mod error;
mod grant;
mod lifecycle;
mod permission;
mod policy;
mod requirement;
mod role;
mod store;
mod transport;

pub use condition::{parse_clock, Composite, Condition, ConditionError, TimeCondition};
pub use context::RequestContext;
pub use decision::{Decision, DenyReason};
pub use error::{AuthError, ErrorKind};
pub use grant::{GrantKey, ResourceGrant};
pub use lifecycle::{available, Lifecycle, RecordStatus};
pub use permission::{Permission, PermissionName};
pub use policy::{Policy, PolicyEffect};
pub use requirement::{Requirement, ResourceIdSource, ResourceRequirement};
pub use role::{Role, RoleTree};
pub use store::{PermissionStore, PolicyStore, ResourceGrantStore, RoleStore, Stores};
pub use transport::{GraphQlRequest, HttpRequest, RpcRequest, TransportRequest};
