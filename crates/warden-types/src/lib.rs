//! Core types for Warden.
//!
//! This crate sits at the bottom of the dependency graph and carries no
//! decision logic:
//!
//! ```text
//! warden-types  (ids, Principal, ErrorCode)   ◄── THIS CRATE
//!      ↑
//! warden-auth   (records, conditions, requirements, store traits)
//!      ↑
//! warden-runtime (resolver, gate, evaluator, ACL, coordinator, config)
//!      ↑
//! warden-cli
//! ```
//!
//! # Contents
//!
//! - [`PrincipalId`], [`RoleId`], [`PermissionId`]: opaque string identifiers
//! - [`Principal`]: the authenticated actor a decision is made for
//! - [`PrincipalProfile`]: the nested user shape handed over by authentication
//! - [`ErrorCode`]: stable machine-readable codes for every error enum
//! - [`TryNew`]: fallible constructors for validated values

mod construct;
mod error;
mod id;
mod principal;

pub use construct::TryNew;
pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{PermissionId, PrincipalId, RoleId};
pub use principal::{
    AssignedRole, EmbeddedPermission, PermissionEdge, Principal, PrincipalProfile, RoleAssignment,
};
