//! Engine error type.
//!
//! [`AuthError`] covers the *genuine* failures of the engine. Deny
//! outcomes are not errors; they are [`DenyReason`](crate::DenyReason)s
//! carried by a [`Decision`](crate::Decision).
//!
//! ```text
//! AuthError
//!   ├── Configuration  RoleCycle, MalformedCondition   (data needs fixing)
//!   ├── Validation     InvalidRole, InvalidPermission  (write-time rejects)
//!   ├── NotFound       missing grant/role on a mutation path
//!   ├── Conflict       duplicate names, delegation of unheld actions
//!   └── Store          collaborator failure
//! ```
//!
//! None of these may ever be turned into a permit.

use crate::condition::ConditionError;
use thiserror::Error;
use warden_types::{ErrorCode, RoleId};

/// Coarse classification of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Stored data the engine cannot interpret safely.
    Configuration,
    /// A write was rejected by validation.
    Validation,
    /// A record required by a mutation does not exist.
    NotFound,
    /// A mutation conflicts with existing state.
    Conflict,
    /// A store collaborator failed.
    Store,
}

/// Errors raised by the decision engine and its stores.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A role was visited twice while walking parent links.
    #[error("role hierarchy cycle detected at role '{role_id}'")]
    RoleCycle {
        /// The role that was reached a second time.
        role_id: RoleId,
    },

    /// A policy's condition document could not be parsed.
    #[error("policy '{policy}' has malformed conditions: {source}")]
    MalformedCondition {
        /// Name of the offending policy.
        policy: String,
        /// Parse failure.
        #[source]
        source: ConditionError,
    },

    /// A role write was rejected.
    #[error("invalid role '{role_id}': {reason}")]
    InvalidRole {
        /// Role being written.
        role_id: RoleId,
        /// Why it was rejected.
        reason: String,
    },

    /// A permission name could not be normalized.
    #[error("invalid permission name '{name}': {reason}")]
    InvalidPermission {
        /// The rejected input.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A record does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record ("role", "resource grant", ...).
        entity: &'static str,
        /// Human-readable key.
        key: String,
    },

    /// The grantor does not hold every action it tried to delegate.
    #[error("cannot delegate actions: {}", .unavailable.join(", "))]
    DelegationConflict {
        /// Actions missing from the grantor's grant.
        unavailable: Vec<String>,
    },

    /// A write conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A store collaborator failed.
    #[error("store error: {0}")]
    Store(String),
}

impl AuthError {
    /// Creates a not-found error.
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Creates an invalid-role error.
    pub fn invalid_role(role_id: RoleId, reason: impl Into<String>) -> Self {
        Self::InvalidRole {
            role_id,
            reason: reason.into(),
        }
    }

    /// Creates an invalid-permission error.
    pub fn invalid_permission(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPermission {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns the coarse kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RoleCycle { .. } | Self::MalformedCondition { .. } => ErrorKind::Configuration,
            Self::InvalidRole { .. } | Self::InvalidPermission { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DelegationConflict { .. } | Self::Conflict(_) => ErrorKind::Conflict,
            Self::Store(_) => ErrorKind::Store,
        }
    }
}

impl ErrorCode for AuthError {
    fn code(&self) -> &'static str {
        match self {
            Self::RoleCycle { .. } => "AUTH_ROLE_CYCLE",
            Self::MalformedCondition { .. } => "AUTH_MALFORMED_CONDITION",
            Self::InvalidRole { .. } => "AUTH_INVALID_ROLE",
            Self::InvalidPermission { .. } => "AUTH_INVALID_PERMISSION",
            Self::NotFound { .. } => "AUTH_NOT_FOUND",
            Self::DelegationConflict { .. } | Self::Conflict(_) => "AUTH_CONFLICT",
            Self::Store(_) => "AUTH_STORE",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_types::assert_error_codes;

    fn all_variants() -> Vec<AuthError> {
        vec![
            AuthError::RoleCycle {
                role_id: RoleId::new("r1"),
            },
            AuthError::MalformedCondition {
                policy: "p".into(),
                source: ConditionError::UnknownOperator("XOR".into()),
            },
            AuthError::invalid_role(RoleId::new("r1"), "role cannot be its own parent"),
            AuthError::invalid_permission("bad", "missing ':'"),
            AuthError::not_found("resource grant", "u1/doc/d1"),
            AuthError::DelegationConflict {
                unavailable: vec!["write".into()],
            },
            AuthError::Conflict("role name taken".into()),
            AuthError::Store("connection reset".into()),
        ]
    }

    #[test]
    fn codes_follow_convention() {
        assert_error_codes(&all_variants(), "AUTH_");
    }

    #[test]
    fn only_store_errors_are_recoverable() {
        for err in all_variants() {
            assert_eq!(err.is_recoverable(), err.kind() == ErrorKind::Store, "{err}");
        }
    }

    #[test]
    fn kinds() {
        let kinds: Vec<ErrorKind> = all_variants().iter().map(AuthError::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::Configuration,
                ErrorKind::Configuration,
                ErrorKind::Validation,
                ErrorKind::Validation,
                ErrorKind::NotFound,
                ErrorKind::Conflict,
                ErrorKind::Conflict,
                ErrorKind::Store,
            ]
        );
    }

    #[test]
    fn delegation_conflict_names_actions() {
        let err = AuthError::DelegationConflict {
            unavailable: vec!["write".into(), "share".into()],
        };
        assert_eq!(err.to_string(), "cannot delegate actions: write, share");
    }

    #[test]
    fn malformed_condition_keeps_source() {
        use std::error::Error;
        let err = AuthError::MalformedCondition {
            policy: "business-hours".into(),
            source: ConditionError::InvalidTime("25:00".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("business-hours"), "got: {msg}");
        assert!(err.source().is_some());
    }
}
