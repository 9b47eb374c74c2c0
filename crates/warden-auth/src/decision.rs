//! Decision outcomes.

use serde::Serialize;
use std::fmt;

/// Why a request was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenyReason {
    /// No active principal where one is required.
    Unauthenticated,
    /// Role or permission requirement not met.
    Forbidden,
    /// A named policy evaluated negative.
    PolicyRejected {
        /// Policy name.
        policy: String,
    },
    /// The ACL does not grant the action on the resource.
    ResourceAccessDenied {
        /// Resource type.
        resource_type: String,
        /// Required action.
        action: String,
    },
}

impl DenyReason {
    /// Short stable identifier.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::PolicyRejected { .. } => "policy_rejected",
            Self::ResourceAccessDenied { .. } => "resource_access_denied",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => f.write_str("unauthenticated"),
            Self::Forbidden => f.write_str("forbidden"),
            Self::PolicyRejected { policy } => write!(f, "policy '{policy}' rejected the request"),
            Self::ResourceAccessDenied {
                resource_type,
                action,
            } => write!(f, "no '{action}' access to {resource_type}"),
        }
    }
}

/// Outcome of an access decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Proceed.
    Permit,
    /// Stop, with the first failing stage.
    Deny(DenyReason),
}

impl Decision {
    /// Returns `true` for [`Decision::Permit`].
    #[must_use]
    pub fn is_permit(&self) -> bool {
        matches!(self, Self::Permit)
    }

    /// Deny reason, if denied.
    #[must_use]
    pub fn deny_reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Permit => None,
            Self::Deny(reason) => Some(reason),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permit => f.write_str("permit"),
            Self::Deny(reason) => write!(f, "deny: {reason}"),
        }
    }
}
