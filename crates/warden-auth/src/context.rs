//! Canonical request context.

use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use warden_types::Principal;

/// Transport-independent view of one request.
///
/// Built by the context extractor from a
/// [`TransportRequest`](crate::TransportRequest); condition trees and
/// resource requirements read only this.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// Authenticated principal, if any.
    pub principal: Option<Principal>,
    /// Source address.
    pub ip: Option<String>,
    /// Request body (or resolver arguments / RPC payload).
    pub body: Map<String, Value>,
    /// Path parameters.
    pub params: BTreeMap<String, String>,
    /// Wall-clock time the context was captured.
    pub timestamp: DateTime<Local>,
}

impl RequestContext {
    /// Empty context captured at `timestamp`.
    #[must_use]
    pub fn empty_at(timestamp: DateTime<Local>) -> Self {
        Self {
            principal: None,
            ip: None,
            body: Map::new(),
            params: BTreeMap::new(),
            timestamp,
        }
    }

    /// Empty context captured now.
    #[must_use]
    pub fn empty() -> Self {
        Self::empty_at(Local::now())
    }

    /// Sets the principal.
    #[must_use]
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Sets the source address.
    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Sets a body field.
    #[must_use]
    pub fn with_body_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.body.insert(key.into(), value);
        self
    }

    /// Sets a path parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Principal, only when it is active.
    #[must_use]
    pub fn active_principal(&self) -> Option<&Principal> {
        self.principal.as_ref().filter(|p| p.active)
    }

    /// Looks `field` up in the body, then in the path parameters.
    #[must_use]
    pub fn lookup(&self, field: &str) -> Option<Value> {
        self.body
            .get(field)
            .filter(|v| !v.is_null())
            .cloned()
            .or_else(|| self.params.get(field).map(|s| Value::String(s.clone())))
    }
}
