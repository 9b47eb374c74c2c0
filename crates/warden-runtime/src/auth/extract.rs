//! Request context extraction.
//!
//! One function per transport shape, all producing a [`RequestContext`]:
//!
//! | Envelope | principal | ip | body | params |
//! |----------|-----------|----|------|--------|
//! | `Http` | `principal` | forwarded header or `remote_addr` | `body` | `params` |
//! | `GraphQl` | `principal` | forwarded header or `remote_addr` | `args` | empty |
//! | `Rpc` | `data.user` | `peer` | `data` without `user` | empty |
//! | `Unsupported` | none | none | empty | empty |
//!
//! The forwarded header is only honoured when the extractor is configured
//! to trust it; it is client-controlled otherwise.
//!
//! # Principal shapes
//!
//! The principal object may be the nested profile produced by the
//! authentication layer (`roles[].role.id`, see [`PrincipalProfile`]) or
//! the engine's own [`Principal`] shape (`roles` as an id list and/or an
//! `attributes` object). An object that matches neither yields no
//! principal.

use crate::config::ContextConfig;
use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use warden_auth::{GraphQlRequest, HttpRequest, RequestContext, RpcRequest, TransportRequest};
use warden_types::{Principal, PrincipalProfile};

/// Default forwarded-for header name.
pub const DEFAULT_FORWARDED_HEADER: &str = "x-forwarded-for";

/// Maps transport envelopes to request contexts.
#[derive(Debug, Clone)]
pub struct ContextExtractor {
    trust_forwarded_for: bool,
    forwarded_header: String,
}

impl Default for ContextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextExtractor {
    /// Extractor that uses the connection peer address only.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trust_forwarded_for: false,
            forwarded_header: DEFAULT_FORWARDED_HEADER.to_string(),
        }
    }

    /// Extractor configured from `[context]`.
    #[must_use]
    pub fn from_config(config: &ContextConfig) -> Self {
        Self {
            trust_forwarded_for: config.trust_forwarded_for,
            forwarded_header: config.forwarded_header.to_ascii_lowercase(),
        }
    }

    /// Trusts the first entry of `header` as the source address.
    #[must_use]
    pub fn trust_forwarded_header(mut self, header: &str) -> Self {
        self.trust_forwarded_for = true;
        self.forwarded_header = header.to_ascii_lowercase();
        self
    }

    /// Extracts a context stamped with the current local time.
    #[must_use]
    pub fn extract(&self, request: &TransportRequest) -> RequestContext {
        self.extract_at(request, Local::now())
    }

    /// Extracts a context stamped with `now`.
    #[must_use]
    pub fn extract_at(&self, request: &TransportRequest, now: DateTime<Local>) -> RequestContext {
        let ctx = match request {
            TransportRequest::Http(http) => self.http_context(http, now),
            TransportRequest::GraphQl(gql) => self.graphql_context(gql, now),
            TransportRequest::Rpc(rpc) => Self::rpc_context(rpc, now),
            TransportRequest::Unsupported => {
                tracing::debug!("unsupported transport, using empty context");
                RequestContext::empty_at(now)
            }
        };
        tracing::trace!(
            transport = request.kind(),
            principal = ?ctx.principal.as_ref().map(|p| p.id.as_str()),
            ip = ?ctx.ip,
            "extracted request context"
        );
        ctx
    }

    fn http_context(&self, http: &HttpRequest, now: DateTime<Local>) -> RequestContext {
        RequestContext {
            principal: http.principal.as_ref().and_then(parse_principal),
            ip: self.source_ip(&http.headers, http.remote_addr.as_deref()),
            body: http.body.clone(),
            params: http.params.clone(),
            timestamp: now,
        }
    }

    fn graphql_context(&self, gql: &GraphQlRequest, now: DateTime<Local>) -> RequestContext {
        RequestContext {
            principal: gql.principal.as_ref().and_then(parse_principal),
            ip: self.source_ip(&gql.headers, gql.remote_addr.as_deref()),
            body: gql.args.clone(),
            params: BTreeMap::new(),
            timestamp: now,
        }
    }

    fn rpc_context(rpc: &RpcRequest, now: DateTime<Local>) -> RequestContext {
        let mut body: Map<String, Value> = rpc.data.clone();
        let user = body.remove("user");
        RequestContext {
            principal: user.as_ref().and_then(parse_principal),
            ip: rpc.peer.clone(),
            body,
            params: BTreeMap::new(),
            timestamp: now,
        }
    }

    fn source_ip(&self, headers: &BTreeMap<String, String>, remote: Option<&str>) -> Option<String> {
        if self.trust_forwarded_for {
            let forwarded = headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(&self.forwarded_header))
                .and_then(|(_, v)| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(ip) = forwarded {
                return Some(ip.to_string());
            }
        }
        remote.map(str::to_string)
    }
}

/// Parses an authenticated user object into a [`Principal`].
#[must_use]
pub fn parse_principal(value: &Value) -> Option<Principal> {
    let obj = value.as_object()?;
    let engine_shape = obj.contains_key("attributes")
        || obj
            .get("roles")
            .and_then(Value::as_array)
            .is_some_and(|roles| roles.iter().any(Value::is_string));

    let parsed = if engine_shape {
        serde_json::from_value::<Principal>(value.clone())
    } else {
        serde_json::from_value::<PrincipalProfile>(value.clone()).map(PrincipalProfile::into_principal)
    };

    match parsed {
        Ok(principal) => Some(principal),
        Err(e) => {
            tracing::warn!(error = %e, "unreadable principal object, treating request as anonymous");
            None
        }
    }
}
