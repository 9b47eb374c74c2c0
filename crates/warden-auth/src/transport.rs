//! Transport envelopes.
//!
//! The same requirement can be checked from an HTTP handler, a GraphQL
//! resolver or an RPC method. Each binding hands the engine one of these
//! envelopes; the extractor has one function per variant.
//!
//! ```text
//! Http    { principal, remote_addr, headers, body, params }
//! GraphQl { principal, remote_addr, headers, args }      args → body
//! Rpc     { data, peer }                                 data.user → principal
//! Unsupported                                            → empty context
//! ```
//!
//! Envelopes deserialize from JSON tagged by `"transport"`, which is how
//! the CLI reads recorded requests.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A raw request from one of the supported bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum TransportRequest {
    /// HTTP request.
    Http(HttpRequest),
    /// GraphQL resolver invocation.
    #[serde(rename = "graphql")]
    GraphQl(GraphQlRequest),
    /// RPC call.
    Rpc(RpcRequest),
    /// Anything else; yields an empty context.
    #[serde(other)]
    Unsupported,
}

/// HTTP envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpRequest {
    /// Authenticated user object as attached by the auth layer.
    pub principal: Option<Value>,
    /// Peer address of the connection.
    pub remote_addr: Option<String>,
    /// Request headers, lowercase names.
    #[serde(deserialize_with = "lowercase_headers")]
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON body.
    pub body: Map<String, Value>,
    /// Path parameters.
    pub params: BTreeMap<String, String>,
}

/// GraphQL envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphQlRequest {
    /// Authenticated user object from the underlying HTTP request.
    pub principal: Option<Value>,
    /// Peer address of the underlying connection.
    pub remote_addr: Option<String>,
    /// Headers of the underlying HTTP request, lowercase names.
    #[serde(deserialize_with = "lowercase_headers")]
    pub headers: BTreeMap<String, String>,
    /// Resolver arguments.
    pub args: Map<String, Value>,
}

/// RPC envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcRequest {
    /// Call payload; its `user` field carries the principal.
    pub data: Map<String, Value>,
    /// Peer address.
    pub peer: Option<String>,
}

fn lowercase_headers<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value))
        .collect())
}

impl TransportRequest {
    /// Binding name, for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::GraphQl(_) => "graphql",
            Self::Rpc(_) => "rpc",
            Self::Unsupported => "unsupported",
        }
    }
}

impl HttpRequest {
    /// Sets the principal object.
    #[must_use]
    pub fn with_principal(mut self, principal: Value) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Sets a path parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Sets a body field.
    #[must_use]
    pub fn with_body_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.body.insert(key.into(), value);
        self
    }

    /// Sets a header; the name is lowercased.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Sets the peer address.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }
}

impl From<HttpRequest> for TransportRequest {
    fn from(req: HttpRequest) -> Self {
        Self::Http(req)
    }
}

impl From<GraphQlRequest> for TransportRequest {
    fn from(req: GraphQlRequest) -> Self {
        Self::GraphQl(req)
    }
}

impl From<RpcRequest> for TransportRequest {
    fn from(req: RpcRequest) -> Self {
        Self::Rpc(req)
    }
}
