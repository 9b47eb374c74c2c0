//! Access requirements.
//!
//! A [`Requirement`] is the static declaration attached to an operation:
//! which roles, permissions, policies and resource action it needs. It is
//! built in code or loaded from configuration:
//!
//! ```toml
//! [operations."documents.update"]
//! permissions = ["document:update"]
//! policies = ["business-hours"]
//! resource = { type = "document", action = "update", id = { param = "id" } }
//! ```

use crate::RequestContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What an operation needs before it may run.
///
/// Empty lists mean "not required".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirement {
    /// Whether an active principal must be present.
    pub authenticated: bool,
    /// Any one of these role names.
    pub roles: Vec<String>,
    /// All of these permission names.
    pub permissions: Vec<String>,
    /// All of these policies, evaluated in order.
    pub policies: Vec<String>,
    /// Resource action checked against the ACL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceRequirement>,
}

impl Default for Requirement {
    fn default() -> Self {
        Self {
            authenticated: true,
            roles: Vec::new(),
            permissions: Vec::new(),
            policies: Vec::new(),
            resource: None,
        }
    }
}

fn strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl Requirement {
    /// Authenticated principal, nothing else.
    #[must_use]
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// No authentication needed.
    #[must_use]
    pub fn public() -> Self {
        Self {
            authenticated: false,
            ..Self::default()
        }
    }

    /// Requires any of `roles`.
    #[must_use]
    pub fn any_role<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = strings(roles);
        self
    }

    /// Requires all of `permissions`.
    #[must_use]
    pub fn all_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = strings(permissions);
        self
    }

    /// Requires all of `policies`.
    #[must_use]
    pub fn policies<I, S>(mut self, policies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policies = strings(policies);
        self
    }

    /// Requires a resource action.
    #[must_use]
    pub fn resource(mut self, resource: ResourceRequirement) -> Self {
        self.resource = Some(resource);
        self
    }
}

/// A resource action that must be granted through the ACL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirement {
    /// Resource type.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Action that must be granted.
    pub action: String,
    /// Where the resource id comes from.
    pub id: ResourceIdSource,
}

impl ResourceRequirement {
    /// Resource id read from the path parameter `param`.
    pub fn from_param(
        resource_type: impl Into<String>,
        action: impl Into<String>,
        param: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            action: action.into(),
            id: ResourceIdSource::Param(param.into()),
        }
    }

    /// Resource id read from the body field `field`.
    pub fn from_body(
        resource_type: impl Into<String>,
        action: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            id: ResourceIdSource::Body(field.into()),
            ..Self::from_param(resource_type, action, String::new())
        }
    }
}

/// Location of the resource id in a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceIdSource {
    /// Path parameter name.
    Param(String),
    /// Body field name. String and number values are accepted.
    Body(String),
    /// Fixed id.
    Fixed(String),
}

impl ResourceIdSource {
    /// Reads the id from `ctx`.
    #[must_use]
    pub fn resolve(&self, ctx: &RequestContext) -> Option<String> {
        let id = match self {
            Self::Param(name) => ctx.params.get(name).cloned(),
            Self::Body(field) => match ctx.body.get(field)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            },
            Self::Fixed(id) => Some(id.clone()),
        };
        id.filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_requires_authentication_only() {
        let req = Requirement::default();
        assert!(req.authenticated);
        assert!(req.roles.is_empty() && req.permissions.is_empty() && req.policies.is_empty());
        assert!(!Requirement::public().authenticated);
    }

    #[test]
    fn builder() {
        let req = Requirement::authenticated()
            .any_role(["admin", "manager"])
            .all_permissions(["policy:delete"])
            .policies(["business-hours"])
            .resource(ResourceRequirement::from_param("document", "update", "id"));
        assert_eq!(req.roles, vec!["admin", "manager"]);
        assert_eq!(req.permissions, vec!["policy:delete"]);
        assert_eq!(
            req.resource.map(|r| r.id),
            Some(ResourceIdSource::Param("id".into()))
        );
    }

    #[test]
    fn id_resolution() {
        let ctx = RequestContext::empty()
            .with_param("id", "d1")
            .with_body_field("docId", json!(42))
            .with_body_field("flag", json!(true));
        assert_eq!(ResourceIdSource::Param("id".into()).resolve(&ctx), Some("d1".into()));
        assert_eq!(ResourceIdSource::Body("docId".into()).resolve(&ctx), Some("42".into()));
        assert_eq!(ResourceIdSource::Body("flag".into()).resolve(&ctx), None);
        assert_eq!(ResourceIdSource::Param("nope".into()).resolve(&ctx), None);
        assert_eq!(ResourceIdSource::Fixed("global".into()).resolve(&ctx), Some("global".into()));
    }

    #[test]
    fn from_body_builder() {
        let res = ResourceRequirement::from_body("document", "read", "docId");
        assert_eq!(res.id, ResourceIdSource::Body("docId".into()));
        assert_eq!(res.resource_type, "document");
    }

    #[test]
    fn json_shape() {
        let req: Requirement = serde_json::from_value(json!({
            "permissions": ["document:update"],
            "resource": { "type": "document", "action": "update", "id": { "param": "id" } }
        }))
        .expect("requirement json");
        assert!(req.authenticated);
        assert_eq!(
            req.resource,
            Some(ResourceRequirement::from_param("document", "update", "id"))
        );
    }
}
