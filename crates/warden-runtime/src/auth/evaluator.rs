//! Policy evaluation.
//!
//! ```text
//! evaluate(policy, ctx)
//!   ├── unavailable        → false
//!   ├── effect = DENY      → false
//!   └── effect = ALLOW     → compile(conditions)? → holds(tree, ctx)
//! ```
//!
//! Condition evaluation is synchronous and total once the tree has been
//! parsed. The clock is read from [`RequestContext::timestamp`], never
//! from the system, so a decision is reproducible from its context.

use chrono::{DateTime, Datelike, Local, Timelike};
use serde_json::Value;
use std::sync::Arc;
use warden_auth::{
    AuthError, Composite, Condition, Lifecycle, Policy, PolicyEffect, PolicyStore, RequestContext,
    Stores, TimeCondition,
};

/// Evaluates named policies against request contexts.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    policies: Arc<dyn PolicyStore>,
}

impl PolicyEvaluator {
    /// Creates an evaluator over a policy store.
    pub fn new(policies: Arc<dyn PolicyStore>) -> Self {
        Self { policies }
    }

    /// Creates an evaluator from a store bundle.
    #[must_use]
    pub fn from_stores(stores: &Stores) -> Self {
        Self::new(Arc::clone(&stores.policies))
    }

    /// Looks `name` up and evaluates it. A missing policy is `false`.
    ///
    /// # Errors
    ///
    /// Malformed conditions and store failures.
    pub async fn evaluate_named(&self, name: &str, ctx: &RequestContext) -> Result<bool, AuthError> {
        match self.policies.find_by_name(name).await? {
            Some(policy) => Self::evaluate(&policy, ctx),
            None => {
                tracing::debug!(policy = name, "policy not found");
                Ok(false)
            }
        }
    }

    /// Evaluates a policy.
    ///
    /// # Errors
    ///
    /// [`AuthError::MalformedCondition`] if an active `ALLOW` policy's
    /// conditions cannot be parsed.
    pub fn evaluate(policy: &Policy, ctx: &RequestContext) -> Result<bool, AuthError> {
        if !policy.is_available() {
            tracing::debug!(policy = %policy.name, "policy unavailable");
            return Ok(false);
        }
        if policy.effect == PolicyEffect::Deny {
            return Ok(false);
        }
        let condition = policy.compile()?;
        Ok(holds(&condition, ctx))
    }
}

/// Evaluates a parsed condition tree.
#[must_use]
pub fn holds(condition: &Condition, ctx: &RequestContext) -> bool {
    let principal = ctx.active_principal();
    match condition {
        Condition::Time(time) => time_matches(time, ctx.timestamp),
        Condition::IpAllowlist { allowed_ips } => match (allowed_ips, &ctx.ip) {
            (Some(allowed), Some(ip)) => allowed.iter().any(|a| a == ip),
            _ => true,
        },
        Condition::Attribute { attributes } => attributes.as_ref().map_or(true, |required| {
            required
                .iter()
                .all(|(key, value)| principal.and_then(|p| p.attribute(key)) == Some(value))
        }),
        Condition::Ownership { resource_field } => {
            let owner = resource_field.as_deref().and_then(|field| ctx.lookup(field));
            match (owner, principal) {
                (Some(Value::String(owner)), Some(p)) => owner == p.id.as_str(),
                _ => false,
            }
        }
        Condition::Composite(Composite::All(children)) => children.iter().all(|c| holds(c, ctx)),
        Condition::Composite(Composite::Any(children)) => children.iter().any(|c| holds(c, ctx)),
        Condition::Composite(Composite::Not(inner)) => !holds(inner, ctx),
        Condition::Fallback { user_id } => match user_id {
            None => true,
            Some(pinned) => principal.is_some_and(|p| pinned.as_str() == Some(p.id.as_str())),
        },
    }
}

fn time_matches(time: &TimeCondition, now: DateTime<Local>) -> bool {
    if let Some((start, end)) = time.window {
        // Both casts are bounded: hour < 24, minute < 60.
        let minutes = (now.hour() * 60 + now.minute()) as u16;
        return start <= minutes && minutes <= end;
    }
    if let Some(days) = &time.days_of_week {
        let weekday = now.weekday().num_days_from_sunday() as u8;
        return days.contains(&weekday);
    }
    true
}
