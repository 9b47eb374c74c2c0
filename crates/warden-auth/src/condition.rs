//! Policy condition trees.
//!
//! Policies store their conditions as untyped JSON with a `type`
//! discriminator. [`Condition::parse`] turns that document into a typed
//! tree once; evaluation then never touches raw JSON again.
//!
//! ```text
//! { "type": "composite", "operator": "AND", "conditions": [
//!     { "type": "time", "startTime": "09:00", "endTime": "17:00" },
//!     { "type": "ip", "allowedIps": ["10.0.0.1"] }
//! ] }
//!
//!   ──parse──►  Composite(All([Time(..), IpAllowlist(..)]))
//! ```
//!
//! | `type`        | Node |
//! |---------------|------|
//! | `"time"`      | [`Condition::Time`] |
//! | `"ip"`        | [`Condition::IpAllowlist`] |
//! | `"attribute"` | [`Condition::Attribute`] |
//! | `"ownership"` | [`Condition::Ownership`] |
//! | `"composite"` | [`Condition::Composite`] |
//! | other/absent  | [`Condition::Fallback`] |
//!
//! Anything that cannot be interpreted safely (bad `HH:MM`, unknown
//! operator, `NOT` without exactly one operand, fields of the wrong JSON
//! type) is a [`ConditionError`]. It is never read as "no restriction".

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use thiserror::Error;

/// Why a condition document could not be parsed.
#[derive(Debug, Error)]
pub enum ConditionError {
    /// The node (or the whole document) is not a JSON object.
    #[error("condition must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// A time bound is not `HH:MM`.
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    /// A weekday is outside `0..=6`.
    #[error("invalid day of week {0}, expected 0 (Sunday) to 6 (Saturday)")]
    InvalidDay(u64),

    /// Composite operator missing.
    #[error("composite condition has no operator")]
    MissingOperator,

    /// Composite operator not one of `AND`, `OR`, `NOT`.
    #[error("unknown composite operator '{0}'")]
    UnknownOperator(String),

    /// `AND`/`OR` without a child list.
    #[error("composite '{0}' has no nested conditions")]
    MissingChildren(&'static str),

    /// `NOT` needs exactly one operand.
    #[error("NOT requires exactly one nested condition, found {0}")]
    NotArity(usize),

    /// A field has the wrong JSON type.
    #[error("invalid '{node}' condition: {source}")]
    InvalidNode {
        /// Node type being parsed.
        node: &'static str,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

/// A time-of-day window and/or weekday filter.
///
/// The window applies only when both bounds are present; otherwise the
/// weekday filter applies; with neither the node is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeCondition {
    /// Inclusive `(start, end)` in minutes since midnight.
    pub window: Option<(u16, u16)>,
    /// Allowed weekdays, 0 = Sunday.
    pub days_of_week: Option<BTreeSet<u8>>,
}

/// Boolean combinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Composite {
    /// Every child must hold.
    All(Vec<Condition>),
    /// At least one child must hold.
    Any(Vec<Condition>),
    /// The operand must not hold.
    Not(Box<Condition>),
}

/// Typed condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Time-of-day / weekday restriction.
    Time(TimeCondition),
    /// Source IP allowlist. `None` means no restriction.
    IpAllowlist {
        /// Allowed addresses, compared as exact strings.
        allowed_ips: Option<Vec<String>>,
    },
    /// Principal attribute equality. `None` or empty means no restriction.
    Attribute {
        /// Required attribute values.
        attributes: Option<Map<String, Value>>,
    },
    /// The principal must own the addressed resource.
    Ownership {
        /// Body/param field holding the owner id. `None` never matches.
        resource_field: Option<String>,
    },
    /// `AND` / `OR` / `NOT`.
    Composite(Composite),
    /// Unrecognised or absent `type`; optionally pinned to one principal.
    Fallback {
        /// Principal id the node is pinned to, if any.
        user_id: Option<Value>,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeNode {
    start_time: Option<String>,
    end_time: Option<String>,
    days_of_week: Option<Vec<u64>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpNode {
    allowed_ips: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct AttributeNode {
    attributes: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnershipNode {
    resource_field: Option<String>,
}

#[derive(Deserialize)]
struct CompositeNode {
    operator: Option<String>,
    #[serde(alias = "children")]
    conditions: Option<Vec<Value>>,
    condition: Option<Value>,
}

fn decode<T: for<'de> Deserialize<'de>>(node: &'static str, value: &Value) -> Result<T, ConditionError> {
    T::deserialize(value).map_err(|source| ConditionError::InvalidNode { node, source })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parses `HH:MM` (hour may be one digit) into minutes since midnight.
pub fn parse_clock(text: &str) -> Result<u16, ConditionError> {
    let invalid = || ConditionError::InvalidTime(text.to_string());
    let (h, m) = text.trim().split_once(':').ok_or_else(invalid)?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return Err(invalid());
    }
    let hour: u16 = h.parse().map_err(|_| invalid())?;
    let minute: u16 = m.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok(hour * 60 + minute)
}

/// JavaScript-style truthiness, used for the fallback `userId` pin.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl Condition {
    /// Parses a stored condition document.
    ///
    /// A JSON `null` document is an unconditional node.
    ///
    /// # Errors
    ///
    /// [`ConditionError`] if any node cannot be interpreted.
    pub fn parse(value: &Value) -> Result<Self, ConditionError> {
        let node = match value {
            Value::Null => return Ok(Self::Fallback { user_id: None }),
            Value::Object(node) => node,
            other => return Err(ConditionError::NotAnObject(json_kind(other))),
        };

        match node.get("type").and_then(Value::as_str) {
            Some("time") => Self::parse_time(value),
            Some("ip") => {
                let node: IpNode = decode("ip", value)?;
                Ok(Self::IpAllowlist {
                    allowed_ips: node.allowed_ips,
                })
            }
            Some("attribute") => {
                let node: AttributeNode = decode("attribute", value)?;
                Ok(Self::Attribute {
                    attributes: node.attributes,
                })
            }
            Some("ownership") => {
                let node: OwnershipNode = decode("ownership", value)?;
                Ok(Self::Ownership {
                    resource_field: node.resource_field,
                })
            }
            Some("composite") => Self::parse_composite(value),
            _ => Ok(Self::Fallback {
                user_id: node.get("userId").filter(|v| truthy(v)).cloned(),
            }),
        }
    }

    fn parse_time(value: &Value) -> Result<Self, ConditionError> {
        let node: TimeNode = decode("time", value)?;
        let start = node.start_time.as_deref().map(parse_clock).transpose()?;
        let end = node.end_time.as_deref().map(parse_clock).transpose()?;
        let days_of_week = node
            .days_of_week
            .map(|days| {
                days.into_iter()
                    .map(|d| u8::try_from(d).ok().filter(|d| *d <= 6).ok_or(ConditionError::InvalidDay(d)))
                    .collect::<Result<BTreeSet<u8>, _>>()
            })
            .transpose()?;
        Ok(Self::Time(TimeCondition {
            window: start.zip(end),
            days_of_week,
        }))
    }

    fn parse_composite(value: &Value) -> Result<Self, ConditionError> {
        let node: CompositeNode = decode("composite", value)?;
        let operator = node.operator.ok_or(ConditionError::MissingOperator)?;
        let composite = match operator.as_str() {
            "AND" => Composite::All(Self::parse_children("AND", node.conditions)?),
            "OR" => Composite::Any(Self::parse_children("OR", node.conditions)?),
            "NOT" => {
                let operand = match (node.condition, node.conditions) {
                    (Some(single), None) => single,
                    (None, Some(mut list)) if list.len() == 1 => list.remove(0),
                    (None, Some(list)) => return Err(ConditionError::NotArity(list.len())),
                    (None, None) => return Err(ConditionError::NotArity(0)),
                    (Some(_), Some(list)) => return Err(ConditionError::NotArity(list.len() + 1)),
                };
                Composite::Not(Box::new(Self::parse(&operand)?))
            }
            _ => return Err(ConditionError::UnknownOperator(operator)),
        };
        Ok(Self::Composite(composite))
    }

    fn parse_children(op: &'static str, children: Option<Vec<Value>>) -> Result<Vec<Self>, ConditionError> {
        children
            .ok_or(ConditionError::MissingChildren(op))?
            .iter()
            .map(Self::parse)
            .collect()
    }
}
