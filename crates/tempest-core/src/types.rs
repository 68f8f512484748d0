//! Core data types for decoded telemetry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw positional value as it appears on the wire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl RawValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Float(v) => Some(*v),
            RawValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::Integer(v) => Some(*v),
            RawValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }
}

impl From<&serde_json::Value> for RawValue {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => RawValue::Integer(i),
                None => RawValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => RawValue::Text(s.clone()),
            // nested containers are handled by group normalization; anything
            // else surviving to here is recorded verbatim
            other => RawValue::Text(other.to_string()),
        }
    }
}

/// One decoded telemetry packet
///
/// Reserved wire attributes (`type`, `serial_number`, `hub_sn`) are lifted
/// into dedicated fields and never appear in `field_groups`.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub message_type: String,
    pub serial_number: Option<String>,
    pub hub_serial: Option<String>,
    /// The packet's own embedded time, when the message carries one
    pub timestamp: Option<DateTime<Utc>>,
    /// Named field groups in deterministic order, each an ordered sequence
    /// of positional values
    pub field_groups: Vec<(String, Vec<RawValue>)>,
}

impl Observation {
    pub fn group(&self, name: &str) -> Option<&[RawValue]> {
        self.field_groups
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, values)| values.as_slice())
    }
}

/// Dot-delimited hierarchical state identifier
/// (`hub_serial.device_serial.message_type.field`)
///
/// A naming convention, not an entity: the engine builds these and the
/// state store treats them as opaque keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatePath(String);

impl StatePath {
    pub fn new(root: impl Into<String>) -> Self {
        StatePath(root.into())
    }

    pub fn child(&self, segment: &str) -> Self {
        StatePath(format!("{}.{}", self.0, segment))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into parent base and leaf segment, for interleaving derived
    /// levels (`base.today.min.leaf`)
    pub fn split_leaf(&self) -> Option<(&str, &str)> {
        self.0.rsplit_once('.')
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
