//! Datagram decoding: raw packet text into a typed `Observation`

use crate::schema;
use crate::types::{Observation, RawValue};
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// Wire attributes used for addressing, never treated as data fields
pub const RESERVED_KEYS: [&str; 3] = ["type", "serial_number", "hub_sn"];

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("packet has no 'type' attribute")]
    MissingType,
}

/// Decode one raw datagram.
///
/// Field-group values arrive in three wire shapes: a doubly-nested sequence
/// (`"obs": [[...]]`, unwrap the single-element wrapper), a plain sequence
/// (`"evt": [...]`, take as-is), or a bare scalar (`"uptime": 86400`, wrap).
/// All three are normalized here so downstream consumers never see wrapper
/// shape.
pub fn decode(raw: &[u8]) -> Result<Observation, DecodeError> {
    let value: Value =
        serde_json::from_slice(raw).map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| DecodeError::MalformedPayload("not a JSON object".to_string()))?;

    let message_type = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)?
        .to_string();
    let serial_number = object
        .get("serial_number")
        .and_then(Value::as_str)
        .map(str::to_string);
    let hub_serial = object
        .get("hub_sn")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut field_groups = Vec::with_capacity(object.len());
    for (key, group_value) in object {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        field_groups.push((key.clone(), normalize_group(group_value)));
    }

    let timestamp = embedded_timestamp(&message_type, &field_groups);

    Ok(Observation {
        message_type,
        serial_number,
        hub_serial,
        timestamp,
        field_groups,
    })
}

fn normalize_group(value: &Value) -> Vec<RawValue> {
    match value {
        Value::Array(items) => match items.first() {
            // single-element outer wrapper around the real sequence
            Some(Value::Array(inner)) => inner.iter().map(RawValue::from).collect(),
            _ => items.iter().map(RawValue::from).collect(),
        },
        scalar => vec![RawValue::from(scalar)],
    }
}

/// The observation's own time: whichever field the schema names `timestamp`,
/// interpreted as UTC epoch seconds. Unknown message types (and messages
/// without a timestamp field) yield `None`.
fn embedded_timestamp(
    message_type: &str,
    field_groups: &[(String, Vec<RawValue>)],
) -> Option<DateTime<Utc>> {
    let schema = schema::message_schema(message_type)?;
    for (group, values) in field_groups {
        let Some(group_schema) = schema.group(group) else {
            continue;
        };
        for (index, value) in values.iter().enumerate() {
            let Some(def) = group_schema.fields.get(index) else {
                continue;
            };
            if def.name == "timestamp" {
                return DateTime::from_timestamp(value.as_i64()?, 0);
            }
        }
    }
    None
}
