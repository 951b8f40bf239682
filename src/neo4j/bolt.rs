//! Conversion between JSON property values and Bolt values
//!
//! Neo4j stores scalars and homogeneous scalar lists. Everything else a
//! caller sends (objects, mixed or nested lists, integers beyond `i64`) is
//! folded into one JSON text property, [`EXTRA_PROPERTIES`], and unfolded on
//! read, so [`node_properties`] is the inverse of [`properties_to_bolt`].

use crate::notes::{Properties, EXTRA_PROPERTIES};
use neo4rs::BoltType;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Convert one JSON value into a Bolt value Neo4j can store without loss.
///
/// Returns `None` for `null` and for values that have no lossless native
/// property form.
pub fn json_to_bolt(value: &Value) -> Option<BoltType> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::Bool(b) => Some(BoltType::from(*b)),
        Value::Number(n) => number_to_bolt(n),
        Value::String(s) => Some(BoltType::from(s.clone())),
        Value::Array(items) if is_homogeneous(items) => items
            .iter()
            .map(json_to_bolt)
            .collect::<Option<Vec<BoltType>>>()
            .map(BoltType::from),
        Value::Array(_) => None,
    }
}

fn number_to_bolt(n: &serde_json::Number) -> Option<BoltType> {
    if let Some(i) = n.as_i64() {
        Some(BoltType::from(i))
    } else if n.is_f64() {
        n.as_f64().map(BoltType::from)
    } else {
        None
    }
}

/// Element kind of a list Neo4j accepts as a property
#[derive(PartialEq)]
enum ScalarKind {
    Text,
    Flag,
    Integer,
    Float,
}

fn scalar_kind(value: &Value) -> Option<ScalarKind> {
    match value {
        Value::String(_) => Some(ScalarKind::Text),
        Value::Bool(_) => Some(ScalarKind::Flag),
        Value::Number(n) if n.as_i64().is_some() => Some(ScalarKind::Integer),
        Value::Number(n) if n.is_f64() => Some(ScalarKind::Float),
        _ => None,
    }
}

fn is_homogeneous(items: &[Value]) -> bool {
    let mut kinds = items.iter().map(scalar_kind);
    match kinds.next() {
        None => true,
        Some(None) => false,
        Some(Some(first)) => kinds.all(|kind| kind.as_ref() == Some(&first)),
    }
}

/// Property map parameter for `SET n += $props`. Nulls are skipped.
pub fn properties_to_bolt(properties: &Properties) -> HashMap<String, BoltType> {
    let mut bolt = HashMap::new();
    let mut extra = Map::new();
    for (key, value) in properties.iter().filter(|(_, v)| !v.is_null()) {
        match json_to_bolt(value) {
            Some(native) => {
                bolt.insert(key.clone(), native);
            }
            None => {
                extra.insert(key.clone(), value.clone());
            }
        }
    }
    if !extra.is_empty() {
        bolt.insert(
            EXTRA_PROPERTIES.to_string(),
            BoltType::from(Value::Object(extra).to_string()),
        );
    }
    bolt
}

/// Read every property of a node back into JSON, unfolding
/// [`EXTRA_PROPERTIES`]. Properties that do not map onto JSON are skipped.
pub fn node_properties(node: &neo4rs::Node) -> Properties {
    let mut properties = Properties::new();
    for key in node.keys() {
        if key == EXTRA_PROPERTIES {
            continue;
        }
        match node.get::<Value>(key) {
            Ok(value) => {
                properties.insert(key.to_string(), value);
            }
            Err(e) => tracing::debug!(key, error = %e, "Skipping unreadable node property"),
        }
    }

    if let Ok(text) = node.get::<String>(EXTRA_PROPERTIES) {
        match serde_json::from_str::<Map<String, Value>>(&text) {
            Ok(extra) => properties.extend(extra),
            Err(e) => tracing::warn!(error = %e, "Ignoring malformed {} property", EXTRA_PROPERTIES),
        }
    }
    properties
}
