// Copyright (c) 2025 - Cowboy AI, Inc.
//! Intrinsic references
//!
//! Attribute values are plain JSON. Values that the engine resolves at
//! deployment time (another node's id, a generated ARN, the region) are
//! written in the engine's intrinsic-function form so the graph stays a pure
//! description.

use serde_json::{json, Value};
use std::collections::BTreeSet;

use super::LogicalId;

/// Engine-provided pseudo parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    Partition,
    Region,
}

impl Pseudo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Partition => "AWS::Partition",
            Self::Region => "AWS::Region",
        }
    }
}

/// `Ref` to a node or parameter (its primary identifier once created)
pub fn reference(id: &LogicalId) -> Value {
    json!({ "Ref": id.as_str() })
}

/// `Fn::GetAtt` of a node's runtime attribute
pub fn get_att(id: &LogicalId, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [id.as_str(), attribute] })
}

/// `Ref` to a pseudo parameter
pub fn pseudo(parameter: Pseudo) -> Value {
    json!({ "Ref": parameter.as_str() })
}

/// `Fn::Base64` of a value
pub fn base64(value: Value) -> Value {
    json!({ "Fn::Base64": value })
}

/// Concatenate parts, folding to a literal string when every part is one
pub fn concat(parts: Vec<Value>) -> Value {
    if parts.iter().all(Value::is_string) {
        let joined: String = parts.iter().filter_map(Value::as_str).collect();
        return Value::String(joined);
    }
    json!({ "Fn::Join": ["", parts] })
}

/// The region as a literal when known, otherwise the pseudo parameter
pub fn region(known: Option<&str>) -> Value {
    match known {
        Some(region) => Value::String(region.to_string()),
        None => pseudo(Pseudo::Region),
    }
}

fn is_pseudo(name: &str) -> bool {
    name.starts_with("AWS::")
}

/// Collect every logical id referenced through `Ref` or `Fn::GetAtt`
///
/// Pseudo parameters are skipped.
pub fn collect_references(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(target)) = map.get("Ref") {
                    if !is_pseudo(target) {
                        out.insert(target.clone());
                    }
                    return;
                }
                if let Some(Value::Array(args)) = map.get("Fn::GetAtt") {
                    if let Some(Value::String(target)) = args.first() {
                        out.insert(target.clone());
                    }
                    return;
                }
            }
            for nested in map.values() {
                collect_references(nested, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        _ => {}
    }
}
