// Copyright (c) 2025 - Cowboy AI, Inc.
//! Structural diff between two builds of a stack
//!
//! Updates are expressed by rebuilding with a changed configuration; this
//! module reports what the engine would see change.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::{LogicalId, ResourceGraph, ResourceNode};
use crate::domain::ResourceType;

/// One difference between two graphs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    NodeAdded {
        logical_id: LogicalId,
        resource_type: ResourceType,
    },
    NodeRemoved {
        logical_id: LogicalId,
        resource_type: ResourceType,
    },
    /// Same logical id, different type, attributes or edges
    NodeModified {
        logical_id: LogicalId,
        fields: Vec<String>,
    },
    OutputAdded {
        name: String,
    },
    OutputRemoved {
        name: String,
    },
    OutputModified {
        name: String,
    },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeAdded { logical_id, resource_type } => {
                write!(f, "[+] {} {}", resource_type, logical_id)
            }
            Self::NodeRemoved { logical_id, resource_type } => {
                write!(f, "[-] {} {}", resource_type, logical_id)
            }
            Self::NodeModified { logical_id, fields } => {
                write!(f, "[~] {} ({})", logical_id, fields.join(", "))
            }
            Self::OutputAdded { name } => write!(f, "[+] Output {}", name),
            Self::OutputRemoved { name } => write!(f, "[-] Output {}", name),
            Self::OutputModified { name } => write!(f, "[~] Output {}", name),
        }
    }
}

/// Ordered list of changes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphDiff {
    pub changes: Vec<Change>,
}

impl GraphDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

fn modified_fields(old: &ResourceNode, new: &ResourceNode) -> Vec<String> {
    let mut fields = Vec::new();
    if old.resource_type != new.resource_type {
        fields.push("Type".to_string());
    }
    let keys: std::collections::BTreeSet<&String> =
        old.attributes.keys().chain(new.attributes.keys()).collect();
    for key in keys {
        if old.attributes.get(key) != new.attributes.get(key) {
            fields.push(key.clone());
        }
    }
    if old.depends_on != new.depends_on {
        fields.push("DependsOn".to_string());
    }
    fields
}

/// Compare two graphs by logical id and output name
pub fn diff(old: &ResourceGraph, new: &ResourceGraph) -> GraphDiff {
    let old_nodes: BTreeMap<&LogicalId, &ResourceNode> =
        old.nodes().iter().map(|n| (&n.logical_id, n)).collect();
    let new_nodes: BTreeMap<&LogicalId, &ResourceNode> =
        new.nodes().iter().map(|n| (&n.logical_id, n)).collect();

    let mut changes = Vec::new();

    for (id, node) in &old_nodes {
        match new_nodes.get(id) {
            None => changes.push(Change::NodeRemoved {
                logical_id: (*id).clone(),
                resource_type: node.resource_type,
            }),
            Some(updated) => {
                let fields = modified_fields(node, updated);
                if !fields.is_empty() {
                    changes.push(Change::NodeModified {
                        logical_id: (*id).clone(),
                        fields,
                    });
                }
            }
        }
    }
    for (id, node) in &new_nodes {
        if !old_nodes.contains_key(id) {
            changes.push(Change::NodeAdded {
                logical_id: (*id).clone(),
                resource_type: node.resource_type,
            });
        }
    }

    for output in old.outputs() {
        match new.output(&output.name) {
            None => changes.push(Change::OutputRemoved {
                name: output.name.clone(),
            }),
            Some(updated) if updated != output => changes.push(Change::OutputModified {
                name: output.name.clone(),
            }),
            Some(_) => {}
        }
    }
    for output in new.outputs() {
        if old.output(&output.name).is_none() {
            changes.push(Change::OutputAdded {
                name: output.name.clone(),
            });
        }
    }

    GraphDiff { changes }
}
