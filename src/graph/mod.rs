// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Graph
//!
//! Explicit description of a stack: ordered resource nodes with attribute
//! maps and dependency edges, engine-resolved parameters, and exported
//! outputs. The graph is plain data; materialization belongs to a
//! [`ProvisioningEngine`](crate::engine::ProvisioningEngine).
//!
//! # Structure
//!
//! ```text
//! Parameters ──┐
//!              ▼
//! VPC ──> Subnet ──> RouteTable ──> Association
//!  │
//!  ├──> SecurityGroups ──> Rule pair
//!  │        │
//!  │        ├──> Endpoints (×3)
//!  │        ▼
//!  └──────> Instance <── Role <── InstanceProfile
//!              │
//!              ▼
//!           Outputs
//! ```
//!
//! Nodes can only depend on nodes added before them, so insertion order is
//! always a valid creation order.

pub mod diff;
pub mod intrinsic;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::domain::{ResourceType, TagSet};

pub use diff::{diff, Change, GraphDiff};

/// Maximum logical id length accepted by the engine
const MAX_LOGICAL_ID_LENGTH: usize = 255;

/// Graph construction error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Logical id declared twice: {0}")]
    DuplicateLogicalId(String),

    #[error("Node {node} depends on {dependency}, which is not declared before it")]
    UnknownDependency { node: String, dependency: String },

    #[error("Output declared twice: {0}")]
    DuplicateOutput(String),

    #[error("Output {output} references undeclared id {reference}")]
    UnknownOutputReference { output: String, reference: String },
}

/// Stable, engine-safe resource identifier
///
/// Built from the node's construct path: the alphanumeric characters of the
/// path followed by eight hex digits of the SHA-256 of the fully scoped path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalId(String);

impl LogicalId {
    /// Wrap an id verbatim
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the id for `path` inside `scope`
    pub fn for_path(scope: &str, path: &str) -> Self {
        let human: String = path.chars().filter(|c| c.is_ascii_alphanumeric()).collect();

        let mut hasher = Sha256::new();
        hasher.update(scope.as_bytes());
        hasher.update(b"/");
        hasher.update(path.as_bytes());
        let digest = hasher.finalize();
        let suffix: String = digest[..4].iter().map(|b| format!("{:02X}", b)).collect();

        let keep = MAX_LOGICAL_ID_LENGTH - suffix.len();
        let human = if human.len() > keep { &human[..keep] } else { &human };
        Self(format!("{}{}", human, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One declared cloud resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceNode {
    pub logical_id: LogicalId,
    /// Human construct path, e.g. `VPC/PrivateSubnet1/Subnet`
    pub path: String,
    pub resource_type: ResourceType,
    pub attributes: BTreeMap<String, Value>,
    /// Every node this one must be created after (explicit and referenced)
    pub depends_on: Vec<LogicalId>,
}

impl ResourceNode {
    pub fn new(logical_id: LogicalId, path: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            logical_id,
            path: path.into(),
            resource_type,
            attributes: BTreeMap::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add an explicit ordering edge that no attribute expresses
    pub fn with_dependency(mut self, dependency: &LogicalId) -> Self {
        if !self.depends_on.contains(dependency) {
            self.depends_on.push(dependency.clone());
        }
        self
    }

    /// Set the `Tags` attribute
    pub fn with_tags(self, tags: &TagSet) -> Self {
        self.with_attribute("Tags", tags.to_value())
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Look up a tag value from the rendered `Tags` attribute
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.attributes
            .get("Tags")?
            .as_array()?
            .iter()
            .find(|t| t["Key"] == key)
            .and_then(|t| t["Value"].as_str())
    }

    /// Ids referenced from attribute values
    pub fn references(&self) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();
        for value in self.attributes.values() {
            intrinsic::collect_references(value, &mut refs);
        }
        refs
    }

    /// Edges that no attribute reference implies
    pub fn explicit_dependencies(&self) -> Vec<&LogicalId> {
        let refs = self.references();
        self.depends_on
            .iter()
            .filter(|d| !refs.contains(d.as_str()))
            .collect()
    }
}

/// Engine-resolved stack input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub logical_id: LogicalId,
    pub parameter_type: String,
    pub default: Option<String>,
    pub description: Option<String>,
}

/// Named exported value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub name: String,
    pub description: String,
    pub value: Value,
    pub export_name: Option<String>,
}

impl Output {
    pub fn new(name: impl Into<String>, description: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            value,
            export_name: None,
        }
    }

    /// Export under `{stack_name}-{name}`
    pub fn exported_from(mut self, stack_name: &str) -> Self {
        self.export_name = Some(format!("{}-{}", stack_name, self.name));
        self
    }

    pub fn references(&self) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();
        intrinsic::collect_references(&self.value, &mut refs);
        refs
    }
}

/// The full description of one stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGraph {
    stack_name: String,
    description: Option<String>,
    parameters: Vec<Parameter>,
    nodes: Vec<ResourceNode>,
    outputs: Vec<Output>,
}

impl ResourceGraph {
    pub fn new(stack_name: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            description: None,
            parameters: Vec::new(),
            nodes: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn is_declared(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.logical_id.as_str() == id)
            || self.parameters.iter().any(|p| p.logical_id.as_str() == id)
    }

    fn is_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.logical_id.as_str() == id)
    }

    /// Declare an engine-resolved parameter
    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<LogicalId, GraphError> {
        if self.is_declared(parameter.logical_id.as_str()) {
            return Err(GraphError::DuplicateLogicalId(parameter.logical_id.to_string()));
        }
        let id = parameter.logical_id.clone();
        self.parameters.push(parameter);
        Ok(id)
    }

    /// Append a node
    ///
    /// Every attribute reference becomes a dependency edge. Edges and
    /// references must point at nodes (or parameters) already in the graph.
    pub fn add_node(&mut self, mut node: ResourceNode) -> Result<LogicalId, GraphError> {
        if self.is_declared(node.logical_id.as_str()) {
            return Err(GraphError::DuplicateLogicalId(node.logical_id.to_string()));
        }

        for dependency in &node.depends_on {
            if !self.is_node(dependency.as_str()) {
                return Err(GraphError::UnknownDependency {
                    node: node.logical_id.to_string(),
                    dependency: dependency.to_string(),
                });
            }
        }

        for reference in node.references() {
            if !self.is_declared(&reference) {
                return Err(GraphError::UnknownDependency {
                    node: node.logical_id.to_string(),
                    dependency: reference,
                });
            }
            let reference = LogicalId::new(reference);
            if self.is_node(reference.as_str()) && !node.depends_on.contains(&reference) {
                node.depends_on.push(reference);
            }
        }

        debug!(
            logical_id = %node.logical_id,
            resource_type = %node.resource_type,
            edges = node.depends_on.len(),
            "Declared resource"
        );

        let id = node.logical_id.clone();
        self.nodes.push(node);
        Ok(id)
    }

    /// Append an output
    pub fn add_output(&mut self, output: Output) -> Result<(), GraphError> {
        if self.outputs.iter().any(|o| o.name == output.name) {
            return Err(GraphError::DuplicateOutput(output.name));
        }
        if let Some(missing) = output.references().into_iter().find(|r| !self.is_declared(r)) {
            return Err(GraphError::UnknownOutputReference {
                output: output.name,
                reference: missing,
            });
        }
        self.outputs.push(output);
        Ok(())
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn node(&self, id: &LogicalId) -> Option<&ResourceNode> {
        self.nodes.iter().find(|n| &n.logical_id == id)
    }

    pub fn node_by_path(&self, path: &str) -> Option<&ResourceNode> {
        self.nodes.iter().find(|n| n.path == path)
    }

    pub fn nodes_of_type(&self, resource_type: ResourceType) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.iter().filter(move |n| n.resource_type == resource_type)
    }

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name)
    }

    /// Outputs carrying an export name
    pub fn exported_outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.iter().filter(|o| o.export_name.is_some())
    }

    /// All logical ids (parameters and nodes)
    pub fn logical_ids(&self) -> BTreeSet<&LogicalId> {
        self.parameters
            .iter()
            .map(|p| &p.logical_id)
            .chain(self.nodes.iter().map(|n| &n.logical_id))
            .collect()
    }

    /// Whether `to` is reachable from `from` by following dependency edges
    pub fn reaches(&self, from: &LogicalId, to: &LogicalId) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(node) = self.node(current) {
                queue.extend(node.depends_on.iter());
            }
        }
        false
    }
}
