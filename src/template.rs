// Copyright (c) 2025 - Cowboy AI, Inc.
//! Template Synthesis
//!
//! Pure rendering of a [`ResourceGraph`] into the declarative template
//! document the provisioning engine consumes.
//!
//! # Layout
//!
//! ```text
//! {
//!   "AWSTemplateFormatVersion": "2010-09-09",
//!   "Description": ...,
//!   "Parameters": { id: { Type, Default, Description } },
//!   "Resources":  { id: { Type, Properties, DependsOn? } },
//!   "Outputs":    { name: { Description, Value, Export? } }
//! }
//! ```
//!
//! `DependsOn` only lists edges that no `Ref`/`Fn::GetAtt` in the
//! properties already implies; the engine derives the rest itself.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::graph::{Output, Parameter, ResourceGraph, ResourceNode};

/// Template format version understood by the engine
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// A rendered stack ready for submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizedStack {
    pub stack_name: String,
    pub template: Value,
}

impl SynthesizedStack {
    /// Render a graph
    pub fn from_graph(graph: &ResourceGraph) -> Self {
        Self {
            stack_name: graph.stack_name().to_string(),
            template: synthesize(graph),
        }
    }

    /// Number of declared resources in the template
    pub fn resource_count(&self) -> usize {
        self.template
            .get("Resources")
            .and_then(Value::as_object)
            .map_or(0, Map::len)
    }

    /// Pretty-printed template text
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.template)
    }
}

fn render_parameter(parameter: &Parameter) -> Value {
    let mut rendered = Map::new();
    rendered.insert("Type".to_string(), json!(parameter.parameter_type));
    if let Some(default) = &parameter.default {
        rendered.insert("Default".to_string(), json!(default));
    }
    if let Some(description) = &parameter.description {
        rendered.insert("Description".to_string(), json!(description));
    }
    Value::Object(rendered)
}

fn render_node(node: &ResourceNode) -> Value {
    let mut rendered = Map::new();
    rendered.insert("Type".to_string(), json!(node.resource_type.as_str()));

    let properties: Map<String, Value> = node
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    rendered.insert("Properties".to_string(), Value::Object(properties));

    let explicit: Vec<&str> = node
        .explicit_dependencies()
        .into_iter()
        .map(|id| id.as_str())
        .collect();
    if !explicit.is_empty() {
        rendered.insert("DependsOn".to_string(), json!(explicit));
    }

    rendered.insert(
        "Metadata".to_string(),
        json!({ "aws:cdk:path": node.path }),
    );

    Value::Object(rendered)
}

fn render_output(output: &Output) -> Value {
    let mut rendered = Map::new();
    rendered.insert("Description".to_string(), json!(output.description));
    rendered.insert("Value".to_string(), output.value.clone());
    if let Some(export) = &output.export_name {
        rendered.insert("Export".to_string(), json!({ "Name": export }));
    }
    Value::Object(rendered)
}

/// Render a graph into its template document
///
/// Resources appear in graph insertion order, so the document reads in
/// creation order.
pub fn synthesize(graph: &ResourceGraph) -> Value {
    let mut template = Map::new();
    template.insert(
        "AWSTemplateFormatVersion".to_string(),
        json!(TEMPLATE_FORMAT_VERSION),
    );
    if let Some(description) = graph.description() {
        template.insert("Description".to_string(), json!(description));
    }

    if !graph.parameters().is_empty() {
        let parameters: Map<String, Value> = graph
            .parameters()
            .iter()
            .map(|p| (p.logical_id.to_string(), render_parameter(p)))
            .collect();
        template.insert("Parameters".to_string(), Value::Object(parameters));
    }

    let resources: Map<String, Value> = graph
        .nodes()
        .iter()
        .map(|n| (n.logical_id.to_string(), render_node(n)))
        .collect();
    template.insert("Resources".to_string(), Value::Object(resources));

    if !graph.outputs().is_empty() {
        let outputs: Map<String, Value> = graph
            .outputs()
            .iter()
            .map(|o| (o.name.clone(), render_output(o)))
            .collect();
        template.insert("Outputs".to_string(), Value::Object(outputs));
    }

    Value::Object(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceType;
    use crate::graph::intrinsic::reference;
    use crate::graph::LogicalId;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_synthesize_small_graph() {
        let mut graph = ResourceGraph::new("S").with_description("d");
        let vpc = graph
            .add_node(
                ResourceNode::new(LogicalId::new("Vpc1"), "VPC", ResourceType::Vpc)
                    .with_attribute("CidrBlock", "10.0.0.0/16"),
            )
            .unwrap();
        graph
            .add_node(
                ResourceNode::new(LogicalId::new("Role1"), "Role", ResourceType::IamRole)
                    .with_dependency(&vpc),
            )
            .unwrap();
        graph
            .add_output(Output::new("VpcId", "VPC ID", reference(&vpc)).exported_from("S"))
            .unwrap();

        assert_eq!(
            synthesize(&graph),
            json!({
                "AWSTemplateFormatVersion": "2010-09-09",
                "Description": "d",
                "Resources": {
                    "Vpc1": {
                        "Type": "AWS::EC2::VPC",
                        "Properties": { "CidrBlock": "10.0.0.0/16" },
                        "Metadata": { "aws:cdk:path": "VPC" }
                    },
                    "Role1": {
                        "Type": "AWS::IAM::Role",
                        "Properties": {},
                        "DependsOn": ["Vpc1"],
                        "Metadata": { "aws:cdk:path": "Role" }
                    }
                },
                "Outputs": {
                    "VpcId": {
                        "Description": "VPC ID",
                        "Value": { "Ref": "Vpc1" },
                        "Export": { "Name": "S-VpcId" }
                    }
                }
            })
        );
    }

    #[test]
    fn test_referenced_edges_not_repeated() {
        let mut graph = ResourceGraph::new("S");
        let vpc = graph
            .add_node(ResourceNode::new(LogicalId::new("Vpc1"), "VPC", ResourceType::Vpc))
            .unwrap();
        graph
            .add_node(
                ResourceNode::new(LogicalId::new("Sg1"), "Sg", ResourceType::SecurityGroup)
                    .with_attribute("VpcId", reference(&vpc)),
            )
            .unwrap();

        let stack = SynthesizedStack::from_graph(&graph);
        assert_eq!(stack.resource_count(), 2);
        assert!(stack.template["Resources"]["Sg1"].get("DependsOn").is_none());
        assert!(stack.template.get("Outputs").is_none());
    }
}
