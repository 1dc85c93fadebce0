// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Graph Invariants
//!
//! Structural checks over a built [`ResourceGraph`], plus an opt-in lint of
//! a resolved configuration. The builder never calls these; they exist so
//! tests and callers can assert the shape of what will be handed to the
//! provisioning engine.
//!
//! # Invariant Categories
//!
//! 1. **Ordering**: edges only point at earlier nodes, ids are unique
//! 2. **Topology**: one network, one isolated subnet shared by compute and endpoints
//! 3. **Security**: every cross-group rule has its mirror on the peer group
//! 4. **Reachability**: every node leads back to the network
//!
//! # Design Principles
//!
//! - **Pure Functions**: No I/O, no mutations, deterministic
//! - **Explicit Errors**: Return the first violation found with its context
//! - **Composable**: [`validate_graph`] chains the individual checks

use serde_json::Value;
use std::collections::HashSet;

use crate::config::{DeploymentTarget, ResolvedConfig};
use crate::domain::{CidrBlock, NetworkError, ResourceType};
use crate::graph::{LogicalId, ResourceGraph, ResourceNode};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Smallest VPC or subnet prefix the engine accepts
pub const MIN_VPC_PREFIX: u8 = 16;

/// Largest VPC or subnet prefix the engine accepts
pub const MAX_NETWORK_PREFIX: u8 = 28;

/// Validation error with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Two nodes or parameters share an id
    #[error("Duplicate logical id: {0}")]
    DuplicateLogicalId(String),

    /// Edge to a node declared later (or not at all)
    #[error("Node {node} depends on {dependency}, which is not declared before it")]
    ForwardReference { node: String, dependency: String },

    /// Not exactly one network node
    #[error("Expected exactly one network node, found {0}")]
    NetworkCount(usize),

    /// Not exactly one subnet node
    #[error("Expected exactly one isolated subnet, found {0}")]
    SubnetCount(usize),

    /// Compute or endpoint node not placed in the subnet
    #[error("Node {0} is not placed in the isolated subnet")]
    DetachedFromSubnet(String),

    /// Cross-group rule without its mirror rule
    #[error("Rule {rule} on {group} has no matching {expected} rule on {peer} for {port}")]
    AsymmetricRule {
        rule: String,
        group: String,
        peer: String,
        expected: &'static str,
        port: String,
    },

    /// Node with no edge path to the network node
    #[error("Node {0} does not reach the network node")]
    Unreachable(String),

    /// Malformed address range
    #[error("Invalid network range: {0}")]
    Network(#[from] NetworkError),

    /// Subnet range outside the VPC range
    #[error("Subnet {subnet} is not inside VPC range {vpc}")]
    SubnetOutsideVpc { subnet: String, vpc: String },

    /// Prefix outside what the engine accepts
    #[error("Prefix /{prefix} for {range} is outside /{min}-/{max}")]
    PrefixOutOfRange {
        range: String,
        prefix: u8,
        min: u8,
        max: u8,
    },

    /// Availability zone from another region
    #[error("Availability zone {zone} is not in region {region}")]
    ZoneOutsideRegion { zone: String, region: String },
}

fn get_att_target(value: Option<&Value>) -> Option<&str> {
    value?.get("Fn::GetAtt")?.as_array()?.first()?.as_str()
}

fn ref_target(value: &Value) -> Option<&str> {
    value.get("Ref")?.as_str()
}

/// Validate logical ids are unique across parameters and nodes
pub fn validate_unique_logical_ids(graph: &ResourceGraph) -> ValidationResult {
    let mut seen = HashSet::new();
    let ids = graph
        .parameters()
        .iter()
        .map(|p| &p.logical_id)
        .chain(graph.nodes().iter().map(|n| &n.logical_id));
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateLogicalId(id.to_string()));
        }
    }
    Ok(())
}

/// Validate every edge points at a node declared earlier
pub fn validate_declaration_order(graph: &ResourceGraph) -> ValidationResult {
    let mut declared: HashSet<&LogicalId> = HashSet::new();
    for node in graph.nodes() {
        if let Some(dependency) = node.depends_on.iter().find(|d| !declared.contains(d)) {
            return Err(ValidationError::ForwardReference {
                node: node.logical_id.to_string(),
                dependency: dependency.to_string(),
            });
        }
        declared.insert(&node.logical_id);
    }
    Ok(())
}

/// Validate there is exactly one network node
pub fn validate_single_network(graph: &ResourceGraph) -> ValidationResult {
    match graph.nodes_of_type(ResourceType::Vpc).count() {
        1 => Ok(()),
        n => Err(ValidationError::NetworkCount(n)),
    }
}

fn placed_in(node: &ResourceNode, subnet: &LogicalId) -> bool {
    let single = node.attribute("SubnetId").and_then(ref_target);
    let listed = node
        .attribute("SubnetIds")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(ref_target).collect::<Vec<_>>())
        .unwrap_or_default();

    match (single, listed.as_slice()) {
        (Some(id), []) => id == subnet.as_str(),
        (None, [id]) => *id == subnet.as_str(),
        _ => false,
    }
}

/// Validate one isolated subnet hosts every compute and endpoint node
pub fn validate_single_subnet(graph: &ResourceGraph) -> ValidationResult {
    let subnets: Vec<&ResourceNode> = graph.nodes_of_type(ResourceType::Subnet).collect();
    let subnet = match subnets.as_slice() {
        [subnet] => &subnet.logical_id,
        other => return Err(ValidationError::SubnetCount(other.len())),
    };

    let hosted = graph.nodes().iter().filter(|n| {
        matches!(
            n.resource_type,
            ResourceType::Instance | ResourceType::VpcEndpoint
        )
    });
    for node in hosted {
        if !placed_in(node, subnet) {
            return Err(ValidationError::DetachedFromSubnet(node.logical_id.to_string()));
        }
    }
    Ok(())
}

/// A cross-group rule reduced to what symmetry compares
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupRule<'a> {
    group: &'a str,
    peer: &'a str,
    protocol: Option<&'a str>,
    from_port: Option<i64>,
    to_port: Option<i64>,
}

impl<'a> GroupRule<'a> {
    fn parse(node: &'a ResourceNode, peer_key: &str) -> Option<Self> {
        Some(Self {
            group: get_att_target(node.attribute("GroupId"))?,
            peer: get_att_target(node.attribute(peer_key))?,
            protocol: node.attribute("IpProtocol").and_then(Value::as_str),
            from_port: node.attribute("FromPort").and_then(Value::as_i64),
            to_port: node.attribute("ToPort").and_then(Value::as_i64),
        })
    }

    fn mirrored(&self) -> Self {
        Self {
            group: self.peer,
            peer: self.group,
            ..self.clone()
        }
    }

    fn port(&self) -> String {
        format!(
            "{} {}-{}",
            self.protocol.unwrap_or("?"),
            self.from_port.unwrap_or(-1),
            self.to_port.unwrap_or(-1)
        )
    }
}

fn group_rules<'a>(
    graph: &'a ResourceGraph,
    resource_type: ResourceType,
    peer_key: &str,
) -> Vec<(&'a ResourceNode, GroupRule<'a>)> {
    graph
        .nodes_of_type(resource_type)
        .filter_map(|n| GroupRule::parse(n, peer_key).map(|r| (n, r)))
        .collect()
}

/// Validate security group rules come in mirrored pairs
///
/// Every egress rule from group A to group B needs an ingress rule on B
/// from A with the same protocol and port range, and the reverse.
pub fn validate_rule_symmetry(graph: &ResourceGraph) -> ValidationResult {
    let egress = group_rules(graph, ResourceType::SecurityGroupEgress, "DestinationSecurityGroupId");
    let ingress = group_rules(graph, ResourceType::SecurityGroupIngress, "SourceSecurityGroupId");

    let ingress_set: HashSet<&GroupRule> = ingress.iter().map(|(_, r)| r).collect();
    let egress_set: HashSet<&GroupRule> = egress.iter().map(|(_, r)| r).collect();

    for (rules, counterpart, expected) in [
        (&egress, &ingress_set, "ingress"),
        (&ingress, &egress_set, "egress"),
    ] {
        for (node, rule) in rules {
            if !counterpart.contains(&rule.mirrored()) {
                return Err(ValidationError::AsymmetricRule {
                    rule: node.logical_id.to_string(),
                    group: rule.group.to_string(),
                    peer: rule.peer.to_string(),
                    expected,
                    port: rule.port(),
                });
            }
        }
    }
    Ok(())
}

/// Validate every non-network node reaches the network node
pub fn validate_network_reachability(graph: &ResourceGraph) -> ValidationResult {
    validate_single_network(graph)?;
    let network = graph
        .nodes_of_type(ResourceType::Vpc)
        .map(|n| &n.logical_id)
        .next()
        .ok_or(ValidationError::NetworkCount(0))?;

    for node in graph.nodes() {
        if &node.logical_id != network && !graph.reaches(&node.logical_id, network) {
            return Err(ValidationError::Unreachable(node.logical_id.to_string()));
        }
    }
    Ok(())
}

/// Composite validation of every graph invariant
pub fn validate_graph(graph: &ResourceGraph) -> ValidationResult {
    validate_unique_logical_ids(graph)?;
    validate_declaration_order(graph)?;
    validate_single_network(graph)?;
    validate_single_subnet(graph)?;
    validate_rule_symmetry(graph)?;
    validate_network_reachability(graph)?;
    Ok(())
}

fn check_prefix(block: &CidrBlock, min: u8) -> ValidationResult {
    let prefix = block.prefix_length();
    if prefix < min || prefix > MAX_NETWORK_PREFIX {
        return Err(ValidationError::PrefixOutOfRange {
            range: block.to_string(),
            prefix,
            min,
            max: MAX_NETWORK_PREFIX,
        });
    }
    Ok(())
}

/// Lint a resolved configuration before deployment
///
/// # Rules
/// - VPC and subnet ranges parse as canonical IPv4 CIDR blocks
/// - VPC and subnet prefixes /16-/28
/// - Subnet lies inside the VPC
/// - Zone belongs to the target region, when the region is known
pub fn preflight_config(config: &ResolvedConfig, target: &DeploymentTarget) -> ValidationResult {
    let vpc = CidrBlock::new(&config.vpc_cidr)?;
    let subnet = CidrBlock::new(&config.private_subnet_cidr)?;

    check_prefix(&vpc, MIN_VPC_PREFIX)?;
    check_prefix(&subnet, MIN_VPC_PREFIX)?;

    if !vpc.contains(&subnet) {
        return Err(ValidationError::SubnetOutsideVpc {
            subnet: subnet.to_string(),
            vpc: vpc.to_string(),
        });
    }

    if let Some(region) = target.region.as_deref() {
        let suffix = config.availability_zone.strip_prefix(region);
        let in_region = matches!(suffix, Some(s) if s.len() == 1 && s.chars().all(|c| c.is_ascii_lowercase()));
        if !in_region {
            return Err(ValidationError::ZoneOutsideRegion {
                zone: config.availability_zone.clone(),
                region: region.to_string(),
            });
        }
    }

    Ok(())
}

/// An allow statement granted to an unrestricted principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenGrant {
    pub logical_id: LogicalId,
    pub path: String,
    pub actions: Vec<String>,
}

fn statement_is_open(statement: &Value) -> bool {
    let allows = statement.get("Effect").and_then(Value::as_str) == Some("Allow");
    let principal = statement.get("Principal");
    let open = match principal {
        Some(Value::String(p)) => p == "*",
        Some(p) => p.get("AWS").and_then(Value::as_str) == Some("*"),
        None => false,
    };
    allows && open
}

fn statement_actions(statement: &Value) -> Vec<String> {
    match statement.get("Action") {
        Some(Value::String(action)) => vec![action.clone()],
        Some(Value::Array(actions)) => actions
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Report every resource policy that grants actions to any principal
///
/// Grants are reported, never narrowed.
pub fn open_principal_grants(graph: &ResourceGraph) -> Vec<OpenGrant> {
    graph
        .nodes()
        .iter()
        .filter_map(|node| {
            let statements = node.attribute("PolicyDocument")?.get("Statement")?.as_array()?;
            let actions: Vec<String> = statements
                .iter()
                .filter(|s| statement_is_open(s))
                .flat_map(statement_actions)
                .collect();
            (!actions.is_empty()).then(|| OpenGrant {
                logical_id: node.logical_id.clone(),
                path: node.path.clone(),
                actions,
            })
        })
        .collect()
}
