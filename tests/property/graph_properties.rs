// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Built Graphs
//!
//! Generates environment configurations (address ranges, zones, instance
//! types, tags) and checks the structural invariants every built graph must
//! satisfy regardless of input.

use proptest::prelude::*;
use std::collections::BTreeSet;

use vpc_ec2_stack::domain::{InstanceClass, InstanceSize, InstanceType, ResourceType};
use vpc_ec2_stack::invariants::{
    validate_declaration_order, validate_graph, validate_network_reachability,
    validate_rule_symmetry,
};
use vpc_ec2_stack::stack::build;
use vpc_ec2_stack::{DeploymentTarget, EnvironmentConfig, ResourceGraph};

// ============================================================================
// Generators
// ============================================================================

fn instance_type_strategy() -> impl Strategy<Value = InstanceType> {
    let classes = prop::sample::select(vec![
        InstanceClass::T3,
        InstanceClass::T3a,
        InstanceClass::T4g,
        InstanceClass::M6i,
        InstanceClass::M7g,
        InstanceClass::C6g,
        InstanceClass::R5,
        InstanceClass::Other("m7i".to_string()),
        InstanceClass::Other("c7gn".to_string()),
    ]);
    let sizes = prop::sample::select(vec![
        InstanceSize::Micro,
        InstanceSize::Small,
        InstanceSize::Large,
        InstanceSize::Xlarge2,
    ]);
    (classes, sizes).prop_map(|(class, size)| InstanceType::of(class, size))
}

fn tag_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,11}"
}

/// Config with VPC `10.{octet}.0.0/16` and subnet `10.{octet}.{third}.0/24`
fn config_strategy() -> impl Strategy<Value = (u8, EnvironmentConfig)> {
    (
        any::<u8>(),
        0u8..=254,
        tag_strategy(),
        tag_strategy(),
        prop::sample::select(vec!["a", "b", "c"]),
        instance_type_strategy(),
    )
        .prop_map(|(octet, third, project, environment, zone, instance_type)| {
            let config = EnvironmentConfig::new()
                .with_project_tag(project)
                .with_environment_tag(environment)
                .with_vpc_cidr(format!("10.{}.0.0/16", octet))
                .with_private_subnet_cidr(format!("10.{}.{}.0/24", octet, third))
                .with_availability_zone(format!("us-east-1{}", zone))
                .with_instance_type(instance_type);
            (octet, config)
        })
}

fn target_strategy() -> impl Strategy<Value = DeploymentTarget> {
    prop_oneof![
        Just(DeploymentTarget::default()),
        Just(DeploymentTarget::in_region("us-east-1")),
    ]
}

fn build_graph(name: &str, target: &DeploymentTarget, config: &EnvironmentConfig) -> ResourceGraph {
    build(name, target, config).expect("generated configs always build")
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Every built graph satisfies the full invariant suite
    #[test]
    fn prop_built_graph_is_valid(
        (_, config) in config_strategy(),
        target in target_strategy(),
    ) {
        let graph = build_graph("PropStack", &target, &config);
        prop_assert!(validate_graph(&graph).is_ok());
    }

    /// Building twice from the same input yields identical graphs
    #[test]
    fn prop_build_is_deterministic(
        (_, config) in config_strategy(),
        target in target_strategy(),
    ) {
        let first = build_graph("PropStack", &target, &config);
        let second = build_graph("PropStack", &target, &config);
        prop_assert_eq!(first, second);
    }

    /// Edges only point backwards, and every node reaches the network
    #[test]
    fn prop_edges_are_acyclic_and_rooted((_, config) in config_strategy()) {
        let graph = build_graph("PropStack", &DeploymentTarget::default(), &config);
        prop_assert!(validate_declaration_order(&graph).is_ok());
        prop_assert!(validate_network_reachability(&graph).is_ok());
    }

    /// The HTTPS rule pair always mirrors protocol and port
    #[test]
    fn prop_rules_are_symmetric((_, config) in config_strategy()) {
        let graph = build_graph("PropStack", &DeploymentTarget::default(), &config);
        prop_assert!(validate_rule_symmetry(&graph).is_ok());
        prop_assert_eq!(graph.nodes_of_type(ResourceType::SecurityGroupIngress).count(), 1);
        prop_assert_eq!(graph.nodes_of_type(ResourceType::SecurityGroupEgress).count(), 1);
    }

    /// Configs with disjoint address ranges share no logical ids
    #[test]
    fn prop_disjoint_ranges_share_no_ids(
        (octet_a, config_a) in config_strategy(),
        (octet_b, config_b) in config_strategy(),
    ) {
        prop_assume!(octet_a != octet_b);
        let a = build_graph("PropStack", &DeploymentTarget::default(), &config_a);
        let b = build_graph("PropStack", &DeploymentTarget::default(), &config_b);
        prop_assert!(a.logical_ids().is_disjoint(&b.logical_ids()));
    }

    /// Shape does not depend on input: 14 nodes, 12 outputs, 11 exports
    #[test]
    fn prop_shape_is_fixed((_, config) in config_strategy()) {
        let graph = build_graph("PropStack", &DeploymentTarget::default(), &config);
        prop_assert_eq!(graph.nodes().len(), 14);
        prop_assert_eq!(graph.outputs().len(), 12);
        prop_assert_eq!(graph.exported_outputs().count(), 11);

        let names: BTreeSet<Option<&str>> = graph
            .nodes()
            .iter()
            .filter(|n| n.resource_type == ResourceType::Vpc)
            .map(|n| n.tag("Name"))
            .collect();
        let expected = format!("{}-vpc", config.project_tag.as_deref().unwrap_or("demo"));
        prop_assert!(names.contains(&Some(expected.as_str())));
    }
}
