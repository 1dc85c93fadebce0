// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for vpc-ec2-stack
//!
//! Provides the fixed stack names, targets and environment configurations
//! shared by the integration tests.
//!
//! # Design Principles
//! - All test data is deterministic (no environment lookups)
//! - Fixtures build configurations; tests only build and inspect graphs
#![allow(dead_code)]

use vpc_ec2_stack::app::{development_config, staging_config, DEV_STACK_NAME, STAGING_STACK_NAME};
use vpc_ec2_stack::stack::build;
use vpc_ec2_stack::{DeploymentTarget, EnvironmentConfig, ResourceGraph};

pub const REGION: &str = "us-east-1";

pub fn target() -> DeploymentTarget {
    DeploymentTarget::in_region(REGION)
}

pub fn dev_config() -> EnvironmentConfig {
    development_config()
}

pub fn dev_graph() -> ResourceGraph {
    build(DEV_STACK_NAME, &target(), &development_config()).expect("dev stack builds")
}

pub fn staging_graph() -> ResourceGraph {
    build(STAGING_STACK_NAME, &target(), &staging_config()).expect("staging stack builds")
}

/// Stack built from an empty configuration with no known region
pub fn default_graph() -> ResourceGraph {
    build("DefaultStack", &DeploymentTarget::default(), &EnvironmentConfig::new())
        .expect("default stack builds")
}
