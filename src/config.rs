// Copyright (c) 2025 - Cowboy AI, Inc.
//! Environment configuration and deployment target
//!
//! [`EnvironmentConfig`] is the caller-facing record: every field optional,
//! loadable from JSON. [`EnvironmentConfig::resolve`] applies the documented
//! defaults once, producing the [`ResolvedConfig`] the builder works from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::{InstanceClass, InstanceSize, InstanceType};
use crate::errors::{StackError, StackResult};

/// Default project tag
pub const DEFAULT_PROJECT_TAG: &str = "demo";

/// Default environment tag
pub const DEFAULT_ENVIRONMENT_TAG: &str = "development";

/// Default VPC address space
pub const DEFAULT_VPC_CIDR: &str = "10.0.0.0/16";

/// Default isolated subnet range
pub const DEFAULT_PRIVATE_SUBNET_CIDR: &str = "10.0.1.0/24";

/// Default availability zone
pub const DEFAULT_AVAILABILITY_ZONE: &str = "us-east-1a";

/// Default instance type (smallest general purpose burstable size)
pub const DEFAULT_INSTANCE_TYPE: InstanceType =
    InstanceType::of(InstanceClass::T3, InstanceSize::Micro);

/// Default deployment region when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Per-environment stack configuration
///
/// Empty strings are treated the same as unset fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentConfig {
    pub project_tag: Option<String>,
    pub environment_tag: Option<String>,
    pub vpc_cidr: Option<String>,
    pub private_subnet_cidr: Option<String>,
    pub availability_zone: Option<String>,
    pub instance_type: Option<InstanceType>,
    pub tags: BTreeMap<String, String>,
}

impl EnvironmentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project_tag(mut self, tag: impl Into<String>) -> Self {
        self.project_tag = Some(tag.into());
        self
    }

    pub fn with_environment_tag(mut self, tag: impl Into<String>) -> Self {
        self.environment_tag = Some(tag.into());
        self
    }

    pub fn with_vpc_cidr(mut self, cidr: impl Into<String>) -> Self {
        self.vpc_cidr = Some(cidr.into());
        self
    }

    pub fn with_private_subnet_cidr(mut self, cidr: impl Into<String>) -> Self {
        self.private_subnet_cidr = Some(cidr.into());
        self
    }

    pub fn with_availability_zone(mut self, zone: impl Into<String>) -> Self {
        self.availability_zone = Some(zone.into());
        self
    }

    pub fn with_instance_type(mut self, instance_type: InstanceType) -> Self {
        self.instance_type = Some(instance_type);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Parse a configuration from JSON text
    pub fn from_json(json: &str) -> StackResult<Self> {
        serde_json::from_str(json).map_err(|e| StackError::Configuration(e.to_string()))
    }

    /// Apply documented defaults to every unset field
    pub fn resolve(&self) -> ResolvedConfig {
        fn or_default(value: &Option<String>, default: &str) -> String {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        }

        ResolvedConfig {
            project_tag: or_default(&self.project_tag, DEFAULT_PROJECT_TAG),
            environment_tag: or_default(&self.environment_tag, DEFAULT_ENVIRONMENT_TAG),
            vpc_cidr: or_default(&self.vpc_cidr, DEFAULT_VPC_CIDR),
            private_subnet_cidr: or_default(&self.private_subnet_cidr, DEFAULT_PRIVATE_SUBNET_CIDR),
            availability_zone: or_default(&self.availability_zone, DEFAULT_AVAILABILITY_ZONE),
            instance_type: self.instance_type.clone().unwrap_or(DEFAULT_INSTANCE_TYPE),
            tags: self.tags.clone(),
        }
    }
}

/// Configuration with every default applied
///
/// CIDR blocks and zone stay as given; malformed values are passed through
/// to the provisioning engine, which rejects them at validation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub project_tag: String,
    pub environment_tag: String,
    pub vpc_cidr: String,
    pub private_subnet_cidr: String,
    pub availability_zone: String,
    pub instance_type: InstanceType,
    pub tags: BTreeMap<String, String>,
}

/// Account and region a stack is deployed into
///
/// A missing region leaves region-dependent values to the engine's
/// `AWS::Region` pseudo parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploymentTarget {
    pub account: Option<String>,
    pub region: Option<String>,
}

impl DeploymentTarget {
    pub fn new(account: Option<String>, region: Option<String>) -> Self {
        Self { account, region }
    }

    /// Target with only a region
    pub fn in_region(region: impl Into<String>) -> Self {
        Self {
            account: None,
            region: Some(region.into()),
        }
    }

    /// Load from `CDK_DEFAULT_ACCOUNT` / `CDK_DEFAULT_REGION`
    ///
    /// The region falls back to [`DEFAULT_REGION`].
    pub fn from_env() -> Self {
        let account = std::env::var("CDK_DEFAULT_ACCOUNT")
            .ok()
            .filter(|v| !v.is_empty());
        let region = std::env::var("CDK_DEFAULT_REGION")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Self {
            account,
            region: Some(region),
        }
    }
}

/// A named stack and the configuration it is built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackDefinition {
    pub stack_name: String,
    #[serde(default)]
    pub config: EnvironmentConfig,
}

impl StackDefinition {
    pub fn new(stack_name: impl Into<String>, config: EnvironmentConfig) -> Self {
        Self {
            stack_name: stack_name.into(),
            config,
        }
    }
}

/// Whole-application configuration file: target plus stack list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub target: DeploymentTarget,
    pub stacks: Vec<StackDefinition>,
}

impl AppConfig {
    /// Load an application configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> StackResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            StackError::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| StackError::Configuration(format!("{}: {}", path.display(), e)))
    }
}
