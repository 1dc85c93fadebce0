// Copyright (c) 2025 - Cowboy AI, Inc.
//! Application: a set of named stacks sharing one deployment target
//!
//! Stacks are built independently; nothing is shared between them except
//! the target. Deployment submits every synthesized stack concurrently.

use futures::future::try_join_all;
use tracing::info;

use crate::config::{AppConfig, DeploymentTarget, EnvironmentConfig, StackDefinition};
use crate::domain::{InstanceClass, InstanceSize, InstanceType};
use crate::engine::{ProvisioningEngine, SubmissionReceipt};
use crate::errors::{StackError, StackResult};
use crate::graph::ResourceGraph;
use crate::stack;
use crate::template::SynthesizedStack;

/// Development stack name in the standard application
pub const DEV_STACK_NAME: &str = "CdkVpcEc2DevStack";

/// Staging stack name in the standard application
pub const STAGING_STACK_NAME: &str = "CdkVpcEc2StagingStack";

/// Development environment configuration
pub fn development_config() -> EnvironmentConfig {
    EnvironmentConfig::new()
        .with_project_tag("cdk")
        .with_environment_tag("development")
        .with_vpc_cidr("10.0.0.0/16")
        .with_private_subnet_cidr("10.0.1.0/24")
        .with_availability_zone("us-east-1a")
        .with_instance_type(InstanceType::of(InstanceClass::T3, InstanceSize::Micro))
        .with_tag("Project", "cdk")
        .with_tag("Environment", "development")
        .with_tag("Owner", "DevTeam")
}

/// Staging environment configuration
pub fn staging_config() -> EnvironmentConfig {
    EnvironmentConfig::new()
        .with_project_tag("cdk")
        .with_environment_tag("staging")
        .with_vpc_cidr("10.1.0.0/16")
        .with_private_subnet_cidr("10.1.1.0/24")
        .with_availability_zone("us-east-1b")
        .with_instance_type(InstanceType::of(InstanceClass::T3, InstanceSize::Small))
        .with_tag("Project", "cdk")
        .with_tag("Environment", "staging")
        .with_tag("Owner", "DevTeam")
}

/// Named stacks deployed into one target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct App {
    target: DeploymentTarget,
    stacks: Vec<StackDefinition>,
}

impl App {
    pub fn new(target: DeploymentTarget) -> Self {
        Self {
            target,
            stacks: Vec::new(),
        }
    }

    /// The development and staging stacks
    pub fn standard(target: DeploymentTarget) -> Self {
        Self::new(target)
            .with_stack(StackDefinition::new(DEV_STACK_NAME, development_config()))
            .with_stack(StackDefinition::new(STAGING_STACK_NAME, staging_config()))
    }

    pub fn from_config(config: AppConfig) -> Self {
        Self {
            target: config.target,
            stacks: config.stacks,
        }
    }

    pub fn with_stack(mut self, definition: StackDefinition) -> Self {
        self.stacks.push(definition);
        self
    }

    pub fn target(&self) -> &DeploymentTarget {
        &self.target
    }

    pub fn stacks(&self) -> &[StackDefinition] {
        &self.stacks
    }

    /// Build every stack's resource graph
    ///
    /// Stack names must be unique within an application.
    pub fn synth(&self) -> StackResult<Vec<ResourceGraph>> {
        let mut seen = std::collections::HashSet::new();
        for definition in &self.stacks {
            if !seen.insert(definition.stack_name.as_str()) {
                return Err(StackError::Configuration(format!(
                    "stack declared twice: {}",
                    definition.stack_name
                )));
            }
        }

        self.stacks
            .iter()
            .map(|d| stack::build(&d.stack_name, &self.target, &d.config))
            .collect()
    }

    /// Build every stack and submit them to `engine` concurrently
    pub async fn deploy<E>(&self, engine: &E) -> StackResult<Vec<SubmissionReceipt>>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let graphs = self.synth()?;
        Self::deploy_graphs(&graphs, engine).await
    }

    /// Submit already-built graphs to `engine` concurrently
    pub async fn deploy_graphs<E>(
        graphs: &[ResourceGraph],
        engine: &E,
    ) -> StackResult<Vec<SubmissionReceipt>>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let synthesized: Vec<SynthesizedStack> =
            graphs.iter().map(SynthesizedStack::from_graph).collect();

        let receipts = try_join_all(synthesized.iter().map(|s| engine.submit(s))).await?;

        info!(
            engine = engine.name(),
            stacks = receipts.len(),
            "Submitted stacks"
        );
        Ok(receipts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RecordingEngine;

    #[test]
    fn test_standard_app() {
        let app = App::standard(DeploymentTarget::in_region("us-east-1"));
        let graphs = app.synth().unwrap();
        assert_eq!(graphs.len(), 2);
        assert_eq!(graphs[0].stack_name(), DEV_STACK_NAME);
        assert_eq!(graphs[1].stack_name(), STAGING_STACK_NAME);
    }

    #[test]
    fn test_duplicate_stack_names_rejected() {
        let app = App::new(DeploymentTarget::default())
            .with_stack(StackDefinition::new("A", EnvironmentConfig::new()))
            .with_stack(StackDefinition::new("A", EnvironmentConfig::new()));
        assert!(matches!(app.synth(), Err(StackError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_deploy_submits_every_stack() {
        let engine = RecordingEngine::new();
        let app = App::standard(DeploymentTarget::in_region("us-east-1"));
        let receipts = app.deploy(&engine).await.unwrap();

        assert_eq!(receipts.len(), 2);
        let mut names = engine.stack_names().await;
        names.sort();
        assert_eq!(names, vec![DEV_STACK_NAME.to_string(), STAGING_STACK_NAME.to_string()]);
    }

    #[tokio::test]
    async fn test_deploy_prebuilt_graphs() {
        let engine = RecordingEngine::new();
        let app = App::standard(DeploymentTarget::in_region("us-east-1"));
        let graphs = app.synth().unwrap();

        let receipts = App::deploy_graphs(&graphs, &engine).await.unwrap();

        assert_eq!(receipts.len(), 2);
        let submitted = engine.submitted().await;
        assert_eq!(submitted.len(), 2);
        for graph in &graphs {
            assert!(submitted.contains(&SynthesizedStack::from_graph(graph)));
        }
    }
}
