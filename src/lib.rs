// Copyright (c) 2025 - Cowboy AI, Inc.
//! Environment-parameterized VPC + EC2 stack builder
//!
//! Builds the resource graph for an isolated network with one private
//! subnet, interface endpoints for session management, an IAM role, and a
//! single instance reachable only through those endpoints. The builder is
//! pure; templates are handed to a [`ProvisioningEngine`] for I/O.

pub mod app;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod graph;
pub mod invariants;
pub mod stack;
pub mod template;

// Re-export commonly used types
pub use app::App;
pub use config::{AppConfig, DeploymentTarget, EnvironmentConfig, ResolvedConfig, StackDefinition};
pub use engine::{DryRunEngine, ProvisioningEngine, RecordingEngine, SubmissionReceipt};
pub use errors::{StackError, StackResult};
pub use graph::{LogicalId, Output, Parameter, ResourceGraph, ResourceNode};
pub use stack::build;
pub use template::{synthesize, SynthesizedStack};
