// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Synthesizer
//!
//! Builds every configured stack, checks its invariants and writes a cloud
//! assembly (one template per stack plus `manifest.json`).
//!
//! Run with: cargo run --bin vpc-ec2-synth
//!
//! Environment:
//! 1. `CDK_OUTDIR` - assembly directory (default: `cdk.out`)
//! 2. `STACK_CONFIG` - JSON application config; the dev/staging pair when unset
//! 3. `CDK_DEFAULT_ACCOUNT` / `CDK_DEFAULT_REGION` - deployment target

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};
use vpc_ec2_stack::{
    config::AppConfig,
    invariants::{open_principal_grants, preflight_config, validate_graph},
    App, DeploymentTarget, DryRunEngine,
};

/// Configuration for the synthesizer
#[derive(Debug, Clone)]
struct SynthConfig {
    /// Cloud assembly output directory
    outdir: PathBuf,
    /// Optional application config file
    stack_config: Option<PathBuf>,
    /// Account and region
    target: DeploymentTarget,
}

impl SynthConfig {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let outdir = std::env::var("CDK_OUTDIR").unwrap_or_else(|_| "cdk.out".to_string());
        let stack_config = std::env::var("STACK_CONFIG")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            outdir: PathBuf::from(outdir),
            stack_config,
            target: DeploymentTarget::from_env(),
        }
    }

    fn app(&self) -> Result<App> {
        match &self.stack_config {
            Some(path) => {
                let mut config = AppConfig::from_file(path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                if config.target == DeploymentTarget::default() {
                    config.target = self.target.clone();
                }
                Ok(App::from_config(config))
            }
            None => Ok(App::standard(self.target.clone())),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("🚀 Starting stack synthesis");

    let config = SynthConfig::from_env();
    info!("📋 Configuration loaded:");
    info!("  - Output: {}", config.outdir.display());
    info!(
        "  - Region: {}",
        config.target.region.as_deref().unwrap_or("(engine-resolved)")
    );

    let app = config.app()?;

    for definition in app.stacks() {
        let resolved = definition.config.resolve();
        if let Err(e) = preflight_config(&resolved, app.target()) {
            warn!("⚠️  {}: {}", definition.stack_name, e);
        }
    }

    let graphs = app.synth().context("Failed to build stacks")?;
    for graph in &graphs {
        validate_graph(graph)
            .with_context(|| format!("Invariant violated in {}", graph.stack_name()))?;

        for grant in open_principal_grants(graph) {
            warn!(
                "⚠️  {} ({}) grants {} actions to any principal",
                grant.path,
                grant.logical_id,
                grant.actions.len()
            );
        }
        info!(
            "✅ {}: {} resources, {} outputs",
            graph.stack_name(),
            graph.nodes().len(),
            graph.outputs().len()
        );
    }

    let engine = DryRunEngine::new(&config.outdir);
    let receipts = App::deploy_graphs(&graphs, &engine)
        .await
        .context("Failed to write templates")?;
    let manifest = engine
        .write_manifest(app.target(), &receipts)
        .await
        .context("Failed to write manifest")?;

    info!("📦 Cloud assembly written to {}", manifest.display());
    Ok(())
}
