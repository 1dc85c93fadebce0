// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Engine Tests
//!
//! Exercises the dry-run engine against a temporary assembly directory and
//! the in-memory recording engine through the application.

mod fixtures;

use anyhow::Result;
use serde_json::Value;

use fixtures::*;
use vpc_ec2_stack::app::{DEV_STACK_NAME, STAGING_STACK_NAME};
use vpc_ec2_stack::engine::MANIFEST_FILE;
use vpc_ec2_stack::{
    App, DeploymentTarget, DryRunEngine, ProvisioningEngine, RecordingEngine, SynthesizedStack,
};

#[tokio::test]
async fn test_dry_run_writes_assembly() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let outdir = dir.path().join("cdk.out");
    let engine = DryRunEngine::new(&outdir);

    let app = App::standard(DeploymentTarget::new(
        Some("123456789012".to_string()),
        Some(REGION.to_string()),
    ));
    let receipts = app.deploy(&engine).await?;
    assert_eq!(receipts.len(), 2);
    assert!(receipts.iter().all(|r| r.engine == "dry-run" && r.resources == 14));

    for name in [DEV_STACK_NAME, STAGING_STACK_NAME] {
        let path = outdir.join(DryRunEngine::template_file(name));
        let template: Value = serde_json::from_slice(&tokio::fs::read(&path).await?)?;
        assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
    }

    let manifest_path = engine.write_manifest(app.target(), &receipts).await?;
    assert_eq!(manifest_path, outdir.join(MANIFEST_FILE));

    let manifest: Value = serde_json::from_slice(&tokio::fs::read(&manifest_path).await?)?;
    let artifact = &manifest["artifacts"][DEV_STACK_NAME];
    assert_eq!(artifact["environment"], "aws://123456789012/us-east-1");
    assert_eq!(
        artifact["properties"]["templateFile"],
        "CdkVpcEc2DevStack.template.json"
    );
    Ok(())
}

#[tokio::test]
async fn test_engine_rejects_broken_template() {
    let engine = RecordingEngine::new();
    let broken = SynthesizedStack {
        stack_name: "Broken".to_string(),
        template: serde_json::json!({ "AWSTemplateFormatVersion": "2010-09-09", "Resources": {} }),
    };

    assert!(engine.submit(&broken).await.is_err());
    assert!(engine.submitted().await.is_empty());
}

#[tokio::test]
async fn test_engine_as_trait_object() {
    let engine: Box<dyn ProvisioningEngine> = Box::new(RecordingEngine::new());
    let receipts = App::standard(target()).deploy(engine.as_ref()).await.unwrap();
    assert_eq!(receipts.len(), 2);
}

#[test]
fn test_recording_engine_blocking() {
    let engine = RecordingEngine::new();
    let stack = SynthesizedStack::from_graph(&dev_graph());

    let receipt = tokio_test::block_on(engine.submit(&stack)).unwrap();
    assert_eq!(receipt.stack_name, DEV_STACK_NAME);
    assert!(receipt.location.is_none());
    assert_eq!(tokio_test::block_on(engine.submitted()), vec![stack]);
}
