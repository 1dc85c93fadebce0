// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Engine Seam
//!
//! The builder only describes; engines interpret synthesized templates and
//! perform the I/O.
//!
//! # Architecture
//!
//! ```text
//! Pure Builder                 Engine
//! ────────────                ──────────
//!
//! (name, target, config)      SynthesizedStack
//!      │                          │
//!      ▼                          ▼
//! ┌─────────────┐           ┌──────────────┐
//! │   build()   │ template  │  validate()  │
//! │ (pure func) │ ───────>  │  submit()    │
//! └─────────────┘           │  (async I/O) │
//!                           └──────────────┘
//! ```
//!
//! # Engines
//!
//! - [`DryRunEngine`] - writes a cloud assembly directory (templates + manifest)
//! - [`RecordingEngine`] - keeps submissions in memory, for tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::DeploymentTarget;
use crate::errors::{StackError, StackResult};
use crate::graph::intrinsic::collect_references;
use crate::template::{SynthesizedStack, TEMPLATE_FORMAT_VERSION};

/// Cloud assembly manifest file name
pub const MANIFEST_FILE: &str = "manifest.json";

/// Cloud assembly schema version written to the manifest
pub const ASSEMBLY_VERSION: &str = "36.0.0";

/// Acknowledgement of one accepted stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub stack_name: String,
    pub engine: String,
    /// Where the engine put the template, if it stores one
    pub location: Option<String>,
    pub resources: usize,
    pub submitted_at: DateTime<Utc>,
}

/// Trait for provisioning engines
///
/// Implementations receive fully rendered templates and are responsible
/// for materializing them.
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// Engine name for logs and receipts
    fn name(&self) -> &str;

    /// Check a template before accepting it
    ///
    /// Defaults to the structural check in [`validate_template`].
    async fn validate(&self, stack: &SynthesizedStack) -> StackResult<()> {
        validate_template(&stack.template)
    }

    /// Accept a stack for provisioning
    async fn submit(&self, stack: &SynthesizedStack) -> StackResult<SubmissionReceipt>;
}

fn engine_error(stack: &str, message: impl std::fmt::Display) -> StackError {
    StackError::Engine(format!("{}: {}", stack, message))
}

/// Structural template check
///
/// # Rules
/// - Format version is the supported one
/// - At least one resource, each with a `Type`
/// - Every `DependsOn` entry names a resource
/// - Every `Ref`/`Fn::GetAtt` names a resource or parameter
pub fn validate_template(template: &Value) -> StackResult<()> {
    let version = template.get("AWSTemplateFormatVersion").and_then(Value::as_str);
    if version != Some(TEMPLATE_FORMAT_VERSION) {
        return Err(StackError::Engine(format!(
            "unsupported template format version: {:?}",
            version
        )));
    }

    let resources = template
        .get("Resources")
        .and_then(Value::as_object)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| StackError::Engine("template declares no resources".to_string()))?;

    let parameters: BTreeSet<&str> = template
        .get("Parameters")
        .and_then(Value::as_object)
        .map(|p| p.keys().map(String::as_str).collect())
        .unwrap_or_default();

    let known = |id: &str| resources.contains_key(id) || parameters.contains(id);

    for (id, resource) in resources {
        if resource.get("Type").and_then(Value::as_str).is_none() {
            return Err(engine_error(id, "resource has no Type"));
        }

        let depends_on = resource
            .get("DependsOn")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str);
        for dependency in depends_on {
            if !resources.contains_key(dependency) {
                return Err(engine_error(id, format!("depends on unknown resource {}", dependency)));
            }
        }

        let mut refs = BTreeSet::new();
        if let Some(properties) = resource.get("Properties") {
            collect_references(properties, &mut refs);
        }
        if let Some(missing) = refs.iter().find(|r| !known(r.as_str())) {
            return Err(engine_error(id, format!("references unknown id {}", missing)));
        }
    }

    if let Some(outputs) = template.get("Outputs").and_then(Value::as_object) {
        for (name, output) in outputs {
            let mut refs = BTreeSet::new();
            if let Some(value) = output.get("Value") {
                collect_references(value, &mut refs);
            }
            if let Some(missing) = refs.iter().find(|r| !known(r.as_str())) {
                return Err(engine_error(name, format!("output references unknown id {}", missing)));
            }
        }
    }

    Ok(())
}

/// Dry-run engine - writes templates to a cloud assembly directory
///
/// Nothing is provisioned. Each stack lands at
/// `<outdir>/<stack>.template.json`; [`DryRunEngine::write_manifest`]
/// records the assembly as a whole.
#[derive(Debug, Clone)]
pub struct DryRunEngine {
    outdir: PathBuf,
}

impl DryRunEngine {
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
        }
    }

    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// File name a stack's template is written to
    pub fn template_file(stack_name: &str) -> String {
        format!("{}.template.json", stack_name)
    }

    /// Write the assembly manifest for a set of receipts
    pub async fn write_manifest(
        &self,
        target: &DeploymentTarget,
        receipts: &[SubmissionReceipt],
    ) -> StackResult<PathBuf> {
        let environment = format!(
            "aws://{}/{}",
            target.account.as_deref().unwrap_or("unknown-account"),
            target.region.as_deref().unwrap_or("unknown-region"),
        );

        let artifacts: serde_json::Map<String, Value> = receipts
            .iter()
            .map(|r| {
                (
                    r.stack_name.clone(),
                    json!({
                        "type": "aws:cloudformation:stack",
                        "environment": environment,
                        "properties": {
                            "templateFile": Self::template_file(&r.stack_name),
                        },
                        "resources": r.resources,
                    }),
                )
            })
            .collect();

        let manifest = json!({
            "version": ASSEMBLY_VERSION,
            "createdAt": Utc::now().to_rfc3339(),
            "artifacts": artifacts,
        });

        tokio::fs::create_dir_all(&self.outdir).await?;
        let path = self.outdir.join(MANIFEST_FILE);
        tokio::fs::write(&path, serde_json::to_vec_pretty(&manifest)?).await?;

        info!(
            path = %path.display(),
            stacks = receipts.len(),
            "Wrote cloud assembly manifest"
        );
        Ok(path)
    }
}

#[async_trait]
impl ProvisioningEngine for DryRunEngine {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn submit(&self, stack: &SynthesizedStack) -> StackResult<SubmissionReceipt> {
        self.validate(stack).await?;

        tokio::fs::create_dir_all(&self.outdir).await?;
        let path = self.outdir.join(Self::template_file(&stack.stack_name));
        let text = stack.to_json_pretty()?;
        tokio::fs::write(&path, text).await?;

        debug!(stack = %stack.stack_name, path = %path.display(), "Wrote template");

        Ok(SubmissionReceipt {
            stack_name: stack.stack_name.clone(),
            engine: self.name().to_string(),
            location: Some(path.display().to_string()),
            resources: stack.resource_count(),
            submitted_at: Utc::now(),
        })
    }
}

/// Recording engine - validates and keeps submissions in memory
///
/// Useful for testing. Submissions are stored in arrival order.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    submitted: Mutex<Vec<SynthesizedStack>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every accepted stack
    pub async fn submitted(&self) -> Vec<SynthesizedStack> {
        self.submitted.lock().await.clone()
    }

    /// Names of every accepted stack
    pub async fn stack_names(&self) -> Vec<String> {
        self.submitted
            .lock()
            .await
            .iter()
            .map(|s| s.stack_name.clone())
            .collect()
    }
}

#[async_trait]
impl ProvisioningEngine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    async fn submit(&self, stack: &SynthesizedStack) -> StackResult<SubmissionReceipt> {
        self.validate(stack).await?;
        self.submitted.lock().await.push(stack.clone());

        Ok(SubmissionReceipt {
            stack_name: stack.stack_name.clone(),
            engine: self.name().to_string(),
            location: None,
            resources: stack.resource_count(),
            submitted_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(resources: Value) -> Value {
        json!({
            "AWSTemplateFormatVersion": "2010-09-09",
            "Resources": resources,
        })
    }

    #[test]
    fn test_validate_template_ok() {
        let t = template(json!({
            "A": { "Type": "AWS::EC2::VPC", "Properties": {} },
            "B": { "Type": "AWS::IAM::Role", "Properties": { "X": { "Ref": "A" } }, "DependsOn": ["A"] }
        }));
        assert!(validate_template(&t).is_ok());
    }

    #[test]
    fn test_validate_template_rejections() {
        assert!(validate_template(&json!({})).is_err());
        assert!(validate_template(&template(json!({}))).is_err());
        assert!(validate_template(&template(json!({ "A": { "Properties": {} } }))).is_err());
        assert!(validate_template(&template(json!({
            "A": { "Type": "T", "DependsOn": ["Nope"] }
        })))
        .is_err());
        assert!(validate_template(&template(json!({
            "A": { "Type": "T", "Properties": { "X": { "Fn::GetAtt": ["Nope", "Arn"] } } }
        })))
        .is_err());
    }

    #[test]
    fn test_pseudo_parameters_are_known() {
        let t = template(json!({
            "A": { "Type": "T", "Properties": { "R": { "Ref": "AWS::Region" } } }
        }));
        assert!(validate_template(&t).is_ok());
    }

    #[tokio::test]
    async fn test_recording_engine() {
        let engine = RecordingEngine::new();
        let stack = SynthesizedStack {
            stack_name: "S".to_string(),
            template: template(json!({ "A": { "Type": "T" } })),
        };
        let receipt = engine.submit(&stack).await.unwrap();
        assert_eq!(receipt.engine, "recording");
        assert_eq!(receipt.resources, 1);
        assert_eq!(engine.stack_names().await, vec!["S".to_string()]);
    }
}
