// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource tag schema
//!
//! Every taggable node in a stack carries the same derived tag set plus a
//! per-node `Name`.
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `Name` | `{project}-{role}` for the node |
//! | `Project` | Resolved project tag |
//! | `Environment` | Resolved environment tag |
//! | `CreatedBy` | Static identifier (`CDK`) |
//!
//! Free-form tags from the environment configuration are applied first, so
//! the derived keys above win on conflict.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Tag key for the per-node display name
pub const TAG_NAME: &str = "Name";

/// Tag key for the project
pub const TAG_PROJECT: &str = "Project";

/// Tag key for the environment
pub const TAG_ENVIRONMENT: &str = "Environment";

/// Tag key for the creating tool
pub const TAG_CREATED_BY: &str = "CreatedBy";

/// Tag value for the creating tool
pub const TAG_CREATED_BY_VALUE: &str = "CDK";

/// Ordered tag map
///
/// Keys are kept sorted so rendered tag lists are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeMap<String, String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derived tag set shared by every node of a stack
    pub fn common(
        free_form: &BTreeMap<String, String>,
        project: &str,
        environment: &str,
    ) -> Self {
        let mut tags = Self(free_form.clone());
        tags.insert(TAG_PROJECT, project);
        tags.insert(TAG_ENVIRONMENT, environment);
        tags.insert(TAG_CREATED_BY, TAG_CREATED_BY_VALUE);
        tags
    }

    /// Copy of this set with the node's `Name` tag added
    pub fn named(&self, name: impl Into<String>) -> Self {
        let mut tags = self.clone();
        tags.insert(TAG_NAME, name);
        tags
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as the engine's `[{Key, Value}]` list
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.iter()
                .map(|(key, value)| json!({ "Key": key, "Value": value }))
                .collect(),
        )
    }
}
