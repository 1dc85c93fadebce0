// Copyright (c) 2025 - Cowboy AI, Inc.
//! IAM Policy Documents
//!
//! Minimal policy model covering what the stack emits: trust policies for
//! roles and resource policies on VPC endpoints. Single-element action and
//! resource lists render as scalars, matching the engine's canonical form.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Policy language version
pub const POLICY_VERSION: &str = "2012-10-17";

/// Statement effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Statement principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Any principal at all (`{"AWS": "*"}`)
    Any,
    /// A cloud service such as `ec2.amazonaws.com`
    Service(String),
}

impl Principal {
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::Any => map.serialize_entry("AWS", "*")?,
            Self::Service(service) => map.serialize_entry("Service", service)?,
        }
        map.end()
    }
}

fn one_or_many<S: Serializer>(items: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    match items {
        [single] => serializer.serialize_str(single),
        many => many.serialize(serializer),
    }
}

/// One statement of a policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    #[serde(serialize_with = "one_or_many")]
    pub action: Vec<String>,
    pub effect: Effect,
    pub principal: Principal,
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "one_or_many")]
    pub resource: Vec<String>,
}

impl PolicyStatement {
    pub fn allow(principal: Principal, actions: &[&str]) -> Self {
        Self {
            action: actions.iter().map(|a| a.to_string()).collect(),
            effect: Effect::Allow,
            principal,
            resource: Vec::new(),
        }
    }

    pub fn on_resources(mut self, resources: &[&str]) -> Self {
        self.resource = resources.iter().map(|r| r.to_string()).collect();
        self
    }
}

/// A versioned list of statements
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub statement: Vec<PolicyStatement>,
    pub version: &'static str,
}

impl PolicyDocument {
    pub fn new(statement: Vec<PolicyStatement>) -> Self {
        Self {
            statement,
            version: POLICY_VERSION,
        }
    }

    /// Trust policy letting a service principal assume a role
    pub fn assume_role(service: &str) -> Self {
        Self::new(vec![PolicyStatement::allow(
            Principal::Service(service.to_string()),
            &["sts:AssumeRole"],
        )])
    }

    /// Statements granting anything to an unrestricted principal
    pub fn open_statements(&self) -> impl Iterator<Item = &PolicyStatement> {
        self.statement
            .iter()
            .filter(|s| s.effect == Effect::Allow && s.principal.is_unrestricted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_assume_role_document() {
        let doc = PolicyDocument::assume_role("ec2.amazonaws.com");
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "Statement": [{
                    "Action": "sts:AssumeRole",
                    "Effect": "Allow",
                    "Principal": { "Service": "ec2.amazonaws.com" }
                }],
                "Version": "2012-10-17"
            })
        );
        assert_eq!(doc.open_statements().count(), 0);
    }

    #[test]
    fn test_any_principal_with_many_actions() {
        let doc = PolicyDocument::new(vec![PolicyStatement::allow(
            Principal::Any,
            &["ssm:GetParameter", "ssm:GetParameters"],
        )
        .on_resources(&["*"])]);

        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "Statement": [{
                    "Action": ["ssm:GetParameter", "ssm:GetParameters"],
                    "Effect": "Allow",
                    "Principal": { "AWS": "*" },
                    "Resource": "*"
                }],
                "Version": "2012-10-17"
            })
        );
        assert_eq!(doc.open_statements().count(), 1);
    }
}
