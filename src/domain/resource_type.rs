// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud Resource Type Taxonomy
//!
//! The closed set of resource kinds a stack can declare. Each kind knows the
//! engine type name it is emitted as and whether the engine accepts tags on it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declarable cloud resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    // Network
    /// Virtual private cloud
    Vpc,
    /// Subnet inside the VPC
    Subnet,
    /// Route table for a subnet
    RouteTable,
    /// Binding between a subnet and its route table
    SubnetRouteTableAssociation,

    // Security
    /// Stateful traffic filter
    SecurityGroup,
    /// Standalone inbound rule referencing another group
    SecurityGroupIngress,
    /// Standalone outbound rule referencing another group
    SecurityGroupEgress,

    // Private connectivity
    /// Interface VPC endpoint
    VpcEndpoint,

    // Identity
    /// Assumable IAM role
    IamRole,
    /// Instance profile carrying a role onto an instance
    InstanceProfile,

    // Compute
    /// EC2 instance
    Instance,
}

impl ResourceType {
    /// Engine type name (`AWS::<service>::<resource>`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vpc => "AWS::EC2::VPC",
            Self::Subnet => "AWS::EC2::Subnet",
            Self::RouteTable => "AWS::EC2::RouteTable",
            Self::SubnetRouteTableAssociation => "AWS::EC2::SubnetRouteTableAssociation",
            Self::SecurityGroup => "AWS::EC2::SecurityGroup",
            Self::SecurityGroupIngress => "AWS::EC2::SecurityGroupIngress",
            Self::SecurityGroupEgress => "AWS::EC2::SecurityGroupEgress",
            Self::VpcEndpoint => "AWS::EC2::VPCEndpoint",
            Self::IamRole => "AWS::IAM::Role",
            Self::InstanceProfile => "AWS::IAM::InstanceProfile",
            Self::Instance => "AWS::EC2::Instance",
        }
    }

    /// Whether the engine accepts a `Tags` property on this type
    pub fn is_taggable(&self) -> bool {
        !matches!(
            self,
            Self::SubnetRouteTableAssociation
                | Self::SecurityGroupIngress
                | Self::SecurityGroupEgress
                | Self::InstanceProfile
        )
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
