// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Domain Models
//!
//! Value objects used while assembling a stack's resource graph.
//!
//! # Value Objects
//!
//! - [`CidrBlock`] - IPv4 network ranges with canonical-address invariant
//! - [`Port`] - Protocol + port pair for security group rules
//! - [`InstanceType`] - EC2 `class.size` with architecture lookup
//! - [`ResourceType`] - Declarable resource taxonomy
//! - [`TagSet`] - Derived tag set shared across nodes
//! - [`PolicyDocument`] - IAM trust and resource policies

pub mod instance_type;
pub mod network;
pub mod policy;
pub mod resource_type;
pub mod tags;

pub use instance_type::{
    Architecture, InstanceClass, InstanceSize, InstanceType, InstanceTypeError,
};
pub use network::{CidrBlock, NetworkError, Port, Protocol};
pub use policy::{Effect, PolicyDocument, PolicyStatement, Principal};
pub use resource_type::ResourceType;
pub use tags::TagSet;
