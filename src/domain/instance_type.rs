// Copyright (c) 2025 - Cowboy AI, Inc.
//! EC2 Instance Type Value Object
//!
//! An instance type is a family/generation class plus a size, written
//! `class.size` (e.g. `t3.micro`). The class also decides the processor
//! architecture, which in turn selects the base image variant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Instance type parse error
///
/// Only the `class.size` shape is checked. Whether a class or size exists
/// in a region is left to the provisioning engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InstanceTypeError {
    #[error("Instance type must be written as class.size: {0}")]
    InvalidFormat(String),
}

/// Processor architecture of an instance class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    X86_64,
    Arm64,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
        }
    }

    /// Architecture of a class token such as `m7gd` or `c6i`
    ///
    /// A `g` among the attribute letters after the generation digit marks a
    /// Graviton class.
    pub fn of_class(class: &str) -> Self {
        let attributes = class
            .find(|c: char| c.is_ascii_digit())
            .map(|start| class[start..].trim_start_matches(|c: char| c.is_ascii_digit()))
            .unwrap_or("");
        if attributes.contains('g') {
            Self::Arm64
        } else {
            Self::X86_64
        }
    }
}

/// Instance family and generation
///
/// Named variants cover the common classes; anything else is carried
/// through as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstanceClass {
    T2,
    T3,
    T3a,
    T4g,
    M5,
    M6i,
    M6g,
    M7g,
    C5,
    C6i,
    C6g,
    C7g,
    R5,
    R6g,
    Other(String),
}

impl InstanceClass {
    /// Get the canonical string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::T2 => "t2",
            Self::T3 => "t3",
            Self::T3a => "t3a",
            Self::T4g => "t4g",
            Self::M5 => "m5",
            Self::M6i => "m6i",
            Self::M6g => "m6g",
            Self::M7g => "m7g",
            Self::C5 => "c5",
            Self::C6i => "c6i",
            Self::C6g => "c6g",
            Self::C7g => "c7g",
            Self::R5 => "r5",
            Self::R6g => "r6g",
            Self::Other(class) => class,
        }
    }

    pub fn architecture(&self) -> Architecture {
        Architecture::of_class(self.as_str())
    }
}

impl FromStr for InstanceClass {
    type Err = InstanceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let class = match lower.as_str() {
            "t2" => Self::T2,
            "t3" => Self::T3,
            "t3a" => Self::T3a,
            "t4g" => Self::T4g,
            "m5" => Self::M5,
            "m6i" => Self::M6i,
            "m6g" => Self::M6g,
            "m7g" => Self::M7g,
            "c5" => Self::C5,
            "c6i" => Self::C6i,
            "c6g" => Self::C6g,
            "c7g" => Self::C7g,
            "r5" => Self::R5,
            "r6g" => Self::R6g,
            "" => return Err(InstanceTypeError::InvalidFormat(s.to_string())),
            _ => Self::Other(lower),
        };
        Ok(class)
    }
}

/// Instance size within a class
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstanceSize {
    Nano,
    Micro,
    Small,
    Medium,
    Large,
    Xlarge,
    Xlarge2,
    Xlarge4,
    /// `8xlarge`, `metal`, ...
    Other(String),
}

impl InstanceSize {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Nano => "nano",
            Self::Micro => "micro",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Xlarge => "xlarge",
            Self::Xlarge2 => "2xlarge",
            Self::Xlarge4 => "4xlarge",
            Self::Other(size) => size,
        }
    }
}

impl FromStr for InstanceSize {
    type Err = InstanceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let size = match lower.as_str() {
            "nano" => Self::Nano,
            "micro" => Self::Micro,
            "small" => Self::Small,
            "medium" => Self::Medium,
            "large" => Self::Large,
            "xlarge" => Self::Xlarge,
            "2xlarge" => Self::Xlarge2,
            "4xlarge" => Self::Xlarge4,
            "" => return Err(InstanceTypeError::InvalidFormat(s.to_string())),
            _ => Self::Other(lower),
        };
        Ok(size)
    }
}

/// EC2 instance type value object
///
/// # Examples
///
/// ```rust
/// use vpc_ec2_stack::domain::{Architecture, InstanceClass, InstanceSize, InstanceType};
///
/// let micro = InstanceType::of(InstanceClass::T3, InstanceSize::Micro);
/// assert_eq!(micro.to_string(), "t3.micro");
/// assert_eq!("t3.micro".parse::<InstanceType>().unwrap(), micro);
///
/// let graviton: InstanceType = "m7gd.12xlarge".parse().unwrap();
/// assert_eq!(graviton.architecture(), Architecture::Arm64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceType {
    class: InstanceClass,
    size: InstanceSize,
}

impl InstanceType {
    pub const fn of(class: InstanceClass, size: InstanceSize) -> Self {
        Self { class, size }
    }

    pub fn class(&self) -> &InstanceClass {
        &self.class
    }

    pub fn size(&self) -> &InstanceSize {
        &self.size
    }

    pub fn architecture(&self) -> Architecture {
        self.class.architecture()
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class.as_str(), self.size.as_str())
    }
}

impl FromStr for InstanceType {
    type Err = InstanceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (class, size) = s
            .split_once('.')
            .ok_or_else(|| InstanceTypeError::InvalidFormat(s.to_string()))?;
        let invalid = |_| InstanceTypeError::InvalidFormat(s.to_string());
        Ok(Self::of(
            class.parse().map_err(invalid)?,
            size.parse().map_err(invalid)?,
        ))
    }
}

impl TryFrom<String> for InstanceType {
    type Error = InstanceTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InstanceType> for String {
    fn from(instance_type: InstanceType) -> Self {
        instance_type.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("t3.micro", InstanceClass::T3, InstanceSize::Micro ; "t3 micro")]
    #[test_case("t3.small", InstanceClass::T3, InstanceSize::Small ; "t3 small")]
    #[test_case("T3.MEDIUM", InstanceClass::T3, InstanceSize::Medium ; "uppercase")]
    #[test_case("m6g.2xlarge", InstanceClass::M6g, InstanceSize::Xlarge2 ; "graviton 2xlarge")]
    fn test_parse(input: &str, class: InstanceClass, size: InstanceSize) {
        let parsed: InstanceType = input.parse().unwrap();
        assert_eq!(parsed, InstanceType::of(class, size));
    }

    #[test_case("m7i.large", "m7i", "large" ; "newer intel class")]
    #[test_case("m5.12xlarge", "m5", "12xlarge" ; "large size")]
    #[test_case("c7gn.metal", "c7gn", "metal" ; "metal size")]
    fn test_parse_unlisted(input: &str, class: &str, size: &str) {
        let parsed: InstanceType = input.parse().unwrap();
        assert_eq!(parsed.class().as_str(), class);
        assert_eq!(parsed.size().as_str(), size);
        assert_eq!(parsed.to_string(), input);
    }

    #[test]
    fn test_parse_errors() {
        for input in ["t3micro", ".micro", "t3.", ""] {
            assert_eq!(
                input.parse::<InstanceType>(),
                Err(InstanceTypeError::InvalidFormat(input.to_string()))
            );
        }
    }

    #[test_case("t3", Architecture::X86_64 ; "burstable intel")]
    #[test_case("t4g", Architecture::Arm64 ; "burstable graviton")]
    #[test_case("m7i", Architecture::X86_64 ; "intel suffix")]
    #[test_case("c6in", Architecture::X86_64 ; "network intel")]
    #[test_case("m7gd", Architecture::Arm64 ; "graviton with disk")]
    #[test_case("x2gd", Architecture::Arm64 ; "memory graviton")]
    #[test_case("g5", Architecture::X86_64 ; "gpu family letter is not a suffix")]
    #[test_case("g5g", Architecture::Arm64 ; "gpu graviton")]
    fn test_architecture(class: &str, expected: Architecture) {
        assert_eq!(Architecture::of_class(class), expected);
        assert_eq!(class.parse::<InstanceClass>().unwrap().architecture(), expected);
    }

    #[test]
    fn test_named_and_parsed_classes_agree() {
        assert_eq!("t4g".parse::<InstanceClass>(), Ok(InstanceClass::T4g));
        assert_eq!(
            "M7I".parse::<InstanceClass>(),
            Ok(InstanceClass::Other("m7i".to_string()))
        );
    }
}
