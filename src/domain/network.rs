// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32 for IPv4)")]
    InvalidPrefixLength(u8),

    #[error("Host bits set in network address: {0}")]
    HostBitsSet(String),
}

/// IPv4 CIDR block value object
///
/// Represents a network address space such as a VPC or subnet range.
/// Invariants:
/// - Valid IPv4 network address
/// - Prefix length 0-32
/// - No host bits set below the prefix (canonical network address)
///
/// # Examples
///
/// ```rust
/// use vpc_ec2_stack::domain::CidrBlock;
///
/// let vpc = CidrBlock::new("10.0.0.0/16").unwrap();
/// let subnet = CidrBlock::new("10.0.1.0/24").unwrap();
/// assert!(vpc.contains(&subnet));
/// assert_eq!(subnet.to_string(), "10.0.1.0/24");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CidrBlock {
    network: Ipv4Addr,
    prefix_length: u8,
}

impl CidrBlock {
    /// Create a new CIDR block with validation
    ///
    /// # Invariants
    /// - Must be written as `address/prefix`
    /// - Prefix length 0-32
    /// - Address must be the network address for the prefix
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();

        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let network = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        if prefix_length > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        let block = Self {
            network,
            prefix_length,
        };

        // Invariant: canonical network address
        if u32::from(network) & !block.mask() != 0 {
            return Err(NetworkError::HostBitsSet(cidr.to_string()));
        }

        Ok(block)
    }

    /// Get the network address
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Get the prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    fn mask(&self) -> u32 {
        match self.prefix_length {
            0 => 0,
            p => u32::MAX << (32 - u32::from(p)),
        }
    }

    /// First and last address covered by this block
    pub fn range(&self) -> (u32, u32) {
        let start = u32::from(self.network);
        (start, start | !self.mask())
    }

    /// Check whether `other` lies entirely inside this block
    pub fn contains(&self, other: &CidrBlock) -> bool {
        let (start, end) = self.range();
        let (other_start, other_end) = other.range();
        start <= other_start && other_end <= end
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_length)
    }
}

impl FromStr for CidrBlock {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CidrBlock {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CidrBlock> for String {
    fn from(block: CidrBlock) -> Self {
        block.to_string()
    }
}

/// Transport protocol for a security group rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
}

impl Protocol {
    /// Protocol name as the engine expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
        }
    }
}

/// A single port on a transport protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Port {
    pub protocol: Protocol,
    pub number: u16,
}

impl Port {
    /// HTTPS, the only traffic allowed between the instance and the endpoints
    pub const HTTPS: Port = Port::tcp(443);

    pub const fn tcp(number: u16) -> Self {
        Self {
            protocol: Protocol::Tcp,
            number,
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.protocol.as_str().to_uppercase(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cidr_block() {
        let block = CidrBlock::new("10.0.0.0/16").unwrap();
        assert_eq!(block.network().to_string(), "10.0.0.0");
        assert_eq!(block.prefix_length(), 16);
        assert_eq!(block.to_string(), "10.0.0.0/16");
    }

    #[test]
    fn test_invalid_cidr() {
        assert!(CidrBlock::new("10.0.0.0").is_err());
        assert!(CidrBlock::new("10.0.0.0/33").is_err());
        assert!(CidrBlock::new("999.0.0.0/16").is_err());
        assert!(CidrBlock::new("10.0.0.0/abc").is_err());
        assert_eq!(
            CidrBlock::new("10.0.1.5/24"),
            Err(NetworkError::HostBitsSet("10.0.1.5/24".to_string()))
        );
    }

    #[test]
    fn test_contains() {
        let vpc = CidrBlock::new("10.0.0.0/16").unwrap();
        let inside = CidrBlock::new("10.0.1.0/24").unwrap();
        let outside = CidrBlock::new("10.1.1.0/24").unwrap();

        assert!(vpc.contains(&inside));
        assert!(!vpc.contains(&outside));
        assert!(!inside.contains(&vpc));
    }

    #[test]
    fn test_zero_prefix() {
        let everything = CidrBlock::new("0.0.0.0/0").unwrap();
        let any = CidrBlock::new("192.168.0.0/24").unwrap();
        assert!(everything.contains(&any));
    }

    #[test]
    fn test_serde_as_string() {
        let block: CidrBlock = serde_json::from_str("\"10.1.0.0/16\"").unwrap();
        assert_eq!(serde_json::to_string(&block).unwrap(), "\"10.1.0.0/16\"");
        assert!(serde_json::from_str::<CidrBlock>("\"nope\"").is_err());
    }

    #[test]
    fn test_port_display() {
        assert_eq!(Port::HTTPS.to_string(), "TCP 443");
        assert_eq!(Port::tcp(8443).to_string(), "TCP 8443");
    }
}
