// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for stack construction and synthesis

use thiserror::Error;

use crate::graph::GraphError;
use crate::invariants::ValidationError;

/// Errors that can occur while building, synthesizing or submitting a stack
#[derive(Debug, Error)]
pub enum StackError {
    /// Resource graph structure error
    #[error("Resource graph error: {0}")]
    Graph(#[from] GraphError),

    /// Graph or configuration invariant violated
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Provisioning engine rejected or failed to accept a stack
    #[error("Provisioning engine error: {0}")]
    Engine(String),

    /// Filesystem error while writing a cloud assembly
    #[error("I/O error: {0}")]
    Io(String),
}

/// Result type for stack operations
pub type StackResult<T> = Result<T, StackError>;

impl From<serde_json::Error> for StackError {
    fn from(err: serde_json::Error) -> Self {
        StackError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StackError {
    fn from(err: std::io::Error) -> Self {
        StackError::Io(err.to_string())
    }
}
