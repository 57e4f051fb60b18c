//! Error types for valueflow-ir
//!
//! Provides unified error handling across the crate.
//!
//! Malformed or inconsistent input graphs are reported as `Graph` errors at
//! module boundaries; internal invariants that cannot fail on well-formed
//! input stay as `debug_assert!` in the code that owns them.

use thiserror::Error;

/// Main error type for valueflow-ir operations
#[derive(Debug, Error)]
pub enum ValueFlowError {
    /// Malformed or inconsistent input IR graph
    #[error("IR graph error: {0}")]
    Graph(String),

    /// Analysis error
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (report serialization)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ValueFlowError {
    /// Create a graph error
    pub fn graph(msg: impl Into<String>) -> Self {
        ValueFlowError::Graph(msg.into())
    }

    /// Create an internal error (alias for analysis error)
    pub fn internal(msg: impl Into<String>) -> Self {
        ValueFlowError::Analysis(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        ValueFlowError::Config(msg.into())
    }
}

/// Result type alias for valueflow operations
pub type Result<T> = std::result::Result<T, ValueFlowError>;
