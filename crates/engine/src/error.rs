//! Error types for the workflow engine

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the workflow engine.
///
/// Cancellation is deliberately absent: a cancelled run is a normal
/// terminal outcome reported through `RunOutcome`, not a failure.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Graph failed static invariants before the run started
    #[error("Graph validation failed: {}", format_validation(.0))]
    Validation(Vec<ValidationError>),

    /// A connection references a node id absent from the graph
    #[error("Graph integrity error: node '{0}' referenced but not present")]
    GraphIntegrity(String),

    /// Activation counter ceiling reached, probable uncontrolled cycle
    #[error("Loop limit exceeded ({0} activations)")]
    LoopLimitExceeded(u32),

    /// A node's process raised instead of returning an error output
    #[error("Node '{node_id}' failed: {message}")]
    NodeProcessing { node_id: String, message: String },

    /// Two behaviors registered under the same type name
    #[error("Node type '{0}' is already registered")]
    DuplicateNodeType(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Create a node processing failure.
    pub fn node_failed(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NodeProcessing {
            node_id: node_id.into(),
            message: message.into(),
        }
    }
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
