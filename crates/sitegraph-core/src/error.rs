//! Core error type.

use thiserror::Error;

/// Errors raised by the core node model and storage layer.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid node data: {message}")]
    InvalidNode { message: String },

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Creates a new InvalidNode error.
    pub fn invalid_node(message: impl Into<String>) -> Self {
        Self::InvalidNode {
            message: message.into(),
        }
    }

    /// Creates a new UnknownNodeType error.
    pub fn unknown_node_type(type_name: impl Into<String>) -> Self {
        Self::UnknownNodeType(type_name.into())
    }
}
