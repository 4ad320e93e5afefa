//! Error types for schema composition.
//!
//! Structural errors that would produce an inconsistent or ambiguous schema
//! are fatal and abort the whole build. Per-field overlay conflicts are not
//! errors at all; they are reporter warnings (see [`crate::overlay`]).

use sitegraph_core::CoreError;
use thiserror::Error;

/// Errors that abort a schema build.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A type name violated a naming rule or was already taken.
    #[error("The type name `{name}` is not allowed: {rule}")]
    NameConflict { name: String, rule: String },

    /// A raw type definition fragment failed to parse. When the parser
    /// reported a position, `excerpt` holds a code frame around it.
    #[error("Failed to parse type definitions: {message}{}", excerpt.as_deref().map(|e| format!("\n\n{e}")).unwrap_or_default())]
    Parse {
        message: String,
        excerpt: Option<String>,
    },

    /// Finalizing the type graph into an executable schema failed.
    #[error("Failed to build schema: {0}")]
    BuildFailed(String),

    /// The inference collaborator failed.
    #[error("Type inference failed: {0}")]
    Inference(String),

    /// A core-layer failure.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SchemaError {
    /// Creates a new NameConflict error.
    pub fn name_conflict(name: impl Into<String>, rule: impl Into<String>) -> Self {
        Self::NameConflict {
            name: name.into(),
            rule: rule.into(),
        }
    }

    /// Creates a new Parse error without positional context.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            excerpt: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_conflict_display() {
        let err = SchemaError::name_conflict("Node", "reserved for internal use");
        assert_eq!(
            err.to_string(),
            "The type name `Node` is not allowed: reserved for internal use"
        );
    }

    #[test]
    fn test_parse_display_with_excerpt() {
        let err = SchemaError::Parse {
            message: "unexpected token".to_string(),
            excerpt: Some("  1 | type Person {".to_string()),
        };
        let text = err.to_string();
        assert!(text.contains("unexpected token"));
        assert!(text.contains("type Person {"));
    }
}
