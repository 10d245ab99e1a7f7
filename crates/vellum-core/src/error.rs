//! Load and save error types.
//!
//! Load errors are fatal to the parse pipeline and carry diagnostic detail
//! lists. Migration warnings are not errors; they travel alongside a
//! successfully parsed document.

use crate::id::NodeId;
use thiserror::Error;

/// Fatal failure while loading a document from text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The input is not well-formed JSON.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// No numeric `version` field at the top level.
    #[error("document has no numeric `version` field")]
    MissingVersion,

    /// The document was written by a newer engine.
    #[error("unsupported schema version {found} (this engine supports up to {supported})")]
    UnsupportedVersion { found: u64, supported: u32 },

    /// An upgrader met input it cannot reshape.
    #[error("migration from version {from} failed: {reason}")]
    MigrationFailed { from: u32, reason: String },

    /// The migrated document does not match the schema.
    #[error("schema validation failed: {}", .0.join("; "))]
    SchemaValidationFailed(Vec<String>),

    /// The document is well-shaped but its references are broken.
    #[error("integrity validation failed: {}", join_violations(.0))]
    IntegrityValidationFailed(Vec<IntegrityViolation>),
}

fn join_violations(violations: &[IntegrityViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure while encoding a document.
#[derive(Error, Debug)]
pub enum SerializeError {
    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One broken reference or structural rule in a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    #[error("rootId `{0}` does not resolve to a node")]
    MissingRoot(NodeId),

    #[error("page `{page}` root `{root}` does not resolve to a node")]
    MissingPageRoot { page: String, root: NodeId },

    #[error("activePageId `{0}` does not resolve to a page")]
    MissingActivePage(String),

    #[error("node stored under key `{key}` has id `{id}`")]
    KeyMismatch { key: NodeId, id: NodeId },

    #[error("node `{parent}` references missing child `{child}`")]
    MissingChild { parent: NodeId, child: NodeId },

    #[error("page id `{0}` is used more than once")]
    DuplicatePageId(String),

    #[error("node `{0}` is the root of more than one page")]
    DuplicatePageRoot(NodeId),

    #[error("node `{0}` is listed as a child of more than one parent")]
    MultipleParents(NodeId),

    #[error("node `{0}` is part of a parent/child cycle")]
    Cycle(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_details() {
        let err = ParseError::SchemaValidationFailed(vec![
            "nodes.a.size: missing field `width`".into(),
            "pages[0].name: expected string".into(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("size"));
        assert!(msg.contains("pages[0]"));

        let err = ParseError::IntegrityValidationFailed(vec![IntegrityViolation::MissingPageRoot {
            page: "page_1".into(),
            root: NodeId::intern("ghost"),
        }]);
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn unsupported_version_message() {
        let err = ParseError::UnsupportedVersion {
            found: 99,
            supported: 12,
        };
        assert_eq!(
            err.to_string(),
            "unsupported schema version 99 (this engine supports up to 12)"
        );
    }
}
