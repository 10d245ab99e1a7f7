//! An editing session: current document, history and revision counter.
//!
//! The revision is an explicit token bumped on every command, undo and redo.
//! Boolean resolution results are cached per `(node id, revision)`, so any
//! document change invalidates every cached outline at once.

use crate::commands::Command;
use crate::engine::{self, PatchPair};
use crate::error::CommandError;
use crate::history::{History, HistoryConfig};
use std::collections::HashMap;
use vellum_core::{
    Document, NodeId, ParseError, ResolveResult, SerializeError, SerializeOptions,
    parse_document_text, resolve_boolean_node_path, serialize_document,
};

pub struct Session {
    document: Document,
    history: History,
    revision: u64,
    boolean_cache: HashMap<(NodeId, u64), ResolveResult>,
}

impl Session {
    pub fn new(document: Document) -> Self {
        Self::with_config(document, HistoryConfig::default())
    }

    pub fn with_config(document: Document, config: HistoryConfig) -> Self {
        Self {
            document,
            history: History::new(config),
            revision: 0,
            boolean_cache: HashMap::new(),
        }
    }

    /// Load a session from saved text. Migration warnings are logged and
    /// returned alongside.
    pub fn load(text: &str) -> Result<(Self, Vec<String>), ParseError> {
        let outcome = parse_document_text(text)?;
        Ok((Self::new(outcome.document), outcome.warnings))
    }

    pub fn save(&self, options: &SerializeOptions) -> Result<String, SerializeError> {
        serialize_document(&self.document, options)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Apply a command and record it for undo.
    pub fn apply(&mut self, command: &Command) -> Result<PatchPair, CommandError> {
        let applied = engine::apply(&self.document, command)?;
        if applied.patches.is_empty() {
            log::debug!("{} left the document unchanged", command.label());
        }
        self.document = applied.document;
        self.history.record(applied.patches.clone(), command.label());
        self.bump();
        Ok(applied.patches)
    }

    pub fn undo(&mut self) -> Option<String> {
        let description = self.history.undo(&mut self.document)?;
        self.bump();
        Some(description)
    }

    pub fn redo(&mut self) -> Option<String> {
        let description = self.history.redo(&mut self.document)?;
        self.bump();
        Some(description)
    }

    /// Resolve a boolean node against the current revision, reusing a
    /// cached result when one exists. `None` if the node is missing.
    pub fn resolve_boolean(&mut self, id: NodeId) -> Option<ResolveResult> {
        let key = (id, self.revision);
        if let Some(hit) = self.boolean_cache.get(&key) {
            return Some(hit.clone());
        }
        let node = self.document.get(id)?;
        let result = resolve_boolean_node_path(&self.document, node);
        self.boolean_cache.insert(key, result.clone());
        Some(result)
    }

    fn bump(&mut self) {
        self.revision += 1;
        let current = self.revision;
        self.boolean_cache.retain(|(_, rev), _| *rev == current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_core::{Node, NodeKind};

    fn session_with_box() -> Session {
        let mut doc = Document::new();
        let id = NodeId::intern("sess_box");
        doc.nodes.insert(
            id,
            Node::new(id, NodeKind::Rectangle { corner_radius: None }).at(0.0, 0.0, 10.0, 10.0),
        );
        let root = doc.root_id;
        doc.insert_child(root, id, None);
        Session::new(doc)
    }

    #[test]
    fn revision_bumps_on_every_change() {
        let mut session = session_with_box();
        assert_eq!(session.revision(), 0);

        session
            .apply(&Command::ResizeNode {
                id: NodeId::intern("sess_box"),
                width: 20.0,
                height: 20.0,
            })
            .unwrap();
        assert_eq!(session.revision(), 1);

        session.undo();
        assert_eq!(session.revision(), 2);
        assert_eq!(session.document().nodes[&NodeId::intern("sess_box")].size.width, 10.0);
    }

    #[test]
    fn root_deletion_leaves_session_untouched() {
        let mut session = session_with_box();
        let before = session.document().clone();
        let root = before.root_id;
        assert!(session.apply(&Command::DeleteNode { id: root }).is_err());
        assert_eq!(session.document(), &before);
        assert_eq!(session.revision(), 0);
        assert!(!session.history().can_undo());
    }

    #[test]
    fn missing_boolean_is_none() {
        let mut session = session_with_box();
        assert!(session.resolve_boolean(NodeId::intern("sess_nope")).is_none());
    }
}
