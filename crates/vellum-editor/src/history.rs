//! Undo/Redo history.
//!
//! Every applied command leaves a patch pair behind. Undo replays the
//! inverse patch and moves the entry to the redo stack; redo replays the
//! forward patch and moves it back. A batch command arrives here as a
//! single entry, so it undoes all-or-nothing.

use crate::engine::PatchPair;
use vellum_core::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum undo depth; the oldest entry is dropped beyond it.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub patches: PatchPair,
    pub description: String,
}

/// Bounded undo/redo stacks of patch pairs.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    config: HistoryConfig,
}

impl History {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undo_stack: Vec::with_capacity(config.max_depth.min(256)),
            redo_stack: Vec::new(),
            config,
        }
    }

    /// Push a new entry. Empty patch pairs are not recorded. Clears redo.
    pub fn record(&mut self, patches: PatchPair, description: &str) {
        if patches.is_empty() {
            return;
        }
        self.undo_stack.push(HistoryEntry {
            patches,
            description: description.to_string(),
        });
        if self.undo_stack.len() > self.config.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Revert the last entry on `doc`. Returns its description.
    pub fn undo(&mut self, doc: &mut Document) -> Option<String> {
        let entry = self.undo_stack.pop()?;
        entry.patches.inverse.apply_to(doc);
        let description = entry.description.clone();
        self.redo_stack.push(entry);
        Some(description)
    }

    /// Re-apply the last undone entry on `doc`. Returns its description.
    pub fn redo(&mut self, doc: &mut Document) -> Option<String> {
        let entry = self.redo_stack.pop()?;
        entry.patches.forward.apply_to(doc);
        let description = entry.description.clone();
        self.undo_stack.push(entry);
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
