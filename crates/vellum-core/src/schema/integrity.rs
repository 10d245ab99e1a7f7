//! Referential integrity checks over a decoded document.
//!
//! The parent → child relation is loaded into a `petgraph` graph map so
//! that multi-parent nodes and cycles fall out of standard graph queries.

use crate::error::IntegrityViolation;
use crate::id::NodeId;
use crate::model::Document;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::BTreeSet;

/// Parent → child edges for every resolvable child reference.
pub fn tree_graph(doc: &Document) -> DiGraphMap<NodeId, ()> {
    let mut graph = DiGraphMap::new();
    for (id, node) in &doc.nodes {
        graph.add_node(*id);
        for child in node.children() {
            if doc.nodes.contains_key(child) {
                graph.add_edge(*id, *child, ());
            }
        }
    }
    graph
}

/// Every violated reference rule. Empty means the document is sound.
pub fn check_integrity(doc: &Document) -> Vec<IntegrityViolation> {
    let mut violations = Vec::new();

    if !doc.contains(doc.root_id) {
        violations.push(IntegrityViolation::MissingRoot(doc.root_id));
    }

    let mut page_ids = BTreeSet::new();
    let mut page_roots = BTreeSet::new();
    for page in &doc.pages {
        if !page_ids.insert(page.id.as_str()) {
            violations.push(IntegrityViolation::DuplicatePageId(page.id.clone()));
        }
        if !page_roots.insert(page.root_id) {
            violations.push(IntegrityViolation::DuplicatePageRoot(page.root_id));
        }
        if !doc.contains(page.root_id) {
            violations.push(IntegrityViolation::MissingPageRoot {
                page: page.id.clone(),
                root: page.root_id,
            });
        }
    }
    if doc.active_page().is_none() {
        violations.push(IntegrityViolation::MissingActivePage(doc.active_page_id.clone()));
    }

    for (key, node) in &doc.nodes {
        if *key != node.id {
            violations.push(IntegrityViolation::KeyMismatch {
                key: *key,
                id: node.id,
            });
        }
        for child in node.children() {
            if !doc.contains(*child) {
                violations.push(IntegrityViolation::MissingChild {
                    parent: *key,
                    child: *child,
                });
            }
        }
    }

    let graph = tree_graph(doc);
    for id in graph.nodes() {
        if graph.neighbors_directed(id, Direction::Incoming).count() > 1 {
            violations.push(IntegrityViolation::MultipleParents(id));
        }
    }
    for component in tarjan_scc(&graph) {
        let cyclic = component.len() > 1
            || component
                .first()
                .is_some_and(|n| graph.contains_edge(*n, *n));
        if cyclic {
            let mut members = component;
            members.sort();
            violations.extend(members.into_iter().map(IntegrityViolation::Cycle));
        }
    }

    violations
}
