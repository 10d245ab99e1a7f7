//! Document patches: the forward / inverse deltas of one command.
//!
//! Commands only ever touch the node and asset maps, so a patch is a flat
//! list of whole-entry puts and removals against those two maps. Patches are
//! computed by diffing the document before and after a command rather than
//! by tracking individual writes; the inverse is simply the diff taken the
//! other way round.

use serde::{Deserialize, Serialize};
use vellum_core::{Asset, Document, Node, NodeId};

/// One entry-level edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PatchOp {
    /// Insert or replace a node (keyed by its own id).
    PutNode { node: Box<Node> },
    RemoveNode { id: NodeId },
    PutAsset { asset: Asset },
    RemoveAsset { id: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Patch {
    pub ops: Vec<PatchOp>,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Ids of every node this patch writes or removes.
    pub fn touched_nodes(&self) -> Vec<NodeId> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PatchOp::PutNode { node } => Some(node.id),
                PatchOp::RemoveNode { id } => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Replay onto `doc` in place.
    pub fn apply_to(&self, doc: &mut Document) {
        for op in &self.ops {
            match op {
                PatchOp::PutNode { node } => {
                    doc.nodes.insert(node.id, (**node).clone());
                }
                PatchOp::RemoveNode { id } => {
                    doc.nodes.remove(id);
                }
                PatchOp::PutAsset { asset } => {
                    doc.assets.insert(asset.id.clone(), asset.clone());
                }
                PatchOp::RemoveAsset { id } => {
                    doc.assets.remove(id);
                }
            }
        }
    }
}

/// The patch that turns `before` into `after`.
///
/// Ops are emitted in key order: node puts, node removals, asset puts, asset
/// removals.
pub fn diff(before: &Document, after: &Document) -> Patch {
    let mut ops = Vec::new();

    for (id, node) in &after.nodes {
        if before.nodes.get(id) != Some(node) {
            ops.push(PatchOp::PutNode {
                node: Box::new(node.clone()),
            });
        }
    }
    for id in before.nodes.keys() {
        if !after.nodes.contains_key(id) {
            ops.push(PatchOp::RemoveNode { id: *id });
        }
    }

    for (id, asset) in &after.assets {
        if before.assets.get(id) != Some(asset) {
            ops.push(PatchOp::PutAsset {
                asset: asset.clone(),
            });
        }
    }
    for id in before.assets.keys() {
        if !after.assets.contains_key(id) {
            ops.push(PatchOp::RemoveAsset { id: id.clone() });
        }
    }

    Patch { ops }
}

/// Replay `patch` onto a copy of `doc`.
pub fn apply_patch(doc: &Document, patch: &Patch) -> Document {
    let mut next = doc.clone();
    patch.apply_to(&mut next);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vellum_core::{AssetKind, NodeKind};

    fn with_box() -> Document {
        let mut doc = Document::new();
        let id = NodeId::intern("patch_box");
        doc.nodes.insert(
            id,
            Node::new(id, NodeKind::Rectangle { corner_radius: None }).at(0.0, 0.0, 10.0, 10.0),
        );
        let root = doc.root_id;
        doc.insert_child(root, id, None);
        doc
    }

    #[test]
    fn identical_documents_diff_empty() {
        let doc = with_box();
        assert!(diff(&doc, &doc).is_empty());
    }

    #[test]
    fn diff_and_replay() {
        let before = with_box();
        let mut after = before.clone();
        after.nodes.remove(&NodeId::intern("patch_box"));
        after.get_mut(after.root_id).unwrap().children = Some(vec![]);
        after.assets.insert(
            "logo".into(),
            Asset {
                id: "logo".into(),
                kind: AssetKind::Svg,
                name: None,
                mime_type: None,
                uri: Some("logo.svg".into()),
                width: None,
                height: None,
            },
        );

        let forward = diff(&before, &after);
        let inverse = diff(&after, &before);
        assert_eq!(forward.len(), 3);
        assert_eq!(
            forward.touched_nodes(),
            vec![before.root_id, NodeId::intern("patch_box")]
        );
        assert_eq!(apply_patch(&before, &forward), after);
        assert_eq!(apply_patch(&after, &inverse), before);
    }

    #[test]
    fn wire_shape() {
        let patch = Patch {
            ops: vec![PatchOp::RemoveNode {
                id: NodeId::intern("gone"),
            }],
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({ "ops": [{ "op": "removeNode", "id": "gone" }] }));
    }
}
