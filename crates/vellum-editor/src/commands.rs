//! Edit intents issued by the UI.
//!
//! The command payload is part of the wire contract between the UI and the
//! engine: variants are tagged on `"type"` and every field is camelCase.
//! Coordinates are parent-local for node commands and node-local for vector
//! point commands.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vellum_core::{Asset, BooleanOp, HandleSide, Node, NodeId, Point};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    /// Insert a childless node under `parent_id` (the active page root
    /// when absent) at `index` (appended when absent).
    CreateNode {
        node: Box<Node>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<NodeId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    /// Remove a node and its whole subtree.
    DeleteNode { id: NodeId },
    /// Set a node's position, optionally reparenting it first.
    MoveNode {
        id: NodeId,
        x: f64,
        y: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<NodeId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    ResizeNode { id: NodeId, width: f64, height: f64 },
    /// Overwrite an arbitrary subset of a node's wire fields. A `null`
    /// value clears an optional field.
    SetProps { id: NodeId, props: Map<String, Value> },
    ReorderChild {
        parent_id: NodeId,
        from_index: usize,
        to_index: usize,
    },
    CreateAsset { asset: Asset },
    GroupNodes {
        ids: Vec<NodeId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    UngroupNode { id: NodeId },
    CreateBooleanNode {
        ids: Vec<NodeId>,
        op: BooleanOp,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    /// Change any of a boolean node's operator, operand order or tolerance.
    UpdateBooleanNode {
        id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        op: Option<BooleanOp>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        operand_ids: Option<Vec<NodeId>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tolerance: Option<f64>,
    },
    /// Replace a boolean node by a plain path holding its resolved outline.
    FlattenBooleanNode { id: NodeId },
    AddVectorPoint {
        id: NodeId,
        x: f64,
        y: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    MoveVectorPoint {
        id: NodeId,
        point_id: String,
        x: f64,
        y: f64,
    },
    DeleteVectorPoint { id: NodeId, point_id: String },
    SetVectorHandle {
        id: NodeId,
        point_id: String,
        side: HandleSide,
        #[serde(default)]
        handle: Option<Point>,
    },
    ToggleVectorClosed { id: NodeId, closed: bool },
    /// Sub-commands applied in order as one atomic unit.
    Batch { commands: Vec<Command> },
}

impl Command {
    /// Short human-readable label, used for undo/redo menu entries.
    pub fn label(&self) -> &'static str {
        match self {
            Command::CreateNode { .. } => "Create layer",
            Command::DeleteNode { .. } => "Delete layer",
            Command::MoveNode { .. } => "Move",
            Command::ResizeNode { .. } => "Resize",
            Command::SetProps { .. } => "Edit properties",
            Command::ReorderChild { .. } => "Reorder",
            Command::CreateAsset { .. } => "Add asset",
            Command::GroupNodes { .. } => "Group",
            Command::UngroupNode { .. } => "Ungroup",
            Command::CreateBooleanNode { .. } => "Boolean",
            Command::UpdateBooleanNode { .. } => "Edit boolean",
            Command::FlattenBooleanNode { .. } => "Flatten",
            Command::AddVectorPoint { .. } => "Add point",
            Command::MoveVectorPoint { .. } => "Move point",
            Command::DeleteVectorPoint { .. } => "Delete point",
            Command::SetVectorHandle { .. } => "Edit handle",
            Command::ToggleVectorClosed { .. } => "Close path",
            Command::Batch { .. } => "Edit",
        }
    }
}
