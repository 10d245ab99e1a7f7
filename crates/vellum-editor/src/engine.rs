//! Command application: the only sanctioned mutator of a `Document`.
//!
//! `apply` never touches its input. It clones the document into a draft,
//! runs the command against the draft, refreshes the metadata of every
//! boolean node whose inputs moved, and then diffs draft against input to
//! produce the forward and inverse patches.
//!
//! Malformed commands (unknown ids, out-of-range indices, declined boolean
//! creation, cyclic reparenting) are absorbed as no-ops and reported on the
//! `debug` log channel. Deleting a root node is the one hard failure.

use crate::commands::Command;
use crate::error::CommandError;
use crate::patch::{Patch, diff};
use kurbo::{Affine, BezPath, Rect};
use petgraph::visit::Dfs;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};
use vellum_core::bounds::local_transform;
use vellum_core::schema::integrity::tree_graph;
use vellum_core::{
    Asset, BooleanData, BooleanErrorCode, BooleanOp, BooleanStatus, Bounds, Document, HandleSide,
    Node, NodeId, NodeKind, Point, ResolveResult, Size, VectorData, resolve_boolean_node_path,
    resolve_constraints,
};

/// Forward and inverse deltas of one command.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatchPair {
    pub forward: Patch,
    pub inverse: Patch,
}

impl PatchPair {
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub document: Document,
    pub patches: PatchPair,
}

/// Nodes whose geometry a command changed. Every boolean at or above one
/// of these is refreshed before the command completes.
type Touched = BTreeSet<NodeId>;

// ─── Entry points ────────────────────────────────────────────────────────

pub fn apply(doc: &Document, command: &Command) -> Result<Applied, CommandError> {
    let mut draft = doc.clone();
    execute(&mut draft, command)?;
    let forward = diff(doc, &draft);
    let inverse = diff(&draft, doc);
    Ok(Applied {
        document: draft,
        patches: PatchPair { forward, inverse },
    })
}

/// The new document only.
pub fn apply_command(doc: &Document, command: &Command) -> Result<Document, CommandError> {
    apply(doc, command).map(|applied| applied.document)
}

/// The patch pair only.
pub fn command_patches(doc: &Document, command: &Command) -> Result<PatchPair, CommandError> {
    apply(doc, command).map(|applied| applied.patches)
}

/// Run one command against the draft and refresh the booleans it touched.
/// Batch members are executed (and refreshed) one after another.
fn execute(draft: &mut Document, command: &Command) -> Result<(), CommandError> {
    let mut touched = Touched::new();
    run(draft, command, &mut touched)?;
    refresh_booleans(draft, &touched);
    Ok(())
}

fn run(draft: &mut Document, command: &Command, touched: &mut Touched) -> Result<(), CommandError> {
    match command {
        Command::CreateNode {
            node,
            parent_id,
            index,
        } => create_node(draft, node, *parent_id, *index, touched),
        Command::DeleteNode { id } => delete_node(draft, *id, touched)?,
        Command::MoveNode {
            id,
            x,
            y,
            parent_id,
            index,
        } => move_node(draft, *id, Point::new(*x, *y), *parent_id, *index, touched),
        Command::ResizeNode { id, width, height } => {
            resize_node(draft, *id, Size::new(*width, *height), touched)
        }
        Command::SetProps { id, props } => set_props(draft, *id, props, touched),
        Command::ReorderChild {
            parent_id,
            from_index,
            to_index,
        } => reorder_child(draft, *parent_id, *from_index, *to_index),
        Command::CreateAsset { asset } => create_asset(draft, asset),
        Command::GroupNodes { ids, index } => group_nodes(draft, ids, *index, touched),
        Command::UngroupNode { id } => ungroup_node(draft, *id, touched),
        Command::CreateBooleanNode { ids, op, index } => {
            create_boolean_node(draft, ids, *op, *index, touched)
        }
        Command::UpdateBooleanNode {
            id,
            op,
            operand_ids,
            tolerance,
        } => update_boolean_node(draft, *id, *op, operand_ids.as_deref(), *tolerance, touched),
        Command::FlattenBooleanNode { id } => flatten_boolean_node(draft, *id, touched),
        Command::AddVectorPoint { id, x, y, index } => edit_vector(draft, *id, touched, |v| {
            v.add_point(*index, *x, *y);
            true
        }),
        Command::MoveVectorPoint { id, point_id, x, y } => {
            edit_vector(draft, *id, touched, |v| v.move_point(point_id, *x, *y))
        }
        Command::DeleteVectorPoint { id, point_id } => {
            edit_vector(draft, *id, touched, |v| v.delete_point(point_id))
        }
        Command::SetVectorHandle {
            id,
            point_id,
            side,
            handle,
        } => set_vector_handle(draft, *id, point_id, *side, *handle, touched),
        Command::ToggleVectorClosed { id, closed } => edit_vector(draft, *id, touched, |v| {
            v.closed = *closed;
            true
        }),
        Command::Batch { commands } => {
            for sub in commands {
                execute(draft, sub)?;
            }
        }
    }
    Ok(())
}

// ─── Structure ───────────────────────────────────────────────────────────

fn create_node(
    draft: &mut Document,
    node: &Node,
    parent_id: Option<NodeId>,
    index: Option<usize>,
    touched: &mut Touched,
) {
    if draft.contains(node.id) {
        log::debug!("createNode: `{}` already exists", node.id);
        return;
    }
    if !node.children().is_empty() {
        log::debug!("createNode: `{}` must be created without children", node.id);
        return;
    }
    if !node.position.is_finite() {
        log::debug!("createNode: `{}` has a non-finite position", node.id);
        return;
    }
    let parent = parent_id
        .or_else(|| draft.active_page().map(|p| p.root_id))
        .unwrap_or(draft.root_id);
    if !draft.get(parent).is_some_and(Node::is_container) {
        log::debug!("createNode: parent `{parent}` is missing or cannot hold children");
        return;
    }

    let mut node = node.clone();
    node.children = None;
    node.size = node.size.clamped();
    if let NodeKind::Path {
        vector: Some(vector),
        ..
    } = &mut node.kind
    {
        let offset = vector.normalize();
        node.position = node.position.translate(offset.x, offset.y);
    }

    let id = node.id;
    draft.nodes.insert(id, node);
    draft.insert_child(parent, id, index);
    attach_operand(draft, parent, id);
    touched.insert(id);
}

fn delete_node(draft: &mut Document, id: NodeId, touched: &mut Touched) -> Result<(), CommandError> {
    if draft.is_structural_root(id) {
        return Err(CommandError::root_deletion(id));
    }
    if !draft.contains(id) {
        log::debug!("deleteNode: `{id}` does not exist");
        return Ok(());
    }
    let doomed = subtree(draft, id);
    if let Some(root) = doomed.iter().find(|n| draft.is_structural_root(**n)) {
        return Err(CommandError::root_deletion(*root));
    }

    if let Some((parent, _)) = draft.detach(id) {
        detach_operand(draft, parent, id);
        touched.insert(parent);
    }
    for node in doomed {
        draft.nodes.remove(&node);
    }
    Ok(())
}

fn move_node(
    draft: &mut Document,
    id: NodeId,
    to: Point,
    parent_id: Option<NodeId>,
    index: Option<usize>,
    touched: &mut Touched,
) {
    if !draft.contains(id) {
        log::debug!("moveNode: `{id}` does not exist");
        return;
    }
    if !to.is_finite() {
        log::debug!("moveNode: non-finite target for `{id}`");
        return;
    }

    if let Some(parent) = parent_id {
        let fits = draft.get(parent).is_some_and(Node::is_container);
        if !fits || parent == id || draft.is_structural_root(id) || draft.is_ancestor_of(id, parent) {
            log::debug!("moveNode: cannot reparent `{id}` under `{parent}`");
            return;
        }
        if let Some((old_parent, _)) = draft.detach(id) {
            detach_operand(draft, old_parent, id);
            touched.insert(old_parent);
        }
        draft.insert_child(parent, id, index);
        attach_operand(draft, parent, id);
    }

    if let Some(node) = draft.get_mut(id) {
        node.position = to;
    }
    touched.insert(id);
}

/// Resize a node. Vector paths scale their geometry with the box; children
/// that carry layout constraints follow the parent's new size.
fn resize_node(draft: &mut Document, id: NodeId, requested: Size, touched: &mut Touched) {
    let Some(node) = draft.get(id) else {
        log::debug!("resizeNode: `{id}` does not exist");
        return;
    };
    let old = node.size;
    let new = requested.clamped();
    let constrained: Vec<_> = node
        .children()
        .iter()
        .filter_map(|c| draft.get(*c).and_then(|n| n.constraints.map(|k| (*c, k))))
        .collect();

    if let Some(node) = draft.get_mut(id) {
        if let NodeKind::Path {
            vector: Some(vector),
            ..
        } = &mut node.kind
            && old.width > 0.0
            && old.height > 0.0
        {
            vector.scale(new.width / old.width, new.height / old.height);
        }
        node.size = new;
    }

    for (child_id, constraints) in constrained {
        if let Some(child) = draft.get_mut(child_id) {
            let placed = resolve_constraints(child.local_bounds(), constraints, old, new);
            child.position = Point::new(placed.x, placed.y);
            child.size = Size::new(placed.width, placed.height).clamped();
            touched.insert(child_id);
        }
    }
    touched.insert(id);
}

/// Fields that only structural commands may write.
const PROTECTED_PROPS: &[&str] = &["id", "type", "children"];

fn set_props(draft: &mut Document, id: NodeId, props: &Map<String, Value>, touched: &mut Touched) {
    let Some(node) = draft.get(id) else {
        log::debug!("setProps: `{id}` does not exist");
        return;
    };
    let mut value = match serde_json::to_value(node) {
        Ok(value) => value,
        Err(e) => {
            log::debug!("setProps: cannot encode `{id}`: {e}");
            return;
        }
    };
    let Some(fields) = value.as_object_mut() else {
        return;
    };
    for (key, prop) in props {
        if PROTECTED_PROPS.contains(&key.as_str()) {
            log::debug!("setProps: `{key}` is not writable");
            continue;
        }
        if prop.is_null() {
            fields.remove(key);
        } else {
            fields.insert(key.clone(), prop.clone());
        }
    }

    let mut next: Node = match serde_json::from_value(value) {
        Ok(next) => next,
        Err(e) => {
            log::debug!("setProps: rejected for `{id}`: {e}");
            return;
        }
    };
    if !next.position.is_finite() {
        log::debug!("setProps: non-finite position for `{id}`");
        return;
    }
    if let Some(data) = next.boolean_data()
        && !operands_are_children(&next, &data.operand_ids)
    {
        log::debug!("setProps: operands of `{id}` must be distinct children");
        return;
    }
    next.size = next.size.clamped();
    if let NodeKind::Path {
        vector: Some(vector),
        ..
    } = &mut next.kind
    {
        let offset = vector.normalize();
        next.position = next.position.translate(offset.x, offset.y);
    }
    draft.nodes.insert(id, next);
    touched.insert(id);
}

/// Move one child within its parent. The destination is clamped; an
/// out-of-range source is a no-op.
fn reorder_child(draft: &mut Document, parent_id: NodeId, from: usize, to: usize) {
    let Some(children) = draft.get_mut(parent_id).and_then(|p| p.children.as_mut()) else {
        log::debug!("reorderChild: `{parent_id}` has no children");
        return;
    };
    if from >= children.len() {
        log::debug!("reorderChild: index {from} out of range for `{parent_id}`");
        return;
    }
    let child = children.remove(from);
    let to = to.min(children.len());
    children.insert(to, child);
}

fn create_asset(draft: &mut Document, asset: &Asset) {
    if draft.assets.contains_key(&asset.id) {
        log::debug!("createAsset: `{}` already exists", asset.id);
        return;
    }
    draft.assets.insert(asset.id.clone(), asset.clone());
}

// ─── Group / ungroup ─────────────────────────────────────────────────────

fn group_nodes(draft: &mut Document, ids: &[NodeId], index: Option<usize>, touched: &mut Touched) {
    let Some((parent, members)) = sibling_selection(draft, ids, 1) else {
        log::debug!("groupNodes: selection must be existing siblings");
        return;
    };
    let group_id = NodeId::fresh("group", |id| draft.contains(id));
    let group = Node::new(group_id, NodeKind::Group);
    wrap(draft, parent, &members, index, group, touched);
}

/// Dissolve a group (or boolean) into its parent at its own index, keeping
/// every child where it is on the canvas.
fn ungroup_node(draft: &mut Document, id: NodeId, touched: &mut Touched) {
    let Some(node) = draft.get(id) else {
        log::debug!("ungroupNode: `{id}` does not exist");
        return;
    };
    if !matches!(node.kind, NodeKind::Group | NodeKind::Boolean { .. }) {
        log::debug!("ungroupNode: `{id}` is a {}", node.kind.type_name());
        return;
    }
    let Some((parent, index)) = draft.parent_of(id) else {
        log::debug!("ungroupNode: `{id}` has no parent");
        return;
    };
    let transform = local_transform(node);
    let rotation = node.rotation.unwrap_or(0.0);
    let children = node.children().to_vec();

    for child_id in &children {
        let Some(child) = draft.get_mut(*child_id) else {
            continue;
        };
        let half = (child.size.width / 2.0, child.size.height / 2.0);
        let center = transform * kurbo::Point::new(child.position.x + half.0, child.position.y + half.1);
        child.position = Point::new(center.x - half.0, center.y - half.1);
        if rotation != 0.0 {
            let total = child.rotation.unwrap_or(0.0) + rotation;
            child.rotation = (total != 0.0).then_some(total);
        }
        touched.insert(*child_id);
    }

    draft.detach(id);
    detach_operand(draft, parent, id);
    draft.nodes.remove(&id);
    let live: Vec<NodeId> = children.into_iter().filter(|c| draft.contains(*c)).collect();
    if let Some(p) = draft.get_mut(parent) {
        let list = p.children_mut();
        let at = index.min(list.len());
        list.splice(at..at, live.iter().copied());
    }
    for child in live {
        attach_operand(draft, parent, child);
    }
    touched.insert(parent);
}

/// Validate a selection: distinct, existing, non-root siblings, at least
/// `min` of them. Returns the shared parent and the selection in the
/// parent's child order.
fn sibling_selection(draft: &Document, ids: &[NodeId], min: usize) -> Option<(NodeId, Vec<NodeId>)> {
    let wanted: BTreeSet<NodeId> = ids.iter().copied().collect();
    if wanted.len() < min || wanted.len() != ids.len() {
        return None;
    }
    let mut parent = None;
    for id in &wanted {
        if draft.is_structural_root(*id) {
            return None;
        }
        let (p, _) = draft.parent_of(*id)?;
        if parent.is_some_and(|q| q != p) {
            return None;
        }
        parent = Some(p);
    }
    let parent = parent?;
    let ordered = draft
        .get(parent)?
        .children()
        .iter()
        .copied()
        .filter(|c| wanted.contains(c))
        .collect();
    Some((parent, ordered))
}

/// Enclosing box of `members` in their parent's space, rotation included.
fn selection_bounds(draft: &Document, members: &[NodeId]) -> Option<Bounds> {
    members
        .iter()
        .filter_map(|id| draft.get(*id))
        .map(|n| {
            let local = Rect::new(0.0, 0.0, n.size.width, n.size.height);
            Bounds::from_kurbo(local_transform(n).transform_rect_bbox(local))
        })
        .reduce(|a, b| a.union(&b))
}

/// Splice `composite` into `parent` in place of `members`, which become its
/// children translated into the composite's local space.
fn wrap(
    draft: &mut Document,
    parent: NodeId,
    members: &[NodeId],
    index: Option<usize>,
    mut composite: Node,
    touched: &mut Touched,
) {
    let Some(bbox) = selection_bounds(draft, members).filter(Bounds::is_finite) else {
        log::debug!("cannot wrap a selection without finite bounds");
        return;
    };
    let first = draft
        .get(parent)
        .and_then(|p| p.children().iter().position(|c| members.contains(c)))
        .unwrap_or(0);

    if let Some(p) = draft.get_mut(parent) {
        p.children_mut().retain(|c| !members.contains(c));
    }
    for member in members {
        detach_operand(draft, parent, *member);
        if let Some(node) = draft.get_mut(*member) {
            node.position = node.position.translate(-bbox.x, -bbox.y);
        }
    }

    composite.position = Point::new(bbox.x, bbox.y);
    composite.size = Size::new(bbox.width, bbox.height).clamped();
    composite.children = Some(members.to_vec());
    let id = composite.id;
    draft.nodes.insert(id, composite);
    draft.insert_child(parent, id, Some(index.unwrap_or(first)));
    attach_operand(draft, parent, id);
    touched.insert(id);
}

// ─── Booleans ────────────────────────────────────────────────────────────

fn create_boolean_node(
    draft: &mut Document,
    ids: &[NodeId],
    op: BooleanOp,
    index: Option<usize>,
    touched: &mut Touched,
) {
    let Some((parent, operands)) = sibling_selection(draft, ids, 2) else {
        log::debug!("createBooleanNode: declined, needs at least two sibling operands");
        return;
    };
    let id = NodeId::fresh("boolean", |id| draft.contains(id));
    let node = Node::new(
        id,
        NodeKind::Boolean {
            boolean_data: BooleanData::new(op, operands.clone()),
        },
    );
    wrap(draft, parent, &operands, index, node, touched);
}

fn update_boolean_node(
    draft: &mut Document,
    id: NodeId,
    op: Option<BooleanOp>,
    operand_ids: Option<&[NodeId]>,
    tolerance: Option<f64>,
    touched: &mut Touched,
) {
    let Some(node) = draft.get(id).filter(|n| n.is_boolean()) else {
        log::debug!("updateBooleanNode: `{id}` is not a boolean node");
        return;
    };
    if let Some(ids) = operand_ids
        && !operands_are_children(node, ids)
    {
        log::debug!("updateBooleanNode: operands of `{id}` must be distinct children");
        return;
    }
    let Some(data) = draft.get_mut(id).and_then(Node::boolean_data_mut) else {
        return;
    };
    if let Some(op) = op {
        data.op = op;
    }
    if let Some(ids) = operand_ids {
        data.operand_ids = ids.to_vec();
    }
    if let Some(tolerance) = tolerance {
        data.tolerance = tolerance;
    }
    touched.insert(id);
}

/// Operand lists name each of the boolean's own children at most once.
fn operands_are_children(node: &Node, ids: &[NodeId]) -> bool {
    let distinct: BTreeSet<_> = ids.iter().collect();
    distinct.len() == ids.len() && ids.iter().all(|o| node.children().contains(o))
}

/// Replace a boolean by a path carrying its resolved outline. A boolean that
/// does not resolve is marked invalid instead and keeps its operands.
fn flatten_boolean_node(draft: &mut Document, id: NodeId, touched: &mut Touched) {
    let Some(node) = draft.get(id).filter(|n| n.is_boolean()) else {
        log::debug!("flattenBooleanNode: `{id}` is not a boolean node");
        return;
    };
    let (path_data, fill_rule, bounds) = match resolve_boolean_node_path(draft, node) {
        ResolveResult::Ok {
            path_data,
            fill_rule,
            bounds,
        } => (path_data, fill_rule, bounds),
        ResolveResult::Invalid { error_code } => {
            mark_boolean(draft, id, Some(error_code));
            return;
        }
    };
    if path_data.is_empty() {
        log::debug!("flattenBooleanNode: `{id}` resolves to an empty outline");
        return;
    }
    let Ok(mut outline) = BezPath::from_svg(&path_data) else {
        log::debug!("flattenBooleanNode: unreadable outline for `{id}`");
        return;
    };
    let operands: Vec<NodeId> = node.children().to_vec();
    let doomed: Vec<NodeId> = operands.iter().flat_map(|o| subtree(draft, *o)).collect();
    if doomed.iter().any(|n| draft.is_structural_root(*n)) {
        log::debug!("flattenBooleanNode: operands of `{id}` contain a root node");
        return;
    }

    for gone in doomed {
        draft.nodes.remove(&gone);
    }
    outline.apply_affine(Affine::translate((-bounds.x, -bounds.y)));
    if let Some(node) = draft.get_mut(id) {
        node.kind = NodeKind::Path {
            vector: None,
            path_data: Some(outline.to_svg()),
            fill_rule: Some(fill_rule),
        };
        node.children = None;
        node.position = node.position.translate(bounds.x, bounds.y);
        node.size = Size::new(bounds.width, bounds.height).clamped();
    }
    touched.insert(id);
}

/// Refresh every boolean at or above a touched node, deepest first, so a
/// nested boolean's new box is in place before its parent re-resolves.
fn refresh_booleans(draft: &mut Document, touched: &Touched) {
    if touched.is_empty() {
        return;
    }
    let parents = draft.parent_map();
    let mut targets: SmallVec<[(usize, NodeId); 4]> = SmallVec::new();
    let mut seen = BTreeSet::new();

    for start in touched {
        let chain = ancestry(&parents, *start, draft.nodes.len());
        let depth = chain.len();
        for (i, id) in chain.into_iter().enumerate() {
            if draft.get(id).is_some_and(Node::is_boolean) && seen.insert(id) {
                targets.push((depth - i, id));
            }
        }
    }
    targets.sort_by(|a, b| b.0.cmp(&a.0));

    for (_, id) in targets {
        refresh_boolean(draft, id);
    }
}

/// `id` followed by its ancestors, nearest first.
fn ancestry(parents: &BTreeMap<NodeId, NodeId>, id: NodeId, limit: usize) -> Vec<NodeId> {
    let mut chain = vec![id];
    let mut current = id;
    while let Some(parent) = parents.get(&current) {
        if chain.len() > limit {
            break;
        }
        chain.push(*parent);
        current = *parent;
    }
    chain
}

/// Re-resolve one boolean and record the outcome on the node.
///
/// Success clears the error and grows (never shrinks) the node's box to
/// cover the resolved outline; failure only records the error code.
fn refresh_boolean(draft: &mut Document, id: NodeId) {
    let Some(node) = draft.get(id) else {
        return;
    };
    let slack = node.boolean_data().map_or(0.0, |d| d.tolerance.max(0.0));
    match resolve_boolean_node_path(draft, node) {
        ResolveResult::Ok {
            path_data, bounds, ..
        } => {
            mark_boolean(draft, id, None);
            if !path_data.is_empty() {
                grow_to(draft, id, bounds, slack);
            }
        }
        ResolveResult::Invalid { error_code } => mark_boolean(draft, id, Some(error_code)),
    }
}

fn mark_boolean(draft: &mut Document, id: NodeId, error: Option<BooleanErrorCode>) {
    if let Some(data) = draft.get_mut(id).and_then(Node::boolean_data_mut) {
        data.status = match error {
            None => BooleanStatus::Ok,
            Some(_) => BooleanStatus::Invalid,
        };
        data.last_error_code = error;
    }
}

/// Grow `id`'s box to include `geometry` (in its local space). Geometry
/// left of / above the origin moves the node and counter-shifts its
/// children so nothing moves on the canvas. Overshoot within `slack` is
/// ignored.
fn grow_to(draft: &mut Document, id: NodeId, geometry: Bounds, slack: f64) {
    let Some(node) = draft.get_mut(id) else {
        return;
    };
    let beyond = |v: f64, edge: f64| if v > edge + slack { v } else { edge };
    let shift = Point::new(
        -beyond(-geometry.x, 0.0),
        -beyond(-geometry.y, 0.0),
    );
    let width = beyond(geometry.max_x(), node.size.width) - shift.x;
    let height = beyond(geometry.max_y(), node.size.height) - shift.y;
    node.position = node.position.translate(shift.x, shift.y);
    node.size = Size::new(width, height).clamped();
    if shift == Point::default() {
        return;
    }
    let children = node.children().to_vec();
    for child in children {
        if let Some(child) = draft.get_mut(child) {
            child.position = child.position.translate(-shift.x, -shift.y);
        }
    }
}

/// Keep a boolean parent's operand list in step with its children.
fn attach_operand(draft: &mut Document, parent: NodeId, child: NodeId) {
    if let Some(data) = draft.get_mut(parent).and_then(Node::boolean_data_mut)
        && !data.operand_ids.contains(&child)
    {
        data.operand_ids.push(child);
    }
}

fn detach_operand(draft: &mut Document, parent: NodeId, child: NodeId) {
    if let Some(data) = draft.get_mut(parent).and_then(Node::boolean_data_mut) {
        data.operand_ids.retain(|o| *o != child);
    }
}

// ─── Vector paths ────────────────────────────────────────────────────────

/// Run `edit` on a path node's vector data, then re-anchor the geometry at
/// the origin, fold the offset into the node position and fit the box.
fn edit_vector(
    draft: &mut Document,
    id: NodeId,
    touched: &mut Touched,
    edit: impl FnOnce(&mut VectorData) -> bool,
) {
    let Some(node) = draft.get_mut(id) else {
        log::debug!("vector edit: `{id}` does not exist");
        return;
    };
    let NodeKind::Path {
        vector, path_data, ..
    } = &node.kind
    else {
        log::debug!("vector edit: `{id}` is a {}", node.kind.type_name());
        return;
    };
    if vector.is_none() && path_data.as_ref().is_some_and(|d| !d.is_empty()) {
        log::debug!("vector edit: `{id}` only carries literal path data");
        return;
    }
    let mut vector = vector.clone().unwrap_or_default();
    if !edit(&mut vector) {
        log::debug!("vector edit: no matching point on `{id}`");
        return;
    }

    let offset = vector.normalize();
    node.position = node.position.translate(offset.x, offset.y);
    if let Some(b) = vector.bounds() {
        node.size = Size::new(b.width, b.height).clamped();
    }
    if let NodeKind::Path {
        vector: slot,
        path_data,
        ..
    } = &mut node.kind
    {
        *slot = Some(vector);
        *path_data = None;
    }
    touched.insert(id);
}

fn set_vector_handle(
    draft: &mut Document,
    id: NodeId,
    point_id: &str,
    side: HandleSide,
    handle: Option<Point>,
    touched: &mut Touched,
) {
    if handle.is_some_and(|h| !h.is_finite()) {
        log::debug!("setVectorHandle: non-finite handle on `{id}`");
        return;
    }
    edit_vector(draft, id, touched, |v| v.set_handle(point_id, side, handle));
}

// ─── Helpers ─────────────────────────────────────────────────────────────

/// `id` and every node below it.
fn subtree(doc: &Document, id: NodeId) -> Vec<NodeId> {
    let graph = tree_graph(doc);
    let mut dfs = Dfs::new(&graph, id);
    let mut out = Vec::new();
    while let Some(next) = dfs.next(&graph) {
        out.push(next);
    }
    out
}
