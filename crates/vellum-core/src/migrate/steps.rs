//! Per-version upgraders over the untyped document.
//!
//! Each upgrader is keyed by the version it upgrades *from* and only
//! rewrites fields that are still in the old shape, so running one over a
//! document that is already partially upgraded is harmless.

use super::infer;
use super::{Warnings, nodes_mut};
use crate::error::ParseError;
use crate::model::Color;
use crate::vector::{VectorPoint, derive_segments};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};

pub(super) type Upgrader = fn(&mut Map<String, Value>, u32, &mut Warnings) -> Result<(), ParseError>;

/// Upgraders keyed by originating version, in chain order.
pub(super) const UPGRADERS: &[(u32, Upgrader)] = &[
    (1, backfill_clip_content),
    (2, layer_fills_and_strokes),
    (3, backfill_assets_and_styles),
    (4, backfill_boolean_data),
    (5, backfill_vector_data),
    (6, backfill_variables),
    (7, synthesize_root_and_pages),
    (8, synthesize_prototype),
    (9, lift_effect_variables),
    (10, lift_component_instances),
    (11, lift_inline_images),
];

/// Collection that receives node-local effect variables.
pub const LEGACY_EFFECT_COLLECTION: &str = "legacy_effect_variables";
const LEGACY_EFFECT_MODE: &str = "default";

fn node_type(node: &Map<String, Value>) -> Option<&str> {
    node.get("type").and_then(Value::as_str)
}

/// `obj[key]` as an object, replacing whatever non-object sat there.
fn ensure_object<'a>(
    obj: &'a mut Map<String, Value>,
    key: &str,
    from: u32,
) -> Result<&'a mut Map<String, Value>, ParseError> {
    let slot = obj.entry(key.to_string()).or_insert_with(|| json!({}));
    if !slot.is_object() {
        *slot = json!({});
    }
    slot.as_object_mut().ok_or_else(|| ParseError::MigrationFailed {
        from,
        reason: format!("`{key}` is not an object"),
    })
}

// ─── v1 → v2 ────────────────────────────────────────────────────────────

fn backfill_clip_content(doc: &mut Map<String, Value>, from: u32, _: &mut Warnings) -> Result<(), ParseError> {
    for node in nodes_mut(doc, from)?.values_mut().filter_map(Value::as_object_mut) {
        if node_type(node) != Some("frame") || node.contains_key("clipContent") {
            continue;
        }
        let legacy_clip = node.remove("clipsContent").and_then(|v| v.as_bool());
        let overflow = node.remove("overflow");
        let clip = legacy_clip
            .or_else(|| overflow.as_ref().and_then(Value::as_str).map(|o| o == "hidden"))
            .unwrap_or(true);
        node.insert("clipContent".into(), Value::Bool(clip));
    }
    Ok(())
}

// ─── v2 → v3 ────────────────────────────────────────────────────────────

fn legacy_paint(fill: &Value) -> Option<Value> {
    match fill {
        Value::String(s) => Color::from_hex(s).map(|_| json!({ "type": "solid", "color": s })),
        Value::Object(obj) if obj.contains_key("type") => Some(fill.clone()),
        Value::Object(obj) => {
            let color = obj.get("color")?.as_str()?;
            Color::from_hex(color)?;
            let mut paint = obj.clone();
            paint.insert("type".into(), json!("solid"));
            Some(Value::Object(paint))
        }
        _ => None,
    }
}

fn legacy_stroke(stroke: &Value, width: Option<f64>) -> Option<Value> {
    let width = width.unwrap_or(1.0);
    match stroke {
        Value::String(s) => Color::from_hex(s).map(|_| json!({ "color": s, "width": width })),
        Value::Object(obj) => {
            Color::from_hex(obj.get("color")?.as_str()?)?;
            let mut out = obj.clone();
            out.entry("width").or_insert(json!(width));
            Some(Value::Object(out))
        }
        _ => None,
    }
}

/// Legacy single `fill` / `stroke` become layered `fills` / `strokes`. The
/// legacy fields stay in place as mirrors.
fn layer_fills_and_strokes(doc: &mut Map<String, Value>, from: u32, warnings: &mut Warnings) -> Result<(), ParseError> {
    for (key, node) in nodes_mut(doc, from)?.iter_mut() {
        let Some(node) = node.as_object_mut() else {
            continue;
        };
        if !node.contains_key("fills")
            && let Some(fill) = node.get("fill").filter(|f| !f.is_null()).map(legacy_paint)
        {
            match fill {
                Some(paint) => {
                    node.insert("fills".into(), json!([paint]));
                }
                None => warnings.push(format!("node `{key}`: dropped unreadable legacy fill")),
            }
        }
        let width = node.get("strokeWidth").and_then(Value::as_f64);
        if !node.contains_key("strokes")
            && let Some(stroke) = node
                .get("stroke")
                .filter(|s| !s.is_null())
                .map(|s| legacy_stroke(s, width))
        {
            match stroke {
                Some(s) => {
                    node.insert("strokes".into(), json!([s]));
                }
                None => warnings.push(format!("node `{key}`: dropped unreadable legacy stroke")),
            }
        }
        node.remove("strokeWidth");
    }
    Ok(())
}

// ─── v3 → v4 ────────────────────────────────────────────────────────────

fn backfill_assets_and_styles(doc: &mut Map<String, Value>, from: u32, _: &mut Warnings) -> Result<(), ParseError> {
    ensure_object(doc, "assets", from)?;
    let styles = ensure_object(doc, "styles", from)?;
    for section in ["paint", "text", "effect", "grid"] {
        ensure_object(styles, section, from)?;
    }
    Ok(())
}

// ─── v4 → v5 ────────────────────────────────────────────────────────────

fn backfill_boolean_data(doc: &mut Map<String, Value>, from: u32, _: &mut Warnings) -> Result<(), ParseError> {
    const OPS: [&str; 4] = ["union", "subtract", "intersect", "exclude"];
    for node in nodes_mut(doc, from)?.values_mut().filter_map(Value::as_object_mut) {
        if node_type(node) != Some("boolean") {
            continue;
        }
        let children = node.get("children").cloned().unwrap_or_else(|| json!([]));
        let legacy_op = node
            .remove("booleanOp")
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|op| OPS.contains(&op.as_str()))
            .unwrap_or_else(|| "union".to_string());

        let data = ensure_object(node, "booleanData", from)?;
        data.entry("op").or_insert(json!(legacy_op));
        data.entry("operandIds").or_insert(children);
        data.entry("status").or_insert(json!("ok"));
        data.entry("tolerance").or_insert(json!(crate::model::DEFAULT_BOOLEAN_TOLERANCE));
    }
    Ok(())
}

// ─── v5 → v6 ────────────────────────────────────────────────────────────

fn backfill_vector_data(doc: &mut Map<String, Value>, from: u32, _: &mut Warnings) -> Result<(), ParseError> {
    for node in nodes_mut(doc, from)?.values_mut().filter_map(Value::as_object_mut) {
        let Some(vector) = node.get_mut("vector").and_then(Value::as_object_mut) else {
            continue;
        };
        let Some(points) = vector.get_mut("points").and_then(Value::as_array_mut) else {
            continue;
        };
        for (i, point) in points.iter_mut().enumerate() {
            let Some(point) = point.as_object_mut() else {
                continue;
            };
            point.entry("id").or_insert_with(|| json!(format!("pt_{}", i + 1)));
            point.entry("cornerMode").or_insert(json!("sharp"));
        }
        let point_count = points.len();

        let closed = vector.get("closed").and_then(Value::as_bool).unwrap_or(false) && point_count >= 3;
        vector.insert("closed".into(), Value::Bool(closed));

        let has_segments = vector
            .get("segments")
            .and_then(Value::as_array)
            .is_some_and(|s| !s.is_empty());
        if !has_segments {
            let parsed: Vec<VectorPoint> = vector
                .get("points")
                .cloned()
                .and_then(|p| serde_json::from_value(p).ok())
                .unwrap_or_default();
            let segments = derive_segments(&parsed, closed);
            vector.insert(
                "segments".into(),
                serde_json::to_value(segments).unwrap_or_else(|_| json!([])),
            );
        }
    }
    Ok(())
}

// ─── v6 → v7 ────────────────────────────────────────────────────────────

fn backfill_variables(doc: &mut Map<String, Value>, from: u32, _: &mut Warnings) -> Result<(), ParseError> {
    let variables = ensure_object(doc, "variables", from)?;
    for section in ["collections", "tokens", "activeModes"] {
        ensure_object(variables, section, from)?;
    }
    Ok(())
}

// ─── v7 → v8 ────────────────────────────────────────────────────────────

/// Pick a document root: `root` when present, otherwise the first node
/// (in key order) that no other node lists as a child.
fn infer_root(nodes: &Map<String, Value>) -> Option<String> {
    if nodes.contains_key("root") {
        return Some("root".into());
    }
    let referenced: BTreeSet<&str> = nodes
        .values()
        .filter_map(|n| n.get("children").and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_str)
        .collect();
    nodes
        .keys()
        .find(|k| !referenced.contains(k.as_str()))
        .cloned()
}

fn synthesize_root_and_pages(doc: &mut Map<String, Value>, from: u32, warnings: &mut Warnings) -> Result<(), ParseError> {
    if !doc.get("rootId").is_some_and(Value::is_string) {
        let Some(root) = infer_root(nodes_mut(doc, from)?) else {
            return Err(ParseError::MigrationFailed {
                from,
                reason: "cannot infer a root node from an empty node map".into(),
            });
        };
        warnings.push(format!("synthesized rootId `{root}`"));
        doc.insert("rootId".into(), json!(root));
    }

    let has_pages = doc.get("pages").and_then(Value::as_array).is_some_and(|p| !p.is_empty());
    if !has_pages {
        let root = doc.get("rootId").cloned().unwrap_or(Value::Null);
        doc.insert(
            "pages".into(),
            json!([{ "id": "page_1", "name": "Page 1", "rootId": root }]),
        );
        warnings.push("synthesized page `page_1` for the document root".into());
    }

    if !doc.get("activePageId").is_some_and(Value::is_string) {
        let first = doc
            .get("pages")
            .and_then(|p| p.get(0))
            .and_then(|p| p.get("id"))
            .cloned()
            .unwrap_or(Value::Null);
        doc.insert("activePageId".into(), first);
    }
    Ok(())
}

// ─── v8 → v9 ────────────────────────────────────────────────────────────

fn synthesize_prototype(doc: &mut Map<String, Value>, from: u32, _: &mut Warnings) -> Result<(), ParseError> {
    let page_ids: Vec<String> = doc
        .get("pages")
        .and_then(Value::as_array)
        .map(|pages| {
            pages
                .iter()
                .filter_map(|p| p.get("id").and_then(Value::as_str).map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let prototype = ensure_object(doc, "prototype", from)?;
    let pages = ensure_object(prototype, "pages", from)?;
    for id in page_ids {
        pages.entry(id).or_insert_with(|| json!({ "interactions": [] }));
    }
    Ok(())
}

// ─── v9 → v10 ───────────────────────────────────────────────────────────

/// Node-local `effectVariables` move into a first-class collection; each
/// node keeps a `variableBindings` entry per key.
fn lift_effect_variables(doc: &mut Map<String, Value>, from: u32, warnings: &mut Warnings) -> Result<(), ParseError> {
    // key → (first value seen, already reported as duplicate)
    let mut seen: BTreeMap<String, (Value, bool)> = BTreeMap::new();

    for node in nodes_mut(doc, from)?.values_mut().filter_map(Value::as_object_mut) {
        let Some(Value::Object(vars)) = node.remove("effectVariables") else {
            continue;
        };
        let bindings = ensure_object(node, "variableBindings", from)?;
        for (key, value) in vars {
            bindings.entry(key.clone()).or_insert_with(|| json!(key));
            match seen.get_mut(&key) {
                None => {
                    seen.insert(key, (value, false));
                }
                Some((first, reported)) => {
                    if *first != value && !*reported {
                        warnings.push(format!(
                            "effect variable `{key}` has conflicting values; keeping the first"
                        ));
                        *reported = true;
                    }
                }
            }
        }
    }

    if seen.is_empty() {
        return Ok(());
    }

    let variables = ensure_object(doc, "variables", from)?;
    let collections = ensure_object(variables, "collections", from)?;
    collections.entry(LEGACY_EFFECT_COLLECTION).or_insert_with(|| {
        json!({
            "id": LEGACY_EFFECT_COLLECTION,
            "name": "Legacy effect variables",
            "modes": [{ "id": LEGACY_EFFECT_MODE, "name": "Default" }],
            "defaultModeId": LEGACY_EFFECT_MODE,
        })
    });
    ensure_object(variables, "activeModes", from)?
        .entry(LEGACY_EFFECT_COLLECTION)
        .or_insert(json!(LEGACY_EFFECT_MODE));

    let tokens = ensure_object(variables, "tokens", from)?;
    let count = seen.len();
    for (key, (value, _)) in seen {
        if tokens.contains_key(&key) {
            warnings.push(format!("effect variable `{key}` clashes with an existing token; skipped"));
            continue;
        }
        let kind = infer::infer_type(&value);
        let typed = infer::to_variable_value(&value, kind);
        tokens.insert(
            key.clone(),
            json!({
                "id": key,
                "name": key,
                "collectionId": LEGACY_EFFECT_COLLECTION,
                "type": kind,
                "valuesByMode": { LEGACY_EFFECT_MODE: typed },
            }),
        );
    }
    warnings.push(format!(
        "migrated {count} effect variable(s) into collection `{LEGACY_EFFECT_COLLECTION}`"
    ));
    Ok(())
}

// ─── v10 → v11 ──────────────────────────────────────────────────────────

/// Ad hoc component masters (`isComponent`) become first-class definitions,
/// grouped into sets by their legacy `componentSet` name. Instances that
/// point at a master through `masterId` get a real `componentId`.
fn lift_component_instances(doc: &mut Map<String, Value>, from: u32, warnings: &mut Warnings) -> Result<(), ParseError> {
    let mut definitions: BTreeMap<String, Value> = BTreeMap::new();
    let mut sets: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut master_to_definition: BTreeMap<String, String> = BTreeMap::new();

    let nodes = nodes_mut(doc, from)?;
    for (key, node) in nodes.iter_mut() {
        let Some(node) = node.as_object_mut() else {
            continue;
        };
        let is_master = node.remove("isComponent").and_then(|v| v.as_bool()).unwrap_or(false);
        let set_name = node
            .remove("componentSet")
            .and_then(|v| v.as_str().map(str::to_string));
        if !is_master {
            continue;
        }
        let def_id = format!("component_{key}");
        let name = node
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(key.as_str())
            .to_string();
        let mut def = json!({ "id": def_id, "name": name, "rootNodeId": key });
        if let Some(set_name) = set_name {
            let set_id = format!("set_{}", slug(&set_name));
            def["setId"] = json!(set_id);
            sets.entry(set_name).or_default().push(def_id.clone());
        }
        master_to_definition.insert(key.clone(), def_id.clone());
        definitions.insert(def_id, def);
    }

    for (key, node) in nodes.iter_mut() {
        let Some(node) = node.as_object_mut() else {
            continue;
        };
        if node_type(node) != Some("componentInstance") {
            continue;
        }
        let master = node.remove("masterId").and_then(|v| v.as_str().map(str::to_string));
        if node.get("componentId").is_some_and(Value::is_string) {
            continue;
        }
        match master.and_then(|m| master_to_definition.get(&m).cloned()) {
            Some(def_id) => {
                node.insert("componentId".into(), json!(def_id));
            }
            None => warnings.push(format!("component instance `{key}` has no resolvable master")),
        }
    }

    let lifted = definitions.len();
    let components = ensure_object(doc, "components", from)?;
    let defs = ensure_object(components, "definitions", from)?;
    for (id, def) in definitions {
        defs.entry(id).or_insert(def);
    }
    let out_sets = ensure_object(components, "sets", from)?;
    for (name, ids) in sets {
        let set_id = format!("set_{}", slug(&name));
        out_sets
            .entry(set_id.clone())
            .or_insert_with(|| json!({ "id": set_id, "name": name, "definitionIds": ids }));
    }
    if lifted > 0 {
        warnings.push(format!("lifted {lifted} ad hoc component(s) into the component library"));
    }
    Ok(())
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

// ─── v11 → v12 ──────────────────────────────────────────────────────────

/// Inline image `src` strings become shared asset entries.
fn lift_inline_images(doc: &mut Map<String, Value>, from: u32, _: &mut Warnings) -> Result<(), ParseError> {
    let mut by_src: BTreeMap<String, String> = doc
        .get("assets")
        .and_then(Value::as_object)
        .map(|assets| {
            assets
                .iter()
                .filter_map(|(id, a)| Some((a.get("uri")?.as_str()?.to_string(), id.clone())))
                .collect()
        })
        .unwrap_or_default();
    let mut taken: BTreeSet<String> = by_src.values().cloned().collect();
    let mut created: Vec<(String, String)> = Vec::new();

    for node in nodes_mut(doc, from)?.values_mut().filter_map(Value::as_object_mut) {
        if node_type(node) != Some("image") || node.get("assetId").is_some_and(Value::is_string) {
            continue;
        }
        let Some(src) = node.remove("src").and_then(|v| v.as_str().map(str::to_string)) else {
            continue;
        };
        let asset_id = match by_src.get(&src) {
            Some(id) => id.clone(),
            None => {
                let id = (1..)
                    .map(|n| format!("asset_{n}"))
                    .find(|id| !taken.contains(id))
                    .unwrap_or_default();
                taken.insert(id.clone());
                by_src.insert(src.clone(), id.clone());
                created.push((id.clone(), src));
                id
            }
        };
        node.insert("assetId".into(), json!(asset_id));
    }

    let assets = ensure_object(doc, "assets", from)?;
    for (id, src) in created {
        assets.insert(id.clone(), json!({ "id": id, "type": "image", "uri": src }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(step: Upgrader, doc: Value) -> (Value, Warnings) {
        let mut warnings = Warnings::default();
        let Value::Object(mut map) = doc else {
            panic!("fixture must be an object");
        };
        step(&mut map, 1, &mut warnings).unwrap();
        (Value::Object(map), warnings)
    }

    #[test]
    fn clip_content_honours_legacy_flags() {
        let (doc, _) = run(
            backfill_clip_content,
            json!({ "nodes": {
                "a": { "type": "frame", "clipsContent": false },
                "b": { "type": "frame", "overflow": "hidden" },
                "c": { "type": "frame" },
                "d": { "type": "frame", "clipContent": false },
            }}),
        );
        assert_eq!(doc["nodes"]["a"]["clipContent"], false);
        assert_eq!(doc["nodes"]["b"]["clipContent"], true);
        assert_eq!(doc["nodes"]["c"]["clipContent"], true);
        assert_eq!(doc["nodes"]["d"]["clipContent"], false);
    }

    #[test]
    fn legacy_fill_becomes_layers_and_stays_mirrored() {
        let (doc, warnings) = run(
            layer_fills_and_strokes,
            json!({ "nodes": {
                "a": { "type": "rectangle", "fill": "#FF0000", "stroke": "#000000", "strokeWidth": 2 },
                "b": { "type": "rectangle", "fill": "not-a-color" },
            }}),
        );
        assert_eq!(doc["nodes"]["a"]["fills"], json!([{ "type": "solid", "color": "#FF0000" }]));
        assert_eq!(doc["nodes"]["a"]["fill"], "#FF0000");
        assert_eq!(doc["nodes"]["a"]["strokes"][0]["width"], 2.0);
        assert!(doc["nodes"]["b"].get("fills").is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn boolean_data_backfills_from_children() {
        let (doc, _) = run(
            backfill_boolean_data,
            json!({ "nodes": { "b": { "type": "boolean", "children": ["x", "y"], "booleanOp": "subtract" } } }),
        );
        let data = &doc["nodes"]["b"]["booleanData"];
        assert_eq!(data["op"], "subtract");
        assert_eq!(data["operandIds"], json!(["x", "y"]));
        assert_eq!(data["status"], "ok");
    }

    #[test]
    fn vector_segments_are_derived() {
        let (doc, _) = run(
            backfill_vector_data,
            json!({ "nodes": { "p": { "type": "path", "vector": {
                "points": [{ "x": 0, "y": 0 }, { "x": 10, "y": 0 }, { "x": 5, "y": 8 }],
                "closed": true,
            }}}}),
        );
        let vector = &doc["nodes"]["p"]["vector"];
        assert_eq!(vector["points"][2]["id"], "pt_3");
        assert_eq!(vector["segments"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn root_inferred_from_unreferenced_node() {
        let (doc, warnings) = run(
            synthesize_root_and_pages,
            json!({ "nodes": {
                "child": { "type": "rectangle" },
                "top": { "type": "frame", "children": ["child"] },
            }}),
        );
        assert_eq!(doc["rootId"], "top");
        assert_eq!(doc["pages"][0]["rootId"], "top");
        assert_eq!(doc["activePageId"], "page_1");
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn effect_variables_are_deduplicated() {
        let (doc, warnings) = run(
            lift_effect_variables,
            json!({ "nodes": {
                "a": { "type": "rectangle", "effectVariables": { "shadowColor": "#00000080", "blur": "4px" } },
                "b": { "type": "rectangle", "effectVariables": { "shadowColor": "#FFFFFF", "label": "soft" } },
            }}),
        );
        let tokens = &doc["variables"]["tokens"];
        assert_eq!(tokens["shadowColor"]["type"], "color");
        assert_eq!(tokens["shadowColor"]["valuesByMode"]["default"], "#00000080");
        assert_eq!(tokens["blur"]["type"], "number");
        assert_eq!(tokens["blur"]["valuesByMode"]["default"], 4.0);
        assert_eq!(tokens["label"]["type"], "string");
        assert_eq!(doc["nodes"]["b"]["variableBindings"]["shadowColor"], "shadowColor");
        assert!(doc["nodes"]["a"].get("effectVariables").is_none());
        assert_eq!(
            doc["variables"]["activeModes"][LEGACY_EFFECT_COLLECTION],
            LEGACY_EFFECT_MODE
        );
        assert!(warnings.iter().any(|w| w.contains("conflicting")));
    }

    #[test]
    fn component_masters_are_lifted() {
        let (doc, _) = run(
            lift_component_instances,
            json!({ "nodes": {
                "btn": { "type": "frame", "name": "Button", "isComponent": true, "componentSet": "Buttons" },
                "use1": { "type": "componentInstance", "masterId": "btn" },
            }}),
        );
        assert_eq!(doc["components"]["definitions"]["component_btn"]["rootNodeId"], "btn");
        assert_eq!(doc["components"]["sets"]["set_buttons"]["definitionIds"], json!(["component_btn"]));
        assert_eq!(doc["nodes"]["use1"]["componentId"], "component_btn");
    }

    #[test]
    fn inline_images_share_assets() {
        let (doc, _) = run(
            lift_inline_images,
            json!({ "nodes": {
                "i1": { "type": "image", "src": "https://cdn.example/cat.png" },
                "i2": { "type": "image", "src": "https://cdn.example/cat.png" },
            }}),
        );
        assert_eq!(doc["nodes"]["i1"]["assetId"], "asset_1");
        assert_eq!(doc["nodes"]["i2"]["assetId"], "asset_1");
        assert_eq!(doc["assets"]["asset_1"]["uri"], "https://cdn.example/cat.png");
    }
}
