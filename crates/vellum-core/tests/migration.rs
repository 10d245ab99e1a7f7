use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use vellum_core::migrate::LEGACY_EFFECT_COLLECTION;
use vellum_core::*;

const V7_LEGACY: &str = include_str!("fixtures/v7_legacy.json");
const V10_INVALID_PAGE_ROOT: &str = include_str!("fixtures/v10_invalid_page_root.json");
const V1_KITCHEN_SINK: &str = include_str!("fixtures/v1_kitchen_sink.json");

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

#[test]
fn legacy_v7_gets_one_page_on_root() {
    let outcome = parse_document_text(V7_LEGACY).unwrap();
    let doc = &outcome.document;

    assert_eq!(doc.version, CURRENT_VERSION);
    assert_eq!(doc.root_id, id("root"));
    assert_eq!(doc.pages.len(), 1);
    assert_eq!(doc.pages[0].root_id, id("root"));
    assert_eq!(doc.active_page_id, doc.pages[0].id);
    assert!(doc.prototype.pages.contains_key(&doc.pages[0].id));
}

#[test]
fn invalid_page_root_is_rejected() {
    let err = parse_document_text(V10_INVALID_PAGE_ROOT).unwrap_err();
    let ParseError::IntegrityValidationFailed(violations) = err else {
        panic!("expected integrity failure, got {err:?}");
    };
    assert_eq!(
        violations,
        vec![IntegrityViolation::MissingPageRoot {
            page: "page_1".into(),
            root: id("missing_root"),
        }]
    );
}

/// Smallest document that is valid at `version`, before any upgrade runs.
fn minimal_at(version: u32) -> Value {
    let mut doc = json!({
        "version": version,
        "nodes": { "root": { "id": "root", "type": "frame" } },
    });
    if version >= 8 {
        doc["rootId"] = json!("root");
        doc["pages"] = json!([{ "id": "p", "name": "P", "rootId": "root" }]);
        doc["activePageId"] = json!("p");
    }
    doc
}

#[test]
fn every_historical_version_reaches_current() {
    for version in 1..CURRENT_VERSION {
        let text = minimal_at(version).to_string();
        let outcome = parse_document_text(&text)
            .unwrap_or_else(|e| panic!("v{version} failed to load: {e}"));
        assert_eq!(outcome.document.version, CURRENT_VERSION, "v{version}");
        assert_eq!(outcome.document.pages.len(), 1, "v{version}");
    }
}

#[test]
fn current_version_is_a_no_op() {
    let text = minimal_at(CURRENT_VERSION).to_string();
    let outcome = parse_document_text(&text).unwrap();
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.document.pages[0].id, "p");
    // No upgrader touched the frame.
    assert_eq!(
        outcome.document.nodes[&id("root")].kind,
        NodeKind::Frame {
            clip_content: true,
            corner_radius: None,
        }
    );
}

#[test]
fn kitchen_sink_migrates_every_legacy_shape() {
    let outcome = parse_document_text(V1_KITCHEN_SINK).unwrap();
    let doc = &outcome.document;

    // rootId inferred from the only unreferenced node
    assert_eq!(doc.root_id, id("canvas"));
    assert_eq!(doc.pages[0].root_id, id("canvas"));

    // clip flags
    assert!(matches!(
        doc.nodes[&id("canvas")].kind,
        NodeKind::Frame {
            clip_content: false,
            ..
        }
    ));

    // layered paints
    let card = &doc.nodes[&id("card")];
    assert_eq!(
        card.fills,
        Some(vec![Paint::solid(Color::from_hex("#6C5CE7").unwrap())])
    );
    let strokes = card.strokes.as_ref().unwrap();
    assert_eq!(strokes[0].width, 2.0);

    // boolean data from children
    let logo = doc.nodes[&id("logo")].boolean_data().unwrap();
    assert_eq!(logo.op, BooleanOp::Subtract);
    assert_eq!(logo.operand_ids, vec![id("logo_outer"), id("logo_hole")]);
    assert_eq!(logo.tolerance, 0.001);

    // vector backfill
    let NodeKind::Path {
        vector: Some(vector),
        ..
    } = &doc.nodes[&id("badge")].kind
    else {
        panic!("badge should stay a path with vector data");
    };
    assert!(vector.closed);
    assert_eq!(vector.segments.len(), 3);
    assert_eq!(vector.points[0].id, "pt_1");

    // effect variables: nodes are visited in key order, so `badge` wins
    let tokens = &doc.variables.tokens;
    let shadow = &tokens["shadowColor"];
    assert_eq!(shadow.collection_id, LEGACY_EFFECT_COLLECTION);
    assert_eq!(shadow.kind, VariableType::Color);
    assert_eq!(
        shadow.values_by_mode["default"],
        VariableValue::Text("#FF0000".into())
    );
    assert_eq!(tokens["shadowBlur"].kind, VariableType::Number);
    assert_eq!(tokens["label"].kind, VariableType::String);
    assert_eq!(
        card.variable_bindings.as_ref().unwrap()["shadowBlur"],
        "shadowBlur"
    );
    assert!(outcome.warnings.iter().any(|w| w.contains("shadowColor")));

    // components
    let def = &doc.components.definitions["component_button_master"];
    assert_eq!(def.root_node_id, id("button_master"));
    assert_eq!(def.set_id.as_deref(), Some("set_buttons"));
    assert!(matches!(
        &doc.nodes[&id("button_use")].kind,
        NodeKind::ComponentInstance { component_id, .. } if component_id == "component_button_master"
    ));

    // inline image
    assert!(matches!(
        &doc.nodes[&id("photo")].kind,
        NodeKind::Image { asset_id, .. } if asset_id == "asset_1"
    ));
    assert_eq!(
        doc.assets["asset_1"].uri.as_deref(),
        Some("https://images.example/cat.png")
    );
}

#[test]
fn kitchen_sink_boolean_resolves_after_migration() {
    let doc = parse_document_text(V1_KITCHEN_SINK).unwrap().document;
    let logo = &doc.nodes[&id("logo")];
    let result = resolve_boolean_node_path(&doc, logo);
    let ResolveResult::Ok { bounds, path_data, .. } = result else {
        panic!("expected the donut to resolve, got {result:?}");
    };
    assert!(bounds.approx_eq(&Bounds::new(0.0, 0.0, 100.0, 100.0), 0.2));
    assert!(!path_data.is_empty());
}

#[test]
fn unreadable_legacy_paint_is_a_warning() {
    let text = json!({
        "version": 2,
        "nodes": { "root": { "id": "root", "type": "frame", "fill": "tomato" } },
    })
    .to_string();
    let outcome = parse_document_text(&text).unwrap();
    assert!(outcome.document.nodes[&id("root")].fills.is_none());
    assert!(outcome.warnings.iter().any(|w| w.contains("legacy fill")));
}
