//! Structural schema validation.
//!
//! A field-by-field pass over the untyped value collects every mismatch with
//! its path (`nodes.a.size.width: expected a finite number`) before the
//! typed decode runs, so callers get a full list instead of the first serde
//! error.

use crate::error::ParseError;
use crate::model::{Document, NODE_TYPES};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

const BOOLEAN_OPS: &[&str] = &["union", "subtract", "intersect", "exclude"];

#[derive(Default)]
struct Checker {
    errors: Vec<String>,
}

impl Checker {
    fn fail(&mut self, path: &str, msg: &str) {
        self.errors.push(format!("{path}: {msg}"));
    }

    fn string(&mut self, obj: &Map<String, Value>, path: &str, key: &str) {
        if !obj.get(key).is_some_and(Value::is_string) {
            self.fail(&format!("{path}.{key}"), "expected a string");
        }
    }

    fn opt_number(&mut self, obj: &Map<String, Value>, path: &str, key: &str) {
        if let Some(v) = obj.get(key)
            && !v.as_f64().is_some_and(f64::is_finite)
        {
            self.fail(&format!("{path}.{key}"), "expected a finite number");
        }
    }

    fn opt_bool(&mut self, obj: &Map<String, Value>, path: &str, key: &str) {
        if let Some(v) = obj.get(key)
            && !v.is_boolean()
        {
            self.fail(&format!("{path}.{key}"), "expected a boolean");
        }
    }

    fn opt_object<'v>(&mut self, obj: &'v Map<String, Value>, path: &str, key: &str) -> Option<&'v Map<String, Value>> {
        let v = obj.get(key)?;
        if v.is_object() {
            v.as_object()
        } else {
            self.fail(&format!("{path}.{key}"), "expected an object");
            None
        }
    }

    fn opt_string_array(&mut self, obj: &Map<String, Value>, path: &str, key: &str) {
        let Some(v) = obj.get(key) else {
            return;
        };
        match v.as_array() {
            Some(items) if items.iter().all(Value::is_string) => {}
            _ => self.fail(&format!("{path}.{key}"), "expected an array of strings"),
        }
    }

    fn xy(&mut self, obj: &Map<String, Value>, path: &str, key: &str, fields: [&str; 2], non_negative: bool) {
        let Some(inner) = self.opt_object(obj, path, key) else {
            return;
        };
        let here = format!("{path}.{key}");
        for field in fields {
            match inner.get(field).and_then(Value::as_f64) {
                Some(v) if v.is_finite() && (!non_negative || v >= 0.0) => {}
                Some(_) if non_negative => self.fail(&format!("{here}.{field}"), "expected a finite number ≥ 0"),
                _ => self.fail(&format!("{here}.{field}"), "expected a finite number"),
            }
        }
    }
}

fn check_page(c: &mut Checker, page: &Value, path: &str) {
    let Some(page) = page.as_object() else {
        c.fail(path, "expected an object");
        return;
    };
    for key in ["id", "name", "rootId"] {
        c.string(page, path, key);
    }
}

fn check_vector(c: &mut Checker, vector: &Map<String, Value>, path: &str) {
    let Some(points) = vector.get("points").and_then(Value::as_array) else {
        c.fail(&format!("{path}.points"), "expected an array");
        return;
    };
    let mut ids = BTreeSet::new();
    for (i, point) in points.iter().enumerate() {
        let here = format!("{path}.points[{i}]");
        let Some(point) = point.as_object() else {
            c.fail(&here, "expected an object");
            continue;
        };
        c.string(point, &here, "id");
        c.opt_number(point, &here, "x");
        c.opt_number(point, &here, "y");
        if let Some(id) = point.get("id").and_then(Value::as_str) {
            ids.insert(id);
        }
    }
    c.opt_bool(vector, path, "closed");
    for (i, seg) in vector
        .get("segments")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .enumerate()
    {
        for end in ["fromId", "toId"] {
            match seg.get(end).and_then(Value::as_str) {
                Some(id) if ids.contains(id) => {}
                Some(id) => c.fail(
                    &format!("{path}.segments[{i}].{end}"),
                    &format!("references unknown point `{id}`"),
                ),
                None => c.fail(&format!("{path}.segments[{i}].{end}"), "expected a string"),
            }
        }
    }
}

fn check_node(c: &mut Checker, node: &Value, path: &str) {
    let Some(node) = node.as_object() else {
        c.fail(path, "expected an object");
        return;
    };
    c.string(node, path, "id");
    let kind = node.get("type").and_then(Value::as_str);
    match kind {
        Some(t) if NODE_TYPES.contains(&t) => {}
        Some(t) => c.fail(&format!("{path}.type"), &format!("unknown node type `{t}`")),
        None => c.fail(&format!("{path}.type"), "expected a string"),
    }
    c.xy(node, path, "position", ["x", "y"], false);
    c.xy(node, path, "size", ["width", "height"], true);
    c.opt_number(node, path, "rotation");
    c.opt_number(node, path, "opacity");
    c.opt_bool(node, path, "visible");
    c.opt_bool(node, path, "locked");
    c.opt_string_array(node, path, "children");
    for key in ["fills", "strokes"] {
        if let Some(v) = node.get(key)
            && !v.is_array()
        {
            c.fail(&format!("{path}.{key}"), "expected an array");
        }
    }

    match kind {
        Some("boolean") => match c.opt_object(node, path, "booleanData") {
            Some(data) => {
                let here = format!("{path}.booleanData");
                match data.get("op").and_then(Value::as_str) {
                    Some(op) if BOOLEAN_OPS.contains(&op) => {}
                    _ => c.fail(&format!("{here}.op"), "expected one of union|subtract|intersect|exclude"),
                }
                if data.contains_key("operandIds") {
                    c.opt_string_array(data, &here, "operandIds");
                } else {
                    c.fail(&format!("{here}.operandIds"), "missing");
                }
                c.opt_number(data, &here, "tolerance");
            }
            None => c.fail(&format!("{path}.booleanData"), "missing"),
        },
        Some("image") => c.string(node, path, "assetId"),
        Some("componentInstance") => c.string(node, path, "componentId"),
        Some("path") => {
            if let Some(vector) = c.opt_object(node, path, "vector") {
                check_vector(c, vector, &format!("{path}.vector"));
            }
        }
        _ => {}
    }
}

/// Validate the untyped document and decode it.
pub fn validate_schema(value: Value) -> Result<Document, ParseError> {
    let mut c = Checker::default();
    let Some(doc) = value.as_object() else {
        return Err(ParseError::SchemaValidationFailed(vec!["document: expected an object".into()]));
    };

    if !doc.get("version").is_some_and(Value::is_u64) {
        c.fail("version", "expected a non-negative integer");
    }
    c.string(doc, "document", "rootId");
    c.string(doc, "document", "activePageId");

    match doc.get("pages").and_then(Value::as_array) {
        Some(pages) => {
            for (i, page) in pages.iter().enumerate() {
                check_page(&mut c, page, &format!("pages[{i}]"));
            }
        }
        None => c.fail("pages", "expected an array"),
    }

    match doc.get("nodes").and_then(Value::as_object) {
        Some(nodes) => {
            for (key, node) in nodes {
                check_node(&mut c, node, &format!("nodes.{key}"));
            }
        }
        None => c.fail("nodes", "expected an object"),
    }

    for key in ["assets", "styles", "variables", "components", "prototype"] {
        c.opt_object(doc, "document", key);
    }

    if !c.errors.is_empty() {
        return Err(ParseError::SchemaValidationFailed(c.errors));
    }

    serde_json::from_value(value).map_err(|e| ParseError::SchemaValidationFailed(vec![format!("document: {e}")]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "version": 12,
            "rootId": "root",
            "pages": [{ "id": "page_1", "name": "Page 1", "rootId": "root" }],
            "activePageId": "page_1",
            "nodes": { "root": { "id": "root", "type": "frame" } },
        })
    }

    #[test]
    fn minimal_document_decodes() {
        let doc = validate_schema(minimal()).unwrap();
        assert_eq!(doc.root_id.as_str(), "root");
        assert!(doc.assets.is_empty());
    }

    #[test]
    fn collects_every_field_error() {
        let mut value = minimal();
        value["nodes"]["root"]["size"] = json!({ "width": -1, "height": "tall" });
        value["nodes"]["bad"] = json!({ "id": "bad", "type": "triangle" });
        value["pages"][0]["name"] = json!(3);

        let Err(ParseError::SchemaValidationFailed(errors)) = validate_schema(value) else {
            panic!("expected schema failure");
        };
        assert!(errors.iter().any(|e| e.starts_with("nodes.root.size.width")));
        assert!(errors.iter().any(|e| e.starts_with("nodes.root.size.height")));
        assert!(errors.iter().any(|e| e.contains("triangle")));
        assert!(errors.iter().any(|e| e.starts_with("pages[0].name")));
    }

    #[test]
    fn boolean_nodes_need_boolean_data() {
        let mut value = minimal();
        value["nodes"]["b"] = json!({ "id": "b", "type": "boolean" });
        let Err(ParseError::SchemaValidationFailed(errors)) = validate_schema(value) else {
            panic!("expected schema failure");
        };
        assert_eq!(errors, vec!["nodes.b.booleanData: missing".to_string()]);
    }

    #[test]
    fn segments_must_reference_points() {
        let mut value = minimal();
        value["nodes"]["p"] = json!({ "id": "p", "type": "path", "vector": {
            "points": [{ "id": "a", "x": 0, "y": 0 }],
            "segments": [{ "id": "a-z", "fromId": "a", "toId": "z" }],
        }});
        let Err(ParseError::SchemaValidationFailed(errors)) = validate_schema(value) else {
            panic!("expected schema failure");
        };
        assert!(errors[0].contains("unknown point `z`"));
    }
}
