//! Legacy single-value `fill` / `stroke` mirrors.
//!
//! Older readers only understand a single fill color and a single stroke.
//! The in-memory model never carries these; they are derived from the first
//! layer of `fills` / `strokes` when a document is written, and read back
//! only by the v2 upgrader.

use serde_json::{Map, Value, json};

/// Add mirror fields to every node of an encoded document.
pub fn write_mirrors(doc: &mut Value) {
    let Some(nodes) = doc.get_mut("nodes").and_then(Value::as_object_mut) else {
        return;
    };
    for node in nodes.values_mut().filter_map(Value::as_object_mut) {
        mirror_node(node);
    }
}

fn mirror_node(node: &mut Map<String, Value>) {
    let fill = node
        .get("fills")
        .and_then(|f| f.get(0))
        .filter(|p| p.get("type").and_then(Value::as_str) == Some("solid"))
        .and_then(|p| p.get("color"))
        .cloned();
    match fill {
        Some(color) => node.insert("fill".into(), color),
        None => node.remove("fill"),
    };

    let stroke = node.get("strokes").and_then(|s| s.get(0)).cloned();
    match stroke {
        Some(first) => {
            node.insert("stroke".into(), first.get("color").cloned().unwrap_or(Value::Null));
            node.insert(
                "strokeWidth".into(),
                first.get("width").cloned().unwrap_or(json!(1.0)),
            );
        }
        None => {
            node.remove("stroke");
            node.remove("strokeWidth");
        }
    }
}

/// Remove mirror fields again; used when reading a current-version document.
pub fn strip_mirrors(doc: &mut Value) {
    let Some(nodes) = doc.get_mut("nodes").and_then(Value::as_object_mut) else {
        return;
    };
    for node in nodes.values_mut().filter_map(Value::as_object_mut) {
        for key in ["fill", "stroke", "strokeWidth"] {
            node.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrors_follow_first_layer() {
        let mut doc = json!({ "nodes": {
            "a": {
                "fills": [{ "type": "solid", "color": "#112233" }, { "type": "solid", "color": "#FFFFFF" }],
                "strokes": [{ "color": "#000000", "width": 3.0 }],
            },
            "b": { "fills": [{ "type": "image", "assetId": "x" }], "fill": "#FFFFFF" },
        }});
        write_mirrors(&mut doc);
        assert_eq!(doc["nodes"]["a"]["fill"], "#112233");
        assert_eq!(doc["nodes"]["a"]["stroke"], "#000000");
        assert_eq!(doc["nodes"]["a"]["strokeWidth"], 3.0);
        assert!(doc["nodes"]["b"].get("fill").is_none());

        strip_mirrors(&mut doc);
        assert!(doc["nodes"]["a"].get("fill").is_none());
        assert!(doc["nodes"]["a"].get("strokeWidth").is_none());
    }
}
