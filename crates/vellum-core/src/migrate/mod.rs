//! Forward migration of saved documents.
//!
//! Runs on the untyped JSON value, before schema validation. The chain is
//! linear: a document saved at version `v` passes through every upgrader
//! keyed `v, v+1, …, CURRENT_VERSION - 1`. After the chain, page
//! normalization runs on every load regardless of version.
//!
//! Every mutation of the input that a user might notice is reported as a
//! human-readable warning. Warnings never fail a load.

pub mod infer;
pub mod legacy;
mod steps;

pub use steps::LEGACY_EFFECT_COLLECTION;

use crate::error::ParseError;
use crate::model::CURRENT_VERSION;
use log::{info, warn};
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;

/// Accumulated, non-fatal migration notes.
pub type Warnings = Vec<String>;

/// The `nodes` map of an untyped document. A missing map is created empty.
pub(crate) fn nodes_mut(doc: &mut Map<String, Value>, from: u32) -> Result<&mut Map<String, Value>, ParseError> {
    match doc.entry("nodes").or_insert_with(|| json!({})) {
        Value::Object(nodes) => Ok(nodes),
        _ => Err(ParseError::MigrationFailed {
            from,
            reason: "`nodes` is not an object".into(),
        }),
    }
}

/// Upgrade `doc` from `from` to [`CURRENT_VERSION`].
pub fn upgrade(doc: &mut Map<String, Value>, from: u32, warnings: &mut Warnings) -> Result<(), ParseError> {
    for &(version, upgrader) in steps::UPGRADERS {
        if version < from {
            continue;
        }
        let before = warnings.len();
        upgrader(doc, version, warnings)?;
        info!("migrated document v{version} -> v{}", version + 1);
        for w in &warnings[before..] {
            warn!("{w}");
        }
    }
    doc.insert("version".into(), json!(CURRENT_VERSION));
    Ok(())
}

/// Normalize `pages` / `activePageId` against the node map.
///
/// Duplicate page ids are dropped (first wins). Pages whose root does not
/// resolve are dropped as long as at least one valid page survives; when
/// none would, they are kept so integrity validation can report them. An
/// empty page list gets a single fallback page on the document root.
pub fn normalize_pages(doc: &mut Map<String, Value>, warnings: &mut Warnings) {
    let before = warnings.len();
    let node_ids: BTreeSet<String> = doc
        .get("nodes")
        .and_then(Value::as_object)
        .map(|nodes| nodes.keys().cloned().collect())
        .unwrap_or_default();

    let Some(Value::Array(pages)) = doc.get_mut("pages") else {
        return;
    };

    let mut seen = BTreeSet::new();
    pages.retain(|page| {
        let Some(id) = page.get("id").and_then(Value::as_str) else {
            return true;
        };
        if seen.insert(id.to_string()) {
            true
        } else {
            warnings.push(format!("dropped duplicate page `{id}`"));
            false
        }
    });

    let resolves = |page: &Value| {
        page.get("rootId")
            .and_then(Value::as_str)
            .is_some_and(|root| node_ids.contains(root))
    };
    if pages.iter().any(resolves) {
        pages.retain(|page| {
            if resolves(page) {
                return true;
            }
            let id = page.get("id").and_then(Value::as_str).unwrap_or("?");
            warnings.push(format!("dropped page `{id}` whose root node does not exist"));
            false
        });
    }

    if pages.is_empty() {
        let root = doc.get("rootId").cloned().unwrap_or(Value::Null);
        doc.insert(
            "pages".into(),
            json!([{ "id": "page_1", "name": "Page 1", "rootId": root }]),
        );
        warnings.push("no pages survived; synthesized fallback page `page_1`".into());
    }

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
    let active = doc.get("activePageId").and_then(Value::as_str);
    if !active.is_some_and(|a| page_ids.iter().any(|p| p == a))
        && let Some(first) = page_ids.first()
    {
        warnings.push(format!(
            "activePageId `{}` does not resolve; using `{first}`",
            active.unwrap_or("")
        ));
        doc.insert("activePageId".into(), json!(first));
    }

    for w in &warnings[before..] {
        warn!("{w}");
    }
}
