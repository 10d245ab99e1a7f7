//! Load and save: text ⇄ `Document`.
//!
//! Loading runs decode → version gate → migration chain → page
//! normalization → schema validation → integrity checks. Saving stamps the
//! current version and the resolved active page, adds legacy mirrors, and
//! emits canonical (key-sorted) JSON.

pub mod integrity;
pub mod validate;

use crate::error::{ParseError, SerializeError};
use crate::migrate::{self, Warnings, legacy};
use crate::model::{CURRENT_VERSION, Document};
use serde_json::Value;

/// A successfully loaded document plus non-fatal migration notes.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub document: Document,
    pub warnings: Warnings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Active page to stamp; ignored when it doesn't resolve.
    pub active_page_id: Option<String>,
    pub pretty: bool,
}

fn read_version(value: &Value) -> Result<u64, ParseError> {
    let raw = value.get("version").ok_or(ParseError::MissingVersion)?;
    if let Some(v) = raw.as_u64() {
        return Ok(v);
    }
    match raw.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
        _ => Err(ParseError::MissingVersion),
    }
}

/// Parse document text, migrating older versions forward.
pub fn parse_document_text(text: &str) -> Result<ParseOutcome, ParseError> {
    let mut value: Value =
        serde_json::from_str(text).map_err(|e| ParseError::InvalidEncoding(e.to_string()))?;

    let version = read_version(&value)?;
    if version > u64::from(CURRENT_VERSION) {
        return Err(ParseError::UnsupportedVersion {
            found: version,
            supported: CURRENT_VERSION,
        });
    }

    let mut warnings = Warnings::new();
    let Some(doc) = value.as_object_mut() else {
        return Err(ParseError::SchemaValidationFailed(vec!["document: expected an object".into()]));
    };
    // `version` is bounded by CURRENT_VERSION above.
    migrate::upgrade(doc, version as u32, &mut warnings)?;
    migrate::normalize_pages(doc, &mut warnings);
    legacy::strip_mirrors(&mut value);

    let document = validate::validate_schema(value)?;
    let violations = integrity::check_integrity(&document);
    if !violations.is_empty() {
        return Err(ParseError::IntegrityValidationFailed(violations));
    }

    Ok(ParseOutcome { document, warnings })
}

/// Page id to stamp: the requested one, else the stored one, else the first page.
fn resolve_active_page(doc: &Document, requested: Option<&str>) -> Option<String> {
    requested
        .filter(|id| doc.page(id).is_some())
        .or_else(|| doc.active_page().map(|p| p.id.as_str()))
        .or_else(|| doc.pages.first().map(|p| p.id.as_str()))
        .map(str::to_string)
}

pub fn serialize_document(doc: &Document, options: &SerializeOptions) -> Result<String, SerializeError> {
    let mut value = serde_json::to_value(doc)?;
    value["version"] = Value::from(CURRENT_VERSION);
    if let Some(active) = resolve_active_page(doc, options.active_page_id.as_deref()) {
        value["activePageId"] = Value::from(active);
    }
    legacy::write_mirrors(&mut value);

    let text = if options.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_encoding() {
        assert!(matches!(
            parse_document_text("{ not json"),
            Err(ParseError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn rejects_missing_or_textual_version() {
        assert_eq!(parse_document_text("{}"), Err(ParseError::MissingVersion));
        assert_eq!(
            parse_document_text(r#"{"version":"12"}"#),
            Err(ParseError::MissingVersion)
        );
    }

    #[test]
    fn rejects_future_versions() {
        assert_eq!(
            parse_document_text(r#"{"version":13}"#),
            Err(ParseError::UnsupportedVersion {
                found: 13,
                supported: CURRENT_VERSION,
            })
        );
    }

    #[test]
    fn serialize_stamps_requested_page() {
        let doc = Document::new();
        let text = serialize_document(
            &doc,
            &SerializeOptions {
                active_page_id: Some("missing".into()),
                pretty: false,
            },
        )
        .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["activePageId"], "page_1");
        assert_eq!(value["version"], CURRENT_VERSION);
    }

    #[test]
    fn fresh_document_round_trips() {
        let doc = Document::new();
        let text = serialize_document(&doc, &SerializeOptions::default()).unwrap();
        let parsed = parse_document_text(&text).unwrap();
        assert_eq!(parsed.document, doc);
        assert!(parsed.warnings.is_empty());
    }
}
