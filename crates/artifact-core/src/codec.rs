// ── Content Codec ──
//
// The single conversion boundary between wire content (a string) and the
// structured value renderers work with.
// - Structured values (objects/arrays) pass through unchanged.
// - Strings are parsed as JSON; anything that is not an object or array is
//   wrapped as `{ "textContent": raw }`.
// - Absent, empty or `null` content becomes the type's default template.
// Normalization never fails; problems are reported as `ContentWarning`s.

use serde::Serialize;
use serde_json::{json, Value};

use crate::catalog::VisualizationCatalog;
use crate::templates::ContentShape;
use crate::types::{ArtType, Content};

pub use crate::templates::default_content_for;

pub const TEXT_CONTENT_KEY: &str = "textContent";

/// Non-fatal findings a caller may surface to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentWarning {
    /// The content string was not a structured value; it was kept as plain text.
    MalformedContent { preview: String },
    /// The type has neither a built-in template nor a catalog entry.
    UnknownArtifactType { art_type: String },
    /// The structured content lacks keys its type's shape requires.
    ShapeMismatch {
        art_type: String,
        missing: Vec<&'static str>,
    },
}

/// Normalized content plus whatever was noticed on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub content: Value,
    pub warnings: Vec<ContentWarning>,
}

// ── Public API ──

/// Normalize `raw` into a structured value for `art_type`.
pub fn normalize(raw: Option<&Content>, art_type: &ArtType) -> Value {
    normalize_with_report(raw, art_type).content
}

/// Like `normalize`, also returning the non-fatal warnings. Custom types are
/// reported as unknown.
pub fn normalize_with_report(raw: Option<&Content>, art_type: &ArtType) -> Normalized {
    report(raw, art_type, !art_type.is_custom())
}

/// Like `normalize_with_report`, but custom types with entries in `catalog`
/// count as known.
pub fn normalize_in_catalog(
    raw: Option<&Content>,
    art_type: &ArtType,
    catalog: &VisualizationCatalog,
) -> Normalized {
    let known = !art_type.is_custom() || !catalog.available_for(art_type).is_empty();
    report(raw, art_type, known)
}

/// Wire form of `content`. Raw strings pass through unchanged.
pub fn serialize(content: &Content) -> String {
    match content {
        Content::Raw(text) => text.clone(),
        Content::Structured(Value::String(text)) => text.clone(),
        Content::Structured(value) => value.to_string(),
    }
}

/// Wire form of the content after normalization; what gets persisted on save.
pub fn serialize_effective(raw: Option<&Content>, art_type: &ArtType) -> String {
    serialize(&Content::Structured(normalize(raw, art_type)))
}

/// The plain-text fallback form.
pub fn text_content(text: &str) -> Value {
    json!({ TEXT_CONTENT_KEY: text })
}

// ── Helpers ──

fn report(raw: Option<&Content>, art_type: &ArtType, known: bool) -> Normalized {
    let mut warnings = Vec::new();

    if !known {
        log::warn!("unknown artifact type '{}', using empty defaults", art_type);
        warnings.push(ContentWarning::UnknownArtifactType {
            art_type: art_type.to_string(),
        });
    }

    let content = match raw {
        None => default_content_for(art_type),
        Some(Content::Raw(text)) => normalize_text(text, art_type, &mut warnings),
        Some(Content::Structured(value)) => normalize_value(value, art_type, &mut warnings),
    };

    let missing = ContentShape::for_type(art_type).missing_keys(&content);
    if !missing.is_empty() {
        log::warn!(
            "content does not match the {} shape, missing {:?}",
            art_type,
            missing
        );
        warnings.push(ContentWarning::ShapeMismatch {
            art_type: art_type.to_string(),
            missing,
        });
    }

    Normalized { content, warnings }
}

fn normalize_text(text: &str, art_type: &ArtType, warnings: &mut Vec<ContentWarning>) -> Value {
    if text.trim().is_empty() {
        return default_content_for(art_type);
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Null) => default_content_for(art_type),
        Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
        Ok(_) | Err(_) => {
            log::warn!("content is not structured, keeping it as plain text");
            warnings.push(ContentWarning::MalformedContent {
                preview: preview(text),
            });
            text_content(text)
        }
    }
}

fn normalize_value(value: &Value, art_type: &ArtType, warnings: &mut Vec<ContentWarning>) -> Value {
    match value {
        Value::Null => default_content_for(art_type),
        Value::Object(_) | Value::Array(_) => value.clone(),
        Value::String(text) => normalize_text(text, art_type, warnings),
        scalar => {
            let text = scalar.to_string();
            log::warn!("content is a bare {} value, keeping it as plain text", text);
            warnings.push(ContentWarning::MalformedContent {
                preview: preview(&text),
            });
            text_content(&text)
        }
    }
}

fn preview(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("");
    if first_line.chars().count() > 40 {
        let cut: String = first_line.chars().take(37).collect();
        format!("{}...", cut)
    } else {
        first_line.to_string()
    }
}

// ── Tests ──
