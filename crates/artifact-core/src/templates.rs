// ── Default Content Templates ──
//
// Skeleton content per artifact type, keyed by the type's content shape.

use serde_json::{json, Value};

use crate::types::ArtType;

/// The structural contract content of a given type is expected to satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentShape {
    /// Rich-text blocks: `blocks` + `entityMap`.
    Document,
    /// Node/edge drawings: `elements` + `settings`.
    Diagram,
    /// Column/row grids: `columns` + `rows`.
    Table,
    /// No required keys.
    Freeform,
}

impl ContentShape {
    pub fn for_type(art_type: &ArtType) -> Self {
        match art_type {
            ArtType::Note | ArtType::Document | ArtType::BasicDesign | ArtType::DetailDesign => {
                ContentShape::Document
            }
            ArtType::UseCase | ArtType::SequenceDiagram | ArtType::ClassDiagram => {
                ContentShape::Diagram
            }
            ArtType::ApiList | ArtType::ScreenList | ArtType::DatabaseSchema => ContentShape::Table,
            ArtType::Other | ArtType::Custom(_) => ContentShape::Freeform,
        }
    }

    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            ContentShape::Document => &["blocks", "entityMap"],
            ContentShape::Diagram => &["elements", "settings"],
            ContentShape::Table => &["columns", "rows"],
            ContentShape::Freeform => &[],
        }
    }

    /// Required keys missing from `content`. The plain-text fallback form
    /// `{ "textContent": ... }` satisfies every shape.
    pub fn missing_keys(self, content: &Value) -> Vec<&'static str> {
        let required = self.required_keys();
        if required.is_empty() {
            return Vec::new();
        }
        match content {
            Value::Object(map) if map.contains_key(crate::codec::TEXT_CONTENT_KEY) => Vec::new(),
            Value::Object(map) => required
                .iter()
                .copied()
                .filter(|key| !map.contains_key(*key))
                .collect(),
            _ => required.to_vec(),
        }
    }
}

// ── Public API ──

/// Type-specific skeleton. Unknown types get an empty object, never an error.
pub fn default_content_for(art_type: &ArtType) -> Value {
    match art_type {
        ArtType::Custom(_) => json!({}),
        ArtType::Other => document_skeleton(""),
        known => match ContentShape::for_type(known) {
            ContentShape::Document => document_skeleton(document_prompt(known)),
            ContentShape::Diagram => diagram_skeleton(known),
            ContentShape::Table => table_skeleton(known),
            ContentShape::Freeform => json!({}),
        },
    }
}

/// A document holding a single unstyled paragraph.
pub fn document_skeleton(text: &str) -> Value {
    json!({
        "blocks": [
            {
                "key": "initial",
                "text": text,
                "type": "unstyled",
                "depth": 0,
                "inlineStyleRanges": [],
                "entityRanges": [],
                "data": {}
            }
        ],
        "entityMap": {}
    })
}

// ── Helpers ──

fn document_prompt(art_type: &ArtType) -> &'static str {
    match art_type {
        ArtType::Note => "Enter your note here.",
        ArtType::Document => "Enter your requirements specification here.",
        ArtType::BasicDesign => "Enter your basic design here.",
        ArtType::DetailDesign => "Enter your detail design here.",
        _ => "",
    }
}

fn diagram_skeleton(art_type: &ArtType) -> Value {
    match art_type {
        ArtType::UseCase => json!({
            "elements": [
                {
                    "id": "actor-1",
                    "type": "actor",
                    "position": { "x": 100, "y": 150 },
                    "label": "User",
                    "width": 60,
                    "height": 80
                },
                {
                    "id": "usecase-1",
                    "type": "usecase",
                    "position": { "x": 250, "y": 150 },
                    "label": "Perform Action",
                    "width": 120,
                    "height": 60
                }
            ],
            "settings": { "diagramType": "usecase", "direction": "LR" }
        }),
        ArtType::SequenceDiagram => json!({
            "elements": [
                {
                    "id": "participant-1",
                    "type": "participant",
                    "position": { "x": 100, "y": 50 },
                    "label": "Client",
                    "width": 120,
                    "height": 40
                }
            ],
            "settings": { "diagramType": "sequence", "direction": "TB" }
        }),
        _ => json!({
            "elements": [
                {
                    "id": "class-1",
                    "type": "class",
                    "position": { "x": 100, "y": 100 },
                    "label": "NewClass",
                    "width": 160,
                    "height": 100
                }
            ],
            "settings": { "diagramType": "class", "direction": "TB" }
        }),
    }
}

fn table_skeleton(art_type: &ArtType) -> Value {
    let (table_type, columns) = match art_type {
        ArtType::ApiList => (
            "api",
            vec![
                ("method", "Method", 100),
                ("path", "Path", 250),
                ("summary", "Summary", 300),
            ],
        ),
        ArtType::ScreenList => (
            "screen",
            vec![
                ("screenId", "Screen ID", 120),
                ("name", "Screen Name", 200),
                ("description", "Description", 300),
            ],
        ),
        _ => (
            "schema",
            vec![
                ("table", "Table", 150),
                ("column", "Column", 150),
                ("dataType", "Data Type", 120),
                ("nullable", "Nullable", 100),
            ],
        ),
    };

    let mut row = serde_json::Map::new();
    row.insert("id".to_string(), json!("1"));
    let columns: Vec<Value> = columns
        .into_iter()
        .map(|(id, name, width)| {
            row.insert(id.to_string(), json!(""));
            json!({ "id": id, "name": name, "width": width })
        })
        .collect();

    json!({
        "columns": columns,
        "rows": [Value::Object(row)],
        "settings": { "tableType": table_type }
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_known_default_satisfies_its_shape() {
        for art_type in ArtType::KNOWN {
            let content = default_content_for(&art_type);
            let shape = ContentShape::for_type(&art_type);
            assert!(
                shape.missing_keys(&content).is_empty(),
                "default for {} misses keys",
                art_type
            );
            assert!(content.is_object());
        }
    }

    #[test]
    fn test_unknown_type_yields_empty_object() {
        let content = default_content_for(&ArtType::from("custom_blob"));
        assert_eq!(content, json!({}));
    }

    #[test]
    fn test_note_skeleton_is_single_paragraph() {
        let content = default_content_for(&ArtType::Note);
        let blocks = content["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["key"], "initial");
        assert_eq!(blocks[0]["type"], "unstyled");
    }

    #[test]
    fn test_diagram_starts_with_a_node() {
        let content = default_content_for(&ArtType::SequenceDiagram);
        assert_eq!(content["elements"].as_array().unwrap().len(), 1);
        assert_eq!(content["settings"]["diagramType"], "sequence");
    }

    #[test]
    fn test_table_row_has_a_cell_per_column() {
        let content = default_content_for(&ArtType::DatabaseSchema);
        let columns = content["columns"].as_array().unwrap();
        let row = content["rows"][0].as_object().unwrap();
        for column in columns {
            assert!(row.contains_key(column["id"].as_str().unwrap()));
        }
        insta::assert_snapshot!(content["settings"].to_string(), @r#"{"tableType":"schema"}"#);
    }

    #[test]
    fn test_missing_keys() {
        let shape = ContentShape::Table;
        assert_eq!(shape.missing_keys(&json!({ "rows": [] })), vec!["columns"]);
        assert_eq!(shape.missing_keys(&json!([1, 2])), vec!["columns", "rows"]);
        assert!(shape.missing_keys(&json!({ "textContent": "x" })).is_empty());
        assert!(ContentShape::Freeform.missing_keys(&json!(42)).is_empty());
    }
}
