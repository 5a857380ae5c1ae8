// ── Types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::codec;
use crate::dependency::DependencySet;

/// Stable identifier of an artifact, unique within a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

/// Category of an artifact. Unknown names are kept verbatim in `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArtType {
    Note,
    Document,
    BasicDesign,
    DetailDesign,
    ApiList,
    ScreenList,
    DatabaseSchema,
    SequenceDiagram,
    ClassDiagram,
    UseCase,
    Other,
    Custom(String),
}

/// Content as it travels: either the raw wire string or an already-parsed value.
///
/// Only `codec` branches on the representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Raw(String),
    Structured(Value),
}

/// Lifecycle of a persisted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Current,
    Archived,
}

/// The central entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub document_id: DocumentId,
    pub art_type: ArtType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub dependencies: DependencySet,
    /// Drafted locally, no persisted identity yet. Never sent to the store.
    #[serde(skip)]
    pub is_new: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for the store's `create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDraft {
    pub document_id: DocumentId,
    pub title: String,
    pub art_type: ArtType,
    pub content: String,
    #[serde(default)]
    pub dependencies: DependencySet,
}

/// Partial fields for the store's `update`. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art_type: Option<ArtType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<DependencySet>,
    /// Version the new row derives from. The store's current version when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_version: Option<u32>,
}

/// An immutable historical state of an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub id: Uuid,
    pub version: u32,
    /// The version this one was derived from: the previous version after an
    /// edit, the target after a revert, none for the first version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_version: Option<u32>,
    pub title: String,
    pub art_type: ArtType,
    pub content: Content,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// What a dependency list shows for a resolved reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSummary {
    pub document_id: DocumentId,
    pub title: String,
    pub art_type: ArtType,
}

// ── Helpers ──

const MAX_ID_LEN: usize = 100;

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive an identifier from a title: lowercase, whitespace runs become `-`,
    /// anything outside `[a-z0-9-]` is dropped.
    pub fn from_title(title: &str) -> Self {
        let mut slug = String::with_capacity(title.len());
        let mut in_space = false;
        for c in title.trim().chars().flat_map(char::to_lowercase) {
            if c.is_whitespace() {
                if !in_space {
                    slug.push('-');
                }
                in_space = true;
                continue;
            }
            in_space = false;
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                slug.push(c);
            }
        }
        slug.truncate(MAX_ID_LEN);

        if slug.is_empty() {
            Self("untitled-document".to_string())
        } else {
            Self(slug)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ArtType {
    pub const KNOWN: [ArtType; 11] = [
        ArtType::Note,
        ArtType::Document,
        ArtType::BasicDesign,
        ArtType::DetailDesign,
        ArtType::ApiList,
        ArtType::ScreenList,
        ArtType::DatabaseSchema,
        ArtType::SequenceDiagram,
        ArtType::ClassDiagram,
        ArtType::UseCase,
        ArtType::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ArtType::Note => "note",
            ArtType::Document => "document",
            ArtType::BasicDesign => "basic_design",
            ArtType::DetailDesign => "detail_design",
            ArtType::ApiList => "api_list",
            ArtType::ScreenList => "screen_list",
            ArtType::DatabaseSchema => "database_schema",
            ArtType::SequenceDiagram => "sequence_diagram",
            ArtType::ClassDiagram => "class_diagram",
            ArtType::UseCase => "use_case",
            ArtType::Other => "other",
            ArtType::Custom(name) => name,
        }
    }

    /// Human-readable label; custom types show their raw name.
    pub fn label(&self) -> &str {
        match self {
            ArtType::Note => "Note",
            ArtType::Document => "Document (SRS)",
            ArtType::BasicDesign => "Basic Design",
            ArtType::DetailDesign => "Detail Design",
            ArtType::ApiList => "API List",
            ArtType::ScreenList => "Screen List",
            ArtType::DatabaseSchema => "Database Schema",
            ArtType::SequenceDiagram => "Sequence Diagram",
            ArtType::ClassDiagram => "Class Diagram",
            ArtType::UseCase => "Use Case",
            ArtType::Other => "Other",
            ArtType::Custom(name) => name,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ArtType::Custom(_))
    }

    /// Extension used when the artifact is downloaded as a file.
    pub fn file_extension(&self) -> &'static str {
        match self {
            ArtType::Note
            | ArtType::Document
            | ArtType::BasicDesign
            | ArtType::DetailDesign
            | ArtType::UseCase => ".md",
            ArtType::ApiList | ArtType::ScreenList | ArtType::DatabaseSchema => ".json",
            ArtType::SequenceDiagram | ArtType::ClassDiagram => ".excalidraw",
            ArtType::Other | ArtType::Custom(_) => ".txt",
        }
    }
}

impl From<&str> for ArtType {
    fn from(value: &str) -> Self {
        match value {
            "note" => ArtType::Note,
            "document" => ArtType::Document,
            "basic_design" => ArtType::BasicDesign,
            "detail_design" => ArtType::DetailDesign,
            "api_list" => ArtType::ApiList,
            "screen_list" => ArtType::ScreenList,
            "database_schema" => ArtType::DatabaseSchema,
            "sequence_diagram" => ArtType::SequenceDiagram,
            "class_diagram" => ArtType::ClassDiagram,
            "use_case" => ArtType::UseCase,
            "other" => ArtType::Other,
            custom => ArtType::Custom(custom.to_string()),
        }
    }
}

impl From<String> for ArtType {
    fn from(value: String) -> Self {
        ArtType::from(value.as_str())
    }
}

impl From<ArtType> for String {
    fn from(value: ArtType) -> Self {
        match value {
            ArtType::Custom(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::str::FromStr for ArtType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(ArtType::from(s))
    }
}

/// `{title}{extension}`, the name a downloaded artifact is saved under.
pub fn download_filename(title: &str, art_type: &ArtType) -> String {
    format!("{}{}", title, art_type.file_extension())
}

impl Artifact {
    /// A local draft: no persisted identity, default content for its type.
    pub fn draft(document_id: DocumentId, title: impl Into<String>, art_type: ArtType) -> Self {
        let content = codec::default_content_for(&art_type);
        Self {
            document_id,
            art_type,
            title: title.into(),
            content: Some(Content::Structured(content)),
            version: 0,
            dependencies: DependencySet::default(),
            is_new: true,
            created_at: None,
            updated_at: None,
        }
    }

    /// Replace the dependency set; the artifact's own id is never kept.
    pub fn set_dependencies<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = DocumentId>,
    {
        self.dependencies.replace(&self.document_id, ids);
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            document_id: self.document_id.clone(),
            title: self.title.clone(),
            art_type: self.art_type.clone(),
        }
    }

    /// Build the `create` payload, normalizing and serializing the content.
    pub fn to_draft(&self) -> ArtifactDraft {
        ArtifactDraft {
            document_id: self.document_id.clone(),
            title: self.title.clone(),
            art_type: self.art_type.clone(),
            content: codec::serialize_effective(self.content.as_ref(), &self.art_type),
            dependencies: self.dependencies.clone(),
        }
    }

    pub fn download_filename(&self) -> String {
        download_filename(&self.title, &self.art_type)
    }
}

impl ArtifactPatch {
    /// No field changes. `parent_version` alone does not count.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.art_type.is_none()
            && self.dependencies.is_none()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_art_type(mut self, art_type: ArtType) -> Self {
        self.art_type = Some(art_type);
        self
    }

    pub fn with_dependencies(mut self, dependencies: DependencySet) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    pub fn with_parent_version(mut self, version: u32) -> Self {
        self.parent_version = Some(version);
        self
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ArtType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordStatus::Current => write!(f, "current"),
            RecordStatus::Archived => write!(f, "archived"),
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_from_title() {
        assert_eq!(DocumentId::from_title("Project Plan").as_str(), "project-plan");
        assert_eq!(
            DocumentId::from_title("  API   list (v2)! ").as_str(),
            "api-list-v2"
        );
        assert_eq!(DocumentId::from_title("").as_str(), "untitled-document");
        assert_eq!(DocumentId::from_title("!!!").as_str(), "untitled-document");
        assert_eq!(DocumentId::from_title(&"a".repeat(300)).as_str().len(), 100);
    }

    #[test]
    fn test_art_type_round_trips_through_strings() {
        for known in ArtType::KNOWN {
            assert_eq!(ArtType::from(known.as_str()), known);
        }
        let custom = ArtType::from("custom_blob");
        assert_eq!(custom, ArtType::Custom("custom_blob".to_string()));
        assert_eq!(String::from(custom), "custom_blob");
    }

    #[test]
    fn test_art_type_serde_uses_plain_names() {
        let json = serde_json::to_string(&ArtType::DatabaseSchema).unwrap();
        assert_eq!(json, "\"database_schema\"");
        let parsed: ArtType = serde_json::from_str("\"custom_blob\"").unwrap();
        assert!(parsed.is_custom());
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(ArtType::Note.file_extension(), ".md");
        assert_eq!(ArtType::UseCase.file_extension(), ".md");
        assert_eq!(ArtType::ScreenList.file_extension(), ".json");
        assert_eq!(ArtType::ClassDiagram.file_extension(), ".excalidraw");
        assert_eq!(ArtType::Other.file_extension(), ".txt");
        assert_eq!(ArtType::from("custom_blob").file_extension(), ".txt");
        assert_eq!(download_filename("Plan", &ArtType::ApiList), "Plan.json");
    }

    #[test]
    fn test_draft_has_default_content_and_no_version() {
        let draft = Artifact::draft(DocumentId::new("plan"), "Plan", ArtType::Note);
        assert!(draft.is_new);
        assert_eq!(draft.version, 0);
        assert_eq!(
            draft.content,
            Some(Content::Structured(codec::default_content_for(&ArtType::Note)))
        );
    }

    #[test]
    fn test_set_dependencies_drops_self_reference() {
        let mut artifact = Artifact::draft(DocumentId::new("a"), "A", ArtType::Note);
        artifact.set_dependencies(vec![
            DocumentId::new("b"),
            DocumentId::new("a"),
            DocumentId::new("b"),
        ]);
        assert_eq!(artifact.dependencies.ids(), &[DocumentId::new("b")]);
    }

    #[test]
    fn test_is_new_is_never_serialized() {
        let draft = Artifact::draft(DocumentId::new("a"), "A", ArtType::Note);
        let yaml = serde_yaml_ng::to_string(&draft).unwrap();
        assert!(!yaml.contains("is_new"));
        let back: Artifact = serde_yaml_ng::from_str(&yaml).unwrap();
        assert!(!back.is_new);
    }

    #[test]
    fn test_empty_patch() {
        assert!(ArtifactPatch::default().is_empty());
        assert!(!ArtifactPatch::default().with_title("x").is_empty());
    }
}
