// ── Visualization Catalog ──
//
// Static registry: art_type → ordered list of visualization descriptors.
// Built once from the built-in table plus workspace configuration; never
// derived from artifact instances.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, Result};
use crate::types::ArtType;

// ── Types ──

/// Presentation mode name. Unknown names are kept verbatim in `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VisualizationKind {
    Document,
    RichText,
    Markdown,
    Table,
    Matrix,
    Grid,
    Chart,
    BarChart,
    PieChart,
    LineChart,
    Timeline,
    Gantt,
    Diagram,
    Erd,
    Flow,
    Uml,
    Network,
    List,
    Card,
    Kanban,
    Swagger,
    ApiExplorer,
    Dashboard,
    Tree,
    Map,
    Code,
    Custom(String),
}

/// `{ type, subtype?, label, isDefault? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizationDescriptor {
    #[serde(rename = "type")]
    pub kind: VisualizationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub label: String,
    #[serde(rename = "isDefault", default, skip_serializing_if = "is_false")]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationCatalog {
    entries: BTreeMap<ArtType, Vec<VisualizationDescriptor>>,
}

// ── Helpers ──

fn is_false(value: &bool) -> bool {
    !*value
}

impl VisualizationKind {
    pub fn as_str(&self) -> &str {
        match self {
            VisualizationKind::Document => "document",
            VisualizationKind::RichText => "richText",
            VisualizationKind::Markdown => "markdown",
            VisualizationKind::Table => "table",
            VisualizationKind::Matrix => "matrix",
            VisualizationKind::Grid => "grid",
            VisualizationKind::Chart => "chart",
            VisualizationKind::BarChart => "barChart",
            VisualizationKind::PieChart => "pieChart",
            VisualizationKind::LineChart => "lineChart",
            VisualizationKind::Timeline => "timeline",
            VisualizationKind::Gantt => "gantt",
            VisualizationKind::Diagram => "diagram",
            VisualizationKind::Erd => "erd",
            VisualizationKind::Flow => "flow",
            VisualizationKind::Uml => "uml",
            VisualizationKind::Network => "network",
            VisualizationKind::List => "list",
            VisualizationKind::Card => "card",
            VisualizationKind::Kanban => "kanban",
            VisualizationKind::Swagger => "swagger",
            VisualizationKind::ApiExplorer => "apiExplorer",
            VisualizationKind::Dashboard => "dashboard",
            VisualizationKind::Tree => "tree",
            VisualizationKind::Map => "map",
            VisualizationKind::Code => "code",
            VisualizationKind::Custom(name) => name,
        }
    }
}

impl From<&str> for VisualizationKind {
    fn from(value: &str) -> Self {
        match value {
            "document" => VisualizationKind::Document,
            "richText" => VisualizationKind::RichText,
            "markdown" => VisualizationKind::Markdown,
            "table" => VisualizationKind::Table,
            "matrix" => VisualizationKind::Matrix,
            "grid" => VisualizationKind::Grid,
            "chart" => VisualizationKind::Chart,
            "barChart" => VisualizationKind::BarChart,
            "pieChart" => VisualizationKind::PieChart,
            "lineChart" => VisualizationKind::LineChart,
            "timeline" => VisualizationKind::Timeline,
            "gantt" => VisualizationKind::Gantt,
            "diagram" => VisualizationKind::Diagram,
            "erd" => VisualizationKind::Erd,
            "flow" => VisualizationKind::Flow,
            "uml" => VisualizationKind::Uml,
            "network" => VisualizationKind::Network,
            "list" => VisualizationKind::List,
            "card" => VisualizationKind::Card,
            "kanban" => VisualizationKind::Kanban,
            "swagger" => VisualizationKind::Swagger,
            "apiExplorer" => VisualizationKind::ApiExplorer,
            "dashboard" => VisualizationKind::Dashboard,
            "tree" => VisualizationKind::Tree,
            "map" => VisualizationKind::Map,
            "code" => VisualizationKind::Code,
            custom => VisualizationKind::Custom(custom.to_string()),
        }
    }
}

impl From<String> for VisualizationKind {
    fn from(value: String) -> Self {
        VisualizationKind::from(value.as_str())
    }
}

impl From<VisualizationKind> for String {
    fn from(value: VisualizationKind) -> Self {
        match value {
            VisualizationKind::Custom(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::str::FromStr for VisualizationKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(VisualizationKind::from(s))
    }
}

impl std::fmt::Display for VisualizationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl VisualizationDescriptor {
    pub fn new(kind: VisualizationKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            subtype: None,
            label: label.into(),
            is_default: false,
        }
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Same `type`, and the subtype matches exactly when one is given.
    pub fn matches(&self, kind: &VisualizationKind, subtype: Option<&str>) -> bool {
        &self.kind == kind
            && match subtype {
                None => true,
                Some(wanted) => self.subtype.as_deref() == Some(wanted),
            }
    }
}

impl std::fmt::Display for VisualizationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.subtype {
            Some(subtype) => write!(f, "{} ({}/{})", self.label, self.kind, subtype),
            None => write!(f, "{} ({})", self.label, self.kind),
        }
    }
}

fn builtin_entries() -> BTreeMap<ArtType, Vec<VisualizationDescriptor>> {
    use VisualizationDescriptor as D;
    use VisualizationKind as K;

    let mut entries = BTreeMap::new();
    entries.insert(
        ArtType::Note,
        vec![
            D::new(K::Document, "Rich Text").as_default(),
            D::new(K::Markdown, "Markdown"),
        ],
    );
    entries.insert(
        ArtType::Document,
        vec![
            D::new(K::Document, "Document").as_default(),
            D::new(K::Table, "Requirements Table"),
        ],
    );
    entries.insert(
        ArtType::BasicDesign,
        vec![
            D::new(K::Document, "Document").as_default(),
            D::new(K::Diagram, "Architecture Diagram").with_subtype("architecture"),
        ],
    );
    entries.insert(
        ArtType::DetailDesign,
        vec![
            D::new(K::Document, "Document").as_default(),
            D::new(K::Diagram, "Class Diagram").with_subtype("class"),
            D::new(K::Diagram, "Sequence Diagram").with_subtype("sequence"),
        ],
    );
    entries.insert(
        ArtType::ApiList,
        vec![
            D::new(K::Table, "Endpoints Table").as_default(),
            D::new(K::Swagger, "Swagger"),
            D::new(K::Diagram, "API Flow Diagram").with_subtype("flow"),
        ],
    );
    entries.insert(
        ArtType::ScreenList,
        vec![
            D::new(K::Table, "Screens Table").as_default(),
            D::new(K::Diagram, "Screen Flow").with_subtype("flow"),
        ],
    );
    entries.insert(
        ArtType::DatabaseSchema,
        vec![
            D::new(K::Diagram, "ER Diagram").with_subtype("er").as_default(),
            D::new(K::Table, "Tables & Columns"),
            D::new(K::Code, "SQL Schema"),
        ],
    );
    entries.insert(
        ArtType::SequenceDiagram,
        vec![D::new(K::Diagram, "Sequence Diagram").with_subtype("sequence").as_default()],
    );
    entries.insert(
        ArtType::ClassDiagram,
        vec![D::new(K::Diagram, "Class Diagram").with_subtype("class").as_default()],
    );
    entries.insert(
        ArtType::UseCase,
        vec![
            D::new(K::Diagram, "Use Case Diagram").with_subtype("useCase").as_default(),
            D::new(K::Table, "Use Case Table"),
        ],
    );
    entries.insert(
        ArtType::Other,
        vec![D::new(K::Document, "Document").as_default()],
    );
    entries
}

fn check_entry(art_type: &ArtType, descriptors: &[VisualizationDescriptor]) -> Result<()> {
    let defaults = descriptors.iter().filter(|d| d.is_default).count();
    if defaults > 1 {
        return Err(ArtifactError::Catalog(format!(
            "{} has {} descriptors marked isDefault, at most one is allowed",
            art_type, defaults
        )));
    }
    Ok(())
}

// ── Public API ──

impl VisualizationCatalog {
    pub fn builtin() -> Self {
        Self {
            entries: builtin_entries(),
        }
    }

    /// Built-ins with whole entries replaced by `overrides` (keyed by art_type name).
    pub fn with_overrides(
        mut self,
        overrides: &BTreeMap<String, Vec<VisualizationDescriptor>>,
    ) -> Result<Self> {
        for (name, descriptors) in overrides {
            let art_type = ArtType::from(name.as_str());
            check_entry(&art_type, descriptors)?;
            log::debug!(
                "catalog override for {}: {} descriptors",
                art_type,
                descriptors.len()
            );
            self.entries.insert(art_type, descriptors.clone());
        }
        Ok(self)
    }

    /// Descriptors in declaration order; empty for unregistered types.
    pub fn available_for(&self, art_type: &ArtType) -> &[VisualizationDescriptor] {
        self.entries
            .get(art_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// First `isDefault` descriptor, else the first declared, else none.
    pub fn default_for(&self, art_type: &ArtType) -> Option<&VisualizationDescriptor> {
        let available = self.available_for(art_type);
        available
            .iter()
            .find(|d| d.is_default)
            .or_else(|| available.first())
    }

    pub fn is_valid(
        &self,
        art_type: &ArtType,
        kind: &VisualizationKind,
        subtype: Option<&str>,
    ) -> bool {
        self.find(art_type, kind, subtype).is_some()
    }

    /// The first descriptor accepted by `is_valid` for the same arguments.
    pub fn find(
        &self,
        art_type: &ArtType,
        kind: &VisualizationKind,
        subtype: Option<&str>,
    ) -> Option<&VisualizationDescriptor> {
        self.available_for(art_type)
            .iter()
            .find(|d| d.matches(kind, subtype))
    }

    pub fn art_types(&self) -> impl Iterator<Item = &ArtType> {
        self.entries.keys()
    }
}

impl Default for VisualizationCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

// ── Tests ──
