// ── Renderer Resolver ──
//
// Two-stage lookup: the active visualization's type first, then the artifact's
// art_type, then the universal fallback. Subtypes never affect the choice.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::catalog::{VisualizationDescriptor, VisualizationKind};
use crate::types::{ArtType, Artifact};

// ── Types ──

/// Token naming the renderer a presentation layer should mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererHandle {
    Document,
    Diagram,
    Table,
    Gantt,
    /// Displays any structured or plain-text content.
    Generic,
}

/// Which lookup stage produced the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedBy {
    Visualization,
    ArtType,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub renderer: RendererHandle,
    pub resolved_by: ResolvedBy,
}

/// Extra table entries from configuration, keyed by plain names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererOverrides {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub visualizations: BTreeMap<String, RendererHandle>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub art_types: BTreeMap<String, RendererHandle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RendererRegistry {
    by_visualization: HashMap<VisualizationKind, RendererHandle>,
    by_art_type: HashMap<ArtType, RendererHandle>,
}

// ── Public API ──

impl RendererRegistry {
    pub fn builtin() -> Self {
        use RendererHandle as R;
        use VisualizationKind as K;

        let by_visualization = [
            (K::Document, R::Document),
            (K::RichText, R::Document),
            (K::Markdown, R::Document),
            (K::Diagram, R::Diagram),
            (K::Erd, R::Diagram),
            (K::Flow, R::Diagram),
            (K::Uml, R::Diagram),
            (K::Network, R::Diagram),
            (K::Table, R::Table),
            (K::Matrix, R::Table),
            (K::Grid, R::Table),
            (K::Gantt, R::Gantt),
            (K::Timeline, R::Gantt),
        ]
        .into_iter()
        .collect();

        let by_art_type = [
            (ArtType::Note, R::Document),
            (ArtType::Document, R::Document),
            (ArtType::BasicDesign, R::Document),
            (ArtType::DetailDesign, R::Document),
            (ArtType::UseCase, R::Diagram),
            (ArtType::SequenceDiagram, R::Diagram),
            (ArtType::ClassDiagram, R::Diagram),
            (ArtType::ApiList, R::Table),
            (ArtType::ScreenList, R::Table),
            (ArtType::DatabaseSchema, R::Table),
        ]
        .into_iter()
        .collect();

        Self {
            by_visualization,
            by_art_type,
        }
    }

    /// Merge configured entries over the built-in tables.
    pub fn with_overrides(mut self, overrides: &RendererOverrides) -> Self {
        for (kind, handle) in &overrides.visualizations {
            self.by_visualization
                .insert(VisualizationKind::from(kind.as_str()), *handle);
        }
        for (art_type, handle) in &overrides.art_types {
            self.by_art_type
                .insert(ArtType::from(art_type.as_str()), *handle);
        }
        self
    }

    /// Never fails: an unmatched pair lands on `RendererHandle::Generic`.
    pub fn resolve(
        &self,
        artifact: &Artifact,
        visualization: Option<&VisualizationDescriptor>,
    ) -> Resolution {
        let resolution = self.resolve_parts(&artifact.art_type, visualization.map(|v| &v.kind));
        log::debug!(
            "resolved {} ({}) to {:?} via {:?}",
            artifact.document_id,
            artifact.art_type,
            resolution.renderer,
            resolution.resolved_by
        );
        resolution
    }

    pub fn resolve_parts(
        &self,
        art_type: &ArtType,
        visualization: Option<&VisualizationKind>,
    ) -> Resolution {
        if let Some(renderer) = visualization.and_then(|kind| self.by_visualization.get(kind)) {
            return Resolution {
                renderer: *renderer,
                resolved_by: ResolvedBy::Visualization,
            };
        }
        if let Some(renderer) = self.by_art_type.get(art_type) {
            return Resolution {
                renderer: *renderer,
                resolved_by: ResolvedBy::ArtType,
            };
        }
        Resolution {
            renderer: RendererHandle::Generic,
            resolved_by: ResolvedBy::Fallback,
        }
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Display for RendererHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RendererHandle::Document => write!(f, "document"),
            RendererHandle::Diagram => write!(f, "diagram"),
            RendererHandle::Table => write!(f, "table"),
            RendererHandle::Gantt => write!(f, "gantt"),
            RendererHandle::Generic => write!(f, "generic"),
        }
    }
}

// ── Tests ──
