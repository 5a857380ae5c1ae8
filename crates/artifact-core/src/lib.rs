pub mod catalog;
pub mod codec;
pub mod config;
pub mod dependency;
pub mod error;
pub mod history;
pub mod renderer;
pub mod templates;
pub mod types;

pub use catalog::{VisualizationCatalog, VisualizationDescriptor, VisualizationKind};
pub use codec::{ContentWarning, Normalized};
pub use config::{load_config, WorkspaceConfig};
pub use dependency::DependencySet;
pub use error::{ArtifactError, Result};
pub use history::{RevertPlan, VersionHistory, VersionPreview};
pub use renderer::{RendererHandle, RendererRegistry, Resolution, ResolvedBy};
pub use templates::ContentShape;
pub use types::{
    ArtType, Artifact, ArtifactDraft, ArtifactPatch, ArtifactSummary, Content, DocumentId,
    RecordStatus, VersionSnapshot,
};
