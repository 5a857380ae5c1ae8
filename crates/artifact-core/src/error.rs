// ── Error Types ──

use thiserror::Error;

use crate::types::DocumentId;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {0}")]
    NotFound(DocumentId),

    #[error("version {version} not found for {document_id}")]
    VersionNotFound { document_id: DocumentId, version: u32 },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("remote failure: {0}")]
    Remote(String),

    #[error("a request is already in flight for {0}")]
    Busy(DocumentId),

    #[error("invalid visualization catalog: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ArtifactError {
    /// Whether the failure came from the persistence boundary and may be retried by hand.
    pub fn is_remote(&self) -> bool {
        matches!(self, ArtifactError::Remote(_))
    }
}

pub type Result<T> = std::result::Result<T, ArtifactError>;
