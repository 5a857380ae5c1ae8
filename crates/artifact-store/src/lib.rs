// ── Document Store Boundary ──
//
// The persistence collaborator: request/response exchanges keyed by
// document_id. `MemoryStore` is the in-process implementation; its state can
// be written to and read from a YAML file (see `file`).

pub mod file;
pub mod memory;

use artifact_core::{
    ArtType, Artifact, ArtifactDraft, ArtifactPatch, DocumentId, Result, VersionSnapshot,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use memory::{MemoryStore, StoreState};

// ── Types ──

/// Listing filter. A `limit` of 0 returns everything; `page` starts at 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art_type: Option<ArtType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub page: usize,
}

/// A downloadable payload named `{title}{extension}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Current rows, most recently updated first.
    async fn fetch_all(&self, filter: &ArtifactFilter) -> Result<Vec<Artifact>>;

    async fn fetch_one(&self, document_id: &DocumentId) -> Result<Artifact>;

    /// Every persisted snapshot, newest first.
    async fn versions(&self, document_id: &DocumentId) -> Result<Vec<VersionSnapshot>>;

    /// Assigns persisted identity with version 1.
    async fn create(&self, draft: ArtifactDraft) -> Result<Artifact>;

    /// Archives the current row and appends a new one with the next version.
    async fn update(&self, document_id: &DocumentId, patch: ArtifactPatch) -> Result<Artifact>;

    async fn delete(&self, document_id: &DocumentId) -> Result<()>;

    async fn download(&self, document_id: &DocumentId) -> Result<Download>;
}

// ── Helpers ──

impl ArtifactFilter {
    pub fn by_type(art_type: ArtType) -> Self {
        Self {
            art_type: Some(art_type),
            ..Self::default()
        }
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn paged(mut self, limit: usize, page: usize) -> Self {
        self.limit = limit;
        self.page = page;
        self
    }
}
