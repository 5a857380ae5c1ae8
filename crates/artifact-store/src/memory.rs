// ── In-Memory Store ──
//
// Versioned rows per document: exactly one `current` row, older rows
// `archived`. Rows are only ever appended; a document's rows go away together
// on delete.

use std::collections::BTreeMap;

use artifact_core::{
    Artifact, ArtifactDraft, ArtifactError, ArtifactPatch, Content, DependencySet, DocumentId,
    RecordStatus, Result, VersionSnapshot,
};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{ArtifactFilter, DocumentStore, Download};

// ── Types ──

/// Everything the store holds; this is what gets written to the state file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub documents: BTreeMap<DocumentId, StoredDocument>,
    /// Monotonic write counter, orders listings by most recent change.
    #[serde(default)]
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub rows: Vec<VersionSnapshot>,
    #[serde(default)]
    pub dependencies: DependencySet,
    #[serde(default)]
    pub touched: u64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

// ── Helpers ──

impl StoredDocument {
    fn current(&self) -> Option<&VersionSnapshot> {
        self.rows
            .iter()
            .rev()
            .find(|r| r.status == RecordStatus::Current)
    }

    fn to_artifact(&self, document_id: &DocumentId) -> Result<Artifact> {
        let current = self
            .current()
            .ok_or_else(|| ArtifactError::NotFound(document_id.clone()))?;
        Ok(Artifact {
            document_id: document_id.clone(),
            art_type: current.art_type.clone(),
            title: current.title.clone(),
            content: Some(current.content.clone()),
            version: current.version,
            // state files can be edited by hand
            dependencies: DependencySet::for_owner(document_id, self.dependencies.clone()),
            is_new: false,
            created_at: self.rows.first().map(|r| r.created_at),
            updated_at: Some(current.created_at),
        })
    }

    fn matches(&self, filter: &ArtifactFilter) -> bool {
        let Some(current) = self.current() else {
            return false;
        };
        if let Some(art_type) = &filter.art_type {
            if &current.art_type != art_type {
                return false;
            }
        }
        if let Some(keyword) = &filter.keyword {
            let keyword = keyword.to_lowercase();
            let content = artifact_core::codec::serialize(&current.content);
            if !current.title.to_lowercase().contains(&keyword)
                && !content.to_lowercase().contains(&keyword)
            {
                return false;
            }
        }
        true
    }
}

fn wire(content: String) -> Content {
    Content::Raw(content)
}

// ── Public API ──

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: StoreState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// A copy of the current state, for writing to disk.
    pub async fn export(&self) -> StoreState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch_all(&self, filter: &ArtifactFilter) -> Result<Vec<Artifact>> {
        let state = self.state.lock().await;

        let mut matching: Vec<(&DocumentId, &StoredDocument)> = state
            .documents
            .iter()
            .filter(|(_, doc)| doc.matches(filter))
            .collect();
        matching.sort_by(|a, b| b.1.touched.cmp(&a.1.touched));

        let skip = if filter.limit == 0 {
            0
        } else {
            filter.page.saturating_sub(1) * filter.limit
        };
        let take = if filter.limit == 0 {
            usize::MAX
        } else {
            filter.limit
        };

        matching
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|(id, doc)| doc.to_artifact(id))
            .collect()
    }

    async fn fetch_one(&self, document_id: &DocumentId) -> Result<Artifact> {
        let state = self.state.lock().await;
        state
            .documents
            .get(document_id)
            .ok_or_else(|| ArtifactError::NotFound(document_id.clone()))?
            .to_artifact(document_id)
    }

    async fn versions(&self, document_id: &DocumentId) -> Result<Vec<VersionSnapshot>> {
        let state = self.state.lock().await;
        let doc = state
            .documents
            .get(document_id)
            .ok_or_else(|| ArtifactError::NotFound(document_id.clone()))?;
        Ok(doc.rows.iter().rev().cloned().collect())
    }

    async fn create(&self, draft: ArtifactDraft) -> Result<Artifact> {
        if draft.title.trim().is_empty() {
            return Err(ArtifactError::Validation("title must not be empty".to_string()));
        }

        let mut state = self.state.lock().await;
        if state.documents.contains_key(&draft.document_id) {
            return Err(ArtifactError::Remote(format!(
                "document {} already exists",
                draft.document_id
            )));
        }

        state.sequence += 1;
        let row = VersionSnapshot {
            id: Uuid::new_v4(),
            version: 1,
            parent_version: None,
            title: draft.title,
            art_type: draft.art_type,
            content: wire(draft.content),
            status: RecordStatus::Current,
            created_at: Utc::now(),
            updated_at: None,
        };
        let doc = StoredDocument {
            rows: vec![row],
            dependencies: DependencySet::for_owner(&draft.document_id, draft.dependencies),
            touched: state.sequence,
        };
        let artifact = doc.to_artifact(&draft.document_id)?;
        state.documents.insert(draft.document_id, doc);

        log::info!("created {} at version 1", artifact.document_id);
        Ok(artifact)
    }

    async fn update(&self, document_id: &DocumentId, patch: ArtifactPatch) -> Result<Artifact> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ArtifactError::Validation("title must not be empty".to_string()));
        }

        let mut state = self.state.lock().await;
        state.sequence += 1;
        let sequence = state.sequence;
        let doc = state
            .documents
            .get_mut(document_id)
            .ok_or_else(|| ArtifactError::NotFound(document_id.clone()))?;

        let now = Utc::now();
        let current = doc
            .current()
            .cloned()
            .ok_or_else(|| ArtifactError::NotFound(document_id.clone()))?;
        for row in doc.rows.iter_mut().filter(|r| r.status == RecordStatus::Current) {
            row.status = RecordStatus::Archived;
            row.updated_at = Some(now);
        }

        let next = VersionSnapshot {
            id: Uuid::new_v4(),
            version: current.version + 1,
            parent_version: Some(patch.parent_version.unwrap_or(current.version)),
            title: patch.title.unwrap_or(current.title),
            art_type: patch.art_type.unwrap_or(current.art_type),
            content: patch.content.map(wire).unwrap_or(current.content),
            status: RecordStatus::Current,
            created_at: now,
            updated_at: None,
        };
        doc.rows.push(next);
        if let Some(dependencies) = patch.dependencies {
            doc.dependencies = DependencySet::for_owner(document_id, dependencies);
        }
        doc.touched = sequence;

        let artifact = doc.to_artifact(document_id)?;
        log::info!("updated {} to version {}", document_id, artifact.version);
        Ok(artifact)
    }

    async fn delete(&self, document_id: &DocumentId) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .documents
            .remove(document_id)
            .ok_or_else(|| ArtifactError::NotFound(document_id.clone()))?;
        log::info!("deleted {}", document_id);
        Ok(())
    }

    async fn download(&self, document_id: &DocumentId) -> Result<Download> {
        let artifact = self.fetch_one(document_id).await?;
        let bytes = artifact
            .content
            .as_ref()
            .map(artifact_core::codec::serialize)
            .unwrap_or_default()
            .into_bytes();
        Ok(Download {
            filename: artifact.download_filename(),
            bytes,
        })
    }
}

// ── Tests ──
