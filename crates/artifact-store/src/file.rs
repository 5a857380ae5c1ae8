// ── File I/O ──
//
// Read and write the store state as YAML.

use std::fs;
use std::path::Path;

use artifact_core::Result;

use crate::memory::{MemoryStore, StoreState};

// ── Public API ──

/// Read a state file. A missing or empty file is an empty store.
pub fn read_state(path: &Path) -> Result<StoreState> {
    if !path.exists() {
        return Ok(StoreState::default());
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(StoreState::default());
    }
    Ok(serde_yaml_ng::from_str(&content)?)
}

/// Serialize the state and write it to disk.
/// Creates parent directories if they don't exist.
pub fn write_state(path: &Path, state: &StoreState) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_yaml_ng::to_string(state)?;
    fs::write(path, content)?;
    Ok(())
}

impl MemoryStore {
    pub fn open(path: &Path) -> Result<Self> {
        let state = read_state(path)?;
        log::debug!(
            "loaded {} documents from {}",
            state.documents.len(),
            path.display()
        );
        Ok(Self::from_state(state))
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let state = self.export().await;
        write_state(path, &state)
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocumentStore;
    use artifact_core::{
        ArtType, ArtifactDraft, ArtifactPatch, Content, DependencySet, DocumentId, RecordStatus,
    };
    use tempfile::TempDir;

    fn draft() -> ArtifactDraft {
        ArtifactDraft {
            document_id: DocumentId::new("schema"),
            title: "Schema".to_string(),
            art_type: ArtType::DatabaseSchema,
            content: r#"{"columns":[],"rows":[]}"#.to_string(),
            dependencies: DependencySet::for_owner(
                &DocumentId::new("schema"),
                vec![DocumentId::new("api")],
            ),
        }
    }

    #[test]
    fn test_missing_file_is_empty_state() {
        let tmp = TempDir::new().unwrap();
        let state = read_state(&tmp.path().join("nope.yaml")).unwrap();
        assert!(state.documents.is_empty());
    }

    #[tokio::test]
    async fn test_save_and_open_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".artifacts/state.yaml");

        let store = MemoryStore::new();
        store.create(draft()).await.unwrap();
        store
            .update(&DocumentId::new("schema"), ArtifactPatch::default().with_title("Schema v2"))
            .await
            .unwrap();
        store.save(&path).await.unwrap();
        assert!(path.exists());

        let reopened = MemoryStore::open(&path).unwrap();
        let artifact = reopened.fetch_one(&DocumentId::new("schema")).await.unwrap();
        assert_eq!(artifact.version, 2);
        assert_eq!(artifact.title, "Schema v2");
        assert_eq!(artifact.dependencies.ids(), &[DocumentId::new("api")]);
        assert_eq!(
            artifact.content,
            Some(Content::Raw(r#"{"columns":[],"rows":[]}"#.to_string()))
        );

        let rows = reopened.versions(&DocumentId::new("schema")).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].status, RecordStatus::Archived);
        assert_eq!(reopened.export().await, store.export().await);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.yaml");
        fs::write(&path, "documents: [not, a, map").unwrap();
        assert!(read_state(&path).is_err());
    }
}
