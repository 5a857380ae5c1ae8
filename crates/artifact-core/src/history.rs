// ── Version History ──
//
// The persisted snapshots of one artifact, oldest first. Append-only: a revert
// never touches the target snapshot, it plans an update that produces a new
// current version with the target's title, art_type and content.

use serde::Serialize;

use crate::codec;
use crate::error::{ArtifactError, Result};
use crate::types::{ArtifactPatch, DocumentId, VersionSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionHistory {
    pub document_id: DocumentId,
    snapshots: Vec<VersionSnapshot>,
}

/// Read-only view of one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionPreview<'a> {
    pub snapshot: &'a VersionSnapshot,
    pub is_current: bool,
}

/// What a revert has to do.
#[derive(Debug, Clone, PartialEq)]
pub enum RevertPlan {
    /// The target already is the current version.
    AlreadyCurrent { version: u32 },
    /// Send this patch through the regular update path.
    Update { from_version: u32, patch: ArtifactPatch },
}

impl VersionHistory {
    pub fn new(document_id: DocumentId, mut snapshots: Vec<VersionSnapshot>) -> Self {
        snapshots.sort_by_key(|s| s.version);
        Self {
            document_id,
            snapshots,
        }
    }

    pub fn snapshots(&self) -> &[VersionSnapshot] {
        &self.snapshots
    }

    /// Newest first, the order listings show.
    pub fn newest_first(&self) -> impl Iterator<Item = &VersionSnapshot> {
        self.snapshots.iter().rev()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn current_version(&self) -> Option<u32> {
        self.snapshots.last().map(|s| s.version)
    }

    pub fn get(&self, version: u32) -> Option<&VersionSnapshot> {
        self.snapshots.iter().find(|s| s.version == version)
    }

    pub fn preview(&self, version: u32) -> Result<VersionPreview<'_>> {
        let snapshot = self.get(version).ok_or_else(|| self.missing(version))?;
        Ok(VersionPreview {
            snapshot,
            is_current: Some(snapshot.version) == self.current_version(),
        })
    }

    /// Fails with `VersionNotFound` when `target` is not in the history.
    pub fn plan_revert(&self, target: u32) -> Result<RevertPlan> {
        let snapshot = self.get(target).ok_or_else(|| self.missing(target))?;
        let current = self.current_version().unwrap_or(target);
        if snapshot.version == current {
            return Ok(RevertPlan::AlreadyCurrent { version: current });
        }

        let patch = ArtifactPatch::default()
            .with_title(snapshot.title.clone())
            .with_art_type(snapshot.art_type.clone())
            .with_content(codec::serialize(&snapshot.content))
            .with_parent_version(snapshot.version);
        Ok(RevertPlan::Update {
            from_version: current,
            patch,
        })
    }

    fn missing(&self, version: u32) -> ArtifactError {
        ArtifactError::VersionNotFound {
            document_id: self.document_id.clone(),
            version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArtType, Content, RecordStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn snapshot(version: u32, title: &str, content: &str, status: RecordStatus) -> VersionSnapshot {
        VersionSnapshot {
            id: Uuid::new_v4(),
            version,
            parent_version: version.checked_sub(1).filter(|v| *v > 0),
            title: title.to_string(),
            art_type: ArtType::Note,
            content: Content::Raw(content.to_string()),
            status,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn history() -> VersionHistory {
        VersionHistory::new(
            DocumentId::new("plan"),
            vec![
                snapshot(3, "Plan v3", r#"{"textContent":"three"}"#, RecordStatus::Current),
                snapshot(1, "Plan", r#"{"textContent":"one"}"#, RecordStatus::Archived),
                snapshot(2, "Plan v2", r#"{"textContent":"two"}"#, RecordStatus::Archived),
            ],
        )
    }

    #[test]
    fn test_sorted_and_current() {
        let h = history();
        let versions: Vec<u32> = h.snapshots().iter().map(|s| s.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
        assert_eq!(h.current_version(), Some(3));
        assert_eq!(h.newest_first().next().unwrap().version, 3);
    }

    #[test]
    fn test_preview_flags_current() {
        let h = history();
        assert!(h.preview(3).unwrap().is_current);
        let old = h.preview(1).unwrap();
        assert!(!old.is_current);
        assert_eq!(old.snapshot.title, "Plan");
    }

    #[test]
    fn test_revert_missing_version() {
        let h = history();
        let err = h.plan_revert(9).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::VersionNotFound { version: 9, .. }
        ));
        assert_eq!(h.current_version(), Some(3));
    }

    #[test]
    fn test_revert_to_current_is_noop() {
        assert_eq!(
            history().plan_revert(3).unwrap(),
            RevertPlan::AlreadyCurrent { version: 3 }
        );
    }

    #[test]
    fn test_revert_copies_target_fields() {
        let plan = history().plan_revert(1).unwrap();
        match plan {
            RevertPlan::Update {
                from_version,
                patch,
            } => {
                assert_eq!(from_version, 3);
                assert_eq!(patch.title.as_deref(), Some("Plan"));
                assert_eq!(patch.art_type, Some(ArtType::Note));
                insta::assert_snapshot!(patch.content.unwrap(), @r#"{"textContent":"one"}"#);
                assert!(patch.dependencies.is_none());
                assert_eq!(patch.parent_version, Some(1));
            }
            other => panic!("unexpected plan: {:?}", other),
        }
    }

    #[test]
    fn test_empty_history() {
        let h = VersionHistory::new(DocumentId::new("x"), Vec::new());
        assert!(h.is_empty());
        assert_eq!(h.current_version(), None);
        assert!(h.preview(1).is_err());
    }
}
