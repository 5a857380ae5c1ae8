// ── Workspace Session ──
//
// Caller-owned state for one workspace:
//   opened:    arena of artifacts being viewed or edited, keyed by document_id
//   loaded:    the last listing fetched from the store, used to resolve dependencies
//   in_flight: artifacts with a store request outstanding
//
// Edits on persisted artifacts are two-phase: the tentative local state is
// applied, the store is called, then the edit is committed or rolled back.
// The state lock is never held across a store call.

use std::collections::HashSet;
use std::sync::Arc;

use artifact_core::codec;
use artifact_core::{
    ArtType, Artifact, ArtifactError, ArtifactPatch, ArtifactSummary, Content, ContentShape,
    ContentWarning, DocumentId, RendererRegistry, Resolution, Result, RevertPlan,
    VersionHistory, VersionSnapshot, VisualizationCatalog, VisualizationDescriptor,
    VisualizationKind, WorkspaceConfig,
};
use artifact_store::{ArtifactFilter, DocumentStore, Download};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

// ── Types ──

#[derive(Debug, Clone, PartialEq)]
pub struct OpenedArtifact {
    pub artifact: Artifact,
    pub visualization: Option<VisualizationDescriptor>,
    generation: u64,
}

/// Everything a presentation layer needs to display an opened artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactView {
    pub document_id: DocumentId,
    pub title: String,
    pub art_type: ArtType,
    pub version: u32,
    pub is_new: bool,
    pub content: Value,
    pub warnings: Vec<ContentWarning>,
    pub visualizations: Vec<VisualizationDescriptor>,
    pub active_visualization: Option<VisualizationDescriptor>,
    pub resolution: Resolution,
}

/// A past snapshot with its content normalized for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotView {
    pub snapshot: VersionSnapshot,
    pub is_current: bool,
    pub content: Value,
}

pub struct Workspace<S> {
    store: Arc<S>,
    catalog: VisualizationCatalog,
    registry: RendererRegistry,
    state: Mutex<SessionState>,
}

#[derive(Debug, Default)]
struct SessionState {
    opened: IndexMap<DocumentId, OpenedArtifact>,
    loaded: Vec<Artifact>,
    in_flight: HashSet<DocumentId>,
    next_generation: u64,
}

/// Pre-attempt state of an opened artifact, held while its request is outstanding.
struct Tentative {
    document_id: DocumentId,
    generation: u64,
    previous: OpenedArtifact,
}

/// What a staged edit asks of the store.
enum Remote {
    /// Drafts change locally only.
    Local,
    Update(ArtifactPatch),
}

// ── Helpers ──

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(ArtifactError::Validation("title must not be empty".to_string()));
    }
    Ok(())
}

impl SessionState {
    fn open(&mut self, artifact: Artifact, visualization: Option<VisualizationDescriptor>) {
        self.next_generation += 1;
        let entry = OpenedArtifact {
            artifact,
            visualization,
            generation: self.next_generation,
        };
        self.opened.insert(entry.artifact.document_id.clone(), entry);
    }

    fn opened(&self, document_id: &DocumentId) -> Result<&OpenedArtifact> {
        self.opened
            .get(document_id)
            .ok_or_else(|| ArtifactError::NotFound(document_id.clone()))
    }

    fn is_taken(&self, document_id: &DocumentId) -> bool {
        self.opened.contains_key(document_id)
            || self.loaded.iter().any(|a| &a.document_id == document_id)
    }

    fn upsert_loaded(&mut self, artifact: &Artifact) {
        match self
            .loaded
            .iter_mut()
            .find(|a| a.document_id == artifact.document_id)
        {
            Some(existing) => *existing = artifact.clone(),
            None => self.loaded.push(artifact.clone()),
        }
    }

    fn check_idle(&self, document_id: &DocumentId) -> Result<()> {
        if self.in_flight.contains(document_id) {
            return Err(ArtifactError::Busy(document_id.clone()));
        }
        Ok(())
    }
}

impl OpenedArtifact {
    fn remote_for(&self, patch: ArtifactPatch) -> Remote {
        if self.artifact.is_new {
            Remote::Local
        } else {
            Remote::Update(patch)
        }
    }
}

// ── Public API ──

impl<S: DocumentStore> Workspace<S> {
    pub fn new(store: Arc<S>, catalog: VisualizationCatalog, registry: RendererRegistry) -> Self {
        Self {
            store,
            catalog,
            registry,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, VisualizationCatalog::builtin(), RendererRegistry::builtin())
    }

    pub fn from_config(store: Arc<S>, config: &WorkspaceConfig) -> Result<Self> {
        Ok(Self::new(store, config.build_catalog()?, config.build_registry()))
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn catalog(&self) -> &VisualizationCatalog {
        &self.catalog
    }

    // ── Listing and opening ──

    /// Refresh the loaded listing from the store.
    pub async fn load_all(&self, filter: &ArtifactFilter) -> Result<Vec<Artifact>> {
        let artifacts = self.store.fetch_all(filter).await?;
        let mut state = self.state.lock().await;
        state.loaded = artifacts.clone();
        log::debug!("loaded {} artifacts", artifacts.len());
        Ok(artifacts)
    }

    pub async fn loaded(&self) -> Vec<Artifact> {
        self.state.lock().await.loaded.clone()
    }

    /// Open a local draft with default content. Returns its id, suffixed when
    /// the title's slug is already in use.
    pub async fn open_draft(&self, title: &str, art_type: ArtType) -> DocumentId {
        let mut state = self.state.lock().await;

        let mut document_id = DocumentId::from_title(title);
        if state.is_taken(&document_id) {
            let suffix = Uuid::new_v4().simple().to_string();
            document_id = DocumentId::new(format!("{}-{}", document_id, &suffix[..8]));
        }

        let visualization = self.catalog.default_for(&art_type).cloned();
        let artifact = Artifact::draft(document_id.clone(), title, art_type);
        state.open(artifact, visualization);
        document_id
    }

    /// Fetch and open a persisted artifact. Already-opened artifacts are left as they are.
    pub async fn open(&self, document_id: &DocumentId) -> Result<()> {
        if self.state.lock().await.opened.contains_key(document_id) {
            return Ok(());
        }

        let artifact = self.store.fetch_one(document_id).await?;
        let visualization = self.catalog.default_for(&artifact.art_type).cloned();

        let mut state = self.state.lock().await;
        if !state.opened.contains_key(document_id) {
            state.open(artifact, visualization);
        }
        Ok(())
    }

    /// Returns whether the artifact was open. A request still outstanding for
    /// it will have its result discarded.
    pub async fn close(&self, document_id: &DocumentId) -> bool {
        self.state
            .lock()
            .await
            .opened
            .shift_remove(document_id)
            .is_some()
    }

    pub async fn opened_ids(&self) -> Vec<DocumentId> {
        self.state.lock().await.opened.keys().cloned().collect()
    }

    pub async fn artifact(&self, document_id: &DocumentId) -> Result<Artifact> {
        let state = self.state.lock().await;
        Ok(state.opened(document_id)?.artifact.clone())
    }

    pub async fn is_busy(&self, document_id: &DocumentId) -> bool {
        self.state.lock().await.in_flight.contains(document_id)
    }

    // ── Viewing ──

    pub async fn view(&self, document_id: &DocumentId) -> Result<ArtifactView> {
        let state = self.state.lock().await;
        let opened = state.opened(document_id)?;
        let artifact = &opened.artifact;

        let normalized =
            codec::normalize_in_catalog(artifact.content.as_ref(), &artifact.art_type, &self.catalog);
        let resolution = self
            .registry
            .resolve(artifact, opened.visualization.as_ref());

        Ok(ArtifactView {
            document_id: artifact.document_id.clone(),
            title: artifact.title.clone(),
            art_type: artifact.art_type.clone(),
            version: artifact.version,
            is_new: artifact.is_new,
            content: normalized.content,
            warnings: normalized.warnings,
            visualizations: self.catalog.available_for(&artifact.art_type).to_vec(),
            active_visualization: opened.visualization.clone(),
            resolution,
        })
    }

    /// Switch the active visualization. The pair must be in the catalog.
    pub async fn select_visualization(
        &self,
        document_id: &DocumentId,
        kind: &VisualizationKind,
        subtype: Option<&str>,
    ) -> Result<VisualizationDescriptor> {
        let mut state = self.state.lock().await;
        let entry = state
            .opened
            .get_mut(document_id)
            .ok_or_else(|| ArtifactError::NotFound(document_id.clone()))?;

        let descriptor = self
            .catalog
            .find(&entry.artifact.art_type, kind, subtype)
            .cloned()
            .ok_or_else(|| {
                ArtifactError::Validation(format!(
                    "{}{} is not a visualization of {}",
                    kind,
                    subtype.map(|s| format!("/{}", s)).unwrap_or_default(),
                    entry.artifact.art_type
                ))
            })?;

        entry.visualization = Some(descriptor.clone());
        Ok(descriptor)
    }

    // ── Saving and editing ──

    /// Persist an opened artifact: drafts are created, persisted artifacts get
    /// a new version. The title is checked before the store is contacted.
    pub async fn save(&self, document_id: &DocumentId) -> Result<Artifact> {
        let (tentative, artifact) = {
            let mut state = self.state.lock().await;
            let opened = state.opened(document_id)?;
            validate_title(&opened.artifact.title)?;
            state.check_idle(document_id)?;

            let opened = opened.clone();
            state.in_flight.insert(document_id.clone());
            let artifact = opened.artifact.clone();
            (
                Tentative {
                    document_id: document_id.clone(),
                    generation: opened.generation,
                    previous: opened,
                },
                artifact,
            )
        };

        let outcome = if artifact.is_new {
            self.store.create(artifact.to_draft()).await
        } else {
            let draft = artifact.to_draft();
            let patch = ArtifactPatch::default()
                .with_title(draft.title)
                .with_art_type(draft.art_type)
                .with_content(draft.content)
                .with_dependencies(draft.dependencies);
            self.store.update(document_id, patch).await
        };

        self.settle(tentative, outcome).await
    }

    /// Replace the content. Drafts change locally; persisted artifacts go
    /// through a two-phase update.
    pub async fn update_content(&self, document_id: &DocumentId, content: Content) -> Result<Artifact> {
        let (tentative, remote) = self
            .stage(document_id, |opened| {
                let wire = codec::serialize_effective(Some(&content), &opened.artifact.art_type);
                opened.artifact.content = Some(content);
                Ok(opened.remote_for(ArtifactPatch::default().with_content(wire)))
            })
            .await?;
        self.dispatch(tentative, remote).await
    }

    /// Edit title and/or art_type. Content is never migrated to a new type's shape.
    pub async fn update_properties(
        &self,
        document_id: &DocumentId,
        title: Option<String>,
        art_type: Option<ArtType>,
    ) -> Result<Artifact> {
        let catalog = &self.catalog;
        let (tentative, remote) = self
            .stage(document_id, |opened| {
                let mut patch = ArtifactPatch::default();
                if let Some(title) = title {
                    if !opened.artifact.is_new {
                        validate_title(&title)?;
                    }
                    opened.artifact.title = title.clone();
                    patch = patch.with_title(title);
                }
                if let Some(art_type) = art_type {
                    if art_type != opened.artifact.art_type {
                        let normalized =
                            codec::normalize(opened.artifact.content.as_ref(), &opened.artifact.art_type);
                        let missing = ContentShape::for_type(&art_type).missing_keys(&normalized);
                        if !missing.is_empty() {
                            log::warn!(
                                "changing {} from {} to {}: content lacks {:?}",
                                opened.artifact.document_id,
                                opened.artifact.art_type,
                                art_type,
                                missing
                            );
                        }
                        opened.visualization = catalog.default_for(&art_type).cloned();
                    }
                    opened.artifact.art_type = art_type.clone();
                    patch = patch.with_art_type(art_type);
                }
                Ok(opened.remote_for(patch))
            })
            .await?;
        self.dispatch(tentative, remote).await
    }

    // ── Dependencies ──

    /// Bulk replacement of the dependency set.
    pub async fn set_dependencies(
        &self,
        document_id: &DocumentId,
        ids: Vec<DocumentId>,
    ) -> Result<Artifact> {
        let (tentative, remote) = self
            .stage(document_id, |opened| {
                opened.artifact.set_dependencies(ids);
                let dependencies = opened.artifact.dependencies.clone();
                Ok(opened.remote_for(ArtifactPatch::default().with_dependencies(dependencies)))
            })
            .await?;
        self.dispatch(tentative, remote).await
    }

    /// Remove one dependency. Removing an id that is not in the set changes nothing.
    pub async fn remove_dependency(
        &self,
        document_id: &DocumentId,
        dependency: &DocumentId,
    ) -> Result<Artifact> {
        {
            let state = self.state.lock().await;
            let opened = state.opened(document_id)?;
            if !opened.artifact.dependencies.contains(dependency) {
                return Ok(opened.artifact.clone());
            }
        }

        let (tentative, remote) = self
            .stage(document_id, |opened| {
                opened.artifact.dependencies.remove(dependency);
                let dependencies = opened.artifact.dependencies.clone();
                Ok(opened.remote_for(ArtifactPatch::default().with_dependencies(dependencies)))
            })
            .await?;
        self.dispatch(tentative, remote).await
    }

    /// Dependencies present in the loaded listing, in dependency order.
    pub async fn resolve_dependencies(&self, document_id: &DocumentId) -> Result<Vec<ArtifactSummary>> {
        let state = self.state.lock().await;
        let opened = state.opened(document_id)?;
        Ok(opened.artifact.dependencies.resolve(&state.loaded))
    }

    /// Dependencies the loaded listing cannot resolve. They stay in the stored set.
    pub async fn unresolved_dependencies(&self, document_id: &DocumentId) -> Result<Vec<DocumentId>> {
        let state = self.state.lock().await;
        let opened = state.opened(document_id)?;
        Ok(opened.artifact.dependencies.unresolved(&state.loaded))
    }

    // ── History ──

    /// Persisted snapshots. Drafts have an empty history.
    pub async fn history(&self, document_id: &DocumentId) -> Result<VersionHistory> {
        let is_draft = self
            .state
            .lock()
            .await
            .opened
            .get(document_id)
            .is_some_and(|o| o.artifact.is_new);
        if is_draft {
            return Ok(VersionHistory::new(document_id.clone(), Vec::new()));
        }

        let snapshots = self.store.versions(document_id).await?;
        Ok(VersionHistory::new(document_id.clone(), snapshots))
    }

    pub async fn preview(&self, document_id: &DocumentId, version: u32) -> Result<SnapshotView> {
        let history = self.history(document_id).await?;
        let preview = history.preview(version)?;
        let snapshot = preview.snapshot.clone();
        let content = codec::normalize(Some(&snapshot.content), &snapshot.art_type);
        Ok(SnapshotView {
            is_current: preview.is_current,
            snapshot,
            content,
        })
    }

    /// Promote a past version to a new current version. A missing version
    /// fails with `VersionNotFound` and changes nothing; the current version
    /// is returned unchanged.
    pub async fn revert(&self, document_id: &DocumentId, version: u32) -> Result<Artifact> {
        {
            let state = self.state.lock().await;
            state.opened(document_id)?;
            state.check_idle(document_id)?;
        }

        let history = self.history(document_id).await?;
        let (from_version, patch) = match history.plan_revert(version)? {
            RevertPlan::AlreadyCurrent { version } => {
                log::debug!("{} is already at version {}", document_id, version);
                return self.artifact(document_id).await;
            }
            RevertPlan::Update {
                from_version,
                patch,
            } => (from_version, patch),
        };

        let catalog = &self.catalog;
        let (tentative, remote) = self
            .stage(document_id, |opened| {
                if opened.artifact.version != from_version {
                    return Err(ArtifactError::Remote(format!(
                        "{} changed while its history was being read",
                        document_id
                    )));
                }
                if let Some(title) = &patch.title {
                    opened.artifact.title = title.clone();
                }
                if let Some(art_type) = &patch.art_type {
                    if art_type != &opened.artifact.art_type {
                        opened.visualization = catalog.default_for(art_type).cloned();
                    }
                    opened.artifact.art_type = art_type.clone();
                }
                if let Some(content) = &patch.content {
                    opened.artifact.content = Some(Content::Raw(content.clone()));
                }
                Ok(Remote::Update(patch.clone()))
            })
            .await?;

        let reverted = self.dispatch(tentative, remote).await?;
        log::info!(
            "reverted {} to the state of version {} as version {}",
            document_id,
            version,
            reverted.version
        );
        Ok(reverted)
    }

    // ── Download and delete ──

    /// Drafts are rendered locally; persisted artifacts come from the store.
    pub async fn download(&self, document_id: &DocumentId) -> Result<Download> {
        let draft = {
            let state = self.state.lock().await;
            state
                .opened
                .get(document_id)
                .filter(|o| o.artifact.is_new)
                .map(|o| o.artifact.clone())
        };

        match draft {
            Some(artifact) => Ok(Download {
                filename: artifact.download_filename(),
                bytes: artifact.to_draft().content.into_bytes(),
            }),
            None => self.store.download(document_id).await,
        }
    }

    /// Delete from the store and drop from local state. Drafts are only dropped.
    pub async fn delete(&self, document_id: &DocumentId) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.check_idle(document_id)?;
            if state.opened.get(document_id).is_some_and(|o| o.artifact.is_new) {
                state.opened.shift_remove(document_id);
                return Ok(());
            }
            state.in_flight.insert(document_id.clone());
        }

        let outcome = self.store.delete(document_id).await;

        let mut state = self.state.lock().await;
        state.in_flight.remove(document_id);
        outcome?;
        state.opened.shift_remove(document_id);
        state.loaded.retain(|a| &a.document_id != document_id);
        Ok(())
    }

    // ── Two-phase commit ──

    /// Apply `edit` to the opened artifact as tentative state and mark it in
    /// flight when the store has to be called. A failing `edit` leaves the
    /// artifact as it was.
    async fn stage<F>(&self, document_id: &DocumentId, edit: F) -> Result<(Tentative, Remote)>
    where
        F: FnOnce(&mut OpenedArtifact) -> Result<Remote>,
    {
        let mut state = self.state.lock().await;
        state.check_idle(document_id)?;
        let entry = state
            .opened
            .get_mut(document_id)
            .ok_or_else(|| ArtifactError::NotFound(document_id.clone()))?;

        let previous = entry.clone();
        let remote = match edit(&mut *entry) {
            Ok(remote) => remote,
            Err(e) => {
                *entry = previous;
                return Err(e);
            }
        };

        if matches!(remote, Remote::Update(_)) {
            state.in_flight.insert(document_id.clone());
        }
        Ok((
            Tentative {
                document_id: document_id.clone(),
                generation: previous.generation,
                previous,
            },
            remote,
        ))
    }

    async fn dispatch(&self, tentative: Tentative, remote: Remote) -> Result<Artifact> {
        match remote {
            Remote::Local => self.artifact(&tentative.document_id).await,
            Remote::Update(patch) => {
                let outcome = self.store.update(&tentative.document_id, patch).await;
                self.settle(tentative, outcome).await
            }
        }
    }

    /// Commit or roll back. A result for an artifact that was closed (or
    /// closed and reopened) in the meantime is discarded.
    async fn settle(&self, tentative: Tentative, outcome: Result<Artifact>) -> Result<Artifact> {
        let mut state = self.state.lock().await;
        state.in_flight.remove(&tentative.document_id);

        let current = state
            .opened
            .get_mut(&tentative.document_id)
            .filter(|o| o.generation == tentative.generation);
        let Some(entry) = current else {
            log::debug!(
                "discarding late result for closed artifact {}",
                tentative.document_id
            );
            return outcome;
        };

        match outcome {
            Ok(artifact) => {
                entry.artifact = artifact.clone();
                state.upsert_loaded(&artifact);
                Ok(artifact)
            }
            Err(e) => {
                log::warn!(
                    "rolling back {} after failed request: {}",
                    tentative.document_id,
                    e
                );
                *entry = tentative.previous;
                Err(e)
            }
        }
    }
}

// ── Tests ──
