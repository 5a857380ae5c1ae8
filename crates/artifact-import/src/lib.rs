use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use artifact_core::{codec, ArtType, ArtifactDraft, Content, DependencySet, DocumentId};
use artifact_store::DocumentStore;
use regex::Regex;

// ── Types ──

/// Summary of a directory import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Turns file stems into titles.
pub struct TitleCleaner {
    export_suffix: Regex,
}

const EXTENSIONS: [&str; 3] = ["md", "txt", "json"];

// ── Helpers ──

impl TitleCleaner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // exporters append a space and a 32-char hex id to file names
            export_suffix: Regex::new(r"\s+[a-f0-9]{32}$").context("compiling title pattern")?,
        })
    }

    /// Strip an export id suffix and turn `_` separators into spaces.
    pub fn clean(&self, stem: &str) -> String {
        let stripped = self.export_suffix.replace(stem, "");
        stripped.replace('_', " ").trim().to_string()
    }

    /// First `# heading` in the text, else the cleaned file stem.
    pub fn title_for(&self, content: &str, stem: &str) -> String {
        for line in content.lines() {
            if let Some(heading) = line.trim().strip_prefix("# ") {
                let title = heading.trim();
                if !title.is_empty() {
                    return title.to_string();
                }
            }
        }
        self.clean(stem)
    }
}

fn is_importable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext))
}

/// The `create` payload for one file's text.
pub fn draft_for(title: String, text: &str, art_type: &ArtType) -> ArtifactDraft {
    let content = codec::normalize(Some(&Content::Raw(text.to_string())), art_type);
    ArtifactDraft {
        document_id: DocumentId::from_title(&title),
        title,
        art_type: art_type.clone(),
        content: codec::serialize(&Content::Structured(content)),
        dependencies: DependencySet::default(),
    }
}

// ── Public API ──

/// Import `.md`, `.txt` and `.json` files under `dir` as new artifacts of
/// `art_type`. Files that cannot be read or created are skipped.
pub async fn import_directory<S: DocumentStore>(
    store: &S,
    dir: &Path,
    art_type: &ArtType,
) -> Result<ImportSummary> {
    let dir = dir
        .canonicalize()
        .with_context(|| format!("resolving import directory: {}", dir.display()))?;
    let cleaner = TitleCleaner::new()?;

    let mut imported = 0;
    let mut skipped = 0;

    for entry in walkdir::WalkDir::new(&dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_importable(path) {
            continue;
        }

        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("skipping unreadable file {}: {}", path.display(), e);
                skipped += 1;
                continue;
            }
        };

        if text.trim().is_empty() {
            log::warn!("skipping empty file {}", path.display());
            skipped += 1;
            continue;
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled");
        let title = cleaner.title_for(&text, stem);
        let draft = draft_for(title, &text, art_type);

        match store.create(draft).await {
            Ok(artifact) => {
                log::info!("imported {} as {}", path.display(), artifact.document_id);
                imported += 1;
            }
            Err(e) => {
                log::warn!("skipping {}: {}", path.display(), e);
                skipped += 1;
            }
        }
    }

    Ok(ImportSummary { imported, skipped })
}
