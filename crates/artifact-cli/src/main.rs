use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use artifact_core::{
    load_config, ArtType, Content, DocumentId, VisualizationKind, WorkspaceConfig,
};
use artifact_store::{ArtifactFilter, MemoryStore};
use artifact_workspace::Workspace;
use clap::{Args, Parser, Subcommand};

// ── CLI Definition ──

#[derive(Parser)]
#[command(name = "artifacts", about = "Versioned, typed delivery artifacts")]
struct Cli {
    /// Workspace directory holding workspace.yaml and the store state
    #[arg(long, global = true, default_value = ".")]
    workspace: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create workspace.yaml and an empty store
    Init,
    /// Create a new artifact
    New {
        title: String,
        /// Artifact type (note, document, api_list, ...)
        #[arg(long = "type", default_value = "note")]
        art_type: String,
        #[command(flatten)]
        content: ContentArgs,
        /// Dependencies by document id
        #[arg(long, value_delimiter = ',')]
        deps: Vec<String>,
    },
    /// List artifacts, most recently updated first
    List {
        #[arg(long = "type")]
        art_type: Option<String>,
        #[arg(long)]
        keyword: Option<String>,
        /// 0 lists everything
        #[arg(long, default_value_t = 0)]
        limit: usize,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show an artifact as its renderer would receive it
    Show {
        id: String,
        /// Visualization as `type` or `type/subtype`
        #[arg(long)]
        viz: Option<String>,
    },
    /// Change title, type or content; each change is a new version
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long = "type")]
        art_type: Option<String>,
        #[command(flatten)]
        content: ContentArgs,
    },
    /// Manage dependencies
    Deps {
        #[command(subcommand)]
        command: DepsCommand,
    },
    /// List versions, newest first
    History { id: String },
    /// Show a past version
    Preview { id: String, version: u32 },
    /// Make a past version current again
    Revert { id: String, version: u32 },
    /// Write the artifact to `{title}{extension}`
    Download {
        id: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Delete an artifact and its history
    Delete { id: String },
    /// Import .md, .txt and .json files from a directory
    Import {
        dir: PathBuf,
        #[arg(long = "type", default_value = "document")]
        art_type: String,
    },
}

#[derive(Subcommand)]
enum DepsCommand {
    /// Replace the dependency set
    Set { id: String, deps: Vec<String> },
    /// Remove one dependency
    Rm { id: String, dep: String },
    /// Show resolved and unresolved dependencies
    List { id: String },
}

#[derive(Args)]
struct ContentArgs {
    /// Content as a literal string
    #[arg(long, conflicts_with = "file")]
    content: Option<String>,
    /// Read content from a file
    #[arg(long)]
    file: Option<PathBuf>,
}

// ── Helpers ──

impl ContentArgs {
    fn read(&self) -> Result<Option<Content>> {
        if let Some(text) = &self.content {
            return Ok(Some(Content::Raw(text.clone())));
        }
        match &self.file {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading content file: {}", path.display()))?;
                Ok(Some(Content::Raw(text)))
            }
            None => Ok(None),
        }
    }
}

/// `diagram/er` → (diagram, Some("er"))
fn parse_visualization(spec: &str) -> (VisualizationKind, Option<&str>) {
    match spec.split_once('/') {
        Some((kind, subtype)) if !subtype.is_empty() => (VisualizationKind::from(kind), Some(subtype)),
        Some((kind, _)) => (VisualizationKind::from(kind), None),
        None => (VisualizationKind::from(spec), None),
    }
}

fn ids(raw: &[String]) -> Vec<DocumentId> {
    raw.iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| DocumentId::new(s.trim()))
        .collect()
}

/// Write a commented workspace.yaml and an empty state file, keeping existing ones.
fn init(root: &Path) -> Result<()> {
    fs::create_dir_all(root)
        .with_context(|| format!("creating workspace: {}", root.display()))?;

    let config_path = root.join(artifact_core::config::CONFIG_FILE);
    if !config_path.exists() {
        fs::write(&config_path, "# Artifact workspace configuration\n")
            .context("writing workspace.yaml")?;
    }

    let config = load_config(root).context("loading workspace.yaml")?;
    let state_path = config.state_path(root);
    if !state_path.exists() {
        artifact_store::file::write_state(&state_path, &Default::default())
            .context("writing empty store state")?;
    }
    Ok(())
}

struct Session {
    root: PathBuf,
    config: WorkspaceConfig,
    workspace: Workspace<MemoryStore>,
}

impl Session {
    fn open(root: &Path) -> Result<Self> {
        let config = load_config(root).context("loading workspace.yaml")?;
        let store = MemoryStore::open(&config.state_path(root)).context("loading store state")?;
        let workspace = Workspace::from_config(Arc::new(store), &config)?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
            workspace,
        })
    }

    async fn persist(&self) -> Result<()> {
        let path = self.config.state_path(&self.root);
        self.workspace
            .store()
            .save(&path)
            .await
            .with_context(|| format!("writing store state: {}", path.display()))
    }
}

// ── Commands ──

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Init = cli.command {
        init(&cli.workspace)?;
        println!("initialized workspace at {}", cli.workspace.display());
        return Ok(());
    }

    let session = Session::open(&cli.workspace)?;
    let ws = &session.workspace;

    match cli.command {
        Commands::Init => {}
        Commands::New {
            title,
            art_type,
            content,
            deps,
        } => {
            let id = ws.open_draft(&title, ArtType::from(art_type)).await;
            if let Some(content) = content.read()? {
                ws.update_content(&id, content).await?;
            }
            ws.set_dependencies(&id, ids(&deps)).await?;
            let artifact = ws.save(&id).await?;
            println!("created {} (version {})", artifact.document_id, artifact.version);
        }
        Commands::List {
            art_type,
            keyword,
            limit,
            page,
        } => {
            let filter = ArtifactFilter {
                art_type: art_type.map(ArtType::from),
                keyword,
                limit,
                page,
            };
            for artifact in ws.load_all(&filter).await? {
                println!(
                    "{}  v{}  [{}]  {}",
                    artifact.document_id, artifact.version, artifact.art_type, artifact.title
                );
            }
        }
        Commands::Show { id, viz } => {
            let id = DocumentId::new(id);
            ws.load_all(&ArtifactFilter::default()).await?;
            ws.open(&id).await?;
            if let Some(spec) = viz.as_deref() {
                let (kind, subtype) = parse_visualization(spec);
                ws.select_visualization(&id, &kind, subtype).await?;
            }
            let view = ws.view(&id).await?;
            println!("{} ({})", view.title, view.art_type.label());
            println!("version:  {}", view.version);
            match &view.active_visualization {
                Some(active) => println!("view:     {}", active),
                None => println!("view:     none"),
            }
            println!(
                "renderer: {} (by {:?})",
                view.resolution.renderer, view.resolution.resolved_by
            );
            let available: Vec<String> = view.visualizations.iter().map(|v| v.to_string()).collect();
            if !available.is_empty() {
                println!("views:    {}", available.join(", "));
            }
            for warning in &view.warnings {
                eprintln!("warning: {}", serde_json::to_string(warning)?);
            }
            println!("{}", serde_json::to_string_pretty(&view.content)?);
        }
        Commands::Edit {
            id,
            title,
            art_type,
            content,
        } => {
            let id = DocumentId::new(id);
            ws.open(&id).await?;
            if title.is_some() || art_type.is_some() {
                ws.update_properties(&id, title, art_type.map(ArtType::from))
                    .await?;
            }
            if let Some(content) = content.read()? {
                ws.update_content(&id, content).await?;
            }
            let artifact = ws.artifact(&id).await?;
            println!("{} is at version {}", artifact.document_id, artifact.version);
        }
        Commands::Deps { command } => match command {
            DepsCommand::Set { id, deps } => {
                let id = DocumentId::new(id);
                ws.open(&id).await?;
                let artifact = ws.set_dependencies(&id, ids(&deps)).await?;
                println!(
                    "{} depends on {} artifacts (version {})",
                    artifact.document_id,
                    artifact.dependencies.len(),
                    artifact.version
                );
            }
            DepsCommand::Rm { id, dep } => {
                let id = DocumentId::new(id);
                ws.open(&id).await?;
                let artifact = ws.remove_dependency(&id, &DocumentId::new(dep)).await?;
                println!(
                    "{} depends on {} artifacts (version {})",
                    artifact.document_id,
                    artifact.dependencies.len(),
                    artifact.version
                );
            }
            DepsCommand::List { id } => {
                let id = DocumentId::new(id);
                ws.load_all(&ArtifactFilter::default()).await?;
                ws.open(&id).await?;
                for summary in ws.resolve_dependencies(&id).await? {
                    println!("{}  [{}]  {}", summary.document_id, summary.art_type, summary.title);
                }
                let unresolved = ws.unresolved_dependencies(&id).await?;
                if !unresolved.is_empty() {
                    println!("{} unresolved dependencies", unresolved.len());
                }
            }
        },
        Commands::History { id } => {
            let id = DocumentId::new(id);
            ws.open(&id).await?;
            let history = ws.history(&id).await?;
            for snapshot in history.newest_first() {
                let parent = snapshot
                    .parent_version
                    .map(|v| format!(" (from v{})", v))
                    .unwrap_or_default();
                println!(
                    "v{}{}  {}  {}  {}",
                    snapshot.version,
                    parent,
                    snapshot.status,
                    snapshot.created_at.format("%Y-%m-%d %H:%M:%S"),
                    snapshot.title
                );
            }
        }
        Commands::Preview { id, version } => {
            let id = DocumentId::new(id);
            ws.open(&id).await?;
            let preview = ws.preview(&id, version).await?;
            let marker = if preview.is_current { " (current)" } else { "" };
            println!("v{}{}  {}", preview.snapshot.version, marker, preview.snapshot.title);
            println!("{}", serde_json::to_string_pretty(&preview.content)?);
        }
        Commands::Revert { id, version } => {
            let id = DocumentId::new(id);
            ws.open(&id).await?;
            let artifact = ws.revert(&id, version).await?;
            println!("{} is at version {}", artifact.document_id, artifact.version);
        }
        Commands::Download { id, out } => {
            let download = ws.download(&DocumentId::new(id)).await?;
            fs::create_dir_all(&out)
                .with_context(|| format!("creating output directory: {}", out.display()))?;
            let path = out.join(&download.filename);
            fs::write(&path, &download.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        Commands::Delete { id } => {
            let id = DocumentId::new(id);
            ws.delete(&id).await?;
            println!("deleted {}", id);
        }
        Commands::Import { dir, art_type } => {
            let summary =
                artifact_import::import_directory(ws.store().as_ref(), &dir, &ArtType::from(art_type))
                    .await?;
            println!(
                "imported {} files, skipped {}",
                summary.imported, summary.skipped
            );
        }
    }

    session.persist().await
}

// ── Main ──

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

// ── Tests ──
