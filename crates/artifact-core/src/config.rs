// ── Workspace Configuration ──
//
// `<workspace>/workspace.yaml`:
//   state_file: .artifacts/state.yaml
//   catalog:    { <art_type>: [ { type, subtype?, label, isDefault? } ] }
//   renderers:  { visualizations: { <type>: <renderer> }, art_types: { ... } }

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{VisualizationCatalog, VisualizationDescriptor};
use crate::error::Result;
use crate::renderer::{RendererOverrides, RendererRegistry};

pub const CONFIG_FILE: &str = "workspace.yaml";
pub const DEFAULT_STATE_FILE: &str = ".artifacts/state.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub catalog: BTreeMap<String, Vec<VisualizationDescriptor>>,
    #[serde(default)]
    pub renderers: RendererOverrides,
}

fn default_state_file() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_FILE)
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            catalog: BTreeMap::new(),
            renderers: RendererOverrides::default(),
        }
    }
}

impl WorkspaceConfig {
    /// Built-in catalog with the configured entries applied.
    pub fn build_catalog(&self) -> Result<VisualizationCatalog> {
        VisualizationCatalog::builtin().with_overrides(&self.catalog)
    }

    pub fn build_registry(&self) -> RendererRegistry {
        RendererRegistry::builtin().with_overrides(&self.renderers)
    }

    /// `state_file` resolved against the workspace root.
    pub fn state_path(&self, root: &Path) -> PathBuf {
        if self.state_file.is_absolute() {
            self.state_file.clone()
        } else {
            root.join(&self.state_file)
        }
    }
}

/// No settings at all: only whitespace and `#` comment lines.
fn is_blank(content: &str) -> bool {
    content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

/// Load `workspace.yaml` from `root`, falling back to defaults when the file is
/// missing, empty or comment-only.
pub fn load_config(root: &Path) -> Result<WorkspaceConfig> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(WorkspaceConfig::default());
    }

    let content = fs::read_to_string(&config_path)?;
    if is_blank(&content) {
        return Ok(WorkspaceConfig::default());
    }

    // a document of only `~` or `null` also means defaults
    let config = serde_yaml_ng::from_str::<Option<WorkspaceConfig>>(&content)?.unwrap_or_default();
    // reject bad catalogs at load time rather than on first use
    config.build_catalog()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VisualizationKind;
    use crate::error::ArtifactError;
    use crate::renderer::RendererHandle;
    use crate::types::ArtType;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, WorkspaceConfig::default());
        assert_eq!(
            config.state_path(tmp.path()),
            tmp.path().join(".artifacts/state.yaml")
        );
    }

    #[test]
    fn test_comment_only_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "# artifacts workspace\n").unwrap();
        assert_eq!(load_config(tmp.path()).unwrap(), WorkspaceConfig::default());
    }

    #[test]
    fn test_header_comment_keeps_settings() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            "# Artifact workspace configuration\nstate_file: data/store.yaml\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.state_file, PathBuf::from("data/store.yaml"));

        let yaml = r#"# my workspace
catalog:
  note:
    - { type: document, label: A, isDefault: true }
    - { type: markdown, label: B, isDefault: true }
"#;
        fs::write(tmp.path().join(CONFIG_FILE), yaml).unwrap();
        assert!(matches!(
            load_config(tmp.path()).unwrap_err(),
            ArtifactError::Catalog(_)
        ));
    }

    #[test]
    fn test_null_document_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "# nothing yet\n~\n").unwrap();
        assert_eq!(load_config(tmp.path()).unwrap(), WorkspaceConfig::default());
    }

    #[test]
    fn test_full_config() {
        let tmp = TempDir::new().unwrap();
        let yaml = r#"
state_file: data/store.yaml
catalog:
  custom_blob:
    - type: code
      label: Raw
    - type: markdown
      label: Markdown
      isDefault: true
renderers:
  visualizations:
    kanban: table
  art_types:
    custom_blob: document
"#;
        fs::write(tmp.path().join(CONFIG_FILE), yaml).unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.state_file, PathBuf::from("data/store.yaml"));

        let catalog = config.build_catalog().unwrap();
        let custom = ArtType::from("custom_blob");
        assert_eq!(
            catalog.default_for(&custom).unwrap().kind,
            VisualizationKind::Markdown
        );

        let registry = config.build_registry();
        assert_eq!(
            registry.resolve_parts(&custom, None).renderer,
            RendererHandle::Document
        );
    }

    #[test]
    fn test_two_defaults_fail_to_load() {
        let tmp = TempDir::new().unwrap();
        let yaml = r#"
catalog:
  note:
    - { type: document, label: A, isDefault: true }
    - { type: markdown, label: B, isDefault: true }
"#;
        fs::write(tmp.path().join(CONFIG_FILE), yaml).unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::Catalog(_)));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "state_file: [unclosed\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()).unwrap_err(),
            ArtifactError::Yaml(_)
        ));
    }
}
