//! Project configuration loading.
//!
//! Each project is described by one YAML file. The project identifier is the
//! config file stem unless forced on the command line; `source` is the only
//! required field.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One project's harvest configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ProjectConfig {
    /// Derived from the config filename; never read from the file itself.
    #[serde(skip)]
    pub identifier: String,

    /// Source repository URL. Required.
    #[serde(default)]
    pub source: Option<String>,

    /// Subpath within the checkout to scan instead of the checkout root.
    #[serde(default)]
    pub root: Option<String>,

    /// Additional directories (relative to the scan root) to scan for
    /// supplementary sources.
    #[serde(default)]
    pub scandirs: Vec<String>,

    /// Service endpoint URLs used to augment the final record.
    #[serde(default)]
    pub services: Vec<String>,

    /// Explicit tag/branch/commit to check out. Auto-resolved when absent.
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
}

impl ProjectConfig {
    /// The repository URL, or an error if the config omitted it.
    pub fn source_url(&self) -> Result<&str> {
        match &self.source {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => bail!(
                "project '{}' has no 'source' repository URL configured",
                self.identifier
            ),
        }
    }
}

/// Load a single project config file, deriving the identifier from the stem.
pub fn load_project_config(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: ProjectConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    config.identifier = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    if config.identifier.is_empty() {
        bail!("cannot derive an identifier from {}", path.display());
    }

    // Surface the missing-source error at load time rather than mid-harvest.
    config.source_url()?;

    Ok(config)
}

/// Expand CLI targets into concrete config file paths.
///
/// A directory target contributes every `*.yml` / `*.yaml` file directly
/// inside it, sorted by name for deterministic batch order.
pub fn collect_config_files(targets: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for target in targets {
        if target.is_dir() {
            let mut in_dir = Vec::new();
            let entries = std::fs::read_dir(target)
                .with_context(|| format!("Failed to read directory: {}", target.display()))?;
            for entry in entries {
                let path = entry?.path();
                let is_yaml = path
                    .extension()
                    .map(|e| e == "yml" || e == "yaml")
                    .unwrap_or(false);
                if path.is_file() && is_yaml {
                    in_dir.push(path);
                }
            }
            in_dir.sort();
            files.extend(in_dir);
        } else if target.is_file() {
            files.push(target.clone());
        } else {
            bail!("target does not exist: {}", target.display());
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("widgetlib.yml");
        std::fs::write(
            &path,
            "source: https://github.com/example/widgetlib.git\n\
             root: subdir\n\
             scandirs:\n  - docs\n  - meta\n\
             services:\n  - https://api.example.org/widgetlib\n\
             ref: v2.0.0\n",
        )
        .unwrap();

        let config = load_project_config(&path).unwrap();
        assert_eq!(config.identifier, "widgetlib");
        assert_eq!(
            config.source_url().unwrap(),
            "https://github.com/example/widgetlib.git"
        );
        assert_eq!(config.root.as_deref(), Some("subdir"));
        assert_eq!(config.scandirs, vec!["docs", "meta"]);
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.reference.as_deref(), Some("v2.0.0"));
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yml");
        std::fs::write(&path, "root: subdir\n").unwrap();

        let err = load_project_config(&path).unwrap_err();
        assert!(err.to_string().contains("source"), "{err}");
    }

    #[test]
    fn identifier_comes_from_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my-project.yaml");
        std::fs::write(&path, "source: https://example.org/repo.git\n").unwrap();

        let config = load_project_config(&path).unwrap();
        assert_eq!(config.identifier, "my-project");
    }

    #[test]
    fn directory_target_collects_yaml_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.yml"), "source: x\n").unwrap();
        std::fs::write(dir.path().join("a.yaml"), "source: x\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = collect_config_files(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.yaml", "b.yml"]);
    }
}
