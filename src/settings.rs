// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Per-user settings
//!
//! Remembers the last repository the CLI worked on. Only the command-line
//! layer touches this; the pipeline engine always receives an explicit
//! repository root.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{EltError, EltResult};
use crate::pipeline::{Tool, PIPELINES_DIR};

/// Settings file name inside the config directory
pub const SETTINGS_FILE: &str = "settings.toml";

/// Persisted user settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Repository used when no path is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_repo_path: Option<PathBuf>,
}

/// Loads and saves [`Settings`] as TOML
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the platform config directory, e.g.
    /// `~/.config/elt-builder/settings.toml`
    pub fn default_location() -> EltResult<Self> {
        let dirs = directories::ProjectDirs::from("", "", "elt-builder").ok_or_else(|| {
            EltError::Settings {
                message: "could not determine a home directory".into(),
            }
        })?;
        Ok(Self::new(dirs.config_dir().join(SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file gives defaults
    pub fn load(&self) -> EltResult<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let content =
            fs::read_to_string(&self.path).map_err(|e| EltError::read_failed(&self.path, e))?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, settings: &Settings) -> EltResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| EltError::write_failed(parent, e))?;
        }
        let content = toml::to_string_pretty(settings)?;
        fs::write(&self.path, content).map_err(|e| EltError::write_failed(&self.path, e))?;
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }

    /// Remember `repo` as the last used repository
    pub fn remember_repository(&self, repo: &Path) -> EltResult<()> {
        let mut settings = self.load()?;
        let repo = repo.canonicalize().unwrap_or_else(|_| repo.to_path_buf());
        if settings.last_repo_path.as_deref() == Some(repo.as_path()) {
            return Ok(());
        }
        settings.last_repo_path = Some(repo);
        self.save(&settings)
    }
}

/// Result of checking whether a path looks like a pipelines repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub pipeline_count: usize,
    pub has_git: bool,
}

/// Check `path` as a repository root
///
/// A missing path or a file is invalid. A directory without `pipelines/`
/// is valid but carries a warning.
pub fn inspect_repository(path: &Path) -> EltResult<RepositoryCheck> {
    if !path.exists() {
        return Ok(RepositoryCheck {
            error: Some(format!("Path does not exist: {}", path.display())),
            ..Default::default()
        });
    }
    if !path.is_dir() {
        return Ok(RepositoryCheck {
            error: Some(format!("Path is not a directory: {}", path.display())),
            ..Default::default()
        });
    }

    let has_git = path.join(".git").exists();
    let pipelines = path.join(PIPELINES_DIR);
    if !pipelines.is_dir() {
        return Ok(RepositoryCheck {
            valid: true,
            warning: Some(format!(
                "No {}/ directory found; it will be created with the first pipeline",
                PIPELINES_DIR
            )),
            has_git,
            ..Default::default()
        });
    }

    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..Default::default()
    };
    let mut pipeline_count = 0;
    for tool in Tool::ALL {
        let base = glob::Pattern::escape(&pipelines.join(tool.as_str()).to_string_lossy());
        let pattern = format!("{}/*", base);
        pipeline_count += glob::glob_with(&pattern, options)?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .count();
    }

    Ok(RepositoryCheck {
        valid: true,
        pipeline_count,
        has_git,
        ..Default::default()
    })
}

/// Pick the repository root: explicit path, then the remembered one, then
/// the current directory
pub fn resolve_repository(explicit: Option<&Path>, settings: &Settings) -> EltResult<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = settings.last_repo_path.as_ref().filter(|p| p.is_dir()) {
        debug!("Using remembered repository {}", path.display());
        return Ok(path.clone());
    }
    Ok(std::env::current_dir()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::new(temp.path().join("nested/settings.toml"));
        assert_eq!(store.load().unwrap(), Settings::default());

        store.remember_repository(temp.path()).unwrap();
        let settings = store.load().unwrap();
        assert_eq!(
            settings.last_repo_path.unwrap(),
            temp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_invalid_settings_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        fs::write(&path, "last_repo_path = [").unwrap();
        assert!(matches!(
            SettingsStore::new(path).load(),
            Err(EltError::Toml { .. })
        ));
    }

    #[test]
    fn test_inspect_repository() {
        let temp = TempDir::new().unwrap();

        let check = inspect_repository(&temp.path().join("missing")).unwrap();
        assert!(!check.valid);
        assert!(check.error.unwrap().contains("does not exist"));

        let check = inspect_repository(temp.path()).unwrap();
        assert!(check.valid);
        assert!(check.warning.is_some());
        assert_eq!(check.pipeline_count, 0);
        assert!(!check.has_git);

        for dir in ["pipelines/dlt/gh1", "pipelines/dlt/.gh2.tmp", "pipelines/sling/pg1", ".git"] {
            fs::create_dir_all(temp.path().join(dir)).unwrap();
        }
        fs::write(temp.path().join("pipelines/dlt/notes.txt"), "").unwrap();

        let check = inspect_repository(temp.path()).unwrap();
        assert!(check.valid);
        assert!(check.warning.is_none());
        assert_eq!(check.pipeline_count, 2);
        assert!(check.has_git);

        let file = temp.path().join("file.txt");
        fs::write(&file, "").unwrap();
        assert!(!inspect_repository(&file).unwrap().valid);
    }

    #[test]
    fn test_resolve_repository_order() {
        let temp = TempDir::new().unwrap();
        let remembered = Settings {
            last_repo_path: Some(temp.path().to_path_buf()),
        };

        let explicit = Path::new("/somewhere/else");
        assert_eq!(
            resolve_repository(Some(explicit), &remembered).unwrap(),
            explicit
        );
        assert_eq!(resolve_repository(None, &remembered).unwrap(), temp.path());

        let stale = Settings {
            last_repo_path: Some(temp.path().join("gone")),
        };
        assert_eq!(
            resolve_repository(None, &stale).unwrap(),
            std::env::current_dir().unwrap()
        );
    }
}
