// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Shared state for command handlers

use colored::Colorize;
use miette::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::Cli;
use crate::pipeline::PipelineRegistry;
use crate::settings::{inspect_repository, resolve_repository, Settings, SettingsStore};
use crate::vcs::{record_change, GitCli};

/// Repository root and settings resolved from the command line
#[derive(Debug, Clone)]
pub struct Context {
    pub repo_root: PathBuf,
    pub settings: Option<SettingsStore>,
    pub verbose: bool,
}

impl Context {
    /// Resolve the repository from `--repo-path`, the settings file, or the
    /// current directory
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let settings = match &cli.settings {
            Some(path) => Some(SettingsStore::new(path)),
            None => SettingsStore::default_location()
                .map_err(|e| warn!("Settings unavailable: {}", e))
                .ok(),
        };

        let loaded = match &settings {
            Some(store) => store.load().unwrap_or_else(|e| {
                warn!("Ignoring unreadable settings {}: {}", store.path().display(), e);
                Settings::default()
            }),
            None => Settings::default(),
        };

        let repo_root = resolve_repository(cli.repo_path.as_deref(), &loaded)?;
        debug!("Using repository {}", repo_root.display());

        let context = Self {
            repo_root,
            settings,
            verbose: cli.verbose,
        };

        if cli.repo_path.is_some() {
            context.remember_if_valid();
        }
        Ok(context)
    }

    /// Context for a fixed repository, without settings
    pub fn for_repository(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            settings: None,
            verbose: false,
        }
    }

    pub fn registry(&self) -> PipelineRegistry {
        PipelineRegistry::new(&self.repo_root)
    }

    /// Remember the repository when it passes the repository check
    fn remember_if_valid(&self) {
        let Some(store) = &self.settings else {
            return;
        };
        match inspect_repository(&self.repo_root) {
            Ok(check) if check.valid => {
                if let Err(e) = store.remember_repository(&self.repo_root) {
                    warn!("Could not remember repository: {}", e);
                }
            }
            _ => {}
        }
    }

    /// Record a change in git unless disabled, printing any warnings
    pub async fn commit_change(&self, paths: &[&Path], message: &str, no_git_commit: bool) {
        if no_git_commit {
            debug!("Skipping git commit: {}", message);
            return;
        }

        let git = match GitCli::new(&self.repo_root) {
            Ok(git) => git,
            Err(e) => {
                println!("  {} {}", "⚠".yellow(), e);
                return;
            }
        };

        let paths: Vec<PathBuf> = paths.iter().map(|p| p.to_path_buf()).collect();
        let warnings = record_change(&git, &paths, message).await;
        if warnings.is_empty() {
            println!("  {} Committed: {}", "✓".green(), message.dimmed());
        }
        for warning in warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }
}
