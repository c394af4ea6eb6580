// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Error types for elt-builder
//!
//! Errors carry a diagnostic code and, where there is an obvious next step,
//! a help line that tells the user what to do about it.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for elt-builder operations
pub type EltResult<T> = Result<T, EltError>;

/// Main error type for elt-builder
#[derive(Error, Debug, Diagnostic)]
pub enum EltError {
    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline '{name}' not found")]
    #[diagnostic(
        code(elt::pipeline_not_found),
        help("Run 'elt list' to see the pipelines in this repository")
    )]
    PipelineNotFound { name: String, searched: Vec<PathBuf> },

    #[error("Pipeline '{name}' already exists at {path}")]
    #[diagnostic(
        code(elt::pipeline_exists),
        help("Pick another name, or regenerate it with 'elt update'")
    )]
    PipelineExists {
        name: String,
        tool: String,
        path: PathBuf,
    },

    #[error("Invalid pipeline request: {reason}")]
    #[diagnostic(code(elt::invalid_request))]
    InvalidRequest {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("No dagster.yaml found in {path}")]
    #[diagnostic(
        code(elt::metadata_missing),
        help("Regenerate the pipeline with 'elt update' to restore its metadata")
    )]
    MetadataMissing { path: PathBuf },

    // ─────────────────────────────────────────────────────────────────────────
    // Repository Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid repository path '{path}': {reason}")]
    #[diagnostic(code(elt::invalid_repo_path))]
    InvalidRepoPath { path: PathBuf, reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Version Control Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Tool '{tool}' not found")]
    #[diagnostic(code(elt::tool_not_found), help("{suggestion}"))]
    ToolNotFound { tool: String, suggestion: String },

    #[error("Not a git repository: {path}")]
    #[diagnostic(code(elt::not_a_repository), help("Initialize with: elt git init"))]
    NotARepository { path: PathBuf },

    #[error("git {operation} failed: {error}")]
    #[diagnostic(code(elt::vcs_failed))]
    VcsFailed {
        operation: String,
        error: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(elt::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(elt::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    #[error("Settings error: {message}")]
    #[diagnostic(code(elt::settings_error))]
    Settings { message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(elt::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(elt::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(elt::json_error))]
    Json { message: String },

    #[error("TOML error: {message}")]
    #[diagnostic(code(elt::toml_error))]
    Toml { message: String },

    #[error("Glob pattern error: {message}")]
    #[diagnostic(code(elt::glob_error))]
    GlobPattern { message: String },
}

impl From<std::io::Error> for EltError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for EltError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for EltError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for EltError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl From<toml::ser::Error> for EltError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl From<glob::PatternError> for EltError {
    fn from(e: glob::PatternError) -> Self {
        Self::GlobPattern { message: e.to_string() }
    }
}

impl EltError {
    /// Create a tool not found error with installation suggestion
    pub fn tool_not_found(tool: &str) -> Self {
        let suggestion = match tool {
            "git" => "Install git: https://git-scm.com/downloads".to_string(),
            _ => format!("Install {} and ensure it's in your PATH", tool),
        };

        Self::ToolNotFound {
            tool: tool.to_string(),
            suggestion,
        }
    }

    /// Create an invalid request error without a help line
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
            help: None,
        }
    }

    /// Wrap an IO failure while reading `path`
    pub fn read_failed(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::FileReadError {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Wrap an IO failure while writing `path`
    pub fn write_failed(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::FileWriteError {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Create a git failure with a hint derived from its stderr
    pub fn vcs_failed(operation: &str, stderr: &str) -> Self {
        let help = if stderr.contains("Authentication failed") || stderr.contains("Permission denied") {
            Some("Check your git credentials for the remote".to_string())
        } else if stderr.contains("nothing to commit") {
            Some("There are no staged changes to commit".to_string())
        } else if stderr.contains("no upstream branch") {
            Some("Set an upstream with: git push -u origin <branch>".to_string())
        } else {
            None
        };

        Self::VcsFailed {
            operation: operation.to_string(),
            error: stderr.trim().to_string(),
            help,
        }
    }

    /// Whether this error means the pipeline does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PipelineNotFound { .. })
    }
}
