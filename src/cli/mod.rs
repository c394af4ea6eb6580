// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for elt.

pub mod catalog;
pub mod context;
pub mod create;
pub mod delete;
pub mod git;
pub mod list;
mod prompt;
pub mod recommend;
pub mod repo;
pub mod status;
pub mod toggle;
pub mod validate;

pub use context::Context;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::pipeline::Tool;

/// ELT pipeline builder
///
/// Scaffold, list, validate and toggle dlt and Sling pipelines kept in a
/// git repository.
#[derive(Parser, Debug)]
#[clap(
    name = "elt",
    version,
    about = "Scaffold, validate and manage dlt and Sling pipelines in a git repository",
    long_about = None,
    after_help = "Examples:\n\
        elt create gh1 --source github --destination snowflake\n\
        elt create -f request.yaml          Create a pipeline from a request file\n\
        elt list --tool sling               List Sling pipelines\n\
        elt validate                        Check every pipeline in the repository\n\
        elt disable gh1                     Turn a pipeline off\n\n\
        See 'elt <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Pipelines repository (defaults to the last one used, then the current directory)
    #[clap(short = 'C', long, global = true, value_name = "DIR", env = "ELT_REPO_PATH")]
    pub repo_path: Option<PathBuf>,

    /// Settings file
    #[clap(long, global = true, value_name = "FILE", env = "ELT_SETTINGS")]
    pub settings: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new pipeline
    Create(CreateArgs),

    /// Regenerate an existing pipeline from a request file
    Update {
        /// Request file (YAML)
        #[clap(short, long)]
        file: PathBuf,

        /// Do not commit the change to git
        #[clap(long)]
        no_git_commit: bool,
    },

    /// List pipelines
    List {
        /// Only pipelines of this tool
        #[clap(short, long)]
        tool: Option<Tool>,

        /// Only enabled pipelines
        #[clap(long, conflicts_with = "disabled")]
        enabled: bool,

        /// Only disabled pipelines
        #[clap(long)]
        disabled: bool,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show one pipeline
    Show {
        /// Pipeline name
        name: String,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Validate every pipeline in the repository
    Validate {
        /// Output format
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Enable a pipeline
    Enable {
        /// Pipeline name
        name: String,

        /// Do not commit the change to git
        #[clap(long)]
        no_git_commit: bool,
    },

    /// Disable a pipeline
    Disable {
        /// Pipeline name
        name: String,

        /// Do not commit the change to git
        #[clap(long)]
        no_git_commit: bool,
    },

    /// Delete a pipeline
    Delete {
        /// Pipeline name
        name: String,

        /// Skip confirmation
        #[clap(short, long)]
        yes: bool,

        /// Do not commit the change to git
        #[clap(long)]
        no_git_commit: bool,
    },

    /// Show repository status
    Status,

    /// Recommend a tool for a source and destination
    Recommend {
        /// Source type (e.g. github, postgres)
        source: String,

        /// Destination type (e.g. snowflake, duckdb)
        destination: String,
    },

    /// Browse the credential and configuration catalog
    Catalog {
        #[clap(subcommand)]
        action: CatalogAction,
    },

    /// Git operations on the repository
    Git {
        #[clap(subcommand)]
        action: GitAction,
    },

    /// Show or change the remembered repository
    Repo {
        #[clap(subcommand)]
        action: RepoAction,
    },
}

/// Arguments for `elt create`
#[derive(clap::Args, Debug, Default)]
pub struct CreateArgs {
    /// Pipeline name
    pub name: Option<String>,

    /// Request file (YAML); flags given alongside override its values
    #[clap(short, long)]
    pub file: Option<PathBuf>,

    /// Source type
    #[clap(short, long)]
    pub source: Option<String>,

    /// Destination type
    #[clap(short, long)]
    pub destination: Option<String>,

    /// Source configuration value
    #[clap(short, long = "config", value_name = "KEY=VALUE")]
    pub config: Vec<String>,

    /// Description
    #[clap(long)]
    pub description: Option<String>,

    /// Asset group
    #[clap(long)]
    pub group: Option<String>,

    /// Enable a cron schedule
    #[clap(long, value_name = "CRON")]
    pub schedule: Option<String>,

    /// Schedule timezone
    #[clap(long)]
    pub timezone: Option<String>,

    /// Owner (repeatable)
    #[clap(long = "owner")]
    pub owners: Vec<String>,

    /// Tag (repeatable)
    #[clap(long = "tag", value_name = "KEY=VALUE")]
    pub tags: Vec<String>,

    /// Load incrementally on this cursor field
    #[clap(long, value_name = "FIELD")]
    pub incremental: Option<String>,

    /// Initial cursor value for incremental loads
    #[clap(long, requires = "incremental")]
    pub initial_value: Option<String>,

    /// Render the files without writing them
    #[clap(long)]
    pub dry_run: bool,

    /// Do not commit the change to git
    #[clap(long)]
    pub no_git_commit: bool,
}

/// Catalog actions
#[derive(Subcommand, Debug, Clone)]
pub enum CatalogAction {
    /// List known source types
    Sources {
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List known destination types
    Destinations {
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Credential fields for a source and/or destination
    Credentials {
        /// Source type
        #[clap(short, long)]
        source: Option<String>,

        /// Destination type
        #[clap(short, long)]
        destination: Option<String>,

        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Configuration fields for a source
    Config {
        /// Source type
        source: String,

        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Git actions
#[derive(Subcommand, Debug, Clone)]
pub enum GitAction {
    /// Working tree status
    Status,

    /// Unstaged changes
    Diff {
        /// Limit to a pipeline name or path
        target: Option<String>,
    },

    /// Recent commits
    Log {
        /// Number of commits
        #[clap(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Stage and commit everything
    Commit {
        /// Commit message
        #[clap(short, long)]
        message: String,
    },

    /// Push to the remote
    Push,

    /// Pull from the remote
    Pull,

    /// Initialize a repository
    Init,

    /// Add a remote
    RemoteAdd {
        /// Remote URL
        url: String,

        /// Remote name
        #[clap(long, default_value = "origin")]
        name: String,
    },

    /// Clone a repository and remember it
    Clone {
        /// Repository URL
        url: String,

        /// Destination directory
        destination: PathBuf,
    },
}

/// Repository actions
#[derive(Subcommand, Debug, Clone)]
pub enum RepoAction {
    /// Show the repository in use
    Show,

    /// Check a path and remember it as the repository
    Use {
        /// Repository path
        path: PathBuf,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a value as pretty JSON
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> miette::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| miette::miette!("Failed to serialize output: {}", e))?;
    println!("{}", json);
    Ok(())
}
