// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! elt - ELT pipeline builder
//!
//! Scaffold, validate and manage dlt and Sling pipelines in a git repository.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use elt_builder::cli::{Cli, Commands, Context};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "elt_builder=debug"
    } else {
        "elt_builder=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Commands that never touch a repository
    match &cli.command {
        Commands::Recommend {
            source,
            destination,
        } => {
            return elt_builder::cli::recommend::run(source.clone(), destination.clone()).await
        }
        Commands::Catalog { action } => {
            return elt_builder::cli::catalog::run(action.clone()).await
        }
        _ => {}
    }

    let ctx = Context::from_cli(&cli)?;

    // Dispatch to command handlers
    match cli.command {
        Commands::Create(args) => elt_builder::cli::create::run(&ctx, args).await,
        Commands::Update {
            file,
            no_git_commit,
        } => elt_builder::cli::create::update(&ctx, file, no_git_commit).await,
        Commands::List {
            tool,
            enabled,
            disabled,
            format,
        } => elt_builder::cli::list::run(&ctx, tool, enabled, disabled, format).await,
        Commands::Show { name, format } => elt_builder::cli::list::show(&ctx, name, format).await,
        Commands::Validate { format } => elt_builder::cli::validate::run(&ctx, format).await,
        Commands::Enable {
            name,
            no_git_commit,
        } => elt_builder::cli::toggle::run(&ctx, name, true, no_git_commit).await,
        Commands::Disable {
            name,
            no_git_commit,
        } => elt_builder::cli::toggle::run(&ctx, name, false, no_git_commit).await,
        Commands::Delete {
            name,
            yes,
            no_git_commit,
        } => elt_builder::cli::delete::run(&ctx, name, yes, no_git_commit).await,
        Commands::Status => elt_builder::cli::status::run(&ctx).await,
        Commands::Git { action } => elt_builder::cli::git::run(&ctx, action).await,
        Commands::Repo { action } => elt_builder::cli::repo::run(&ctx, action).await,
        Commands::Recommend { .. } | Commands::Catalog { .. } => Ok(()),
    }
}
