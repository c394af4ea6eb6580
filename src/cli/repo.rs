// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Repo command - show or change the remembered repository

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::{Context, RepoAction};
use crate::settings::{inspect_repository, RepositoryCheck};

/// Run the repo command
pub async fn run(ctx: &Context, action: RepoAction) -> Result<()> {
    match action {
        RepoAction::Show => {
            let check = inspect_repository(&ctx.repo_root)?;
            println!("{}", ctx.repo_root.display().to_string().bold());
            print_check(&check);
            if let Some(store) = &ctx.settings {
                println!("  Settings: {}", store.path().display().to_string().dimmed());
            }
            Ok(())
        }

        RepoAction::Use { path } => use_repository(ctx, path),
    }
}

fn use_repository(ctx: &Context, path: PathBuf) -> Result<()> {
    let check = inspect_repository(&path)?;
    if !check.valid {
        let reason = check.error.unwrap_or_else(|| "invalid repository".into());
        return Err(miette::miette!("Cannot use {}: {}", path.display(), reason));
    }

    let store = ctx
        .settings
        .as_ref()
        .ok_or_else(|| miette::miette!("No settings file available; pass --settings <FILE>"))?;
    store.remember_repository(&path)?;

    println!("  {} Using {}", "✓".green(), path.display());
    print_check(&check);
    Ok(())
}

fn print_check(check: &RepositoryCheck) {
    if let Some(error) = &check.error {
        println!("  {} {}", "✗".red(), error);
        return;
    }
    if let Some(warning) = &check.warning {
        println!("  {} {}", "⚠".yellow(), warning);
    }
    println!("  Pipelines: {}", check.pipeline_count);
    println!(
        "  Git:       {}",
        if check.has_git { "yes".green() } else { "no".yellow() }
    );
}
