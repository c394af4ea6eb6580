// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Git command - version control for the pipelines repository

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::{Context, GitAction};
use crate::errors::EltError;
use crate::utils::create_spinner;
use crate::vcs::{GitCli, VersionControl};

/// Run the git command
pub async fn run(ctx: &Context, action: GitAction) -> Result<()> {
    let action = match action {
        GitAction::Clone { url, destination } => return clone(ctx, &url, destination).await,
        other => other,
    };

    let git = GitCli::new(&ctx.repo_root)?;
    if !matches!(action, GitAction::Init) && !git.is_repository() {
        return Err(EltError::NotARepository {
            path: ctx.repo_root.clone(),
        }
        .into());
    }

    match action {
        GitAction::Status => {
            let status = git.status().await?;
            println!(
                "On branch {}",
                status.branch.as_deref().unwrap_or("(detached)").cyan()
            );
            if let Some(upstream) = &status.upstream {
                println!("Tracking {} ({} ahead, {} behind)", upstream, status.ahead, status.behind);
            }
            if status.is_clean() {
                println!("{}", "Working tree clean".green());
            }
            for path in &status.staged {
                println!("  {} {}", "staged   ".green(), path);
            }
            for path in &status.modified {
                println!("  {} {}", "modified ".yellow(), path);
            }
            for path in &status.untracked {
                println!("  {} {}", "untracked".dimmed(), path);
            }
            Ok(())
        }

        GitAction::Diff { target } => {
            let path = match target {
                Some(target) => Some(resolve_target(ctx, &target)),
                None => None,
            };
            let diff = git.diff(path.as_deref()).await?;
            if diff.trim().is_empty() {
                println!("{}", "No changes.".dimmed());
            } else {
                print!("{}", diff);
            }
            Ok(())
        }

        GitAction::Log { limit } => {
            let commits = git.log(limit).await?;
            if commits.is_empty() {
                println!("{}", "No commits yet.".dimmed());
            }
            for commit in &commits {
                println!(
                    "{} {} {}",
                    commit.short_hash().yellow(),
                    commit.message,
                    format!("({}, {})", commit.author, commit.date).dimmed()
                );
            }
            Ok(())
        }

        GitAction::Commit { message } => {
            git.add(&[]).await?;
            let hash = git.commit(&message, &[]).await?;
            println!(
                "  {} Committed {}: {}",
                "✓".green(),
                &hash[..hash.len().min(7)],
                message
            );
            Ok(())
        }

        GitAction::Push => {
            let spinner = create_spinner("Pushing...");
            let result = git.push().await;
            spinner.finish_and_clear();
            result?;
            println!("  {} Pushed to remote", "✓".green());
            Ok(())
        }

        GitAction::Pull => {
            let spinner = create_spinner("Pulling...");
            let result = git.pull().await;
            spinner.finish_and_clear();
            result?;
            println!("  {} Pulled from remote", "✓".green());
            Ok(())
        }

        GitAction::Init => {
            if git.is_repository() {
                println!("{}", "Already a git repository.".dimmed());
                return Ok(());
            }
            git.init().await?;
            println!(
                "  {} Initialized git repository in {}",
                "✓".green(),
                ctx.repo_root.display()
            );
            Ok(())
        }

        GitAction::RemoteAdd { url, name } => {
            git.add_remote(&name, &url).await?;
            println!("  {} Added remote {} → {}", "✓".green(), name, url);
            Ok(())
        }

        GitAction::Clone { .. } => Ok(()),
    }
}

/// A pipeline name resolves to its directory; anything else is a path
fn resolve_target(ctx: &Context, target: &str) -> PathBuf {
    match ctx.registry().find(target) {
        Ok(location) => location.path,
        Err(_) => ctx.repo_root.join(target),
    }
}

async fn clone(ctx: &Context, url: &str, destination: PathBuf) -> Result<()> {
    let spinner = create_spinner(&format!("Cloning {}...", url));
    let result = GitCli::clone_repository(url, &destination).await;
    spinner.finish_and_clear();
    let git = result?;

    println!(
        "  {} Cloned {} into {}",
        "✓".green(),
        url,
        git.root().display()
    );

    if let Some(store) = &ctx.settings {
        store.remember_repository(git.root())?;
        println!("  {} Using {} as the pipelines repository", "✓".green(), git.root().display());
    }
    Ok(())
}
