// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Status command - repository and pipeline overview

use colored::Colorize;
use miette::Result;

use super::Context;
use crate::pipeline::ToolSummary;
use crate::settings::inspect_repository;
use crate::utils::create_spinner;
use crate::vcs::{GitCli, VersionControl};

/// Run the status command
pub async fn run(ctx: &Context) -> Result<()> {
    let check = inspect_repository(&ctx.repo_root)?;

    println!("{}", "ELT Repository Status".bold());
    println!("{}", ctx.repo_root.display().to_string().dimmed());
    println!();

    if let Some(error) = &check.error {
        println!("  {} {}", "✗".red(), error);
        return Err(miette::miette!("Not a usable repository: {}", error));
    }

    print_git_status(ctx).await;

    println!();
    if let Some(warning) = &check.warning {
        println!("  {} {}", "⚠".yellow(), warning);
        return Ok(());
    }

    let summary = ctx.registry().summary()?;
    println!(
        "{}",
        format!("{:<8} {:>6} {:>8} {:>9}", "Tool", "Total", "Enabled", "Disabled").bold()
    );
    print_row("dlt", &summary.dlt);
    print_row("sling", &summary.sling);
    println!(
        "{}",
        format!(
            "{:<8} {:>6} {:>8} {:>9}",
            "Total",
            summary.total(),
            summary.enabled(),
            summary.disabled()
        )
        .bold()
    );

    Ok(())
}

fn print_row(tool: &str, counts: &ToolSummary) {
    println!(
        "{:<8} {:>6} {} {}",
        tool.cyan(),
        counts.total,
        format!("{:>8}", counts.enabled).green(),
        if counts.disabled > 0 {
            format!("{:>9}", counts.disabled).yellow()
        } else {
            format!("{:>9}", counts.disabled).dimmed()
        }
    );
}

async fn print_git_status(ctx: &Context) {
    println!("{}:", "Git".bold());

    let git = match GitCli::new(&ctx.repo_root) {
        Ok(git) => git,
        Err(e) => {
            println!("  {} {}", "⚠".yellow(), e);
            return;
        }
    };
    if !git.is_repository() {
        println!("  {} Not a git repository", "⚠".yellow());
        println!("  Initialize with: {}", "elt git init".cyan());
        return;
    }

    let spinner = create_spinner("Reading git status...");
    let status = git.status().await;
    let remotes = git.remotes().await;
    spinner.finish_and_clear();

    let status = match status {
        Ok(status) => status,
        Err(e) => {
            println!("  {} {}", "✗".red(), e);
            return;
        }
    };

    println!(
        "  Branch:  {}",
        status.branch.as_deref().unwrap_or("(detached)").cyan()
    );
    match remotes {
        Ok(remotes) if !remotes.is_empty() => println!("  Remote:  {}", remotes.join(", ")),
        _ => println!("  Remote:  {}", "No remote configured".yellow()),
    }

    if status.is_clean() {
        println!("  Changes: {}", "✓ Working tree clean".green());
    } else {
        let mut parts = Vec::new();
        if !status.staged.is_empty() {
            parts.push(format!("{} staged", status.staged.len()).green().to_string());
        }
        if !status.modified.is_empty() {
            parts.push(format!("{} modified", status.modified.len()).yellow().to_string());
        }
        if !status.untracked.is_empty() {
            parts.push(format!("{} untracked", status.untracked.len()).dimmed().to_string());
        }
        println!("  Changes: {}", parts.join(", "));
    }

    if status.ahead > 0 || status.behind > 0 {
        println!(
            "  Sync:    {} ahead, {} behind",
            status.ahead.to_string().green(),
            status.behind.to_string().yellow()
        );
    }
}
