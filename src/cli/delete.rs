// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Delete command - remove a pipeline directory

use colored::Colorize;
use miette::Result;

use super::create::relative_to;
use super::{prompt, Context};

/// Run the delete command
pub async fn run(ctx: &Context, name: String, yes: bool, no_git_commit: bool) -> Result<()> {
    let registry = ctx.registry();
    let location = registry.find(&name)?;

    if !yes {
        let question = format!(
            "Delete {} pipeline '{}' ({})?",
            location.tool,
            name,
            relative_to(&location.path, &ctx.repo_root).display()
        );
        if !prompt::confirm(&question)? {
            println!("{}", "Cancelled.".dimmed());
            return Ok(());
        }
    }

    let location = registry.delete(&name)?;
    println!("  {} Deleted {} pipeline: {}", "✓".green(), location.tool, name);

    ctx.commit_change(
        &[&location.path],
        &format!("Delete {} pipeline: {}", location.tool, name),
        no_git_commit,
    )
    .await;

    Ok(())
}
