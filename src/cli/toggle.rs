// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Enable and disable commands

use colored::Colorize;
use miette::Result;

use super::Context;

/// Run the enable/disable command
pub async fn run(ctx: &Context, name: String, enabled: bool, no_git_commit: bool) -> Result<()> {
    let registry = ctx.registry();

    let current = registry.show(&name)?;
    if current.enabled == enabled {
        println!(
            "{}",
            format!(
                "Pipeline '{}' is already {}.",
                name,
                if enabled { "enabled" } else { "disabled" }
            )
            .dimmed()
        );
        return Ok(());
    }

    let location = registry.set_enabled(&name, enabled)?;
    let action = if enabled { "Enable" } else { "Disable" };
    if enabled {
        println!("  {} Enabled {} pipeline: {}", "✓".green(), location.tool, name);
    } else {
        println!("  {} Disabled {} pipeline: {}", "✓".yellow(), location.tool, name);
    }

    ctx.commit_change(
        &[&location.path],
        &format!("{} {} pipeline: {}", action, location.tool, name),
        no_git_commit,
    )
    .await;

    Ok(())
}
