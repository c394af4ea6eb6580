// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! List and show commands

use colored::Colorize;
use miette::Result;
use serde_yaml::Value;

use super::create::{relative_to, run_hint};
use super::{print_json, Context, OutputFormat};
use crate::pipeline::{PipelineInfo, Tool};

/// Run the list command
pub async fn run(
    ctx: &Context,
    tool: Option<Tool>,
    enabled_only: bool,
    disabled_only: bool,
    format: OutputFormat,
) -> Result<()> {
    let enabled = match (enabled_only, disabled_only) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let pipelines = ctx.registry().list(tool, enabled)?;

    if format == OutputFormat::Json {
        return print_json(&pipelines);
    }

    if pipelines.is_empty() {
        println!("{}", "No pipelines found.".dimmed());
        println!("Create one with: {}", "elt create <name> --source <type> --destination <type>".cyan());
        return Ok(());
    }

    let width = pipelines.iter().map(|p| p.name.len()).max().unwrap_or(4).max(4);
    println!(
        "{}",
        format!(
            "{:<width$}  {:<6}  {:<8}  {:<24}  {}",
            "NAME",
            "TOOL",
            "STATUS",
            "SOURCE → DESTINATION",
            "SCHEDULE",
            width = width
        )
        .bold()
    );

    for pipeline in &pipelines {
        let status = if pipeline.enabled {
            format!("{:<8}", "enabled").green()
        } else {
            format!("{:<8}", "disabled").yellow()
        };
        let route = format!("{} → {}", pipeline.source_type, pipeline.destination_type);
        let schedule = if pipeline.is_scheduled() {
            pipeline
                .schedule
                .as_ref()
                .and_then(|s| s.cron_schedule.clone())
                .unwrap_or_default()
        } else {
            "-".to_string()
        };
        println!(
            "{:<width$}  {:<6}  {}  {:<24}  {}",
            pipeline.name,
            pipeline.tool.as_str(),
            status,
            route,
            schedule.dimmed(),
            width = width
        );
    }

    println!();
    let enabled = pipelines.iter().filter(|p| p.enabled).count();
    println!(
        "{} pipeline(s), {} enabled, {} disabled",
        pipelines.len(),
        enabled,
        pipelines.len() - enabled
    );

    Ok(())
}

/// Run the show command
pub async fn show(ctx: &Context, name: String, format: OutputFormat) -> Result<()> {
    let info = ctx.registry().show(&name)?;

    if format == OutputFormat::Json {
        return print_json(&info);
    }

    print_details(ctx, &info);
    Ok(())
}

fn print_details(ctx: &Context, info: &PipelineInfo) {
    println!("{}", info.name.bold());
    println!("{}", "═".repeat(info.name.len().max(40)));
    println!("  Tool:        {}", info.tool);
    println!(
        "  Status:      {}",
        if info.enabled { "enabled".green() } else { "disabled".yellow() }
    );
    println!("  Path:        {}", relative_to(&info.path, &ctx.repo_root).display());
    println!("  Description: {}", info.description);
    println!("  Source:      {}", info.source_type);
    println!("  Destination: {}", info.destination_type);
    if let Some(group) = &info.group {
        println!("  Group:       {}", group);
    }
    if !info.owners.is_empty() {
        println!("  Owners:      {}", info.owners.join(", "));
    }

    if let Some(schedule) = &info.schedule {
        println!();
        println!("{}:", "Schedule".bold());
        println!("  Enabled:  {}", schedule.enabled);
        if let Some(cron) = &schedule.cron_schedule {
            println!("  Cron:     {}", cron);
        }
        if let Some(timezone) = &schedule.timezone {
            println!("  Timezone: {}", timezone);
        }
    }

    println!();
    println!("{}:", "Retry policy".bold());
    println!("  Max retries: {}", info.retry.max_retries);
    println!("  Delay:       {}s", info.retry.delay);
    println!("  Backoff:     {}", info.retry.backoff);
    if let Some(jitter) = &info.retry.jitter {
        println!("  Jitter:      {}", jitter);
    }

    if !info.tags.is_empty() || !info.kinds.is_empty() {
        println!();
        println!("{}:", "Labels".bold());
        for (key, value) in &info.tags {
            println!("  {}={}", key, value);
        }
        if !info.kinds.is_empty() {
            println!("  kinds: {}", info.kinds.join(", "));
        }
    }

    if !info.configuration.is_empty() {
        println!();
        println!("{}:", "Configuration".bold());
        for (key, value) in &info.configuration {
            println!("  {}: {}", key, display_yaml(value));
        }
    }

    println!();
    println!("Run locally: {}", run_hint(info.tool, &info.name).cyan());
}

fn display_yaml(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Sequence(items) => items.iter().map(display_yaml).collect::<Vec<_>>().join(", "),
        Value::Null => "-".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}
