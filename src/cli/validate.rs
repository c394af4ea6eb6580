// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Validate command - check every pipeline in the repository

use colored::Colorize;
use miette::Result;

use super::{print_json, Context, OutputFormat};
use crate::pipeline::RepositoryValidator;

/// Run the validate command
pub async fn run(ctx: &Context, format: OutputFormat) -> Result<()> {
    let registry = ctx.registry();
    let report = RepositoryValidator::validate(&registry.pipelines_root())?;

    if format == OutputFormat::Json {
        print_json(&report)?;
    } else {
        println!("{}", "Validating pipelines...".bold());
        println!();

        if report.total == 0 {
            println!("{}", "No pipelines found.".dimmed());
            return Ok(());
        }

        if !report.issues.is_empty() {
            println!("{}:", "Issues".red().bold());
            for issue in &report.issues {
                println!("  {} {}", "✗".red(), issue);
            }
            println!();
        }

        println!(
            "  {} valid, {} invalid, {} total",
            report.valid.to_string().green(),
            if report.invalid() > 0 {
                report.invalid().to_string().red()
            } else {
                report.invalid().to_string().normal()
            },
            report.total
        );
        println!();
    }

    if report.is_valid() {
        if format == OutputFormat::Text {
            println!("{}", "All pipelines are valid!".green().bold());
        }
        Ok(())
    } else {
        Err(miette::miette!(
            "Validation failed: {} issue(s) in {} pipeline(s)",
            report.issues.len(),
            report.invalid()
        ))
    }
}
