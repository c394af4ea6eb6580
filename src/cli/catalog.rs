// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Catalog command - browse credential and configuration fields

use colored::Colorize;
use miette::Result;
use serde::Serialize;

use super::{print_json, CatalogAction, OutputFormat};
use crate::catalog::{self, FieldDescriptor};
use crate::pipeline::Tool;

#[derive(Serialize)]
struct TypeEntry {
    name: &'static str,
    tools: Vec<Tool>,
}

/// Run the catalog command
pub async fn run(action: CatalogAction) -> Result<()> {
    match action {
        CatalogAction::Sources { format } => {
            let entries: Vec<TypeEntry> = catalog::source_types()
                .into_iter()
                .map(|name| TypeEntry {
                    name,
                    tools: catalog::source_tools(name),
                })
                .collect();
            print_types("Sources", &entries, format)
        }

        CatalogAction::Destinations { format } => {
            let entries: Vec<TypeEntry> = catalog::destination_types()
                .into_iter()
                .map(|name| TypeEntry {
                    name,
                    tools: catalog::destination_tools(name),
                })
                .collect();
            print_types("Destinations", &entries, format)
        }

        CatalogAction::Credentials {
            source,
            destination,
            format,
        } => {
            if source.is_none() && destination.is_none() {
                return Err(miette::miette!(
                    "Give --source and/or --destination to list credentials"
                ));
            }
            let required = catalog::required_credentials(
                source.as_deref().unwrap_or(""),
                destination.as_deref().unwrap_or(""),
            );

            if format == OutputFormat::Json {
                return print_json(&required);
            }

            if let Some(source) = &source {
                print_fields(&format!("Source credentials ({})", source), &required.source);
            }
            if let Some(destination) = &destination {
                print_fields(
                    &format!("Destination credentials ({})", destination),
                    &required.destination,
                );
            }
            Ok(())
        }

        CatalogAction::Config { source, format } => {
            let fields = catalog::source_configuration_fields(&source);
            if format == OutputFormat::Json {
                return print_json(&fields);
            }
            print_fields(&format!("Configuration ({})", source), &fields);
            Ok(())
        }
    }
}

fn print_types(title: &str, entries: &[TypeEntry], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&entries);
    }

    println!("{}", title.bold());
    println!("{}", "═".repeat(40));
    for entry in entries {
        let tools: Vec<&str> = entry.tools.iter().map(|t| t.as_str()).collect();
        println!("  {:<20} {}", entry.name, tools.join(", ").dimmed());
    }
    Ok(())
}

fn print_fields(title: &str, fields: &[FieldDescriptor]) {
    println!();
    println!("{}:", title.bold());
    if fields.is_empty() {
        println!("  {}", "(none)".dimmed());
        return;
    }

    for field in fields {
        let required = if field.required { " *".red().to_string() } else { String::new() };
        let mut extra = Vec::new();
        if let Some(default) = &field.default {
            extra.push(format!("default: {}", default));
        }
        if let Some(cond) = &field.show_if {
            extra.push(format!("when {} = {}", cond.field, cond.equals));
        }
        if !field.options.is_empty() {
            let values: Vec<&str> = field.options.iter().map(|o| o.value).collect();
            extra.push(format!("one of: {}", values.join(", ")));
        }

        println!("  {}{}  {}", field.key.cyan(), required, field.label);
        if !extra.is_empty() {
            println!("      {}", extra.join("; ").dimmed());
        }
        if let Some(help) = field.help {
            println!("      {}", help.dimmed());
        }
    }
}
