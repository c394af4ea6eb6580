// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Recommend command - explain which tool a pipeline would use

use colored::Colorize;
use miette::Result;

use crate::catalog;
use crate::pipeline::{select_tool, Tool};

/// Run the recommend command
pub async fn run(source: String, destination: String) -> Result<()> {
    let tool = select_tool(&source, &destination);

    println!("{}", "Tool recommendation".bold());
    println!("{}", "═".repeat(40));
    println!("  {} → {}", source.cyan(), destination.cyan());
    println!();
    println!("  {} {}", "Recommended:".bold(), tool.to_string().green().bold());
    println!("  {}", reason(tool, &source).dimmed());

    let source_tools = catalog::source_tools(&source);
    let destination_tools = catalog::destination_tools(&destination);
    let both: Vec<String> = Tool::ALL
        .iter()
        .filter(|t| source_tools.contains(t) && destination_tools.contains(t))
        .map(Tool::to_string)
        .collect();
    println!("  Supported by: {}", both.join(", "));

    if tool == Tool::Sling {
        let templates = [
            ("source", catalog::connection_string_template(Some(&source), None)),
            ("target", catalog::connection_string_template(None, Some(&destination))),
        ];
        if templates.iter().any(|(_, t)| !t.is_empty()) {
            println!();
            println!("{}:", "Connection strings".bold());
            for (role, template) in templates.iter().filter(|(_, t)| !t.is_empty()) {
                println!("  {:<7} {}", role, template.cyan());
            }
        }
    }

    let required = catalog::required_credentials(&source, &destination);
    if !required.keys().is_empty() {
        println!();
        println!("{}:", "Credentials".bold());
        for field in required.source.iter().chain(required.destination.iter()) {
            let marker = if field.required { "*" } else { " " };
            println!("  {}{} {}", field.key, marker.red(), field.label.dimmed());
        }
    }

    Ok(())
}

fn reason(tool: Tool, source: &str) -> String {
    match tool {
        Tool::Dlt if catalog::source_tools(source).contains(&Tool::Sling) => {
            format!("{} is best served by dlt", source)
        }
        Tool::Dlt => format!("{} is an API, file or unknown source; dlt handles it in Python", source),
        Tool::Sling => format!(
            "{} is a database; Sling replicates it declaratively",
            source
        ),
    }
}
