// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Create and update commands - scaffold pipeline definitions

use colored::Colorize;
use miette::Result;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::prompt;
use super::{Context, CreateArgs};
use crate::catalog::{self, FieldDescriptor, FieldType, FieldValue};
use crate::pipeline::{
    select_tool, Partitioning, PipelineGenerator, PipelineRequest, Tool, PIPELINES_DIR,
};

/// Run the create command
pub async fn run(ctx: &Context, args: CreateArgs) -> Result<()> {
    let from_file = args.file.is_some();
    let no_git_commit = args.no_git_commit;
    let dry_run = args.dry_run;
    let mut request = build_request(args)?;

    if prompt::interactive() {
        fill_missing_interactively(&mut request, !from_file)?;
    }
    if request.description.is_none() {
        request.description = Some(format!(
            "Load {} data to {}",
            request.source_type, request.destination_type
        ));
    }

    println!();
    println!("{} {}", "Creating pipeline:".bold(), request.name);
    println!("  Source:      {}", request.source_type);
    println!("  Destination: {}", request.destination_type);

    let generator = PipelineGenerator::new();

    if dry_run {
        request.validate()?;
        let tool = select_tool(&request.source_type, &request.destination_type);
        println!("  Tool:        {} {}", tool, "(auto-selected)".dimmed());
        let artifacts = generator.render(&request, tool)?;
        for (file, contents) in artifacts.files() {
            println!();
            println!("{}", format!("── {} ──", file).cyan());
            print!("{}", contents);
        }
        println!();
        println!("{}", "Dry run: nothing was written.".dimmed());
        return Ok(());
    }

    let location = ctx.registry().create(&request, &generator)?;
    let relative = relative_to(&location.path, &ctx.repo_root);
    println!("  Tool:        {} {}", location.tool, "(auto-selected)".dimmed());
    println!();
    println!("  {} Created {} pipeline: {}", "✓".green(), location.tool, relative.display());

    print_credentials(ctx, &request);

    ctx.commit_change(
        &[&location.path],
        &format!("Add {} pipeline: {}", location.tool, location.name),
        no_git_commit,
    )
    .await;

    println!();
    println!("{}", "Next steps:".bold());
    println!("  1. Set the required credentials in .env or the environment");
    println!("  2. Review and edit: {}/", relative.display());
    println!("  3. Test locally: {}", run_hint(location.tool, &location.name).cyan());

    Ok(())
}

/// Run the update command
pub async fn update(ctx: &Context, file: PathBuf, no_git_commit: bool) -> Result<()> {
    let request = PipelineRequest::from_file(&file)?;
    let location = ctx.registry().update(&request, &PipelineGenerator::new())?;

    println!(
        "  {} Regenerated {} pipeline: {}",
        "✓".green(),
        location.tool,
        relative_to(&location.path, &ctx.repo_root).display()
    );

    ctx.commit_change(
        &[&location.path],
        &format!("Update {} pipeline: {}", location.tool, location.name),
        no_git_commit,
    )
    .await;

    Ok(())
}

/// Merge the request file (if any) with the command-line flags
fn build_request(args: CreateArgs) -> Result<PipelineRequest> {
    let mut request = match &args.file {
        Some(path) => PipelineRequest::from_file(path)?,
        None => PipelineRequest::new(
            args.name.clone().unwrap_or_default(),
            args.source.clone().unwrap_or_default(),
            args.destination.clone().unwrap_or_default(),
        ),
    };

    if let Some(name) = args.name {
        request.name = name;
    }
    if let Some(source) = args.source {
        request.source_type = source;
    }
    if let Some(destination) = args.destination {
        request.destination_type = destination;
    }
    for pair in &args.config {
        let (key, value) = parse_key_value(pair)?;
        request
            .source_configuration
            .insert(key, Value::String(value));
    }
    if args.description.is_some() {
        request.description = args.description;
    }
    if args.group.is_some() {
        request.group_name = args.group;
    }
    if let Some(cron) = args.schedule {
        request.schedule_enabled = true;
        request.cron_schedule = Some(cron);
    }
    if let Some(timezone) = args.timezone {
        request.timezone = timezone;
    }
    request.owners.extend(args.owners);
    for pair in &args.tags {
        let (key, value) = parse_key_value(pair)?;
        request.tags.insert(key, value);
    }
    if let Some(cursor) = args.incremental {
        request.partitioning = Partitioning::incremental(cursor, args.initial_value);
    }

    Ok(request)
}

/// Split `KEY=VALUE`
pub(crate) fn parse_key_value(pair: &str) -> Result<(String, String)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(miette::miette!(
            "Expected KEY=VALUE, got '{}'",
            pair
        )),
    }
}

fn fill_missing_interactively(request: &mut PipelineRequest, configure_source: bool) -> Result<()> {
    if request.name.is_empty() {
        request.name = prompt::ask("Pipeline name")?.unwrap_or_default();
    }
    if request.source_type.is_empty() {
        println!("{} {}", "Sources:".dimmed(), catalog::source_types().join(", ").dimmed());
        request.source_type = prompt::ask("Source type")?.unwrap_or_default();
    }
    if request.destination_type.is_empty() {
        println!(
            "{} {}",
            "Destinations:".dimmed(),
            catalog::destination_types().join(", ").dimmed()
        );
        request.destination_type = prompt::ask("Destination type")?.unwrap_or_default();
    }

    let fields = catalog::source_configuration_fields(&request.source_type);
    if !configure_source || fields.is_empty() {
        return Ok(());
    }

    println!();
    println!("{} {} source", "Configuring".bold(), request.source_type);
    for field in fields {
        if request.source_configuration.contains_key(field.key) {
            continue;
        }
        let supplied = |key: &str| request.config_str(key);
        if !field.is_visible(&supplied) {
            continue;
        }
        if let Some(value) = ask_field(&field)? {
            request
                .source_configuration
                .insert(field.key.to_string(), value);
        }
    }
    Ok(())
}

/// Prompt for one configuration field, falling back to its default
fn ask_field(field: &FieldDescriptor) -> Result<Option<Value>> {
    if let Some(help) = field.help {
        println!("  {}", help.dimmed());
    }

    let mut question = field.label.to_string();
    if field.field_type == FieldType::Multiselect && !field.options.is_empty() {
        let values: Vec<&str> = field.options.iter().map(|o| o.value).collect();
        question = format!("{} ({})", question, values.join(", "));
    }
    if let Some(default) = &field.default {
        question = format!("{} [{}]", question, default);
    } else if !field.required {
        question = format!("{} (optional)", question);
    }

    let answer = prompt::ask(&question)?;
    let value = match (answer, &field.default) {
        (Some(answer), _) => match field.field_type {
            FieldType::Boolean => Value::Bool(catalog::parse_bool(&answer).unwrap_or(false)),
            FieldType::Multiselect => Value::Sequence(
                answer
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| Value::String(s.to_string()))
                    .collect(),
            ),
            _ => Value::String(answer),
        },
        (None, Some(default)) => field_value_to_yaml(default),
        (None, None) => return Ok(None),
    };
    Ok(Some(value))
}

fn field_value_to_yaml(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => Value::String(s.to_string()),
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::List(values) => {
            Value::Sequence(values.iter().map(|v| Value::String(v.to_string())).collect())
        }
    }
}

/// Show the credentials the pipeline needs and which are not yet set
fn print_credentials(ctx: &Context, request: &PipelineRequest) {
    let required =
        catalog::required_credentials(&request.source_type, &request.destination_type);
    if required.source.is_empty() && required.destination.is_empty() {
        return;
    }

    let lookup = credential_lookup(&ctx.repo_root);
    let missing =
        catalog::missing_credentials(&request.source_type, &request.destination_type, &lookup);

    println!();
    println!("{}:", "Required credentials".bold());
    for (title, fields) in [
        (&request.source_type, &required.source),
        (&request.destination_type, &required.destination),
    ] {
        if fields.is_empty() {
            continue;
        }
        println!("  {}", title.cyan());
        for field in fields {
            let marker = if missing.contains(&field.key) {
                "✗".red()
            } else {
                "✓".green()
            };
            println!("    {} {}: {}", marker, field.key, field.label.dimmed());
        }
    }
    if !missing.is_empty() {
        println!(
            "  {} {} required credential(s) not set",
            "⚠".yellow(),
            missing.len()
        );
    }
}

/// Look up credentials in the process environment, then `<repo>/.env`
pub(crate) fn credential_lookup(repo_root: &Path) -> impl Fn(&str) -> Option<String> {
    let dotenv = read_dotenv(&repo_root.join(".env"));
    move |key: &str| std::env::var(key).ok().or_else(|| dotenv.get(key).cloned())
}

/// Entries of a dotenv file, without touching the process environment
///
/// Lines dotenvy cannot parse are skipped.
fn read_dotenv(path: &Path) -> BTreeMap<String, String> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) => {
            if path.exists() {
                warn!("Could not read {}: {}", path.display(), e);
            }
            return BTreeMap::new();
        }
    };

    entries
        .filter_map(|entry| match entry {
            Ok(pair) => Some(pair),
            Err(e) => {
                warn!("Skipping line in {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

pub(crate) fn run_hint(tool: Tool, name: &str) -> String {
    match tool {
        Tool::Dlt => format!("python -m {}.dlt.{}.pipeline", PIPELINES_DIR, name),
        Tool::Sling => format!(
            "sling run -r {}/sling/{}/{}",
            PIPELINES_DIR,
            name,
            tool.artifact_file()
        ),
    }
}

pub(crate) fn relative_to<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_build_request_from_flags() {
        let args = CreateArgs {
            name: Some("gh1".into()),
            source: Some("github".into()),
            destination: Some("snowflake".into()),
            config: vec!["repo_owner=acme".into(), "repo_name = widgets".into()],
            schedule: Some("0 2 * * *".into()),
            tags: vec!["team=data".into()],
            incremental: Some("updated_at".into()),
            ..Default::default()
        };

        let request = build_request(args).unwrap();
        assert_eq!(request.name, "gh1");
        assert_eq!(request.config_str("repo_name").as_deref(), Some("widgets"));
        assert!(request.schedule_enabled);
        assert_eq!(request.cron_schedule.as_deref(), Some("0 2 * * *"));
        assert_eq!(request.tags.get("team").map(String::as_str), Some("data"));
        assert_eq!(request.partitioning.cursor(), Some(("updated_at", None)));
    }

    #[test]
    fn test_flags_override_request_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("request.yaml");
        fs::write(
            &file,
            "name: pg1\nsource_type: postgres\ndestination_type: bigquery\ndescription: From file\n",
        )
        .unwrap();

        let args = CreateArgs {
            file: Some(file),
            destination: Some("snowflake".into()),
            ..Default::default()
        };
        let request = build_request(args).unwrap();
        assert_eq!(request.name, "pg1");
        assert_eq!(request.destination_type, "snowflake");
        assert_eq!(request.description.as_deref(), Some("From file"));
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("a=b=c").unwrap(),
            ("a".to_string(), "b=c".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_credential_lookup_reads_dotenv() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(".env"),
            "# comment\nELT_TEST_ONLY_HOST=\"db.local\"\nexport ELT_TEST_ONLY_USER=etl\n",
        )
        .unwrap();

        let lookup = credential_lookup(temp.path());
        assert_eq!(lookup("ELT_TEST_ONLY_HOST").as_deref(), Some("db.local"));
        assert_eq!(lookup("ELT_TEST_ONLY_USER").as_deref(), Some("etl"));
        assert_eq!(lookup("ELT_TEST_ONLY_MISSING"), None);
    }

    #[test]
    fn test_credential_lookup_strips_inline_comments() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(".env"),
            "ELT_DOTENV_ONLY_PASSWORD= # set me\n\
             ELT_DOTENV_ONLY_HOST=db.local # prod\n\
             ELT_DOTENV_ONLY_QUOTE=abc\"\n",
        )
        .unwrap();

        let lookup = credential_lookup(temp.path());
        assert_eq!(lookup("ELT_DOTENV_ONLY_HOST").as_deref(), Some("db.local"));
        assert!(lookup("ELT_DOTENV_ONLY_PASSWORD")
            .unwrap_or_default()
            .is_empty());
        assert_ne!(lookup("ELT_DOTENV_ONLY_QUOTE").as_deref(), Some("abc"));
    }

    #[test]
    fn test_commented_out_credential_is_missing() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(".env"),
            "ASANA_ACCESS_TOKEN= # paste token\n",
        )
        .unwrap();

        let lookup = credential_lookup(temp.path());
        let missing = catalog::missing_credentials("asana", "duckdb", &lookup);
        assert!(missing.contains(&"ASANA_ACCESS_TOKEN"));
    }

    #[test]
    fn test_run_hint() {
        assert_eq!(run_hint(Tool::Dlt, "gh1"), "python -m pipelines.dlt.gh1.pipeline");
        assert_eq!(
            run_hint(Tool::Sling, "pg1"),
            "sling run -r pipelines/sling/pg1/replication.yaml"
        );
    }
}
