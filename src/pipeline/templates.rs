// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Program and README templates
//!
//! dlt pipelines are Python modules exposing `run(partition_key)`. Every value
//! taken from the request goes through [`py_str`] before it lands in code.

use serde_yaml::Value;

use super::request::PipelineRequest;
use super::selector::Tool;

const ENTRY_POINT: &str = r#"if __name__ == "__main__":
    import sys
    partition = sys.argv[1] if len(sys.argv) > 1 else None
    run(partition_key=partition)
"#;

/// Quote `value` as a Python string literal
pub fn py_str(value: &str) -> String {
    // A JSON string literal is also a valid Python one
    serde_json::Value::String(value.to_string()).to_string()
}

/// Make `text` safe inside a triple-quoted docstring
fn docstring(text: &str) -> String {
    text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"")
}

/// Make `text` safe inside a single-line `#` comment
fn comment(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

fn header(request: &PipelineRequest, default_description: String) -> String {
    let description = request
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(str::to_string)
        .unwrap_or(default_description);
    format!(
        "\"\"\"dlt pipeline: {}\n\n{}\n\"\"\"\n",
        docstring(&request.name),
        docstring(&description)
    )
}

fn pipeline_block(request: &PipelineRequest, dataset_name: &str) -> String {
    format!(
        r#"    pipeline = dlt.pipeline(
        pipeline_name={},
        destination={},
        dataset_name={},
    )
"#,
        py_str(&request.name),
        py_str(&request.destination_type),
        py_str(dataset_name)
    )
}

fn run_block(request: &PipelineRequest, data: &str, table_name: Option<&str>) -> String {
    let table = table_name
        .map(|t| format!("        table_name={},\n", py_str(t)))
        .unwrap_or_default();
    format!(
        r#"    info = pipeline.run(
        {data},
{table}        write_disposition={},
        loader_file_format={},
    )

    print(f"Pipeline completed: {{info}}")
    return info
"#,
        py_str(request.write_disposition.as_str()),
        py_str(&request.file_format),
    )
}

/// Render `pipeline.py` for a dlt pipeline
pub fn render_program(request: &PipelineRequest) -> String {
    match request.source_type.to_lowercase().as_str() {
        "github" => github(request),
        "rest_api" => rest_api(request),
        _ => generic(request),
    }
}

fn github(request: &PipelineRequest) -> String {
    let (owner, repo) = github_repository(request);
    let resources = request
        .config_list("resources")
        .unwrap_or_else(|| vec!["issues".to_string(), "pull_requests".to_string()]);
    let resource_list = resources
        .iter()
        .map(|r| py_str(r))
        .collect::<Vec<_>>()
        .join(", ");
    let dataset = request.dataset_name(format!("github_{}_{}", owner, repo));

    format!(
        r#"{header}
import dlt
from dlt.sources.github import github_reactions


def run(partition_key: str = None):
    """Run the GitHub pipeline."""
{pipeline}
    # The access token is read from the GITHUB_TOKEN environment variable
    source = github_reactions(
        owner={owner},
        name={repo},
        items_per_page=100,
        max_items=None,
    )

    resources_to_load = [{resource_list}]
    source = source.with_resources(*resources_to_load)

{run}

{entry}"#,
        header = header(
            request,
            format!("Load GitHub data from {}/{} to {}", owner, repo, request.destination_type)
        ),
        pipeline = pipeline_block(request, &dataset),
        owner = py_str(&owner),
        repo = py_str(&repo),
        run = run_block(request, "source", None),
        entry = ENTRY_POINT,
    )
}

/// `(owner, repo)` from `repo_owner`/`repo_name`, else the first `repos` entry
fn github_repository(request: &PipelineRequest) -> (String, String) {
    let from_repos = request
        .config_list("repos")
        .and_then(|repos| repos.into_iter().next())
        .and_then(|first| {
            first
                .split_once('/')
                .map(|(o, r)| (o.trim().to_string(), r.trim().to_string()))
        });

    let owner = request
        .config_str("repo_owner")
        .or_else(|| from_repos.as_ref().map(|(o, _)| o.clone()))
        .unwrap_or_else(|| "REPO_OWNER".to_string());
    let repo = request
        .config_str("repo_name")
        .or_else(|| from_repos.map(|(_, r)| r))
        .unwrap_or_else(|| "REPO_NAME".to_string());

    (owner, repo)
}

fn rest_api(request: &PipelineRequest) -> String {
    if request.config_flag("advanced_mode") {
        if let Some(raw) = request.config_str("advanced_config") {
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(config) => return rest_api_advanced(request, &config),
                Err(e) => {
                    tracing::warn!(
                        "Invalid advanced_config JSON for '{}', using simple mode: {}",
                        request.name,
                        e
                    );
                }
            }
        }
    }
    rest_api_simple(request)
}

fn paginator(pagination_type: &str) -> &'static str {
    match pagination_type {
        "none" => "None",
        "offset" => {
            r#"dlt.sources.helpers.rest_client.paginators.OffsetPaginator(
                    limit=100,
                    offset_param="offset",
                    limit_param="limit",
                )"#
        }
        // Cursor APIs usually hand back the next page URL in the body
        "cursor" | "json_link" => {
            r#"dlt.sources.helpers.rest_client.paginators.JSONLinkPaginator(
                    next_url_path="next",
                )"#
        }
        _ => r#""auto""#,
    }
}

fn rest_api_simple(request: &PipelineRequest) -> String {
    let base_url = request
        .config_str("base_url")
        .unwrap_or_else(|| "https://api.example.com".to_string());
    let resource = request
        .config_str("resource_name")
        .unwrap_or_else(|| "data".to_string());
    let endpoint = request
        .config_str("endpoint")
        .unwrap_or_else(|| "/data".to_string());
    let method = request
        .config_str("http_method")
        .unwrap_or_else(|| "GET".to_string());
    let pagination = request
        .config_str("pagination_type")
        .unwrap_or_else(|| "auto".to_string());
    let data_selector = request
        .config_str("data_selector")
        .map(|s| py_str(&s))
        .unwrap_or_else(|| "None".to_string());
    let dataset = request.dataset_name(format!("{}_data", resource));

    let incremental = match request.partitioning.cursor() {
        Some((cursor_field, initial_value)) => {
            let initial = initial_value
                .map(|v| format!("\n                    \"initial_value\": {},", py_str(v)))
                .unwrap_or_default();
            format!(
                "\n                \"incremental\": {{\n                    \"cursor_path\": {},{}\n                }},",
                py_str(cursor_field),
                initial
            )
        }
        None => String::new(),
    };
    let incremental_note = if request.partitioning.cursor().is_some() {
        "\nThis pipeline loads incrementally and runs as partitioned assets.\n"
    } else {
        ""
    };

    format!(
        r#"{header}{incremental_note}
import dlt
from dlt.sources.rest_api import rest_api_source


def run(partition_key: str = None):
    """Run the REST API pipeline.

    Args:
        partition_key: Partition key for partitioned assets (e.g. "2024-01-01")
    """
{pipeline}
    source = rest_api_source({{
        "client": {{
            "base_url": {base_url},
        }},
        "resources": [
            {{
                "name": {resource},
                "endpoint": {{
                    "path": {endpoint},
                    "method": {method},
                    "paginator": {paginator},
                    "data_selector": {data_selector},
                }},{incremental}
            }}
        ],
    }})

{run}

{entry}"#,
        header = header(
            request,
            format!("Load data from REST API to {}", request.destination_type)
        ),
        pipeline = pipeline_block(request, &dataset),
        base_url = py_str(&base_url),
        resource = py_str(&resource),
        endpoint = py_str(&endpoint),
        method = py_str(&method),
        paginator = paginator(&pagination),
        run = run_block(request, "source", None),
        entry = ENTRY_POINT,
    )
}

fn rest_api_advanced(request: &PipelineRequest, config: &serde_json::Value) -> String {
    let resource = config
        .get("resources")
        .and_then(|r| r.get(0))
        .and_then(|r| r.get("name"))
        .and_then(|n| n.as_str())
        .map(str::to_string)
        .or_else(|| request.config_str("resource_name"))
        .unwrap_or_else(|| "data".to_string());
    let dataset = request.dataset_name(format!("{}_data", resource));

    // Embedded as a JSON string so true/false/null stay valid Python
    let pretty = serde_json::to_string_pretty(config).unwrap_or_else(|_| config.to_string());

    format!(
        r#"{header}
import json

import dlt
from dlt.sources.rest_api import rest_api_source

CONFIG = json.loads({config})


def run(partition_key: str = None):
    """Run the REST API pipeline (advanced configuration)."""
{pipeline}
    source = rest_api_source(CONFIG)

{run}

{entry}"#,
        header = header(
            request,
            format!("Load data from REST API to {}", request.destination_type)
        ),
        config = py_str(&pretty),
        pipeline = pipeline_block(request, &dataset),
        run = run_block(request, "source", None),
        entry = ENTRY_POINT,
    )
}

fn generic(request: &PipelineRequest) -> String {
    let source = &request.source_type;
    let dataset = request.dataset_name(format!("{}_data", source));
    let table = request.table_name(&format!("{}_data", source));
    let configuration =
        serde_json::to_string(&request.source_configuration).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"{header}
import dlt


def run(partition_key: str = None):
    """Run the pipeline."""
{pipeline}
    # Replace the placeholder below with a {source_comment} source.
    # Verified sources: https://dlthub.com/docs/dlt-ecosystem/verified-sources
    # Configuration: {configuration}
    data = [{{"id": 1, "partition": partition_key, "source": {source}}}]

{run}

{entry}"#,
        header = header(
            request,
            format!("Load data from {} to {}", source, request.destination_type)
        ),
        pipeline = pipeline_block(request, &dataset),
        source_comment = comment(source),
        configuration = comment(&configuration),
        source = py_str(source),
        run = run_block(request, "data", Some(&table)),
        entry = ENTRY_POINT,
    )
}

/// Render `README.md`
pub fn render_readme(request: &PipelineRequest, tool: Tool) -> String {
    let description = request
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "{} pipeline from {} to {}",
                tool.as_str().to_uppercase(),
                request.source_type,
                request.destination_type
            )
        });

    let configuration = if request.source_configuration.is_empty() {
        "No additional configuration".to_string()
    } else {
        request
            .source_configuration
            .iter()
            .map(|(key, value)| format!("- **{}**: {}", key, display_value(value)))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let run_command = match tool {
        Tool::Dlt => format!("python -m pipelines.dlt.{}.pipeline", request.name),
        Tool::Sling => format!("sling run -r pipelines/sling/{}/replication.yaml", request.name),
    };

    format!(
        r#"# {name}

{description}

## Source
- **Type**: {source}

### Configuration
{configuration}

## Destination
- **Type**: {destination}

## Run Locally

```bash
{run_command}
```

## Environment Variables

See your .env file for required credentials.
"#,
        name = request.name,
        source = request.source_type,
        destination = request.destination_type,
    )
}

/// Render a configuration value for humans
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.replace('\n', " "),
        Value::Sequence(seq) => seq.iter().map(display_value).collect::<Vec<_>>().join(", "),
        Value::Mapping(_) | Value::Tagged(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
