// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Repository validation
//!
//! Walks `pipelines/<tool>/<name>/` and reports structural problems. A
//! malformed pipeline is a result, not an error: every problem becomes one
//! issue and the scan moves on.

use serde::Serialize;
use serde_yaml::Value;
use std::fmt;
use std::path::Path;

use super::descriptor::METADATA_FILE;
use super::scan_namespace;
use super::selector::Tool;
use crate::errors::EltResult;

/// Text that marks a dlt program's entry point
const ENTRY_POINT_MARKER: &str = "def run(";

/// One problem with one pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub tool: Tool,
    pub pipeline: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}", self.tool, self.pipeline, self.message)
    }
}

/// Outcome of validating every pipeline in a repository
#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub total: usize,
    pub valid: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Pipelines with at least one issue
    pub fn invalid(&self) -> usize {
        self.total - self.valid
    }

    /// Issues rendered as `tool/name: message`
    pub fn issue_strings(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

/// Repository validator
pub struct RepositoryValidator;

impl RepositoryValidator {
    /// Validate every pipeline under `pipelines_root`
    ///
    /// A missing root or namespace directory yields an empty report.
    pub fn validate(pipelines_root: &Path) -> EltResult<ValidationReport> {
        let mut report = ValidationReport::default();

        for tool in Tool::ALL {
            for (name, dir) in scan_namespace(&pipelines_root.join(tool.as_str()))? {
                report.total += 1;
                let messages = Self::validate_pipeline(&dir, tool);
                if messages.is_empty() {
                    report.valid += 1;
                }
                report
                    .issues
                    .extend(messages.into_iter().map(|message| ValidationIssue {
                        tool,
                        pipeline: name.clone(),
                        message,
                    }));
            }
        }

        tracing::debug!(
            "Validated {} pipelines, {} issues",
            report.total,
            report.issues.len()
        );
        Ok(report)
    }

    /// Problems with a single pipeline directory
    pub fn validate_pipeline(dir: &Path, tool: Tool) -> Vec<String> {
        let mut issues = Vec::new();
        Self::validate_metadata(dir, &mut issues);
        match tool {
            Tool::Dlt => Self::validate_program(dir, &mut issues),
            Tool::Sling => Self::validate_replication(dir, &mut issues),
        }
        issues
    }

    fn validate_metadata(dir: &Path, issues: &mut Vec<String>) {
        let metadata = match read_yaml(dir, METADATA_FILE, issues) {
            Some(value) => value,
            None => return,
        };

        if !is_present(metadata.get("description")) {
            issues.push(format!("Missing description in {}", METADATA_FILE));
        }

        if let Some(schedule) = metadata.get("schedule") {
            let enabled = schedule.get("enabled").and_then(Value::as_bool).unwrap_or(false);
            if enabled && !is_present(schedule.get("cron_schedule")) {
                issues.push("Schedule enabled but no cron_schedule defined".to_string());
            }
        }
    }

    fn validate_program(dir: &Path, issues: &mut Vec<String>) {
        let file = Tool::Dlt.artifact_file();
        let path = dir.join(file);
        if !path.exists() {
            issues.push(format!("Missing {}", file));
            return;
        }

        match std::fs::read_to_string(&path) {
            Ok(content) if !content.contains(ENTRY_POINT_MARKER) => {
                issues.push(format!("{} missing run() function", file));
            }
            Ok(_) => {}
            Err(e) => issues.push(format!("Could not read {} - {}", file, e)),
        }
    }

    fn validate_replication(dir: &Path, issues: &mut Vec<String>) {
        let file = Tool::Sling.artifact_file();
        let replication = match read_yaml(dir, file, issues) {
            Some(value) => value,
            None => return,
        };

        for key in ["source", "target", "streams"] {
            if !is_present(replication.get(key)) {
                issues.push(format!("Missing '{}' in {}", key, file));
            }
        }
    }
}

/// Parse `dir/file`, recording missing, unreadable, invalid or empty files
fn read_yaml(dir: &Path, file: &str, issues: &mut Vec<String>) -> Option<Value> {
    let path = dir.join(file);
    if !path.exists() {
        issues.push(format!("Missing {}", file));
        return None;
    }

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            issues.push(format!("Could not read {} - {}", file, e));
            return None;
        }
    };

    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) if is_present(Some(&value)) => Some(value),
        Ok(_) => {
            issues.push(format!("Empty {}", file));
            None
        }
        Err(e) => {
            issues.push(format!("Invalid YAML in {} - {}", file, e));
            None
        }
    }
}

/// Whether a YAML value is set and non-empty
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Sequence(seq)) => !seq.is_empty(),
        Some(Value::Mapping(map)) => !map.is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{PipelineGenerator, PipelineRequest};
    use std::fs;
    use tempfile::TempDir;

    fn described(name: &str, source: &str, destination: &str) -> PipelineRequest {
        let mut request = PipelineRequest::new(name, source, destination);
        request.description = Some(format!("{} pipeline", name));
        request
    }

    fn repo_with(requests: &[(PipelineRequest, Tool)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        let generator = PipelineGenerator::new();
        for (request, tool) in requests {
            let dir = temp.path().join("pipelines").join(tool.as_str()).join(&request.name);
            generator.generate(&dir, request, *tool).unwrap();
        }
        temp
    }

    #[test]
    fn test_well_formed_pipelines_pass() {
        let temp = repo_with(&[
            (described("gh1", "github", "snowflake"), Tool::Dlt),
            (
                described("pg1", "postgres", "bigquery").with_config("tables", "users,orders"),
                Tool::Sling,
            ),
        ]);

        let report = RepositoryValidator::validate(&temp.path().join("pipelines")).unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.valid, 2);
        assert!(report.is_valid(), "{:?}", report.issue_strings());
    }

    #[test]
    fn test_missing_streams_is_flagged() {
        let temp = repo_with(&[(described("pg1", "postgres", "bigquery"), Tool::Sling)]);
        let replication = temp.path().join("pipelines/sling/pg1/replication.yaml");
        fs::write(&replication, "source: POSTGRES\ntarget: BIGQUERY\n").unwrap();

        let report = RepositoryValidator::validate(&temp.path().join("pipelines")).unwrap();
        assert_eq!(
            report.issue_strings(),
            vec!["sling/pg1: Missing 'streams' in replication.yaml".to_string()]
        );
        assert_eq!(report.invalid(), 1);
    }

    #[test]
    fn test_missing_entry_point_is_flagged() {
        let temp = repo_with(&[(described("gh1", "github", "snowflake"), Tool::Dlt)]);
        fs::write(temp.path().join("pipelines/dlt/gh1/pipeline.py"), "import dlt\n").unwrap();

        let report = RepositoryValidator::validate(&temp.path().join("pipelines")).unwrap();
        assert_eq!(
            report.issue_strings(),
            vec!["dlt/gh1: pipeline.py missing run() function".to_string()]
        );
    }

    #[test]
    fn test_metadata_checks() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("pipelines/dlt/broken");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("dagster.yaml"), "enabled: true\nschedule:\n  enabled: true\n").unwrap();

        let issues = RepositoryValidator::validate_pipeline(&dir, Tool::Dlt);
        assert_eq!(
            issues,
            vec![
                "Missing description in dagster.yaml".to_string(),
                "Schedule enabled but no cron_schedule defined".to_string(),
                "Missing pipeline.py".to_string(),
            ]
        );

        fs::write(dir.join("dagster.yaml"), "").unwrap();
        let issues = RepositoryValidator::validate_pipeline(&dir, Tool::Dlt);
        assert_eq!(issues[0], "Empty dagster.yaml");

        fs::write(dir.join("dagster.yaml"), "enabled: [unclosed").unwrap();
        let issues = RepositoryValidator::validate_pipeline(&dir, Tool::Dlt);
        assert!(issues[0].starts_with("Invalid YAML in dagster.yaml - "));
    }

    #[test]
    fn test_missing_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("pipelines/sling/empty");
        fs::create_dir_all(&dir).unwrap();

        let issues = RepositoryValidator::validate_pipeline(&dir, Tool::Sling);
        assert_eq!(issues, vec!["Missing dagster.yaml", "Missing replication.yaml"]);
    }

    #[test]
    fn test_missing_root_is_empty_report() {
        let temp = TempDir::new().unwrap();
        let report = RepositoryValidator::validate(&temp.path().join("pipelines")).unwrap();
        assert_eq!(report.total, 0);
        assert!(report.is_valid());
    }
}
