// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Pipeline registry
//!
//! The registry keeps no state of its own. Every call re-reads the
//! `pipelines/` tree of a repository.

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::descriptor::{CONFIG_FILE, METADATA_FILE};
use super::generator::PipelineGenerator;
use super::request::{is_valid_name, PipelineRequest, RetryBackoff};
use super::scan_namespace;
use super::selector::{select_tool, Tool};
use crate::errors::{EltError, EltResult};

pub const PIPELINES_DIR: &str = "pipelines";

/// Retry settings as read back from disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryInfo {
    pub max_retries: u64,
    pub delay: u64,
    pub backoff: String,
    pub jitter: Option<String>,
}

impl Default for RetryInfo {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: 30,
            backoff: RetryBackoff::Linear.as_str().to_string(),
            jitter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleInfo {
    pub enabled: bool,
    pub cron_schedule: Option<String>,
    pub timezone: Option<String>,
}

/// A pipeline as seen by listing commands
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineInfo {
    pub name: String,
    pub tool: Tool,
    pub path: PathBuf,
    pub enabled: bool,
    pub description: String,
    pub group: Option<String>,
    pub source_type: String,
    pub destination_type: String,
    pub schedule: Option<ScheduleInfo>,
    pub owners: Vec<String>,
    pub tags: BTreeMap<String, String>,
    pub kinds: Vec<String>,
    pub retry: RetryInfo,
    /// Source configuration from `config.yaml`
    pub configuration: BTreeMap<String, Value>,
}

impl PipelineInfo {
    /// Read a pipeline directory, falling back to defaults for anything
    /// missing or unreadable
    pub fn load(dir: &Path, name: &str, tool: Tool) -> Self {
        let metadata = read_lenient(&dir.join(METADATA_FILE));
        let config = read_lenient(&dir.join(CONFIG_FILE));

        let schedule = metadata.get("schedule").filter(|s| s.is_mapping()).map(|s| ScheduleInfo {
            enabled: s.get("enabled").and_then(Value::as_bool).unwrap_or(false),
            cron_schedule: text(s.get("cron_schedule")),
            timezone: text(s.get("timezone")),
        });

        let configuration = config
            .get("configuration")
            .and_then(Value::as_mapping)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), v.clone())))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: name.to_string(),
            tool,
            path: dir.to_path_buf(),
            enabled: metadata.get("enabled").and_then(Value::as_bool).unwrap_or(true),
            description: text(metadata.get("description"))
                .unwrap_or_else(|| "No description".to_string()),
            group: text(metadata.get("group")),
            source_type: text(config.get("source_type")).unwrap_or_else(|| "unknown".to_string()),
            destination_type: text(config.get("destination_type"))
                .unwrap_or_else(|| "unknown".to_string()),
            schedule,
            owners: string_list(metadata.get("owners")),
            tags: metadata
                .get("tags")
                .and_then(Value::as_mapping)
                .map(|m| {
                    m.iter()
                        .filter_map(|(k, v)| Some((text(Some(k))?, text(Some(v))?)))
                        .collect()
                })
                .unwrap_or_default(),
            kinds: string_list(metadata.get("kinds")),
            retry: retry_info(&metadata),
            configuration,
        }
    }

    /// Whether a cron schedule is active
    pub fn is_scheduled(&self) -> bool {
        self.schedule
            .as_ref()
            .map(|s| s.enabled && s.cron_schedule.is_some())
            .unwrap_or(false)
    }
}

fn retry_info(metadata: &Value) -> RetryInfo {
    let defaults = RetryInfo::default();
    match metadata.get("retry_policy").filter(|p| p.is_mapping()) {
        Some(policy) => RetryInfo {
            max_retries: policy
                .get("max_retries")
                .and_then(Value::as_u64)
                .unwrap_or(defaults.max_retries),
            delay: policy.get("delay").and_then(Value::as_u64).unwrap_or(defaults.delay),
            backoff: text(policy.get("backoff")).unwrap_or(defaults.backoff),
            jitter: text(policy.get("jitter")),
        },
        // Older descriptors kept retries at the top level
        None => RetryInfo {
            max_retries: metadata
                .get("retries")
                .and_then(Value::as_u64)
                .unwrap_or(defaults.max_retries),
            delay: metadata
                .get("retry_delay")
                .and_then(Value::as_u64)
                .unwrap_or(defaults.delay),
            ..defaults
        },
    }
}

fn read_lenient(path: &Path) -> Value {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Value::Null,
    };
    match serde_yaml::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring unreadable {}: {}", path.display(), e);
            Value::Null
        }
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.trim().is_empty()).then_some(text)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_sequence)
        .map(|seq| seq.iter().filter_map(|v| text(Some(v))).collect())
        .unwrap_or_default()
}

/// Pipeline counts for one tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolSummary {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
}

/// Pipeline counts for a repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySummary {
    pub dlt: ToolSummary,
    pub sling: ToolSummary,
}

impl RegistrySummary {
    pub fn total(&self) -> usize {
        self.dlt.total + self.sling.total
    }

    pub fn enabled(&self) -> usize {
        self.dlt.enabled + self.sling.enabled
    }

    pub fn disabled(&self) -> usize {
        self.dlt.disabled + self.sling.disabled
    }
}

/// Where a pipeline lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineLocation {
    pub name: String,
    pub tool: Tool,
    pub path: PathBuf,
}

/// Locates, lists, toggles, creates and deletes pipelines in a repository
#[derive(Debug, Clone)]
pub struct PipelineRegistry {
    repo_root: PathBuf,
}

impl PipelineRegistry {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// `<repo>/pipelines`
    pub fn pipelines_root(&self) -> PathBuf {
        self.repo_root.join(PIPELINES_DIR)
    }

    /// `<repo>/pipelines/<tool>/<name>`
    pub fn pipeline_dir(&self, tool: Tool, name: &str) -> PathBuf {
        self.pipelines_root().join(tool.as_str()).join(name)
    }

    /// Find a pipeline by name, dlt namespace first
    pub fn find(&self, name: &str) -> EltResult<PipelineLocation> {
        let mut searched = Vec::new();
        if is_valid_name(name) {
            for tool in Tool::ALL {
                let path = self.pipeline_dir(tool, name);
                if path.is_dir() {
                    return Ok(PipelineLocation {
                        name: name.to_string(),
                        tool,
                        path,
                    });
                }
                searched.push(path);
            }
        }

        Err(EltError::PipelineNotFound {
            name: name.to_string(),
            searched,
        })
    }

    /// All pipelines, optionally filtered by tool and enabled state
    pub fn list(&self, tool: Option<Tool>, enabled: Option<bool>) -> EltResult<Vec<PipelineInfo>> {
        let mut pipelines = Vec::new();
        for namespace in Tool::ALL {
            if tool.is_some_and(|t| t != namespace) {
                continue;
            }
            for (name, dir) in scan_namespace(&self.pipelines_root().join(namespace.as_str()))? {
                let info = PipelineInfo::load(&dir, &name, namespace);
                if enabled.map_or(true, |e| e == info.enabled) {
                    pipelines.push(info);
                }
            }
        }
        debug!("Listed {} pipelines in {}", pipelines.len(), self.repo_root.display());
        Ok(pipelines)
    }

    /// Details of one pipeline
    pub fn show(&self, name: &str) -> EltResult<PipelineInfo> {
        let location = self.find(name)?;
        Ok(PipelineInfo::load(&location.path, &location.name, location.tool))
    }

    /// Pipeline counts per tool
    pub fn summary(&self) -> EltResult<RegistrySummary> {
        let mut summary = RegistrySummary::default();
        for info in self.list(None, None)? {
            let counts = match info.tool {
                Tool::Dlt => &mut summary.dlt,
                Tool::Sling => &mut summary.sling,
            };
            counts.total += 1;
            if info.enabled {
                counts.enabled += 1;
            } else {
                counts.disabled += 1;
            }
        }
        Ok(summary)
    }

    /// Set the `enabled` flag, leaving every other key as it was
    pub fn set_enabled(&self, name: &str, enabled: bool) -> EltResult<PipelineLocation> {
        let location = self.find(name)?;
        let path = location.path.join(METADATA_FILE);
        if !path.exists() {
            return Err(EltError::MetadataMissing {
                path: location.path.clone(),
            });
        }

        let content = fs::read_to_string(&path).map_err(|e| EltError::read_failed(&path, e))?;
        let mut metadata: Mapping = match serde_yaml::from_str::<Option<Mapping>>(&content)? {
            Some(mapping) => mapping,
            None => Mapping::new(),
        };
        metadata.insert(Value::from("enabled"), Value::Bool(enabled));

        let updated = serde_yaml::to_string(&metadata)?;
        fs::write(&path, updated).map_err(|e| EltError::write_failed(&path, e))?;

        info!(
            "{} pipeline {}/{}",
            if enabled { "Enabled" } else { "Disabled" },
            location.tool,
            name
        );
        Ok(location)
    }

    /// Remove a pipeline directory and everything in it
    pub fn delete(&self, name: &str) -> EltResult<PipelineLocation> {
        let location = self.find(name)?;
        fs::remove_dir_all(&location.path)
            .map_err(|e| EltError::write_failed(&location.path, e))?;
        info!("Deleted pipeline {}/{}", location.tool, name);
        Ok(location)
    }

    /// Validate, pick a tool, refuse duplicates, then generate
    pub fn create(
        &self,
        request: &PipelineRequest,
        generator: &PipelineGenerator,
    ) -> EltResult<PipelineLocation> {
        request.validate()?;
        let tool = select_tool(&request.source_type, &request.destination_type);

        match self.find(&request.name) {
            Ok(existing) => {
                return Err(EltError::PipelineExists {
                    name: request.name.clone(),
                    tool: existing.tool.to_string(),
                    path: existing.path,
                })
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let path = self.pipeline_dir(tool, &request.name);
        generator.generate(&path, request, tool)?;
        info!("Created {} pipeline '{}'", tool, request.name);

        Ok(PipelineLocation {
            name: request.name.clone(),
            tool,
            path,
        })
    }

    /// Regenerate an existing pipeline from a new request, in its current
    /// tool namespace
    pub fn update(
        &self,
        request: &PipelineRequest,
        generator: &PipelineGenerator,
    ) -> EltResult<PipelineLocation> {
        request.validate()?;
        let location = self.find(&request.name)?;
        generator.generate(&location.path, request, location.tool)?;
        info!("Regenerated {} pipeline '{}'", location.tool, request.name);
        Ok(location)
    }
}
