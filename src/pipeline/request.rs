// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Pipeline request model
//!
//! A `PipelineRequest` is everything needed to generate one pipeline. It can be
//! built in code or loaded from a YAML request file.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::errors::{EltError, EltResult};

const MAX_NAME_LEN: usize = 100;

/// Configuration record for a pipeline to be generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRequest {
    /// Pipeline name, also its directory name
    pub name: String,

    pub source_type: String,

    pub destination_type: String,

    /// Source-specific settings; shape depends on the source type
    #[serde(default)]
    pub source_configuration: BTreeMap<String, Value>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub group_name: Option<String>,

    #[serde(default)]
    pub schedule_enabled: bool,

    #[serde(default)]
    pub cron_schedule: Option<String>,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub partitioning: Partitioning,

    #[serde(default)]
    pub owners: Vec<String>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub kinds: Vec<String>,

    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Seconds between retries
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u32,

    #[serde(default)]
    pub retry_backoff: RetryBackoff,

    #[serde(default)]
    pub retry_jitter: Option<RetryJitter>,

    #[serde(default)]
    pub write_disposition: WriteDisposition,

    /// Loader file format for file-based destinations
    #[serde(default = "default_file_format")]
    pub file_format: String,

    #[serde(default = "default_compression")]
    pub compression: String,

    #[serde(default)]
    pub table_prefix: Option<String>,

    #[serde(default)]
    pub table_suffix: Option<String>,

    /// Replaces the computed dataset name
    #[serde(default)]
    pub schema_override: Option<String>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay() -> u32 {
    30
}

fn default_file_format() -> String {
    "parquet".to_string()
}

fn default_compression() -> String {
    "gzip".to_string()
}

fn default_frequency() -> String {
    "@daily".to_string()
}

/// Partitioning mode; exactly one is active
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Partitioning {
    #[default]
    Disabled,

    /// Time windows
    Time {
        #[serde(default)]
        start: Option<String>,
        #[serde(default)]
        cron: Option<String>,
    },

    /// An explicit list of partition keys
    Static { keys: Vec<String> },

    /// Cursor-based incremental loading; implies daily time partitions
    Incremental {
        cursor_field: String,
        #[serde(default)]
        initial_value: Option<String>,
        #[serde(default = "default_frequency")]
        frequency: String,
    },
}

impl Partitioning {
    /// Incremental partitioning on `cursor_field` with the default cadence
    pub fn incremental(cursor_field: impl Into<String>, initial_value: Option<String>) -> Self {
        Partitioning::Incremental {
            cursor_field: cursor_field.into(),
            initial_value,
            frequency: default_frequency(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Partitioning::Disabled)
    }

    /// The cursor field when incremental loading is on
    pub fn cursor(&self) -> Option<(&str, Option<&str>)> {
        match self {
            Partitioning::Incremental {
                cursor_field,
                initial_value,
                ..
            } => Some((cursor_field.as_str(), initial_value.as_deref())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RetryBackoff {
    #[default]
    Linear,
    Exponential,
}

impl RetryBackoff {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryBackoff::Linear => "LINEAR",
            RetryBackoff::Exponential => "EXPONENTIAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetryJitter {
    Full,
    PlusMinus,
}

impl RetryJitter {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryJitter::Full => "FULL",
            RetryJitter::PlusMinus => "PLUS_MINUS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteDisposition {
    #[default]
    Append,
    Replace,
    Merge,
}

impl WriteDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteDisposition::Append => "append",
            WriteDisposition::Replace => "replace",
            WriteDisposition::Merge => "merge",
        }
    }
}

fn name_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").ok())
        .as_ref()
}

/// Whether `name` is usable as a pipeline directory name
pub fn is_valid_name(name: &str) -> bool {
    name.len() <= MAX_NAME_LEN && name_pattern().is_some_and(|re| re.is_match(name))
}

impl PipelineRequest {
    /// A request with every optional field at its default
    pub fn new(
        name: impl Into<String>,
        source_type: impl Into<String>,
        destination_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_type: source_type.into(),
            destination_type: destination_type.into(),
            source_configuration: BTreeMap::new(),
            description: None,
            group_name: None,
            schedule_enabled: false,
            cron_schedule: None,
            timezone: default_timezone(),
            partitioning: Partitioning::Disabled,
            owners: Vec::new(),
            tags: BTreeMap::new(),
            kinds: Vec::new(),
            retries: default_retries(),
            retry_delay: default_retry_delay(),
            retry_backoff: RetryBackoff::default(),
            retry_jitter: None,
            write_disposition: WriteDisposition::default(),
            file_format: default_file_format(),
            compression: default_compression(),
            table_prefix: None,
            table_suffix: None,
            schema_override: None,
        }
    }

    /// Load a request from a YAML file
    pub fn from_file(path: &Path) -> EltResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EltError::read_failed(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse a request from YAML
    pub fn from_yaml(yaml: &str) -> EltResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Set a string entry in the source configuration
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.source_configuration
            .insert(key.into(), Value::String(value.into()));
        self
    }

    /// Check the invariants a request must hold before generation
    pub fn validate(&self) -> EltResult<()> {
        if self.name.trim().is_empty() {
            return Err(EltError::invalid_request("pipeline name is empty"));
        }
        if !is_valid_name(&self.name) {
            return Err(EltError::InvalidRequest {
                reason: format!("'{}' is not a valid pipeline name", self.name),
                help: Some(format!(
                    "Use letters, digits, '_' and '-', start with a letter or '_', at most {} characters",
                    MAX_NAME_LEN
                )),
            });
        }
        if self.source_type.trim().is_empty() {
            return Err(EltError::invalid_request("source type is empty"));
        }
        if self.destination_type.trim().is_empty() {
            return Err(EltError::invalid_request("destination type is empty"));
        }
        if self.timezone.trim().is_empty() {
            return Err(EltError::invalid_request("timezone is empty"));
        }

        match &self.partitioning {
            Partitioning::Incremental { cursor_field, .. } if cursor_field.trim().is_empty() => {
                Err(EltError::InvalidRequest {
                    reason: "incremental loading needs a cursor field".into(),
                    help: Some("Set partitioning.cursor_field, e.g. 'updated_at'".into()),
                })
            }
            Partitioning::Static { keys } if keys.is_empty() => Err(EltError::invalid_request(
                "static partitioning needs at least one partition key",
            )),
            _ => Ok(()),
        }
    }

    /// `schema_override` if set, else `default`
    pub fn dataset_name(&self, default: impl Into<String>) -> String {
        match self.schema_override.as_deref() {
            Some(schema) if !schema.trim().is_empty() => schema.to_string(),
            _ => default.into(),
        }
    }

    /// Apply the table prefix and suffix to `base`
    pub fn table_name(&self, base: &str) -> String {
        format!(
            "{}{}{}",
            self.table_prefix.as_deref().unwrap_or(""),
            base,
            self.table_suffix.as_deref().unwrap_or("")
        )
    }

    /// A scalar configuration value as text; blank values count as absent
    pub fn config_str(&self, key: &str) -> Option<String> {
        let text = match self.source_configuration.get(key)? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// A list value, given either as a sequence or a comma-separated string
    pub fn config_list(&self, key: &str) -> Option<Vec<String>> {
        let items: Vec<String> = match self.source_configuration.get(key)? {
            Value::Sequence(seq) => seq
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Value::String(s) => s.split(',').map(str::to_string).collect(),
            _ => return None,
        };

        let items: Vec<String> = items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }

    /// A boolean flag; accepts YAML booleans and common spellings
    pub fn config_flag(&self, key: &str) -> bool {
        match self.source_configuration.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => crate::catalog::parse_bool(s).unwrap_or(false),
            Some(Value::Number(n)) => n.as_i64().map(|n| n != 0).unwrap_or(false),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = PipelineRequest::new("gh1", "github", "snowflake");
        assert_eq!(request.timezone, "UTC");
        assert_eq!(request.retries, 2);
        assert_eq!(request.retry_delay, 30);
        assert_eq!(request.retry_backoff, RetryBackoff::Linear);
        assert_eq!(request.write_disposition, WriteDisposition::Append);
        assert_eq!(request.file_format, "parquet");
        assert!(!request.partitioning.is_enabled());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_applies_defaults() {
        let yaml = r#"
name: pg1
source_type: postgres
destination_type: bigquery
source_configuration:
  tables: users,orders
partitioning:
  mode: incremental
  cursor_field: updated_at
retry_jitter: PLUS_MINUS
"#;
        let request = PipelineRequest::from_yaml(yaml).unwrap();
        assert_eq!(request.retries, 2);
        assert_eq!(request.retry_jitter, Some(RetryJitter::PlusMinus));
        assert_eq!(
            request.partitioning,
            Partitioning::incremental("updated_at", None)
        );
        assert_eq!(request.config_str("tables").as_deref(), Some("users,orders"));
    }

    #[test]
    fn test_name_validation() {
        for good in ["gh1", "_private", "my-pipeline", "A_b-9"] {
            assert!(is_valid_name(good), "{good}");
        }
        for bad in ["", "1abc", "has space", "../escape", "a/b", ".hidden"] {
            assert!(!is_valid_name(bad), "{bad}");
        }
        assert!(!is_valid_name(&"a".repeat(101)));

        let err = PipelineRequest::new("bad name", "github", "duckdb")
            .validate()
            .unwrap_err();
        assert!(matches!(err, EltError::InvalidRequest { help: Some(_), .. }));
    }

    #[test]
    fn test_validation_rejects_empty_fields() {
        assert!(PipelineRequest::new("p", "", "duckdb").validate().is_err());
        assert!(PipelineRequest::new("p", "github", " ").validate().is_err());

        let mut request = PipelineRequest::new("p", "github", "duckdb");
        request.timezone = String::new();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_partition_invariants() {
        let mut request = PipelineRequest::new("p", "github", "duckdb");
        request.partitioning = Partitioning::incremental("  ", None);
        assert!(request.validate().is_err());

        request.partitioning = Partitioning::Static { keys: vec![] };
        assert!(request.validate().is_err());

        request.partitioning = Partitioning::Static {
            keys: vec!["us".into(), "eu".into()],
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_config_accessors() {
        let mut request = PipelineRequest::new("p", "github", "duckdb")
            .with_config("resources", " issues , commits ,, ")
            .with_config("advanced_mode", "yes")
            .with_config("blank", "  ");
        request.source_configuration.insert(
            "list".into(),
            Value::Sequence(vec![Value::String("a".into()), Value::String("b".into())]),
        );

        assert_eq!(
            request.config_list("resources").unwrap(),
            vec!["issues".to_string(), "commits".to_string()]
        );
        assert_eq!(request.config_list("list").unwrap().len(), 2);
        assert!(request.config_flag("advanced_mode"));
        assert!(!request.config_flag("missing"));
        assert!(request.config_str("blank").is_none());
    }

    #[test]
    fn test_dataset_and_table_names() {
        let mut request = PipelineRequest::new("p", "hubspot", "duckdb");
        assert_eq!(request.dataset_name("hubspot_data"), "hubspot_data");
        request.schema_override = Some("raw".into());
        assert_eq!(request.dataset_name("hubspot_data"), "raw");

        request.table_prefix = Some("raw_".into());
        request.table_suffix = Some("_v1".into());
        assert_eq!(request.table_name("users"), "raw_users_v1");
    }
}
