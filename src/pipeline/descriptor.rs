// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! On-disk artifact shapes
//!
//! Field order in these structs is the key order written to disk.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

use super::request::{Partitioning, PipelineRequest, RetryBackoff, RetryJitter};

pub const METADATA_FILE: &str = "dagster.yaml";
pub const CONFIG_FILE: &str = "config.yaml";
pub const README_FILE: &str = "README.md";

const PARTITION_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_PARTITION_START: &str = "2024-01-01";
const DEFAULT_PARTITION_CRON: &str = "0 0 * * *";

/// `dagster.yaml`: orchestration-facing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineMetadata {
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleSpec>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<String>,

    pub retry_policy: RetryPolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitions: Option<PartitionSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incremental: Option<IncrementalSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    pub enabled: bool,
    pub cron_schedule: String,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: u32,
    /// Omitted when linear
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<RetryBackoff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter: Option<RetryJitter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    Time,
    Static,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSpec {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: PartitionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimePartition>,
    #[serde(rename = "static", default, skip_serializing_if = "Option::is_none")]
    pub static_keys: Option<StaticPartition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePartition {
    pub start: String,
    pub cron_schedule: String,
    pub timezone: String,
    pub fmt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticPartition {
    pub partition_keys: Vec<String>,
}

/// Cursor settings recorded alongside incremental time partitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalSpec {
    pub cursor_field: String,
    /// Written as `null` when unset
    pub initial_value: Option<String>,
}

impl PartitionSpec {
    fn time(start: String, cron_schedule: String, timezone: &str) -> Self {
        Self {
            enabled: true,
            kind: PartitionKind::Time,
            time: Some(TimePartition {
                start,
                cron_schedule,
                timezone: timezone.to_string(),
                fmt: PARTITION_DATE_FORMAT.to_string(),
            }),
            static_keys: None,
        }
    }
}

impl PipelineMetadata {
    /// Build the metadata descriptor for a request
    ///
    /// `today` is the start of incremental partitions when no initial cursor
    /// value is given.
    pub fn from_request(request: &PipelineRequest, today: NaiveDate) -> Self {
        let schedule = match (request.schedule_enabled, request.cron_schedule.as_deref()) {
            (true, Some(cron)) if !cron.trim().is_empty() => Some(ScheduleSpec {
                enabled: true,
                cron_schedule: cron.to_string(),
                timezone: request.timezone.clone(),
            }),
            _ => None,
        };

        let retry_policy = RetryPolicy {
            max_retries: request.retries,
            delay: request.retry_delay,
            backoff: (request.retry_backoff != RetryBackoff::Linear).then_some(request.retry_backoff),
            jitter: request.retry_jitter,
        };

        let (partitions, incremental) = match &request.partitioning {
            Partitioning::Disabled => (None, None),
            Partitioning::Time { start, cron } => (
                Some(PartitionSpec::time(
                    non_blank(start).unwrap_or(DEFAULT_PARTITION_START).to_string(),
                    non_blank(cron).unwrap_or(DEFAULT_PARTITION_CRON).to_string(),
                    &request.timezone,
                )),
                None,
            ),
            Partitioning::Static { keys } => (
                Some(PartitionSpec {
                    enabled: true,
                    kind: PartitionKind::Static,
                    time: None,
                    static_keys: Some(StaticPartition {
                        partition_keys: keys.clone(),
                    }),
                }),
                None,
            ),
            Partitioning::Incremental {
                cursor_field,
                initial_value,
                frequency,
            } => {
                let start = non_blank(initial_value)
                    .map(str::to_string)
                    .unwrap_or_else(|| today.format(PARTITION_DATE_FORMAT).to_string());
                (
                    Some(PartitionSpec::time(start, frequency.clone(), &request.timezone)),
                    Some(IncrementalSpec {
                        cursor_field: cursor_field.clone(),
                        initial_value: initial_value.clone(),
                    }),
                )
            }
        };

        Self {
            enabled: true,
            description: request.description.clone().filter(|d| !d.trim().is_empty()),
            group: request.group_name.clone().filter(|g| !g.trim().is_empty()),
            owners: request.owners.clone(),
            schedule,
            tags: request.tags.clone(),
            kinds: request.kinds.clone(),
            retry_policy,
            partitions,
            incremental,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// `config.yaml`: plain configuration snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub source_type: String,
    pub destination_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub configuration: BTreeMap<String, Value>,
}

impl ConfigSnapshot {
    pub fn from_request(request: &PipelineRequest) -> Self {
        Self {
            source_type: request.source_type.clone(),
            destination_type: request.destination_type.clone(),
            configuration: request.source_configuration.clone(),
        }
    }
}

/// `replication.yaml`: Sling stream mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replication {
    pub source: String,
    pub target: String,
    pub defaults: ReplicationDefaults,
    /// Insertion-ordered; one entry per source table
    pub streams: Mapping,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationDefaults {
    pub mode: String,
    pub object: String,
}

const PLACEHOLDER_STREAM: &str = "# Configure your streams";

impl Replication {
    pub fn from_request(request: &PipelineRequest) -> Self {
        let mut streams = Mapping::new();

        match request.config_list("tables") {
            Some(tables) => {
                let destination = request.destination_type.to_lowercase();
                for table in tables {
                    let mut target = Mapping::new();
                    target.insert(
                        Value::from("object"),
                        Value::from(format!("{}.{}", destination, request.table_name(&table))),
                    );
                    streams.insert(Value::from(format!("public.{}", table)), Value::Mapping(target));
                }
            }
            None => {
                let mut example = Mapping::new();
                example.insert(Value::from("# Example"), Value::from("public.users"));
                streams.insert(Value::from(PLACEHOLDER_STREAM), Value::Mapping(example));
            }
        }

        Self {
            source: request.source_type.to_uppercase(),
            target: request.destination_type.to_uppercase(),
            defaults: ReplicationDefaults {
                mode: "full-refresh".to_string(),
                object: "{stream_schema}.{stream_table}".to_string(),
            },
            streams,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_minimal_metadata() {
        let request = PipelineRequest::new("gh1", "github", "snowflake");
        let metadata = PipelineMetadata::from_request(&request, today());

        assert!(metadata.enabled);
        assert_eq!(metadata.retry_policy.max_retries, 2);
        assert_eq!(metadata.retry_policy.delay, 30);
        assert!(metadata.retry_policy.backoff.is_none());
        assert!(metadata.partitions.is_none());
        assert!(metadata.schedule.is_none());

        let yaml = serde_yaml::to_string(&metadata).unwrap();
        assert_eq!(yaml, "enabled: true\nretry_policy:\n  max_retries: 2\n  delay: 30\n");
    }

    #[test]
    fn test_schedule_needs_cron() {
        let mut request = PipelineRequest::new("p", "github", "duckdb");
        request.schedule_enabled = true;
        assert!(PipelineMetadata::from_request(&request, today()).schedule.is_none());

        request.cron_schedule = Some("0 6 * * *".into());
        request.timezone = "Europe/Berlin".into();
        let schedule = PipelineMetadata::from_request(&request, today()).schedule.unwrap();
        assert_eq!(schedule.cron_schedule, "0 6 * * *");
        assert_eq!(schedule.timezone, "Europe/Berlin");
    }

    #[test]
    fn test_retry_backoff_and_jitter() {
        let mut request = PipelineRequest::new("p", "github", "duckdb");
        request.retry_backoff = RetryBackoff::Exponential;
        request.retry_jitter = Some(RetryJitter::Full);

        let yaml = serde_yaml::to_string(&PipelineMetadata::from_request(&request, today())).unwrap();
        assert!(yaml.contains("backoff: EXPONENTIAL"));
        assert!(yaml.contains("jitter: FULL"));
    }

    #[test]
    fn test_incremental_partitions() {
        let mut request = PipelineRequest::new("p", "rest_api", "duckdb");
        request.partitioning = Partitioning::incremental("updated_at", Some("2023-06-01".into()));

        let metadata = PipelineMetadata::from_request(&request, today());
        let partitions = metadata.partitions.unwrap();
        assert_eq!(partitions.kind, PartitionKind::Time);
        let time = partitions.time.unwrap();
        assert_eq!(time.start, "2023-06-01");
        assert_eq!(time.cron_schedule, "@daily");
        assert_eq!(time.fmt, "%Y-%m-%d");
        assert_eq!(metadata.incremental.unwrap().cursor_field, "updated_at");
    }

    #[test]
    fn test_incremental_start_defaults_to_today() {
        let mut request = PipelineRequest::new("p", "rest_api", "duckdb");
        request.partitioning = Partitioning::incremental("updated_at", None);

        let metadata = PipelineMetadata::from_request(&request, today());
        assert_eq!(metadata.partitions.unwrap().time.unwrap().start, "2025-03-14");

        let yaml = serde_yaml::to_string(&metadata.incremental).unwrap();
        assert!(yaml.contains("initial_value: null"));
    }

    #[test]
    fn test_time_and_static_partitions() {
        let mut request = PipelineRequest::new("p", "github", "duckdb");
        request.partitioning = Partitioning::Time { start: None, cron: None };
        let time = PipelineMetadata::from_request(&request, today())
            .partitions
            .unwrap()
            .time
            .unwrap();
        assert_eq!(time.start, "2024-01-01");
        assert_eq!(time.cron_schedule, "0 0 * * *");

        request.partitioning = Partitioning::Static {
            keys: vec!["us".into(), "eu".into()],
        };
        let metadata = PipelineMetadata::from_request(&request, today());
        assert!(metadata.incremental.is_none());
        let yaml = serde_yaml::to_string(&metadata.partitions).unwrap();
        assert!(yaml.contains("type: static"));
        assert!(yaml.contains("partition_keys:"));
        assert!(!yaml.contains("time:"));
    }

    #[test]
    fn test_replication_streams() {
        let request = PipelineRequest::new("pg1", "postgres", "bigquery")
            .with_config("tables", "users, orders,");
        let replication = Replication::from_request(&request);

        assert_eq!(replication.source, "POSTGRES");
        assert_eq!(replication.target, "BIGQUERY");
        assert_eq!(replication.streams.len(), 2);
        let users = &replication.streams[&Value::from("public.users")];
        assert_eq!(users["object"], Value::from("bigquery.users"));
        assert!(replication.streams.contains_key(&Value::from("public.orders")));
    }

    #[test]
    fn test_replication_placeholder_stream() {
        let request = PipelineRequest::new("pg2", "mysql", "snowflake");
        let replication = Replication::from_request(&request);
        assert_eq!(replication.streams.len(), 1);
        assert_eq!(replication.defaults.mode, "full-refresh");
    }

    #[test]
    fn test_config_snapshot_omits_empty_configuration() {
        let request = PipelineRequest::new("gh1", "github", "snowflake");
        let yaml = serde_yaml::to_string(&ConfigSnapshot::from_request(&request)).unwrap();
        assert_eq!(yaml, "source_type: github\ndestination_type: snowflake\n");
    }
}
