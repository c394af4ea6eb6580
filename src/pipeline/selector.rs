// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Tool selection
//!
//! Maps a source type onto the tool that generates its pipeline. The policy
//! is a fixed precedence over category sets and never fails.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::EltError;

/// SaaS and HTTP API sources
pub(crate) const API_SOURCES: &[&str] = &[
    "github",
    "stripe",
    "shopify",
    "hubspot",
    "salesforce",
    "google_analytics",
    "facebook_ads",
    "google_ads",
    "slack",
    "notion",
    "airtable",
    "asana",
    "jira",
    "zendesk",
    "intercom",
    "mixpanel",
    "segment",
];

/// Object storage and local file sources
pub(crate) const STORAGE_SOURCES: &[&str] = &["s3", "gcs", "azure_blob", "csv", "json", "parquet"];

/// Database sources
pub(crate) const DATABASE_SOURCES: &[&str] = &["postgres", "mysql", "mongodb", "mssql", "oracle"];

/// Pipeline generation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Generates a Python program (`pipeline.py`)
    Dlt,
    /// Generates a declarative replication (`replication.yaml`)
    Sling,
}

impl Tool {
    /// Namespaces in lookup order
    pub const ALL: [Tool; 2] = [Tool::Dlt, Tool::Sling];

    /// Directory name under `pipelines/`
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Dlt => "dlt",
            Tool::Sling => "sling",
        }
    }

    /// The tool-specific artifact inside a pipeline directory
    pub fn artifact_file(&self) -> &'static str {
        match self {
            Tool::Dlt => "pipeline.py",
            Tool::Sling => "replication.yaml",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = EltError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dlt" => Ok(Tool::Dlt),
            "sling" => Ok(Tool::Sling),
            other => Err(EltError::invalid_request(format!(
                "unknown tool '{}' (expected dlt or sling)",
                other
            ))),
        }
    }
}

/// Pick the tool for a source/destination pair
///
/// API and storage sources go to dlt, databases go to Sling, anything else
/// falls back to dlt. The destination does not influence the decision.
pub fn select_tool(source_type: &str, _destination_type: &str) -> Tool {
    let source = source_type.to_lowercase();
    let source = source.as_str();

    if API_SOURCES.contains(&source) {
        Tool::Dlt
    } else if STORAGE_SOURCES.contains(&source) {
        Tool::Dlt
    } else if DATABASE_SOURCES.contains(&source) {
        Tool::Sling
    } else {
        Tool::Dlt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESTINATIONS: &[&str] = &["snowflake", "bigquery", "duckdb", "postgres", "nowhere"];

    #[test]
    fn test_api_and_storage_sources_use_dlt() {
        for source in API_SOURCES.iter().chain(STORAGE_SOURCES) {
            for destination in DESTINATIONS {
                assert_eq!(select_tool(source, destination), Tool::Dlt, "{source}");
            }
        }
    }

    #[test]
    fn test_database_sources_use_sling() {
        for source in DATABASE_SOURCES {
            for destination in DESTINATIONS {
                assert_eq!(select_tool(source, destination), Tool::Sling, "{source}");
            }
        }
    }

    #[test]
    fn test_unknown_source_defaults_to_dlt() {
        assert_eq!(select_tool("rest_api", "duckdb"), Tool::Dlt);
        assert_eq!(select_tool("something_new", "snowflake"), Tool::Dlt);
        assert_eq!(select_tool("", ""), Tool::Dlt);
    }

    #[test]
    fn test_selection_is_stable_and_case_insensitive() {
        let first = select_tool("Postgres", "BigQuery");
        for _ in 0..10 {
            assert_eq!(select_tool("POSTGRES", "bigquery"), first);
        }
        assert_eq!(first, Tool::Sling);
    }

    #[test]
    fn test_tool_parsing() {
        assert_eq!("dlt".parse::<Tool>().unwrap(), Tool::Dlt);
        assert_eq!("SLING".parse::<Tool>().unwrap(), Tool::Sling);
        assert!("airbyte".parse::<Tool>().is_err());
        assert_eq!(Tool::Sling.artifact_file(), "replication.yaml");
    }
}
