// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Pipeline definitions
//!
//! Everything between a [`PipelineRequest`] and the files under
//! `pipelines/<tool>/<name>/`: tool selection, rendering, atomic writes,
//! validation and registry access.

mod descriptor;
mod generator;
mod registry;
mod request;
pub(crate) mod selector;
mod templates;
mod validation;

pub use descriptor::{
    ConfigSnapshot, IncrementalSpec, PartitionKind, PartitionSpec, PipelineMetadata,
    Replication, ReplicationDefaults, RetryPolicy, ScheduleSpec, StaticPartition, TimePartition,
    CONFIG_FILE, METADATA_FILE, README_FILE,
};
pub use generator::{ArtifactSet, PipelineGenerator};
pub use registry::{
    PipelineInfo, PipelineLocation, PipelineRegistry, RegistrySummary, RetryInfo, ScheduleInfo,
    ToolSummary, PIPELINES_DIR,
};
pub use request::{
    is_valid_name, Partitioning, PipelineRequest, RetryBackoff, RetryJitter, WriteDisposition,
};
pub use selector::{select_tool, Tool};
pub use templates::py_str;
pub use validation::{RepositoryValidator, ValidationIssue, ValidationReport};

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{EltError, EltResult};

/// Pipeline directories in one tool namespace, sorted by name
///
/// Files and hidden entries (in-flight writes, backups) are skipped. A
/// missing namespace is empty.
pub(crate) fn scan_namespace(namespace: &Path) -> EltResult<Vec<(String, PathBuf)>> {
    if !namespace.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(namespace).map_err(|e| EltError::read_failed(namespace, e))?;
    let mut pipelines: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            (!name.starts_with('.')).then(|| (name, entry.path()))
        })
        .collect();

    pipelines.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(pipelines)
}
