// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Pipeline generation
//!
//! Rendering is pure and happens in memory. Writing goes through a hidden
//! temporary sibling directory that is renamed into place, so readers see
//! either the old artifact set or the new one.

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::descriptor::{
    ConfigSnapshot, PipelineMetadata, Replication, CONFIG_FILE, METADATA_FILE, README_FILE,
};
use super::request::PipelineRequest;
use super::selector::Tool;
use super::templates;
use crate::errors::{EltError, EltResult};

/// The four rendered files of one pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub tool: Tool,
    /// `pipeline.py` or `replication.yaml`
    pub artifact: String,
    pub metadata: String,
    pub config: String,
    pub readme: String,
}

impl ArtifactSet {
    /// `(file name, contents)` pairs in write order
    pub fn files(&self) -> [(&'static str, &str); 4] {
        [
            (self.tool.artifact_file(), self.artifact.as_str()),
            (CONFIG_FILE, self.config.as_str()),
            (README_FILE, self.readme.as_str()),
            (METADATA_FILE, self.metadata.as_str()),
        ]
    }
}

/// Generates pipeline artifact sets
#[derive(Debug, Clone)]
pub struct PipelineGenerator {
    today: NaiveDate,
}

impl Default for PipelineGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineGenerator {
    /// Generator using the local date for incremental partition starts
    pub fn new() -> Self {
        Self {
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Generator with a fixed "today"
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Render all artifacts for `request` without touching the filesystem
    pub fn render(&self, request: &PipelineRequest, tool: Tool) -> EltResult<ArtifactSet> {
        let artifact = match tool {
            Tool::Dlt => templates::render_program(request),
            Tool::Sling => serde_yaml::to_string(&Replication::from_request(request))?,
        };

        Ok(ArtifactSet {
            tool,
            artifact,
            metadata: serde_yaml::to_string(&PipelineMetadata::from_request(request, self.today))?,
            config: serde_yaml::to_string(&ConfigSnapshot::from_request(request))?,
            readme: templates::render_readme(request, tool),
        })
    }

    /// Render and write the artifact set to `pipeline_dir`, replacing any
    /// existing contents
    pub fn generate(
        &self,
        pipeline_dir: &Path,
        request: &PipelineRequest,
        tool: Tool,
    ) -> EltResult<ArtifactSet> {
        let artifacts = self.render(request, tool)?;
        write_atomically(pipeline_dir, &artifacts)?;
        debug!("Wrote {} artifacts to {}", tool, pipeline_dir.display());
        Ok(artifacts)
    }
}

fn dir_name(path: &Path) -> EltResult<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| EltError::InvalidRepoPath {
            path: path.to_path_buf(),
            reason: "pipeline directory has no name".into(),
        })
}

/// Move the previous artifact set back into place; false if it stays stranded
fn restore_backup(backup: &Path, pipeline_dir: &Path) -> bool {
    match fs::rename(backup, pipeline_dir) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                "Could not restore {} from backup {}: {}",
                pipeline_dir.display(),
                backup.display(),
                e
            );
            false
        }
    }
}

fn write_atomically(pipeline_dir: &Path, artifacts: &ArtifactSet) -> EltResult<()> {
    let name = dir_name(pipeline_dir)?;
    let parent = pipeline_dir
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&parent).map_err(|e| EltError::write_failed(&parent, e))?;

    let staging = tempfile::Builder::new()
        .prefix(&format!(".{}.tmp", name))
        .tempdir_in(&parent)
        .map_err(|e| EltError::write_failed(&parent, e))?;

    for (file, contents) in artifacts.files() {
        let path = staging.path().join(file);
        fs::write(&path, contents).map_err(|e| EltError::write_failed(&path, e))?;
    }

    let backup = parent.join(format!(".{}.bak", name));
    let had_previous = pipeline_dir.exists();
    if had_previous {
        if backup.exists() {
            fs::remove_dir_all(&backup).map_err(|e| EltError::write_failed(&backup, e))?;
        }
        fs::rename(pipeline_dir, &backup).map_err(|e| EltError::write_failed(pipeline_dir, e))?;
    }

    if let Err(e) = fs::rename(staging.path(), pipeline_dir) {
        if had_previous {
            restore_backup(&backup, pipeline_dir);
        }
        return Err(EltError::write_failed(pipeline_dir, e));
    }

    if had_previous {
        if let Err(e) = fs::remove_dir_all(&backup) {
            tracing::warn!("Could not remove backup {}: {}", backup.display(), e);
        }
    }

    // `staging` now points at a path that no longer exists; dropping it is a no-op
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Partitioning;
    use tempfile::TempDir;

    fn generator() -> PipelineGenerator {
        PipelineGenerator::with_today(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap())
    }

    #[test]
    fn test_generate_writes_four_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("pipelines/dlt/gh1");
        let request = PipelineRequest::new("gh1", "github", "snowflake");

        generator().generate(&dir, &request, Tool::Dlt).unwrap();

        for file in ["pipeline.py", "config.yaml", "dagster.yaml", "README.md"] {
            assert!(dir.join(file).is_file(), "{file} missing");
        }
        assert!(!dir.join("replication.yaml").exists());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("pipelines/dlt/api");
        let mut request = PipelineRequest::new("api", "rest_api", "duckdb").with_config("resource_name", "users");
        request.partitioning = Partitioning::incremental("updated_at", None);
        request.owners = vec!["data@acme.io".into()];

        let generator = generator();
        generator.generate(&dir, &request, Tool::Dlt).unwrap();
        let first: Vec<String> = ["dagster.yaml", "config.yaml", "pipeline.py"]
            .iter()
            .map(|f| fs::read_to_string(dir.join(f)).unwrap())
            .collect();

        generator.generate(&dir, &request, Tool::Dlt).unwrap();
        let second: Vec<String> = ["dagster.yaml", "config.yaml", "pipeline.py"]
            .iter()
            .map(|f| fs::read_to_string(dir.join(f)).unwrap())
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_regeneration_replaces_stale_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("pipelines/sling/pg1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stale.txt"), "old").unwrap();

        let request = PipelineRequest::new("pg1", "postgres", "bigquery");
        generator().generate(&dir, &request, Tool::Sling).unwrap();

        assert!(!dir.join("stale.txt").exists());
        assert!(dir.join("replication.yaml").is_file());

        // No temporary or backup directories left behind
        let leftovers: Vec<_> = fs::read_dir(dir.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_render_sling() {
        let request = PipelineRequest::new("pg1", "postgres", "bigquery").with_config("tables", "users,orders");
        let artifacts = generator().render(&request, Tool::Sling).unwrap();

        let replication: Replication = serde_yaml::from_str(&artifacts.artifact).unwrap();
        assert_eq!(replication.streams.len(), 2);
        assert!(artifacts.readme.contains("sling run"));
        assert_eq!(artifacts.files()[0].0, "replication.yaml");
    }

    #[test]
    fn test_render_metadata_matches_descriptor() {
        let request = PipelineRequest::new("gh1", "github", "snowflake");
        let artifacts = generator().render(&request, Tool::Dlt).unwrap();
        let metadata: PipelineMetadata = serde_yaml::from_str(&artifacts.metadata).unwrap();
        assert!(metadata.enabled);
        assert_eq!(metadata.retry_policy.max_retries, 2);
        assert_eq!(metadata.retry_policy.delay, 30);

        let config: ConfigSnapshot = serde_yaml::from_str(&artifacts.config).unwrap();
        assert_eq!(config.source_type, "github");
        assert_eq!(config.destination_type, "snowflake");
    }

    #[test]
    fn test_restore_backup() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("pipelines/dlt/gh1");
        let backup = temp.path().join("pipelines/dlt/.gh1.bak");
        fs::create_dir_all(&backup).unwrap();
        fs::write(backup.join("pipeline.py"), "import dlt\n").unwrap();

        assert!(restore_backup(&backup, &dir));
        assert!(dir.join("pipeline.py").is_file());
        assert!(!backup.exists());

        // Nothing left to restore
        let other = temp.path().join("pipelines/dlt/other");
        assert!(!restore_backup(&backup, &other));
        assert!(!other.exists());
    }
}
