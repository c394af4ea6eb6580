// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Version control
//!
//! Pipeline mutations are recorded in git after the fact. Nothing here is
//! needed for a mutation to succeed: [`record_change`] turns every failure
//! into a warning.

mod git;

pub use git::GitCli;

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::errors::{EltResult, RecoverySuggestion};

/// Working tree state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GitStatus {
    pub branch: Option<String>,
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
    pub staged: Vec<String>,
    pub modified: Vec<String>,
    pub untracked: Vec<String>,
}

impl GitStatus {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.modified.is_empty() && self.untracked.is_empty()
    }
}

/// One entry of the commit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub hash: String,
    pub author: String,
    pub date: String,
    pub message: String,
}

impl CommitInfo {
    pub fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(7)]
    }
}

/// Operations the CLI needs from a version-control system
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Repository working directory
    fn root(&self) -> &Path;

    /// Whether the working directory is inside a repository
    fn is_repository(&self) -> bool;

    async fn status(&self) -> EltResult<GitStatus>;

    /// Stage paths, including deletions
    async fn add(&self, paths: &[PathBuf]) -> EltResult<()>;

    /// Commit staged changes under `paths` (all staged changes when empty),
    /// returning the new commit hash
    async fn commit(&self, message: &str, paths: &[PathBuf]) -> EltResult<String>;

    async fn push(&self) -> EltResult<()>;

    async fn pull(&self) -> EltResult<()>;

    /// Unstaged diff, optionally limited to one path
    async fn diff(&self, path: Option<&Path>) -> EltResult<String>;

    async fn log(&self, limit: usize) -> EltResult<Vec<CommitInfo>>;

    async fn init(&self) -> EltResult<()>;

    async fn add_remote(&self, name: &str, url: &str) -> EltResult<()>;

    /// Configured remote names
    async fn remotes(&self) -> EltResult<Vec<String>>;
}

/// Stage, commit and (when a remote exists) push `paths`
///
/// Returns warnings for whatever could not be done. Never fails and never
/// undoes the filesystem change that preceded it.
pub async fn record_change<V>(vcs: &V, paths: &[PathBuf], message: &str) -> Vec<String>
where
    V: VersionControl + ?Sized,
{
    let warnings = try_record(vcs, paths, message).await;
    for warning in &warnings {
        warn!("{}", warning);
    }
    warnings
}

async fn try_record<V>(vcs: &V, paths: &[PathBuf], message: &str) -> Vec<String>
where
    V: VersionControl + ?Sized,
{
    let mut warnings = Vec::new();

    if !vcs.is_repository() {
        warnings.push(format!(
            "Not a git repository, changes were not committed. {}",
            RecoverySuggestion::not_a_repository().hint()
        ));
        return warnings;
    }

    if let Err(e) = vcs.add(paths).await {
        warnings.push(format!("Could not stage changes: {}", e));
        return warnings;
    }

    match vcs.commit(message, paths).await {
        Ok(hash) => info!("Committed {}: {}", &hash[..hash.len().min(7)], message),
        Err(e) => {
            warnings.push(format!(
                "Could not commit: {}. {}",
                e,
                RecoverySuggestion::commit_failed().hint()
            ));
            return warnings;
        }
    }

    match vcs.remotes().await {
        Ok(remotes) if remotes.is_empty() => {
            warnings.push(format!(
                "No git remote configured, changes were committed locally. {}",
                RecoverySuggestion::no_remote().hint()
            ));
        }
        Ok(_) => {
            if let Err(e) = vcs.push().await {
                warnings.push(format!(
                    "Could not push: {}. {}",
                    e,
                    RecoverySuggestion::push_failed().hint()
                ));
            }
        }
        Err(e) => warnings.push(format!("Could not list remotes: {}", e)),
    }

    warnings
}

/// Parse `git status --porcelain=v1 --branch`
pub fn parse_status(output: &str) -> GitStatus {
    let mut status = GitStatus::default();

    for line in output.lines() {
        if let Some(header) = line.strip_prefix("## ") {
            parse_branch_header(header, &mut status);
            continue;
        }
        if line.len() < 4 {
            continue;
        }

        let (codes, path) = line.split_at(3);
        let mut codes = codes.chars();
        let index = codes.next().unwrap_or(' ');
        let worktree = codes.next().unwrap_or(' ');
        // Renames are reported as "old -> new"
        let path = path
            .rsplit_once(" -> ")
            .map(|(_, new)| new)
            .unwrap_or(path)
            .to_string();

        if index == '?' {
            status.untracked.push(path);
            continue;
        }
        if index != ' ' {
            status.staged.push(path.clone());
        }
        if worktree != ' ' {
            status.modified.push(path);
        }
    }

    status
}

fn parse_branch_header(header: &str, status: &mut GitStatus) {
    if let Some(branch) = header.strip_prefix("No commits yet on ") {
        status.branch = Some(branch.trim().to_string());
        return;
    }

    let (refs, tracking) = match header.split_once(" [") {
        Some((refs, rest)) => (refs, Some(rest.trim_end_matches(']'))),
        None => (header, None),
    };

    match refs.split_once("...") {
        Some((branch, upstream)) => {
            status.branch = Some(branch.to_string());
            status.upstream = Some(upstream.to_string());
        }
        None if refs.starts_with("HEAD") => status.branch = None,
        None => status.branch = Some(refs.trim().to_string()),
    }

    for part in tracking.unwrap_or("").split(", ") {
        if let Some(n) = part.strip_prefix("ahead ") {
            status.ahead = n.trim().parse().unwrap_or(0);
        } else if let Some(n) = part.strip_prefix("behind ") {
            status.behind = n.trim().parse().unwrap_or(0);
        }
    }
}

/// Field separator used in the log format
pub(crate) const LOG_SEPARATOR: char = '\u{1f}';

/// Parse `git log --pretty=format:%H%x1f%an%x1f%ad%x1f%s`
pub fn parse_log(output: &str) -> Vec<CommitInfo> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.splitn(4, LOG_SEPARATOR);
            Some(CommitInfo {
                hash: fields.next()?.to_string(),
                author: fields.next()?.to_string(),
                date: fields.next()?.to_string(),
                message: fields.next().unwrap_or("").to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_parse_status() {
        let output = "## main...origin/main [ahead 2, behind 1]\n\
                      M  pipelines/dlt/gh1/dagster.yaml\n \
                      M README.md\n\
                      ?? pipelines/sling/pg1/\n\
                      R  old.yaml -> new.yaml\n";
        let status = parse_status(output);

        assert_eq!(status.branch.as_deref(), Some("main"));
        assert_eq!(status.upstream.as_deref(), Some("origin/main"));
        assert_eq!((status.ahead, status.behind), (2, 1));
        assert_eq!(
            status.staged,
            vec!["pipelines/dlt/gh1/dagster.yaml".to_string(), "new.yaml".to_string()]
        );
        assert_eq!(status.modified, vec!["README.md".to_string()]);
        assert_eq!(status.untracked, vec!["pipelines/sling/pg1/".to_string()]);
        assert!(!status.is_clean());
    }

    #[test]
    fn test_parse_status_fresh_repository() {
        let status = parse_status("## No commits yet on main\n");
        assert_eq!(status.branch.as_deref(), Some("main"));
        assert!(status.upstream.is_none());
        assert!(status.is_clean());

        let status = parse_status("## feature\n");
        assert_eq!(status.branch.as_deref(), Some("feature"));
        assert_eq!(status.ahead, 0);
    }

    #[test]
    fn test_parse_log() {
        let output = "abcdef1234567\u{1f}Ada\u{1f}2025-01-02 10:00:00 +0000\u{1f}Add pipeline: gh1\n\
                      1234567abcdef\u{1f}Bob\u{1f}2025-01-01 09:00:00 +0000\u{1f}Initial commit";
        let log = parse_log(output);
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].short_hash(), "abcdef1");
        assert_eq!(log[0].message, "Add pipeline: gh1");
        assert_eq!(log[1].author, "Bob");
    }

    /// Records calls; fails where told to
    #[derive(Default)]
    struct FakeVcs {
        repository: bool,
        remotes: Vec<String>,
        fail_commit: bool,
        fail_push: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeVcs {
        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }
    }

    #[async_trait]
    impl VersionControl for FakeVcs {
        fn root(&self) -> &Path {
            Path::new(".")
        }

        fn is_repository(&self) -> bool {
            self.repository
        }

        async fn status(&self) -> EltResult<GitStatus> {
            Ok(GitStatus::default())
        }

        async fn add(&self, _paths: &[PathBuf]) -> EltResult<()> {
            self.record("add");
            Ok(())
        }

        async fn commit(&self, _message: &str, _paths: &[PathBuf]) -> EltResult<String> {
            self.record("commit");
            if self.fail_commit {
                return Err(crate::EltError::vcs_failed("commit", "nothing to commit"));
            }
            Ok("0123456789".into())
        }

        async fn push(&self) -> EltResult<()> {
            self.record("push");
            if self.fail_push {
                return Err(crate::EltError::vcs_failed("push", "Authentication failed"));
            }
            Ok(())
        }

        async fn pull(&self) -> EltResult<()> {
            Ok(())
        }

        async fn diff(&self, _path: Option<&Path>) -> EltResult<String> {
            Ok(String::new())
        }

        async fn log(&self, _limit: usize) -> EltResult<Vec<CommitInfo>> {
            Ok(vec![])
        }

        async fn init(&self) -> EltResult<()> {
            Ok(())
        }

        async fn add_remote(&self, _name: &str, _url: &str) -> EltResult<()> {
            Ok(())
        }

        async fn remotes(&self) -> EltResult<Vec<String>> {
            Ok(self.remotes.clone())
        }
    }

    #[tokio::test]
    async fn test_record_change_pushes_when_remote_exists() {
        let vcs = FakeVcs {
            repository: true,
            remotes: vec!["origin".into()],
            ..Default::default()
        };
        let warnings = record_change(&vcs, &[PathBuf::from("pipelines/dlt/gh1")], "Add pipeline: gh1").await;
        assert!(warnings.is_empty());
        assert_eq!(*vcs.calls.lock().unwrap(), vec!["add", "commit", "push"]);
    }

    #[tokio::test]
    async fn test_record_change_without_repository() {
        let vcs = FakeVcs::default();
        let warnings = record_change(&vcs, &[], "msg").await;
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("git init"));
        assert!(vcs.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_change_without_remote() {
        let vcs = FakeVcs {
            repository: true,
            ..Default::default()
        };
        let warnings = record_change(&vcs, &[], "msg").await;
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("git remote add origin"));
        assert_eq!(*vcs.calls.lock().unwrap(), vec!["add", "commit"]);
    }

    #[tokio::test]
    async fn test_record_change_failures_are_warnings() {
        let vcs = FakeVcs {
            repository: true,
            remotes: vec!["origin".into()],
            fail_push: true,
            ..Default::default()
        };
        let warnings = record_change(&vcs, &[], "msg").await;
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Could not push"));

        let vcs = FakeVcs {
            repository: true,
            fail_commit: true,
            ..Default::default()
        };
        let warnings = record_change(&vcs, &[], "msg").await;
        assert!(warnings[0].starts_with("Could not commit"));
        assert_eq!(*vcs.calls.lock().unwrap(), vec!["add", "commit"]);
    }
}
