// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Git through the `git` command-line client

use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use super::{parse_log, parse_status, CommitInfo, GitStatus, VersionControl};
use crate::errors::{EltError, EltResult};

/// Git repository driven by the `git` binary
#[derive(Debug, Clone)]
pub struct GitCli {
    git_bin: PathBuf,
    root: PathBuf,
}

impl GitCli {
    /// Git client for the repository at `root`
    pub fn new(root: impl Into<PathBuf>) -> EltResult<Self> {
        let git_bin = which::which("git").map_err(|_| EltError::tool_not_found("git"))?;

        Ok(Self {
            git_bin,
            root: root.into(),
        })
    }

    /// Clone `url` into `destination` and return a client for the clone
    pub async fn clone_repository(url: &str, destination: &Path) -> EltResult<Self> {
        let git_bin = which::which("git").map_err(|_| EltError::tool_not_found("git"))?;

        let output = Command::new(&git_bin)
            .arg("clone")
            .arg(url)
            .arg(destination)
            .output()
            .await
            .map_err(|e| EltError::vcs_failed("clone", &e.to_string()))?;

        if !output.status.success() {
            return Err(EltError::vcs_failed(
                "clone",
                &String::from_utf8_lossy(&output.stderr),
            ));
        }

        Ok(Self {
            git_bin,
            root: destination.to_path_buf(),
        })
    }

    /// Run git in the repository root and return its stdout
    async fn run<I, S>(&self, operation: &str, args: I) -> EltResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.git_bin)
            .args(args)
            .current_dir(&self.root)
            .output()
            .await
            .map_err(|e| EltError::vcs_failed(operation, &e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if output.status.success() {
            debug!("git {} succeeded", operation);
            return Ok(stdout);
        }

        // `git commit` reports "nothing to commit" on stdout
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.trim().is_empty() { stdout.as_str() } else { &*stderr };
        Err(EltError::vcs_failed(operation, message))
    }

    /// Path relative to the repository root when it lies inside it
    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

#[async_trait]
impl VersionControl for GitCli {
    fn root(&self) -> &Path {
        &self.root
    }

    fn is_repository(&self) -> bool {
        self.root.join(".git").exists()
    }

    async fn status(&self) -> EltResult<GitStatus> {
        let output = self
            .run("status", ["status", "--porcelain=v1", "--branch"])
            .await?;
        Ok(parse_status(&output))
    }

    async fn add(&self, paths: &[PathBuf]) -> EltResult<()> {
        let mut args: Vec<&OsStr> = vec![OsStr::new("add"), OsStr::new("-A"), OsStr::new("--")];
        if paths.is_empty() {
            args.push(OsStr::new("."));
        }
        args.extend(paths.iter().map(|p| self.relative(p).as_os_str()));

        self.run("add", args).await?;
        Ok(())
    }

    async fn commit(&self, message: &str, paths: &[PathBuf]) -> EltResult<String> {
        let mut args: Vec<&OsStr> = vec![OsStr::new("commit"), OsStr::new("-m"), OsStr::new(message)];
        if !paths.is_empty() {
            args.push(OsStr::new("--"));
            args.extend(paths.iter().map(|p| self.relative(p).as_os_str()));
        }

        self.run("commit", args).await?;
        let hash = self.run("rev-parse", ["rev-parse", "HEAD"]).await?;
        Ok(hash.trim().to_string())
    }

    async fn push(&self) -> EltResult<()> {
        let status = self.status().await?;
        if status.upstream.is_some() {
            self.run("push", ["push"]).await?;
            return Ok(());
        }

        // First push of this branch: track it on the preferred remote
        let remotes = self.remotes().await?;
        let remote = remotes
            .iter()
            .find(|r| r.as_str() == "origin")
            .or_else(|| remotes.first())
            .ok_or_else(|| EltError::vcs_failed("push", "No remote configured"))?;
        self.run("push", ["push", "-u", remote.as_str(), "HEAD"]).await?;
        Ok(())
    }

    async fn pull(&self) -> EltResult<()> {
        self.run("pull", ["pull"]).await?;
        Ok(())
    }

    async fn diff(&self, path: Option<&Path>) -> EltResult<String> {
        let mut args: Vec<&OsStr> = vec![OsStr::new("diff")];
        if let Some(path) = path {
            args.push(OsStr::new("--"));
            args.push(self.relative(path).as_os_str());
        }
        self.run("diff", args).await
    }

    async fn log(&self, limit: usize) -> EltResult<Vec<CommitInfo>> {
        let limit = format!("-n{}", limit);
        match self
            .run(
                "log",
                [
                    "log",
                    limit.as_str(),
                    "--date=iso",
                    "--pretty=format:%H%x1f%an%x1f%ad%x1f%s",
                ],
            )
            .await
        {
            Ok(output) => Ok(parse_log(&output)),
            Err(EltError::VcsFailed { error, .. }) if error.contains("does not have any commits") => {
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn init(&self) -> EltResult<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| EltError::write_failed(&self.root, e))?;
        self.run("init", ["init"]).await?;
        Ok(())
    }

    async fn add_remote(&self, name: &str, url: &str) -> EltResult<()> {
        self.run("remote", ["remote", "add", name, url]).await?;
        Ok(())
    }

    async fn remotes(&self) -> EltResult<Vec<String>> {
        let output = self.run("remote", ["remote"]).await?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::record_change;
    use std::fs;
    use tempfile::TempDir;

    /// Fresh repository with a local identity, or None when git is absent
    async fn repository() -> Option<(TempDir, GitCli)> {
        let temp = TempDir::new().unwrap();
        let git = GitCli::new(temp.path()).ok()?;
        git.init().await.unwrap();
        git.run("config", ["config", "user.email", "ci@example.com"]).await.unwrap();
        git.run("config", ["config", "user.name", "CI"]).await.unwrap();
        git.run("config", ["config", "commit.gpgsign", "false"]).await.unwrap();
        Some((temp, git))
    }

    #[tokio::test]
    async fn test_not_a_repository() {
        let temp = TempDir::new().unwrap();
        let Ok(git) = GitCli::new(temp.path()) else {
            return;
        };
        assert!(!git.is_repository());

        let warnings = record_change(&git, &[], "Add pipeline: gh1").await;
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Not a git repository"));
    }

    #[tokio::test]
    async fn test_record_change_commits_locally() {
        let Some((temp, git)) = repository().await else {
            return;
        };
        assert!(git.is_repository());
        assert!(git.log(5).await.unwrap().is_empty());

        let dir = temp.path().join("pipelines/dlt/gh1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("dagster.yaml"), "enabled: true\n").unwrap();

        let status = git.status().await.unwrap();
        assert_eq!(status.untracked, vec!["pipelines/".to_string()]);

        let warnings = record_change(&git, &[dir.clone()], "Add pipeline: gh1").await;
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].starts_with("No git remote configured"));

        let log = git.log(5).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].message, "Add pipeline: gh1");
        assert!(git.status().await.unwrap().is_clean());

        // Deletions are staged too
        fs::remove_dir_all(&dir).unwrap();
        let warnings = record_change(&git, &[dir], "Delete pipeline: gh1").await;
        assert_eq!(warnings.len(), 1);
        assert_eq!(git.log(5).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_record_change_leaves_unrelated_staged_files() {
        let Some((temp, git)) = repository().await else {
            return;
        };
        let notes = temp.path().join("NOTES.md");
        fs::write(&notes, "draft\n").unwrap();
        git.add(&[notes]).await.unwrap();

        let dir = temp.path().join("pipelines/sling/pg1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("dagster.yaml"), "enabled: true\n").unwrap();

        let warnings = record_change(&git, &[dir], "Add pipeline: pg1").await;
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert_eq!(git.log(5).await.unwrap().len(), 1);

        let status = git.status().await.unwrap();
        assert_eq!(status.staged, vec!["NOTES.md".to_string()]);
        assert!(status.untracked.is_empty());
    }

    #[tokio::test]
    async fn test_diff_and_remotes() {
        let Some((temp, git)) = repository().await else {
            return;
        };
        let file = temp.path().join("README.md");
        fs::write(&file, "one\n").unwrap();
        git.add(&[file.clone()]).await.unwrap();
        git.commit("Initial commit", &[]).await.unwrap();

        fs::write(&file, "two\n").unwrap();
        let diff = git.diff(Some(&file)).await.unwrap();
        assert!(diff.contains("+two"));

        assert!(git.remotes().await.unwrap().is_empty());
        git.add_remote("origin", "https://example.com/repo.git").await.unwrap();
        assert_eq!(git.remotes().await.unwrap(), vec!["origin".to_string()]);
    }

    #[tokio::test]
    async fn test_commit_with_nothing_staged_fails() {
        let Some((_temp, git)) = repository().await else {
            return;
        };
        let err = git.commit("empty", &[]).await.unwrap_err();
        assert!(matches!(err, EltError::VcsFailed { .. }));
    }
}
