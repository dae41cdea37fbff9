use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::git::status::{parse_porcelain, FileStatus};

/// Thin wrapper over the `git` binary. Every diff accessor returns raw text.
pub struct GitClient {
    repo_dir: PathBuf,
}

impl GitClient {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    pub async fn staged_diff(&self) -> Result<String> {
        self.run(&["diff", "--cached"]).await
    }

    pub async fn commit_diff(&self, rev: &str) -> Result<String> {
        self.run(&["show", "--format=", "--patch", rev]).await
    }

    /// Changes on `branch` since it diverged from `base`.
    pub async fn branch_diff(&self, base: &str, branch: &str) -> Result<String> {
        let range = format!("{}...{}", base, branch);
        self.run(&["diff", &range]).await
    }

    /// Unstaged diffs of the given files, concatenated in order.
    pub async fn files_diff(&self, paths: &[String]) -> Result<String> {
        let mut combined = String::new();
        for path in paths {
            let diff = self.run(&["diff", "--", path]).await?;
            if diff.is_empty() {
                tracing::debug!("No unstaged changes in {}", path);
            }
            combined.push_str(&diff);
        }
        Ok(combined)
    }

    /// `(short sha, subject)` pairs, newest first.
    pub async fn recent_commits(&self, limit: usize) -> Result<Vec<(String, String)>> {
        let count = format!("-{}", limit);
        let output = self.run(&["log", &count, "--format=%h%x09%s"]).await?;
        Ok(output
            .lines()
            .filter_map(|line| line.split_once('\t'))
            .map(|(sha, subject)| (sha.to_string(), subject.to_string()))
            .collect())
    }

    pub async fn current_branch(&self) -> Result<String> {
        let output = self.run(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        Ok(output.trim().to_string())
    }

    pub async fn file_statuses(&self) -> Result<Vec<FileStatus>> {
        let output = self.run(&["status", "--porcelain"]).await?;
        Ok(parse_porcelain(&output))
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        tracing::debug!("Running git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Git(format!(
                "git {} failed ({}): {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for GitClient {
    fn default() -> Self {
        Self::new(".")
    }
}
