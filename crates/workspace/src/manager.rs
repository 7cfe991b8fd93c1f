// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace Manager (spec.md §4.1): per-spawn worktrees on top of a
//! content-versioned repository.

use crate::branch::sanitize_for_path;
use crate::error::WorkspaceError;
use crate::git;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Conventional directory name for per-spawn worktrees, relative to the
/// repository root (spec.md §4.1 `Create`: `<repo>/<worktree-dir>/...`).
pub const WORKTREE_DIR: &str = ".conclave-worktrees";

/// Name of the symlink placed inside each worktree pointing at the
/// repository-local metadata directory so child agents share persistent
/// records (spec.md §4.1 `Create`, §6.2).
pub const METADATA_LINK_NAME: &str = ".conclave-meta";

/// Result of [`WorkspaceManager::auto_commit_if_dirty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoCommitResult {
    pub commit_hash: String,
    pub committed: bool,
}

impl AutoCommitResult {
    fn clean() -> Self {
        Self {
            commit_hash: String::new(),
            committed: false,
        }
    }
}

/// Manages git worktrees for isolated per-spawn workspaces.
///
/// `repo_root` is the parent workspace's repository; callers serialize
/// per-path access themselves (spec.md §4.1 concurrency note).
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    repo_root: PathBuf,
    metadata_dir: PathBuf,
}

impl WorkspaceManager {
    pub fn new(repo_root: impl Into<PathBuf>, metadata_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            metadata_dir: metadata_dir.into(),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Conventional worktree path for a (sanitized) branch name.
    pub fn worktree_path(&self, branch: &str) -> PathBuf {
        self.repo_root
            .join(WORKTREE_DIR)
            .join(sanitize_for_path(branch))
    }

    /// `Create(branchName)` (spec.md §4.1): branch from current HEAD, then
    /// materialize a worktree.
    #[instrument(skip(self), fields(branch = %branch_name))]
    pub async fn create(&self, branch_name: &str) -> Result<PathBuf, WorkspaceError> {
        self.create_from(branch_name, "HEAD").await
    }

    /// `CreateFrom(branchName, sourceRef)` (spec.md §4.1): same as `Create`
    /// but starting at an arbitrary commit-ish.
    #[instrument(skip(self), fields(branch = %branch_name, source = %source_ref))]
    pub async fn create_from(&self, branch_name: &str, source_ref: &str) -> Result<PathBuf, WorkspaceError> {
        let path = self.worktree_path(branch_name);
        let start = std::time::Instant::now();

        let result = self.worktree_add(&path, Some(branch_name), source_ref, false).await;
        match result {
            Ok(()) => {
                self.link_metadata(&path)?;
                info!(path = %path.display(), elapsed_ms = start.elapsed().as_millis(), "workspace created");
                Ok(path)
            }
            Err(e) => {
                self.rollback_failed_create(branch_name, &path).await;
                Err(e)
            }
        }
    }

    /// `CreateDetached(name)` (spec.md §4.1): read-only worktree at a
    /// detached commit, no branch.
    #[instrument(skip(self), fields(name = %name))]
    pub async fn create_detached(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        let path = self.worktree_path(name);
        let start = std::time::Instant::now();

        match self.worktree_add(&path, None, "HEAD", true).await {
            Ok(()) => {
                self.link_metadata(&path)?;
                info!(path = %path.display(), elapsed_ms = start.elapsed().as_millis(), "detached workspace created");
                Ok(path)
            }
            Err(e) => {
                let _ = std::fs::remove_dir_all(&path);
                Err(e)
            }
        }
    }

    /// Shared low-level materialization: `git worktree add [-b <branch>]
    /// [--detach] <path> <source-ref>`.
    async fn worktree_add(
        &self,
        path: &Path,
        branch: Option<&str>,
        source_ref: &str,
        detach: bool,
    ) -> Result<(), WorkspaceError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WorkspaceError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let path_str = path.to_string_lossy().into_owned();
        let mut args: Vec<&str> = vec!["worktree", "add"];
        if detach {
            args.push("--detach");
            args.push(&path_str);
            args.push(source_ref);
        } else if let Some(branch) = branch {
            args.push("-b");
            args.push(branch);
            args.push(&path_str);
            args.push(source_ref);
        }

        git::run(&self.repo_root, &args).await?;
        Ok(())
    }

    /// On failed `Create`: delete the branch (if it was created) and remove
    /// the partially materialized path.
    async fn rollback_failed_create(&self, branch_name: &str, path: &Path) {
        let _ = std::fs::remove_dir_all(path);
        git::run_best_effort(&self.repo_root, &["branch", "-D", branch_name]).await;
        git::run_best_effort(&self.repo_root, &["worktree", "prune"]).await;
    }

    /// Place a symlink inside the worktree pointing at the repository-local
    /// metadata directory (spec.md §4.1 `Create`, §6.2).
    fn link_metadata(&self, worktree_path: &Path) -> Result<(), WorkspaceError> {
        let link = worktree_path.join(METADATA_LINK_NAME);
        if link.exists() || link.symlink_metadata().is_ok() {
            return Ok(());
        }
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(&self.metadata_dir, &link).map_err(|e| WorkspaceError::Io {
                path: link.clone(),
                source: e,
            })?;
        }
        #[cfg(not(unix))]
        {
            let _ = &link;
        }
        Ok(())
    }

    /// `Remove(path, deleteBranch)` (spec.md §4.1): forcibly remove the
    /// worktree, falling back to filesystem removal plus prune, optionally
    /// deleting the branch.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn remove(&self, path: &Path, branch_name: Option<&str>, delete_branch: bool) -> Result<(), WorkspaceError> {
        if git::run(&self.repo_root, &["worktree", "remove", "--force", &path.to_string_lossy()])
            .await
            .is_err()
        {
            warn!(path = %path.display(), "git worktree remove failed, falling back to filesystem removal");
            if path.exists() {
                std::fs::remove_dir_all(path).map_err(|e| WorkspaceError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            }
            git::run_best_effort(&self.repo_root, &["worktree", "prune"]).await;
        }

        if delete_branch {
            if let Some(branch) = branch_name {
                git::run_best_effort(&self.repo_root, &["branch", "-D", branch]).await;
            }
        }
        Ok(())
    }

    /// `AutoCommitIfDirty(path, message)` (spec.md §4.1): stage and commit
    /// all changes if the workspace has any modified/added/deleted paths.
    #[instrument(skip(self, message), fields(path = %path.display()))]
    pub async fn auto_commit_if_dirty(&self, path: &Path, message: &str) -> Result<AutoCommitResult, WorkspaceError> {
        let status = git::run(path, &["status", "--porcelain"]).await?;
        if git::stdout_string(&status).is_empty() {
            return Ok(AutoCommitResult::clean());
        }

        git::run(path, &["add", "-A"]).await?;
        git::run(path, &["commit", "-m", message]).await?;
        let rev = git::run(path, &["rev-parse", "HEAD"]).await?;
        let hash = git::stdout_string(&rev);
        info!(path = %path.display(), commit = %hash, "auto-committed dirty workspace");
        Ok(AutoCommitResult {
            commit_hash: hash,
            committed: true,
        })
    }

    /// `Merge(branchName, message)` (spec.md §4.1): merge into the current
    /// parent branch; returns the resulting commit hash.
    pub async fn merge(&self, branch_name: &str, message: &str) -> Result<String, WorkspaceError> {
        self.merge_impl(branch_name, message, false).await
    }

    /// `MergeSquash(branchName, message)` (spec.md §4.1).
    pub async fn merge_squash(&self, branch_name: &str, message: &str) -> Result<String, WorkspaceError> {
        self.merge_impl(branch_name, message, true).await
    }

    async fn merge_impl(&self, branch_name: &str, message: &str, squash: bool) -> Result<String, WorkspaceError> {
        if squash {
            git::run(&self.repo_root, &["merge", "--squash", branch_name]).await?;
            git::run(&self.repo_root, &["commit", "-m", message]).await?;
        } else {
            git::run(&self.repo_root, &["merge", "--no-ff", "-m", message, branch_name]).await?;
        }
        let rev = git::run(&self.repo_root, &["rev-parse", "HEAD"]).await?;
        Ok(git::stdout_string(&rev))
    }

    /// `Diff(branchName)` (spec.md §4.1): textual diff from HEAD to the
    /// branch tip.
    pub async fn diff(&self, branch_name: &str) -> Result<String, WorkspaceError> {
        let out = git::run(&self.repo_root, &["diff", "HEAD", branch_name]).await?;
        Ok(git::stdout_string(&out))
    }

    /// `CleanupStale(ttl, deadPaths)` (spec.md §4.1): removes worktrees
    /// whose path is in `dead_paths`, or whose mtime predates `ttl` and
    /// which are not registered with the repository.
    #[instrument(skip(self, dead_paths))]
    pub async fn cleanup_stale(&self, ttl: Duration, dead_paths: &HashSet<PathBuf>) -> Result<usize, WorkspaceError> {
        let registered = self.registered_worktree_paths().await?;
        let root = self.repo_root.join(WORKTREE_DIR);
        if !root.exists() {
            return Ok(0);
        }

        let mut removed = 0usize;
        let entries = std::fs::read_dir(&root).map_err(|e| WorkspaceError::Io {
            path: root.clone(),
            source: e,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let is_dead = dead_paths.contains(&path);
            let is_stale = !registered.contains(&path) && is_older_than(&path, ttl);
            if is_dead || is_stale {
                if self.remove(&path, None, false).await.is_ok() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    async fn registered_worktree_paths(&self) -> Result<HashSet<PathBuf>, WorkspaceError> {
        let out = git::run(&self.repo_root, &["worktree", "list", "--porcelain"]).await?;
        let text = git::stdout_string(&out);
        let mut paths = HashSet::new();
        for line in text.lines() {
            if let Some(p) = line.strip_prefix("worktree ") {
                paths.insert(PathBuf::from(p));
            }
        }
        Ok(paths)
    }
}

fn is_older_than(path: &Path, ttl: Duration) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .map(|age| age > ttl)
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
