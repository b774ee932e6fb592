//! # Repository Management
//!
//! This module owns the local working copies the miner scans. A
//! [`RepositoryManager`] maps each `owner/name` identifier to a directory under
//! a configurable root and makes sure that directory holds an up-to-date
//! clone before any history is read.
//!
//! ## Design
//!
//! All interaction with git goes through the [`GitOperations`] trait. The
//! default implementation, [`DefaultGitOperations`], shells out to the system
//! `git` binary via [`crate::git`]. Tests swap in an in-memory implementation
//! so branch ranking, deduplication and routing can be exercised without
//! touching the network or the filesystem.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::branches;
use crate::error::{Error, Result};
use crate::miner::{self, CommitMeta, LogQuery};

/// An `owner/name` repository identifier on the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `owner/name`, as used in dataset rows and progress output.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Web URL of a commit in this repository.
    pub fn commit_url(&self, sha: &str) -> String {
        format!("https://github.com/{}/{}/commit/{}", self.owner, self.name, sha)
    }
}

impl FromStr for RepoId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidRepository {
            spec: s.to_string(),
            message: message.to_string(),
        };

        let trimmed = s.trim();
        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| invalid("expected owner/name"))?;
        if name.contains('/') {
            return Err(invalid("expected exactly one '/'"));
        }
        let name = name.strip_suffix(".git").unwrap_or(name);
        if owner.is_empty() || name.is_empty() {
            return Err(invalid("owner and name must both be non-empty"));
        }
        if [owner, name].iter().any(|part| *part == "." || *part == "..") {
            return Err(invalid("'.' and '..' are not repository names"));
        }
        if owner.contains(char::is_whitespace) || name.contains(char::is_whitespace) {
            return Err(invalid("whitespace is not allowed"));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Blob-less partial clone of `url` into `target_dir`.
    fn clone_partial(&self, repo: &RepoId, url: &str, target_dir: &Path) -> Result<()>;

    /// Fetch all remote branches and tags, pruning stale refs.
    fn fetch_all(&self, repo_dir: &Path) -> Result<()>;

    /// Remote branch names such as `origin/main`, without symbolic refs.
    fn list_remote_branches(&self, repo_dir: &Path) -> Result<Vec<String>>;

    /// Number of commits reachable from `branch`.
    fn count_commits(&self, repo_dir: &Path, branch: &str) -> Result<u64>;

    /// Commits on `branch` matching `query`, most recent first.
    fn log_matching(
        &self,
        repo_dir: &Path,
        branch: &str,
        query: &LogQuery,
    ) -> Result<Vec<CommitMeta>>;

    /// Zero-context unified diff of `sha` limited to `pathspec`.
    fn show_patch(&self, repo_dir: &Path, sha: &str, pathspec: &str) -> Result<String>;

    /// `--stat` output of `sha`.
    fn show_stat(&self, repo_dir: &Path, sha: &str) -> Result<String>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command.
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn clone_partial(&self, repo: &RepoId, url: &str, target_dir: &Path) -> Result<()> {
        crate::git::clone_partial(&repo.full_name(), url, target_dir)
    }

    fn fetch_all(&self, repo_dir: &Path) -> Result<()> {
        crate::git::fetch_all(repo_dir)
    }

    fn list_remote_branches(&self, repo_dir: &Path) -> Result<Vec<String>> {
        let out = crate::git::remote_refs(repo_dir)?;
        Ok(branches::parse_remote_refs(&out))
    }

    fn count_commits(&self, repo_dir: &Path, branch: &str) -> Result<u64> {
        crate::git::rev_list_count(repo_dir, branch)
    }

    fn log_matching(
        &self,
        repo_dir: &Path,
        branch: &str,
        query: &LogQuery,
    ) -> Result<Vec<CommitMeta>> {
        let out = crate::git::git(query.to_args(branch), repo_dir)?;
        Ok(miner::parse_log(&out, branch))
    }

    fn show_patch(&self, repo_dir: &Path, sha: &str, pathspec: &str) -> Result<String> {
        crate::git::show_patch(repo_dir, sha, pathspec)
    }

    fn show_stat(&self, repo_dir: &Path, sha: &str) -> Result<String> {
        crate::git::show_stat(repo_dir, sha)
    }
}

/// Materializes working copies under a root directory.
pub struct RepositoryManager {
    root: PathBuf,
    remote_base: String,
    git_ops: Box<dyn GitOperations>,
}

impl RepositoryManager {
    /// Creates a manager backed by the system `git`.
    ///
    /// `remote_base` is the hosting prefix clone URLs are built from, e.g.
    /// `https://github.com`.
    pub fn new(root: PathBuf, remote_base: impl Into<String>) -> Self {
        Self::with_operations(root, remote_base, Box::new(DefaultGitOperations))
    }

    /// Creates a manager with a custom `GitOperations` implementation.
    pub fn with_operations(
        root: PathBuf,
        remote_base: impl Into<String>,
        git_ops: Box<dyn GitOperations>,
    ) -> Self {
        Self {
            root,
            remote_base: remote_base.into(),
            git_ops,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The git backend, shared with the later pipeline stages.
    pub fn git(&self) -> &dyn GitOperations {
        self.git_ops.as_ref()
    }

    /// Clone URL for `repo`: `<remote_base>/<owner>/<name>.git`.
    pub fn clone_url(&self, repo: &RepoId) -> String {
        format!(
            "{}/{}/{}.git",
            self.remote_base.trim_end_matches('/'),
            repo.owner(),
            repo.name()
        )
    }

    /// Working-copy directories for `repos`, in the same order.
    ///
    /// A repository lives at `<root>/<name>` unless another repository in the
    /// list shares its name, in which case it gets `<root>/<owner>__<name>`.
    pub fn plan_paths(&self, repos: &[RepoId]) -> Vec<PathBuf> {
        let mut name_counts: HashMap<&str, usize> = HashMap::new();
        for repo in repos {
            *name_counts.entry(repo.name()).or_default() += 1;
        }

        repos
            .iter()
            .map(|repo| {
                if name_counts[repo.name()] > 1 {
                    self.root.join(format!("{}__{}", repo.owner(), repo.name()))
                } else {
                    self.root.join(repo.name())
                }
            })
            .collect()
    }

    /// Ensures `dest` holds a current copy of `repo`.
    ///
    /// A missing copy is cloned and then fetched so every remote branch and
    /// tag is present. An existing copy is only fetched; it is never
    /// re-cloned.
    pub fn ensure(&self, repo: &RepoId, dest: &Path) -> Result<()> {
        if dest.exists() {
            log::info!("fetching {} in {}", repo, dest.display());
            self.git_ops.fetch_all(dest)
        } else {
            log::info!("cloning {} into {}", repo, dest.display());
            self.git_ops
                .clone_partial(repo, &self.clone_url(repo), dest)?;
            self.git_ops.fetch_all(dest)
        }
    }
}
