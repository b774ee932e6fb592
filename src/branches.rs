//! Branch selection: rank a repository's remote branches by how many commits
//! each one reaches and keep the busiest few.
//!
//! Scanning every branch of a large repository is expensive and mostly
//! rescans the same history; the top-N branches by reachable commit count
//! cover the dominant development lines cheaply.

use std::cmp::Ordering;
use std::path::Path;

use crate::error::Result;
use crate::repository::GitOperations;

/// A remote branch and the number of commits reachable from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    /// Short remote name, e.g. `origin/main`.
    pub name: String,
    pub commit_count: u64,
}

impl BranchRef {
    pub fn new(name: impl Into<String>, commit_count: u64) -> Self {
        Self {
            name: name.into(),
            commit_count,
        }
    }
}

/// Parse `for-each-ref --format=%(refname)%09%(symref)` output into short
/// remote branch names.
///
/// Symbolic refs (the `origin/HEAD` default-branch pointer) are skipped,
/// whether or not git reports their target.
pub fn parse_remote_refs(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let refname = fields.next()?.trim();
            let symref = fields.next().unwrap_or("").trim();
            if refname.is_empty() || !symref.is_empty() {
                return None;
            }
            let short = refname.strip_prefix("refs/remotes/").unwrap_or(refname);
            if short.ends_with("/HEAD") {
                return None;
            }
            Some(short.to_string())
        })
        .collect()
}

/// Order branches by commit count (descending, ties by name descending),
/// drop empty ones and keep at most `top_n`.
pub fn rank_branches(mut branches: Vec<BranchRef>, top_n: usize) -> Vec<BranchRef> {
    branches.retain(|b| b.commit_count > 0);
    branches.sort_by(|a, b| match b.commit_count.cmp(&a.commit_count) {
        Ordering::Equal => b.name.cmp(&a.name),
        other => other,
    });
    branches.truncate(top_n);
    branches
}

/// List, count and rank the remote branches of the working copy at
/// `repo_dir`.
///
/// A branch whose count cannot be computed is treated as empty and therefore
/// never selected. An empty result is not an error; the caller decides how
/// to report it.
pub fn select_top_branches(
    git: &dyn GitOperations,
    repo_dir: &Path,
    top_n: usize,
) -> Result<Vec<BranchRef>> {
    let names = git.list_remote_branches(repo_dir)?;
    let scored = names
        .into_iter()
        .map(|name| {
            let count = git.count_commits(repo_dir, &name).unwrap_or_else(|e| {
                log::debug!("counting commits on {} failed: {}", name, e);
                0
            });
            BranchRef::new(name, count)
        })
        .collect();

    let ranked = rank_branches(scored, top_n);
    log::debug!(
        "selected branches: {}",
        ranked
            .iter()
            .map(|b| format!("{} ({})", b.name, b.commit_count))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(ranked)
}
