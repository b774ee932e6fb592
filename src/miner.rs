//! Commit mining: pull candidate commits out of a branch's history by
//! matching commit messages, and keep each commit only the first time it is
//! seen in a repository.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;

use crate::branches::BranchRef;
use crate::error::Result;
use crate::repository::GitOperations;

/// Field separator in the log format (ASCII unit separator).
pub const FIELD_SEPARATOR: char = '\u{1f}';

/// `git log` pretty format: hash, author date, author name, subject.
pub const LOG_FORMAT: &str = "--pretty=format:%H%x1f%ad%x1f%an%x1f%s";

/// Lightweight metadata for one candidate commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMeta {
    pub sha: String,
    pub author_date: NaiveDate,
    pub author: String,
    pub subject: String,
    /// Branch the commit was read from, e.g. `origin/main`.
    pub branch: String,
}

/// What to ask `git log` for on every branch.
#[derive(Debug, Clone)]
pub struct LogQuery {
    /// Message patterns; a commit matches if any one of them matches.
    pub patterns: Vec<String>,
    /// Only commits at or after this date.
    pub since: Option<NaiveDate>,
    /// Per-branch cap; 0 means unlimited.
    pub limit: usize,
}

impl LogQuery {
    /// Arguments for `git log` on `branch`.
    ///
    /// Multiple `--grep` options are OR-ed by git, and `-i` makes them
    /// case-insensitive.
    pub fn to_args(&self, branch: &str) -> Vec<String> {
        let mut args = vec![
            "log".to_string(),
            branch.to_string(),
            "-i".to_string(),
            LOG_FORMAT.to_string(),
            "--date=short".to_string(),
        ];
        if self.limit > 0 {
            args.push(format!("-n{}", self.limit));
        }
        for pattern in &self.patterns {
            args.push("--grep".to_string());
            args.push(pattern.clone());
        }
        // An explicit midnight; a bare date makes git keep the current time of day.
        if let Some(since) = self.since {
            args.push(format!("--since={} 00:00:00", since.format("%Y-%m-%d")));
        }
        args.push("--".to_string());
        args
    }
}

/// Parse [`LOG_FORMAT`] output. Lines that do not have all four fields or a
/// valid date are skipped with a warning.
pub fn parse_log(output: &str, branch: &str) -> Vec<CommitMeta> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut fields = line.splitn(4, FIELD_SEPARATOR);
            let (sha, date, author, subject) =
                (fields.next()?, fields.next()?, fields.next()?, fields.next());
            let Some(subject) = subject else {
                log::warn!("skipping malformed log line: {:?}", line);
                return None;
            };
            let author_date = match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
                Ok(date) => date,
                Err(_) => {
                    log::warn!("skipping log line with bad date {:?}", date);
                    return None;
                }
            };
            Some(CommitMeta {
                sha: sha.trim().to_string(),
                author_date,
                author: author.to_string(),
                subject: subject.to_string(),
                branch: branch.to_string(),
            })
        })
        .collect()
}

/// Hashes already recorded for the current repository.
#[derive(Debug, Default)]
pub struct SeenSet {
    hashes: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `sha` as seen; returns `true` only on its first occurrence.
    pub fn insert(&mut self, sha: &str) -> bool {
        self.hashes.insert(sha.to_string())
    }

    pub fn contains(&self, sha: &str) -> bool {
        self.hashes.contains(sha)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// Scans the selected branches of one repository, in ranked order, yielding
/// every matching commit once.
///
/// Branches must be scanned highest-ranked first: a commit reachable from
/// several branches is attributed to whichever branch produced it first.
pub struct CommitMiner<'a> {
    git: &'a dyn GitOperations,
    repo_dir: &'a Path,
    query: &'a LogQuery,
    seen: SeenSet,
}

impl<'a> CommitMiner<'a> {
    pub fn new(git: &'a dyn GitOperations, repo_dir: &'a Path, query: &'a LogQuery) -> Self {
        Self {
            git,
            repo_dir,
            query,
            seen: SeenSet::new(),
        }
    }

    /// New commits on `branch`, most recent first. Commits already yielded by
    /// an earlier branch are dropped silently.
    pub fn scan_branch(&mut self, branch: &BranchRef) -> Result<Vec<CommitMeta>> {
        let hits = self
            .git
            .log_matching(self.repo_dir, &branch.name, self.query)?;
        let total = hits.len();
        let fresh: Vec<CommitMeta> = hits
            .into_iter()
            .filter(|meta| self.seen.insert(&meta.sha))
            .collect();
        log::debug!(
            "{}: {} matching commits, {} new",
            branch.name,
            total,
            fresh.len()
        );
        Ok(fresh)
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }
}
