//! Per-commit change counts parsed from git's `--stat` summary line, e.g.
//! `3 files changed, 10 insertions(+), 2 deletions(-)`.
//!
//! Each count is parsed on its own. git omits a clause whose count is zero,
//! so an absent clause stays unset instead of becoming `0`.

use std::path::Path;

use regex::Regex;

use crate::error::Result;
use crate::repository::GitOperations;

/// Files changed, insertions and deletions of one commit; any may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeStats {
    pub files_changed: Option<u64>,
    pub insertions: Option<u64>,
    pub deletions: Option<u64>,
}

/// Parses stat summaries and fetches them from git.
#[derive(Debug, Clone)]
pub struct StatsExtractor {
    files: Regex,
    insertions: Regex,
    deletions: Regex,
}

impl StatsExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            files: Regex::new(r"^\s+(\d+)\s+files?\s+changed")?,
            insertions: Regex::new(r"(\d+)\s+insertions?\(\+\)")?,
            deletions: Regex::new(r"(\d+)\s+deletions?\(-\)")?,
        })
    }

    /// Parse the last line of `--stat` output.
    ///
    /// Only an indented `N file(s) changed` line counts as a summary, so the
    /// oneline header of a commit without file changes is never read.
    pub fn parse(&self, stat_output: &str) -> ChangeStats {
        let summary = stat_output.lines().last().unwrap_or("");
        if !self.files.is_match(summary) {
            return ChangeStats::default();
        }
        ChangeStats {
            files_changed: capture_count(&self.files, summary),
            insertions: capture_count(&self.insertions, summary),
            deletions: capture_count(&self.deletions, summary),
        }
    }

    /// Counts for commit `sha`. A failed `git show` yields unset counts.
    pub fn extract(&self, git: &dyn GitOperations, repo_dir: &Path, sha: &str) -> ChangeStats {
        match git.show_stat(repo_dir, sha) {
            Ok(out) => self.parse(&out),
            Err(e) => {
                log::warn!("no stat summary for {}: {}", sha, e);
                ChangeStats::default()
            }
        }
    }
}

fn capture_count(rx: &Regex, text: &str) -> Option<u64> {
    rx.captures(text)?.get(1)?.as_str().parse().ok()
}
