//! # Configuration
//!
//! Run settings for a scan, optionally loaded from a YAML file and then
//! overridden by command-line flags.
//!
//! ```yaml
//! repos:
//!   - BurntSushi/ripgrep
//!   - sharkdp/bat
//! root: /data/repos
//! since: 2019-01-01
//! per-branch-limit: 100
//! top-branches: 2
//! out: results/extract_refs.csv
//! ```
//!
//! [`MinerConfig`] is the loose, serializable form. [`MinerConfig::resolve`]
//! validates it and produces a [`ScanPlan`], the immutable value the pipeline
//! actually runs from. The commit-message patterns are fixed at build time
//! and are attached during resolution.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dataset::derive_unclassified_path;
use crate::defaults;
use crate::error::{Error, Result};
use crate::miner::LogQuery;
use crate::repository::RepoId;

/// Scan settings as written in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct MinerConfig {
    /// Repositories as `owner/name`; empty means the built-in list.
    pub repos: Vec<String>,
    /// Directory holding the working copies.
    pub root: PathBuf,
    /// Hosting prefix for clone URLs.
    pub remote_base: String,
    /// Only consider commits on or after this ISO date.
    pub since: Option<String>,
    /// Matching commits read per branch; 0 = unlimited.
    pub per_branch_limit: usize,
    /// Remote branches scanned per repository.
    pub top_branches: usize,
    /// Extension of the files whose diffs are classified.
    pub extension: String,
    /// Classified dataset path.
    pub out: PathBuf,
    /// Unclassified dataset path; derived from `out` when unset.
    pub unclassified_out: Option<PathBuf>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            repos: Vec::new(),
            root: defaults::default_clone_root(),
            remote_base: defaults::DEFAULT_REMOTE_BASE.to_string(),
            since: None,
            per_branch_limit: defaults::DEFAULT_PER_BRANCH_LIMIT,
            top_branches: defaults::DEFAULT_TOP_BRANCHES,
            extension: defaults::DEFAULT_EXTENSION.to_string(),
            out: PathBuf::from(defaults::DEFAULT_OUT),
            unclassified_out: None,
        }
    }
}

/// Parse a YAML config. An empty document yields the defaults.
pub fn parse(yaml: &str) -> Result<MinerConfig> {
    if yaml.trim().is_empty() {
        return Ok(MinerConfig::default());
    }
    serde_yaml::from_str(yaml).map_err(|e| {
        let message = e.to_string();
        let hint = message.contains("unknown field").then(|| {
            "valid keys are repos, root, remote-base, since, per-branch-limit, \
             top-branches, extension, out, unclassified-out"
                .to_string()
        });
        Error::ConfigParse { message, hint }
    })
}

/// Read and parse a YAML config file.
pub fn from_file(path: &Path) -> Result<MinerConfig> {
    let content = fs::read_to_string(path).map_err(|e| Error::ConfigParse {
        message: format!("cannot read {}: {}", path.display(), e),
        hint: None,
    })?;
    parse(&content)
}

/// Parse an ISO calendar date (`YYYY-MM-DD`).
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDate {
        value: value.to_string(),
    })
}

/// Validated, immutable settings for one run.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub repos: Vec<RepoId>,
    pub root: PathBuf,
    pub remote_base: String,
    pub query: LogQuery,
    pub top_branches: usize,
    pub extension: String,
    pub out: PathBuf,
    pub unclassified_out: PathBuf,
}

impl MinerConfig {
    /// Validate the settings and attach the message `patterns`.
    pub fn resolve(&self, patterns: &[&str]) -> Result<ScanPlan> {
        let repo_specs: Vec<&str> = if self.repos.is_empty() {
            defaults::DEFAULT_REPOS.to_vec()
        } else {
            self.repos.iter().map(String::as_str).collect()
        };
        let mut repos = repo_specs
            .into_iter()
            .map(str::parse)
            .collect::<Result<Vec<RepoId>>>()?;
        // Repeats keep their first position.
        let mut listed = HashSet::new();
        repos.retain(|repo| listed.insert(repo.clone()));

        if self.top_branches == 0 {
            return Err(Error::ConfigParse {
                message: "top-branches must be at least 1".to_string(),
                hint: None,
            });
        }

        let extension = self.extension.trim().trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\']) {
            return Err(Error::ConfigParse {
                message: format!("invalid extension '{}'", self.extension),
                hint: Some("use a bare extension such as rs".to_string()),
            });
        }

        let since = self.since.as_deref().map(parse_date).transpose()?;

        let unclassified_out = self
            .unclassified_out
            .clone()
            .unwrap_or_else(|| derive_unclassified_path(&self.out));
        if unclassified_out == self.out {
            return Err(Error::ConfigParse {
                message: format!(
                    "classified and unclassified outputs are both {}",
                    self.out.display()
                ),
                hint: None,
            });
        }

        Ok(ScanPlan {
            repos,
            root: self.root.clone(),
            remote_base: self.remote_base.clone(),
            query: LogQuery {
                patterns: patterns.iter().map(|p| p.to_string()).collect(),
                since,
                limit: self.per_branch_limit,
            },
            top_branches: self.top_branches,
            extension: extension.to_string(),
            out: self.out.clone(),
            unclassified_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            r#"
repos:
  - BurntSushi/ripgrep
  - sharkdp/bat
root: /data/repos
remote-base: https://git.example.com
since: "2019-01-01"
per-branch-limit: 0
top-branches: 2
extension: rs
out: results/refs.csv
unclassified-out: results/other.csv
"#,
        )
        .unwrap();

        assert_eq!(config.repos, vec!["BurntSushi/ripgrep", "sharkdp/bat"]);
        assert_eq!(config.root, PathBuf::from("/data/repos"));
        assert_eq!(config.remote_base, "https://git.example.com");
        assert_eq!(config.since.as_deref(), Some("2019-01-01"));
        assert_eq!(config.per_branch_limit, 0);
        assert_eq!(config.top_branches, 2);
        assert_eq!(
            config.unclassified_out,
            Some(PathBuf::from("results/other.csv"))
        );
    }

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        let config = parse("top-branches: 5\n").unwrap();
        assert_eq!(config.top_branches, 5);
        assert_eq!(config.per_branch_limit, defaults::DEFAULT_PER_BRANCH_LIMIT);
        assert_eq!(config.extension, "rs");
        assert!(config.repos.is_empty());
    }

    #[test]
    fn test_parse_empty_document() {
        assert_eq!(parse("").unwrap(), MinerConfig::default());
        assert_eq!(parse("  \n").unwrap(), MinerConfig::default());
    }

    #[test]
    fn test_parse_unknown_key_has_hint() {
        let err = parse("repoz: [a/b]\n").unwrap_err();
        let display = err.to_string();
        assert!(display.contains("Configuration parsing error"));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = from_file(Path::new("/nonexistent/refactor-scan.yaml")).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_from_file_reads_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scan.yaml");
        fs::write(&path, "repos: [typst/typst]\n").unwrap();
        let config = from_file(&path).unwrap();
        assert_eq!(config.repos, vec!["typst/typst"]);
    }

    #[test]
    fn test_resolve_defaults() {
        let plan = MinerConfig::default()
            .resolve(defaults::MESSAGE_PATTERNS)
            .unwrap();
        assert_eq!(plan.repos.len(), defaults::DEFAULT_REPOS.len());
        assert_eq!(plan.repos[0].full_name(), "denoland/deno");
        assert_eq!(plan.query.limit, 200);
        assert_eq!(plan.query.patterns.len(), defaults::MESSAGE_PATTERNS.len());
        assert_eq!(plan.query.since, None);
        assert_eq!(plan.top_branches, 3);
        assert_eq!(plan.out, PathBuf::from("extract_refs.csv"));
        assert_eq!(
            plan.unclassified_out,
            PathBuf::from("extract_refs_unclassified.csv")
        );
    }

    #[test]
    fn test_resolve_drops_repeated_repos() {
        let config = MinerConfig {
            repos: vec![
                "acme/widgets".to_string(),
                "typst/typst".to_string(),
                "acme/widgets".to_string(),
                "acme/widgets.git".to_string(),
            ],
            ..Default::default()
        };
        let plan = config.resolve(&[]).unwrap();
        let names: Vec<String> = plan.repos.iter().map(RepoId::full_name).collect();
        assert_eq!(names, vec!["acme/widgets", "typst/typst"]);
    }

    #[test]
    fn test_resolve_since_and_extension() {
        let config = MinerConfig {
            since: Some("2021-07-15".to_string()),
            extension: ".rs".to_string(),
            ..Default::default()
        };
        let plan = config.resolve(&["extract"]).unwrap();
        assert_eq!(plan.query.since, NaiveDate::from_ymd_opt(2021, 7, 15));
        assert_eq!(plan.extension, "rs");
    }

    #[test]
    fn test_resolve_rejects_bad_values() {
        let bad_date = MinerConfig {
            since: Some("15/07/2021".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            bad_date.resolve(&[]).unwrap_err(),
            Error::InvalidDate { .. }
        ));

        let no_branches = MinerConfig {
            top_branches: 0,
            ..Default::default()
        };
        assert!(no_branches.resolve(&[]).is_err());

        let bad_repo = MinerConfig {
            repos: vec!["not-a-repo".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            bad_repo.resolve(&[]).unwrap_err(),
            Error::InvalidRepository { .. }
        ));

        let bad_ext = MinerConfig {
            extension: "src/rs".to_string(),
            ..Default::default()
        };
        assert!(bad_ext.resolve(&[]).is_err());

        let same_out = MinerConfig {
            unclassified_out: Some(PathBuf::from("extract_refs.csv")),
            ..Default::default()
        };
        assert!(same_out.resolve(&[]).is_err());
    }
}
