//! # Output Configuration
//!
//! This module controls how scan progress looks on the terminal: whether
//! colors and emoji are used, and how each repository banner, recorded
//! commit and skipped repository is rendered.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use refactor_scan::output::{ConsoleProgress, OutputConfig};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//! let mut progress = ConsoleProgress::new(config, false);
//! pipeline.run(&mut writer, &mut progress)?;
//! ```

use std::env;
use std::path::Path;

use console::style;

use crate::classify::join_tags;
use crate::dataset::CommitRecord;
use crate::error::Error;
use crate::pipeline::{FailureStage, ProgressReporter, RunSummary};
use crate::repository::RepoId;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    /// Detect whether color output is supported based on environment.
    fn detect_color_support() -> bool {
        // The presence of NO_COLOR (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Abbreviated commit hash as shown in progress lines.
pub fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

/// Prints scan progress to stdout and skipped repositories to stderr.
pub struct ConsoleProgress {
    config: OutputConfig,
    quiet: bool,
}

impl ConsoleProgress {
    /// `quiet` silences banners and per-commit lines; errors still print.
    pub fn new(config: OutputConfig, quiet: bool) -> Self {
        Self { config, quiet }
    }

    pub fn banner_line(&self, repo: &RepoId) -> String {
        format!(
            "{} Scanning {}",
            emoji(&self.config, "🔍", ">>>"),
            style(repo.full_name())
                .bold()
                .force_styling(self.config.use_color)
        )
    }

    /// `<repo> <date> <sha> [<tags>] <subject> <url> (<branch>)`
    pub fn record_line(&self, record: &CommitRecord) -> String {
        let color = self.config.use_color;
        let tags = if record.is_classified() {
            style(format!("[{}]", join_tags(&record.tags)))
                .green()
                .force_styling(color)
        } else {
            style("[unclassified]".to_string())
                .yellow()
                .force_styling(color)
        };
        format!(
            "  {} {} {} {} {} {} ({})",
            record.repo,
            record.author_date.format("%Y-%m-%d"),
            style(short_sha(&record.sha)).dim().force_styling(color),
            tags,
            record.subject,
            style(record.commit_url()).blue().force_styling(color),
            record.branch
        )
    }

    pub fn failure_line(&self, repo: &RepoId, stage: FailureStage, error: &Error) -> String {
        format!(
            "{} {} {}: {}",
            style("[error]").red().force_styling(self.config.use_color),
            stage.label(),
            repo,
            error
        )
    }

    pub fn no_branches_line(&self, repo: &RepoId) -> String {
        format!(
            "{} no remote branches found for {}",
            style("[warn]").yellow().force_styling(self.config.use_color),
            repo
        )
    }

    /// Final report printed after a successful run.
    pub fn summary_lines(
        &self,
        summary: &RunSummary,
        classified_path: &Path,
        unclassified_path: &Path,
    ) -> Vec<String> {
        vec![
            format!(
                "{} Done: {} repositories scanned, {} skipped",
                emoji(&self.config, "✅", "[done]"),
                summary.scanned(),
                summary.skipped()
            ),
            format!(
                "   {} classified commits -> {}",
                summary.classified(),
                classified_path.display()
            ),
            format!(
                "   {} unclassified commits -> {}",
                summary.unclassified(),
                unclassified_path.display()
            ),
        ]
    }
}

impl ProgressReporter for ConsoleProgress {
    fn repo_started(&mut self, repo: &RepoId) {
        if !self.quiet {
            println!("{}", self.banner_line(repo));
        }
    }

    fn repo_failed(&mut self, repo: &RepoId, stage: FailureStage, error: &Error) {
        eprintln!("{}", self.failure_line(repo, stage, error));
    }

    fn no_branches(&mut self, repo: &RepoId) {
        eprintln!("{}", self.no_branches_line(repo));
    }

    fn record_written(&mut self, record: &CommitRecord) {
        if !self.quiet {
            println!("{}", self.record_line(record));
        }
    }
}
