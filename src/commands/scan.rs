//! # Scan Command Implementation
//!
//! This module implements the `scan` subcommand, which runs the full mining
//! pipeline:
//!
//! 1. Load the optional YAML config and apply command-line overrides
//! 2. Rotate existing datasets aside and open fresh ones
//! 3. Clone or fetch each repository, rank its branches and mine matching commits
//! 4. Classify every commit and append it to the classified or unclassified dataset
//!
//! Repositories that fail are reported on stderr and skipped. The command
//! only fails when the configuration is invalid or a dataset cannot be
//! written.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use refactor_scan::classify::RuleSet;
use refactor_scan::config::{self, MinerConfig};
use refactor_scan::dataset::DatasetWriter;
use refactor_scan::defaults::MESSAGE_PATTERNS;
use refactor_scan::output::{ConsoleProgress, OutputConfig};
use refactor_scan::pipeline::Pipeline;
use refactor_scan::repository::RepositoryManager;

/// Arguments for the scan command
#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// YAML file with scan settings; flags given here override it
    #[arg(short, long, value_name = "PATH", env = "REFACTOR_SCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Classified dataset path [default: extract_refs.csv]
    #[arg(short, long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Unclassified dataset path [default: derived from --out]
    #[arg(long, value_name = "PATH")]
    pub unclassified_out: Option<PathBuf>,

    /// Directory holding the working copies [default: repos]
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Repository to scan as owner/name (repeatable; replaces the built-in list)
    #[arg(long, value_name = "OWNER/NAME")]
    pub repo: Vec<String>,

    /// Only consider commits on or after this date
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub since: Option<String>,

    /// Matching commits read per branch, 0 for unlimited [default: 200]
    #[arg(long, value_name = "N")]
    pub per_branch_limit: Option<usize>,

    /// Remote branches scanned per repository [default: 3]
    #[arg(long, value_name = "N")]
    pub top_branches: Option<usize>,

    /// Extension of the files whose diffs are classified [default: rs]
    #[arg(long, value_name = "EXT")]
    pub extension: Option<String>,

    /// Hosting prefix clone URLs are built from [default: https://github.com]
    #[arg(long, value_name = "URL")]
    pub remote_base: Option<String>,

    /// Suppress progress output; errors are still printed
    #[arg(short, long)]
    pub quiet: bool,
}

impl ScanArgs {
    /// Overwrite `config` with every flag that was given.
    fn apply_to(&self, config: &mut MinerConfig) {
        if !self.repo.is_empty() {
            config.repos = self.repo.clone();
        }
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if let Some(remote_base) = &self.remote_base {
            config.remote_base = remote_base.clone();
        }
        if let Some(since) = &self.since {
            config.since = Some(since.clone());
        }
        if let Some(limit) = self.per_branch_limit {
            config.per_branch_limit = limit;
        }
        if let Some(top) = self.top_branches {
            config.top_branches = top;
        }
        if let Some(extension) = &self.extension {
            config.extension = extension.clone();
        }
        if let Some(out) = &self.out {
            config.out = out.clone();
            // A new classified path re-derives the unclassified one unless
            // that was given explicitly as well.
            if self.unclassified_out.is_none() {
                config.unclassified_out = None;
            }
        }
        if let Some(unclassified_out) = &self.unclassified_out {
            config.unclassified_out = Some(unclassified_out.clone());
        }
    }
}

/// Execute the scan command
pub fn execute(args: ScanArgs, output: OutputConfig) -> Result<()> {
    let mut miner_config = match &args.config {
        Some(path) => config::from_file(path)?,
        None => MinerConfig::default(),
    };
    args.apply_to(&mut miner_config);

    let plan = miner_config.resolve(MESSAGE_PATTERNS)?;
    let rules = RuleSet::builtin()?;
    let manager = RepositoryManager::new(plan.root.clone(), plan.remote_base.clone());

    // Rotations are reported even under --quiet.
    let mut writer = DatasetWriter::create(&plan.out, &plan.unclassified_out)?;
    for rotation in writer.rotations() {
        println!(
            "Renamed existing {} to {}",
            rotation.from.display(),
            rotation.to.display()
        );
    }

    let mut progress = ConsoleProgress::new(output, args.quiet);
    let summary = Pipeline::new(&plan, &rules, &manager)?.run(&mut writer, &mut progress)?;

    if !args.quiet {
        for line in progress.summary_lines(
            &summary,
            writer.classified_path(),
            writer.unclassified_path(),
        ) {
            println!("{}", line);
        }
    }

    Ok(())
}
