//! # Scan Pipeline
//!
//! Drives one run end to end. For every configured repository, in order:
//!
//! 1. **Sync**: [`RepositoryManager::ensure`] clones or fetches the copy.
//! 2. **Rank**: [`select_top_branches`] picks the most active remote branches.
//! 3. **Mine**: a [`CommitMiner`] walks those branches highest-ranked first,
//!    yielding each matching commit once.
//! 4. **Classify**: a [`DiffClassifier`] tags the commit's added lines and a
//!    [`StatsExtractor`] reads its change counts.
//! 5. **Write**: the [`DatasetWriter`] routes the row by its tag list.
//!
//! Failures are contained at the repository boundary: a repository that
//! cannot be synced or scanned is reported and skipped, and the run moves on.
//! The one exception is a dataset write error, which ends the run.

use std::path::Path;

use crate::branches::select_top_branches;
use crate::classify::{DiffClassifier, RuleSet};
use crate::config::ScanPlan;
use crate::dataset::{CommitRecord, DatasetWriter};
use crate::error::{Error, Result};
use crate::miner::CommitMiner;
use crate::repository::{RepoId, RepositoryManager};
use crate::stats::StatsExtractor;

/// Where a skipped repository failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Clone or fetch.
    Sync,
    /// Branch ranking, history mining or classification.
    Scan,
}

impl FailureStage {
    pub fn label(&self) -> &'static str {
        match self {
            FailureStage::Sync => "clone/fetch",
            FailureStage::Scan => "scanning",
        }
    }
}

/// Result of processing one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoOutcome {
    Scanned { classified: usize, unclassified: usize },
    NoBranches,
    Failed { stage: FailureStage, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoReport {
    pub repo: RepoId,
    pub outcome: RepoOutcome,
}

/// Per-repository outcomes of a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<RepoReport>,
}

impl RunSummary {
    pub fn scanned(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, RepoOutcome::Scanned { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.reports.len() - self.scanned()
    }

    pub fn classified(&self) -> usize {
        self.reports
            .iter()
            .map(|r| match r.outcome {
                RepoOutcome::Scanned { classified, .. } => classified,
                _ => 0,
            })
            .sum()
    }

    pub fn unclassified(&self) -> usize {
        self.reports
            .iter()
            .map(|r| match r.outcome {
                RepoOutcome::Scanned { unclassified, .. } => unclassified,
                _ => 0,
            })
            .sum()
    }
}

/// Receives progress events while a run is in flight.
///
/// Every method has an empty default so callers only implement what they
/// display.
pub trait ProgressReporter {
    fn repo_started(&mut self, _repo: &RepoId) {}

    fn repo_failed(&mut self, _repo: &RepoId, _stage: FailureStage, _error: &Error) {}

    fn no_branches(&mut self, _repo: &RepoId) {}

    fn record_written(&mut self, _record: &CommitRecord) {}
}

/// A reporter that discards every event.
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// One configured run over a set of repositories.
pub struct Pipeline<'a> {
    plan: &'a ScanPlan,
    rules: &'a RuleSet,
    manager: &'a RepositoryManager,
    stats: StatsExtractor,
}

impl<'a> Pipeline<'a> {
    pub fn new(plan: &'a ScanPlan, rules: &'a RuleSet, manager: &'a RepositoryManager) -> Result<Self> {
        Ok(Self {
            plan,
            rules,
            manager,
            stats: StatsExtractor::new()?,
        })
    }

    /// Process every repository in the plan, writing rows to `writer`.
    ///
    /// Returns an error only when writing the datasets fails.
    pub fn run(
        &self,
        writer: &mut DatasetWriter,
        progress: &mut dyn ProgressReporter,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let dirs = self.manager.plan_paths(&self.plan.repos);

        for (repo, dir) in self.plan.repos.iter().zip(&dirs) {
            progress.repo_started(repo);

            let outcome = match self.manager.ensure(repo, dir) {
                Err(e) if e.is_writer_fatal() => return Err(e),
                Err(e) => self.fail(repo, FailureStage::Sync, e, progress),
                Ok(()) => match self.scan_repo(repo, dir, writer, progress) {
                    Ok(outcome) => outcome,
                    Err(e) if e.is_writer_fatal() => return Err(e),
                    Err(e) => self.fail(repo, FailureStage::Scan, e, progress),
                },
            };

            summary.reports.push(RepoReport {
                repo: repo.clone(),
                outcome,
            });
        }

        Ok(summary)
    }

    fn fail(
        &self,
        repo: &RepoId,
        stage: FailureStage,
        error: Error,
        progress: &mut dyn ProgressReporter,
    ) -> RepoOutcome {
        log::debug!("skipping {} after {} failure: {}", repo, stage.label(), error);
        progress.repo_failed(repo, stage, &error);
        RepoOutcome::Failed {
            stage,
            message: error.to_string(),
        }
    }

    fn scan_repo(
        &self,
        repo: &RepoId,
        repo_dir: &Path,
        writer: &mut DatasetWriter,
        progress: &mut dyn ProgressReporter,
    ) -> Result<RepoOutcome> {
        let git = self.manager.git();

        let branches = select_top_branches(git, repo_dir, self.plan.top_branches)?;
        if branches.is_empty() {
            log::debug!("{}: no usable remote branches", repo);
            progress.no_branches(repo);
            return Ok(RepoOutcome::NoBranches);
        }

        let mut miner = CommitMiner::new(git, repo_dir, &self.plan.query);
        let classifier = DiffClassifier::new(git, self.rules, &self.plan.extension);
        let (mut classified, mut unclassified) = (0, 0);

        for branch in &branches {
            for meta in miner.scan_branch(branch)? {
                let tags = classifier.classify_commit(repo_dir, &meta.sha);
                let stats = self.stats.extract(git, repo_dir, &meta.sha);
                let record = CommitRecord::new(repo, meta, tags, stats);

                writer.append(&record)?;
                if record.is_classified() {
                    classified += 1;
                } else {
                    unclassified += 1;
                }
                progress.record_written(&record);
            }
        }

        log::info!(
            "{}: {} classified, {} unclassified across {} branches",
            repo,
            classified,
            unclassified,
            branches.len()
        );
        Ok(RepoOutcome::Scanned {
            classified,
            unclassified,
        })
    }
}
