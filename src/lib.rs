//! # Refactor Scan Library
//!
//! This library mines git histories for refactoring commits and labels each
//! one with the language capabilities its added code exercises. It is used by
//! the `refactor-scan` command-line tool but every stage can be driven on its
//! own.
//!
//! ## Quick Example
//!
//! ```
//! use refactor_scan::classify::{CapabilityTag, RuleSet};
//!
//! let rules = RuleSet::builtin().unwrap();
//! let diff = "\
//! diff --git a/src/lib.rs b/src/lib.rs
//! @@ -0,0 +1,2 @@
//! +pub const MAX_SIZE: usize = 10;
//! +async fn handler() {}
//! ";
//! assert_eq!(
//!     rules.classify_diff(diff),
//!     vec![CapabilityTag::AsyncAwait, CapabilityTag::ConstDecl]
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **Repositories (`repository`, `git`)**: `owner/name` identifiers mapped
//!   to local working copies, kept current with partial clones and fetches.
//! - **Branches (`branches`)**: remote branches ranked by reachable commit
//!   count; only the top few are scanned.
//! - **Mining (`miner`)**: commits whose messages match refactoring patterns,
//!   deduplicated across the branches of one repository.
//! - **Classification (`classify`, `stats`)**: ordered rule groups run over
//!   the added lines of each commit's diff, plus its change counts.
//! - **Datasets (`dataset`)**: classified and unclassified CSV outputs with
//!   a fixed header, rotated aside instead of overwritten.
//!
//! ## Execution Flow
//!
//! [`pipeline::Pipeline`] runs the stages above for every repository of a
//! [`config::ScanPlan`], one repository, branch and commit at a time. A
//! repository that fails is reported and skipped; only a dataset write error
//! stops the run.

pub mod branches;
pub mod classify;
pub mod config;
pub mod dataset;
pub mod defaults;
pub mod error;
pub mod git;
pub mod miner;
pub mod output;
pub mod pipeline;
pub mod repository;
pub mod stats;

#[cfg(test)]
mod classify_proptest;
