//! # Error Handling
//!
//! This module defines the centralized error type for `refactor-scan`. It uses
//! `thiserror` to build a single `Error` enum covering every failure the
//! mining pipeline can hit, each variant carrying enough context (command,
//! directory, repository, path) to make the message useful on its own.
//!
//! ## Recoverability
//!
//! The pipeline treats errors differently depending on where they surface:
//!
//! - Git failures (`CommandFailed`, `GitClone`, `ProcessSpawn`) raised while a
//!   repository is being materialized or scanned abort only that repository.
//! - `Dataset` errors come from the output writer and are never recovered; they
//!   terminate the run. [`Error::is_writer_fatal`] is how the pipeline tells
//!   the two apart.
//! - Configuration errors (`ConfigParse`, `InvalidRepository`, `InvalidDate`)
//!   are reported before any work starts.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for refactor-scan operations
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file or command-line values could not be parsed.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A repository identifier was not of the form `owner/name`.
    #[error("Invalid repository '{spec}': {message}")]
    InvalidRepository { spec: String, message: String },

    /// A date value was not an ISO calendar date.
    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    /// An external program could not be started at all.
    #[error("Failed to run {program}: {message}")]
    ProcessSpawn { program: String, message: String },

    /// A checked command exited with a non-zero status.
    #[error("Command failed in {}: {command} - {stderr}", dir.display())]
    CommandFailed {
        command: String,
        dir: PathBuf,
        stderr: String,
    },

    /// Cloning a repository failed.
    #[error("Git clone error for {repo}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitClone {
        repo: String,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// Writing one of the output datasets failed.
    #[error("Dataset write error for {}: {message}", path.display())]
    Dataset { path: PathBuf, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Whether this error must end the whole run rather than a single
    /// repository.
    pub fn is_writer_fatal(&self) -> bool {
        matches!(self, Error::Dataset { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
