//! # Dataset Output
//!
//! Every recorded commit becomes one row in exactly one of two CSV datasets:
//! the classified dataset when at least one capability tag matched, the
//! unclassified dataset otherwise. Both files start with the same fixed
//! header and share one positional schema, [`HEADER`].
//!
//! ## Rotation
//!
//! Existing outputs are never overwritten. Before a dataset file is opened,
//! a file already at that path is renamed to the first free
//! `<stem>_<n>.<ext>` (n = 1, 2, ...), and the rename is recorded so the
//! caller can report it.
//!
//! ## Durability
//!
//! Each row is flushed as soon as it is written, so an interrupted run leaves
//! files that hold the header plus whole rows only. Any write failure is an
//! [`Error::Dataset`] and ends the run.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::classify::{join_tags, CapabilityTag};
use crate::error::{Error, Result};
use crate::miner::CommitMeta;
use crate::repository::RepoId;
use crate::stats::ChangeStats;

/// Column names shared by both datasets, in order.
pub const HEADER: [&str; 11] = [
    "repo",
    "commit",
    "commit_url",
    "author_date",
    "author",
    "subject",
    "hit_aspects",
    "files_changed",
    "insertions",
    "deletions",
    "branch",
];

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub repo: RepoId,
    pub sha: String,
    pub author_date: NaiveDate,
    pub author: String,
    pub subject: String,
    /// Capability tags in rule-group order; empty means unclassified.
    pub tags: Vec<CapabilityTag>,
    pub stats: ChangeStats,
    /// Branch the commit was first observed on during this run.
    pub branch: String,
}

impl CommitRecord {
    pub fn new(
        repo: &RepoId,
        meta: CommitMeta,
        tags: Vec<CapabilityTag>,
        stats: ChangeStats,
    ) -> Self {
        Self {
            repo: repo.clone(),
            sha: meta.sha,
            author_date: meta.author_date,
            author: meta.author,
            subject: meta.subject,
            tags,
            stats,
            branch: meta.branch,
        }
    }

    pub fn commit_url(&self) -> String {
        self.repo.commit_url(&self.sha)
    }

    pub fn is_classified(&self) -> bool {
        !self.tags.is_empty()
    }

    /// Field values in [`HEADER`] order.
    pub fn to_row(&self) -> [String; 11] {
        let count = |c: Option<u64>| c.map(|n| n.to_string()).unwrap_or_default();
        [
            self.repo.full_name(),
            self.sha.clone(),
            self.commit_url(),
            self.author_date.format("%Y-%m-%d").to_string(),
            self.author.clone(),
            self.subject.clone(),
            join_tags(&self.tags),
            count(self.stats.files_changed),
            count(self.stats.insertions),
            count(self.stats.deletions),
            self.branch.clone(),
        ]
    }
}

/// Quote a CSV field when it contains a separator, quote or line break.
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// One CSV line, including the trailing newline.
pub fn format_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Default unclassified path next to the classified one.
///
/// `hits.csv` becomes `hits_unclassified.csv`; a path without a `.csv`
/// extension gets `_unclassified.csv` appended whole.
pub fn derive_unclassified_path(classified: &Path) -> PathBuf {
    let is_csv = classified
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    match classified.file_stem() {
        Some(stem) if is_csv => {
            let mut name = stem.to_os_string();
            name.push("_unclassified.csv");
            classified.with_file_name(name)
        }
        _ => {
            let mut name = classified.as_os_str().to_os_string();
            name.push("_unclassified.csv");
            PathBuf::from(name)
        }
    }
}

/// `<stem>_<n>.<ext>` beside `path`.
pub fn rotated_name(path: &Path, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };
    path.with_file_name(name)
}

/// Move an existing file at `path` out of the way.
///
/// Returns the new location, or `None` when nothing was there.
pub fn rotate_existing(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut n = 1;
    let target = loop {
        let candidate = rotated_name(path, n);
        if !candidate.exists() {
            break candidate;
        }
        n += 1;
    };
    fs::rename(path, &target).map_err(|e| Error::Dataset {
        path: path.to_path_buf(),
        message: format!("cannot rotate to {}: {}", target.display(), e),
    })?;
    Ok(Some(target))
}

/// A rename performed before a dataset was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    pub from: PathBuf,
    pub to: PathBuf,
}

struct DatasetFile {
    path: PathBuf,
    out: BufWriter<File>,
    rows: usize,
}

impl DatasetFile {
    fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| dataset_error(path, e))?;
        }
        let file = File::create(path).map_err(|e| dataset_error(path, e))?;
        let mut dataset = Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            rows: 0,
        };
        dataset.write_line(&format_row(&HEADER))?;
        Ok(dataset)
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.out
            .write_all(line.as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(|e| dataset_error(&self.path, e))
    }

    fn append(&mut self, record: &CommitRecord) -> Result<()> {
        self.write_line(&format_row(&record.to_row()))?;
        self.rows += 1;
        Ok(())
    }
}

fn dataset_error(path: &Path, e: std::io::Error) -> Error {
    Error::Dataset {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Writes the classified and unclassified datasets of one run.
pub struct DatasetWriter {
    classified: DatasetFile,
    unclassified: DatasetFile,
    rotations: Vec<Rotation>,
}

impl DatasetWriter {
    /// Rotate any existing files at the two paths, then create both datasets
    /// and write their headers.
    pub fn create(classified_path: &Path, unclassified_path: &Path) -> Result<Self> {
        if classified_path == unclassified_path {
            return Err(Error::Dataset {
                path: classified_path.to_path_buf(),
                message: "classified and unclassified outputs must differ".to_string(),
            });
        }

        let mut rotations = Vec::new();
        for path in [classified_path, unclassified_path] {
            if let Some(to) = rotate_existing(path)? {
                log::info!("rotated {} to {}", path.display(), to.display());
                rotations.push(Rotation {
                    from: path.to_path_buf(),
                    to,
                });
            }
        }

        Ok(Self {
            classified: DatasetFile::create(classified_path)?,
            unclassified: DatasetFile::create(unclassified_path)?,
            rotations,
        })
    }

    /// Append `record` to the dataset its tag list selects.
    pub fn append(&mut self, record: &CommitRecord) -> Result<()> {
        if record.is_classified() {
            self.classified.append(record)
        } else {
            self.unclassified.append(record)
        }
    }

    pub fn rotations(&self) -> &[Rotation] {
        &self.rotations
    }

    pub fn classified_path(&self) -> &Path {
        &self.classified.path
    }

    pub fn unclassified_path(&self) -> &Path {
        &self.unclassified.path
    }

    pub fn classified_rows(&self) -> usize {
        self.classified.rows
    }

    pub fn unclassified_rows(&self) -> usize {
        self.unclassified.rows
    }
}
