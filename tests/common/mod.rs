//! Shared test utilities for integration and E2E tests.
//!
//! Builds throwaway git histories with the system `git` and publishes them as
//! bare repositories under a `file://` remote base, so scans can clone and
//! fetch them exactly like hosted repositories.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = GitFixture::new();
//!     let mut repo = fixture.repo("acme", "widgets");
//!     repo.commit("src/lib.rs", "pub const A: u8 = 1;\n", "Extract constant");
//!     repo.publish();
//!     // ... scan with fixture.remote_base()
//! }
//! ```

use assert_fs::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{csv_rows, sample_history, GitFixture, RepoBuilder, SampleHistory};
}

/// Run git in `dir` with a fixed identity, panicking on failure.
pub fn git(dir: &Path, args: &[&str], date: Option<&str>) -> String {
    let mut cmd = Command::new("git");
    cmd.current_dir(dir)
        .args([
            "-c",
            "user.name=Test Author",
            "-c",
            "user.email=author@example.com",
            "-c",
            "commit.gpgsign=false",
            "-c",
            "init.defaultBranch=main",
        ])
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0");
    if let Some(date) = date {
        cmd.env("GIT_AUTHOR_DATE", date)
            .env("GIT_COMMITTER_DATE", date);
    }
    let output = cmd.output().expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A temporary directory holding bare "remote" repositories, a clone root
/// and the output datasets.
pub struct GitFixture {
    temp_dir: assert_fs::TempDir,
}

impl GitFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// `file://` prefix under which published repositories live.
    pub fn remote_base(&self) -> String {
        format!("file://{}", self.path().join("remote").display())
    }

    /// Where scans keep their working copies.
    pub fn clone_root(&self) -> PathBuf {
        self.path().join("clones")
    }

    /// Default classified dataset path.
    pub fn out_path(&self) -> PathBuf {
        self.path().join("refs.csv")
    }

    /// Unclassified dataset path derived from [`GitFixture::out_path`].
    pub fn unclassified_path(&self) -> PathBuf {
        self.path().join("refs_unclassified.csv")
    }

    /// Start a new repository `owner/name` with an empty history.
    pub fn repo(&self, owner: &str, name: &str) -> RepoBuilder {
        let work = self.path().join("work").join(owner).join(name);
        fs::create_dir_all(&work).expect("Failed to create work dir");
        git(&work, &["init", "-q"], None);
        RepoBuilder {
            work,
            bare: self
                .path()
                .join("remote")
                .join(owner)
                .join(format!("{}.git", name)),
            commits: 0,
        }
    }

    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for GitFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds one repository's history, then publishes it as a bare remote.
pub struct RepoBuilder {
    work: PathBuf,
    bare: PathBuf,
    commits: u32,
}

impl RepoBuilder {
    /// Write `content` to `file`, commit it with `message` and return the sha.
    ///
    /// Every commit is dated one day after the previous one so log order is
    /// stable.
    pub fn commit(&mut self, file: &str, content: &str, message: &str) -> String {
        let path = self.work.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write file");

        self.commits += 1;
        let date = format!("2024-01-{:02}T12:00:00+00:00", self.commits);
        git(&self.work, &["add", "--all"], None);
        git(&self.work, &["commit", "-q", "-m", message], Some(&date));
        git(&self.work, &["rev-parse", "HEAD"], None)
    }

    /// Create `name` at the current commit and switch to it.
    pub fn branch(&mut self, name: &str) -> &mut Self {
        git(&self.work, &["checkout", "-q", "-b", name], None);
        self
    }

    pub fn checkout(&mut self, name: &str) -> &mut Self {
        git(&self.work, &["checkout", "-q", name], None);
        self
    }

    /// Publish (or republish) the history as a bare repository.
    pub fn publish(&self) {
        if self.bare.exists() {
            git(
                &self.work,
                &[
                    "push",
                    "-q",
                    "--force",
                    self.bare.to_str().expect("utf-8 path"),
                    "--all",
                ],
                None,
            );
            return;
        }
        if let Some(parent) = self.bare.parent() {
            fs::create_dir_all(parent).expect("Failed to create remote dir");
        }
        git(
            &self.work,
            &[
                "clone",
                "-q",
                "--bare",
                ".",
                self.bare.to_str().expect("utf-8 path"),
            ],
            None,
        );
    }
}

/// Commit hashes of the history built by [`sample_history`].
#[allow(dead_code)]
pub struct SampleHistory {
    pub initial: String,
    pub extract_async: String,
    pub extract_const: String,
    pub pull_out_helper: String,
    pub factor_out_docs: String,
}

/// Publish `acme/widgets` with three branches:
///
/// - `feature` (4 commits): initial, async extraction, const extraction,
///   plain helper extraction
/// - `main` (3 commits): initial, async extraction, const extraction
/// - `docs` (2 commits): initial, a README-only "factor out" commit
pub fn sample_history(fixture: &GitFixture) -> SampleHistory {
    let mut repo = fixture.repo("acme", "widgets");
    let initial = repo.commit("src/lib.rs", "pub fn id() {}\n", "Initial commit");
    let extract_async = repo.commit(
        "src/lib.rs",
        "pub fn id() {}\nasync fn parse() {}\n",
        "refactor: extract parser into function",
    );
    let extract_const = repo.commit(
        "src/consts.rs",
        "pub const MAX_SIZE: usize = 10;\n",
        "Extract constants",
    );

    repo.branch("feature");
    let pull_out_helper = repo.commit(
        "src/helper.rs",
        "fn helper() -> u32 { 1 }\n",
        "Pull out helper",
    );

    repo.checkout("main");
    git(&repo.work, &["checkout", "-q", "-b", "docs", &initial], None);
    let factor_out_docs = repo.commit("README.md", "# Widgets\n", "Factor out docs section");

    repo.checkout("main");
    repo.publish();

    SampleHistory {
        initial,
        extract_async,
        extract_const,
        pull_out_helper,
        factor_out_docs,
    }
}

/// Data rows of a dataset, split on commas (test data holds no quoted commas
/// unless a test says otherwise).
#[allow(dead_code)]
pub fn csv_rows(path: &Path) -> Vec<Vec<String>> {
    fs::read_to_string(path)
        .expect("Failed to read dataset")
        .lines()
        .skip(1)
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = GitFixture::new();
        assert!(fixture.path().exists());
        assert!(fixture.remote_base().starts_with("file://"));
    }

    #[test]
    fn test_repo_builder_publishes_bare_repo() {
        let fixture = GitFixture::new();
        let mut repo = fixture.repo("acme", "tiny");
        let sha = repo.commit("a.rs", "fn a() {}\n", "first");
        repo.publish();

        assert_eq!(sha.len(), 40);
        assert!(fixture
            .path()
            .join("remote/acme/tiny.git/HEAD")
            .exists());
    }
}
