//! Thin wrappers around the system `git` binary.
//!
//! Every invocation is synchronous: the pipeline blocks until the child
//! exits. Using the system command means SSH keys, credential helpers and
//! anything configured in `~/.gitconfig` apply unchanged. Interactive
//! credential prompts are disabled so a private or missing repository fails
//! fast instead of hanging the run.
//!
//! Output parsing lives with the callers (`branches`, `miner`, `classify`,
//! `stats`); this module only knows how to run commands.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Run `program` with `args`, optionally inside `cwd`, capturing both streams.
///
/// With `check` set, a non-zero exit becomes [`Error::CommandFailed`]. Without
/// it the output is returned as-is and the caller inspects `success`.
pub fn run<I, S>(program: &str, args: I, cwd: Option<&Path>, check: bool) -> Result<CommandOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<S> = args.into_iter().collect();
    let mut cmd = Command::new(program);
    cmd.args(&args).env("GIT_TERMINAL_PROMPT", "0");
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let rendered = render_command(program, &args);
    log::debug!("running: {}", rendered);

    let output = cmd.output().map_err(|e| Error::ProcessSpawn {
        program: program.to_string(),
        message: e.to_string(),
    })?;

    let result = CommandOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if check && !result.success {
        return Err(Error::CommandFailed {
            command: rendered,
            dir: cwd.map(Path::to_path_buf).unwrap_or_default(),
            stderr: result.stderr.trim().to_string(),
        });
    }

    Ok(result)
}

/// Run a checked git command in `repo_dir` and return its stdout.
pub fn git<I, S>(args: I, repo_dir: &Path) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Ok(run("git", args, Some(repo_dir), true)?.stdout)
}

fn render_command<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut rendered = program.to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(&arg.as_ref().to_string_lossy());
    }
    rendered
}

/// Blob-less partial clone of `url` into `target_dir`.
///
/// The full commit graph is fetched so reachable-commit counts are exact;
/// file contents are fetched lazily when a diff needs them.
pub fn clone_partial(repo: &str, url: &str, target_dir: &Path) -> Result<()> {
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let output = run(
        "git",
        [
            OsStr::new("clone"),
            OsStr::new("--filter=blob:none"),
            OsStr::new("--quiet"),
            OsStr::new(url),
            target_dir.as_os_str(),
        ],
        None,
        false,
    )?;

    if !output.success {
        let stderr = output.stderr.trim().to_string();
        let hint = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
            || stderr.contains("could not read Username")
        {
            Some("Check the repository exists and that git credentials are configured".to_string())
        } else {
            None
        };

        return Err(Error::GitClone {
            repo: repo.to_string(),
            message: stderr,
            hint,
        });
    }

    Ok(())
}

/// Fetch every remote branch and tag, pruning refs that vanished upstream.
pub fn fetch_all(repo_dir: &Path) -> Result<()> {
    git(["fetch", "--all", "--tags", "--prune", "--quiet"], repo_dir)?;
    Ok(())
}

/// Raw `for-each-ref` listing of `refs/remotes/origin`: one
/// `<refname>\t<symref>` line per ref.
pub fn remote_refs(repo_dir: &Path) -> Result<String> {
    git(
        [
            "for-each-ref",
            "--format=%(refname)%09%(symref)",
            "refs/remotes/origin",
        ],
        repo_dir,
    )
}

/// Number of commits reachable from `rev`.
pub fn rev_list_count(repo_dir: &Path, rev: &str) -> Result<u64> {
    let out = git(["rev-list", "--count", rev, "--"], repo_dir)?;
    let trimmed = out.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse().map_err(|_| Error::CommandFailed {
        command: format!("git rev-list --count {}", rev),
        dir: repo_dir.to_path_buf(),
        stderr: format!("unexpected output: {}", trimmed),
    })
}

/// Zero-context patch of `sha`, limited to `pathspec`, with rename and copy
/// detection.
pub fn show_patch(repo_dir: &Path, sha: &str, pathspec: &str) -> Result<String> {
    git(
        [
            "show",
            "--patch",
            "--find-renames",
            "--find-copies",
            "--unified=0",
            "--no-color",
            "--format=",
            sha,
            "--",
            pathspec,
        ],
        repo_dir,
    )
}

/// `--stat` output of `sha`; the summary line is the last one.
pub fn show_stat(repo_dir: &Path, sha: &str) -> Result<String> {
    git(["show", "--stat", "--oneline", "--no-color", sha, "--"], repo_dir)
}
