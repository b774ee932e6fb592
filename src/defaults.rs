//! Default values for refactor-scan configuration.
//!
//! This module centralizes the built-in repository list, the commit-message
//! patterns and the numeric defaults, so the CLI, the config file loader and
//! the tests all agree on them.

use std::path::PathBuf;

/// Repositories scanned when neither the config file nor `--repo` names any.
pub const DEFAULT_REPOS: &[&str] = &[
    "denoland/deno",
    "tauri-apps/tauri",
    "rustdesk/rustdesk",
    "unionlabs/union",
    "FuelLabs/sway",
    "zed-industries/zed",
    "alacritty/alacritty",
    "rust-lang/rustlings",
    "FuelLabs/fuel-core",
    "astral-sh/uv",
    "lencx/ChatGPT",
    "sharkdp/bat",
    "BurntSushi/ripgrep",
    "meilisearch/meilisearch",
    "rust-unofficial/awesome-rust",
    "starship/starship",
    "dani-garcia/vaultwarden",
    "typst/typst",
];

/// Commit-message patterns handed to `git log --grep`, matched
/// case-insensitively. A commit is a candidate if any one matches.
pub const MESSAGE_PATTERNS: &[&str] = &[
    r"extract",
    r"extract method",
    r"extract function",
    r"extract\s+.*into\s+.*function",
    r"factor out",
    r"pull out",
    r"refactor:.*extract",
    r"refactor.*extract",
];

/// Maximum matching commits read per branch; 0 disables the cap.
pub const DEFAULT_PER_BRANCH_LIMIT: usize = 200;

/// Number of remote branches scanned per repository.
pub const DEFAULT_TOP_BRANCHES: usize = 3;

/// File extension whose diffs are classified.
pub const DEFAULT_EXTENSION: &str = "rs";

/// Hosting prefix clone URLs are built from.
pub const DEFAULT_REMOTE_BASE: &str = "https://github.com";

/// Classified dataset written when `--out` is not given.
pub const DEFAULT_OUT: &str = "extract_refs.csv";

/// Returns the default clone root, `repos` under the current directory.
pub fn default_clone_root() -> PathBuf {
    PathBuf::from("repos")
}
