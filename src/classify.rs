//! # Diff Classification
//!
//! Labels a commit with the language capabilities its added lines exercise.
//! Classification is purely textual: a fixed, ordered list of rule groups is
//! run over the added-line corpus of a diff, and every group with at least
//! one matching pattern contributes its tag.
//!
//! Two properties are load-bearing for the datasets built on top of this:
//!
//! - Tags come out in rule-group declaration order, never in match order, so
//!   the same corpus always produces the same `hit_aspects` string.
//! - Groups are independent. A line can trigger several groups, and a group
//!   stops at its first hit.
//!
//! Corpus lines keep their leading `+`; the built-in patterns anchor on it.

use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::Serialize;

use crate::error::Result;
use crate::repository::GitOperations;

/// A detected code-change characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityTag {
    AsyncAwait,
    ConstDecl,
    DynTrait,
    Hrtbs,
    NonLinearCtrlFlow,
    Generics,
}

impl CapabilityTag {
    pub const ALL: [CapabilityTag; 6] = [
        CapabilityTag::AsyncAwait,
        CapabilityTag::ConstDecl,
        CapabilityTag::DynTrait,
        CapabilityTag::Hrtbs,
        CapabilityTag::NonLinearCtrlFlow,
        CapabilityTag::Generics,
    ];

    /// Dataset spelling of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityTag::AsyncAwait => "async_await",
            CapabilityTag::ConstDecl => "const_decl",
            CapabilityTag::DynTrait => "dyn_trait",
            CapabilityTag::Hrtbs => "hrtbs",
            CapabilityTag::NonLinearCtrlFlow => "non_linear_ctrl_flow",
            CapabilityTag::Generics => "generics",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CapabilityTag::AsyncAwait => "uses asynchronous control flow",
            CapabilityTag::ConstDecl => "adds a constant declaration",
            CapabilityTag::DynTrait => "introduces a dynamically-dispatched trait object",
            CapabilityTag::Hrtbs => "introduces higher-rank lifetime bounds",
            CapabilityTag::NonLinearCtrlFlow => "adds non-linear control flow",
            CapabilityTag::Generics => "introduces generics",
        }
    }
}

impl fmt::Display for CapabilityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Space-joined tag list, the `hit_aspects` column.
pub fn join_tags(tags: &[CapabilityTag]) -> String {
    tags.iter()
        .map(CapabilityTag::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Built-in rule table. Group order is output order.
const BUILTIN_RULES: &[(CapabilityTag, &[&str])] = &[
    (
        CapabilityTag::AsyncAwait,
        &[
            r"(?i)^\+.*\basync\b",
            r"(?i)^\+.*\.await\b",
            r"(?i)^\+.*->\s*impl\s+Future",
        ],
    ),
    (
        CapabilityTag::ConstDecl,
        &[r"(?i)^\+\s*(pub\s+)?const\s+[A-Z0-9_]+\s*[:=]"],
    ),
    (
        CapabilityTag::DynTrait,
        &[
            r"(?i)^\+.*\bdyn\s+[A-Z][A-Za-z0-9_]*",
            r"(?i)^\+.*Box\s*<\s*dyn\s+[A-Z][A-Za-z0-9_]*",
        ],
    ),
    (
        CapabilityTag::Hrtbs,
        &[
            r"(?i)^\+.*\bfor<'[a-z](?:,\s*'[a-z])*>\b",
            r"(?i)^\+.*where\s+.*for<'[a-z]",
        ],
    ),
    (
        CapabilityTag::NonLinearCtrlFlow,
        &[r"^\+.*\b(match|loop|while|break|continue|return)\b"],
    ),
    (
        CapabilityTag::Generics,
        &[
            r"(?i)^\+\s*(pub\s+)?(async\s+)?fn\s+\w+\s*<[^>]+>",
            r"(?i)^\+.*\bimpl\s*<[^>]+>",
            r"(?i)^\+.*\bwhere\b.*<[^>]+>",
            r"^\+.*<[A-Za-z0-9_,\s:'?]+>",
        ],
    ),
];

/// One tag and the ordered patterns that trigger it.
#[derive(Debug, Clone)]
pub struct RuleGroup {
    tag: CapabilityTag,
    patterns: Vec<Regex>,
}

impl RuleGroup {
    pub fn new(tag: CapabilityTag, patterns: &[&str]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { tag, patterns })
    }

    pub fn tag(&self) -> CapabilityTag {
        self.tag
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }

    /// First (pattern, line) pair that matches, trying patterns in order.
    pub fn first_match<'l, S: AsRef<str>>(&self, lines: &'l [S]) -> Option<(&str, &'l str)> {
        self.patterns.iter().find_map(|rx| {
            lines.iter().find_map(|s| {
                let line: &'l str = s.as_ref();
                rx.is_match(line).then_some((rx.as_str(), line))
            })
        })
    }
}

/// Why a tag was assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleHit {
    pub tag: CapabilityTag,
    pub pattern: String,
    pub line: String,
}

/// The ordered list of rule groups a run classifies with.
#[derive(Debug, Clone)]
pub struct RuleSet {
    groups: Vec<RuleGroup>,
}

impl RuleSet {
    pub fn new(groups: Vec<RuleGroup>) -> Self {
        Self { groups }
    }

    /// The built-in capability rules.
    pub fn builtin() -> Result<Self> {
        let groups = BUILTIN_RULES
            .iter()
            .map(|(tag, patterns)| RuleGroup::new(*tag, patterns))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[RuleGroup] {
        &self.groups
    }

    /// Tags of every group that matches some line, in group order.
    pub fn classify<S: AsRef<str>>(&self, lines: &[S]) -> Vec<CapabilityTag> {
        if lines.is_empty() {
            return Vec::new();
        }
        self.groups
            .iter()
            .filter(|group| group.first_match(lines).is_some())
            .map(RuleGroup::tag)
            .collect()
    }

    /// Like [`RuleSet::classify`], but reports the pattern and line behind
    /// each tag.
    pub fn explain<S: AsRef<str>>(&self, lines: &[S]) -> Vec<RuleHit> {
        self.groups
            .iter()
            .filter_map(|group| {
                group.first_match(lines).map(|(pattern, line)| RuleHit {
                    tag: group.tag(),
                    pattern: pattern.to_string(),
                    line: line.to_string(),
                })
            })
            .collect()
    }

    /// Classify the added lines of a unified diff.
    pub fn classify_diff(&self, diff: &str) -> Vec<CapabilityTag> {
        self.classify(added_lines(diff).as_slice())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DiffState {
    /// No `diff` header seen yet; the input may be a bare patch fragment.
    Loose,
    /// Between a `diff` header and the first hunk of that file.
    Header,
    /// Inside a hunk.
    Hunk,
}

/// Added-content lines of a unified diff, with their leading `+`.
///
/// File headers (`+++ b/...`), binary-file notices and every other line
/// outside a hunk are ignored. Input without any `diff` header is treated as
/// a bare fragment: every `+` line except a `+++` header counts.
pub fn added_lines(diff: &str) -> Vec<&str> {
    let mut state = DiffState::Loose;
    let mut lines = Vec::new();

    for line in diff.lines() {
        if line.starts_with("diff ") {
            state = DiffState::Header;
        } else if line.starts_with("@@") {
            if state != DiffState::Loose {
                state = DiffState::Hunk;
            }
        } else if line.starts_with('+') {
            match state {
                DiffState::Hunk => lines.push(line),
                DiffState::Loose if !line.starts_with("+++") => lines.push(line),
                _ => {}
            }
        }
    }

    lines
}

/// Diff retrieval and classification for one working copy.
pub struct DiffClassifier<'a> {
    git: &'a dyn GitOperations,
    rules: &'a RuleSet,
    pathspec: String,
}

impl<'a> DiffClassifier<'a> {
    /// `extension` selects the qualifying files, e.g. `rs` for `*.rs`.
    pub fn new(git: &'a dyn GitOperations, rules: &'a RuleSet, extension: &str) -> Self {
        Self {
            git,
            rules,
            pathspec: format!("*.{}", extension.trim_start_matches('.')),
        }
    }

    pub fn pathspec(&self) -> &str {
        &self.pathspec
    }

    /// Tags for commit `sha`.
    ///
    /// A diff that cannot be retrieved counts as an empty corpus and yields no
    /// tags.
    pub fn classify_commit(&self, repo_dir: &Path, sha: &str) -> Vec<CapabilityTag> {
        match self.git.show_patch(repo_dir, sha, &self.pathspec) {
            Ok(diff) => self.rules.classify_diff(&diff),
            Err(e) => {
                log::warn!("no diff for {}: {}", sha, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        RuleSet::builtin().unwrap()
    }

    #[test]
    fn test_builtin_group_order() {
        let tags: Vec<_> = rules().groups().iter().map(RuleGroup::tag).collect();
        assert_eq!(tags, CapabilityTag::ALL.to_vec());
    }

    #[test]
    fn test_async_fn_without_generics() {
        let tags = rules().classify(&["+ async fn handler() {}"]);
        assert!(tags.contains(&CapabilityTag::AsyncAwait));
        assert!(!tags.contains(&CapabilityTag::Generics));
    }

    #[test]
    fn test_const_declaration_only() {
        let tags = rules().classify(&["+ pub const MAX_SIZE: usize = 10;"]);
        assert_eq!(tags, vec![CapabilityTag::ConstDecl]);
    }

    #[test]
    fn test_empty_corpus_has_no_tags() {
        let empty: [&str; 0] = [];
        assert!(rules().classify(&empty).is_empty());
        assert!(rules().classify_diff("").is_empty());
    }

    #[test]
    fn test_unmatched_lines_have_no_tags() {
        let tags = rules().classify(&["+    let x = 1;", "+    println!(\"hi\");"]);
        assert!(tags.is_empty());
    }

    #[test]
    fn test_tags_follow_group_order_not_line_order() {
        let tags = rules().classify(&[
            "+    fn parse<T: FromStr>(s: &str) -> T {",
            "+        match s.parse() {",
            "+    let h: Box<dyn Handler> = make();",
            "+    fetch().await;",
        ]);
        assert_eq!(
            tags,
            vec![
                CapabilityTag::AsyncAwait,
                CapabilityTag::DynTrait,
                CapabilityTag::NonLinearCtrlFlow,
                CapabilityTag::Generics,
            ]
        );
    }

    #[test]
    fn test_hrtb_in_where_clause() {
        let tags = rules().classify(&["+ where F: for<'a> Fn(&'a str) -> bool,"]);
        assert!(tags.contains(&CapabilityTag::Hrtbs));
    }

    #[test]
    fn test_control_flow_is_case_sensitive() {
        assert!(rules().classify(&["+ // Return early"]).is_empty());
        assert_eq!(
            rules().classify(&["+        return None;"]),
            vec![CapabilityTag::NonLinearCtrlFlow]
        );
    }

    #[test]
    fn test_lines_without_plus_prefix_never_match() {
        assert!(rules().classify(&["async fn handler() {}"]).is_empty());
    }

    #[test]
    fn test_explain_reports_first_matching_pattern() {
        let hits = rules().explain(&["+ let v = fut.await;"]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].tag, CapabilityTag::AsyncAwait);
        assert_eq!(hits[0].pattern, r"(?i)^\+.*\.await\b");
        assert_eq!(hits[0].line, "+ let v = fut.await;");
    }

    #[test]
    fn test_join_tags() {
        assert_eq!(
            join_tags(&[CapabilityTag::AsyncAwait, CapabilityTag::Generics]),
            "async_await generics"
        );
        assert_eq!(join_tags(&[]), "");
    }

    #[test]
    fn test_tag_serializes_as_dataset_spelling() {
        for tag in CapabilityTag::ALL {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag.as_str()));
        }
    }

    #[test]
    fn test_added_lines_skips_headers() {
        let diff = "\
diff --git a/src/lib.rs b/src/lib.rs
index 1111111..2222222 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,0 +2,2 @@
+pub const LIMIT: u32 = 3;
+fn helper() {}
@@ -10 +12 @@
-    old();
+    new();
";
        assert_eq!(
            added_lines(diff),
            vec!["+pub const LIMIT: u32 = 3;", "+fn helper() {}", "+    new();"]
        );
    }

    #[test]
    fn test_added_lines_ignores_binary_and_new_file_headers() {
        let diff = "\
diff --git a/assets/logo.png b/assets/logo.png
new file mode 100644
index 0000000..3333333
Binary files /dev/null and b/assets/logo.png differ
diff --git a/src/new.rs b/src/new.rs
new file mode 100644
index 0000000..4444444
--- /dev/null
+++ b/src/new.rs
@@ -0,0 +1 @@
+++counter;
";
        assert_eq!(added_lines(diff), vec!["+++counter;"]);
    }

    #[test]
    fn test_added_lines_bare_fragment() {
        let fragment = "+++ b/x.rs\n+ async fn handler() {}\n- removed\n context\n";
        assert_eq!(added_lines(fragment), vec!["+ async fn handler() {}"]);
    }

    #[test]
    fn test_classify_diff_uses_only_added_lines() {
        let diff = "\
diff --git a/src/a.rs b/src/a.rs
--- a/src/a.rs
+++ b/src/a.rs
@@ -1 +1 @@
-async fn old() {}
+fn new() {}
";
        assert!(rules().classify_diff(diff).is_empty());
    }
}
