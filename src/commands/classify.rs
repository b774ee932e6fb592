//! # Classify Command Implementation
//!
//! Runs the capability rules over a unified diff read from a file or stdin
//! and prints the resulting tags, without touching any repository. Useful for
//! checking what a given patch would be labelled as.
//!
//! ```bash
//! git show --unified=0 HEAD -- '*.rs' | refactor-scan classify --explain
//! ```

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use refactor_scan::classify::{added_lines, join_tags, RuleSet};
use refactor_scan::output::OutputConfig;

/// Classify a unified diff read from a file or stdin
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Diff file to read; stdin when omitted or `-`
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Also show the pattern and added line behind each tag
    #[arg(long)]
    pub explain: bool,
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("Failed to read diff from {}", path.display())),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read diff from stdin")?;
            Ok(buf)
        }
    }
}

fn render(rules: &RuleSet, diff: &str, explain: bool, output: &OutputConfig) -> String {
    let lines = added_lines(diff);
    let tags = rules.classify(&lines);

    let mut text = if tags.is_empty() {
        format!(
            "{}\n",
            style("unclassified").yellow().force_styling(output.use_color)
        )
    } else {
        format!(
            "{}\n",
            style(join_tags(&tags)).green().force_styling(output.use_color)
        )
    };

    if explain {
        for hit in rules.explain(&lines) {
            text.push_str(&format!(
                "  {}: {}\n      {}\n",
                hit.tag, hit.pattern, hit.line
            ));
        }
    }
    text
}

/// Execute the classify command
pub fn execute(args: ClassifyArgs, output: OutputConfig) -> Result<()> {
    let diff = read_input(args.file.as_ref())?;
    let rules = RuleSet::builtin()?;
    print!("{}", render(&rules, &diff, args.explain, &output));
    Ok(())
}
