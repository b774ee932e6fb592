//! # Rules Command Implementation
//!
//! Prints the commit-message patterns used to select candidate commits and
//! the capability rule groups used to classify them, in evaluation order.
//! `--json` emits the same data for scripts.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use refactor_scan::classify::{CapabilityTag, RuleSet};
use refactor_scan::defaults::MESSAGE_PATTERNS;

/// Show the built-in message patterns and capability rules
#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Print the rules as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct RulesReport<'a> {
    message_patterns: &'a [&'a str],
    rule_groups: Vec<GroupReport<'a>>,
}

#[derive(Debug, Serialize)]
struct GroupReport<'a> {
    tag: CapabilityTag,
    description: &'static str,
    patterns: Vec<&'a str>,
}

fn build_report(rules: &RuleSet) -> RulesReport<'_> {
    RulesReport {
        message_patterns: MESSAGE_PATTERNS,
        rule_groups: rules
            .groups()
            .iter()
            .map(|group| GroupReport {
                tag: group.tag(),
                description: group.tag().description(),
                patterns: group.patterns().collect(),
            })
            .collect(),
    }
}

fn render_text(report: &RulesReport<'_>) -> String {
    let mut text = String::from("Message patterns (a commit matches if any one does):\n");
    for pattern in report.message_patterns {
        text.push_str(&format!("  {}\n", pattern));
    }
    text.push_str("\nCapability rules (in output order):\n");
    for group in &report.rule_groups {
        text.push_str(&format!("  {} - {}\n", group.tag, group.description));
        for pattern in &group.patterns {
            text.push_str(&format!("      {}\n", pattern));
        }
    }
    text
}

/// Execute the rules command
pub fn execute(args: RulesArgs) -> Result<()> {
    let rules = RuleSet::builtin()?;
    let report = build_report(&rules);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(())
}
