//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use refactor_scan::output::OutputConfig;

use crate::commands;

/// Refactor Scan - Mine git histories for refactoring commits and classify them
#[derive(Parser, Debug)]
#[command(name = "refactor-scan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clone, mine and classify the configured repositories
    Scan(commands::scan::ScanArgs),

    /// Show the built-in message patterns and capability rules
    Rules(commands::rules::RulesArgs),

    /// Classify a unified diff read from a file or stdin
    Classify(commands::classify::ClassifyArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Scan(args) => commands::scan::execute(args, output),
            Commands::Rules(args) => commands::rules::execute(args),
            Commands::Classify(args) => commands::classify::execute(args, output),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Install `env_logger` at `level`; `RUST_LOG` wins when set.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level.to_lowercase());
    // A logger may already be installed when commands run inside tests.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
