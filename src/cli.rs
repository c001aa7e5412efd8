// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `reasonloop`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "reasonloop",
    version,
    about = "Decompose an objective into tasks with an LLM and run them over a dependency DAG.",
    long_about = None
)]
pub struct CliArgs {
    /// The objective to achieve.
    #[arg(long, short = 'o', value_name = "TEXT")]
    pub objective: Option<String>,

    /// Path to an agent profile (TOML). Without it, a built-in
    /// general-purpose profile with every registered ability is used.
    #[arg(long, value_name = "PATH")]
    pub agent: Option<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Reasonloop.toml` in the current working directory; a
    /// missing file means defaults for everything.
    #[arg(long, value_name = "PATH", default_value = "Reasonloop.toml")]
    pub config: String,

    /// Plan only: print the task list, don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// List available abilities and exit.
    #[arg(long)]
    pub list_abilities: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `REASONLOOP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
