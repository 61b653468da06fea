// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `cmdrunner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cmdrunner",
    version,
    about = "Run templated commands by trigger word and act on their results.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the command definitions (TOML).
    ///
    /// Default: `CMDRUNNER_CONFIG`, then `~/.config/cmdrunner/commands.toml`.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CMDRUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Run the match for this action suffix instead of the default one.
    #[arg(long, value_name = "SUFFIX")]
    pub action: Option<String>,

    /// Print the matches for QUERY and exit.
    #[arg(long)]
    pub list: bool,

    /// Print the execution plan for QUERY without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Read one query per line from stdin until EOF.
    #[arg(long, conflicts_with_all = ["list", "dry_run"])]
    pub stdin: bool,

    /// Trigger word followed by its arguments, e.g. `ff *.log`.
    #[arg(
        value_name = "QUERY",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub query: Vec<String>,
}

impl CliArgs {
    /// The positional words joined back into one query.
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }
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
