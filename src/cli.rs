// src/cli.rs

//! CLI argument parsing for the `dagflow` demo binary.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `dagflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dagflow",
    version,
    about = "Run the getting-dressed demo graph through the dagflow engine.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to an optional config file (TOML).
    ///
    /// Default: `Dagflow.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAGFLOW_LOG`, the config file, or `info` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Cap on tasks running at the same time (overrides the config file).
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,

    /// Cancel the run as soon as this task has finished.
    #[arg(long, value_name = "TASK")]
    pub cancel_after: Option<String>,

    /// Make this task fail.
    #[arg(long, value_name = "TASK")]
    pub fail: Option<String>,

    /// Print the graph but don't run it.
    #[arg(long)]
    pub dry_run: bool,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_flags() {
        let args = CliArgs::try_parse_from([
            "dagflow",
            "--config",
            "x.toml",
            "--log-level",
            "debug",
            "--max-concurrency",
            "2",
            "--cancel-after",
            "shirt",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(args.config.as_deref(), Some("x.toml"));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert_eq!(args.max_concurrency, Some(2));
        assert_eq!(args.cancel_after.as_deref(), Some("shirt"));
        assert!(args.fail.is_none());
        assert!(args.dry_run);
    }

    #[test]
    fn everything_is_optional() {
        let args = CliArgs::try_parse_from(["dagflow"]).unwrap();
        assert!(args.config.is_none());
        assert!(!args.dry_run);
    }
}
