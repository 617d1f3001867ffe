// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::config::{TaskNames, DEFAULT_CONFIG_FILE};

/// Command-line arguments for `bazbuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bazbuild",
    version,
    about = "Compile styles, bundle scripts and optimise images, then watch for changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Tasks to run, in order.
    #[arg(value_name = "TASK", default_value = TaskNames::DEFAULT)]
    pub tasks: Vec<String>,

    /// Path to the config file (TOML, or JSON by `.json` extension).
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BAZBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print tasks and pipelines, but build nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Minify output regardless of `production_ready` in the config.
    #[arg(long)]
    pub production: bool,
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
    fn defaults_to_default_task() {
        let args = CliArgs::try_parse_from(["bazbuild"]).unwrap();
        assert_eq!(args.tasks, vec!["default".to_string()]);
        assert_eq!(args.config, "Bazbuild.toml");
        assert!(!args.production);
    }

    #[test]
    fn positional_tasks_keep_order() {
        let args =
            CliArgs::try_parse_from(["bazbuild", "cleanup", "js", "--production"]).unwrap();
        assert_eq!(args.tasks, vec!["cleanup".to_string(), "js".to_string()]);
        assert!(args.production);
    }
}
