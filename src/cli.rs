// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `parbuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "parbuild",
    version,
    about = "Run build targets in parallel, respecting their dependencies.",
    long_about = None
)]
pub struct CliArgs {
    /// Targets to run, in order. Defaults to `[project].default`.
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Path to the build file (TOML).
    #[arg(short = 'f', long, value_name = "PATH", default_value = "Parbuild.toml")]
    pub file: String,

    /// Set a project property, overriding `[properties]` (repeatable).
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub defines: Vec<(String, String)>,

    /// Number of worker threads (sets `parbuild.numthreads`).
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,

    /// Give up after this many seconds (sets `parbuild.timeout`).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Log every target submission and completion (sets `parbuild.debug`).
    #[arg(long)]
    pub debug: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PARBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved order of each target, but don't
    /// run anything.
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

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("invalid property definition '{s}' (expected KEY=VALUE)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_targets_and_overrides() {
        let args = CliArgs::try_parse_from([
            "parbuild",
            "-j",
            "4",
            "-D",
            "greeting=hi there",
            "--timeout",
            "30",
            "--debug",
            "compile",
            "test",
        ])
        .unwrap();

        assert_eq!(args.targets, vec!["compile", "test"]);
        assert_eq!(args.threads, Some(4));
        assert_eq!(args.timeout, Some(30));
        assert!(args.debug);
        assert_eq!(
            args.defines,
            vec![("greeting".to_string(), "hi there".to_string())]
        );
        assert_eq!(args.file, "Parbuild.toml");
    }

    #[test]
    fn rejects_define_without_equals() {
        assert!(CliArgs::try_parse_from(["parbuild", "-D", "oops"]).is_err());
    }
}
