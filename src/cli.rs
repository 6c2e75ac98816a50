//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// PetStats - summary statistics for a classifier run
///
/// Reads a JSON result set (item id -> [true label, predicted label,
/// label match, is target category, predicted target category]) and
/// writes the statistics report as JSON to stdout.
///
/// Examples:
///   petstats --input results.json
///   petstats --input results.json --shards 4 --compact
///   petstats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON result set to summarize
    ///
    /// Defaults to the config file's input path, then results.json.
    #[arg(short, long, value_name = "FILE", env = "PETSTATS_INPUT")]
    pub input: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .petstats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of shards to tally in parallel
    #[arg(long, value_name = "NUM")]
    pub shards: Option<usize>,

    /// Emit compact (single-line) JSON
    #[arg(long)]
    pub compact: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .petstats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.shards == Some(0) {
            return Err("Shards must be at least 1".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Builds the log filter from `RUST_LOG`-style directives.
    ///
    /// `--verbose` and `--quiet` take precedence over the directives; without
    /// either flag or directives the level is INFO.
    pub fn log_filter(&self, directives: Option<&str>) -> EnvFilter {
        let builder = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.log_level()).into());

        match directives {
            Some(directives) if !self.verbose && !self.quiet => builder.parse_lossy(directives),
            _ => builder.parse_lossy(""),
        }
    }
}
