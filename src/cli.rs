//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// FlightStat - flight delay statistics from CSV exports
///
/// Cleans a flights table, then reports delayed flights, flights per
/// airport, delayed flights per airline and average delays, each with a
/// top-N ranking joined against airport and airline reference tables.
///
/// Examples:
///   flightstat
///   flightstat --flights data/flights.csv --top-n 5
///   flightstat --filter-airports ORD,ATL --format json --output report.json
///   flightstat --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Flights CSV file
    ///
    /// Overrides `data.flights_csv` from the config file.
    #[arg(long, value_name = "FILE", env = "FLIGHTSTAT_FLIGHTS")]
    pub flights: Option<PathBuf>,

    /// Airports reference CSV file
    #[arg(long, value_name = "FILE")]
    pub airports: Option<PathBuf>,

    /// Airlines reference CSV file
    #[arg(long, value_name = "FILE")]
    pub airlines: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .flightstat.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file for the report
    ///
    /// The report is printed to stdout when not given.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Number of entries in each top-N ranking
    #[arg(long, value_name = "N")]
    pub top_n: Option<usize>,

    /// Origin airports to keep (comma-separated)
    ///
    /// Example: --filter-airports BOS,JFK,SFO,LAX
    #[arg(long, value_name = "CODES", value_delimiter = ',')]
    pub filter_airports: Option<Vec<String>>,

    /// Maximum departure delay to keep, in minutes
    #[arg(long, value_name = "MINUTES")]
    pub delay_threshold: Option<f64>,

    /// Departure delay from which a flight counts as delayed, in minutes
    #[arg(long, value_name = "MINUTES")]
    pub delayed_minutes: Option<f64>,

    /// Keep rows with missing values
    #[arg(long)]
    pub keep_missing: bool,

    /// Do not show a progress spinner while reading CSV files
    #[arg(long)]
    pub no_progress: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .flightstat.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
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

        if self.top_n == Some(0) {
            return Err("Top-N must be at least 1".to_string());
        }

        if let Some(threshold) = self.delay_threshold {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err("Delay threshold must be a positive number of minutes".to_string());
            }
        }

        if let Some(minutes) = self.delayed_minutes {
            if !minutes.is_finite() {
                return Err("Delayed minutes must be a finite number".to_string());
            }
        }

        if let Some(ref airports) = self.filter_airports {
            if airports.iter().any(|a| a.trim().is_empty()) {
                return Err("Airport codes in --filter-airports must not be empty".to_string());
            }
        }

        for path in [&self.flights, &self.airports, &self.airlines].into_iter().flatten() {
            if !path.is_file() {
                return Err(format!("Input file does not exist: {}", path.display()));
            }
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

    /// Whether a progress spinner should be drawn.
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}
