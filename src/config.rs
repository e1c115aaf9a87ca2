//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.flightstat.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".flightstat.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input file locations.
    #[serde(default)]
    pub data: DataConfig,

    /// Flight cleaning settings.
    #[serde(default)]
    pub preprocess: PreprocessConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Paths of the CSV inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Flight records.
    #[serde(default = "default_flights_csv")]
    pub flights_csv: PathBuf,

    /// Airport reference table.
    #[serde(default = "default_airports_csv")]
    pub airports_csv: PathBuf,

    /// Airline reference table.
    #[serde(default = "default_airlines_csv")]
    pub airlines_csv: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            flights_csv: default_flights_csv(),
            airports_csv: default_airports_csv(),
            airlines_csv: default_airlines_csv(),
        }
    }
}

fn default_flights_csv() -> PathBuf {
    PathBuf::from("assets/flights.csv")
}

fn default_airports_csv() -> PathBuf {
    PathBuf::from("assets/airports.csv")
}

fn default_airlines_csv() -> PathBuf {
    PathBuf::from("assets/airlines.csv")
}

/// Settings for cleaning the flights table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Drop rows with any missing value.
    #[serde(default = "default_true")]
    pub drop_missing: bool,

    /// Origin airports to keep.
    #[serde(default = "default_filter_airports")]
    pub filter_airports: Vec<String>,

    /// Maximum departure delay kept, in minutes.
    #[serde(default = "default_delay_threshold")]
    pub delay_threshold: f64,

    /// Departure delay from which a flight counts as delayed, in minutes.
    #[serde(default = "default_delayed_minutes")]
    pub delayed_minutes: f64,

    /// Format of the composed `day-month-year time` string.
    #[serde(default = "default_datetime_format")]
    pub datetime_format: String,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            drop_missing: true,
            filter_airports: default_filter_airports(),
            delay_threshold: default_delay_threshold(),
            delayed_minutes: default_delayed_minutes(),
            datetime_format: default_datetime_format(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_filter_airports() -> Vec<String> {
    vec!["BOS", "JFK", "SFO", "LAX"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_delay_threshold() -> f64 {
    24.0 * 60.0 // 24 hours
}

fn default_delayed_minutes() -> f64 {
    15.0
}

fn default_datetime_format() -> String {
    "%d-%m-%Y %H%M".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of rows in each top-N ranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Number of cleaned rows shown as a sample.
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            sample_rows: default_sample_rows(),
        }
    }
}

fn default_top_n() -> usize {
    3
}

fn default_sample_rows() -> usize {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref path) = args.flights {
            self.data.flights_csv = path.clone();
        }
        if let Some(ref path) = args.airports {
            self.data.airports_csv = path.clone();
        }
        if let Some(ref path) = args.airlines {
            self.data.airlines_csv = path.clone();
        }

        if let Some(ref airports) = args.filter_airports {
            self.preprocess.filter_airports = airports.clone();
        }
        if let Some(threshold) = args.delay_threshold {
            self.preprocess.delay_threshold = threshold;
        }
        if let Some(minutes) = args.delayed_minutes {
            self.preprocess.delayed_minutes = minutes;
        }
        if args.keep_missing {
            self.preprocess.drop_missing = false;
        }

        if let Some(top_n) = args.top_n {
            self.report.top_n = top_n;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
