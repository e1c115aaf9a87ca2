//! Data models for the flight report.
//!
//! These structures hold the finished statistics in a presentation-neutral
//! form so they can be rendered as Markdown or serialized as JSON.

use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One ranked entry: a code, its reference name and a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    /// Airport or airline IATA code.
    pub code: String,
    /// Name from the reference table, if the code was found there.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The statistic, `None` when it could not be computed.
    pub value: Option<f64>,
}

/// A titled list of [`StatRow`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatTable {
    /// Section heading.
    pub title: String,
    /// Header of the value column.
    pub value_label: String,
    /// Whether values are whole numbers (counts).
    pub integral: bool,
    /// Rows in display order.
    pub rows: Vec<StatRow>,
}

impl StatTable {
    /// Formats a row value for display.
    pub fn format_value(&self, value: Option<f64>) -> String {
        match value {
            None => "-".to_string(),
            Some(v) if self.integral => format!("{:.0}", v),
            Some(v) => format!("{:.2}", v),
        }
    }
}

/// Rendered head of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TablePreview {
    /// Column names.
    pub columns: Vec<String>,
    /// Cell text, row by row.
    pub rows: Vec<Vec<String>>,
}

impl From<&Table> for TablePreview {
    fn from(table: &Table) -> Self {
        let columns = table.column_names().into_iter().map(String::from).collect();
        let rows = (0..table.row_count())
            .filter_map(|r| table.row(r))
            .map(|row| row.into_iter().map(ToString::to_string).collect())
            .collect();
        Self { columns, rows }
    }
}

/// Metadata about the report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Path of the flights file.
    pub flights_source: String,
    /// Rows read from the flights file.
    pub rows_loaded: usize,
    /// Rows left after cleaning.
    pub rows_cleaned: usize,
    /// Origin airports kept.
    pub filter_airports: Vec<String>,
    /// Maximum departure delay kept, in minutes.
    pub delay_threshold: f64,
    /// Delay from which a flight counts as delayed, in minutes.
    pub delayed_minutes: f64,
    /// Time spent loading, cleaning and aggregating, in seconds.
    pub duration_seconds: f64,
}

impl ReportMetadata {
    /// Sets the duration to the time elapsed since `started`.
    pub fn record_duration(&mut self, started: Instant) {
        self.duration_seconds = started.elapsed().as_secs_f64();
    }
}

/// The complete flight delay report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightReport {
    /// Metadata about the run.
    pub metadata: ReportMetadata,
    /// First rows of the cleaned flights table.
    pub sample: TablePreview,
    /// Number of flights at or above the delayed threshold.
    pub delayed_flights: i64,
    /// Mean departure delay in minutes, if any flight remains.
    pub average_delay: Option<f64>,
    /// Flights per origin airport.
    pub flights_per_airport: StatTable,
    /// Airports with the most flights.
    pub top_airports_by_flights: StatTable,
    /// Delayed flights per airline.
    pub delayed_per_airline: StatTable,
    /// Airlines with the most delayed flights.
    pub top_airlines_by_delays: StatTable,
    /// Mean departure delay per origin airport.
    pub average_delay_per_airport: StatTable,
    /// Airports with the highest mean departure delay.
    pub top_airports_by_average_delay: StatTable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use std::time::Duration;

    #[test]
    fn test_format_value() {
        let mut table = StatTable {
            title: "Flights".to_string(),
            value_label: "NUM_FLIGHTS".to_string(),
            integral: true,
            rows: Vec::new(),
        };
        assert_eq!(table.format_value(Some(12.0)), "12");
        assert_eq!(table.format_value(None), "-");

        table.integral = false;
        assert_eq!(table.format_value(Some(7.456)), "7.46");
    }

    #[test]
    fn test_record_duration_covers_whole_run() {
        let mut metadata = ReportMetadata {
            generated_at: Utc::now(),
            flights_source: "flights.csv".to_string(),
            rows_loaded: 10,
            rows_cleaned: 8,
            filter_airports: Vec::new(),
            delay_threshold: 1440.0,
            delayed_minutes: 15.0,
            duration_seconds: 0.0,
        };
        let started = Instant::now()
            .checked_sub(Duration::from_millis(1500))
            .unwrap();

        metadata.record_duration(started);
        assert!(metadata.duration_seconds >= 1.5);
    }

    #[test]
    fn test_table_preview() {
        let table = Table::from_pairs([
            ("ORIGIN_AIRPORT", vec![Value::from("JFK"), Value::from("LAX")]),
            ("DEPARTURE_DELAY", vec![Value::Int(20), Value::Null]),
        ])
        .unwrap();

        let preview = TablePreview::from(&table);
        assert_eq!(preview.columns, vec!["ORIGIN_AIRPORT", "DEPARTURE_DELAY"]);
        assert_eq!(
            preview.rows,
            vec![
                vec!["JFK".to_string(), "20".to_string()],
                vec!["LAX".to_string(), String::new()],
            ]
        );
    }
}
