//! Markdown report generation.
//!
//! This module renders a [`FlightReport`] as a Markdown document or as
//! pretty-printed JSON.

use crate::models::{FlightReport, ReportMetadata, StatTable, TablePreview};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &FlightReport) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# FlightStat Report\n\n");

    // Metadata section
    output.push_str(&generate_metadata_section(&report.metadata));

    // Cleaned data sample
    output.push_str(&generate_sample_section(&report.sample));

    // Delay overview
    output.push_str(&generate_delays_section(report));

    // Statistics
    for table in [
        &report.flights_per_airport,
        &report.top_airports_by_flights,
        &report.delayed_per_airline,
        &report.top_airlines_by_delays,
        &report.average_delay_per_airport,
        &report.top_airports_by_average_delay,
    ] {
        output.push_str(&generate_stat_section(table));
    }

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Flights File:** `{}`\n", metadata.flights_source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Rows Loaded:** {}\n", metadata.rows_loaded));
    section.push_str(&format!("- **Rows After Cleaning:** {}\n", metadata.rows_cleaned));
    if !metadata.filter_airports.is_empty() {
        section.push_str(&format!(
            "- **Origin Airports:** {}\n",
            metadata.filter_airports.join(", ")
        ));
    }
    section.push_str(&format!(
        "- **Delay Threshold:** {} min\n",
        metadata.delay_threshold
    ));
    section.push_str(&format!("- **Duration:** {:.1}s\n", metadata.duration_seconds));
    section.push('\n');

    section
}

/// Generate the cleaned data sample.
fn generate_sample_section(sample: &TablePreview) -> String {
    let mut section = String::new();

    section.push_str("## Cleaned Flights Sample\n\n");

    if sample.columns.is_empty() {
        section.push_str("No flights remain after cleaning.\n\n");
        return section;
    }

    section.push_str(&format!("| {} |\n", sample.columns.join(" | ")));
    section.push_str(&format!(
        "|{}\n",
        ":---|".repeat(sample.columns.len())
    ));
    for row in &sample.rows {
        section.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    section.push('\n');

    section
}

/// Generate the delay overview.
fn generate_delays_section(report: &FlightReport) -> String {
    let mut section = String::new();

    section.push_str("## Delays\n\n");
    section.push_str(&format!(
        "- **Delayed Flights (>= {} min):** {}\n",
        report.metadata.delayed_minutes, report.delayed_flights
    ));
    match report.average_delay {
        Some(avg) => section.push_str(&format!("- **Average Departure Delay:** {:.2} min\n", avg)),
        None => section.push_str("- **Average Departure Delay:** -\n"),
    }
    section.push('\n');

    section
}

/// Generate one statistics table.
fn generate_stat_section(table: &StatTable) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", table.title));

    if table.rows.is_empty() {
        section.push_str("No data.\n\n");
        return section;
    }

    section.push_str(&format!("| Code | Name | {} |\n", table.value_label));
    section.push_str("|:---|:---|---:|\n");

    for row in &table.rows {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            row.code,
            row.name.as_deref().unwrap_or("-"),
            table.format_value(row.value)
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by FlightStat v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &FlightReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatRow;
    use chrono::Utc;

    fn create_test_metadata() -> ReportMetadata {
        ReportMetadata {
            generated_at: Utc::now(),
            flights_source: "assets/flights.csv".to_string(),
            rows_loaded: 120,
            rows_cleaned: 80,
            filter_airports: vec!["BOS".to_string(), "JFK".to_string()],
            delay_threshold: 1440.0,
            delayed_minutes: 15.0,
            duration_seconds: 1.5,
        }
    }

    fn stat_table(title: &str, integral: bool, rows: Vec<StatRow>) -> StatTable {
        StatTable {
            title: title.to_string(),
            value_label: "NUM_FLIGHTS".to_string(),
            integral,
            rows,
        }
    }

    fn create_test_report() -> FlightReport {
        let rows = vec![
            StatRow {
                code: "JFK".to_string(),
                name: Some("John F. Kennedy International Airport".to_string()),
                value: Some(50.0),
            },
            StatRow {
                code: "BOS".to_string(),
                name: None,
                value: Some(30.0),
            },
        ];

        FlightReport {
            metadata: create_test_metadata(),
            sample: TablePreview {
                columns: vec!["ORIGIN_AIRPORT".to_string(), "DEPARTURE_DELAY".to_string()],
                rows: vec![vec!["JFK".to_string(), "12".to_string()]],
            },
            delayed_flights: 21,
            average_delay: Some(9.126),
            flights_per_airport: stat_table("Number of Flights per Airport", true, rows.clone()),
            top_airports_by_flights: stat_table("Top 3 Airports", true, rows.clone()),
            delayed_per_airline: stat_table("Delayed per Airline", true, Vec::new()),
            top_airlines_by_delays: stat_table("Top 3 Airlines", true, Vec::new()),
            average_delay_per_airport: stat_table("Average Delay", false, rows.clone()),
            top_airports_by_average_delay: stat_table("Top 3 Slowest", false, rows),
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# FlightStat Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Cleaned Flights Sample"));
        assert!(markdown.contains("## Number of Flights per Airport"));
        assert!(markdown.contains("| JFK | John F. Kennedy International Airport | 50 |"));
        assert!(markdown.contains("| BOS | - | 30.00 |"));
        assert!(markdown.contains("**Delayed Flights (>= 15 min):** 21"));
        assert!(markdown.contains("9.13 min"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let section = generate_metadata_section(&create_test_metadata());

        assert!(section.contains("assets/flights.csv"));
        assert!(section.contains("**Rows Loaded:** 120"));
        assert!(section.contains("**Rows After Cleaning:** 80"));
        assert!(section.contains("BOS, JFK"));
    }

    #[test]
    fn test_generate_sample_section() {
        let sample = TablePreview {
            columns: vec!["A".to_string(), "B".to_string()],
            rows: vec![vec!["1".to_string(), String::new()]],
        };
        let section = generate_sample_section(&sample);

        assert!(section.contains("| A | B |\n|:---|:---|\n"));
        assert!(section.contains("| 1 |  |"));

        let empty = generate_sample_section(&TablePreview::default());
        assert!(empty.contains("No flights remain"));
    }

    #[test]
    fn test_empty_stat_section() {
        let section = generate_stat_section(&stat_table("Empty", true, Vec::new()));
        assert!(section.contains("## Empty"));
        assert!(section.contains("No data."));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"flights_source\""));
        assert!(json.contains("\"delayed_flights\": 21"));
        assert!(json.contains("\"top_airports_by_flights\""));

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["sample"]["columns"][0], "ORIGIN_AIRPORT");
    }
}
