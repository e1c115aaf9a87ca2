//! Flight delay report.
//!
//! Connects the configuration to the generic pipeline: builds the cleaning
//! options for the flights table and computes every statistic in the
//! report from the cleaned table and the airport and airline references.

use crate::analysis::{group_and_count, group_and_mean, group_and_sum, GroupCount, Summary};
use crate::config::{PreprocessConfig, ReportConfig};
use crate::error::Result;
use crate::models::{FlightReport, ReportMetadata, StatRow, StatTable, TablePreview};
use crate::preprocess::{
    ColumnDeriver, ColumnFilter, DatetimeComposition, DelayThreshold, PreprocessOptions,
};
use crate::table::Table;
use tracing::{debug, info, warn};

pub const ORIGIN_AIRPORT: &str = "ORIGIN_AIRPORT";
pub const AIRLINE: &str = "AIRLINE";
pub const DEPARTURE_DELAY: &str = "DEPARTURE_DELAY";
pub const SCHEDULED_DEPARTURE: &str = "SCHEDULED_DEPARTURE";
pub const IS_DELAYED: &str = "IS_DELAYED";
pub const YEAR: &str = "YEAR";
pub const MONTH: &str = "MONTH";
pub const DAY: &str = "DAY";

/// Join key of both reference tables.
pub const IATA_CODE: &str = "IATA_CODE";
/// Name column of the airports reference.
pub const AIRPORT_NAME: &str = "AIRPORT";
/// Name column of the airlines reference.
pub const AIRLINE_NAME: &str = "AIRLINE";

const NUM_FLIGHTS: &str = "NUM_FLIGHTS";
const NUM_DELAYED_FLIGHTS: &str = "NUM_DELAYED_FLIGHTS";
const AVG_DELAY: &str = "AVG_DELAY";

/// Suffix the join gives a reference column whose name clashes.
const RIGHT_SUFFIX: &str = "_y";

/// Cleaning options for the flights table.
pub fn preprocess_options(config: &PreprocessConfig) -> PreprocessOptions {
    PreprocessOptions {
        drop_missing: config.drop_missing,
        filter_column_values: vec![ColumnFilter::new(
            ORIGIN_AIRPORT,
            config.filter_airports.iter().map(String::as_str),
        )],
        delay_threshold: Some(DelayThreshold {
            column: DEPARTURE_DELAY.to_string(),
            max: config.delay_threshold,
        }),
        datetime_composition: Some(DatetimeComposition {
            day_column: DAY.to_string(),
            month_column: MONTH.to_string(),
            year_column: YEAR.to_string(),
            time_column: SCHEDULED_DEPARTURE.to_string(),
            format: config.datetime_format.clone(),
        }),
        additional_columns: vec![(
            IS_DELAYED.to_string(),
            ColumnDeriver::at_least(DEPARTURE_DELAY, config.delayed_minutes),
        )],
        columns_to_drop: vec![YEAR.to_string(), MONTH.to_string(), DAY.to_string()],
    }
}

/// Computes all report statistics from a cleaned flights table.
pub fn build_report(
    cleaned: &Table,
    airports: &Table,
    airlines: &Table,
    config: &ReportConfig,
    metadata: ReportMetadata,
) -> Result<FlightReport> {
    let delayed_flights = cleaned
        .column(IS_DELAYED)?
        .sum()?
        .as_f64()
        .map_or(0, |n| n.round() as i64);
    let average_delay = cleaned.column(DEPARTURE_DELAY)?.mean()?;
    info!("Delayed flights: {}", delayed_flights);

    let per_airport = group_and_count(
        cleaned,
        &GroupCount::new(ORIGIN_AIRPORT)
            .with_join(airports, ORIGIN_AIRPORT, IATA_CODE)
            .with_result_column(NUM_FLIGHTS),
    )?;

    let per_airline = group_and_sum(cleaned, AIRLINE, IS_DELAYED, NUM_DELAYED_FLIGHTS)?;

    let avg_per_airport = group_and_mean(cleaned, ORIGIN_AIRPORT, DEPARTURE_DELAY, AVG_DELAY)?;

    let top_n = config.top_n;
    if per_airport.is_empty() {
        warn!("No origin airports left to summarise");
    }
    debug!(
        "Built summaries: {} flights over {} airports, {} airlines",
        per_airport.total(),
        per_airport.len(),
        per_airline.len()
    );

    Ok(FlightReport {
        metadata,
        sample: TablePreview::from(&cleaned.head(config.sample_rows)),
        delayed_flights,
        average_delay,
        flights_per_airport: stat_table(
            "Number of Flights per Airport",
            &per_airport,
            airports,
            AIRPORT_NAME,
            true,
        )?,
        top_airports_by_flights: stat_table(
            &format!("Top {} Airports by Number of Flights", top_n),
            &per_airport.top_n(top_n)?,
            airports,
            AIRPORT_NAME,
            true,
        )?,
        delayed_per_airline: stat_table(
            "Number of Delayed Flights per Airline",
            &per_airline,
            airlines,
            AIRLINE_NAME,
            true,
        )?,
        top_airlines_by_delays: stat_table(
            &format!("Top {} Airlines by Number of Delayed Flights", top_n),
            &per_airline.top_n(top_n)?,
            airlines,
            AIRLINE_NAME,
            true,
        )?,
        average_delay_per_airport: stat_table(
            "Average Departure Delay per Airport",
            &avg_per_airport,
            airports,
            AIRPORT_NAME,
            false,
        )?,
        top_airports_by_average_delay: stat_table(
            &format!("Top {} Airports by Average Departure Delay", top_n),
            &avg_per_airport.top_n(top_n)?,
            airports,
            AIRPORT_NAME,
            false,
        )?,
    })
}

/// Joins a summary with its reference table and flattens it into rows.
fn stat_table(
    title: &str,
    summary: &Summary,
    reference: &Table,
    name_column: &str,
    integral: bool,
) -> Result<StatTable> {
    let joined = summary.join(reference, IATA_CODE)?;

    // The summary key and value are always the first two joined columns.
    let keys = &joined.columns()[0];
    let values = &joined.columns()[1];
    let names = joined
        .column(name_column)
        .or_else(|_| joined.column(&format!("{}{}", name_column, RIGHT_SUFFIX)))?;

    let rows = keys
        .values()
        .iter()
        .zip(values.values())
        .zip(names.values())
        .map(|((code, value), name)| StatRow {
            code: code.to_string(),
            name: (!name.is_missing()).then(|| name.to_string()),
            value: value.as_f64(),
        })
        .collect();

    Ok(StatTable {
        title: title.to_string(),
        value_label: summary.value_column().to_string(),
        integral,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::loader::load_csv;
    use crate::preprocess::preprocess;
    use crate::table::Value;
    use chrono::Utc;
    use std::path::PathBuf;

    fn fixture(name: &str) -> Table {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("fixtures")
            .join(name);
        load_csv(&path, false).unwrap()
    }

    fn metadata() -> ReportMetadata {
        ReportMetadata {
            generated_at: Utc::now(),
            flights_source: "fixtures/flights.csv".to_string(),
            rows_loaded: 0,
            rows_cleaned: 0,
            filter_airports: Vec::new(),
            delay_threshold: 1440.0,
            delayed_minutes: 15.0,
            duration_seconds: 0.0,
        }
    }

    fn cleaned_fixture() -> Table {
        let config = Config::default();
        preprocess(&fixture("flights.csv"), &preprocess_options(&config.preprocess)).unwrap()
    }

    #[test]
    fn test_preprocess_fixture() {
        let cleaned = cleaned_fixture();

        // ORD rows, the 1500-minute delay and the row missing a tail number are gone.
        assert_eq!(cleaned.row_count(), 8);
        assert!(!cleaned.has_column(YEAR));
        assert!(!cleaned.has_column(MONTH));
        assert!(!cleaned.has_column(DAY));
        assert!(cleaned.has_column(IS_DELAYED));
        assert!(matches!(
            cleaned.column(SCHEDULED_DEPARTURE).unwrap().values()[0],
            Value::Timestamp(_)
        ));
        for value in cleaned.column(ORIGIN_AIRPORT).unwrap().values() {
            let code = value.to_string();
            assert!(["BOS", "JFK", "SFO", "LAX"].contains(&code.as_str()));
        }
    }

    #[test]
    fn test_build_report_from_fixtures() {
        let cleaned = cleaned_fixture();
        let report = build_report(
            &cleaned,
            &fixture("airports.csv"),
            &fixture("airlines.csv"),
            &ReportConfig::default(),
            metadata(),
        )
        .unwrap();

        assert_eq!(report.delayed_flights, 4);
        assert_eq!(report.sample.rows.len(), 5);

        let total: f64 = report
            .flights_per_airport
            .rows
            .iter()
            .filter_map(|r| r.value)
            .sum();
        assert_eq!(total, cleaned.row_count() as f64);

        let top = &report.top_airports_by_flights.rows;
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].code, "JFK");
        assert_eq!(top[0].value, Some(4.0));
        assert_eq!(top[0].name.as_deref(), Some("John F. Kennedy International Airport"));

        let airline = &report.top_airlines_by_delays.rows[0];
        assert_eq!(airline.code, "AA");
        assert_eq!(airline.name.as_deref(), Some("American Airlines Inc."));
        assert_eq!(airline.value, Some(2.0));

        let slowest = &report.top_airports_by_average_delay.rows[0];
        assert_eq!(slowest.code, "SFO");
        assert_eq!(slowest.value, Some(45.0));
    }

    #[test]
    fn test_unknown_airline_has_no_name() {
        let cleaned = Table::from_pairs([
            (ORIGIN_AIRPORT, vec![Value::from("JFK")]),
            (AIRLINE, vec![Value::from("ZZ")]),
            (DEPARTURE_DELAY, vec![Value::Int(30)]),
            (IS_DELAYED, vec![Value::Int(1)]),
        ])
        .unwrap();

        let report = build_report(
            &cleaned,
            &fixture("airports.csv"),
            &fixture("airlines.csv"),
            &ReportConfig::default(),
            metadata(),
        )
        .unwrap();

        assert_eq!(report.delayed_per_airline.rows[0].code, "ZZ");
        assert_eq!(report.delayed_per_airline.rows[0].name, None);
    }
}
