//! Table cleaning pipeline.
//!
//! [`preprocess`] applies a fixed sequence of optional steps to a table:
//!
//! 1. drop rows with missing values
//! 2. keep rows whose column values are in allowed sets
//! 3. keep rows at or below a numeric threshold
//! 4. compose day/month/year/time columns into a timestamp
//! 5. add constant or derived columns
//! 6. drop columns
//!
//! Each step sees the output of the previous one. The input table is never
//! modified.

mod deriver;

pub use deriver::ColumnDeriver;

use crate::error::{PipelineError, Result};
use crate::table::{Column, Table, Value};
use chrono::NaiveDateTime;
use std::collections::HashSet;
use tracing::debug;

/// Width the time-of-day field is zero-padded to before parsing.
const TIME_FIELD_WIDTH: usize = 4;

/// Stand-in for a missing part in the composed string shown in errors.
const MISSING_PART: &str = "nan";

/// Keep only rows whose value in `column` is one of `allowed`.
#[derive(Debug, Clone)]
pub struct ColumnFilter {
    pub column: String,
    pub allowed: HashSet<Value>,
}

impl ColumnFilter {
    pub fn new<V: Into<Value>>(
        column: impl Into<String>,
        allowed: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            column: column.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

/// Keep only rows whose value in `column` is at most `max`.
#[derive(Debug, Clone)]
pub struct DelayThreshold {
    pub column: String,
    pub max: f64,
}

/// Builds a timestamp from separate date parts and a `HHMM` time column.
///
/// Each row becomes `"{day}-{month}-{year} {time}"`, with the time
/// left-padded with zeros to four characters, and is parsed with `format`.
/// The result replaces `time_column`.
#[derive(Debug, Clone)]
pub struct DatetimeComposition {
    pub day_column: String,
    pub month_column: String,
    pub year_column: String,
    pub time_column: String,
    /// `chrono` format string, e.g. `%d-%m-%Y %H%M`.
    pub format: String,
}

/// Options for [`preprocess`]. Every step is skipped when left at its default,
/// except `drop_missing` which defaults to `true`.
#[derive(Debug)]
pub struct PreprocessOptions {
    /// Drop any row containing a missing value.
    pub drop_missing: bool,
    /// Membership filters, combined with AND.
    pub filter_column_values: Vec<ColumnFilter>,
    /// Upper bound filter applied after the membership filters.
    pub delay_threshold: Option<DelayThreshold>,
    /// Timestamp composition.
    pub datetime_composition: Option<DatetimeComposition>,
    /// New columns, applied in order.
    pub additional_columns: Vec<(String, ColumnDeriver)>,
    /// Columns to remove; absent names are ignored.
    pub columns_to_drop: Vec<String>,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            drop_missing: true,
            filter_column_values: Vec::new(),
            delay_threshold: None,
            datetime_composition: None,
            additional_columns: Vec::new(),
            columns_to_drop: Vec::new(),
        }
    }
}

/// Runs the cleaning pipeline and returns the cleaned table.
pub fn preprocess(table: &Table, options: &PreprocessOptions) -> Result<Table> {
    debug!(
        "Preprocessing {} rows x {} columns",
        table.row_count(),
        table.column_count()
    );

    let mut df = if options.drop_missing {
        drop_missing(table)
    } else {
        table.clone()
    };

    for filter in &options.filter_column_values {
        df = filter_values(&df, filter)?;
    }

    if let Some(ref threshold) = options.delay_threshold {
        df = filter_threshold(&df, threshold)?;
    }

    if let Some(ref composition) = options.datetime_composition {
        compose_datetime(&mut df, composition)?;
    }

    for (name, deriver) in &options.additional_columns {
        let values = deriver.evaluate(&df)?;
        df.set_column(Column::new(name.clone(), values))?;
        debug!("Added column '{}'", name);
    }

    if !options.columns_to_drop.is_empty() {
        let dropped = df.drop_columns(&options.columns_to_drop);
        debug!(
            "Dropped {} of {} requested columns",
            dropped,
            options.columns_to_drop.len()
        );
    }

    debug!("Preprocessing done: {} rows remain", df.row_count());
    Ok(df)
}

/// Removes every row that has a missing value in any column.
pub fn drop_missing(table: &Table) -> Table {
    let out = table.filter_rows(|row| {
        table
            .columns()
            .iter()
            .all(|c| !c.values()[row].is_missing())
    });
    debug!(
        "drop_missing: {} -> {} rows",
        table.row_count(),
        out.row_count()
    );
    out
}

/// Keeps rows whose value in the filter column is in the allowed set.
pub fn filter_values(table: &Table, filter: &ColumnFilter) -> Result<Table> {
    let column = table.column(&filter.column)?;
    let out = table.filter_rows(|row| filter.allowed.contains(&column.values()[row]));
    debug!(
        "filter '{}': {} -> {} rows",
        filter.column,
        table.row_count(),
        out.row_count()
    );
    Ok(out)
}

/// Keeps rows whose value is at most the threshold. Missing values are dropped.
pub fn filter_threshold(table: &Table, threshold: &DelayThreshold) -> Result<Table> {
    let column = table.column(&threshold.column)?;

    let mut keep = Vec::with_capacity(table.row_count());
    for (row, value) in column.values().iter().enumerate() {
        if value.is_missing() {
            keep.push(false);
            continue;
        }
        let Some(n) = value.as_f64() else {
            return Err(PipelineError::Type {
                column: threshold.column.clone(),
                row,
                expected: "numeric",
            });
        };
        keep.push(n <= threshold.max);
    }

    let out = table.filter_rows(|row| keep[row]);
    debug!(
        "threshold '{}' <= {}: {} -> {} rows",
        threshold.column,
        threshold.max,
        table.row_count(),
        out.row_count()
    );
    Ok(out)
}

/// Replaces the time column with parsed timestamps. Fails on the first row
/// that does not parse, leaving `table` untouched.
pub fn compose_datetime(table: &mut Table, spec: &DatetimeComposition) -> Result<()> {
    let day = table.column(&spec.day_column)?;
    let month = table.column(&spec.month_column)?;
    let year = table.column(&spec.year_column)?;
    let time = table.column(&spec.time_column)?;

    let mut parsed = Vec::with_capacity(table.row_count());
    for row in 0..table.row_count() {
        let parts = [
            &day.values()[row],
            &month.values()[row],
            &year.values()[row],
            &time.values()[row],
        ];
        let input = format!(
            "{}-{}-{} {}",
            datetime_part(parts[0]),
            datetime_part(parts[1]),
            datetime_part(parts[2]),
            zero_pad(&datetime_part(parts[3]), TIME_FIELD_WIDTH)
        );
        let format_error = |source: Option<chrono::ParseError>| PipelineError::Format {
            row,
            input: input.clone(),
            format: spec.format.clone(),
            source,
        };

        if parts.iter().any(|v| v.is_missing()) {
            return Err(format_error(None));
        }
        let ts = NaiveDateTime::parse_from_str(&input, &spec.format)
            .map_err(|e| format_error(Some(e)))?;
        parsed.push(Value::Timestamp(ts));
    }

    table.set_column(Column::new(spec.time_column.clone(), parsed))?;
    debug!("Composed timestamps into '{}'", spec.time_column);
    Ok(())
}

/// Text of one date or time part; missing parts read `nan`.
fn datetime_part(value: &Value) -> String {
    if value.is_missing() {
        MISSING_PART.to_string()
    } else {
        value.to_string()
    }
}

/// Left-pads with zeros to `width` characters, keeping a leading sign first.
fn zero_pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.to_string();
    }
    let pad = "0".repeat(width - len);
    match s.chars().next() {
        Some(sign @ ('-' | '+')) => format!("{}{}{}", sign, pad, &s[1..]),
        _ => format!("{}{}", pad, s),
    }
}
