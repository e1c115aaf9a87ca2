//! CSV loading.
//!
//! Reads a headered CSV file into a [`Table`], inferring one type per
//! column: integer, float or string. Empty cells and the usual NA markers
//! become [`Value::Null`].

use crate::table::{Column, Table, Value};
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Cell contents read as missing.
const NA_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "NULL", "null"];

/// Progress spinner refresh interval, in records.
const PROGRESS_STEP: u64 = 50_000;

/// Load a CSV file from disk.
pub fn load_csv(path: &Path, show_progress: bool) -> Result<Table> {
    let file =
        File::open(path).with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let spinner = if show_progress {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg} {pos} rows")
        {
            pb.set_style(style);
        }
        pb.set_message(format!("Reading {}", path.display()));
        Some(pb)
    } else {
        None
    };

    let table = read_csv(file, spinner.as_ref())
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    info!(
        "Loaded {} rows x {} columns from {}",
        table.row_count(),
        table.column_count(),
        path.display()
    );
    Ok(table)
}

/// Read CSV data from any reader, advancing `progress` as records arrive.
fn read_csv<R: Read>(reader: R, progress: Option<&ProgressBar>) -> Result<Table> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    let mut rows: u64 = 0;

    for record in rdr.records() {
        let record = record.with_context(|| format!("Malformed CSV record {}", rows + 1))?;
        for (column, field) in raw.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
        rows += 1;
        if let Some(pb) = progress {
            if rows % PROGRESS_STEP == 0 {
                pb.set_position(rows);
            }
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| infer_column(name, cells))
        .collect();

    Ok(Table::new(columns)?)
}

/// Picks the narrowest type that fits every non-missing cell.
fn infer_column(name: String, cells: Vec<String>) -> Column {
    let present = || cells.iter().map(|c| c.trim()).filter(|c| !is_na(c));

    let values = if present().all(|c| c.parse::<i64>().is_ok()) {
        debug!("Column '{}' inferred as integer", name);
        cells.iter().map(|c| parse_cell(c, |s| s.parse().ok().map(Value::Int))).collect()
    } else if present().all(|c| c.parse::<f64>().is_ok()) {
        debug!("Column '{}' inferred as float", name);
        cells.iter().map(|c| parse_cell(c, |s| s.parse().ok().map(Value::Float))).collect()
    } else {
        debug!("Column '{}' inferred as string", name);
        cells.iter().map(|c| parse_cell(c, |s| Some(Value::from(s)))).collect()
    };

    Column::new(name, values)
}

fn parse_cell(cell: &str, parse: impl Fn(&str) -> Option<Value>) -> Value {
    let cell = cell.trim();
    if is_na(cell) {
        return Value::Null;
    }
    parse(cell).unwrap_or(Value::Null)
}

fn is_na(cell: &str) -> bool {
    NA_MARKERS.contains(&cell)
}
