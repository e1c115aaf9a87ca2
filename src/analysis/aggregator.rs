//! Grouped aggregation over tables.
//!
//! This module partitions a table by a key column and reduces each
//! partition to one number: a count, a sum or a mean. Counting can first
//! enrich the table with a left join against a reference table.

use super::summary::Summary;
use crate::error::Result;
use crate::table::{left_join, Column, Table, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Default name of the count column produced by [`group_and_count`].
pub const DEFAULT_COUNT_COLUMN: &str = "COUNT";

/// Left join applied before grouping.
#[derive(Debug, Clone)]
pub struct JoinSpec<'a> {
    /// Reference table. Its `right_on` keys are expected to be unique.
    pub right: &'a Table,
    /// Key column in the table being grouped.
    pub left_on: String,
    /// Key column in the reference table.
    pub right_on: String,
}

/// Options for [`group_and_count`].
#[derive(Debug, Clone)]
pub struct GroupCount<'a> {
    /// Column whose distinct values define the groups.
    pub group_by: String,
    /// Count non-missing values of this column instead of rows.
    pub count_column: Option<String>,
    /// Optional join performed before grouping.
    pub join: Option<JoinSpec<'a>>,
    /// Name of the count column in the output.
    pub result_column: String,
}

impl<'a> GroupCount<'a> {
    /// Count rows per distinct value of `group_by`.
    pub fn new(group_by: impl Into<String>) -> Self {
        Self {
            group_by: group_by.into(),
            count_column: None,
            join: None,
            result_column: DEFAULT_COUNT_COLUMN.to_string(),
        }
    }

    #[allow(dead_code)] // Presence counting for callers that keep missing values
    pub fn with_count_column(mut self, column: impl Into<String>) -> Self {
        self.count_column = Some(column.into());
        self
    }

    pub fn with_join(
        mut self,
        right: &'a Table,
        left_on: impl Into<String>,
        right_on: impl Into<String>,
    ) -> Self {
        self.join = Some(JoinSpec {
            right,
            left_on: left_on.into(),
            right_on: right_on.into(),
        });
        self
    }

    pub fn with_result_column(mut self, name: impl Into<String>) -> Self {
        self.result_column = name.into();
        self
    }
}

/// Groups `table` and counts rows (or present values) per group.
///
/// With a join spec the table is first left-joined with the reference table.
/// If the reference keys are not unique, matching rows are repeated and the
/// counts grow accordingly; this is not checked.
///
/// Rows whose group key is missing belong to no group. The result has
/// exactly two columns, the group key and the count, one row per group in
/// ascending key order.
pub fn group_and_count(table: &Table, options: &GroupCount<'_>) -> Result<Summary> {
    let joined;
    let working = match options.join {
        Some(ref join) => {
            joined = left_join(table, join.right, &join.left_on, &join.right_on)?;
            debug!(
                "Joined on {} = {}: {} -> {} rows",
                join.left_on,
                join.right_on,
                table.row_count(),
                joined.row_count()
            );
            &joined
        }
        None => table,
    };

    let keys = working.column(&options.group_by)?;
    let counted = options
        .count_column
        .as_deref()
        .map(|name| working.column(name))
        .transpose()?;

    let groups = partition(keys);
    let counts = groups.into_iter().map(|(key, rows)| {
        let n = match counted {
            Some(column) => column.take(&rows).count_present(),
            None => rows.len(),
        };
        (key.clone(), Value::Int(n as i64))
    });

    let summary = Summary::from_groups(&options.group_by, &options.result_column, counts)?;
    debug!(
        "group_and_count by '{}': {} groups",
        options.group_by,
        summary.len()
    );
    Ok(summary)
}

/// Sums `value_column` per group. Missing values are skipped.
pub fn group_and_sum(
    table: &Table,
    group_by: &str,
    value_column: &str,
    result_column: &str,
) -> Result<Summary> {
    reduce_groups(table, group_by, value_column, result_column, Column::sum)
}

/// Averages `value_column` per group. Groups without values get `Null`.
pub fn group_and_mean(
    table: &Table,
    group_by: &str,
    value_column: &str,
    result_column: &str,
) -> Result<Summary> {
    reduce_groups(table, group_by, value_column, result_column, |column| {
        Ok(Value::from(column.mean()?))
    })
}

fn reduce_groups<F>(
    table: &Table,
    group_by: &str,
    value_column: &str,
    result_column: &str,
    reduce: F,
) -> Result<Summary>
where
    F: Fn(&Column) -> Result<Value>,
{
    let keys = table.column(group_by)?;
    let values = table.column(value_column)?;

    let mut reduced = Vec::new();
    for (key, rows) in partition(keys) {
        reduced.push((key.clone(), reduce(&values.take(&rows))?));
    }

    debug!(
        "Reduced '{}' by '{}': {} groups",
        value_column,
        group_by,
        reduced.len()
    );
    Summary::from_groups(group_by, result_column, reduced)
}

/// Row indices per distinct non-missing key, keys in ascending order.
fn partition(keys: &Column) -> BTreeMap<&Value, Vec<usize>> {
    let mut groups: BTreeMap<&Value, Vec<usize>> = BTreeMap::new();
    for (row, key) in keys.values().iter().enumerate() {
        if !key.is_missing() {
            groups.entry(key).or_default().push(row);
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn strs(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::from(*s)).collect()
    }

    fn ints(items: &[i64]) -> Vec<Value> {
        items.iter().map(|&i| Value::Int(i)).collect()
    }

    fn sample_flights() -> Table {
        Table::from_pairs([
            ("ORIGIN_AIRPORT", strs(&["JFK", "LAX", "JFK", "ORD", "LAX"])),
            ("IS_DELAYED", ints(&[1, 0, 1, 0, 1])),
        ])
        .unwrap()
    }

    fn airports() -> Table {
        Table::from_pairs([
            ("IATA_CODE", strs(&["JFK", "LAX", "ORD"])),
            ("CITY", strs(&["New York", "Los Angeles", "Chicago"])),
        ])
        .unwrap()
    }

    #[test]
    fn test_group_and_count() {
        let summary = group_and_count(
            &sample_flights(),
            &GroupCount::new("ORIGIN_AIRPORT").with_result_column("NUM_FLIGHTS"),
        )
        .unwrap();

        assert_eq!(summary.table().column_names(), vec!["ORIGIN_AIRPORT", "NUM_FLIGHTS"]);
        assert_eq!(summary.get(&Value::from("JFK")), Some(&Value::Int(2)));
        assert_eq!(summary.get(&Value::from("LAX")), Some(&Value::Int(2)));
        assert_eq!(summary.get(&Value::from("ORD")), Some(&Value::Int(1)));
        assert_eq!(summary.len(), 3);
    }

    #[test]
    fn test_default_result_column() {
        let summary =
            group_and_count(&sample_flights(), &GroupCount::new("ORIGIN_AIRPORT")).unwrap();
        assert_eq!(summary.table().column_names(), vec!["ORIGIN_AIRPORT", "COUNT"]);
    }

    #[test]
    fn test_count_conservation() {
        let table = sample_flights();
        let summary = group_and_count(&table, &GroupCount::new("IS_DELAYED")).unwrap();
        assert_eq!(summary.total(), table.row_count() as f64);
    }

    #[test]
    fn test_presence_count() {
        let table = Table::from_pairs([
            ("AIRLINE", strs(&["AA", "AA", "UA", "UA"])),
            ("TAIL", vec![Value::from("N1"), Value::Null, Value::Null, Value::Null]),
        ])
        .unwrap();

        let summary = group_and_count(
            &table,
            &GroupCount::new("AIRLINE").with_count_column("TAIL"),
        )
        .unwrap();

        assert_eq!(summary.get(&Value::from("AA")), Some(&Value::Int(1)));
        assert_eq!(summary.get(&Value::from("UA")), Some(&Value::Int(0)));
        assert_eq!(summary.total(), 1.0);
    }

    #[test]
    fn test_missing_group_keys_are_excluded() {
        let table = Table::from_pairs([("K", vec![Value::from("a"), Value::Null])]).unwrap();
        let summary = group_and_count(&table, &GroupCount::new("K")).unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary.total(), 1.0);
    }

    #[test]
    fn test_join_preserves_counts_with_unique_keys() {
        let table = sample_flights();
        let reference = airports();

        let plain = group_and_count(&table, &GroupCount::new("ORIGIN_AIRPORT")).unwrap();
        let joined = group_and_count(
            &table,
            &GroupCount::new("CITY").with_join(&reference, "ORIGIN_AIRPORT", "IATA_CODE"),
        )
        .unwrap();

        assert_eq!(plain.total(), joined.total());
        assert_eq!(joined.get(&Value::from("New York")), Some(&Value::Int(2)));
    }

    #[test]
    fn test_join_with_duplicate_keys_inflates_counts() {
        let reference = Table::from_pairs([
            ("IATA_CODE", strs(&["JFK", "JFK"])),
            ("CITY", strs(&["New York", "New York"])),
        ])
        .unwrap();

        let summary = group_and_count(
            &sample_flights(),
            &GroupCount::new("ORIGIN_AIRPORT").with_join(&reference, "ORIGIN_AIRPORT", "IATA_CODE"),
        )
        .unwrap();

        assert_eq!(summary.get(&Value::from("JFK")), Some(&Value::Int(4)));
    }

    #[test]
    fn test_unknown_columns_are_schema_errors() {
        let table = sample_flights();
        let reference = airports();

        let err = group_and_count(&table, &GroupCount::new("DEST")).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { column } if column == "DEST"));

        let err = group_and_count(
            &table,
            &GroupCount::new("ORIGIN_AIRPORT").with_count_column("TAIL"),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Schema { column } if column == "TAIL"));

        let err = group_and_count(
            &table,
            &GroupCount::new("ORIGIN_AIRPORT").with_join(&reference, "ORIGIN_AIRPORT", "CODE"),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Schema { column } if column == "CODE"));
    }

    #[test]
    fn test_group_and_sum() {
        let summary = group_and_sum(
            &sample_flights(),
            "ORIGIN_AIRPORT",
            "IS_DELAYED",
            "NUM_DELAYED_FLIGHTS",
        )
        .unwrap();

        assert_eq!(summary.get(&Value::from("JFK")), Some(&Value::Int(2)));
        assert_eq!(summary.get(&Value::from("LAX")), Some(&Value::Int(1)));
        assert_eq!(summary.get(&Value::from("ORD")), Some(&Value::Int(0)));
    }

    #[test]
    fn test_group_and_mean() {
        let table = Table::from_pairs([
            ("ORIGIN_AIRPORT", strs(&["JFK", "JFK", "LAX", "ORD"])),
            ("DEPARTURE_DELAY", vec![Value::Int(10), Value::Int(30), Value::Int(-4), Value::Null]),
        ])
        .unwrap();

        let summary =
            group_and_mean(&table, "ORIGIN_AIRPORT", "DEPARTURE_DELAY", "AVG_DELAY").unwrap();

        assert_eq!(summary.get(&Value::from("JFK")), Some(&Value::Float(20.0)));
        assert_eq!(summary.get(&Value::from("LAX")), Some(&Value::Float(-4.0)));
        assert_eq!(summary.get(&Value::from("ORD")), Some(&Value::Null));
    }
}
