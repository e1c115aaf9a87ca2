//! Equality joins between two tables.

use super::{Column, Table, Value};
use crate::error::Result;
use std::collections::HashMap;

const LEFT_SUFFIX: &str = "_x";
const RIGHT_SUFFIX: &str = "_y";

/// Left-outer equality join of `left` and `right` on `left_on == right_on`.
///
/// Every left row is kept, in order. A left row matching several right rows
/// is repeated once per match, so callers that need the left row count
/// preserved must pass a right table with unique keys. Unmatched rows get
/// `Null` in every right column. Missing keys never match.
///
/// Output columns are the left columns followed by the right columns. When
/// both key columns share a name the right key is omitted; any other name
/// present on both sides gets a `_x` (left) or `_y` (right) suffix.
pub fn left_join(left: &Table, right: &Table, left_on: &str, right_on: &str) -> Result<Table> {
    let left_key = left.column(left_on)?;
    let right_key = right.column(right_on)?;

    let mut index: HashMap<&Value, Vec<usize>> = HashMap::new();
    for (row, key) in right_key.values().iter().enumerate() {
        if !key.is_missing() {
            index.entry(key).or_default().push(row);
        }
    }

    let mut left_rows = Vec::with_capacity(left.row_count());
    let mut right_rows: Vec<Option<usize>> = Vec::with_capacity(left.row_count());

    for (row, key) in left_key.values().iter().enumerate() {
        match index.get(key).filter(|_| !key.is_missing()) {
            Some(matches) => {
                for &m in matches {
                    left_rows.push(row);
                    right_rows.push(Some(m));
                }
            }
            None => {
                left_rows.push(row);
                right_rows.push(None);
            }
        }
    }

    let shared_key = left_on == right_on;
    let right_columns: Vec<&Column> = right
        .columns()
        .iter()
        .filter(|c| !(shared_key && c.name() == right_on))
        .collect();

    let clashes = |name: &str| {
        left.has_column(name) && right_columns.iter().any(|c| c.name() == name)
    };

    let mut columns = Vec::with_capacity(left.column_count() + right_columns.len());

    for column in left.columns() {
        let name = if clashes(column.name()) {
            format!("{}{}", column.name(), LEFT_SUFFIX)
        } else {
            column.name().to_string()
        };
        let values = left_rows
            .iter()
            .map(|&r| column.values()[r].clone())
            .collect();
        columns.push(Column::new(name, values));
    }

    for column in &right_columns {
        let name = if clashes(column.name()) {
            format!("{}{}", column.name(), RIGHT_SUFFIX)
        } else {
            column.name().to_string()
        };
        let values = right_rows
            .iter()
            .map(|r| r.map_or(Value::Null, |r| column.values()[r].clone()))
            .collect();
        columns.push(Column::new(name, values));
    }

    Table::new(columns)
}
