//! Column derivations for the `additional_columns` step.

use crate::error::Result;
use crate::table::{Table, Value};
use std::fmt;

type DeriveFn = dyn Fn(&Table) -> Result<Vec<Value>>;

/// How a new column is produced.
pub enum ColumnDeriver {
    /// Broadcast one value to every row.
    Constant(Value),
    /// Compute the column from the table as it stands when the step runs.
    Derive(Box<DeriveFn>),
}

impl ColumnDeriver {
    /// Wraps a derivation function.
    pub fn derive<F>(f: F) -> Self
    where
        F: Fn(&Table) -> Result<Vec<Value>> + 'static,
    {
        ColumnDeriver::Derive(Box::new(f))
    }

    /// `1` where `source >= threshold`, `0` otherwise (including missing).
    pub fn at_least(source: impl Into<String>, threshold: f64) -> Self {
        let source = source.into();
        Self::derive(move |table| {
            let column = table.column(&source)?;
            Ok(column
                .values()
                .iter()
                .map(|v| {
                    let hit = v.as_f64().is_some_and(|n| n >= threshold);
                    Value::Int(i64::from(hit))
                })
                .collect())
        })
    }

    /// Produces the column values for `table`.
    pub(crate) fn evaluate(&self, table: &Table) -> Result<Vec<Value>> {
        match self {
            ColumnDeriver::Constant(value) => Ok(vec![value.clone(); table.row_count()]),
            ColumnDeriver::Derive(f) => f(table),
        }
    }
}

impl fmt::Debug for ColumnDeriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnDeriver::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            ColumnDeriver::Derive(_) => f.write_str("Derive(<fn>)"),
        }
    }
}

impl From<Value> for ColumnDeriver {
    fn from(value: Value) -> Self {
        ColumnDeriver::Constant(value)
    }
}
