//! In-memory columnar tables.
//!
//! A [`Table`] is an ordered list of equally long named [`Column`]s. Rows are
//! positional. Every operation that changes the row set returns a new table,
//! so callers never see their input mutated.

mod join;
mod value;

pub use join::left_join;
pub use value::Value;

use crate::error::{PipelineError, Result};
use std::cmp::Ordering;
use std::collections::HashSet;

/// A named sequence of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    /// Creates a column from a name and its values.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Number of non-missing values.
    pub fn count_present(&self) -> usize {
        self.values.iter().filter(|v| !v.is_missing()).count()
    }

    /// Sum of the non-missing values.
    ///
    /// Stays an `Int` while every value is an integer and the total fits in
    /// an `i64`; an empty column sums to `Int(0)`. Non-numeric values are a
    /// type error.
    pub fn sum(&self) -> Result<Value> {
        let mut int_sum: i64 = 0;
        let mut float_sum = 0.0;
        let mut all_int = true;

        for (row, value) in self.values.iter().enumerate() {
            match value {
                v if v.is_missing() => {}
                Value::Int(i) => {
                    float_sum += *i as f64;
                    match int_sum.checked_add(*i) {
                        Some(total) => int_sum = total,
                        None => all_int = false,
                    }
                }
                Value::Float(f) => {
                    all_int = false;
                    float_sum += f;
                }
                _ => return Err(self.type_error(row, "numeric")),
            }
        }

        Ok(if all_int {
            Value::Int(int_sum)
        } else {
            Value::Float(float_sum)
        })
    }

    /// Mean of the non-missing values, `None` when there are none.
    pub fn mean(&self) -> Result<Option<f64>> {
        let mut total = 0.0;
        let mut count = 0usize;

        for (row, value) in self.values.iter().enumerate() {
            if value.is_missing() {
                continue;
            }
            let Some(n) = value.as_f64() else {
                return Err(self.type_error(row, "numeric"));
            };
            total += n;
            count += 1;
        }

        Ok((count > 0).then(|| total / count as f64))
    }

    /// A new column holding the values at `indices`, in that order.
    pub(crate) fn take(&self, indices: &[usize]) -> Self {
        let values = indices.iter().map(|&i| self.values[i].clone()).collect();
        Self::new(self.name.clone(), values)
    }

    fn type_error(&self, row: usize, expected: &'static str) -> PipelineError {
        PipelineError::Type {
            column: self.name.clone(),
            row,
            expected,
        }
    }
}

/// An ordered collection of named columns sharing one row count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Builds a table, checking that names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();

        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(PipelineError::DuplicateColumn {
                    column: column.name().to_string(),
                });
            }
            if column.len() != rows {
                return Err(PipelineError::LengthMismatch {
                    column: column.name().to_string(),
                    expected: rows,
                    actual: column.len(),
                });
            }
        }

        Ok(Self { columns, rows })
    }

    /// Builds a table from `(name, values)` pairs.
    pub fn from_pairs<S, I>(pairs: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<Value>)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, values)| Column::new(name, values))
                .collect(),
        )
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Looks up a column by name, failing with a schema error.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| PipelineError::schema(name))
    }

    /// All values of one row, in column order.
    pub fn row(&self, row: usize) -> Option<Vec<&Value>> {
        (row < self.rows).then(|| self.columns.iter().map(|c| &c.values[row]).collect())
    }

    /// Returns a new table holding the given rows, in the given order.
    ///
    /// Indices must be in range.
    pub fn take(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            rows: indices.len(),
        }
    }

    /// Returns a new table with the rows for which `keep` returns true.
    pub fn filter_rows(&self, mut keep: impl FnMut(usize) -> bool) -> Self {
        let indices: Vec<usize> = (0..self.rows).filter(|&i| keep(i)).collect();
        if indices.len() == self.rows {
            return self.clone();
        }
        self.take(&indices)
    }

    /// Replaces the column with the same name, or appends it.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        if column.len() != self.rows && !(self.columns.is_empty() && self.rows == 0) {
            return Err(PipelineError::LengthMismatch {
                column: column.name().to_string(),
                expected: self.rows,
                actual: column.len(),
            });
        }

        if self.columns.is_empty() {
            self.rows = column.len();
        }

        match self.column_index(column.name()) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Removes the named columns that exist. Returns how many were removed.
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> usize {
        let before = self.columns.len();
        self.columns.retain(|c| !names.iter().any(|n| n.as_ref() == c.name()));
        before - self.columns.len()
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Self {
        let indices: Vec<usize> = (0..self.rows.min(n)).collect();
        self.take(&indices)
    }

    /// The `n` rows with the largest values in `column`, largest first.
    ///
    /// Ties keep their original order. Missing values sort last.
    pub fn nlargest(&self, n: usize, column: &str) -> Result<Self> {
        let col = self.column(column)?;
        let mut indices: Vec<usize> = (0..self.rows).collect();
        indices.sort_by(|&a, &b| compare_desc(&col.values[a], &col.values[b]));
        indices.truncate(n);
        Ok(self.take(&indices))
    }
}

/// Descending order with missing values last; mixed numbers compare numerically.
fn compare_desc(a: &Value, b: &Value) -> Ordering {
    match (a.is_missing(), b.is_missing()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            _ => b.cmp(a),
        },
    }
}
