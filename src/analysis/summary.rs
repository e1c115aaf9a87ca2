//! Keyed result tables produced by grouping.

use crate::error::Result;
use crate::table::{left_join, Table, Value};

/// A two-column table keyed by group value.
///
/// The first column holds the distinct group values, the second the
/// aggregated number for each group.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    table: Table,
    key_column: String,
    value_column: String,
}

impl Summary {
    pub(crate) fn from_groups(
        key_column: &str,
        value_column: &str,
        groups: impl IntoIterator<Item = (Value, Value)>,
    ) -> Result<Self> {
        let (keys, values): (Vec<Value>, Vec<Value>) = groups.into_iter().unzip();
        let table = Table::from_pairs([(key_column, keys), (value_column, values)])?;

        Ok(Self {
            table,
            key_column: key_column.to_string(),
            value_column: value_column.to_string(),
        })
    }

    #[allow(dead_code)] // Raw access for callers outside the report
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.table.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn keys(&self) -> &[Value] {
        self.table.columns()[0].values()
    }

    fn values(&self) -> &[Value] {
        self.table.columns()[1].values()
    }

    /// Aggregated value for one group.
    #[allow(dead_code)] // Keyed lookup for callers outside the report
    pub fn get(&self, key: &Value) -> Option<&Value> {
        let row = self.keys().iter().position(|k| k == key)?;
        self.values().get(row)
    }

    /// Sum of all non-missing aggregated values.
    pub fn total(&self) -> f64 {
        self.values().iter().filter_map(Value::as_f64).sum()
    }

    /// The `n` groups with the largest values, largest first.
    pub fn top_n(&self, n: usize) -> Result<Self> {
        Ok(Self {
            table: self.table.nlargest(n, &self.value_column)?,
            key_column: self.key_column.clone(),
            value_column: self.value_column.clone(),
        })
    }

    /// Left-joins the summary with a reference table on the group key.
    pub fn join(&self, reference: &Table, right_on: &str) -> Result<Table> {
        left_join(&self.table, reference, &self.key_column, right_on)
    }
}
