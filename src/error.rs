//! Error types for the table pipeline.
//!
//! Every preprocessing and aggregation operation returns
//! [`PipelineError`] on failure. Errors are never recovered inside the
//! pipeline; they surface to the immediate caller.

use thiserror::Error;

/// Errors raised by table construction, preprocessing and aggregation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A referenced column does not exist.
    #[error("column '{column}' not found")]
    Schema { column: String },

    /// A composed datetime string could not be parsed. `source` is `None`
    /// when one of the date or time parts was missing.
    #[error("row {row}: cannot parse '{input}' with format '{format}'")]
    Format {
        row: usize,
        input: String,
        format: String,
        #[source]
        source: Option<chrono::ParseError>,
    },

    /// A value has the wrong kind for the requested operation.
    #[error("column '{column}' row {row}: expected {expected} value")]
    Type {
        column: String,
        row: usize,
        expected: &'static str,
    },

    /// A column does not have the same length as the table.
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Two columns share the same name.
    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },
}

impl PipelineError {
    /// Shorthand for a missing column error.
    pub fn schema(column: impl Into<String>) -> Self {
        PipelineError::Schema {
            column: column.into(),
        }
    }
}

/// Result alias used across the pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_message() {
        let err = PipelineError::schema("ORIGIN_AIRPORT");
        assert_eq!(err.to_string(), "column 'ORIGIN_AIRPORT' not found");
    }

    #[test]
    fn test_format_error_has_source() {
        let source = chrono::NaiveDateTime::parse_from_str("bad", "%d-%m-%Y %H%M").unwrap_err();
        let err = PipelineError::Format {
            row: 3,
            input: "bad".to_string(),
            format: "%d-%m-%Y %H%M".to_string(),
            source: Some(source),
        };

        assert_eq!(err.to_string(), "row 3: cannot parse 'bad' with format '%d-%m-%Y %H%M'");
        assert!(std::error::Error::source(&err).is_some());
    }
}
