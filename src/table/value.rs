//! Cell values.

use chrono::NaiveDateTime;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Format used when a timestamp is rendered as text.
const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single cell of a [`Table`](super::Table).
///
/// `Null` and a `NaN` float are both treated as missing. Values are totally
/// ordered and hashable so they can serve as grouping keys, join keys and
/// members of filter sets. Numbers of different kinds (`Int` vs `Float`) are
/// never equal to each other under that ordering.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Missing value.
    #[default]
    Null,
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Str(String),
    /// Date and time without a time zone.
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Returns true for `Null` and `NaN`.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the value, if it is a non-missing number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        if self.is_missing() {
            return 0;
        }
        match self {
            Value::Null => 0,
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            Value::Str(_) => 3,
            Value::Timestamp(_) => 4,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            _ if self.rank() != other.rank() => self.rank().cmp(&other.rank()),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            // Both non-NaN here; NaN ranks as missing.
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            _ if self.is_missing() => {}
            Value::Int(i) => i.hash(state),
            // -0.0 and 0.0 compare equal, so they must hash alike.
            Value::Float(f) if *f == 0.0 => 0u64.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Timestamp(t) => t.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) if v.is_nan() => Ok(()),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => f.write_str(s),
            Value::Timestamp(t) => write!(f, "{}", t.format(TIMESTAMP_DISPLAY_FORMAT)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
