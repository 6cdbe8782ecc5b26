//! Bound parameter values as the target store receives them.
//!
//! The model is wider than JSON: floats may be NaN or infinite, which the
//! store accepts but a dead-letter record cannot hold verbatim.

use std::collections::BTreeMap;

/// Name under which a batch is bound when a query runs.
pub const ROWS_PARAMETER: &str = "rows";

/// One source row, keyed by field name.
pub type Row = BTreeMap<String, ParamValue>;

/// Bound parameters of one query execution.
pub type Parameters = BTreeMap<String, ParamValue>;

/// A parameter value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParamValue {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    /// Integers above `i64::MAX`.
    Unsigned(u64),
    Float(f64),
    String(String),
    List(Vec<ParamValue>),
    Map(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    /// Borrow the inner string, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the items, if this is a list value.
    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Mutably borrow the entries, if this is a map value.
    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<String, ParamValue>> {
        match self {
            ParamValue::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Boolean(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => ParamValue::Integer(i),
            Err(_) => ParamValue::Unsigned(value),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<Vec<ParamValue>> for ParamValue {
    fn from(items: Vec<ParamValue>) -> Self {
        ParamValue::List(items)
    }
}

impl From<BTreeMap<String, ParamValue>> for ParamValue {
    fn from(entries: BTreeMap<String, ParamValue>) -> Self {
        ParamValue::Map(entries)
    }
}

impl From<serde_json::Value> for ParamValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => ParamValue::Null,
            Value::Bool(b) => ParamValue::Boolean(b),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => ParamValue::Integer(i),
                (None, Some(u)) => ParamValue::Unsigned(u),
                (None, None) => ParamValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ParamValue::String(s),
            Value::Array(items) => ParamValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(entries) => ParamValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, ParamValue::from(v)))
                    .collect(),
            ),
        }
    }
}
