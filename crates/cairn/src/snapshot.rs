//! Immutable capture of bound parameters at failure time.
//!
//! A snapshot is rebuilt from scratch into owned JSON containers at every
//! level, so it shares no storage with the parameters it was taken from:
//! whatever the caller does to its map afterwards, the snapshot keeps
//! reporting the values that were bound when the write failed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::SnapshotError;
use crate::value::ParamValue;

/// Key of the object substituted for a value JSON cannot represent.
pub const UNREPRESENTABLE_KEY: &str = "$unrepresentable";

/// Deep, owned copy of a parameter mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSnapshot(BTreeMap<String, Value>);

impl ParameterSnapshot {
    /// Freeze `parameters`, failing on the first value JSON cannot represent.
    pub fn capture<'a, I>(parameters: I) -> Result<Self, SnapshotError>
    where
        I: IntoIterator<Item = (&'a String, &'a ParamValue)>,
    {
        let (snapshot, mut errors) = Self::capture_lossy(parameters);
        match errors.is_empty() {
            true => Ok(snapshot),
            false => Err(errors.swap_remove(0)),
        }
    }

    /// Freeze `parameters`, replacing each unrepresentable value with a
    /// marked placeholder object.
    ///
    /// Returns the snapshot along with one error per placeholder, in
    /// traversal order.
    pub fn capture_lossy<'a, I>(parameters: I) -> (Self, Vec<SnapshotError>)
    where
        I: IntoIterator<Item = (&'a String, &'a ParamValue)>,
    {
        let mut errors = Vec::new();
        let mut path = ValuePath::default();

        let entries = parameters
            .into_iter()
            .map(|(name, value)| {
                path.push(Segment::Key(name));
                let frozen = freeze(value, &mut path, &mut errors);
                path.pop();
                (name.clone(), frozen)
            })
            .collect();

        (Self(entries), errors)
    }

    /// Look up a frozen parameter by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no parameters were bound.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<BTreeMap<String, Value>> for ParameterSnapshot {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self(entries)
    }
}

fn freeze<'a>(
    value: &'a ParamValue,
    path: &mut ValuePath<'a>,
    errors: &mut Vec<SnapshotError>,
) -> Value {
    match value {
        ParamValue::Null => Value::Null,
        ParamValue::Boolean(b) => Value::Bool(*b),
        ParamValue::Integer(i) => Value::Number((*i).into()),
        ParamValue::Unsigned(u) => Value::Number((*u).into()),
        ParamValue::Float(f) => match Number::from_f64(*f) {
            Some(n) => Value::Number(n),
            None => placeholder(
                SnapshotError::NonFiniteFloat {
                    path: path.to_string(),
                    value: *f,
                },
                errors,
            ),
        },
        ParamValue::String(s) => Value::String(s.clone()),
        ParamValue::List(items) => {
            let mut frozen = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                path.push(Segment::Index(index));
                frozen.push(freeze(item, path, errors));
                path.pop();
            }
            Value::Array(frozen)
        }
        ParamValue::Map(entries) => {
            let mut frozen = Map::new();
            for (key, item) in entries {
                path.push(Segment::Key(key));
                frozen.insert(key.clone(), freeze(item, path, errors));
                path.pop();
            }
            Value::Object(frozen)
        }
    }
}

fn placeholder(error: SnapshotError, errors: &mut Vec<SnapshotError>) -> Value {
    let mut marker = Map::new();
    marker.insert(
        UNREPRESENTABLE_KEY.to_string(),
        Value::String(error.to_string()),
    );
    errors.push(error);
    Value::Object(marker)
}

enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

/// Location of the value being frozen, rendered only when an error occurs.
#[derive(Default)]
struct ValuePath<'a>(Vec<Segment<'a>>);

impl<'a> ValuePath<'a> {
    fn push(&mut self, segment: Segment<'a>) {
        self.0.push(segment);
    }

    fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for ValuePath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => f.write_str(key)?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
