//! Staging of inline text source data into rows.
//!
//! Inline text sources carry their cells as text, so every scalar reaches
//! the writer as a string (`0` becomes `"0"`). Dead-letter records therefore
//! show these values quoted.

use serde_json::Value;

use crate::value::{ParamValue, Row};

/// Turn inline data rows into writer rows keyed by the comma-separated
/// `ordered_field_names` header.
///
/// Cells beyond the header are dropped; a row shorter than the header leaves
/// the trailing fields absent.
pub fn stage_inline_rows(data: &[Vec<Value>], ordered_field_names: &str) -> Vec<Row> {
    let fields: Vec<&str> = ordered_field_names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();

    data.iter()
        .map(|cells| {
            fields
                .iter()
                .zip(cells)
                .map(|(name, cell)| (name.to_string(), stage_cell(cell)))
                .collect()
        })
        .collect()
}

fn stage_cell(cell: &Value) -> ParamValue {
    match cell {
        Value::Null => ParamValue::Null,
        Value::Bool(b) => ParamValue::String(b.to_string()),
        Value::Number(n) => ParamValue::String(n.to_string()),
        Value::String(s) => ParamValue::String(s.clone()),
        Value::Array(_) | Value::Object(_) => ParamValue::from(cell.clone()),
    }
}
