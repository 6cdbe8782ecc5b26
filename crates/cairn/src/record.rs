//! The self-contained record of one failed batch write.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::kind::{SourceKind, TargetKind};
use crate::snapshot::ParameterSnapshot;

/// One failed write: what ran, with which parameters, and why it failed.
///
/// Records are immutable and not `Clone`; the executor builds one and moves
/// it into the dead-letter sink.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WriteFailureRecord {
    error_message: String,
    #[serde(rename = "sourceType")]
    source_kind: SourceKind,
    #[serde(rename = "targetType")]
    target_kind: TargetKind,
    query: String,
    parameters: ParameterSnapshot,
}

impl WriteFailureRecord {
    pub fn new(
        error_message: impl Into<String>,
        source_kind: SourceKind,
        target_kind: TargetKind,
        query: impl Into<String>,
        parameters: ParameterSnapshot,
    ) -> Self {
        Self {
            error_message: error_message.into(),
            source_kind,
            target_kind,
            query: query.into(),
            parameters,
        }
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    pub fn target_kind(&self) -> TargetKind {
        self.target_kind
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn parameters(&self) -> &ParameterSnapshot {
        &self.parameters
    }

    /// Compact JSON form, identical to what the sink persists.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for WriteFailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => f.write_str(&json),
            // Snapshots only hold serde_json values, so this is unreachable in practice
            Err(_) => write!(
                f,
                "WriteFailureRecord {{ errorMessage: {:?}, sourceType: {}, targetType: {}, query: {:?} }}",
                self.error_message, self.source_kind, self.target_kind, self.query
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    const DIVISION_BY_ZERO: &str = r#"{"errorMessage":"/ by zero","sourceType":"TEXT_INLINE","targetType":"QUERY","query":"UNWIND $rows AS row CREATE (:DivisionByZero {result: 1/toInteger(row.value)})","parameters":{"rows":[{"value":"0"},{"value":"0"},{"value":"0"},{"value":"0"}]}}"#;

    fn division_by_zero() -> WriteFailureRecord {
        let rows = json!([{"value": "0"}, {"value": "0"}, {"value": "0"}, {"value": "0"}]);
        WriteFailureRecord::new(
            "/ by zero",
            SourceKind::TextInline,
            TargetKind::Query,
            "UNWIND $rows AS row CREATE (:DivisionByZero {result: 1/toInteger(row.value)})",
            ParameterSnapshot::from(BTreeMap::from([("rows".to_string(), rows)])),
        )
    }

    #[test]
    fn test_serializes_to_exact_literal() {
        let record = division_by_zero();
        assert_eq!(record.to_json().unwrap(), DIVISION_BY_ZERO);
        assert_eq!(record.to_string(), DIVISION_BY_ZERO);
    }

    #[test]
    fn test_round_trip() {
        let record = division_by_zero();
        let parsed: WriteFailureRecord = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(parsed.error_message(), "/ by zero");
        assert_eq!(parsed.source_kind(), SourceKind::TextInline);
        assert_eq!(parsed.target_kind(), TargetKind::Query);
        assert_eq!(parsed.parameters().len(), 1);
    }

    #[test]
    fn test_equality_covers_every_field() {
        let base = division_by_zero();
        let other = WriteFailureRecord::new(
            base.error_message(),
            base.source_kind(),
            TargetKind::Node,
            base.query(),
            base.parameters().clone(),
        );
        assert_ne!(base, other);

        let other = WriteFailureRecord::new(
            base.error_message(),
            base.source_kind(),
            base.target_kind(),
            base.query(),
            ParameterSnapshot::default(),
        );
        assert_ne!(base, other);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let mut value: serde_json::Value = serde_json::from_str(DIVISION_BY_ZERO).unwrap();
        value["retries"] = json!(3);
        assert!(serde_json::from_value::<WriteFailureRecord>(value).is_err());
    }
}
