//! Batch write execution with dead-letter capture.
//!
//! A rejected write is turned into a [`WriteFailureRecord`] and handed to the
//! dead-letter sink; the store's error never reaches the caller. Only a
//! failure to persist that record is returned as an error.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

use cairn_core::emit;
use cairn_core::metrics::events::{
    BatchWritten, DeadLetterPersistFailed, SnapshotDegraded, WriteFailed,
};

use crate::classify::FailureClassifier;
use crate::dlq::{DeadLetterSink, PersistReceipt};
use crate::error::{PersistError, WriteError};
use crate::record::WriteFailureRecord;
use crate::snapshot::ParameterSnapshot;
use crate::value::{ParamValue, Parameters, ROWS_PARAMETER, Row};

/// A graph store that runs parameterized queries.
#[async_trait]
pub trait TargetStore: Send + Sync {
    async fn run(&self, query: &str, parameters: &Parameters) -> Result<(), WriteError>;
}

/// Outcome of one batch write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// The store accepted the batch.
    Written { rows: usize },
    /// The store rejected the batch and the failure was recorded.
    DeadLettered { receipt: PersistReceipt },
}

/// Runs batch writes and routes failures to the dead-letter sink.
pub struct WriteExecutor {
    store: Arc<dyn TargetStore>,
    classifier: FailureClassifier,
    sink: Arc<dyn DeadLetterSink>,
}

impl WriteExecutor {
    pub fn new(
        store: Arc<dyn TargetStore>,
        classifier: FailureClassifier,
        sink: Arc<dyn DeadLetterSink>,
    ) -> Self {
        Self {
            store,
            classifier,
            sink,
        }
    }

    /// Write `batch` by running `query` with the rows bound as `$rows`.
    ///
    /// A `rows` entry already present in `parameters` is replaced by the batch.
    pub async fn execute(
        &self,
        batch: Vec<Row>,
        query: &str,
        mut parameters: Parameters,
        source: &str,
        target: &str,
    ) -> Result<WriteResult, PersistError> {
        let rows = batch.len();
        let bound = ParamValue::List(batch.into_iter().map(ParamValue::Map).collect());
        if parameters.insert(ROWS_PARAMETER.to_string(), bound).is_some() {
            debug!(
                target_adapter = target,
                "Replaced caller-supplied '{}' parameter",
                ROWS_PARAMETER
            );
        }

        let start = Instant::now();
        let error = match self.store.run(query, &parameters).await {
            Ok(()) => {
                let (_, target_kind) = self.classifier.classify(source, target);
                emit!(BatchWritten {
                    rows: rows as u64,
                    target_kind: target_kind.as_str(),
                    duration: start.elapsed(),
                });
                return Ok(WriteResult::Written { rows });
            }
            Err(e) => e,
        };

        let (source_kind, target_kind) = self.classifier.classify(source, target);
        emit!(WriteFailed {
            source_kind: source_kind.as_str(),
            target_kind: target_kind.as_str(),
        });
        warn!(
            source_adapter = source,
            target_adapter = target,
            source_kind = source_kind.as_str(),
            target_kind = target_kind.as_str(),
            rows,
            "Batch write failed, dead-lettering: {}",
            error
        );

        let (snapshot, degraded) = ParameterSnapshot::capture_lossy(&parameters);
        if let Some(first) = degraded.first() {
            warn!(
                placeholders = degraded.len(),
                "Recording placeholders for unrepresentable parameters: {}",
                first
            );
            emit!(SnapshotDegraded {
                placeholders: degraded.len() as u64,
            });
        }

        let record = WriteFailureRecord::new(
            error.to_string(),
            source_kind,
            target_kind,
            query,
            snapshot,
        );
        // Rendered up front: the sink takes ownership and may fail
        let rendered = record.to_string();

        match self.sink.persist(record).await {
            Ok(receipt) => Ok(WriteResult::DeadLettered { receipt }),
            Err(e) => {
                emit!(DeadLetterPersistFailed {
                    target_kind: target_kind.as_str(),
                });
                error!(
                    source_kind = source_kind.as_str(),
                    target_kind = target_kind.as_str(),
                    record = %rendered,
                    "Failed to dead-letter write failure: {}",
                    e
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{SourceKind, TargetKind};
    use crate::snapshot::UNREPRESENTABLE_KEY;
    use cairn_core::{MetricsController, init_metrics_test};
    use serde_json::json;
    use std::sync::Mutex;

    /// Store that fails every query mentioning `fail`.
    struct ScriptedStore;

    #[async_trait]
    impl TargetStore for ScriptedStore {
        async fn run(&self, query: &str, _parameters: &Parameters) -> Result<(), WriteError> {
            match query.contains("fail") {
                true => Err(WriteError::Rejected {
                    message: "/ by zero".to_string(),
                }),
                false => Ok(()),
            }
        }
    }

    #[derive(Default)]
    struct MemorySink {
        records: Mutex<Vec<WriteFailureRecord>>,
    }

    #[async_trait]
    impl DeadLetterSink for MemorySink {
        async fn persist(
            &self,
            record: WriteFailureRecord,
        ) -> Result<PersistReceipt, PersistError> {
            let mut records = self.records.lock().unwrap();
            records.push(record);
            Ok(PersistReceipt {
                location: format!("memory://{}", records.len()),
                bytes: 0,
            })
        }
    }

    struct BrokenSink;

    #[async_trait]
    impl DeadLetterSink for BrokenSink {
        async fn persist(
            &self,
            _record: WriteFailureRecord,
        ) -> Result<PersistReceipt, PersistError> {
            let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
            Err(PersistError::DlqSerialize { source })
        }
    }

    fn executor(sink: Arc<dyn DeadLetterSink>) -> WriteExecutor {
        let classifier = FailureClassifier::new()
            .with_source("zeroes", SourceKind::TextInline)
            .with_target("oopsie", TargetKind::Query);
        WriteExecutor::new(Arc::new(ScriptedStore), classifier, sink)
    }

    fn rows(values: &[ParamValue]) -> Vec<Row> {
        values
            .iter()
            .map(|v| Row::from([("value".to_string(), v.clone())]))
            .collect()
    }

    #[tokio::test]
    async fn test_success_produces_no_record() {
        let sink = Arc::new(MemorySink::default());
        let result = executor(sink.clone())
            .execute(
                rows(&[ParamValue::from("1")]),
                "RETURN 1",
                Parameters::new(),
                "zeroes",
                "oopsie",
            )
            .await
            .unwrap();

        assert_eq!(result, WriteResult::Written { rows: 1 });
        assert!(sink.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_recorded_not_propagated() {
        let sink = Arc::new(MemorySink::default());
        let mut parameters = Parameters::new();
        parameters.insert("label".to_string(), "Person".into());
        parameters.insert("rows".to_string(), "stale".into());

        let result = executor(sink.clone())
            .execute(
                rows(&[ParamValue::from("0"), ParamValue::from("0")]),
                "fail please",
                parameters,
                "zeroes",
                "oopsie",
            )
            .await
            .unwrap();

        assert!(matches!(result, WriteResult::DeadLettered { .. }));
        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.error_message(), "/ by zero");
        assert_eq!(record.source_kind(), SourceKind::TextInline);
        assert_eq!(record.target_kind(), TargetKind::Query);
        assert_eq!(record.query(), "fail please");
        assert_eq!(record.parameters().get("label"), Some(&json!("Person")));
        assert_eq!(
            record.parameters().get("rows"),
            Some(&json!([{"value": "0"}, {"value": "0"}]))
        );
    }

    #[tokio::test]
    async fn test_unrepresentable_parameter_still_recorded() {
        let sink = Arc::new(MemorySink::default());
        executor(sink.clone())
            .execute(
                rows(&[ParamValue::Float(f64::NAN), ParamValue::Float(2.0)]),
                "fail",
                Parameters::new(),
                "mystery",
                "oopsie",
            )
            .await
            .unwrap();

        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_kind(), SourceKind::Unspecified);
        let rows = records[0].parameters().get("rows").unwrap();
        assert!(rows[0]["value"].get(UNREPRESENTABLE_KEY).is_some());
        assert_eq!(rows[1]["value"], json!(2.0));
    }

    #[tokio::test]
    async fn test_persist_failure_escalates() {
        let err = executor(Arc::new(BrokenSink))
            .execute(
                rows(&[ParamValue::from("0")]),
                "fail",
                Parameters::new(),
                "zeroes",
                "oopsie",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PersistError::DlqSerialize { .. }));
    }

    #[tokio::test]
    async fn test_persist_failure_counted_for_any_sink() {
        init_metrics_test();

        executor(Arc::new(BrokenSink))
            .execute(
                rows(&[ParamValue::from("0")]),
                "fail",
                Parameters::new(),
                "zeroes",
                "oopsie",
            )
            .await
            .unwrap_err();

        let rendered = MetricsController::get().unwrap().render();
        assert!(rendered.contains(r#"cairn_dead_letter_persist_failures_total{target_kind="QUERY"}"#));
    }

    #[tokio::test]
    async fn test_persist_failure_does_not_affect_successful_writes() {
        let result = executor(Arc::new(BrokenSink))
            .execute(
                rows(&[ParamValue::from("1")]),
                "RETURN 1",
                Parameters::new(),
                "zeroes",
                "oopsie",
            )
            .await
            .unwrap();

        assert_eq!(result, WriteResult::Written { rows: 1 });
    }
}
