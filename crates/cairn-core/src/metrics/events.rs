//! Internal events for cairn metrics emission.
//!
//! Each event struct represents a measurable occurrence. Events implement the
//! `InternalEvent` trait which records the corresponding Prometheus metric.
//!
//! Write failures and dead-letter persistence failures use separate series;
//! `cairn_dead_letter_persist_failures_total` counts only failures that
//! could not be recorded.

use metrics::{counter, histogram};
use std::time::Duration;
use tracing::trace;

/// Trait for internal events that can be emitted as metrics.
pub trait InternalEvent {
    /// Emit this event as a metric.
    fn emit(self);
}

// ============================================================================
// Write path events
// ============================================================================

/// Event emitted when a batch is accepted by the target store.
pub struct BatchWritten {
    pub rows: u64,
    pub target_kind: &'static str,
    pub duration: Duration,
}

impl InternalEvent for BatchWritten {
    fn emit(self) {
        trace!(rows = self.rows, target_kind = self.target_kind, "Batch written");
        counter!("cairn_batches_written_total", "target_kind" => self.target_kind).increment(1);
        counter!("cairn_rows_written_total", "target_kind" => self.target_kind)
            .increment(self.rows);
        histogram!("cairn_batch_write_duration_seconds", "target_kind" => self.target_kind)
            .record(self.duration.as_secs_f64());
    }
}

/// Event emitted when the target store rejects a batch.
pub struct WriteFailed {
    pub source_kind: &'static str,
    pub target_kind: &'static str,
}

impl InternalEvent for WriteFailed {
    fn emit(self) {
        trace!(
            source_kind = self.source_kind,
            target_kind = self.target_kind,
            "Write failed"
        );
        counter!(
            "cairn_write_failures_total",
            "source_kind" => self.source_kind,
            "target_kind" => self.target_kind
        )
        .increment(1);
    }
}

/// Event emitted when bound parameters had to be replaced by placeholders.
pub struct SnapshotDegraded {
    pub placeholders: u64,
}

impl InternalEvent for SnapshotDegraded {
    fn emit(self) {
        trace!(placeholders = self.placeholders, "Snapshot degraded");
        counter!("cairn_snapshot_placeholders_total").increment(self.placeholders);
    }
}

/// Event emitted when a dead-letter record is durably written.
pub struct DeadLetterPersisted {
    pub target_kind: &'static str,
    pub bytes: u64,
}

impl InternalEvent for DeadLetterPersisted {
    fn emit(self) {
        trace!(target_kind = self.target_kind, bytes = self.bytes, "Dead letter persisted");
        counter!("cairn_dead_letters_persisted_total", "target_kind" => self.target_kind)
            .increment(1);
        counter!("cairn_dead_letter_bytes_total").increment(self.bytes);
    }
}

/// Event emitted when a dead-letter record could not be written.
pub struct DeadLetterPersistFailed {
    pub target_kind: &'static str,
}

impl InternalEvent for DeadLetterPersistFailed {
    fn emit(self) {
        trace!(target_kind = self.target_kind, "Dead letter persist failed");
        counter!(
            "cairn_dead_letter_persist_failures_total",
            "target_kind" => self.target_kind
        )
        .increment(1);
    }
}

// ============================================================================
// Storage operation events
// ============================================================================

/// Storage operation types.
#[derive(Debug, Clone, Copy)]
pub enum StorageOperation {
    Get,
    Put,
    List,
}

impl StorageOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageOperation::Get => "get",
            StorageOperation::Put => "put",
            StorageOperation::List => "list",
        }
    }
}

/// Status of a storage request.
#[derive(Debug, Clone, Copy)]
pub enum RequestStatus {
    Success,
    Error,
}

impl RequestStatus {
    pub fn from_result<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            RequestStatus::Success
        } else {
            RequestStatus::Error
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Success => "success",
            RequestStatus::Error => "error",
        }
    }
}

/// Event emitted when a storage request completes.
pub struct StorageRequest {
    pub operation: StorageOperation,
    pub status: RequestStatus,
    pub duration: Duration,
}

impl InternalEvent for StorageRequest {
    fn emit(self) {
        trace!(
            operation = self.operation.as_str(),
            status = self.status.as_str(),
            duration_ms = self.duration.as_millis(),
            "Storage request"
        );
        counter!(
            "cairn_storage_requests_total",
            "operation" => self.operation.as_str(),
            "status" => self.status.as_str()
        )
        .increment(1);
        histogram!(
            "cairn_storage_request_duration_seconds",
            "operation" => self.operation.as_str()
        )
        .record(self.duration.as_secs_f64());
    }
}
