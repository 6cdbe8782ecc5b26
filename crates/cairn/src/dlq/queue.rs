//! Dead Letter Queue implementation.
//!
//! Every failure is written as its own create-only object, so concurrent
//! workers never contend on a shared file and a record is either fully
//! visible or absent.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use object_store::PutPayload;
use object_store::path::Path;
use snafu::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

use cairn_core::emit;
use cairn_core::metrics::events::DeadLetterPersisted;
use cairn_core::{StorageProvider, StorageProviderRef};

use crate::config::DeadLetterConfig;
use crate::error::{DlqSerializeSnafu, DlqStorageSnafu, PersistError};
use crate::record::WriteFailureRecord;

use super::naming::{self, RecordLayout};
use super::types::{FailureStats, PersistReceipt};

/// Durable destination for failed writes.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    /// Persist one record. Safe to call concurrently.
    async fn persist(&self, record: WriteFailureRecord) -> Result<PersistReceipt, PersistError>;
}

/// Dead Letter Queue writing one JSON object per failure.
pub struct DeadLetterQueue {
    storage: StorageProviderRef,
    layout: RecordLayout,
    run_id: String,
    sequence: AtomicU64,
    stats: Mutex<FailureStats>,
}

impl DeadLetterQueue {
    /// Create a DLQ from configuration.
    pub async fn from_config(config: &DeadLetterConfig) -> Result<Self, PersistError> {
        let layout = RecordLayout::from_destination(&config.path);
        let storage =
            StorageProvider::for_url_with_options(layout.root(), config.storage_options.clone())
                .await
                .context(DlqStorageSnafu)?;

        Ok(Self::new(Arc::new(storage), layout))
    }

    /// Create a DLQ over an existing storage provider.
    pub fn new(storage: StorageProviderRef, layout: RecordLayout) -> Self {
        let run_id = naming::run_id(Utc::now());
        info!(
            "DLQ enabled: {}/{}-{}-*.{}",
            storage.canonical_url(),
            layout.stem(),
            run_id,
            layout.extension()
        );

        Self {
            storage,
            layout,
            run_id,
            sequence: AtomicU64::new(0),
            stats: Mutex::new(FailureStats::default()),
        }
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Identifier shared by every record of this run.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Snapshot of the records persisted so far.
    pub async fn stats(&self) -> FailureStats {
        self.stats.lock().await.clone()
    }

    /// Log a summary of persisted records and return it.
    pub async fn finalize(&self) -> FailureStats {
        let stats = self.stats().await;
        info!(
            "DLQ finalized: {} records (node={}, relationship={}, query={}, unspecified={})",
            stats.total(),
            stats.node,
            stats.relationship,
            stats.query,
            stats.unspecified
        );
        stats
    }

    fn location(&self, name: &str) -> String {
        format!("{}/{}", self.storage.canonical_url().trim_end_matches('/'), name)
    }
}

#[async_trait]
impl DeadLetterSink for DeadLetterQueue {
    async fn persist(&self, record: WriteFailureRecord) -> Result<PersistReceipt, PersistError> {
        let target_kind = record.target_kind();

        let mut body = serde_json::to_vec(&record).context(DlqSerializeSnafu)?;
        body.push(b'\n');
        let bytes = body.len();

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let name = self.layout.object_name(&self.run_id, sequence, Uuid::now_v7());
        let location = self.location(&name);

        let payload = PutPayload::from(Bytes::from(body));
        if let Err(source) = self.storage.put_new(&Path::from(name.as_str()), payload).await {
            error!(
                path = %location,
                target_kind = target_kind.as_str(),
                "Failed to persist dead-letter record: {}",
                source
            );
            return Err(PersistError::DlqWrite {
                path: location,
                source,
            });
        }

        self.stats.lock().await.increment(target_kind);
        emit!(DeadLetterPersisted {
            target_kind: target_kind.as_str(),
            bytes: bytes as u64,
        });
        debug!(path = %location, bytes, "Persisted dead-letter record");

        Ok(PersistReceipt { location, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{SourceKind, TargetKind};
    use crate::snapshot::ParameterSnapshot;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn record(message: &str, target_kind: TargetKind) -> WriteFailureRecord {
        WriteFailureRecord::new(
            message,
            SourceKind::TextInline,
            target_kind,
            "RETURN 1",
            ParameterSnapshot::default(),
        )
    }

    async fn queue(dir: &TempDir) -> DeadLetterQueue {
        let config = DeadLetterConfig {
            path: format!("{}/deadletter.json", dir.path().display()),
            storage_options: HashMap::new(),
        };
        DeadLetterQueue::from_config(&config).await.unwrap()
    }

    fn record_files(dir: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_persist_writes_one_object_per_record() {
        let temp_dir = TempDir::new().unwrap();
        let dlq = queue(&temp_dir).await;

        let first = dlq.persist(record("a", TargetKind::Query)).await.unwrap();
        let second = dlq.persist(record("b", TargetKind::Node)).await.unwrap();
        assert_ne!(first.location, second.location);

        let files = record_files(&temp_dir);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|name| dlq.layout().matches(name)));
        assert!(files[0].contains(&format!("-{}-0000000001-", dlq.run_id())));

        let content = std::fs::read_to_string(temp_dir.path().join(&files[0])).unwrap();
        assert!(content.ends_with('\n'));
        assert_eq!(content.len(), first.bytes);
        let parsed: WriteFailureRecord = serde_json::from_str(content.trim_end()).unwrap();
        assert_eq!(parsed, record("a", TargetKind::Query));
    }

    #[tokio::test]
    async fn test_stats_count_per_target_kind() {
        let temp_dir = TempDir::new().unwrap();
        let dlq = queue(&temp_dir).await;

        dlq.persist(record("a", TargetKind::Query)).await.unwrap();
        dlq.persist(record("b", TargetKind::Query)).await.unwrap();
        dlq.persist(record("c", TargetKind::Relationship)).await.unwrap();

        let stats = dlq.finalize().await;
        assert_eq!(stats.query, 2);
        assert_eq!(stats.relationship, 1);
        assert_eq!(stats.total(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_persist_never_collides() {
        let temp_dir = TempDir::new().unwrap();
        let dlq = Arc::new(queue(&temp_dir).await);

        let mut handles = Vec::new();
        for i in 0..32 {
            let dlq = Arc::clone(&dlq);
            handles.push(tokio::spawn(async move {
                dlq.persist(record(&format!("failure {i}"), TargetKind::Query))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(record_files(&temp_dir).len(), 32);
        assert_eq!(dlq.stats().await.query, 32);
    }
}
