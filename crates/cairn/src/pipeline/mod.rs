//! Concurrent batch runner.
//!
//! Jobs are dealt round-robin to a fixed set of workers over bounded
//! channels. Each worker executes its jobs one at a time, in the order they
//! were dealt, so submission order holds per worker but not across them.
//!
//! [`run_pipeline`] wires the runner up from a [`Config`].

mod tracker;

pub use tracker::{FailureTracker, RunStatus, RunSummary};

use snafu::prelude::*;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{Config, RunnerConfig};
use crate::dlq::DeadLetterQueue;
use crate::error::{MetricsSnafu, PipelineError};
use crate::executor::{TargetStore, WriteExecutor};
use crate::value::{Parameters, Row};

/// One batch write to perform.
#[derive(Debug, Clone)]
pub struct WriteJob {
    pub batch: Vec<Row>,
    pub query: String,
    pub parameters: Parameters,
    /// Source adapter id, for classification.
    pub source: String,
    /// Target adapter id, for classification.
    pub target: String,
}

/// Run `jobs` against `store` with dead-lettering set up from `config`.
///
/// The Prometheus endpoint is served only when `metrics.enabled` is set. The
/// dead-letter queue is finalized once every job has run.
pub async fn run_pipeline<I>(
    config: &Config,
    store: Arc<dyn TargetStore>,
    jobs: I,
    shutdown: CancellationToken,
) -> Result<RunSummary, PipelineError>
where
    I: IntoIterator<Item = WriteJob>,
{
    // 1. Metrics endpoint, if requested
    if config.metrics.enabled {
        cairn_core::init_metrics(&config.metrics.address).context(MetricsSnafu)?;
    }

    // 2. Dead-letter destination
    let dlq = Arc::new(DeadLetterQueue::from_config(&config.dead_letter).await?);

    // 3. Executor and worker pool
    let executor = WriteExecutor::new(store, config.classifier(), dlq.clone());
    let runner = BatchRunner::new(Arc::new(executor), &config.runner, shutdown);

    let summary = runner.run(jobs).await?;
    dlq.finalize().await;
    Ok(summary)
}

/// Fans write jobs out to a pool of workers sharing one executor.
pub struct BatchRunner {
    executor: Arc<WriteExecutor>,
    workers: usize,
    channel_capacity: usize,
    shutdown: CancellationToken,
}

impl BatchRunner {
    pub fn new(
        executor: Arc<WriteExecutor>,
        config: &RunnerConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            executor,
            workers: config.workers.max(1),
            channel_capacity: config.channel_capacity.max(1),
            shutdown,
        }
    }

    /// Run every job and report what happened.
    ///
    /// Write failures and dead-letter failures are counted, never returned;
    /// the error case is reserved for a worker task that panicked.
    pub async fn run<I>(&self, jobs: I) -> Result<RunSummary, PipelineError>
    where
        I: IntoIterator<Item = WriteJob>,
    {
        let mut senders = Vec::with_capacity(self.workers);
        let mut tasks = JoinSet::new();

        for worker in 0..self.workers {
            let (tx, rx) = mpsc::channel(self.channel_capacity);
            senders.push(tx);
            tasks.spawn(Self::work(
                worker,
                Arc::clone(&self.executor),
                rx,
                self.shutdown.clone(),
            ));
        }

        let mut summary = RunSummary::default();
        for (i, job) in jobs.into_iter().enumerate() {
            if self.shutdown.is_cancelled() {
                summary.skipped += 1;
                continue;
            }
            if senders[i % self.workers].send(job).await.is_err() {
                summary.skipped += 1;
            }
        }

        // Close the channels so workers finish once drained
        drop(senders);

        while let Some(result) = tasks.join_next().await {
            summary.merge(result.map_err(|e| PipelineError::TaskJoin { source: e })?);
        }

        info!(
            batches = summary.batches,
            rows_written = summary.rows_written,
            dead_lettered = summary.dead_lettered,
            persist_failures = summary.persist_failures,
            skipped = summary.skipped,
            "Run {}",
            summary.status()
        );
        Ok(summary)
    }

    async fn work(
        worker: usize,
        executor: Arc<WriteExecutor>,
        mut rx: mpsc::Receiver<WriteJob>,
        shutdown: CancellationToken,
    ) -> RunSummary {
        let mut tracker = FailureTracker::new();

        while let Some(job) = rx.recv().await {
            if shutdown.is_cancelled() {
                tracker.skip();
                continue;
            }

            let outcome = executor
                .execute(
                    job.batch,
                    &job.query,
                    job.parameters,
                    &job.source,
                    &job.target,
                )
                .await;
            tracker.record(&outcome);
        }

        debug!(worker, "Worker drained");
        tracker.into_summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::FailureClassifier;
    use crate::dlq::{DeadLetterSink, PersistReceipt};
    use crate::error::{PersistError, WriteError};
    use crate::executor::TargetStore;
    use crate::record::WriteFailureRecord;
    use crate::value::ParamValue;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records the `seq` parameter of every query it runs, failing odd ones.
    #[derive(Default)]
    struct RecordingStore {
        seen: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl TargetStore for RecordingStore {
        async fn run(&self, _query: &str, parameters: &Parameters) -> Result<(), WriteError> {
            let Some(ParamValue::Integer(seq)) = parameters.get("seq") else {
                return Ok(());
            };
            self.seen.lock().unwrap().push(*seq);
            match seq % 2 {
                1 => Err(WriteError::Unavailable {
                    message: format!("batch {seq} refused"),
                }),
                _ => Ok(()),
            }
        }
    }

    #[derive(Default)]
    struct CountingSink {
        count: Mutex<usize>,
    }

    #[async_trait]
    impl DeadLetterSink for CountingSink {
        async fn persist(
            &self,
            _record: WriteFailureRecord,
        ) -> Result<PersistReceipt, PersistError> {
            *self.count.lock().unwrap() += 1;
            Ok(PersistReceipt {
                location: "memory://".to_string(),
                bytes: 0,
            })
        }
    }

    fn job(seq: i64) -> WriteJob {
        WriteJob {
            batch: vec![Row::from([("value".to_string(), ParamValue::Integer(seq))])],
            query: "UNWIND $rows AS row CREATE (:N {v: row.value})".to_string(),
            parameters: Parameters::from([("seq".to_string(), ParamValue::Integer(seq))]),
            source: "inline".to_string(),
            target: "node".to_string(),
        }
    }

    fn runner(
        store: Arc<RecordingStore>,
        sink: Arc<CountingSink>,
        workers: usize,
        shutdown: CancellationToken,
    ) -> BatchRunner {
        let executor = WriteExecutor::new(store, FailureClassifier::new(), sink);
        let config = RunnerConfig {
            workers,
            channel_capacity: 2,
        };
        BatchRunner::new(Arc::new(executor), &config, shutdown)
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_other_batches() {
        let store = Arc::new(RecordingStore::default());
        let sink = Arc::new(CountingSink::default());
        let runner = runner(store.clone(), sink.clone(), 4, CancellationToken::new());

        let summary = runner.run((0..20).map(job)).await.unwrap();

        assert_eq!(summary.batches, 20);
        assert_eq!(summary.rows_written, 10);
        assert_eq!(summary.dead_lettered, 10);
        assert_eq!(summary.persist_failures, 0);
        assert_eq!(*sink.count.lock().unwrap(), 10);
        assert_eq!(store.seen.lock().unwrap().len(), 20);
        assert_eq!(
            summary.status(),
            RunStatus::CompletedWithFailures { dead_lettered: 10 }
        );
    }

    #[tokio::test]
    async fn test_single_worker_preserves_order() {
        let store = Arc::new(RecordingStore::default());
        let sink = Arc::new(CountingSink::default());
        let runner = runner(store.clone(), sink, 1, CancellationToken::new());

        runner.run((0..12).map(job)).await.unwrap();

        assert_eq!(*store.seen.lock().unwrap(), (0..12).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_cancelled_run_skips_everything() {
        let store = Arc::new(RecordingStore::default());
        let sink = Arc::new(CountingSink::default());
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let runner = runner(store.clone(), sink, 3, shutdown);

        let summary = runner.run((0..5).map(job)).await.unwrap();

        assert_eq!(summary.batches, 0);
        assert_eq!(summary.skipped, 5);
        assert!(store.seen.lock().unwrap().is_empty());
        assert_eq!(summary.status(), RunStatus::Succeeded);
    }
}
