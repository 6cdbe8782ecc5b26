//! Cairn: write-failure capture and dead-letter routing for graph batch writes.
//!
//! This crate handles:
//! - Freezing the parameters bound to a failed write
//! - Classifying failures by source and target kind
//! - Persisting one self-contained JSON record per failure
//! - Running batches concurrently without letting one failure stop the rest
//! - Reading dead-letter records back for inspection

pub mod classify;
pub mod cli;
pub mod config;
pub mod dlq;
pub mod error;
pub mod executor;
pub mod kind;
pub mod pipeline;
pub mod record;
pub mod snapshot;
pub mod source;
pub mod value;

// Re-export commonly used items
pub use classify::FailureClassifier;
pub use cli::{CliArgs, Command};
pub use config::{Config, DeadLetterConfig, RunnerConfig};
pub use dlq::{DeadLetterQueue, DeadLetterReader, DeadLetterSink, PersistReceipt};
pub use error::{PersistError, PipelineError, SnapshotError, WriteError};
pub use executor::{TargetStore, WriteExecutor, WriteResult};
pub use kind::{SourceKind, TargetKind};
pub use pipeline::{BatchRunner, RunStatus, RunSummary, WriteJob, run_pipeline};
pub use record::WriteFailureRecord;
pub use snapshot::ParameterSnapshot;
pub use value::{ParamValue, Parameters, Row};

// Re-export from cairn-core
pub use cairn_core::{
    MetricsConfig, StorageProvider, StorageProviderRef, init_metrics, init_tracing,
};
