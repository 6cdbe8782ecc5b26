//! Error types for the dead-letter mechanism.
//!
//! A `WriteError` is data to be recorded. A `SnapshotError` degrades a record
//! but never drops it. A `PersistError` means a failure may have gone
//! unrecorded and is escalated to the caller.

use snafu::prelude::*;

// Re-export common errors
pub use cairn_core::error::{ConfigError, MetricsError, StorageError};

/// Errors reported by a target store when a batch write fails.
///
/// The display text is the store's message verbatim; it becomes the
/// `errorMessage` of the dead-letter record.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum WriteError {
    /// The store executed the query and rejected it (runtime error,
    /// constraint violation, syntax error).
    #[snafu(display("{message}"))]
    Rejected { message: String },

    /// The store could not be reached or dropped the connection.
    #[snafu(display("{message}"))]
    Unavailable { message: String },

    /// Any other client-side failure.
    #[snafu(display("{source}"))]
    Client {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Errors that can occur while freezing bound parameters.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum SnapshotError {
    /// JSON has no representation for NaN or infinities.
    #[snafu(display("Parameter '{path}' holds non-finite float {value}"))]
    NonFiniteFloat { path: String, value: f64 },
}

/// Errors that can occur while persisting a dead-letter record.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
// Prefix avoids selector clashes with the other enums in this module
#[allow(clippy::enum_variant_names)]
pub enum PersistError {
    /// Failed to create the dead-letter storage provider.
    #[snafu(display("Failed to create dead-letter storage: {source}"))]
    DlqStorage { source: StorageError },

    /// Failed to serialize the record.
    #[snafu(display("Failed to serialize dead-letter record: {source}"))]
    DlqSerialize { source: serde_json::Error },

    /// Failed to write the record object.
    #[snafu(display("Failed to write dead-letter record to {path}: {source}"))]
    DlqWrite { path: String, source: StorageError },
}

/// Errors that can occur while reading dead-letter records back.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ReadError {
    /// Failed to open the dead-letter destination.
    #[snafu(display("Failed to open dead-letter destination: {source}"))]
    Open { source: StorageError },

    /// Failed to list the destination.
    #[snafu(display("Failed to list dead-letter records: {source}"))]
    List { source: StorageError },

    /// Failed to fetch a record object.
    #[snafu(display("Failed to read {path}: {source}"))]
    Fetch { path: String, source: StorageError },

    /// An object does not hold valid records.
    #[snafu(display("Malformed dead-letter record in {path}: {source}"))]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Top-level pipeline errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PipelineError {
    /// Configuration error.
    #[snafu(display("Configuration error: {source}"))]
    Config { source: ConfigError },

    /// Dead-letter persistence error.
    #[snafu(display("Dead-letter error: {source}"))]
    Persist { source: PersistError },

    /// Dead-letter read error.
    #[snafu(display("Dead-letter read error: {source}"))]
    Read { source: ReadError },

    /// Metrics error.
    #[snafu(display("Metrics error: {source}"))]
    Metrics { source: MetricsError },

    /// Worker task join error.
    #[snafu(display("Worker task join error: {source}"))]
    TaskJoin { source: tokio::task::JoinError },
}

impl From<ConfigError> for PipelineError {
    fn from(source: ConfigError) -> Self {
        PipelineError::Config { source }
    }
}

impl From<PersistError> for PipelineError {
    fn from(source: PersistError) -> Self {
        PipelineError::Persist { source }
    }
}

impl From<ReadError> for PipelineError {
    fn from(source: ReadError) -> Self {
        PipelineError::Read { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_display_is_verbatim() {
        let err = WriteError::Rejected {
            message: "/ by zero".to_string(),
        };
        assert_eq!(err.to_string(), "/ by zero");

        let err = WriteError::Client {
            source: "connection reset by peer".into(),
        };
        assert_eq!(err.to_string(), "connection reset by peer");
    }
}
