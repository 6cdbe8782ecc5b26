//! cairn-core: Shared plumbing for the cairn dead-letter crates.
//!
//! - `storage/` - Object storage abstraction (GCS, S3, local)
//! - `metrics/` - Prometheus metrics infrastructure and internal events
//! - `config/` - Environment variable interpolation and YAML loading helpers
//! - `tracing` - Subscriber setup for binaries
//! - `error` - Common error types

pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;
pub mod tracing;

// Re-export commonly used items
pub use config::{MetricsConfig, interpolate, load_yaml};
pub use error::{ConfigError, MetricsError, StorageError};
pub use metrics::{
    DEFAULT_METRICS_ADDR, MetricsController, init_global as init_metrics,
    init_test as init_metrics_test,
};
pub use storage::{StorageProvider, StorageProviderRef};
pub use tracing::init_tracing;
