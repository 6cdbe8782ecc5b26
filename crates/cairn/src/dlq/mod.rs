//! Dead Letter Queue for failed batch writes.
//!
//! Failed writes are persisted as one JSON object per failure to a
//! configurable storage location for later inspection and replay.

mod naming;
mod queue;
mod reader;
mod types;

pub use naming::{RecordLayout, run_id};
pub use queue::{DeadLetterQueue, DeadLetterSink};
pub use reader::{DeadLetterReader, StoredRecord};
pub use types::{FailureStats, PersistReceipt};
