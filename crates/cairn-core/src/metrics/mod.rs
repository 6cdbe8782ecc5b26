//! Metrics and observability infrastructure.
//!
//! - `events`: Internal event types and the `InternalEvent` trait
//! - `server`: Prometheus recorder, controller singleton, and HTTP endpoint

pub mod events;
pub mod server;

pub use server::{DEFAULT_METRICS_ADDR, MetricsController, init_global, init_test};

/// Emit an internal event as metrics.
///
/// ```ignore
/// use cairn_core::emit;
/// use cairn_core::metrics::events::WriteFailed;
///
/// emit!(WriteFailed { source_kind: "TEXT_INLINE", target_kind: "QUERY" });
/// ```
#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::metrics::events::InternalEvent::emit($event)
    };
}
