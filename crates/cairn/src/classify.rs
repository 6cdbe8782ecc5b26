//! Maps adapter ids to source and target kinds.

use std::collections::HashMap;
use tracing::debug;

use crate::kind::{SourceKind, TargetKind};

/// Resolves the adapters involved in a failed write to kind tags.
///
/// Named adapters registered from configuration take precedence over the
/// well-known adapter type names. Anything unresolved is `Unspecified`.
#[derive(Debug, Clone, Default)]
pub struct FailureClassifier {
    sources: HashMap<String, SourceKind>,
    targets: HashMap<String, TargetKind>,
}

impl FailureClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named source adapter.
    pub fn with_source(mut self, name: impl Into<String>, kind: SourceKind) -> Self {
        self.sources.insert(name.into(), kind);
        self
    }

    /// Register a named target adapter.
    pub fn with_target(mut self, name: impl Into<String>, kind: TargetKind) -> Self {
        self.targets.insert(name.into(), kind);
        self
    }

    pub fn classify(&self, source: &str, target: &str) -> (SourceKind, TargetKind) {
        let source_kind = self
            .sources
            .get(source)
            .copied()
            .or_else(|| SourceKind::from_name(source))
            .unwrap_or_else(|| {
                debug!(source, "Unknown source adapter, classifying as unspecified");
                SourceKind::Unspecified
            });

        let target_kind = self
            .targets
            .get(target)
            .copied()
            .or_else(|| TargetKind::from_name(target))
            .unwrap_or_else(|| {
                debug!(target, "Unknown target adapter, classifying as unspecified");
                TargetKind::Unspecified
            });

        (source_kind, target_kind)
    }
}
