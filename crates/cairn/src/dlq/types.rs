//! DLQ types for persistence results and failure statistics.

use crate::kind::TargetKind;

/// Where a record was persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistReceipt {
    /// Fully qualified location of the record object.
    pub location: String,
    /// Size of the persisted object in bytes.
    pub bytes: usize,
}

/// Statistics about persisted records by target kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureStats {
    pub node: usize,
    pub relationship: usize,
    pub query: usize,
    pub unspecified: usize,
}

impl FailureStats {
    /// Increment the count for a specific target kind.
    pub fn increment(&mut self, kind: TargetKind) {
        match kind {
            TargetKind::Node => self.node += 1,
            TargetKind::Relationship => self.relationship += 1,
            TargetKind::Query => self.query += 1,
            TargetKind::Unspecified => self.unspecified += 1,
        }
    }

    /// Get total record count.
    pub fn total(&self) -> usize {
        self.node + self.relationship + self.query + self.unspecified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_stats_increment() {
        let mut stats = FailureStats::default();
        stats.increment(TargetKind::Query);
        stats.increment(TargetKind::Query);
        stats.increment(TargetKind::Node);

        assert_eq!(stats.query, 2);
        assert_eq!(stats.node, 1);
        assert_eq!(stats.relationship, 0);
        assert_eq!(stats.total(), 3);
    }
}
