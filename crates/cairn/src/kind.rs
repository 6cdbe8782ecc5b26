//! Source and target kind tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a failed row originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    TextInline,
    TextGcs,
    #[serde(rename = "BIGQUERY")]
    BigQuery,
    Unspecified,
}

impl SourceKind {
    /// Canonical tag, as written to dead-letter records.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::TextInline => "TEXT_INLINE",
            SourceKind::TextGcs => "TEXT_GCS",
            SourceKind::BigQuery => "BIGQUERY",
            SourceKind::Unspecified => "UNSPECIFIED",
        }
    }

    /// Resolve a well-known adapter type name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "text_inline" | "inline" => Some(SourceKind::TextInline),
            "text_gcs" | "gcs" => Some(SourceKind::TextGcs),
            "bigquery" | "bq" => Some(SourceKind::BigQuery),
            "unspecified" => Some(SourceKind::Unspecified),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kind of write was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetKind {
    Node,
    Relationship,
    Query,
    Unspecified,
}

impl TargetKind {
    /// Canonical tag, as written to dead-letter records.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Node => "NODE",
            TargetKind::Relationship => "RELATIONSHIP",
            TargetKind::Query => "QUERY",
            TargetKind::Unspecified => "UNSPECIFIED",
        }
    }

    /// Resolve a well-known adapter type name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "node" | "nodes" => Some(TargetKind::Node),
            "relationship" | "relationships" | "edge" => Some(TargetKind::Relationship),
            "query" | "custom_query" => Some(TargetKind::Query),
            "unspecified" => Some(TargetKind::Unspecified),
            _ => None,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
