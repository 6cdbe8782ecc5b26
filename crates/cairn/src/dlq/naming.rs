//! Dead-letter destination layout and record object names.
//!
//! A destination such as `gs://bucket/run-42/deadletter.json` is split into
//! the storage root `gs://bucket/run-42` and the name template
//! `deadletter-*.json`. Every record gets its own object:
//!
//! ```text
//! {stem}-{run_id}-{seq:010}-{uuid_v7}.{ext}
//! ```

use cairn_core::storage::BackendConfig;
use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

const DEFAULT_STEM: &str = "deadletter";
const DEFAULT_EXTENSION: &str = "json";
const RUN_ID_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Storage root and object naming derived from a destination URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    root: String,
    stem: String,
    extension: String,
}

impl RecordLayout {
    /// Derive the layout from a configured destination.
    ///
    /// The last path segment is treated as a file name only when it has an
    /// extension and the remainder is still a valid storage URL.
    pub fn from_destination(destination: &str) -> Self {
        if let Some((root, file_name)) = destination.rsplit_once('/')
            && let Some((stem, extension)) = file_name.rsplit_once('.')
            && !stem.is_empty()
            && !extension.is_empty()
            && !root.ends_with('/')
            && !root.ends_with(':')
            && BackendConfig::parse_url(root).is_ok()
        {
            return Self {
                root: root.to_string(),
                stem: stem.to_string(),
                extension: extension.to_string(),
            };
        }

        Self {
            root: destination.to_string(),
            stem: DEFAULT_STEM.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Storage URL the records are written under.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Object name for the `sequence`-th record of run `run_id`.
    pub fn object_name(&self, run_id: &str, sequence: u64, id: Uuid) -> String {
        format!(
            "{}-{}-{:010}-{}.{}",
            self.stem, run_id, sequence, id, self.extension
        )
    }

    /// Whether `name` is a record object produced with this layout.
    pub fn matches(&self, name: &str) -> bool {
        let Some(middle) = name
            .strip_prefix(self.stem.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|rest| rest.strip_suffix(self.extension.as_str()))
            .and_then(|rest| rest.strip_suffix('.'))
        else {
            return false;
        };

        let mut parts = middle.splitn(3, '-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(run_id), Some(sequence), Some(id)) => {
                NaiveDateTime::parse_from_str(run_id, RUN_ID_FORMAT).is_ok()
                    && !sequence.is_empty()
                    && sequence.bytes().all(|b| b.is_ascii_digit())
                    && Uuid::parse_str(id).is_ok()
            }
            _ => false,
        }
    }
}

/// Run identifier derived from the run start time.
pub fn run_id(started_at: DateTime<Utc>) -> String {
    started_at.format(RUN_ID_FORMAT).to_string()
}
