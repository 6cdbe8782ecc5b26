//! Reads persisted dead-letter records back for inspection.

use snafu::prelude::*;
use std::sync::Arc;
use tracing::debug;

use cairn_core::{StorageProvider, StorageProviderRef};

use crate::config::DeadLetterConfig;
use crate::error::{FetchSnafu, ListSnafu, OpenSnafu, ParseSnafu, ReadError};
use crate::record::WriteFailureRecord;

use super::naming::RecordLayout;

/// A record together with the object it was read from.
#[derive(Debug)]
pub struct StoredRecord {
    pub path: String,
    pub record: WriteFailureRecord,
}

/// Lists and parses the records under a dead-letter destination.
pub struct DeadLetterReader {
    storage: StorageProviderRef,
    layout: RecordLayout,
}

impl DeadLetterReader {
    pub async fn from_config(config: &DeadLetterConfig) -> Result<Self, ReadError> {
        let layout = RecordLayout::from_destination(&config.path);
        let storage =
            StorageProvider::for_url_with_options(layout.root(), config.storage_options.clone())
                .await
                .context(OpenSnafu)?;

        Ok(Self::new(Arc::new(storage), layout))
    }

    pub fn new(storage: StorageProviderRef, layout: RecordLayout) -> Self {
        Self { storage, layout }
    }

    /// Read every record object, ordered by object name.
    ///
    /// Objects that do not follow the record naming are ignored.
    pub async fn read_all(&self) -> Result<Vec<StoredRecord>, ReadError> {
        let paths = self.storage.list().await.context(ListSnafu)?;

        let mut records = Vec::new();
        for path in paths {
            // Records are only ever written directly under the root
            if path.parts().count() != 1 {
                continue;
            }
            let Some(name) = path.filename() else {
                continue;
            };
            if !self.layout.matches(name) {
                debug!(path = %path, "Skipping non-record object");
                continue;
            }

            let location = path.to_string();
            let bytes = self
                .storage
                .get(&path)
                .await
                .context(FetchSnafu { path: &location })?;

            let stream =
                serde_json::Deserializer::from_slice(&bytes).into_iter::<WriteFailureRecord>();
            for record in stream {
                records.push(StoredRecord {
                    path: location.clone(),
                    record: record.context(ParseSnafu { path: &location })?,
                });
            }
        }

        Ok(records)
    }
}
