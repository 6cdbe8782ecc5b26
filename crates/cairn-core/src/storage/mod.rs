//! Object storage abstraction.
//!
//! Provides one interface over Google Cloud Storage, S3, and the local
//! filesystem. Paths handed to the provider are relative to the key prefix
//! parsed from the configured URL.

mod gcs;
mod local;
mod s3;
mod url_parser;

pub use gcs::GcsConfig;
pub use local::LocalConfig;
pub use s3::S3Config;
pub use url_parser::BackendConfig;

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::path::Path;
use object_store::{ObjectStore, PutMode, PutOptions, PutPayload, RetryConfig};
use snafu::prelude::*;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::emit;
use crate::error::{ObjectStoreSnafu, StorageError};
use crate::metrics::events::{RequestStatus, StorageOperation, StorageRequest};

/// A reference-counted storage provider.
pub type StorageProviderRef = Arc<StorageProvider>;

/// Retry policy shared by the cloud backends.
fn default_retry_config() -> RetryConfig {
    RetryConfig::default()
}

/// Storage provider that abstracts over different storage backends.
#[derive(Clone)]
pub struct StorageProvider {
    pub(crate) config: BackendConfig,
    pub(crate) object_store: Arc<dyn ObjectStore>,
    pub(crate) canonical_url: String,
}

impl std::fmt::Debug for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StorageProvider<{}>", self.canonical_url)
    }
}

impl StorageProvider {
    /// Create a storage provider for the given URL with storage options.
    pub async fn for_url_with_options(
        url: &str,
        options: HashMap<String, String>,
    ) -> Result<Self, StorageError> {
        match BackendConfig::parse_url(url)? {
            BackendConfig::Gcs(config) => Self::construct_gcs(config, options).await,
            BackendConfig::S3(config) => Self::construct_s3(config, options).await,
            BackendConfig::Local(config) => Self::construct_local(config).await,
        }
    }

    /// Canonical URL of the storage root, for logging.
    pub fn canonical_url(&self) -> &str {
        &self.canonical_url
    }

    /// Qualify a path with the configured key prefix.
    pub fn qualify_path<'a>(&self, path: &'a Path) -> Cow<'a, Path> {
        match self.config.key() {
            Some(prefix) => Cow::Owned(prefix.parts().chain(path.parts()).collect()),
            None => Cow::Borrowed(path),
        }
    }

    /// List every object below the storage root, recursively.
    ///
    /// Returned paths are relative to the configured key prefix and sorted.
    pub async fn list(&self) -> Result<Vec<Path>, StorageError> {
        let prefix = self.config.key();
        let prefix_parts = prefix.map(|p| p.parts().count()).unwrap_or_default();
        let start = Instant::now();

        let result: Result<Vec<_>, _> = self.object_store.list(prefix).try_collect().await;
        emit!(StorageRequest {
            operation: StorageOperation::List,
            status: RequestStatus::from_result(&result),
            duration: start.elapsed(),
        });

        let mut paths: Vec<Path> = result
            .context(ObjectStoreSnafu)?
            .into_iter()
            .map(|meta| meta.location.parts().skip(prefix_parts).collect())
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Get the contents of an object.
    pub async fn get(&self, path: &Path) -> Result<Bytes, StorageError> {
        let path = self.qualify_path(path);
        let start = Instant::now();

        let result = match self.object_store.get(&path).await {
            Ok(response) => response.bytes().await,
            Err(e) => Err(e),
        };
        emit!(StorageRequest {
            operation: StorageOperation::Get,
            status: RequestStatus::from_result(&result),
            duration: start.elapsed(),
        });

        result.context(ObjectStoreSnafu)
    }

    /// Put a payload to a path that must not exist yet.
    ///
    /// The object becomes visible in a single step or not at all. Fails with
    /// an `AlreadyExists` storage error if the path is taken.
    pub async fn put_new(&self, path: &Path, payload: PutPayload) -> Result<(), StorageError> {
        let path = self.qualify_path(path);
        let opts = PutOptions {
            mode: PutMode::Create,
            ..Default::default()
        };
        let start = Instant::now();

        let result = self.object_store.put_opts(&path, payload, opts).await;
        emit!(StorageRequest {
            operation: StorageOperation::Put,
            status: RequestStatus::from_result(&result),
            duration: start.elapsed(),
        });

        result.context(ObjectStoreSnafu)?;
        Ok(())
    }
}
