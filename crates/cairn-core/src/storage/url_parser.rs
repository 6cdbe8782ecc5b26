//! URL parsing for storage backends.
//!
//! Extracts backend configuration from GCS, S3, and local filesystem URLs.

use object_store::path::Path;
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::error::{InvalidUrlSnafu, StorageError};

use super::{GcsConfig, LocalConfig, S3Config};

const GCS_URL: &str = r"^[gG][sS]://(?P<bucket>[a-z0-9\-\._]+)(/(?P<key>.+?))?/?$";
const GCS_PATH: &str =
    r"^https://storage\.googleapis\.com/(?P<bucket>[a-z0-9\-_\.]+)(/(?P<key>.+?))?/?$";
const GCS_VIRTUAL: &str =
    r"^https://(?P<bucket>[a-z0-9\-_\.]+)\.storage\.googleapis\.com(/(?P<key>.+?))?/?$";

const S3_URL: &str = r"^[sS]3[aA]?://(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+?))?/?$";
const S3_ENDPOINT_URL: &str = r"^[sS]3[aA]?::(?P<protocol>https?)://(?P<endpoint>[^:/]+):(?P<port>\d+)/(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+?))?/?$";

const FILE_URI: &str = r"^file://(?P<path>.*)$";
const FILE_URL: &str = r"^file:(?P<path>.*)$";
const FILE_PATH: &str = r"^/(?P<path>.*)$";

#[derive(Debug, Clone, Copy)]
enum Backend {
    Gcs,
    S3,
    Local,
}

/// Patterns in match order; the first hit wins.
static MATCHERS: LazyLock<Vec<(Backend, Regex)>> = LazyLock::new(|| {
    [
        (Backend::Gcs, GCS_URL),
        (Backend::Gcs, GCS_PATH),
        (Backend::Gcs, GCS_VIRTUAL),
        (Backend::S3, S3_ENDPOINT_URL),
        (Backend::S3, S3_URL),
        (Backend::Local, FILE_URI),
        (Backend::Local, FILE_URL),
        (Backend::Local, FILE_PATH),
    ]
    .into_iter()
    .map(|(backend, pattern)| (backend, Regex::new(pattern).expect("valid storage URL regex")))
    .collect()
});

/// Backend configuration enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Gcs(GcsConfig),
    S3(S3Config),
    Local(LocalConfig),
}

impl BackendConfig {
    /// Parse a URL into a backend configuration.
    pub fn parse_url(url: &str) -> Result<Self, StorageError> {
        for (backend, regex) in MATCHERS.iter() {
            if let Some(caps) = regex.captures(url) {
                return Ok(match backend {
                    Backend::Gcs => Self::parse_gcs(&caps),
                    Backend::S3 => Self::parse_s3(&caps),
                    Backend::Local => Self::parse_local(&caps),
                });
            }
        }

        InvalidUrlSnafu { url }.fail()
    }

    fn key_from(caps: &Captures) -> Option<Path> {
        caps.name("key").map(|m| Path::from(m.as_str()))
    }

    fn parse_gcs(caps: &Captures) -> Self {
        BackendConfig::Gcs(GcsConfig {
            bucket: caps["bucket"].to_string(),
            key: Self::key_from(caps),
        })
    }

    fn parse_s3(caps: &Captures) -> Self {
        let endpoint = std::env::var("AWS_ENDPOINT").ok().or_else(|| {
            caps.name("endpoint").map(|endpoint| {
                let protocol = caps.name("protocol").map_or("https", |p| p.as_str());
                let port = caps.name("port").map_or("443", |p| p.as_str());
                format!("{protocol}://{}:{port}", endpoint.as_str())
            })
        });

        BackendConfig::S3(S3Config {
            endpoint,
            region: std::env::var("AWS_DEFAULT_REGION").ok(),
            bucket: caps["bucket"].to_string(),
            key: Self::key_from(caps),
        })
    }

    fn parse_local(caps: &Captures) -> Self {
        let path = &caps["path"];
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let trimmed = path.trim_end_matches('/');

        BackendConfig::Local(LocalConfig {
            path: if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() },
        })
    }

    /// Key prefix inside the bucket, if any.
    pub(crate) fn key(&self) -> Option<&Path> {
        match self {
            BackendConfig::Gcs(gcs) => gcs.key.as_ref(),
            BackendConfig::S3(s3) => s3.key.as_ref(),
            BackendConfig::Local(_) => None,
        }
    }
}
