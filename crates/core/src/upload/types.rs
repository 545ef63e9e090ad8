//! Upload request and parameter types.

use bytes::Bytes;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::UploadError;

/// Inbound upload request body.
///
/// Exactly one of `buffer` and `url` must be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadRequest {
    /// Base64-encoded image bytes.
    #[serde(default)]
    pub buffer: Option<String>,
    /// Remote URL to download the image from.
    #[serde(default)]
    pub url: Option<String>,
    /// Target bucket.
    #[serde(default)]
    pub bucket: Option<String>,
    /// Target object key.
    #[serde(default)]
    pub filename: Option<String>,
    /// Caller metadata stored alongside the object.
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Where the payload comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    /// Base64 text carried in the request.
    Inline(String),
    /// URL to download.
    Remote(String),
}

/// Validated request, before the payload has been ingested.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPlan {
    /// Target bucket.
    pub bucket: String,
    /// Target object key.
    pub object_key: String,
    /// Caller metadata.
    pub metadata: Map<String, Value>,
    /// Payload source.
    pub source: PayloadSource,
}

/// Everything needed to write the object.
#[derive(Debug, Clone)]
pub struct ResolvedUploadParams {
    /// Target bucket.
    pub bucket: String,
    /// Target object key.
    pub object_key: String,
    /// Caller metadata.
    pub metadata: Map<String, Value>,
    /// Object bytes.
    pub payload: Bytes,
}

/// Process-wide defaults applied to requests.
#[derive(Debug, Clone)]
pub struct UploadDefaults {
    /// Bucket used when the request names none.
    pub bucket: String,
    /// Timezone used to render generated object keys.
    pub timezone: Tz,
}

impl UploadDefaults {
    /// Build defaults from a bucket name and an IANA timezone name.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Configuration` for an unknown timezone.
    pub fn new(bucket: impl Into<String>, timezone: &str) -> Result<Self, UploadError> {
        let timezone = timezone
            .parse::<Tz>()
            .map_err(|e| UploadError::configuration(format!("unknown timezone '{timezone}': {e}")))?;

        Ok(Self {
            bucket: bucket.into(),
            timezone,
        })
    }
}
