//! Request validation and defaulting.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::error::UploadError;
use super::types::{PayloadSource, UploadDefaults, UploadPlan, UploadRequest};

/// Extension appended to generated object keys.
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Object key for an upload at `now`, rendered in `timezone`.
///
/// Format: `YYYYMMDD_hhmmss.jpg` with a 12-hour, zero-padded hour.
#[must_use]
pub fn default_object_key(now: DateTime<Utc>, timezone: Tz) -> String {
    format!(
        "{}{DEFAULT_EXTENSION}",
        now.with_timezone(&timezone).format("%Y%m%d_%I%M%S")
    )
}

/// Validate a request and fill in defaults.
///
/// Empty `bucket` and `filename` strings count as absent. An empty `buffer`
/// still counts as present.
///
/// # Errors
///
/// Returns `UploadError::InvalidRequest` when both or neither of `buffer`
/// and `url` are set.
pub fn resolve(
    request: UploadRequest,
    defaults: &UploadDefaults,
    now: DateTime<Utc>,
) -> Result<UploadPlan, UploadError> {
    let source = match (request.buffer, request.url) {
        (Some(buffer), None) => PayloadSource::Inline(buffer),
        (None, Some(url)) => PayloadSource::Remote(url),
        (Some(_), Some(_)) => {
            return Err(UploadError::invalid_request(
                "buffer and url are mutually exclusive",
            ));
        }
        (None, None) => {
            return Err(UploadError::invalid_request(
                "one of buffer or url is required",
            ));
        }
    };

    let bucket = request
        .bucket
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| defaults.bucket.clone());
    let object_key = request
        .filename
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| default_object_key(now, defaults.timezone));

    Ok(UploadPlan {
        bucket,
        object_key,
        metadata: request.metadata.unwrap_or_default(),
        source,
    })
}
