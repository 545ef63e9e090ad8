//! Upload pipeline error types.

use thiserror::Error;

use crate::fetch::FetchError;
use crate::storage::StorageError;

/// Upload pipeline errors.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Both or neither of `buffer`/`url`, or an undecodable buffer.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Remote download failed.
    #[error("remote fetch failed: {0}")]
    RemoteFetch(#[from] FetchError),

    /// Opening, writing or committing the object failed.
    #[error("storage write failed: {0}")]
    StorageWrite(#[source] StorageError),

    /// The object was written but could not be made public.
    #[error("make public failed: {0}")]
    MakePublic(#[source] StorageError),

    /// Pipeline configuration is invalid.
    #[error("upload configuration error: {0}")]
    Configuration(String),
}

impl UploadError {
    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether the request itself was rejected.
    #[must_use]
    pub const fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}
