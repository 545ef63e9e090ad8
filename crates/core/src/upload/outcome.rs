//! Upload results and their wire envelope.

use serde::{Serialize, Serializer};

use super::error::UploadError;

/// Envelope code for a successful upload.
pub const SUCCESS_CODE: &str = "000";
/// Envelope code for any failed upload.
pub const FAILURE_CODE: &str = "409";
/// Message for storage-side failures.
pub const UPLOAD_FAILED_MESSAGE: &str = "Fail to upload";
/// Message for remote download failures.
pub const DOWNLOAD_FAILED_MESSAGE: &str = "Fail to download";

/// Result of one upload.
///
/// Serializes to `{"code":"000","filename":<public url>}` or
/// `{"code":<code>,"message":<message>}`. The `filename` field carries the
/// full public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Object written and public.
    Success {
        /// Public URL of the object.
        public_url: String,
    },
    /// Upload failed.
    Failure {
        /// Envelope code.
        code: String,
        /// Caller-facing message.
        message: String,
    },
}

impl UploadOutcome {
    /// Successful outcome.
    #[must_use]
    pub fn success(public_url: impl Into<String>) -> Self {
        Self::Success {
            public_url: public_url.into(),
        }
    }

    /// Failed outcome with the standard failure code.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            code: FAILURE_CODE.to_string(),
            message: message.into(),
        }
    }

    /// Whether the upload succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<&UploadError> for UploadOutcome {
    fn from(err: &UploadError) -> Self {
        match err {
            UploadError::RemoteFetch(_) => Self::failure(DOWNLOAD_FAILED_MESSAGE),
            UploadError::InvalidRequest(_)
            | UploadError::StorageWrite(_)
            | UploadError::MakePublic(_)
            | UploadError::Configuration(_) => Self::failure(UPLOAD_FAILED_MESSAGE),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Envelope<'a> {
    Success {
        code: &'static str,
        filename: &'a str,
    },
    Failure {
        code: &'a str,
        message: &'a str,
    },
}

impl Serialize for UploadOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let envelope = match self {
            Self::Success { public_url } => Envelope::Success {
                code: SUCCESS_CODE,
                filename: public_url,
            },
            Self::Failure { code, message } => Envelope::Failure { code, message },
        };
        envelope.serialize(serializer)
    }
}
