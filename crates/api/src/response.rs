//! Response formatting for the upload endpoint.
//!
//! Every reply uses status 200. Success and failure travel in the JSON
//! envelope; a rejected request is the plain text `Bad request`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use imgrelay_core::upload::{UploadError, UploadOutcome};

/// Body sent for a rejected request.
pub const BAD_REQUEST_BODY: &str = "Bad request";

/// What the upload endpoint sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadReply {
    /// Request rejected before any work started.
    BadRequest,
    /// Upload attempted.
    Outcome(UploadOutcome),
}

impl From<Result<UploadOutcome, UploadError>> for UploadReply {
    fn from(result: Result<UploadOutcome, UploadError>) -> Self {
        match result {
            Ok(outcome) => Self::Outcome(outcome),
            Err(err) if err.is_invalid_request() => Self::BadRequest,
            Err(err) => Self::Outcome(UploadOutcome::from(&err)),
        }
    }
}

impl IntoResponse for UploadReply {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest => (StatusCode::OK, BAD_REQUEST_BODY).into_response(),
            Self::Outcome(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        }
    }
}
