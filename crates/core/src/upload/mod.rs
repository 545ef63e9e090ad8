//! The upload pipeline.
//!
//! ```text
//! request ─► validator ─► (fetch url | decode base64) ─► write stream
//!                                                         │
//!                          error ◄───────────────────────┤
//!                          finish ─► make public ─► public url
//! ```
//!
//! Every accepted request yields exactly one [`UploadOutcome`]. A request
//! that names both or neither payload source is rejected with
//! [`UploadError::InvalidRequest`] before anything is fetched or written.

mod error;
mod outcome;
mod service;
mod types;
pub mod validator;

pub use error::UploadError;
pub use outcome::{
    DOWNLOAD_FAILED_MESSAGE, FAILURE_CODE, SUCCESS_CODE, UPLOAD_FAILED_MESSAGE, UploadOutcome,
};
pub use service::{IMAGE_CONTENT_TYPE, UploadService, render_public_url};
pub use types::{PayloadSource, ResolvedUploadParams, UploadDefaults, UploadPlan, UploadRequest};
