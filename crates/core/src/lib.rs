//! Upload pipeline for imgrelay.
//!
//! This crate holds the relay's behavior with no web-framework dependencies:
//! request validation, payload ingestion, object storage and the result
//! envelope.
//!
//! # Modules
//!
//! - `upload` - Validation, orchestration and outcomes
//! - `fetch` - Remote image download
//! - `storage` - Object storage capability and its backends

pub mod fetch;
pub mod storage;
pub mod upload;
