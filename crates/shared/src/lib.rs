//! Shared configuration and token handling for imgrelay.
//!
//! This crate provides common types used across all other crates:
//! - Layered application configuration
//! - Storage provider selection
//! - JWT claims and the token service guarding the upload endpoint

pub mod auth;
pub mod config;
pub mod jwt;

#[cfg(test)]
mod config_tests;

pub use auth::Claims;
pub use config::{AppConfig, ServerConfig, StorageProvider, UploadConfig};
pub use jwt::{JwtConfig, JwtError, JwtService};
