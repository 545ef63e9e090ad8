//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

use crate::jwt::JwtConfig;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Upload defaults and limits.
    pub upload: UploadConfig,
    /// Object storage backend.
    pub storage: StorageProvider,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body in bytes (base64 payloads are large).
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

/// Upload pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Bucket used when the request names none.
    pub default_bucket: String,
    /// IANA timezone used to render generated filenames.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    /// Public URL template with `{{BUCKET_NAME}}` and `{{FILENAME}}` placeholders.
    pub public_url_template: String,
    /// Upper bound on a remote download body.
    #[serde(default = "default_max_download_bytes")]
    pub max_download_bytes: u64,
    /// Whole-request timeout for remote downloads. Unbounded when unset.
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_max_download_bytes() -> u64 {
    10 * 1024 * 1024
}

/// Storage provider configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// Google Cloud Storage.
    Gcs {
        /// Service account key file. Falls back to `GOOGLE_APPLICATION_CREDENTIALS`.
        #[serde(default)]
        credential_path: Option<PathBuf>,
        /// Endpoint override (emulators).
        #[serde(default)]
        endpoint: Option<String>,
        /// Predefined ACL applied on write, e.g. `publicRead`. Leave unset
        /// for buckets with uniform bucket-level access.
        #[serde(default)]
        predefined_acl: Option<String>,
    },
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Local filesystem, one directory per bucket (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// Process memory (development and tests)
    Memory,
}

impl StorageProvider {
    /// Create Google Cloud Storage provider.
    #[must_use]
    pub fn gcs(credential_path: Option<PathBuf>) -> Self {
        Self::Gcs {
            credential_path,
            endpoint: None,
            predefined_acl: None,
        }
    }

    /// Set the predefined object ACL. No effect on other providers.
    #[must_use]
    pub fn with_predefined_acl(mut self, acl: impl Into<String>) -> Self {
        if let Self::Gcs { predefined_acl, .. } = &mut self {
            *predefined_acl = Some(acl.into());
        }
        self
    }

    /// Predefined ACL objects are written with, if any.
    #[must_use]
    pub fn predefined_acl(&self) -> Option<&str> {
        match self {
            Self::Gcs { predefined_acl, .. } => predefined_acl.as_deref(),
            _ => None,
        }
    }

    /// Create S3-compatible provider (Cloudflare R2, Supabase, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gcs { .. } => "gcs",
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("IMGRELAY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
