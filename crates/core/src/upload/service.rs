//! Upload orchestration.

use std::time::Duration;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{error, info, warn};

use super::error::UploadError;
use super::outcome::UploadOutcome;
use super::types::{PayloadSource, ResolvedUploadParams, UploadDefaults, UploadPlan, UploadRequest};
use super::validator;
use crate::fetch::RemoteFetcher;
use crate::storage::{StorageClient, WriteOptions};
use imgrelay_shared::UploadConfig;

/// Content type recorded on every uploaded object.
pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Metadata key holding the caller's metadata as one JSON string.
const CUSTOM_METADATA_KEY: &str = "custom";

const BUCKET_PLACEHOLDER: &str = "{{BUCKET_NAME}}";
const FILENAME_PLACEHOLDER: &str = "{{FILENAME}}";

/// Standard alphabet, padding optional, trailing bits ignored.
const INLINE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Substitute bucket and object key into a public URL template.
///
/// Only the first occurrence of each placeholder is replaced.
#[must_use]
pub fn render_public_url(template: &str, bucket: &str, object_key: &str) -> String {
    template
        .replacen(BUCKET_PLACEHOLDER, bucket, 1)
        .replacen(FILENAME_PLACEHOLDER, object_key, 1)
}

/// Upload pipeline: validate, ingest, write, publish.
#[derive(Debug)]
pub struct UploadService {
    storage: StorageClient,
    fetcher: RemoteFetcher,
    defaults: UploadDefaults,
    public_url_template: String,
}

impl UploadService {
    /// Create a new upload service.
    #[must_use]
    pub fn new(
        storage: StorageClient,
        fetcher: RemoteFetcher,
        defaults: UploadDefaults,
        public_url_template: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            fetcher,
            defaults,
            public_url_template: public_url_template.into(),
        }
    }

    /// Create an upload service from configuration.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Configuration` for an unknown timezone or an
    /// HTTP client that cannot be built.
    pub fn from_config(config: &UploadConfig, storage: StorageClient) -> Result<Self, UploadError> {
        let defaults = UploadDefaults::new(&config.default_bucket, &config.default_timezone)?;
        let fetcher = RemoteFetcher::new(
            config.max_download_bytes,
            config.fetch_timeout_secs.map(Duration::from_secs),
        )
        .map_err(|e| UploadError::configuration(e.to_string()))?;

        if !config.public_url_template.contains(FILENAME_PLACEHOLDER) {
            warn!(
                template = %config.public_url_template,
                "Public URL template has no filename placeholder"
            );
        }

        Ok(Self::new(
            storage,
            fetcher,
            defaults,
            config.public_url_template.clone(),
        ))
    }

    /// Whether the storage handle has been built.
    #[must_use]
    pub fn storage_connected(&self) -> bool {
        self.storage.is_initialized()
    }

    /// Handle one upload request at the current instant.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::InvalidRequest` for a rejected request. Every
    /// other failure is reported as a `Failure` outcome.
    pub async fn handle(&self, request: UploadRequest) -> Result<UploadOutcome, UploadError> {
        self.handle_at(request, Utc::now()).await
    }

    /// Handle one upload request as if received at `now`.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::InvalidRequest` for a rejected request.
    pub async fn handle_at(
        &self,
        request: UploadRequest,
        now: DateTime<Utc>,
    ) -> Result<UploadOutcome, UploadError> {
        let plan = validator::resolve(request, &self.defaults, now)?;

        let url = match &plan.source {
            PayloadSource::Remote(url) => url.as_str(),
            PayloadSource::Inline(_) => "",
        };
        info!(
            url,
            bucket = %plan.bucket,
            filename = %plan.object_key,
            "Upload requested"
        );

        match self.process(plan).await {
            Ok(public_url) => {
                info!(url = %public_url, "Completed");
                Ok(UploadOutcome::success(public_url))
            }
            Err(err) if err.is_invalid_request() => Err(err),
            Err(err) => {
                error!(error = %err, "Upload failed");
                Ok(UploadOutcome::from(&err))
            }
        }
    }

    async fn process(&self, plan: UploadPlan) -> Result<String, UploadError> {
        let params = self.ingest(plan).await?;
        self.store(&params).await?;
        Ok(render_public_url(
            &self.public_url_template,
            &params.bucket,
            &params.object_key,
        ))
    }

    /// Turn the payload source into bytes.
    async fn ingest(&self, plan: UploadPlan) -> Result<ResolvedUploadParams, UploadError> {
        let payload = match plan.source {
            PayloadSource::Remote(url) => self.fetcher.fetch(&url).await?,
            PayloadSource::Inline(encoded) => decode_inline(&encoded)?,
        };

        Ok(ResolvedUploadParams {
            bucket: plan.bucket,
            object_key: plan.object_key,
            metadata: plan.metadata,
            payload,
        })
    }

    /// Stream the payload to storage and make the object public.
    async fn store(&self, params: &ResolvedUploadParams) -> Result<(), UploadError> {
        let store = self.storage.get().map_err(UploadError::StorageWrite)?;

        let options = WriteOptions::default()
            .with_content_type(IMAGE_CONTENT_TYPE)
            .with_user_metadata(
                CUSTOM_METADATA_KEY,
                Value::Object(params.metadata.clone()).to_string(),
            );

        let mut writer = store
            .writer(&params.bucket, &params.object_key, options)
            .await
            .map_err(UploadError::StorageWrite)?;
        writer
            .write(params.payload.clone())
            .await
            .map_err(UploadError::StorageWrite)?;
        writer.close().await.map_err(UploadError::StorageWrite)?;
        info!(
            filename = %params.object_key,
            size = params.payload.len(),
            "Success upload"
        );

        store
            .make_public(&params.bucket, &params.object_key)
            .await
            .map_err(UploadError::MakePublic)?;
        info!(filename = %params.object_key, "Make public");

        Ok(())
    }
}

/// Decode an inline buffer.
///
/// ASCII whitespace is skipped and the URL-safe `-` / `_` are read as `+` / `/`.
fn decode_inline(encoded: &str) -> Result<Bytes, UploadError> {
    let normalized: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    INLINE_ENGINE
        .decode(normalized)
        .map(Bytes::from)
        .map_err(|e| UploadError::invalid_request(format!("buffer is not valid base64: {e}")))
}
