//! Remote image download.
//!
//! The body is streamed and accumulated in arrival order into one contiguous
//! buffer. Bytes are kept exactly as the transport delivers them; images are
//! binary already, so no decoding happens here.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::{debug, info};

/// Remote download errors.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Only http and https are fetched.
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    /// Connection or transfer failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("upstream returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Body exceeds the configured limit.
    #[error("response body exceeds {limit} bytes")]
    TooLarge {
        /// Configured limit in bytes.
        limit: u64,
    },
}

/// Downloads remote content into memory.
///
/// Without a timeout a stalled upstream keeps the request pending; set one
/// with [`RemoteFetcher::new`] when bounded latency matters.
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: Client,
    max_bytes: u64,
}

impl RemoteFetcher {
    /// Create a fetcher with a body size limit and an optional request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(max_bytes: u64, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            max_bytes,
        })
    }

    /// Maximum body size in bytes.
    #[must_use]
    pub const fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Download `url` and return the full body.
    ///
    /// # Errors
    ///
    /// Returns an error for bad URLs, transport failures, non-2xx statuses and
    /// bodies larger than the limit.
    pub async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedScheme(url.scheme().to_string()));
        }

        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let declared = response.content_length();
        if declared.is_some_and(|len| len > self.max_bytes) {
            return Err(FetchError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let capacity = usize::try_from(declared.unwrap_or(0)).unwrap_or(0);
        let mut body = BytesMut::with_capacity(capacity);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            debug!(chunk = chunk.len(), "Received chunk");
            body.extend_from_slice(&chunk);
        }

        info!(url = %url, size = body.len(), "Download completed");
        Ok(body.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LIMIT: u64 = 1024;

    fn fetcher() -> RemoteFetcher {
        RemoteFetcher::new(LIMIT, None).expect("client")
    }

    #[tokio::test]
    async fn test_fetch_returns_full_body() {
        let mock_server = MockServer::start().await;
        let body: Vec<u8> = (0..=255u8).cycle().take(700).collect();
        Mock::given(method("GET"))
            .and(path("/cat.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let bytes = fetcher()
            .fetch(&format!("{}/cat.jpg", mock_server.uri()))
            .await
            .expect("fetch");

        assert_eq!(bytes.as_ref(), body.as_slice());
    }

    #[tokio::test]
    async fn test_fetch_empty_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let bytes = fetcher().fetch(&mock_server.uri()).await.expect("fetch");
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let err = fetcher().fetch(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404 }));
    }

    #[tokio::test]
    async fn test_fetch_body_over_limit() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4096]))
            .mount(&mock_server)
            .await;

        let err = fetcher().fetch(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::TooLarge { limit: LIMIT }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let err = fetcher().fetch("http://127.0.0.1:1/cat.jpg").await.unwrap_err();
        assert!(matches!(err, FetchError::Request(_)));
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_urls() {
        let fetcher = fetcher();

        assert!(matches!(
            fetcher.fetch("not a url").await,
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            fetcher.fetch("ftp://example.com/cat.jpg").await,
            Err(FetchError::UnsupportedScheme(scheme)) if scheme == "ftp"
        ));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&mock_server)
            .await;

        let fetcher =
            RemoteFetcher::new(LIMIT, Some(Duration::from_millis(100))).expect("client");
        let err = fetcher.fetch(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Request(e) if e.is_timeout()));
    }
}
