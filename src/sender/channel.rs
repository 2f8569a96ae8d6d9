use super::codec::{self, CodecError, Compress};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Business status the collector returns for an accepted record.
pub const ACCEPTED_STATUS: i64 = 10000;
/// Path of the ingest endpoint, appended to the configured server URL.
pub const INGEST_PATH: &str = "/logagent";
/// Value of the `lib` header.
pub const LIB_NAME: &str = "Rust";
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Payload encoding failed: {0}")]
    Encoding(#[from] CodecError),
    #[error("Request timeout after {0:?}")]
    RequestTimeout(Duration),
    #[error("Network error: {0}")]
    NetworkError(#[source] reqwest::Error),
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ChannelError {
    /// Whether a fresh attempt could plausibly succeed.
    ///
    /// Encoding failures are fatal to the attempt that hit them; the retry
    /// loop still counts them as a spent attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChannelError::RequestTimeout(_)
            | ChannelError::NetworkError(_)
            | ChannelError::HttpError { .. }
            | ChannelError::InvalidResponse(_) => true,
            ChannelError::InvalidConfiguration(_) | ChannelError::Encoding(_) => false,
        }
    }
}

/// Body of a 200 response: `{"Status": <code>, "Msg": <text>}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostResponse {
    #[serde(rename = "Status", alias = "status")]
    pub status: i64,
    #[serde(rename = "Msg", alias = "msg", default)]
    pub message: String,
}

impl PostResponse {
    pub fn is_accepted(&self) -> bool {
        self.status == ACCEPTED_STATUS
    }
}

/// One upload attempt against the collector.
pub trait UploadChannel: Send + Sync + 'static {
    fn post(
        &self,
        payload: &str,
        compress: Compress,
    ) -> impl Future<Output = Result<PostResponse, ChannelError>> + Send;
}

impl<C: UploadChannel> UploadChannel for Arc<C> {
    fn post(
        &self,
        payload: &str,
        compress: Compress,
    ) -> impl Future<Output = Result<PostResponse, ChannelError>> + Send {
        (**self).post(payload, compress)
    }
}

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            timeout: Duration::from_millis(30_000),
            user_agent: format!("rask-event-shipper/{SDK_VERSION}"),
        }
    }
}

/// Resolves the ingest URL, appending [`INGEST_PATH`] unless already present.
pub fn resolve_ingest_url(endpoint: &str) -> Result<Url, ChannelError> {
    let endpoint_url: Url = endpoint
        .parse()
        .map_err(|e| ChannelError::InvalidConfiguration(format!("Invalid endpoint URL: {e}")))?;

    if endpoint_url.cannot_be_a_base() {
        return Err(ChannelError::InvalidConfiguration(format!(
            "Endpoint URL cannot carry a path: {endpoint}"
        )));
    }

    if endpoint_url.path().ends_with(INGEST_PATH) {
        return Ok(endpoint_url);
    }

    let mut url = endpoint_url;
    let base = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{base}{INGEST_PATH}"));
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct HttpChannel {
    client: Client,
    config: ChannelConfig,
    ingest_url: Url,
}

impl HttpChannel {
    pub fn new(config: ChannelConfig) -> Result<Self, ChannelError> {
        let ingest_url = resolve_ingest_url(&config.endpoint)?;

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ChannelError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            config,
            ingest_url,
        })
    }

    pub fn ingest_url(&self) -> &Url {
        &self.ingest_url
    }

    pub fn build_headers(&self, compress: Compress) -> Result<HeaderMap, ChannelError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.config.user_agent).map_err(|e| {
                ChannelError::InvalidConfiguration(format!("Invalid user agent: {e}"))
            })?,
        );
        headers.insert(
            HeaderName::from_static("version"),
            HeaderValue::from_static(SDK_VERSION),
        );
        headers.insert(HeaderName::from_static("lib"), HeaderValue::from_static(LIB_NAME));
        headers.insert(
            HeaderName::from_static("compress"),
            HeaderValue::from_static(compress.header_value()),
        );

        Ok(headers)
    }

    fn classify(&self, error: reqwest::Error) -> ChannelError {
        if error.is_timeout() {
            ChannelError::RequestTimeout(self.config.timeout)
        } else {
            ChannelError::NetworkError(error)
        }
    }
}

impl UploadChannel for HttpChannel {
    async fn post(&self, payload: &str, compress: Compress) -> Result<PostResponse, ChannelError> {
        let body = codec::encode_body(payload, compress)?;
        let headers = self.build_headers(compress)?;

        debug!(
            url = %self.ingest_url,
            bytes = body.len(),
            compress = compress.header_value(),
            "Posting record"
        );

        let response = self
            .client
            .post(self.ingest_url.clone())
            .headers(headers)
            .timeout(self.config.timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ChannelError::HttpError {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        serde_json::from_slice::<PostResponse>(&bytes)
            .map_err(|e| ChannelError::InvalidResponse(format!("Undecodable body: {e}")))
    }
}
