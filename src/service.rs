use crate::constants::{
    CREDENTIAL_ERROR_MESSAGES, HTTP_CONNECT_TIMEOUT_SECS, HTTP_REQUEST_TIMEOUT_SECS,
};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use serde::Deserialize;
use std::time::Duration;

/// Classified answer from one compression attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShrinkResult {
    /// Compressed bytes downloaded from the service
    Success(Vec<u8>),
    /// Key is invalid or over quota; another key may work
    CredentialError(String),
    /// The service refused this particular file
    RejectedFormat(String),
    /// Network failure on upload or download
    TransportError(String),
}

/// Remote service that shrinks an image.
#[async_trait]
pub trait CompressionService: Send + Sync {
    /// Send one image and fetch the compressed version
    ///
    /// # Arguments
    /// * `source` - Original file content
    /// * `auth_token` - Basic auth token for the active key
    ///
    /// # Returns
    /// * A classified result; transport problems never surface as `Err`
    async fn shrink(&self, source: &[u8], auth_token: &str) -> ShrinkResult;
}

/// Maps a service error message onto a result variant.
pub fn classify_error_message(message: &str) -> ShrinkResult {
    if CREDENTIAL_ERROR_MESSAGES.contains(&message) {
        ShrinkResult::CredentialError(message.to_string())
    } else {
        ShrinkResult::RejectedFormat(message.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ShrinkResponse {
    output: Option<ShrinkOutput>,
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShrinkOutput {
    url: Option<String>,
    size: Option<u64>,
}

/// HTTP client for the TinyPNG shrink API.
#[derive(Debug, Clone)]
pub struct TinifyClient {
    client: reqwest::Client,
    endpoint: String,
}

impl TinifyClient {
    /// Build a client for the shrink API at `endpoint`
    ///
    /// # Arguments
    /// * `endpoint` - Full URL of the shrink call, normally `DEFAULT_SHRINK_ENDPOINT`
    ///
    /// # Returns
    /// * A client with connect and request timeouts set, or `HttpClient` when
    ///   the TLS backend cannot be initialised
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    async fn download(&self, url: &str) -> ShrinkResult {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return ShrinkResult::TransportError(format!("download failed: {}", e)),
        };

        if !response.status().is_success() {
            return ShrinkResult::TransportError(format!(
                "download failed with status {}",
                response.status()
            ));
        }

        match response.bytes().await {
            Ok(bytes) if bytes.is_empty() => {
                ShrinkResult::TransportError("download returned an empty body".to_string())
            }
            Ok(bytes) => ShrinkResult::Success(bytes.to_vec()),
            Err(e) => ShrinkResult::TransportError(format!("download interrupted: {}", e)),
        }
    }
}

#[async_trait]
impl CompressionService for TinifyClient {
    async fn shrink(&self, source: &[u8], auth_token: &str) -> ShrinkResult {
        let response = match self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "*/*")
            .header(CACHE_CONTROL, "no-cache")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(AUTHORIZATION, format!("Basic {}", auth_token))
            .body(source.to_vec())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return ShrinkResult::TransportError(format!("upload failed: {}", e)),
        };

        let status = response.status();
        let body: ShrinkResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                return ShrinkResult::TransportError(format!(
                    "unreadable response (status {}): {}",
                    status, e
                ))
            }
        };

        if let Some(url) = body.output.as_ref().and_then(|o| o.url.as_deref()) {
            crate::verbose!(
                "Service reports output of {:?} bytes at {}",
                body.output.as_ref().and_then(|o| o.size),
                url
            );
            return self.download(url).await;
        }

        match body.message.or(body.error) {
            Some(message) => classify_error_message(&message),
            None => ShrinkResult::TransportError(format!(
                "response without output or message (status {})",
                status
            )),
        }
    }
}
