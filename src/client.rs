//! Remote processing client for the background-removal service

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::input::CandidateImage;
use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Url;
use serde::Deserialize;

/// Service endpoint for multipart file uploads
const UPLOAD_ENDPOINT: &str = "/remove-background/upload";
/// Service endpoint for URL submissions
const URL_ENDPOINT: &str = "/remove-background/url";
/// Service endpoint for base64 submissions
const BASE64_ENDPOINT: &str = "/remove-background/base64";

/// Successful outcome of a remote submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedResult {
    /// Absolute address of the processed image, already resolved against the
    /// service base
    pub processed_url: Url,
    /// File name the service suggests for the artifact
    pub suggested_file_name: Option<String>,
}

/// Wire shape of the service's success response
#[derive(Debug, Deserialize)]
struct RemovalResponse {
    /// Tolerated but not trusted; a 2xx with a parseable body is success
    #[serde(default)]
    #[allow(dead_code)]
    success: bool,
    filename: Option<String>,
    image_url: String,
}

/// Wire shape of the service's health-check response
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Seam between the session orchestration and the transport
///
/// The session layer only needs "one candidate in, exactly one result or
/// error out"; tests drive it with stub implementations.
#[async_trait]
pub trait ProcessingService {
    /// Submit a candidate image for background removal
    async fn submit(&self, candidate: &CandidateImage) -> Result<ProcessedResult>;
}

/// HTTP implementation of [`ProcessingService`]
#[derive(Debug, Clone)]
pub struct HttpProcessingClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpProcessingClient {
    /// Create a client against the configured service
    ///
    /// # Errors
    /// - Configuration fails validation
    /// - HTTP client construction fails
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::network_error("Failed to create HTTP client", &e))?;
        Ok(Self { http, config })
    }

    /// The configuration this client was built with
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Check that the service is reachable and reports itself online
    ///
    /// # Errors
    /// - `Processing` on transport failure, non-success status, or a
    ///   malformed health payload
    pub async fn health_check(&self) -> Result<ServiceStatus> {
        let url = self.config.resolve("/")?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::network_error("Health check failed", &e))?;
        if !response.status().is_success() {
            return Err(ClientError::processing(format!(
                "Health check returned HTTP {}",
                response.status()
            )));
        }
        response
            .json::<ServiceStatus>()
            .await
            .map_err(|e| ClientError::network_error("Malformed health response", &e))
    }

    /// Submit an already base64-encoded image
    ///
    /// A `data:*;base64,` prefix is stripped before transmission, matching
    /// the service's own handling of data URLs.
    ///
    /// # Errors
    /// - `Processing` on transport failure, non-success status, or a
    ///   malformed response
    pub async fn submit_base64(&self, image_data: &str) -> Result<ProcessedResult> {
        let payload = strip_base64_prefix(image_data).to_string();
        let form = multipart::Form::new().text("image_data", payload);
        self.post_removal(BASE64_ENDPOINT, form).await
    }

    async fn post_removal(
        &self,
        endpoint: &str,
        form: multipart::Form,
    ) -> Result<ProcessedResult> {
        let url = self.config.resolve(endpoint)?;
        tracing::debug!(endpoint, "submitting to removal service");

        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::network_error("Submission failed", &e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ClientError::processing(format!(
                "Service returned HTTP {status}: {}",
                detail.trim()
            )));
        }

        let body: RemovalResponse = response
            .json()
            .await
            .map_err(|e| ClientError::network_error("Malformed service response", &e))?;
        let processed_url = self.config.resolve(&body.image_url)?;
        tracing::info!(processed = %processed_url, "removal submission succeeded");

        Ok(ProcessedResult {
            processed_url,
            suggested_file_name: body.filename,
        })
    }
}

#[async_trait]
impl ProcessingService for HttpProcessingClient {
    async fn submit(&self, candidate: &CandidateImage) -> Result<ProcessedResult> {
        match candidate {
            CandidateImage::File {
                bytes,
                mime,
                file_name,
            } => {
                let part = multipart::Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime)
                    .map_err(|e| {
                        ClientError::processing(format!("Invalid MIME type '{mime}': {e}"))
                    })?;
                let form = multipart::Form::new().part("file", part);
                self.post_removal(UPLOAD_ENDPOINT, form).await
            },
            CandidateImage::Url(url) => {
                let form = multipart::Form::new().text("image_url", url.to_string());
                self.post_removal(URL_ENDPOINT, form).await
            },
        }
    }
}

/// Strip an optional data-URL prefix from a base64 payload
fn strip_base64_prefix(data: &str) -> &str {
    data.split_once("base64,").map_or(data, |(_, rest)| rest)
}
