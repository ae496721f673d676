use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{BookError, Result};
use crate::models::{BookConfig, GenerateResponse, StatusResponse};
use crate::utils::normalize_base_url;

/// Read the whole body, then decode it. A body that arrives but does not
/// parse is a `Json` error, not a network one.
async fn read_json<T: DeserializeOwned>(resp: Response, context: &str) -> Result<T> {
    let bytes = resp.bytes().await.map_err(|e| BookError::Network {
        context: context.to_string(),
        source: e,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Async client for the book generation backend.
///
/// Wraps the three job endpoints (`generate`, `status`, `download`) plus the
/// job listing the backend exposes for operators.
#[derive(Debug, Clone)]
pub struct BookApiClient {
    http: Client,
    base_url: String,
    request_timeout: Duration,
}

impl BookApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: normalize_base_url(base_url),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.base_url.clone()).with_request_timeout(config.request_timeout)
    }

    /// Use a custom `reqwest::Client` (for connection pooling, proxies, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn generate_url(&self) -> String {
        format!("{}/api/book/generate", self.base_url)
    }

    pub fn status_url(&self, job_id: &str) -> String {
        format!("{}/api/book/status/{}", self.base_url, job_id)
    }

    pub fn download_url(&self, job_id: &str) -> String {
        format!("{}/api/book/download/{}", self.base_url, job_id)
    }

    pub fn jobs_url(&self) -> String {
        format!("{}/api/book/jobs", self.base_url)
    }

    /// Create a generation job. Returns the backend's job id and message.
    pub async fn generate(&self, config: &BookConfig) -> Result<GenerateResponse> {
        let resp = self
            .http
            .post(self.generate_url())
            .timeout(self.request_timeout)
            .json(config)
            .send()
            .await
            .map_err(|e| BookError::Network {
                context: format!("Cannot reach book service at {}", self.base_url),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, %body, "book generation request rejected");
            return Err(BookError::Create { status, body });
        }

        let created: GenerateResponse = read_json(resp, "Failed to read generate response").await?;
        tracing::info!(job_id = %created.job_id, title = %config.title, "book generation job created");
        Ok(created)
    }

    /// Fetch the current status of a job.
    pub async fn status(&self, job_id: &str) -> Result<StatusResponse> {
        let resp = self
            .http
            .get(self.status_url(job_id))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| BookError::Network {
                context: "Failed to check status".into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(job_id, status, %body, "status check rejected");
            return Err(BookError::StatusCheck { status, body });
        }

        read_json(resp, "Failed to read status response").await
    }

    /// Download the finished document. Returns raw bytes.
    pub async fn download(&self, job_id: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(self.download_url(job_id))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| BookError::Network {
                context: format!("Failed to download book {}", job_id),
                source: e,
            })?;

        if !resp.status().is_success() {
            return Err(BookError::Download {
                status: resp.status().as_u16(),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| BookError::Network {
            context: "Failed to read book bytes".into(),
            source: e,
        })?;
        Ok(bytes.to_vec())
    }

    /// List every job the backend knows about, keyed by job id.
    pub async fn list_jobs(&self) -> Result<BTreeMap<String, StatusResponse>> {
        let resp = self
            .http
            .get(self.jobs_url())
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| BookError::Network {
                context: format!("Cannot reach book service at {}", self.base_url),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BookError::StatusCheck { status, body });
        }

        read_json(resp, "Failed to read job list").await
    }
}
