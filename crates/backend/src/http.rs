//! HTTP reference adapter.
//!
//! Talks to a compute service exposing a plain REST surface:
//! `POST /jobs` to submit, `GET /jobs/{handle}` to poll,
//! `POST /jobs/{handle}/cancel`, and `DELETE /jobs/{handle}`.
//! Wire errors map onto the [`BackendError`] taxonomy: network failures
//! are transient, 404 on delete means the job was already gone.

use arcus_core::estimate::UsageMetrics;
use arcus_core::process::ProcessGraph;
use arcus_core::types::BackendHandle;
use async_trait::async_trait;
use serde::Deserialize;

use crate::adapter::{BackendAdapter, BackendError, BackendPoll, DeleteOutcome};

/// Adapter for an HTTP compute backend.
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
}

/// Response returned by the backend's submit endpoint.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    /// Server-assigned identifier for the queued job.
    id: String,
}

/// Response returned by the backend's status endpoint.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    state: String,
    progress: Option<i16>,
    usage: Option<UsageMetrics>,
}

impl HttpBackend {
    /// Create an adapter for a backend at the given base URL
    /// (e.g. `http://compute:8080`).
    pub fn new(api_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
        }
    }

    /// Create an adapter reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across multiple backends).
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// Map a non-2xx response onto the error taxonomy.
    async fn classify(response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        match status {
            404 => BackendError::NotFound,
            401 | 403 => BackendError::PermissionDenied(body),
            _ => BackendError::Api { status, body },
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors at this level are connection/timeout/decode
        // failures, all worth retrying.
        BackendError::Transient(err.to_string())
    }
}

#[async_trait]
impl BackendAdapter for HttpBackend {
    async fn submit(&self, process: &ProcessGraph) -> Result<BackendHandle, BackendError> {
        let body = serde_json::json!({ "process": process.as_value() });
        let response = self
            .client
            .post(format!("{}/jobs", self.api_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::classify(response).await;
            // A 4xx on submit is a rejection of the graph itself.
            return Err(match err {
                BackendError::Api { status, body } if status < 500 => {
                    BackendError::Submission(format!("backend returned {status}: {body}"))
                }
                other => other,
            });
        }

        let submitted: SubmitResponse = response.json().await?;
        tracing::debug!(handle = %submitted.id, "Backend accepted job submission");
        Ok(BackendHandle::from(submitted.id))
    }

    async fn poll_status(&self, handle: &BackendHandle) -> Result<BackendPoll, BackendError> {
        let response = self
            .client
            .get(format!("{}/jobs/{}", self.api_url, handle))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::classify(response).await);
        }

        let status: StatusResponse = response.json().await?;
        Ok(BackendPoll {
            state: status.state,
            progress: status.progress,
            usage: status.usage,
        })
    }

    async fn cancel(&self, handle: &BackendHandle) -> Result<(), BackendError> {
        let response = self
            .client
            .post(format!("{}/jobs/{}/cancel", self.api_url, handle))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::classify(response).await);
        }
        Ok(())
    }

    async fn delete(&self, handle: &BackendHandle) -> Result<DeleteOutcome, BackendError> {
        let response = self
            .client
            .delete(format!("{}/jobs/{}", self.api_url, handle))
            .send()
            .await?;

        // 404 is the backend telling us a previous delete already landed.
        if response.status().as_u16() == 404 {
            return Ok(DeleteOutcome::AlreadyGone);
        }
        if !response.status().is_success() {
            return Err(Self::classify(response).await);
        }
        Ok(DeleteOutcome::Deleted)
    }
}
