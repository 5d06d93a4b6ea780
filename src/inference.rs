//! Client for the remote gesture inference endpoint.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sampler::EncodedStill;

/// Wire request: the still as a data URI, embedded in JSON.
#[derive(Serialize)]
struct PredictRequest<'a> {
    image: &'a str,
}

#[derive(Deserialize)]
struct PredictResponse {
    gesture: String,
}

/// Transport, status and decoding failures, surfaced separately so logs
/// say which leg broke. The detection loop renders all of them as the
/// same inference error reading.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("inference endpoint returned {0}")]
    Status(StatusCode),
    #[error("inference response was not the expected JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Thin JSON-over-HTTP client for the inference endpoint.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    endpoint: String,
}

impl InferenceClient {
    /// Build a client bound to `endpoint` with a per-request timeout.
    /// Falls back to the default client if the builder fails.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submit one still and resolve to the returned label.
    pub async fn classify(&self, still: &EncodedStill) -> Result<String, InferenceError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&PredictRequest {
                image: &still.data_uri,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::Status(status));
        }

        let body = response.text().await?;
        let parsed: PredictResponse = serde_json::from_str(&body)?;
        Ok(parsed.gesture)
    }
}
