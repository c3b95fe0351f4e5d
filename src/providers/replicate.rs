//! Replicate video generation adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{parse_retry_after, sanitize_error_message, Result, SceneGenError};
use crate::provider::ProviderAdapter;
use crate::types::{GenerationRequest, JobHandle, JobStatus, ProviderKind, VideoPayload};

const BASE_URL: &str = "https://api.replicate.com";

/// Pinned model version for the predictions API.
const MODEL_VERSION: &str = "9f747673945c62801b13b84701c783929c0ee784e4748ec062204894dda1a351";

/// Frame rate the model renders at.
const FRAMES_PER_SECOND: u32 = 8;

/// Hard cap on frames per prediction.
const MAX_FRAMES: u32 = 81;

/// Replicate adapter (prediction-based).
///
/// Duration is expressed as a frame count rather than seconds, and the
/// success `output` field is an array for some models and a scalar
/// string for others - both shapes are accepted.
pub struct ReplicateAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl ReplicateAdapter {
    /// Creates an adapter using the given HTTP client.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn parse_error(
        &self,
        status: u16,
        text: &str,
        headers: &reqwest::header::HeaderMap,
    ) -> SceneGenError {
        let text = sanitize_error_message(text);
        if status == 401 || status == 403 {
            return SceneGenError::Auth(text);
        }
        if status == 429 {
            let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
            return SceneGenError::RateLimited { retry_after };
        }
        let message = serde_json::from_str::<ReplicateErrorResponse>(&text)
            .ok()
            .and_then(|e| e.detail)
            .unwrap_or(text);
        SceneGenError::Submit { status, message }
    }
}

#[async_trait]
impl ProviderAdapter for ReplicateAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Replicate
    }

    async fn submit(&self, secret: &str, request: &GenerationRequest) -> Result<JobHandle> {
        let body = ReplicateRequest::from_request(request);
        let url = format!("{}/v1/predictions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {secret}"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        let submit_response: ReplicatePrediction = response.json().await?;
        tracing::debug!(prediction_id = %submit_response.id, "submitted Replicate prediction");
        Ok(JobHandle::new(self.kind(), submit_response.id))
    }

    async fn poll_once(
        &self,
        secret: &str,
        _request: &GenerationRequest,
        handle: &JobHandle,
    ) -> Result<JobStatus> {
        let url = format!("{}/v1/predictions/{}", self.base_url, handle.job_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {secret}"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        let prediction: ReplicatePrediction = response.json().await?;
        match prediction.status.as_str() {
            "starting" | "processing" => Ok(JobStatus::Pending),
            "succeeded" => {
                let url = prediction.output_url().ok_or_else(|| {
                    SceneGenError::UnexpectedResponse(
                        "Replicate prediction succeeded without an output URL".into(),
                    )
                })?;
                Ok(JobStatus::Succeeded(VideoPayload::Hosted {
                    url,
                    thumbnail_url: None,
                }))
            }
            "failed" | "canceled" => Ok(JobStatus::Failed(
                prediction
                    .error
                    .unwrap_or_else(|| "Replicate prediction failed".into()),
            )),
            other => Err(SceneGenError::UnexpectedResponse(format!(
                "Replicate returned unexpected status: {other}"
            ))),
        }
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ReplicateRequest {
    version: String,
    input: ReplicateInput,
}

#[derive(Debug, Serialize)]
struct ReplicateInput {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_frames: Option<u32>,
}

impl ReplicateRequest {
    fn from_request(request: &GenerationRequest) -> Self {
        // Seconds to frames at the model's fixed rate, capped.
        let num_frames = request
            .duration_secs
            .map(|secs| (secs.max(1) * FRAMES_PER_SECOND).min(MAX_FRAMES));

        Self {
            version: MODEL_VERSION.to_string(),
            input: ReplicateInput {
                prompt: request.prompt.clone(),
                image: request.image_ref.clone(),
                aspect_ratio: request.aspect_ratio.map(|r| r.as_str().to_string()),
                num_frames,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReplicatePrediction {
    id: String,
    status: String,
    /// Array for some models, scalar string for others.
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

impl ReplicatePrediction {
    fn output_url(&self) -> Option<String> {
        match self.output.as_ref()? {
            serde_json::Value::String(url) => Some(url.clone()),
            serde_json::Value::Array(items) => items
                .first()
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReplicateErrorResponse {
    #[serde(default)]
    detail: Option<String>,
}
