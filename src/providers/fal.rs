//! fal.ai video generation adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{sanitize_error_message, Result, SceneGenError};
use crate::provider::ProviderAdapter;
use crate::types::{GenerationRequest, JobHandle, JobStatus, ProviderKind, VideoPayload};

const QUEUE_BASE: &str = "https://queue.fal.run";

/// Text-to-video endpoint.
const T2V_MODEL: &str = "fal-ai/kling-video/v1.6/standard/text-to-video";

/// Image-to-video endpoint, used when a reference image is present.
const I2V_MODEL: &str = "fal-ai/kling-video/v1.6/standard/image-to-video";

/// Queue status/result paths use the root application alias, not the
/// full endpoint path.
const ROOT_APP: &str = "fal-ai/kling-video";

/// Longest clip the model accepts, in seconds.
const MAX_DURATION_SECS: u32 = 10;

/// fal.ai adapter (queue-based).
///
/// Submit posts to the model endpoint on the queue host; status and
/// result URLs are derived from the root application alias plus the
/// returned request id. Auth uses fal's custom `Key` scheme rather
/// than a bearer token.
pub struct FalAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl FalAdapter {
    /// Creates an adapter using the given HTTP client.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: QUEUE_BASE.to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn fetch_result(&self, secret: &str, request_id: &str) -> Result<String> {
        let url = format!("{}/{}/requests/{}", self.base_url, ROOT_APP, request_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Key {secret}"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text));
        }

        let result: FalResult = response.json().await?;
        result
            .video
            .or(result.output)
            .map(|f| f.url)
            .ok_or_else(|| {
                SceneGenError::UnexpectedResponse(
                    "fal.ai request completed without a video URL".into(),
                )
            })
    }

    fn parse_error(&self, status: u16, text: &str) -> SceneGenError {
        let text = sanitize_error_message(text);
        if let Ok(error_response) = serde_json::from_str::<FalErrorResponse>(&text) {
            let detail = error_response.detail;
            let lower = detail.to_lowercase();
            if lower.contains("unauthorized") || lower.contains("invalid key") {
                return SceneGenError::Auth(detail);
            }
            if lower.contains("rate") && lower.contains("limit") {
                return SceneGenError::RateLimited { retry_after: None };
            }
            return SceneGenError::Submit {
                status,
                message: detail,
            };
        }
        if status == 401 || status == 403 {
            return SceneGenError::Auth(text);
        }
        if status == 429 {
            return SceneGenError::RateLimited { retry_after: None };
        }
        SceneGenError::Submit {
            status,
            message: text,
        }
    }
}

#[async_trait]
impl ProviderAdapter for FalAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Fal
    }

    async fn submit(&self, secret: &str, request: &GenerationRequest) -> Result<JobHandle> {
        let model = if request.image_ref.is_some() {
            I2V_MODEL
        } else {
            T2V_MODEL
        };
        let url = format!("{}/{}", self.base_url, model);
        let body = FalRequest::from_request(request);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Key {secret}"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text));
        }

        let submit_response: FalSubmitResponse = response.json().await?;
        tracing::debug!(
            request_id = %submit_response.request_id,
            model = %model,
            "submitted fal.ai video request"
        );
        Ok(JobHandle::new(self.kind(), submit_response.request_id))
    }

    async fn poll_once(
        &self,
        secret: &str,
        _request: &GenerationRequest,
        handle: &JobHandle,
    ) -> Result<JobStatus> {
        let url = format!(
            "{}/{}/requests/{}/status",
            self.base_url, ROOT_APP, handle.job_id
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Key {secret}"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text));
        }

        let queue_status: FalStatusResponse = response.json().await?;
        match queue_status.status.as_str() {
            "IN_QUEUE" | "IN_PROGRESS" => Ok(JobStatus::Pending),
            "COMPLETED" => {
                let url = self.fetch_result(secret, &handle.job_id).await?;
                Ok(JobStatus::Succeeded(VideoPayload::Hosted {
                    url,
                    thumbnail_url: None,
                }))
            }
            "FAILED" => Ok(JobStatus::Failed("fal.ai video request failed".into())),
            other => Err(SceneGenError::UnexpectedResponse(format!(
                "fal.ai returned unexpected status: {other}"
            ))),
        }
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct FalRequest {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<String>,
}

impl FalRequest {
    fn from_request(request: &GenerationRequest) -> Self {
        Self {
            prompt: request.prompt.clone(),
            image_url: request.image_ref.clone(),
            duration: request
                .duration_secs
                .map(|d| d.max(1).min(MAX_DURATION_SECS)),
            aspect_ratio: request.aspect_ratio.map(|r| r.as_str().to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FalSubmitResponse {
    request_id: String,
}

#[derive(Debug, Deserialize)]
struct FalStatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct FalResult {
    #[serde(default)]
    video: Option<FalFile>,
    #[serde(default)]
    output: Option<FalFile>,
}

#[derive(Debug, Deserialize)]
struct FalFile {
    url: String,
}

#[derive(Debug, Deserialize)]
struct FalErrorResponse {
    detail: String,
}
