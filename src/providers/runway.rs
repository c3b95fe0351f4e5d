//! Runway video generation adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{parse_retry_after, sanitize_error_message, Result, SceneGenError};
use crate::provider::ProviderAdapter;
use crate::types::{
    AspectRatio, GenerationRequest, JobHandle, JobStatus, ProviderKind, VideoPayload,
};

const BASE_URL: &str = "https://api.dev.runwayml.com";
const API_VERSION: &str = "2024-11-06";
const MODEL: &str = "gen3a_turbo";

/// Longest clip Runway will generate, in seconds.
const MAX_DURATION_SECS: u32 = 10;

/// Runway adapter (task-based, image-conditioned).
///
/// Submits to the `image_to_video` task endpoint and polls the task by
/// id. Results come back as a hosted URL under `output[0]`, with
/// `artifactUrl` as a fallback field on older task payloads.
pub struct RunwayAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl RunwayAdapter {
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

    fn parse_error(&self, status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> SceneGenError {
        let text = sanitize_error_message(text);
        if status == 401 || status == 403 {
            return SceneGenError::Auth(text);
        }
        if status == 429 {
            let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
            return SceneGenError::RateLimited { retry_after };
        }
        let message = serde_json::from_str::<RunwayErrorResponse>(&text)
            .map(|e| e.error)
            .unwrap_or(text);
        SceneGenError::Submit { status, message }
    }
}

#[async_trait]
impl ProviderAdapter for RunwayAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Runway
    }

    fn preflight(&self, request: &GenerationRequest) -> Result<()> {
        // Known divergence: text-only requests still go to the
        // image-conditioned endpoint with no promptImage attached, which
        // Runway may reject at its discretion. Kept as-is to match
        // observed production behavior.
        // TODO: once a dedicated text_to_video task type is wired up,
        // branch here on image_ref.is_none() and submit to it instead.
        if request.image_ref.is_none() {
            tracing::warn!(
                "Runway request has no reference image but is submitted to the \
                 image-conditioned endpoint"
            );
        }
        Ok(())
    }

    async fn submit(&self, secret: &str, request: &GenerationRequest) -> Result<JobHandle> {
        let body = RunwayRequest::from_request(request);
        let url = format!("{}/v1/image_to_video", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {secret}"))
            .header("X-Runway-Version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        let submit_response: RunwaySubmitResponse = response.json().await?;
        tracing::debug!(task_id = %submit_response.id, "submitted Runway video task");
        Ok(JobHandle::new(self.kind(), submit_response.id))
    }

    async fn poll_once(
        &self,
        secret: &str,
        _request: &GenerationRequest,
        handle: &JobHandle,
    ) -> Result<JobStatus> {
        let url = format!("{}/v1/tasks/{}", self.base_url, handle.job_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {secret}"))
            .header("X-Runway-Version", API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        let task: RunwayTask = response.json().await?;
        match task.status.as_str() {
            "PENDING" | "RUNNING" | "THROTTLED" => Ok(JobStatus::Pending),
            "SUCCEEDED" => {
                let url = task
                    .output
                    .and_then(|mut o| if o.is_empty() { None } else { Some(o.remove(0)) })
                    .or(task.artifact_url)
                    .ok_or_else(|| {
                        SceneGenError::UnexpectedResponse(
                            "Runway task succeeded without an output URL".into(),
                        )
                    })?;
                Ok(JobStatus::Succeeded(VideoPayload::Hosted {
                    url,
                    thumbnail_url: None,
                }))
            }
            "FAILED" => Ok(JobStatus::Failed(
                task.failure
                    .or(task.failure_code)
                    .unwrap_or_else(|| "Runway task failed".into()),
            )),
            other => Err(SceneGenError::UnexpectedResponse(format!(
                "Runway returned unexpected task status: {other}"
            ))),
        }
    }
}

// Wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunwayRequest {
    model: String,
    prompt_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt_image: Option<String>,
    duration: u32,
    ratio: String,
}

impl RunwayRequest {
    fn from_request(request: &GenerationRequest) -> Self {
        // Runway only accepts 5s or 10s clips.
        let duration = match request.duration_secs.unwrap_or(5) {
            0..=5 => 5,
            _ => MAX_DURATION_SECS,
        };

        let ratio = match request.aspect_ratio.unwrap_or_default() {
            AspectRatio::Portrait => "768:1280",
            // No square output; landscape is the closest fit.
            AspectRatio::Landscape | AspectRatio::Square => "1280:768",
        };

        Self {
            model: MODEL.to_string(),
            prompt_text: request.prompt.clone(),
            prompt_image: request.image_ref.clone(),
            duration,
            ratio: ratio.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunwaySubmitResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunwayTask {
    status: String,
    #[serde(default)]
    output: Option<Vec<String>>,
    #[serde(default)]
    artifact_url: Option<String>,
    #[serde(default)]
    failure: Option<String>,
    #[serde(default)]
    failure_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunwayErrorResponse {
    error: String,
}
