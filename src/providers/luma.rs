//! Luma Dream Machine video generation adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{parse_retry_after, sanitize_error_message, Result, SceneGenError};
use crate::provider::ProviderAdapter;
use crate::types::{GenerationRequest, JobHandle, JobStatus, ProviderKind, VideoPayload};

const BASE_URL: &str = "https://api.lumalabs.ai";

/// Luma Dream Machine adapter (generation-based).
///
/// The API takes no duration parameter; a requested duration is
/// dropped with a debug log. A reference image becomes a `frame0`
/// keyframe, and results arrive under `assets.video` with an optional
/// `assets.thumbnail`.
pub struct LumaAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl LumaAdapter {
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
        let message = serde_json::from_str::<LumaErrorResponse>(&text)
            .ok()
            .and_then(|e| e.detail)
            .unwrap_or(text);
        SceneGenError::Submit { status, message }
    }
}

#[async_trait]
impl ProviderAdapter for LumaAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Luma
    }

    async fn submit(&self, secret: &str, request: &GenerationRequest) -> Result<JobHandle> {
        if request.duration_secs.is_some() {
            tracing::debug!("Luma has no duration parameter, dropping requested duration");
        }

        let body = LumaRequest::from_request(request);
        let url = format!("{}/dream-machine/v1/generations", self.base_url);

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

        let submit_response: LumaGeneration = response.json().await?;
        tracing::debug!(generation_id = %submit_response.id, "submitted Luma generation");
        Ok(JobHandle::new(self.kind(), submit_response.id))
    }

    async fn poll_once(
        &self,
        secret: &str,
        _request: &GenerationRequest,
        handle: &JobHandle,
    ) -> Result<JobStatus> {
        let url = format!(
            "{}/dream-machine/v1/generations/{}",
            self.base_url, handle.job_id
        );

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

        let generation: LumaGeneration = response.json().await?;
        match generation.state.as_str() {
            "queued" | "dreaming" => Ok(JobStatus::Pending),
            "completed" => {
                let assets = generation.assets.ok_or_else(|| {
                    SceneGenError::UnexpectedResponse(
                        "Luma generation completed without assets".into(),
                    )
                })?;
                Ok(JobStatus::Succeeded(VideoPayload::Hosted {
                    url: assets.video,
                    thumbnail_url: assets.thumbnail,
                }))
            }
            "failed" => Ok(JobStatus::Failed(
                generation
                    .failure_reason
                    .unwrap_or_else(|| "Luma generation failed".into()),
            )),
            other => Err(SceneGenError::UnexpectedResponse(format!(
                "Luma returned unexpected state: {other}"
            ))),
        }
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct LumaRequest {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keyframes: Option<LumaKeyframes>,
}

#[derive(Debug, Serialize)]
struct LumaKeyframes {
    frame0: LumaKeyframe,
}

#[derive(Debug, Serialize)]
struct LumaKeyframe {
    #[serde(rename = "type")]
    kind: String,
    url: String,
}

impl LumaRequest {
    fn from_request(request: &GenerationRequest) -> Self {
        let keyframes = request.image_ref.as_ref().map(|url| LumaKeyframes {
            frame0: LumaKeyframe {
                kind: "image".to_string(),
                url: url.clone(),
            },
        });

        Self {
            prompt: request.prompt.clone(),
            aspect_ratio: request.aspect_ratio.map(|r| r.as_str().to_string()),
            keyframes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LumaGeneration {
    id: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    assets: Option<LumaAssets>,
    #[serde(default)]
    failure_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LumaAssets {
    video: String,
    #[serde(default)]
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LumaErrorResponse {
    #[serde(default)]
    detail: Option<String>,
}
