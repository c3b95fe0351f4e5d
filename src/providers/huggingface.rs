//! Hugging Face Inference API video generation adapter.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{parse_retry_after, sanitize_error_message, Result, SceneGenError};
use crate::provider::ProviderAdapter;
use crate::types::{GenerationRequest, JobHandle, JobStatus, ProviderKind, VideoPayload};

const BASE_URL: &str = "https://api-inference.huggingface.co";
const MODEL: &str = "damo-vilab/text-to-video-ms-1.7b";

/// In-tick retries when the model is still loading (HTTP 503).
const MODEL_LOADING_RETRIES: u32 = 2;

/// Pause between in-tick loading retries.
const LOADING_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Hugging Face adapter (synchronous inference, free tier).
///
/// There is no job to poll: submit returns a synthetic handle and the
/// actual inference call happens inside the poll tick. A 503 "model
/// loading" response gets a bounded number of in-tick retries, after
/// which the tick reports pending so the poll loop's deadline bounds
/// the total wait. Successful responses are raw video bytes.
pub struct HuggingFaceAdapter {
    client: reqwest::Client,
    base_url: String,
    loading_retry_delay: Duration,
}

impl HuggingFaceAdapter {
    /// Creates an adapter using the given HTTP client.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
            loading_retry_delay: LOADING_RETRY_DELAY,
        }
    }

    #[cfg(test)]
    fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            loading_retry_delay: Duration::from_millis(1),
        }
    }

    async fn infer_once(&self, secret: &str, prompt: &str) -> Result<InferenceOutcome> {
        let url = format!("{}/models/{}", self.base_url, MODEL);
        let body = HfRequest {
            inputs: prompt.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {secret}"))
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 503 {
            let text = response.text().await.unwrap_or_default();
            let estimated = serde_json::from_str::<HfLoadingResponse>(&text)
                .ok()
                .and_then(|r| r.estimated_time);
            return Ok(InferenceOutcome::ModelLoading { estimated });
        }
        if status == 401 || status == 403 {
            let text = response.text().await.unwrap_or_default();
            return Err(SceneGenError::Auth(sanitize_error_message(&text)));
        }
        if status == 429 {
            let retry_after =
                parse_retry_after(response.headers()).map(std::time::Duration::from_secs);
            return Err(SceneGenError::RateLimited { retry_after });
        }
        if !(200..300).contains(&status) {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<HfErrorResponse>(&text)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| sanitize_error_message(&text));
            return Ok(InferenceOutcome::Failed(message));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("video/mp4")
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        Ok(InferenceOutcome::Ready {
            bytes,
            content_type,
        })
    }
}

enum InferenceOutcome {
    Ready {
        bytes: Vec<u8>,
        content_type: String,
    },
    ModelLoading {
        estimated: Option<f64>,
    },
    Failed(String),
}

#[async_trait]
impl ProviderAdapter for HuggingFaceAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::HuggingFace
    }

    async fn submit(&self, _secret: &str, request: &GenerationRequest) -> Result<JobHandle> {
        // Synchronous API - nothing to create server-side. The handle is
        // synthetic and the inference runs inside the poll tick.
        if request.image_ref.is_some() {
            tracing::debug!("Hugging Face inference ignores the reference image");
        }
        if request.duration_secs.is_some() || request.aspect_ratio.is_some() {
            tracing::debug!("Hugging Face inference ignores duration and aspect ratio");
        }
        Ok(JobHandle::new(self.kind(), MODEL))
    }

    async fn poll_once(
        &self,
        secret: &str,
        request: &GenerationRequest,
        _handle: &JobHandle,
    ) -> Result<JobStatus> {
        // Bounded retry on "model loading", then report pending and let
        // the poll loop's deadline bound the total wait.
        for attempt in 0..=MODEL_LOADING_RETRIES {
            match self.infer_once(secret, &request.prompt).await? {
                InferenceOutcome::Ready {
                    bytes,
                    content_type,
                } => {
                    return Ok(JobStatus::Succeeded(VideoPayload::Binary {
                        bytes,
                        content_type,
                    }));
                }
                InferenceOutcome::ModelLoading { estimated } => {
                    tracing::debug!(
                        attempt,
                        estimated_secs = estimated,
                        "Hugging Face model still loading"
                    );
                    if attempt < MODEL_LOADING_RETRIES {
                        tokio::time::sleep(self.loading_retry_delay).await;
                    }
                }
                InferenceOutcome::Failed(message) => return Ok(JobStatus::Failed(message)),
            }
        }
        Ok(JobStatus::Pending)
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct HfRequest {
    inputs: String,
}

#[derive(Debug, Deserialize)]
struct HfLoadingResponse {
    #[serde(default)]
    estimated_time: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HfErrorResponse {
    #[serde(default)]
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn handle() -> JobHandle {
        JobHandle::new(ProviderKind::HuggingFace, MODEL)
    }

    #[tokio::test]
    async fn test_submit_is_local_only() {
        // No server at all - submit must not touch the network.
        let adapter =
            HuggingFaceAdapter::with_base_url(reqwest::Client::new(), "http://127.0.0.1:9");
        let handle = adapter
            .submit("hf_test", &GenerationRequest::new("a fox"))
            .await
            .unwrap();
        assert_eq!(handle.provider, ProviderKind::HuggingFace);
        assert_eq!(handle.job_id, MODEL);
    }

    #[tokio::test]
    async fn test_successful_inference_returns_binary() {
        let server = MockServer::start().await;
        let video = vec![0x1a, 0x45, 0xdf, 0xa3];

        Mock::given(method("POST"))
            .and(path(format!("/models/{MODEL}")))
            .and(body_partial_json(serde_json::json!({ "inputs": "a fox" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "video/mp4")
                    .set_body_bytes(video.clone()),
            )
            .mount(&server)
            .await;

        let adapter = HuggingFaceAdapter::with_base_url(reqwest::Client::new(), server.uri());
        let status = adapter
            .poll_once("hf_test", &GenerationRequest::new("a fox"), &handle())
            .await
            .unwrap();

        match status {
            JobStatus::Succeeded(VideoPayload::Binary {
                bytes,
                content_type,
            }) => {
                assert_eq!(bytes, video);
                assert_eq!(content_type, "video/mp4");
            }
            other => panic!("expected binary payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_model_loading_bounded_retries_then_pending() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("/models/{MODEL}")))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": "Model is currently loading",
                "estimated_time": 20.0
            })))
            .expect(u64::from(MODEL_LOADING_RETRIES) + 1)
            .mount(&server)
            .await;

        let adapter = HuggingFaceAdapter::with_base_url(reqwest::Client::new(), server.uri());
        let status = adapter
            .poll_once("hf_test", &GenerationRequest::new("a fox"), &handle())
            .await
            .unwrap();

        // Retries are bounded; the tick yields pending, not an error.
        assert!(matches!(status, JobStatus::Pending));
    }

    #[tokio::test]
    async fn test_inference_error_is_job_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("/models/{MODEL}")))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "unsupported input"
            })))
            .mount(&server)
            .await;

        let adapter = HuggingFaceAdapter::with_base_url(reqwest::Client::new(), server.uri());
        let status = adapter
            .poll_once("hf_test", &GenerationRequest::new("a fox"), &handle())
            .await
            .unwrap();
        assert!(matches!(status, JobStatus::Failed(msg) if msg == "unsupported input"));
    }

    #[tokio::test]
    async fn test_unauthorized_escalates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("/models/{MODEL}")))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let adapter = HuggingFaceAdapter::with_base_url(reqwest::Client::new(), server.uri());
        let err = adapter
            .poll_once("hf_bad", &GenerationRequest::new("a fox"), &handle())
            .await
            .unwrap_err();
        assert!(matches!(err, SceneGenError::Auth(_)));
    }
}
