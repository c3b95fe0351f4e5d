//! Sora (OpenAI) video generation adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{parse_retry_after, sanitize_error_message, Result, SceneGenError};
use crate::provider::ProviderAdapter;
use crate::types::{
    AspectRatio, GenerationRequest, JobHandle, JobStatus, ProviderKind, Resolution, VideoPayload,
};

const BASE_URL: &str = "https://api.openai.com";
const MODEL: &str = "sora-2";

/// Durations Sora accepts, in seconds.
const VALID_DURATIONS: [u32; 3] = [4, 8, 12];

/// Sora adapter (job-based).
///
/// Unlike the other hosted providers Sora does not return a URL: once
/// the job completes, the video is downloaded through the `/content`
/// endpoint and surfaced as a binary payload for the blob store.
pub struct SoraAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl SoraAdapter {
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

    async fn download(&self, secret: &str, video_id: &str) -> Result<Vec<u8>> {
        let url = format!("{}/v1/videos/{}/content", self.base_url, video_id);

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

        Ok(response.bytes().await?.to_vec())
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
        let message = serde_json::from_str::<SoraErrorEnvelope>(&text)
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or(text);
        SceneGenError::Submit { status, message }
    }
}

#[async_trait]
impl ProviderAdapter for SoraAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Sora
    }

    async fn submit(&self, secret: &str, request: &GenerationRequest) -> Result<JobHandle> {
        if request.image_ref.is_some() {
            // The JSON submission path has no image slot.
            tracing::debug!("Sora submission ignores the reference image");
        }

        let body = SoraRequest::from_request(request);
        let url = format!("{}/v1/videos", self.base_url);

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

        let submit_response: SoraSubmitResponse = response.json().await?;
        tracing::debug!(video_id = %submit_response.id, "submitted Sora video job");
        Ok(JobHandle::new(self.kind(), submit_response.id))
    }

    async fn poll_once(
        &self,
        secret: &str,
        _request: &GenerationRequest,
        handle: &JobHandle,
    ) -> Result<JobStatus> {
        let url = format!("{}/v1/videos/{}", self.base_url, handle.job_id);

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

        let poll: SoraPollResponse = response.json().await?;
        match poll.status.as_str() {
            "queued" | "in_progress" => Ok(JobStatus::Pending),
            "completed" => {
                let bytes = self.download(secret, &handle.job_id).await?;
                Ok(JobStatus::Succeeded(VideoPayload::Binary {
                    bytes,
                    content_type: "video/mp4".into(),
                }))
            }
            "failed" => Ok(JobStatus::Failed(
                poll.failure_reason
                    .or_else(|| poll.error.and_then(|e| e.message))
                    .unwrap_or_else(|| "Sora job failed".into()),
            )),
            other => Err(SceneGenError::UnexpectedResponse(format!(
                "Sora returned unexpected status: {other}"
            ))),
        }
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct SoraRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seconds: Option<String>,
}

impl SoraRequest {
    fn from_request(request: &GenerationRequest) -> Self {
        let size = request.aspect_ratio.map(|ratio| {
            let resolution = request.resolution.unwrap_or_default();
            match (ratio, resolution) {
                (AspectRatio::Landscape, Resolution::P720) => "1280x720",
                (AspectRatio::Landscape, Resolution::P1080) => "1920x1080",
                (AspectRatio::Portrait, Resolution::P720) => "720x1280",
                (AspectRatio::Portrait, Resolution::P1080) => "1080x1920",
                (AspectRatio::Square, Resolution::P720) => "720x720",
                (AspectRatio::Square, Resolution::P1080) => "1080x1080",
            }
            .to_string()
        });

        // Snap down to the largest allowed duration not above the request.
        let seconds = request.duration_secs.map(|d| {
            VALID_DURATIONS
                .iter()
                .rev()
                .find(|&&v| v <= d)
                .copied()
                .unwrap_or(VALID_DURATIONS[0])
                .to_string()
        });

        Self {
            model: MODEL.to_string(),
            prompt: request.prompt.clone(),
            size,
            seconds,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SoraSubmitResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SoraPollResponse {
    status: String,
    #[serde(default)]
    failure_reason: Option<String>,
    #[serde(default)]
    error: Option<SoraError>,
}

#[derive(Debug, Deserialize)]
struct SoraError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SoraErrorEnvelope {
    error: SoraError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_duration_snaps_down() {
        let cases = [(1, "4"), (4, "4"), (6, "4"), (8, "8"), (11, "8"), (12, "12"), (30, "12")];
        for (requested, expected) in cases {
            let req = GenerationRequest::new("test").with_duration(requested);
            assert_eq!(
                SoraRequest::from_request(&req).seconds.as_deref(),
                Some(expected),
                "duration {requested}"
            );
        }
    }

    #[test]
    fn test_no_duration_sends_no_seconds() {
        let req = GenerationRequest::new("test");
        assert!(SoraRequest::from_request(&req).seconds.is_none());
    }

    #[test]
    fn test_size_mapping() {
        let req = GenerationRequest::new("test")
            .with_aspect_ratio(AspectRatio::Landscape)
            .with_resolution(Resolution::P1080);
        assert_eq!(
            SoraRequest::from_request(&req).size.as_deref(),
            Some("1920x1080")
        );

        let req = GenerationRequest::new("test").with_aspect_ratio(AspectRatio::Portrait);
        assert_eq!(
            SoraRequest::from_request(&req).size.as_deref(),
            Some("720x1280")
        );
    }

    #[test]
    fn test_request_serialization_skips_none() {
        let req = GenerationRequest::new("test");
        let json = serde_json::to_value(SoraRequest::from_request(&req)).unwrap();
        assert_eq!(json["model"], "sora-2");
        assert!(json.get("size").is_none());
        assert!(json.get("seconds").is_none());
    }

    #[tokio::test]
    async fn test_completed_job_downloads_binary() {
        let server = MockServer::start().await;
        let video_bytes = vec![0x66, 0x74, 0x79, 0x70, 0x69, 0x73, 0x6f, 0x6d];

        Mock::given(method("GET"))
            .and(path("/v1/videos/video_7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "video_7",
                "status": "completed"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/videos/video_7/content"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(video_bytes.clone()))
            .mount(&server)
            .await;

        let adapter = SoraAdapter::with_base_url(reqwest::Client::new(), server.uri());
        let handle = JobHandle::new(ProviderKind::Sora, "video_7");
        let status = adapter
            .poll_once("sk-test", &GenerationRequest::new("test"), &handle)
            .await
            .unwrap();

        match status {
            JobStatus::Succeeded(VideoPayload::Binary { bytes, content_type }) => {
                assert_eq!(bytes, video_bytes);
                assert_eq!(content_type, "video/mp4");
            }
            other => panic!("expected binary payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_sends_model_and_prompt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/videos"))
            .and(body_partial_json(serde_json::json!({
                "model": "sora-2",
                "prompt": "A comet over mountains"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "video_9",
                "status": "queued"
            })))
            .mount(&server)
            .await;

        let adapter = SoraAdapter::with_base_url(reqwest::Client::new(), server.uri());
        let handle = adapter
            .submit("sk-test", &GenerationRequest::new("A comet over mountains"))
            .await
            .unwrap();
        assert_eq!(handle.job_id, "video_9");
    }

    #[tokio::test]
    async fn test_failed_job_surfaces_reason() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/videos/video_3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "video_3",
                "status": "failed",
                "failure_reason": "content policy violation"
            })))
            .mount(&server)
            .await;

        let adapter = SoraAdapter::with_base_url(reqwest::Client::new(), server.uri());
        let handle = JobHandle::new(ProviderKind::Sora, "video_3");
        let status = adapter
            .poll_once("sk-test", &GenerationRequest::new("test"), &handle)
            .await
            .unwrap();
        assert!(matches!(status, JobStatus::Failed(msg) if msg == "content policy violation"));
    }

    #[tokio::test]
    async fn test_submit_error_message_extracted() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/videos"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "message": "unsupported size", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let adapter = SoraAdapter::with_base_url(reqwest::Client::new(), server.uri());
        let err = adapter
            .submit("sk-test", &GenerationRequest::new("test"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SceneGenError::Submit { status: 400, ref message } if message == "unsupported size"
        ));
    }
}
