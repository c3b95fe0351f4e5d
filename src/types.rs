//! Core types for video generation.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Video provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Runway Gen-3 (task-based, image-conditioned).
    Runway,
    /// Sora (OpenAI).
    Sora,
    /// Replicate predictions API.
    Replicate,
    /// fal.ai queue API.
    Fal,
    /// Luma Dream Machine.
    Luma,
    /// Hugging Face Inference API (free tier).
    HuggingFace,
}

impl ProviderKind {
    /// All providers, in fixed fallback priority order (highest first).
    pub const ALL: [ProviderKind; 6] = [
        Self::Runway,
        Self::Sora,
        Self::Replicate,
        Self::Fal,
        Self::Luma,
        Self::HuggingFace,
    ];

    /// Returns the stable identifier string for this provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Runway => "runway",
            Self::Sora => "sora",
            Self::Replicate => "replicate",
            Self::Fal => "fal",
            Self::Luma => "luma",
            Self::HuggingFace => "huggingface",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target aspect ratio for the generated video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9 widescreen.
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 vertical.
    #[serde(rename = "9:16")]
    Portrait,
    /// 1:1 square.
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    /// Returns the canonical "w:h" string for this ratio.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Square => "1:1",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution hint for the generated video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// 720p.
    #[default]
    #[serde(rename = "720p")]
    P720,
    /// 1080p.
    #[serde(rename = "1080p")]
    P1080,
}

impl Resolution {
    /// Returns the resolution label ("720p" / "1080p").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P720 => "720p",
            Self::P1080 => "1080p",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to generate a video.
///
/// Immutable once submitted - adapters receive it by shared reference and
/// map it into their own wire shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The text prompt describing the desired video.
    pub prompt: String,
    /// Reference image URL for image-to-video generation.
    pub image_ref: Option<String>,
    /// Desired video duration in seconds. Adapters clamp to provider limits.
    pub duration_secs: Option<u32>,
    /// Target aspect ratio.
    pub aspect_ratio: Option<AspectRatio>,
    /// Resolution hint.
    pub resolution: Option<Resolution>,
}

impl GenerationRequest {
    /// Creates a new request with the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image_ref: None,
            duration_secs: None,
            aspect_ratio: None,
            resolution: None,
        }
    }

    /// Sets a reference image for image-to-video generation.
    pub fn with_image_ref(mut self, url: impl Into<String>) -> Self {
        self.image_ref = Some(url.into());
        self
    }

    /// Sets the desired video duration in seconds.
    pub fn with_duration(mut self, secs: u32) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    /// Sets the resolution hint.
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }
}

/// Handle for an in-progress generation job.
///
/// Created on successful submit, discarded once polling terminates.
#[derive(Debug, Clone)]
pub struct JobHandle {
    /// Provider that accepted the job.
    pub provider: ProviderKind,
    /// Provider-assigned job/task identifier.
    pub job_id: String,
    /// When the job was submitted.
    pub submitted_at: Instant,
}

impl JobHandle {
    /// Creates a handle for a freshly submitted job.
    pub fn new(provider: ProviderKind, job_id: impl Into<String>) -> Self {
        Self {
            provider,
            job_id: job_id.into(),
            submitted_at: Instant::now(),
        }
    }
}

/// Raw success payload surfaced by an adapter, before normalization.
///
/// Providers either hand back a hosted URL or the video bytes themselves;
/// the normalizer turns both into a [`GenerationResult`].
#[derive(Debug, Clone)]
pub enum VideoPayload {
    /// Provider hosts the result and returned a URL to it.
    Hosted {
        /// URL of the generated video.
        url: String,
        /// Thumbnail URL, when the provider supplies one.
        thumbnail_url: Option<String>,
    },
    /// Provider returned the video bytes directly.
    Binary {
        /// Raw video bytes.
        bytes: Vec<u8>,
        /// MIME type of the bytes (e.g. "video/mp4").
        content_type: String,
    },
}

/// Outcome of a single poll tick.
#[derive(Debug, Clone)]
pub enum JobStatus {
    /// Job is queued or running; poll again later.
    Pending,
    /// Job finished; payload is ready for normalization.
    Succeeded(VideoPayload),
    /// Provider reported the job as failed.
    Failed(String),
}

/// The normalized result of a successful generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Provider whose adapter actually produced the video. After a
    /// fallback this names the provider that succeeded, never the one
    /// originally preferred.
    pub provider: ProviderKind,
    /// URL of the generated video.
    pub video_url: String,
    /// Provider-assigned job identifier, when one exists.
    pub job_id: Option<String>,
    /// Video duration in seconds, when reported.
    pub duration_secs: Option<u32>,
    /// Thumbnail URL, when available.
    pub thumbnail_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_round_trip() {
        for kind in ProviderKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            let back: ProviderKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn test_priority_order_is_complete_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for kind in ProviderKind::ALL {
            assert!(seen.insert(kind), "{kind} appears twice in ALL");
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(ProviderKind::ALL[0], ProviderKind::Runway);
        assert_eq!(ProviderKind::ALL[5], ProviderKind::HuggingFace);
    }

    #[test]
    fn test_aspect_ratio_serde() {
        assert_eq!(
            serde_json::to_string(&AspectRatio::Portrait).unwrap(),
            "\"9:16\""
        );
        let parsed: AspectRatio = serde_json::from_str("\"1:1\"").unwrap();
        assert_eq!(parsed, AspectRatio::Square);
    }

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new("A lighthouse at dusk")
            .with_duration(8)
            .with_aspect_ratio(AspectRatio::Landscape)
            .with_resolution(Resolution::P1080)
            .with_image_ref("https://example.com/frame.jpg");

        assert_eq!(request.prompt, "A lighthouse at dusk");
        assert_eq!(request.duration_secs, Some(8));
        assert_eq!(request.aspect_ratio, Some(AspectRatio::Landscape));
        assert_eq!(request.resolution, Some(Resolution::P1080));
        assert_eq!(
            request.image_ref.as_deref(),
            Some("https://example.com/frame.jpg")
        );
    }

    #[test]
    fn test_request_defaults_empty() {
        let request = GenerationRequest::new("minimal");
        assert!(request.image_ref.is_none());
        assert!(request.duration_secs.is_none());
        assert!(request.aspect_ratio.is_none());
        assert!(request.resolution.is_none());
    }

    #[test]
    fn test_job_handle_carries_provider() {
        let handle = JobHandle::new(ProviderKind::Luma, "gen-123");
        assert_eq!(handle.provider, ProviderKind::Luma);
        assert_eq!(handle.job_id, "gen-123");
    }

    #[test]
    fn test_result_serde_skips_nothing() {
        let result = GenerationResult {
            provider: ProviderKind::Fal,
            video_url: "https://cdn.example.com/v.mp4".into(),
            job_id: Some("req-1".into()),
            duration_secs: Some(6),
            thumbnail_url: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["provider"], "fal");
        assert_eq!(json["video_url"], "https://cdn.example.com/v.mp4");
    }
}
