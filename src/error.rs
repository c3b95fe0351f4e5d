//! Error types for video generation orchestration.

use std::time::Duration;

use crate::types::ProviderKind;

/// Maximum length of a provider error message after sanitization.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur during video generation.
#[derive(Debug, thiserror::Error)]
pub enum SceneGenError {
    /// No provider in the credential set has a usable secret.
    #[error("no video provider configured - supply a credential for one of: {}", supported_providers())]
    NoProviderConfigured,

    /// API key missing or rejected by the provider.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Provider answered a submit or status call with a non-success
    /// response.
    #[error("provider rejected request ({status}): {message}")]
    Submit {
        /// HTTP status returned by the provider.
        status: u16,
        /// Sanitized provider error message.
        message: String,
    },

    /// Provider explicitly reported the job as failed.
    #[error("generation job failed: {0}")]
    Job(String),

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Delay suggested by the provider, if any.
        retry_after: Option<Duration>,
    },

    /// Deadline elapsed before the job reached a terminal status.
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    /// Every credentialed provider was attempted and failed.
    #[error("all {attempted} configured providers failed, last error: {last}")]
    AllProvidersExhausted {
        /// Number of providers attempted.
        attempted: usize,
        /// Message of the last underlying failure.
        last: String,
    },

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider returned a payload we don't know how to interpret.
    #[error("unexpected provider response: {0}")]
    UnexpectedResponse(String),

    /// Blob storage collaborator failed to persist the video.
    #[error("storage error: {0}")]
    Storage(String),
}

impl SceneGenError {
    /// Returns true if this error is a transport-level hiccup.
    ///
    /// The poll loop absorbs these as "still pending" rather than failing
    /// the provider on a single bad tick.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Returns true if this error is terminal for the provider that raised
    /// it and should drive fallback to the next candidate.
    pub fn is_provider_terminal(&self) -> bool {
        matches!(
            self,
            Self::Auth(_)
                | Self::Submit { .. }
                | Self::Job(_)
                | Self::RateLimited { .. }
                | Self::Timeout(_)
                | Self::InvalidRequest(_)
                | Self::UnexpectedResponse(_)
        )
    }
}

fn supported_providers() -> String {
    ProviderKind::ALL
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Truncates and cleans a provider error body before it lands in an error.
///
/// Provider error pages can be multi-kilobyte HTML blobs; keep the useful
/// prefix and strip control characters.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control() || *c == ' ')
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.len() > MAX_ERROR_MESSAGE_LEN {
        let mut end = MAX_ERROR_MESSAGE_LEN;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    } else {
        trimmed.to_string()
    }
}

/// Parses a `Retry-After` header value in seconds, if present.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Result type alias for video generation operations.
pub type Result<T> = std::result::Result<T, SceneGenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transport() {
        assert!(!SceneGenError::Auth("bad key".into()).is_transport());
        assert!(!SceneGenError::Job("boom".into()).is_transport());
        assert!(!SceneGenError::Timeout(Duration::from_secs(600)).is_transport());
        assert!(!SceneGenError::RateLimited { retry_after: None }.is_transport());
    }

    #[test]
    fn test_is_provider_terminal() {
        assert!(SceneGenError::Submit {
            status: 400,
            message: "bad prompt".into()
        }
        .is_provider_terminal());
        assert!(SceneGenError::Job("model error".into()).is_provider_terminal());
        assert!(SceneGenError::Timeout(Duration::from_secs(600)).is_provider_terminal());
        assert!(SceneGenError::Auth("expired".into()).is_provider_terminal());

        assert!(!SceneGenError::NoProviderConfigured.is_provider_terminal());
        assert!(!SceneGenError::Storage("disk full".into()).is_provider_terminal());
    }

    #[test]
    fn test_error_display() {
        let err = SceneGenError::Submit {
            status: 422,
            message: "duration not supported".into(),
        };
        assert_eq!(
            err.to_string(),
            "provider rejected request (422): duration not supported"
        );

        let err = SceneGenError::AllProvidersExhausted {
            attempted: 3,
            last: "timed out".into(),
        };
        assert_eq!(
            err.to_string(),
            "all 3 configured providers failed, last error: timed out"
        );
    }

    #[test]
    fn test_no_provider_message_lists_providers() {
        let msg = SceneGenError::NoProviderConfigured.to_string();
        assert!(msg.contains("runway"));
        assert!(msg.contains("huggingface"));
    }

    #[test]
    fn test_sanitize_truncates_long_messages() {
        let long = "x".repeat(2000);
        let sanitized = sanitize_error_message(&long);
        assert!(sanitized.len() <= MAX_ERROR_MESSAGE_LEN + 3);
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn test_sanitize_strips_control_chars() {
        let sanitized = sanitize_error_message("bad\r\nrequest\t!");
        assert_eq!(sanitized, "badrequest!");
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "30".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(30));

        let empty = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&empty), None);
    }
}
