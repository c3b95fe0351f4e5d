//! Result normalization.
//!
//! Maps each adapter's raw success payload into the one canonical
//! [`GenerationResult`] shape, pushing binary payloads through the blob
//! storage collaborator.

use crate::error::Result;
use crate::storage::{object_filename, VideoStorage};
use crate::types::{GenerationResult, ProviderKind, VideoPayload};

/// Normalizes a raw adapter payload into the canonical result.
///
/// `provider` must be the adapter that actually produced the payload.
/// After a fallback this is the provider that succeeded, never the one
/// originally requested - callers rely on this field for attribution.
pub async fn normalize(
    provider: ProviderKind,
    payload: VideoPayload,
    job_id: Option<String>,
    duration_secs: Option<u32>,
    storage: &dyn VideoStorage,
) -> Result<GenerationResult> {
    let (video_url, thumbnail_url) = match payload {
        VideoPayload::Hosted { url, thumbnail_url } => (url, thumbnail_url),
        VideoPayload::Binary {
            bytes,
            content_type,
        } => {
            let filename = object_filename(provider, job_id.as_deref().unwrap_or("video"));
            let size = bytes.len();
            let url = storage.store(bytes, &filename, &content_type).await?;
            tracing::debug!(
                provider = %provider,
                filename = %filename,
                size_bytes = size,
                "stored binary video payload"
            );
            (url, None)
        }
    };

    Ok(GenerationResult {
        provider,
        video_url,
        job_id,
        duration_secs,
        thumbnail_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SceneGenError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory stand-in for the external blob store.
    struct MemoryStorage {
        stored: Mutex<Vec<(Vec<u8>, String, String)>>,
    }

    impl MemoryStorage {
        fn new() -> Self {
            Self {
                stored: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl VideoStorage for MemoryStorage {
        async fn store(
            &self,
            bytes: Vec<u8>,
            filename: &str,
            content_type: &str,
        ) -> crate::error::Result<String> {
            let url = format!("https://blobs.example/{filename}");
            self.stored
                .lock()
                .unwrap()
                .push((bytes, filename.to_string(), content_type.to_string()));
            Ok(url)
        }
    }

    struct FailingStorage;

    #[async_trait]
    impl VideoStorage for FailingStorage {
        async fn store(&self, _: Vec<u8>, _: &str, _: &str) -> crate::error::Result<String> {
            Err(SceneGenError::Storage("bucket unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_hosted_url_passes_through() {
        let storage = MemoryStorage::new();
        let payload = VideoPayload::Hosted {
            url: "https://cdn.luma.example/v.mp4".into(),
            thumbnail_url: Some("https://cdn.luma.example/t.jpg".into()),
        };

        let result = normalize(
            ProviderKind::Luma,
            payload,
            Some("gen-9".into()),
            Some(5),
            &storage,
        )
        .await
        .unwrap();

        assert_eq!(result.provider, ProviderKind::Luma);
        assert_eq!(result.video_url, "https://cdn.luma.example/v.mp4");
        assert_eq!(
            result.thumbnail_url.as_deref(),
            Some("https://cdn.luma.example/t.jpg")
        );
        assert_eq!(result.job_id.as_deref(), Some("gen-9"));
        // Nothing hit the blob store.
        assert!(storage.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_binary_payload_goes_through_storage() {
        let storage = MemoryStorage::new();
        let bytes = vec![0x00, 0x00, 0x00, 0x20, 0x66, 0x74, 0x79, 0x70];
        let payload = VideoPayload::Binary {
            bytes: bytes.clone(),
            content_type: "video/mp4".into(),
        };

        let result = normalize(
            ProviderKind::Sora,
            payload,
            Some("video_1".into()),
            None,
            &storage,
        )
        .await
        .unwrap();

        assert_eq!(result.provider, ProviderKind::Sora);
        assert_eq!(result.video_url, "https://blobs.example/sora-video_1.mp4");

        // Byte identity is preserved through the store call.
        let stored = storage.stored.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].0, bytes);
        assert_eq!(stored[0].2, "video/mp4");
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces() {
        let payload = VideoPayload::Binary {
            bytes: vec![1, 2, 3],
            content_type: "video/mp4".into(),
        };
        let err = normalize(ProviderKind::HuggingFace, payload, None, None, &FailingStorage)
            .await
            .unwrap_err();
        assert!(matches!(err, SceneGenError::Storage(_)));
    }
}
