//! Blob storage collaborator boundary.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ProviderKind;

/// External blob store consumed as a black box.
///
/// Two of the six providers hand back raw video bytes instead of a
/// hosted URL; those bytes go through this trait. One atomic call per
/// successful job - the orchestrator needs no partial-write semantics.
#[async_trait]
pub trait VideoStorage: Send + Sync {
    /// Stores the bytes and returns a retrievable URL.
    async fn store(&self, bytes: Vec<u8>, filename: &str, content_type: &str) -> Result<String>;
}

/// Builds the object filename for a stored video.
///
/// Keys are provider plus provider-assigned job id, so no two calls
/// write to the same logical key.
pub(crate) fn object_filename(provider: ProviderKind, job_id: &str) -> String {
    let safe_id: String = job_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    format!("{}-{}.mp4", provider.as_str(), safe_id)
}
