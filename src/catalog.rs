//! Static provider catalog.
//!
//! One read-only entry per supported provider: identity, display name,
//! fallback priority, and the credential-format hint surfaced to users
//! configuring their own keys.

use crate::types::ProviderKind;

/// Static metadata about one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderInfo {
    /// Provider identity.
    pub kind: ProviderKind,
    /// Human-facing display name.
    pub display_name: &'static str,
    /// Fallback priority rank; lower is tried first.
    pub priority: u8,
    /// Hint about what the credential looks like.
    pub credential_hint: &'static str,
    /// Short human-facing description.
    pub description: &'static str,
}

/// The full provider catalog, ordered by priority.
pub const CATALOG: [ProviderInfo; 6] = [
    ProviderInfo {
        kind: ProviderKind::Runway,
        display_name: "Runway",
        priority: 0,
        credential_hint: "API key from dev.runwayml.com (key_...)",
        description: "Gen-3 Alpha Turbo image-to-video generation",
    },
    ProviderInfo {
        kind: ProviderKind::Sora,
        display_name: "Sora (OpenAI)",
        priority: 1,
        credential_hint: "OpenAI API key (sk-...)",
        description: "Sora text-to-video, downloaded as an MP4 stream",
    },
    ProviderInfo {
        kind: ProviderKind::Replicate,
        display_name: "Replicate",
        priority: 2,
        credential_hint: "Replicate API token (r8_...)",
        description: "Open video models via the predictions API",
    },
    ProviderInfo {
        kind: ProviderKind::Fal,
        display_name: "fal.ai",
        priority: 3,
        credential_hint: "fal.ai key (key_id:key_secret)",
        description: "Hosted video models behind fal.ai's queue API",
    },
    ProviderInfo {
        kind: ProviderKind::Luma,
        display_name: "Luma Dream Machine",
        priority: 4,
        credential_hint: "Luma API key (luma-...)",
        description: "Dream Machine text- and image-to-video generation",
    },
    ProviderInfo {
        kind: ProviderKind::HuggingFace,
        display_name: "Hugging Face",
        priority: 5,
        credential_hint: "Hugging Face access token (hf_...)",
        description: "Free-tier synchronous inference, slowest of the set",
    },
];

impl ProviderKind {
    /// Returns the catalog entry for this provider.
    pub fn info(&self) -> &'static ProviderInfo {
        // CATALOG is ordered by ALL, so position lookup cannot fail.
        &CATALOG[ProviderKind::ALL
            .iter()
            .position(|k| k == self)
            .unwrap_or(0)]
    }

    /// Returns the human-facing display name for this provider.
    pub fn display_name(&self) -> &'static str {
        self.info().display_name
    }
}
