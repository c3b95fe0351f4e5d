//! Caller-supplied provider credentials.

use std::collections::HashMap;

use crate::types::ProviderKind;

/// The caller's per-provider secrets plus an optional preferred provider.
///
/// Supplied read-only at call time by the surrounding application; the
/// orchestrator never persists it. A missing or blank secret means that
/// provider is unusable for this call.
#[derive(Clone, Default)]
pub struct CredentialSet {
    secrets: HashMap<ProviderKind, String>,
    preferred: Option<ProviderKind>,
}

impl CredentialSet {
    /// Creates an empty credential set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a secret for the given provider.
    pub fn with_secret(mut self, provider: ProviderKind, secret: impl Into<String>) -> Self {
        self.secrets.insert(provider, secret.into());
        self
    }

    /// Marks a provider as preferred. It is tried first when usable.
    pub fn with_preferred(mut self, provider: ProviderKind) -> Self {
        self.preferred = Some(provider);
        self
    }

    /// Returns the preferred provider hint, if any.
    pub fn preferred(&self) -> Option<ProviderKind> {
        self.preferred
    }

    /// Returns the secret for a provider, if present and non-blank.
    pub fn secret_for(&self, provider: ProviderKind) -> Option<&str> {
        self.secrets
            .get(&provider)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Returns true if the provider has a usable secret.
    pub fn is_usable(&self, provider: ProviderKind) -> bool {
        self.secret_for(provider).is_some()
    }

    /// Returns true if no provider has a usable secret.
    pub fn is_empty(&self) -> bool {
        ProviderKind::ALL.iter().all(|k| !self.is_usable(*k))
    }
}

// Secrets stay out of logs: Debug shows which providers are configured,
// never the values.
impl std::fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let configured: Vec<&str> = ProviderKind::ALL
            .iter()
            .filter(|k| self.is_usable(**k))
            .map(|k| k.as_str())
            .collect();
        f.debug_struct("CredentialSet")
            .field("configured", &configured)
            .field("preferred", &self.preferred)
            .finish()
    }
}
