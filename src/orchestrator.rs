//! Fallback orchestration.
//!
//! The subsystem's single public entry point: select a provider, run
//! its submit+poll pipeline, normalize on success, and on failure move
//! to the next credentialed provider in priority order.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::credentials::CredentialSet;
use crate::error::{Result, SceneGenError};
use crate::normalize::normalize;
use crate::poll::{poll_to_completion, PollConfig};
use crate::provider::ProviderAdapter;
use crate::providers::default_adapters;
use crate::select::select_provider;
use crate::storage::VideoStorage;
use crate::types::{GenerationRequest, GenerationResult, ProviderKind};

/// Builder for [`Orchestrator`].
#[derive(Default)]
pub struct OrchestratorBuilder {
    http_client: Option<reqwest::Client>,
    storage: Option<Arc<dyn VideoStorage>>,
    adapters: Option<Vec<Arc<dyn ProviderAdapter>>>,
    poll: PollConfig,
}

impl OrchestratorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP client shared by the default adapters.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the blob storage collaborator. Required - two providers
    /// return raw bytes that have nowhere else to go.
    pub fn storage(mut self, storage: Arc<dyn VideoStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Replaces the default adapter set. Used to inject fakes in tests.
    pub fn adapters(mut self, adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        self.adapters = Some(adapters);
        self
    }

    /// Sets the polling interval between status checks.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll.interval = interval;
        self
    }

    /// Sets the per-provider wall-clock deadline.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.poll.deadline = deadline;
        self
    }

    /// Builds the orchestrator.
    pub fn build(self) -> Result<Orchestrator> {
        let storage = self.storage.ok_or_else(|| {
            SceneGenError::Storage("no blob storage configured".into())
        })?;
        let client = self.http_client.unwrap_or_default();
        let adapters = self.adapters.unwrap_or_else(|| default_adapters(&client));

        Ok(Orchestrator {
            adapters,
            storage,
            poll: self.poll,
        })
    }
}

/// Provider-agnostic video generation orchestrator.
///
/// Each [`generate`](Orchestrator::generate) call is an independent
/// unit of work over caller-owned values; concurrent calls share
/// nothing but the HTTP client and the blob store.
pub struct Orchestrator {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    storage: Arc<dyn VideoStorage>,
    poll: PollConfig,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("adapters", &self.adapters.len())
            .field("poll", &self.poll)
            .finish()
    }
}

impl Orchestrator {
    /// Creates a new [`OrchestratorBuilder`].
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    fn adapter_for(&self, kind: ProviderKind) -> Option<&dyn ProviderAdapter> {
        self.adapters
            .iter()
            .find(|a| a.kind() == kind)
            .map(|a| a.as_ref())
    }

    /// Generates a video, falling back across credentialed providers.
    ///
    /// Exactly one provider is active at a time - fallback is
    /// sequential, never raced, so the caller's external accounts are
    /// never double-billed for one request. Returns
    /// [`SceneGenError::NoProviderConfigured`] without any network
    /// traffic when the credential set is empty, and
    /// [`SceneGenError::AllProvidersExhausted`] once every credentialed
    /// provider has failed.
    pub async fn generate(
        &self,
        credentials: &CredentialSet,
        request: &GenerationRequest,
    ) -> Result<GenerationResult> {
        if request.prompt.trim().is_empty() {
            return Err(SceneGenError::InvalidRequest("prompt must not be empty".into()));
        }

        let mut excluded: HashSet<ProviderKind> = HashSet::new();

        let Some(mut current) = select_provider(credentials, &excluded) else {
            return Err(SceneGenError::NoProviderConfigured);
        };

        let mut attempted = 0usize;
        loop {
            attempted += 1;
            tracing::debug!(provider = %current, attempt = attempted, "attempting video generation");

            match self.attempt(current, credentials, request).await {
                Ok(result) => return Ok(result),
                // Storage is shared by every provider; regenerating
                // elsewhere would bill the caller again and hit the
                // same store.
                Err(e @ SceneGenError::Storage(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        provider = %current,
                        "provider attempt failed, moving to fallback: {e}"
                    );
                    excluded.insert(current);
                    match select_provider(credentials, &excluded) {
                        Some(next) => current = next,
                        None => {
                            return Err(SceneGenError::AllProvidersExhausted {
                                attempted,
                                last: e.to_string(),
                            });
                        }
                    }
                }
            }
        }
    }

    async fn attempt(
        &self,
        kind: ProviderKind,
        credentials: &CredentialSet,
        request: &GenerationRequest,
    ) -> Result<GenerationResult> {
        let adapter = self.adapter_for(kind).ok_or_else(|| {
            SceneGenError::UnexpectedResponse(format!("no adapter registered for {kind}"))
        })?;
        let secret = credentials
            .secret_for(kind)
            .ok_or_else(|| SceneGenError::Auth(format!("no credential for {kind}")))?;

        adapter.preflight(request)?;
        let handle = adapter.submit(secret, request).await?;
        let payload = poll_to_completion(adapter, secret, request, &handle, &self.poll).await?;

        normalize(
            kind,
            payload,
            Some(handle.job_id),
            request.duration_secs,
            self.storage.as_ref(),
        )
        .await
    }
}
