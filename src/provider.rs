//! Provider adapter trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{GenerationRequest, JobHandle, JobStatus, ProviderKind};

/// Uniform contract implemented by each provider adapter.
///
/// An adapter owns exactly one provider's wire protocol: how the
/// canonical request maps onto that provider's submit shape, and how
/// that provider's status payloads map back onto [`JobStatus`]. It
/// holds no credentials - the caller's secret is passed per call.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Returns the provider this adapter speaks for.
    fn kind(&self) -> ProviderKind;

    /// Validates the request against this provider's constraints before
    /// any network traffic.
    ///
    /// The default accepts everything; adapters override it to reject
    /// requests they cannot represent or to flag known divergences.
    fn preflight(&self, _request: &GenerationRequest) -> Result<()> {
        Ok(())
    }

    /// Submits the generation job. A non-success response is terminal
    /// for this provider - no retry happens inside submit.
    async fn submit(&self, secret: &str, request: &GenerationRequest) -> Result<JobHandle>;

    /// Checks the job once and reports its current status.
    ///
    /// Success payloads are surfaced raw ([`JobStatus::Succeeded`]);
    /// normalization happens in one place downstream. The original
    /// request rides along because the synchronous free-tier provider
    /// performs its actual inference call inside the tick.
    async fn poll_once(
        &self,
        secret: &str,
        request: &GenerationRequest,
        handle: &JobHandle,
    ) -> Result<JobStatus>;

    /// Returns the human-facing display name for this adapter's provider.
    fn name(&self) -> &'static str {
        self.kind().display_name()
    }
}
