//! Provider adapters.
//!
//! One module per provider, each owning that provider's wire protocol
//! behind the uniform [`ProviderAdapter`](crate::provider::ProviderAdapter)
//! contract.

mod fal;
mod huggingface;
mod luma;
mod replicate;
mod runway;
mod sora;

pub use fal::FalAdapter;
pub use huggingface::HuggingFaceAdapter;
pub use luma::LumaAdapter;
pub use replicate::ReplicateAdapter;
pub use runway::RunwayAdapter;
pub use sora::SoraAdapter;

use std::sync::Arc;

use crate::provider::ProviderAdapter;

/// Builds the full adapter set, one per catalog entry, sharing one
/// HTTP client.
pub(crate) fn default_adapters(client: &reqwest::Client) -> Vec<Arc<dyn ProviderAdapter>> {
    vec![
        Arc::new(RunwayAdapter::new(client.clone())),
        Arc::new(SoraAdapter::new(client.clone())),
        Arc::new(ReplicateAdapter::new(client.clone())),
        Arc::new(FalAdapter::new(client.clone())),
        Arc::new(LumaAdapter::new(client.clone())),
        Arc::new(HuggingFaceAdapter::new(client.clone())),
    ]
}
