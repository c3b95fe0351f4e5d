#![warn(missing_docs)]
//! SceneGen - provider-agnostic BYOK video generation.
//!
//! Callers bring their own credentials for up to six third-party video
//! generation services. One call selects a usable provider, submits the
//! job, polls it to completion under a deadline, and normalizes the
//! result; on failure the same request is retried against the remaining
//! credentialed providers in priority order.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use scenegen::{
//!     AspectRatio, CredentialSet, GenerationRequest, Orchestrator, ProviderKind, VideoStorage,
//! };
//!
//! # struct MyBlobStore;
//! # #[async_trait::async_trait]
//! # impl VideoStorage for MyBlobStore {
//! #     async fn store(&self, _: Vec<u8>, _: &str, _: &str) -> scenegen::Result<String> {
//! #         Ok("https://example.com/v.mp4".into())
//! #     }
//! # }
//! #[tokio::main]
//! async fn main() -> scenegen::Result<()> {
//!     let orchestrator = Orchestrator::builder()
//!         .storage(Arc::new(MyBlobStore))
//!         .build()?;
//!
//!     let credentials = CredentialSet::new()
//!         .with_secret(ProviderKind::Luma, "luma-...")
//!         .with_secret(ProviderKind::Fal, "key_id:key_secret")
//!         .with_preferred(ProviderKind::Fal);
//!
//!     let request = GenerationRequest::new("A crane lifting off a misty lake")
//!         .with_duration(5)
//!         .with_aspect_ratio(AspectRatio::Landscape);
//!
//!     let result = orchestrator.generate(&credentials, &request).await?;
//!     println!("{} -> {}", result.provider, result.video_url);
//!     Ok(())
//! }
//! ```
//!
//! # Providers
//!
//! Fixed fallback priority order:
//! - Runway (task-based, image-conditioned)
//! - Sora (OpenAI, binary download)
//! - Replicate (predictions API)
//! - fal.ai (queue API)
//! - Luma Dream Machine
//! - Hugging Face Inference API (free tier, binary)
//!
//! Credentials are supplied per call and never persisted or logged.

mod catalog;
mod credentials;
mod error;
mod normalize;
mod orchestrator;
mod poll;
mod provider;
pub mod providers;
mod select;
mod storage;
mod types;

pub use catalog::{ProviderInfo, CATALOG};
pub use credentials::CredentialSet;
pub use error::{Result, SceneGenError};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use poll::PollConfig;
pub use provider::ProviderAdapter;
pub use select::select_provider;
pub use storage::VideoStorage;
pub use types::{
    AspectRatio, GenerationRequest, GenerationResult, JobHandle, JobStatus, ProviderKind,
    Resolution, VideoPayload,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::credentials::CredentialSet;
    pub use crate::error::{Result, SceneGenError};
    pub use crate::orchestrator::Orchestrator;
    pub use crate::storage::VideoStorage;
    pub use crate::types::{
        AspectRatio, GenerationRequest, GenerationResult, ProviderKind, Resolution,
    };
}
