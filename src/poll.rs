//! Generic fixed-interval poll loop.
//!
//! Drives any adapter's `poll_once` to a terminal state under a hard
//! wall-clock deadline. The loop owns no provider-specific knowledge
//! and is shared verbatim by all six adapters.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Result, SceneGenError};
use crate::provider::ProviderAdapter;
use crate::types::{GenerationRequest, JobHandle, JobStatus, VideoPayload};

/// Poll loop timing knobs.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Flat pause between status checks. No backoff - the providers all
    /// report seconds-to-minutes completion times, so a bounded total
    /// wall-clock cost beats adaptive pacing.
    pub interval: Duration,
    /// Hard wall-clock budget for one provider attempt.
    pub deadline: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            deadline: Duration::from_secs(600),
        }
    }
}

/// Poll loop states. SUBMITTED and POLLING are the only non-terminal ones.
enum PollState {
    Submitted,
    Polling,
    Succeeded(VideoPayload),
    Failed(String),
    TimedOut,
}

/// Polls a submitted job to completion.
///
/// Transport-level errors on a single tick are absorbed as "still
/// pending" - only an explicit provider-reported failure, a non-transport
/// error, or the deadline terminates the loop. Terminates within
/// `deadline + interval` on every path.
pub async fn poll_to_completion(
    adapter: &dyn ProviderAdapter,
    secret: &str,
    request: &GenerationRequest,
    handle: &JobHandle,
    config: &PollConfig,
) -> Result<VideoPayload> {
    let start = Instant::now();
    let mut state = PollState::Submitted;

    loop {
        state = match state {
            PollState::Submitted => {
                tokio::time::sleep(config.interval).await;
                PollState::Polling
            }
            PollState::Polling => {
                if start.elapsed() >= config.deadline {
                    PollState::TimedOut
                } else {
                    match adapter.poll_once(secret, request, handle).await {
                        Ok(JobStatus::Pending) => {
                            tracing::debug!(
                                provider = %handle.provider,
                                job_id = %handle.job_id,
                                elapsed_secs = start.elapsed().as_secs(),
                                "generation still pending"
                            );
                            tokio::time::sleep(config.interval).await;
                            PollState::Polling
                        }
                        Ok(JobStatus::Succeeded(payload)) => PollState::Succeeded(payload),
                        Ok(JobStatus::Failed(message)) => PollState::Failed(message),
                        Err(e) if e.is_transport() => {
                            tracing::warn!(
                                provider = %handle.provider,
                                job_id = %handle.job_id,
                                "transport error on poll tick, treating as pending: {e}"
                            );
                            tokio::time::sleep(config.interval).await;
                            PollState::Polling
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
            PollState::Succeeded(payload) => return Ok(payload),
            PollState::Failed(message) => return Err(SceneGenError::Job(message)),
            PollState::TimedOut => return Err(SceneGenError::Timeout(config.deadline)),
        };
    }
}
