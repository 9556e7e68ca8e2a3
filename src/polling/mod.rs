//! Attempt-bounded, fixed-interval status polling.
//!
//! Every cycle sleeps for the policy interval, fetches one status payload
//! and counts exactly one attempt, so a task that finishes on cycle N
//! reports `attempts == N`. Fetch errors are transient: they are reported to
//! the observer and the cycle counts as pending.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::error::{ConfigError, ProviderError, TaskStateError};
use crate::core::traits::{PollObserver, StatusFetcher};
use crate::core::types::{
    AdapterContext, CanonicalStatus, FailureKind, GenerationTask, MediaKind, PollEvent,
};
use crate::registry::ProviderAdapter;
use crate::transport::HttpTransport;

pub const FAILURE_WITHOUT_DETAIL: &str = "provider reported failure without detail";
pub const SUCCESS_WITHOUT_URL: &str = "provider reported success without a result url";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(interval_ms: u64, max_attempts: u32) -> Self {
        Self {
            interval_ms,
            max_attempts,
        }
    }

    /// Default cadence for `media_kind`; longer renders poll less often.
    pub fn for_media_kind(media_kind: MediaKind) -> Self {
        match media_kind {
            MediaKind::Image => Self::new(3_000, 100),
            MediaKind::Video => Self::new(10_000, 90),
            MediaKind::Music => Self::new(5_000, 120),
            MediaKind::Speech => Self::new(2_000, 60),
            MediaKind::Slides => Self::new(5_000, 72),
        }
    }

    pub fn validate(&self, media_kind: MediaKind) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidPollPolicy {
                media_kind,
                reason: "max_attempts must be >= 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Polls `task` until it reaches a terminal state.
///
/// Returns the terminal task; the only error is a lifecycle violation, e.g.
/// a task that was never submitted or is already terminal.
pub async fn poll_task(
    mut task: GenerationTask,
    adapter: &ProviderAdapter,
    fetcher: &dyn StatusFetcher,
    policy: &PollPolicy,
    observer: &dyn PollObserver,
) -> Result<GenerationTask, TaskStateError> {
    task.ensure_pollable()?;
    let remote_task_id = task.remote_task_id().unwrap_or_default().to_string();

    loop {
        tokio::time::sleep(policy.interval()).await;
        let attempt = task.begin_attempt()?;

        let mut event = PollEvent {
            task_id: task.id().to_string(),
            remote_task_id: remote_task_id.clone(),
            family: adapter.family(),
            attempt,
            status: None,
            transport_error: None,
        };

        match fetcher.fetch_status(&remote_task_id).await {
            Ok(body) => {
                match adapter.normalize(&body).status {
                    CanonicalStatus::Succeeded => match adapter.extract(&body) {
                        Some(url) => task.succeed(url)?,
                        None => task.fail(FailureKind::ResultUrlMissing, SUCCESS_WITHOUT_URL)?,
                    },
                    CanonicalStatus::Failed => {
                        let detail = adapter
                            .failure_detail(&body)
                            .unwrap_or_else(|| FAILURE_WITHOUT_DETAIL.to_string());
                        task.fail(FailureKind::ProviderFailure, detail)?;
                    }
                    CanonicalStatus::Running => task.record_progress(CanonicalStatus::Running)?,
                    CanonicalStatus::Pending
                    | CanonicalStatus::Submitted
                    | CanonicalStatus::TimedOut => {
                        task.record_progress(CanonicalStatus::Pending)?
                    }
                }

                // Status after this cycle's transition.
                event.status = Some(task.status());
                observer.on_poll(&event);
                if task.is_terminal() {
                    return Ok(task);
                }
            }
            Err(error) => {
                event.transport_error = Some(error.to_string());
                observer.on_poll(&event);
            }
        }

        if attempt >= policy.max_attempts {
            task.fail(
                FailureKind::PollTimeout,
                format!("exceeded {} poll attempts", policy.max_attempts),
            )?;
            return Ok(task);
        }
    }
}

/// Default observer: one `tracing` event per cycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPollObserver;

impl PollObserver for TracingPollObserver {
    fn on_poll(&self, event: &PollEvent) {
        match (&event.transport_error, event.status) {
            (Some(error), _) => warn!(
                task_id = %event.task_id,
                remote_task_id = %event.remote_task_id,
                family = %event.family,
                attempt = event.attempt,
                error = %error,
                "status poll failed; counting cycle as pending"
            ),
            (None, Some(status)) if status.is_terminal() => info!(
                task_id = %event.task_id,
                remote_task_id = %event.remote_task_id,
                family = %event.family,
                attempt = event.attempt,
                status = %status,
                "generation task reached terminal status"
            ),
            (None, status) => debug!(
                task_id = %event.task_id,
                remote_task_id = %event.remote_task_id,
                family = %event.family,
                attempt = event.attempt,
                status = ?status,
                "generation task still in progress"
            ),
        }
    }
}

/// Fetches status payloads over HTTP with the adapter's status endpoint.
///
/// Client-error responses that carry a JSON object are returned as bodies so
/// the normalizer can read provider error payloads. Timeouts, throttling and
/// 5xx replies are transient errors whatever their body says.
pub struct HttpStatusFetcher<'a> {
    transport: &'a HttpTransport,
    adapter: &'a ProviderAdapter,
    bearer_token: Option<String>,
    ctx: &'a AdapterContext,
}

impl<'a> HttpStatusFetcher<'a> {
    pub fn new(
        transport: &'a HttpTransport,
        adapter: &'a ProviderAdapter,
        bearer_token: Option<String>,
        ctx: &'a AdapterContext,
    ) -> Self {
        Self {
            transport,
            adapter,
            bearer_token,
            ctx,
        }
    }
}

#[async_trait]
impl StatusFetcher for HttpStatusFetcher<'_> {
    async fn fetch_status(&self, remote_task_id: &str) -> Result<Value, ProviderError> {
        let url = self.adapter.status_url(remote_task_id)?;
        let reply = self
            .transport
            .get_json_reply(
                self.adapter.family(),
                &url,
                self.bearer_token.as_deref(),
                self.ctx,
            )
            .await?;

        if reply.is_success() {
            return Ok(reply.body);
        }

        if is_transient_status(reply.status_code) {
            return Err(ProviderError::Status {
                family: self.adapter.family(),
                model: None,
                status_code: reply.status_code,
                request_id: reply.request_id,
                message: reply.body.to_string(),
            });
        }

        debug!(
            family = %self.adapter.family(),
            remote_task_id,
            status_code = reply.status_code,
            "status endpoint returned an error object"
        );
        Ok(reply.body)
    }
}

/// Throttling and server-side outages say nothing about the job itself.
fn is_transient_status(status_code: u16) -> bool {
    matches!(status_code, 408 | 425 | 429 | 500..=599)
}
