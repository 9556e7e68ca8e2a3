use async_trait::async_trait;
use serde_json::Value;

use crate::core::error::ProviderError;
use crate::core::types::PollEvent;

/// Source of raw status payloads for one submitted task.
///
/// The polling engine only depends on this seam, so the HTTP client can be
/// replaced by scripted responses in tests or by a different transport.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    /// Fetches the current status payload for `remote_task_id`.
    ///
    /// An `Err` is treated as a transient failure of this cycle only.
    async fn fetch_status(&self, remote_task_id: &str) -> Result<Value, ProviderError>;
}

/// Consumer of per-cycle poll events.
pub trait PollObserver: Send + Sync {
    fn on_poll(&self, event: &PollEvent);
}
