use serde_json::Value;

use crate::core::error::ProviderError;
use crate::core::types::{GenerationRequest, MediaKind, ProviderFamily, StatusReading};

/// Where the remote task id goes on a status request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLocator {
    /// `GET <status_path>?<param>=<id>`
    Query(&'static str),
    /// `GET <status_path>/<id>`
    PathSegment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyEndpoints {
    pub default_base_url: &'static str,
    pub submit_path: &'static str,
    pub status_path: &'static str,
    pub status_locator: StatusLocator,
}

/// Crate-private translation contract implemented once per provider family.
///
/// `ProviderAdapter` is the registry-facing value; it owns the configured
/// base URL and credential and delegates every wire-shape decision here.
pub(crate) trait FamilyCodec: Send + Sync {
    fn family(&self) -> ProviderFamily;

    fn endpoints(&self) -> FamilyEndpoints;

    /// Environment variables consulted for the bearer token, in order.
    fn credential_env(&self) -> &'static [&'static str];

    /// Submission path for `model_id`; most families use one endpoint.
    fn submit_path(&self, _model_id: &str, _media_kind: MediaKind) -> String {
        self.endpoints().submit_path.to_string()
    }

    /// Translates generic user input into the family's request body.
    fn build_payload(
        &self,
        model_id: &str,
        media_kind: MediaKind,
        request: &GenerationRequest,
    ) -> Result<Value, ProviderError>;

    /// Reads the remote task id from a submission response, or explains why
    /// the submission was rejected.
    fn remote_task_id(&self, body: &Value) -> Result<String, String>;

    /// Collapses the family's status signals into a canonical reading.
    fn normalize(&self, body: &Value) -> StatusReading;

    /// Locates the artifact URL in a finished status payload.
    fn extract(&self, body: &Value) -> Option<String>;

    /// Provider-supplied explanation of a failed job.
    fn failure_detail(&self, body: &Value) -> Option<String>;
}
