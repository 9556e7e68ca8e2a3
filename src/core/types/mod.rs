use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{ConfigError, GenerationError, TaskStateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Music,
    Speech,
    Slides,
}

impl MediaKind {
    pub const ALL: [MediaKind; 5] = [
        MediaKind::Image,
        MediaKind::Video,
        MediaKind::Music,
        MediaKind::Speech,
        MediaKind::Slides,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Music => "music",
            Self::Speech => "speech",
            Self::Slides => "slides",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownMediaKind {
                value: value.to_string(),
            })
    }
}

/// Adapter family: the shared submission, status and result shape of one
/// generation backend (or a few near-identical ones).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderFamily {
    FluxStyle,
    GptImageStyle,
    MidjourneyStyle,
    JobsGeneric,
    VeoStyle,
    RunwayStyle,
    SunoStyle,
    KlingStyle,
    LumaStyle,
    ReplicateStyle,
    SlidesStyle,
}

impl ProviderFamily {
    pub const ALL: [ProviderFamily; 11] = [
        ProviderFamily::FluxStyle,
        ProviderFamily::GptImageStyle,
        ProviderFamily::MidjourneyStyle,
        ProviderFamily::JobsGeneric,
        ProviderFamily::VeoStyle,
        ProviderFamily::RunwayStyle,
        ProviderFamily::SunoStyle,
        ProviderFamily::KlingStyle,
        ProviderFamily::LumaStyle,
        ProviderFamily::ReplicateStyle,
        ProviderFamily::SlidesStyle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FluxStyle => "flux-style",
            Self::GptImageStyle => "gpt-image-style",
            Self::MidjourneyStyle => "midjourney-style",
            Self::JobsGeneric => "jobs-generic",
            Self::VeoStyle => "veo-style",
            Self::RunwayStyle => "runway-style",
            Self::SunoStyle => "suno-style",
            Self::KlingStyle => "kling-style",
            Self::LumaStyle => "luma-style",
            Self::ReplicateStyle => "replicate-style",
            Self::SlidesStyle => "slides-style",
        }
    }
}

impl fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderFamily {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|family| family.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownProviderFamily {
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalStatus {
    Submitted,
    Pending,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl CanonicalStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::TimedOut)
    }

    pub fn is_in_progress(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Submitted => "SUBMITTED",
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMED_OUT",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ProviderFailure,
    ResultUrlMissing,
    PollTimeout,
}

/// Generic user input, translated into a provider body by the adapter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub options: GenerationOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options: GenerationOptions::default(),
            correlation_id: None,
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrumental: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    /// Provider-specific fields merged into the request body last.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Result of running a family normalizer over one status payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReading {
    pub status: CanonicalStatus,
    pub success_signal: Option<String>,
    pub failure_signal: Option<String>,
}

/// Structured record of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollEvent {
    pub task_id: String,
    pub remote_task_id: String,
    pub family: ProviderFamily,
    pub attempt: u32,
    pub status: Option<CanonicalStatus>,
    pub transport_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AdapterContext {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// One request/response cycle with a provider.
///
/// Fields are only reachable through accessors; every mutation goes through a
/// transition method that rejects moves out of a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationTask {
    id: String,
    media_kind: MediaKind,
    provider_family: ProviderFamily,
    model_id: String,
    remote_task_id: Option<String>,
    status: CanonicalStatus,
    attempts: u32,
    result_url: Option<String>,
    error_detail: Option<String>,
    failure_kind: Option<FailureKind>,
}

impl GenerationTask {
    pub fn new(
        id: impl Into<String>,
        media_kind: MediaKind,
        provider_family: ProviderFamily,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            media_kind,
            provider_family,
            model_id: model_id.into(),
            remote_task_id: None,
            status: CanonicalStatus::Submitted,
            attempts: 0,
            result_url: None,
            error_detail: None,
            failure_kind: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    pub fn provider_family(&self) -> ProviderFamily {
        self.provider_family
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn remote_task_id(&self) -> Option<&str> {
        self.remote_task_id.as_deref()
    }

    pub fn status(&self) -> CanonicalStatus {
        self.status
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn result_url(&self) -> Option<&str> {
        self.result_url.as_deref()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure_kind
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn assign_remote_task_id(
        &mut self,
        remote_task_id: impl Into<String>,
    ) -> Result<(), TaskStateError> {
        self.ensure_not_terminal()?;
        if self.remote_task_id.is_some() {
            return Err(TaskStateError::RemoteTaskIdAlreadyAssigned {
                task_id: self.id.clone(),
            });
        }

        let remote_task_id = remote_task_id.into();
        if remote_task_id.trim().is_empty() {
            return Err(TaskStateError::EmptyValue {
                task_id: self.id.clone(),
                field: "remote_task_id",
            });
        }

        self.remote_task_id = Some(remote_task_id);
        Ok(())
    }

    /// Counts one poll cycle and returns the new attempt number.
    pub fn begin_attempt(&mut self) -> Result<u32, TaskStateError> {
        self.ensure_pollable()?;
        self.attempts = self.attempts.saturating_add(1);
        Ok(self.attempts)
    }

    pub fn record_progress(&mut self, status: CanonicalStatus) -> Result<(), TaskStateError> {
        self.ensure_not_terminal()?;
        if !status.is_in_progress() {
            return Err(TaskStateError::InvalidTransition {
                task_id: self.id.clone(),
                from: self.status,
                to: status,
            });
        }

        self.status = status;
        Ok(())
    }

    pub fn succeed(&mut self, result_url: impl Into<String>) -> Result<(), TaskStateError> {
        self.ensure_not_terminal()?;
        let result_url = result_url.into();
        if result_url.trim().is_empty() {
            return Err(TaskStateError::EmptyValue {
                task_id: self.id.clone(),
                field: "result_url",
            });
        }

        self.status = CanonicalStatus::Succeeded;
        self.result_url = Some(result_url);
        Ok(())
    }

    pub fn fail(
        &mut self,
        kind: FailureKind,
        detail: impl Into<String>,
    ) -> Result<(), TaskStateError> {
        self.ensure_not_terminal()?;
        let next = match kind {
            FailureKind::PollTimeout => CanonicalStatus::TimedOut,
            FailureKind::ProviderFailure | FailureKind::ResultUrlMissing => {
                CanonicalStatus::Failed
            }
        };

        self.status = next;
        self.failure_kind = Some(kind);
        self.error_detail = Some(detail.into());
        Ok(())
    }

    /// Converts a terminal task into the caller-facing result.
    pub fn into_artifact(self) -> Result<String, GenerationError> {
        let remote_task_id = self.remote_task_id.clone().unwrap_or_default();

        match (self.status, self.result_url, self.failure_kind) {
            (CanonicalStatus::Succeeded, Some(url), _) => Ok(url),
            (CanonicalStatus::Failed, _, Some(FailureKind::ResultUrlMissing)) => {
                Err(GenerationError::ResultUrlMissing {
                    family: self.provider_family,
                    task_id: self.id,
                    remote_task_id,
                })
            }
            (CanonicalStatus::Failed, _, _) => Err(GenerationError::ProviderFailure {
                family: self.provider_family,
                task_id: self.id,
                remote_task_id,
                message: self.error_detail.unwrap_or_default(),
            }),
            (CanonicalStatus::TimedOut, _, _) => Err(GenerationError::PollTimeout {
                family: self.provider_family,
                task_id: self.id,
                remote_task_id,
                attempts: self.attempts,
            }),
            (status, _, _) => Err(GenerationError::TaskState(TaskStateError::NotTerminal {
                task_id: self.id,
                status,
            })),
        }
    }

    pub(crate) fn ensure_pollable(&self) -> Result<(), TaskStateError> {
        self.ensure_not_terminal()?;
        if self.remote_task_id.is_none() {
            return Err(TaskStateError::MissingRemoteTaskId {
                task_id: self.id.clone(),
            });
        }
        Ok(())
    }

    fn ensure_not_terminal(&self) -> Result<(), TaskStateError> {
        if self.status.is_terminal() {
            return Err(TaskStateError::AlreadyTerminal {
                task_id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }
}
