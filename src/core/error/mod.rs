use crate::core::types::{CanonicalStatus, MediaKind, ProviderFamily};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid timeout: {timeout_ms} ms")]
    InvalidTimeout { timeout_ms: u64 },
    #[error("invalid poll policy for {media_kind}: {reason}")]
    InvalidPollPolicy {
        media_kind: MediaKind,
        reason: String,
    },
    #[error("invalid base url for {family}: {reason}")]
    InvalidBaseUrl {
        family: ProviderFamily,
        reason: String,
    },
    #[error("invalid model route for {media_kind}: {reason}")]
    InvalidRoute {
        media_kind: MediaKind,
        reason: String,
    },
    #[error("unknown media kind: {value}")]
    UnknownMediaKind { value: String },
    #[error("unknown provider family: {value}")]
    UnknownProviderFamily { value: String },
}

/// Transport and adapter level failures for a single HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error(
        "provider transport error{context}: {message}",
        context = format_context(Some(.family), None, None, .request_id.as_deref(), None)
    )]
    Transport {
        family: ProviderFamily,
        request_id: Option<String>,
        message: String,
    },
    #[error(
        "provider status error{context}: {message}",
        context = format_context(
            Some(.family),
            .model.as_deref(),
            None,
            .request_id.as_deref(),
            Some(*.status_code)
        )
    )]
    Status {
        family: ProviderFamily,
        model: Option<String>,
        status_code: u16,
        request_id: Option<String>,
        message: String,
    },
    #[error(
        "provider protocol error{context}: {message}",
        context = format_context(
            Some(.family),
            .model.as_deref(),
            None,
            .request_id.as_deref(),
            None
        )
    )]
    Protocol {
        family: ProviderFamily,
        model: Option<String>,
        request_id: Option<String>,
        message: String,
    },
    #[error(
        "provider serialization error{context}: {message}",
        context = format_context(
            Some(.family),
            .model.as_deref(),
            None,
            .request_id.as_deref(),
            None
        )
    )]
    Serialization {
        family: ProviderFamily,
        model: Option<String>,
        request_id: Option<String>,
        message: String,
    },
}

impl ProviderError {
    pub fn family(&self) -> ProviderFamily {
        match self {
            Self::Transport { family, .. }
            | Self::Status { family, .. }
            | Self::Protocol { family, .. }
            | Self::Serialization { family, .. } => *family,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message, .. }
            | Self::Status { message, .. }
            | Self::Protocol { message, .. }
            | Self::Serialization { message, .. } => message,
        }
    }
}

/// Violations of the task lifecycle invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskStateError {
    #[error("task {task_id} is already terminal ({status})")]
    AlreadyTerminal {
        task_id: String,
        status: CanonicalStatus,
    },
    #[error("task {task_id} is not terminal ({status})")]
    NotTerminal {
        task_id: String,
        status: CanonicalStatus,
    },
    #[error("task {task_id} already has a remote task id")]
    RemoteTaskIdAlreadyAssigned { task_id: String },
    #[error("task {task_id} has no remote task id")]
    MissingRemoteTaskId { task_id: String },
    #[error("task {task_id} cannot move from {from} to {to}")]
    InvalidTransition {
        task_id: String,
        from: CanonicalStatus,
        to: CanonicalStatus,
    },
    #[error("task {task_id} rejected empty {field}")]
    EmptyValue {
        task_id: String,
        field: &'static str,
    },
}

/// Terminal outcomes surfaced by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("unknown model [media_kind={media_kind}, model={model}]")]
    UnknownModel { media_kind: MediaKind, model: String },
    #[error(
        "submission rejected{context}: {message}",
        context = format_context(Some(.family), Some(.model.as_str()), None, None, *.status_code)
    )]
    SubmissionError {
        family: ProviderFamily,
        model: String,
        status_code: Option<u16>,
        message: String,
    },
    #[error(
        "provider reported failure{context}: {message}",
        context = format_context(Some(.family), None, Some((.task_id.as_str(), .remote_task_id.as_str())), None, None)
    )]
    ProviderFailure {
        family: ProviderFamily,
        task_id: String,
        remote_task_id: String,
        message: String,
    },
    #[error(
        "provider reported success without a result url{context}",
        context = format_context(Some(.family), None, Some((.task_id.as_str(), .remote_task_id.as_str())), None, None)
    )]
    ResultUrlMissing {
        family: ProviderFamily,
        task_id: String,
        remote_task_id: String,
    },
    #[error(
        "poll timeout after {attempts} attempts{context}",
        context = format_context(Some(.family), None, Some((.task_id.as_str(), .remote_task_id.as_str())), None, None)
    )]
    PollTimeout {
        family: ProviderFamily,
        task_id: String,
        remote_task_id: String,
        attempts: u32,
    },
    #[error(transparent)]
    TaskState(#[from] TaskStateError),
}

impl GenerationError {
    pub fn submission(error: ProviderError, model: &str) -> Self {
        Self::SubmissionError {
            family: error.family(),
            model: model.to_string(),
            status_code: error.status_code(),
            message: error.message().to_string(),
        }
    }

    /// Whether an end user retrying the same request could plausibly succeed.
    pub fn is_user_retryable(&self) -> bool {
        matches!(self, Self::PollTimeout { .. })
            || matches!(
                self,
                Self::SubmissionError {
                    status_code: Some(429 | 500..=599),
                    ..
                }
            )
    }
}

fn format_context(
    family: Option<&ProviderFamily>,
    model: Option<&str>,
    task: Option<(&str, &str)>,
    request_id: Option<&str>,
    status_code: Option<u16>,
) -> String {
    let mut context = Vec::new();

    if let Some(family) = family {
        context.push(format!("family={family}"));
    }
    if let Some(model) = model {
        context.push(format!("model={model}"));
    }
    if let Some((task_id, remote_task_id)) = task {
        context.push(format!("task_id={task_id}"));
        if !remote_task_id.is_empty() {
            context.push(format!("remote_task_id={remote_task_id}"));
        }
    }
    if let Some(request_id) = request_id {
        context.push(format!("request_id={request_id}"));
    }
    if let Some(status_code) = status_code {
        context.push(format!("status_code={status_code}"));
    }

    if context.is_empty() {
        String::new()
    } else {
        format!(" [{}]", context.join(", "))
    }
}
