use serde_json::{Map, Value};

use crate::core::error::ProviderError;
use crate::core::types::{GenerationRequest, ProviderFamily};

pub(crate) fn protocol_error(
    family: ProviderFamily,
    model_id: &str,
    message: impl Into<String>,
) -> ProviderError {
    ProviderError::Protocol {
        family,
        model: Some(model_id.to_string()),
        request_id: None,
        message: message.into(),
    }
}

pub(crate) fn require_prompt<'a>(
    family: ProviderFamily,
    model_id: &str,
    request: &'a GenerationRequest,
) -> Result<&'a str, ProviderError> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(protocol_error(family, model_id, "empty prompt"));
    }
    Ok(prompt)
}

/// Rejects a duration outside `allowed`, when one was requested.
pub(crate) fn check_duration(
    family: ProviderFamily,
    model_id: &str,
    request: &GenerationRequest,
    allowed: &[u32],
) -> Result<Option<u32>, ProviderError> {
    match request.options.duration_seconds {
        Some(duration) if !allowed.contains(&duration) => Err(protocol_error(
            family,
            model_id,
            format!(
                "unsupported duration {duration}s; expected one of {}",
                allowed
                    .iter()
                    .map(|value| format!("{value}s"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )),
        other => Ok(other),
    }
}

/// Inserts `value` under `key` when present.
pub(crate) fn insert_opt<T: Into<Value>>(body: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        body.insert(key.to_string(), value.into());
    }
}

/// Merges caller-supplied passthrough fields; they override builder output.
pub(crate) fn merge_extra(body: &mut Map<String, Value>, request: &GenerationRequest) {
    for (key, value) in &request.options.extra {
        body.insert(key.clone(), value.clone());
    }
}
