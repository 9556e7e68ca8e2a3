//! Evidence collection shared by the family normalizers.
//!
//! A normalizer records every success, failure and progress signal it can
//! find, then `Evidence::into_reading` applies one precedence rule for all
//! families: failure beats success, success beats progress.

use serde_json::Value;

use crate::core::types::{CanonicalStatus, StatusReading};
use crate::payload::{self, PayloadPath, json_path};

/// Success code of the `{code, msg, data}` envelope used by hosted families.
pub(crate) const ENVELOPE_OK: i64 = 200;

const ENVELOPE_CODE: PayloadPath = json_path!("code");
const ENVELOPE_MESSAGES: &[PayloadPath] = &[json_path!("msg"), json_path!("message")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WordClass {
    Success,
    Failure,
    Running,
    Pending,
}

/// Shared status vocabulary. Families with stage words that would be
/// misread here (e.g. `text_success`) classify those before falling back.
pub(crate) fn classify_word(word: &str) -> Option<WordClass> {
    let word = word.trim().to_ascii_lowercase();
    match word.as_str() {
        "success" | "succeeded" | "succeed" | "successful" | "completed" | "complete"
        | "done" | "finished" => Some(WordClass::Success),
        "fail" | "failed" | "failure" | "error" | "errored" | "canceled" | "cancelled"
        | "rejected" | "expired" => Some(WordClass::Failure),
        "running" | "processing" | "generating" | "in_progress" | "dreaming" | "rendering"
        | "started" => Some(WordClass::Running),
        "pending" | "queued" | "queuing" | "queueing" | "in_queue" | "waiting" | "wait"
        | "submitted" | "starting" | "created" => Some(WordClass::Pending),
        other
            if other.ends_with("_failed")
                || other.ends_with("_fail")
                || other.ends_with("_error")
                || other.ends_with("_exception") =>
        {
            Some(WordClass::Failure)
        }
        _ => None,
    }
}

#[derive(Debug, Default)]
pub(crate) struct Evidence {
    success: Option<String>,
    failure: Option<String>,
    running: Option<String>,
}

impl Evidence {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn success(&mut self, signal: impl Into<String>) {
        self.success.get_or_insert_with(|| signal.into());
    }

    pub(crate) fn failure(&mut self, signal: impl Into<String>) {
        self.failure.get_or_insert_with(|| signal.into());
    }

    pub(crate) fn running(&mut self, signal: impl Into<String>) {
        self.running.get_or_insert_with(|| signal.into());
    }

    /// Records a status word under `field` using the shared vocabulary.
    pub(crate) fn word(&mut self, field: &str, word: &str) {
        self.classified(field, word, classify_word(word));
    }

    pub(crate) fn classified(&mut self, field: &str, word: &str, class: Option<WordClass>) {
        let signal = format!("{field}={word}");
        match class {
            Some(WordClass::Success) => self.success(signal),
            Some(WordClass::Failure) => self.failure(signal),
            Some(WordClass::Running) => self.running(signal),
            Some(WordClass::Pending) | None => {}
        }
    }

    /// A result-like field is weak evidence of success on its own.
    pub(crate) fn result_present(&mut self, url: Option<String>) {
        if let Some(url) = url {
            self.success(format!("result={url}"));
        }
    }

    /// An explicit error message or code is failure evidence.
    pub(crate) fn error_field(&mut self, field: &str, value: Option<String>) {
        if let Some(value) = value {
            self.failure(format!("{field}={value}"));
        }
    }

    pub(crate) fn into_reading(self) -> StatusReading {
        let status = if self.failure.is_some() {
            CanonicalStatus::Failed
        } else if self.success.is_some() {
            CanonicalStatus::Succeeded
        } else if self.running.is_some() {
            CanonicalStatus::Running
        } else {
            CanonicalStatus::Pending
        };

        StatusReading {
            status,
            success_signal: self.success,
            failure_signal: self.failure,
        }
    }
}

/// The `data` object of an envelope, or the body itself when unwrapped.
pub(crate) fn envelope_data(body: &Value) -> &Value {
    match body.get("data") {
        Some(data) if data.is_object() => data,
        _ => body,
    }
}

/// Failure description when the envelope carries a code other than `ok_code`.
pub(crate) fn envelope_failure(body: &Value, ok_code: i64) -> Option<String> {
    let code = payload::integer_at(body, ENVELOPE_CODE)?;
    if code == ok_code {
        return None;
    }

    Some(match payload::first_text(body, ENVELOPE_MESSAGES) {
        Some(message) => format!("code {code}: {message}"),
        None => format!("code {code}"),
    })
}

/// Remote id from an envelope-style submission response.
pub(crate) fn envelope_remote_id(
    body: &Value,
    ok_code: i64,
    id_paths: &[PayloadPath],
) -> Result<String, String> {
    if let Some(failure) = envelope_failure(body, ok_code) {
        return Err(failure);
    }

    payload::first_text(body, id_paths)
        .ok_or_else(|| "submission response did not include a task id".to_string())
}

/// Non-zero numeric error code at `path`, rendered for diagnostics.
pub(crate) fn nonzero_code(body: &Value, path: PayloadPath) -> Option<String> {
    payload::integer_at(body, path)
        .filter(|code| *code != 0)
        .map(|code| code.to_string())
}
