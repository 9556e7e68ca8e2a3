use serde_json::{Map, Value, json};

use crate::core::error::ProviderError;
use crate::core::types::{GenerationRequest, MediaKind, ProviderFamily, StatusReading};
use crate::payload::{self, PayloadPath, json_path};
use crate::providers::family_contract::{FamilyCodec, FamilyEndpoints, StatusLocator};
use crate::providers::flux::{HOSTED_API_KEY_ENV, HOSTED_BASE_URL};
use crate::providers::request::{insert_opt, merge_extra, protocol_error, require_prompt};
use crate::providers::signals::{
    ENVELOPE_OK, Evidence, WordClass, classify_word, envelope_data, envelope_failure,
    envelope_remote_id, nonzero_code,
};

const TASK_ID_PATHS: &[PayloadPath] = &[json_path!("data" "taskId")];
const STATUS_PATHS: &[PayloadPath] = &[json_path!("status")];
const RESULT_PATHS: &[PayloadPath] = &[
    json_path!("response" "sunoData" [0] "audioUrl"),
    json_path!("response" "sunoData" [0] "sourceAudioUrl"),
    json_path!("response" "data" [0] "audio_url"),
];
const ERROR_MESSAGE_PATHS: &[PayloadPath] = &[json_path!("errorMessage")];
const ERROR_CODE: PayloadPath = json_path!("errorCode");

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SunoCodec;

impl SunoCodec {
    /// Lyrics and the first track finish before the full set; those stages
    /// are progress, not success.
    fn classify(word: &str) -> Option<WordClass> {
        if Self::is_partial_stage(word) {
            return Some(WordClass::Running);
        }
        classify_word(word)
    }

    fn is_partial_stage(word: &str) -> bool {
        matches!(word, "text_success" | "first_success")
    }
}

impl FamilyCodec for SunoCodec {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::SunoStyle
    }

    fn endpoints(&self) -> FamilyEndpoints {
        FamilyEndpoints {
            default_base_url: HOSTED_BASE_URL,
            submit_path: "/api/v1/generate",
            status_path: "/api/v1/generate/record-info",
            status_locator: StatusLocator::Query("taskId"),
        }
    }

    fn credential_env(&self) -> &'static [&'static str] {
        HOSTED_API_KEY_ENV
    }

    fn build_payload(
        &self,
        model_id: &str,
        _media_kind: MediaKind,
        request: &GenerationRequest,
    ) -> Result<Value, ProviderError> {
        let prompt = require_prompt(self.family(), model_id, request)?;
        let options = &request.options;

        let custom_mode = options.style.is_some() || options.title.is_some();
        if custom_mode && (options.style.is_none() || options.title.is_none()) {
            return Err(protocol_error(
                self.family(),
                model_id,
                "custom mode requires both style and title",
            ));
        }

        let mut body = Map::new();
        body.insert("prompt".to_string(), json!(prompt));
        body.insert("model".to_string(), json!(model_id));
        body.insert("customMode".to_string(), json!(custom_mode));
        body.insert(
            "instrumental".to_string(),
            json!(options.instrumental.unwrap_or(false)),
        );
        insert_opt(&mut body, "style", options.style.clone());
        insert_opt(&mut body, "title", options.title.clone());
        insert_opt(&mut body, "negativeTags", options.negative_prompt.clone());
        merge_extra(&mut body, request);

        Ok(Value::Object(body))
    }

    fn remote_task_id(&self, body: &Value) -> Result<String, String> {
        envelope_remote_id(body, ENVELOPE_OK, TASK_ID_PATHS)
    }

    fn normalize(&self, body: &Value) -> StatusReading {
        let data = envelope_data(body);
        let mut evidence = Evidence::new();

        evidence.error_field("code", envelope_failure(body, ENVELOPE_OK));
        let word = payload::status_word(data, STATUS_PATHS);
        if let Some(word) = &word {
            evidence.classified("status", word, Self::classify(word));
        }
        evidence.error_field("errorCode", nonzero_code(data, ERROR_CODE));
        evidence.error_field(
            "errorMessage",
            payload::first_text(data, ERROR_MESSAGE_PATHS),
        );
        // The first track's URL is already filled in at FIRST_SUCCESS.
        if !word.as_deref().is_some_and(Self::is_partial_stage) {
            evidence.result_present(self.extract(body));
        }

        evidence.into_reading()
    }

    fn extract(&self, body: &Value) -> Option<String> {
        payload::first_url(envelope_data(body), RESULT_PATHS)
    }

    fn failure_detail(&self, body: &Value) -> Option<String> {
        let data = envelope_data(body);
        payload::first_text(data, ERROR_MESSAGE_PATHS)
            .or_else(|| envelope_failure(body, ENVELOPE_OK))
            .or_else(|| {
                payload::status_word(data, STATUS_PATHS)
                    .filter(|word| Self::classify(word) == Some(WordClass::Failure))
                    .map(|word| word.to_ascii_uppercase())
            })
    }
}
