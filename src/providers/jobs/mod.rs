use serde_json::{Map, Value, json};

use crate::core::error::ProviderError;
use crate::core::types::{GenerationRequest, MediaKind, ProviderFamily, StatusReading};
use crate::payload::{self, PayloadPath, json_path};
use crate::providers::family_contract::{FamilyCodec, FamilyEndpoints, StatusLocator};
use crate::providers::flux::{HOSTED_API_KEY_ENV, HOSTED_BASE_URL};
use crate::providers::request::{insert_opt, merge_extra, protocol_error, require_prompt};
use crate::providers::signals::{
    ENVELOPE_OK, Evidence, envelope_data, envelope_failure, envelope_remote_id,
};

const DEFAULT_VOICE: &str = "Rachel";

const TASK_ID_PATHS: &[PayloadPath] = &[json_path!("data" "taskId")];
const STATE_PATHS: &[PayloadPath] = &[json_path!("state"), json_path!("status")];
const RESULT_PATHS: &[PayloadPath] = &[
    json_path!("resultJson" decode "resultUrls" [0]),
    json_path!("resultJson" decode "resultUrl"),
    json_path!("resultUrls" [0]),
    json_path!("response" "resultUrls" [0]),
];
const FAIL_MESSAGE_PATHS: &[PayloadPath] = &[json_path!("failMsg"), json_path!("errorMessage")];
const FAIL_CODE_PATHS: &[PayloadPath] = &[json_path!("failCode"), json_path!("errorCode")];

/// Unified `createTask`/`recordInfo` job API shared by many hosted models.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct JobsCodec;

impl JobsCodec {
    fn fail_code(data: &Value) -> Option<String> {
        payload::first_text(data, FAIL_CODE_PATHS).filter(|code| code != "0")
    }
}

impl FamilyCodec for JobsCodec {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::JobsGeneric
    }

    fn endpoints(&self) -> FamilyEndpoints {
        FamilyEndpoints {
            default_base_url: HOSTED_BASE_URL,
            submit_path: "/api/v1/jobs/createTask",
            status_path: "/api/v1/jobs/recordInfo",
            status_locator: StatusLocator::Query("taskId"),
        }
    }

    fn credential_env(&self) -> &'static [&'static str] {
        HOSTED_API_KEY_ENV
    }

    fn build_payload(
        &self,
        model_id: &str,
        media_kind: MediaKind,
        request: &GenerationRequest,
    ) -> Result<Value, ProviderError> {
        let prompt = require_prompt(self.family(), model_id, request)?;
        let options = &request.options;

        let mut input = Map::new();
        match media_kind {
            MediaKind::Image => {
                input.insert("prompt".to_string(), json!(prompt));
                insert_opt(&mut input, "aspect_ratio", options.aspect_ratio.clone());
                insert_opt(&mut input, "output_format", options.output_format.clone());
                insert_opt(&mut input, "negative_prompt", options.negative_prompt.clone());
                if !options.image_urls.is_empty() {
                    input.insert("image_urls".to_string(), json!(options.image_urls));
                }
            }
            MediaKind::Video => {
                input.insert("prompt".to_string(), json!(prompt));
                insert_opt(&mut input, "aspect_ratio", options.aspect_ratio.clone());
                insert_opt(
                    &mut input,
                    "duration",
                    options.duration_seconds.map(|seconds| seconds.to_string()),
                );
                insert_opt(&mut input, "resolution", options.quality.clone());
                insert_opt(&mut input, "negative_prompt", options.negative_prompt.clone());
                insert_opt(&mut input, "image_url", options.image_urls.first().cloned());
            }
            MediaKind::Speech => {
                input.insert("text".to_string(), json!(prompt));
                input.insert(
                    "voice".to_string(),
                    json!(options.voice.as_deref().unwrap_or(DEFAULT_VOICE)),
                );
            }
            MediaKind::Music => {
                input.insert("prompt".to_string(), json!(prompt));
                insert_opt(&mut input, "duration", options.duration_seconds);
                insert_opt(&mut input, "instrumental", options.instrumental);
            }
            MediaKind::Slides => {
                return Err(protocol_error(
                    self.family(),
                    model_id,
                    "slide decks are not produced through the jobs API",
                ));
            }
        }
        insert_opt(&mut input, "seed", options.seed);
        merge_extra(&mut input, request);

        Ok(json!({
            "model": model_id,
            "input": Value::Object(input),
        }))
    }

    fn remote_task_id(&self, body: &Value) -> Result<String, String> {
        envelope_remote_id(body, ENVELOPE_OK, TASK_ID_PATHS)
    }

    fn normalize(&self, body: &Value) -> StatusReading {
        let data = envelope_data(body);
        let mut evidence = Evidence::new();

        evidence.error_field("code", envelope_failure(body, ENVELOPE_OK));
        if let Some(word) = payload::status_word(data, STATE_PATHS) {
            evidence.word("state", &word);
        }
        evidence.error_field("failCode", Self::fail_code(data));
        evidence.error_field("failMsg", payload::first_text(data, FAIL_MESSAGE_PATHS));
        evidence.result_present(self.extract(body));

        evidence.into_reading()
    }

    fn extract(&self, body: &Value) -> Option<String> {
        payload::first_url(envelope_data(body), RESULT_PATHS)
    }

    fn failure_detail(&self, body: &Value) -> Option<String> {
        let data = envelope_data(body);
        payload::first_text(data, FAIL_MESSAGE_PATHS)
            .or_else(|| Self::fail_code(data).map(|code| format!("fail code {code}")))
            .or_else(|| envelope_failure(body, ENVELOPE_OK))
    }
}
