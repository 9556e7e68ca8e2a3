use serde_json::{Map, Value, json};

use crate::core::error::ProviderError;
use crate::core::types::{GenerationRequest, MediaKind, ProviderFamily, StatusReading};
use crate::payload::{self, PayloadPath, json_path};
use crate::providers::family_contract::{FamilyCodec, FamilyEndpoints, StatusLocator};
use crate::providers::flux::{HOSTED_API_KEY_ENV, HOSTED_BASE_URL};
use crate::providers::request::{
    check_duration, insert_opt, merge_extra, protocol_error, require_prompt,
};
use crate::providers::signals::{
    ENVELOPE_OK, Evidence, envelope_data, envelope_failure, envelope_remote_id, nonzero_code,
};

const DURATIONS: &[u32] = &[5, 10];
const QUALITIES: &[&str] = &["720p", "1080p"];

const TASK_ID_PATHS: &[PayloadPath] = &[json_path!("data" "taskId")];
const STATE_PATHS: &[PayloadPath] = &[json_path!("state")];
const RESULT_PATHS: &[PayloadPath] = &[
    json_path!("videoInfo" "videoUrl"),
    json_path!("videoUrl"),
    json_path!("response" "videoUrl"),
];
const FAIL_MESSAGE_PATHS: &[PayloadPath] = &[json_path!("failMsg")];
const FAIL_CODE: PayloadPath = json_path!("failCode");

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct RunwayCodec;

impl FamilyCodec for RunwayCodec {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::RunwayStyle
    }

    fn endpoints(&self) -> FamilyEndpoints {
        FamilyEndpoints {
            default_base_url: HOSTED_BASE_URL,
            submit_path: "/api/v1/runway/generate",
            status_path: "/api/v1/runway/record-detail",
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

        let duration = check_duration(self.family(), model_id, request, DURATIONS)?.unwrap_or(5);
        let quality = options.quality.as_deref().unwrap_or("720p");
        if !QUALITIES.contains(&quality) {
            return Err(protocol_error(
                self.family(),
                model_id,
                format!("unsupported quality {quality}"),
            ));
        }
        // 1080p renders are limited to 5 second clips.
        if quality == "1080p" && duration == 10 {
            return Err(protocol_error(
                self.family(),
                model_id,
                "1080p is only available for 5s clips",
            ));
        }

        let mut body = Map::new();
        body.insert("prompt".to_string(), json!(prompt));
        body.insert("duration".to_string(), json!(duration));
        body.insert("quality".to_string(), json!(quality));
        body.insert(
            "aspectRatio".to_string(),
            json!(options.aspect_ratio.as_deref().unwrap_or("16:9")),
        );
        insert_opt(&mut body, "imageUrl", options.image_urls.first().cloned());
        body.insert("waterMark".to_string(), json!(""));
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
        if let Some(word) = payload::status_word(data, STATE_PATHS) {
            evidence.word("state", &word);
        }
        evidence.error_field("failCode", nonzero_code(data, FAIL_CODE));
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
            .or_else(|| envelope_failure(body, ENVELOPE_OK))
            .or_else(|| {
                payload::status_word(data, STATE_PATHS)
                    .filter(|state| state == "expired")
                    .map(|_| "task expired before completion".to_string())
            })
    }
}
