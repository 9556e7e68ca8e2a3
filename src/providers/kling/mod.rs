use serde_json::{Map, Value, json};

use crate::core::error::ProviderError;
use crate::core::types::{GenerationRequest, MediaKind, ProviderFamily, StatusReading};
use crate::payload::{self, PayloadPath, json_path};
use crate::providers::family_contract::{FamilyCodec, FamilyEndpoints, StatusLocator};
use crate::providers::request::{
    check_duration, insert_opt, merge_extra, protocol_error, require_prompt,
};
use crate::providers::signals::{Evidence, envelope_data, envelope_failure, envelope_remote_id};

const KLING_BASE_URL: &str = "https://api.klingai.com";
const KLING_API_KEY_ENV: &[&str] = &["KLING_API_KEY"];
/// Kling's envelope reports success as `code: 0`.
const KLING_OK: i64 = 0;

const DURATIONS: &[u32] = &[5, 10];
const MODES: &[&str] = &["std", "pro"];

const TASK_ID_PATHS: &[PayloadPath] = &[json_path!("data" "task_id")];
const STATUS_PATHS: &[PayloadPath] = &[json_path!("task_status")];
const RESULT_PATHS: &[PayloadPath] = &[
    json_path!("task_result" "videos" [0] "url"),
    json_path!("task_result" "images" [0] "url"),
];
const STATUS_MESSAGE_PATHS: &[PayloadPath] = &[json_path!("task_status_msg")];

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct KlingCodec;

impl FamilyCodec for KlingCodec {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::KlingStyle
    }

    fn endpoints(&self) -> FamilyEndpoints {
        FamilyEndpoints {
            default_base_url: KLING_BASE_URL,
            submit_path: "/v1/videos/text2video",
            status_path: "/v1/videos/text2video",
            status_locator: StatusLocator::PathSegment,
        }
    }

    fn credential_env(&self) -> &'static [&'static str] {
        KLING_API_KEY_ENV
    }

    fn build_payload(
        &self,
        model_id: &str,
        _media_kind: MediaKind,
        request: &GenerationRequest,
    ) -> Result<Value, ProviderError> {
        let prompt = require_prompt(self.family(), model_id, request)?;
        let options = &request.options;

        if !options.image_urls.is_empty() {
            return Err(protocol_error(
                self.family(),
                model_id,
                "reference images are not supported by text-to-video",
            ));
        }
        let duration = check_duration(self.family(), model_id, request, DURATIONS)?.unwrap_or(5);
        let mode = options.quality.as_deref().unwrap_or("std");
        if !MODES.contains(&mode) {
            return Err(protocol_error(
                self.family(),
                model_id,
                format!("unsupported mode {mode}"),
            ));
        }

        let mut body = Map::new();
        body.insert("model_name".to_string(), json!(model_id));
        body.insert("prompt".to_string(), json!(prompt));
        insert_opt(&mut body, "negative_prompt", options.negative_prompt.clone());
        body.insert("mode".to_string(), json!(mode));
        body.insert(
            "aspect_ratio".to_string(),
            json!(options.aspect_ratio.as_deref().unwrap_or("16:9")),
        );
        body.insert("duration".to_string(), json!(duration.to_string()));
        merge_extra(&mut body, request);

        Ok(Value::Object(body))
    }

    fn remote_task_id(&self, body: &Value) -> Result<String, String> {
        envelope_remote_id(body, KLING_OK, TASK_ID_PATHS)
    }

    fn normalize(&self, body: &Value) -> StatusReading {
        let data = envelope_data(body);
        let mut evidence = Evidence::new();

        evidence.error_field("code", envelope_failure(body, KLING_OK));
        if let Some(word) = payload::status_word(data, STATUS_PATHS) {
            evidence.word("task_status", &word);
        }
        evidence.result_present(self.extract(body));

        evidence.into_reading()
    }

    fn extract(&self, body: &Value) -> Option<String> {
        payload::first_url(envelope_data(body), RESULT_PATHS)
    }

    fn failure_detail(&self, body: &Value) -> Option<String> {
        payload::first_text(envelope_data(body), STATUS_MESSAGE_PATHS)
            .or_else(|| envelope_failure(body, KLING_OK))
    }
}
