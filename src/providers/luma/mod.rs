use serde_json::{Map, Value, json};

use crate::core::error::ProviderError;
use crate::core::types::{GenerationRequest, MediaKind, ProviderFamily, StatusReading};
use crate::payload::{self, PayloadPath, json_path};
use crate::providers::family_contract::{FamilyCodec, FamilyEndpoints, StatusLocator};
use crate::providers::request::{check_duration, merge_extra, protocol_error, require_prompt};
use crate::providers::signals::Evidence;

const LUMA_BASE_URL: &str = "https://api.lumalabs.ai";
const LUMA_API_KEY_ENV: &[&str] = &["LUMA_API_KEY"];

const DURATIONS: &[u32] = &[5, 9];
const RESOLUTIONS: &[&str] = &["540p", "720p", "1080p", "4k"];

const ID_PATHS: &[PayloadPath] = &[json_path!("id")];
const STATE_PATHS: &[PayloadPath] = &[json_path!("state")];
const RESULT_PATHS: &[PayloadPath] = &[json_path!("assets" "video"), json_path!("assets" "image")];
const FAILURE_PATHS: &[PayloadPath] = &[json_path!("failure_reason")];
const ERROR_DETAIL_PATHS: &[PayloadPath] = &[json_path!("detail"), json_path!("error")];

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LumaCodec;

impl FamilyCodec for LumaCodec {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::LumaStyle
    }

    fn endpoints(&self) -> FamilyEndpoints {
        FamilyEndpoints {
            default_base_url: LUMA_BASE_URL,
            submit_path: "/dream-machine/v1/generations",
            status_path: "/dream-machine/v1/generations",
            status_locator: StatusLocator::PathSegment,
        }
    }

    fn credential_env(&self) -> &'static [&'static str] {
        LUMA_API_KEY_ENV
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
        let resolution = options.quality.as_deref().unwrap_or("720p");
        if !RESOLUTIONS.contains(&resolution) {
            return Err(protocol_error(
                self.family(),
                model_id,
                format!("unsupported resolution {resolution}"),
            ));
        }

        let mut body = Map::new();
        body.insert("prompt".to_string(), json!(prompt));
        body.insert("model".to_string(), json!(model_id));
        body.insert(
            "aspect_ratio".to_string(),
            json!(options.aspect_ratio.as_deref().unwrap_or("16:9")),
        );
        body.insert("duration".to_string(), json!(format!("{duration}s")));
        body.insert("resolution".to_string(), json!(resolution));
        if let Some(image_url) = options.image_urls.first() {
            body.insert(
                "keyframes".to_string(),
                json!({"frame0": {"type": "image", "url": image_url}}),
            );
        }
        merge_extra(&mut body, request);

        Ok(Value::Object(body))
    }

    fn remote_task_id(&self, body: &Value) -> Result<String, String> {
        if let Some(detail) = payload::first_text(body, ERROR_DETAIL_PATHS) {
            return Err(detail);
        }
        payload::first_text(body, ID_PATHS)
            .ok_or_else(|| "submission response did not include a generation id".to_string())
    }

    fn normalize(&self, body: &Value) -> StatusReading {
        let mut evidence = Evidence::new();

        if let Some(word) = payload::status_word(body, STATE_PATHS) {
            evidence.word("state", &word);
        }
        evidence.error_field("failure_reason", payload::first_text(body, FAILURE_PATHS));
        evidence.result_present(self.extract(body));

        evidence.into_reading()
    }

    fn extract(&self, body: &Value) -> Option<String> {
        payload::first_url(body, RESULT_PATHS)
    }

    fn failure_detail(&self, body: &Value) -> Option<String> {
        payload::first_text(body, FAILURE_PATHS)
            .or_else(|| payload::first_text(body, ERROR_DETAIL_PATHS))
    }
}
