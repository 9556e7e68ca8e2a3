use serde_json::{Map, Value, json};

use crate::core::error::ProviderError;
use crate::core::types::{GenerationRequest, MediaKind, ProviderFamily, StatusReading};
use crate::payload::{self, PayloadPath, json_path};
use crate::providers::family_contract::{FamilyCodec, FamilyEndpoints, StatusLocator};
use crate::providers::flux::{HOSTED_API_KEY_ENV, HOSTED_BASE_URL};
use crate::providers::request::{insert_opt, merge_extra, protocol_error, require_prompt};
use crate::providers::signals::{
    ENVELOPE_OK, Evidence, envelope_data, envelope_failure, envelope_remote_id, nonzero_code,
};

const SPEEDS: &[&str] = &["relaxed", "fast", "turbo"];

const TASK_ID_PATHS: &[PayloadPath] = &[json_path!("data" "taskId")];
const SUCCESS_FLAG: PayloadPath = json_path!("successFlag");
const RESULT_PATHS: &[PayloadPath] = &[
    json_path!("resultInfoJson" decode "resultUrls" [0] "resultUrl"),
    json_path!("resultUrls" [0]),
];
const ERROR_MESSAGE_PATHS: &[PayloadPath] = &[json_path!("errorMessage")];
const ERROR_CODE: PayloadPath = json_path!("errorCode");

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct MidjourneyCodec;

impl FamilyCodec for MidjourneyCodec {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::MidjourneyStyle
    }

    fn endpoints(&self) -> FamilyEndpoints {
        FamilyEndpoints {
            default_base_url: HOSTED_BASE_URL,
            submit_path: "/api/v1/mj/generate",
            status_path: "/api/v1/mj/record-info",
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

        let speed = options.quality.as_deref().unwrap_or("fast");
        if !SPEEDS.contains(&speed) {
            return Err(protocol_error(
                self.family(),
                model_id,
                format!("unsupported speed {speed}"),
            ));
        }

        let task_type = if options.image_urls.is_empty() {
            "mj_txt2img"
        } else {
            "mj_img2img"
        };

        let mut body = Map::new();
        body.insert("taskType".to_string(), json!(task_type));
        body.insert("prompt".to_string(), json!(prompt));
        body.insert("speed".to_string(), json!(speed));
        body.insert(
            "aspectRatio".to_string(),
            json!(options.aspect_ratio.as_deref().unwrap_or("1:1")),
        );
        body.insert("version".to_string(), json!("7"));
        if !options.image_urls.is_empty() {
            body.insert("fileUrls".to_string(), json!(options.image_urls));
        }
        insert_opt(&mut body, "stylization", options.style.clone());
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
        match payload::integer_at(data, SUCCESS_FLAG) {
            Some(1) => evidence.success("successFlag=1"),
            Some(flag @ (2 | 3)) => evidence.failure(format!("successFlag={flag}")),
            Some(0) => evidence.running("successFlag=0"),
            _ => {}
        }
        evidence.error_field("errorCode", nonzero_code(data, ERROR_CODE));
        evidence.error_field(
            "errorMessage",
            payload::first_text(data, ERROR_MESSAGE_PATHS),
        );
        evidence.result_present(self.extract(body));

        evidence.into_reading()
    }

    fn extract(&self, body: &Value) -> Option<String> {
        payload::first_url(envelope_data(body), RESULT_PATHS)
    }

    fn failure_detail(&self, body: &Value) -> Option<String> {
        payload::first_text(envelope_data(body), ERROR_MESSAGE_PATHS)
            .or_else(|| envelope_failure(body, ENVELOPE_OK))
    }
}
