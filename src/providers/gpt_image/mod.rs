use serde_json::{Map, Value, json};

use crate::core::error::ProviderError;
use crate::core::types::{GenerationRequest, MediaKind, ProviderFamily, StatusReading};
use crate::payload::{self, PayloadPath, json_path};
use crate::providers::family_contract::{FamilyCodec, FamilyEndpoints, StatusLocator};
use crate::providers::flux::{HOSTED_API_KEY_ENV, HOSTED_BASE_URL};
use crate::providers::request::{merge_extra, protocol_error, require_prompt};
use crate::providers::signals::{
    ENVELOPE_OK, Evidence, envelope_data, envelope_failure, envelope_remote_id, nonzero_code,
};

const SUPPORTED_SIZES: &[&str] = &["1:1", "3:2", "2:3"];

const TASK_ID_PATHS: &[PayloadPath] = &[json_path!("data" "taskId")];
const SUCCESS_FLAG: PayloadPath = json_path!("successFlag");
const STATUS_PATHS: &[PayloadPath] = &[json_path!("status")];
const RESULT_PATHS: &[PayloadPath] = &[
    json_path!("response" "resultUrls" [0]),
    json_path!("response" "result_urls" [0]),
    json_path!("resultUrls" [0]),
];
const ERROR_MESSAGE_PATHS: &[PayloadPath] = &[json_path!("errorMessage")];
const ERROR_CODE: PayloadPath = json_path!("errorCode");

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct GptImageCodec;

impl FamilyCodec for GptImageCodec {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::GptImageStyle
    }

    fn endpoints(&self) -> FamilyEndpoints {
        FamilyEndpoints {
            default_base_url: HOSTED_BASE_URL,
            submit_path: "/api/v1/gpt4o-image/generate",
            status_path: "/api/v1/gpt4o-image/record-info",
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

        let size = options.aspect_ratio.as_deref().unwrap_or("1:1");
        if !SUPPORTED_SIZES.contains(&size) {
            return Err(protocol_error(
                self.family(),
                model_id,
                format!(
                    "unsupported aspect ratio {size}; expected one of {}",
                    SUPPORTED_SIZES.join(", ")
                ),
            ));
        }

        let mut body = Map::new();
        body.insert("prompt".to_string(), json!(prompt));
        body.insert("size".to_string(), json!(size));
        body.insert("nVariants".to_string(), json!(1));
        if !options.image_urls.is_empty() {
            body.insert("filesUrl".to_string(), json!(options.image_urls));
        }
        body.insert(
            "isEnhance".to_string(),
            json!(options.quality.as_deref() == Some("enhanced")),
        );
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
            Some(2) => evidence.failure("successFlag=2"),
            Some(0) => evidence.running("successFlag=0"),
            _ => {}
        }
        if let Some(word) = payload::status_word(data, STATUS_PATHS) {
            evidence.word("status", &word);
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
        let data = envelope_data(body);
        payload::first_text(data, ERROR_MESSAGE_PATHS)
            .or_else(|| envelope_failure(body, ENVELOPE_OK))
            .or_else(|| {
                payload::status_word(data, STATUS_PATHS)
                    .filter(|word| word.ends_with("failed"))
                    .map(|word| word.to_ascii_uppercase())
            })
    }
}
