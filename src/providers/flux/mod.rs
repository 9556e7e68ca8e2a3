use serde_json::{Map, Value, json};

use crate::core::error::ProviderError;
use crate::core::types::{GenerationRequest, MediaKind, ProviderFamily, StatusReading};
use crate::payload::{self, PayloadPath, json_path};
use crate::providers::family_contract::{FamilyCodec, FamilyEndpoints, StatusLocator};
use crate::providers::request::{insert_opt, merge_extra, require_prompt};
use crate::providers::signals::{
    ENVELOPE_OK, Evidence, envelope_data, envelope_failure, envelope_remote_id, nonzero_code,
};

pub(crate) const HOSTED_BASE_URL: &str = "https://api.kie.ai";
pub(crate) const HOSTED_API_KEY_ENV: &[&str] = &["KIE_API_KEY"];

const TASK_ID_PATHS: &[PayloadPath] = &[json_path!("data" "taskId"), json_path!("taskId")];
const SUCCESS_FLAG: PayloadPath = json_path!("successFlag");
const RESULT_PATHS: &[PayloadPath] = &[
    json_path!("response" "resultImageUrl"),
    json_path!("response" "originImageUrl"),
    json_path!("resultImageUrl"),
];
const ERROR_MESSAGE_PATHS: &[PayloadPath] = &[json_path!("errorMessage")];
const ERROR_CODE: PayloadPath = json_path!("errorCode");

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FluxCodec;

impl FamilyCodec for FluxCodec {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::FluxStyle
    }

    fn endpoints(&self) -> FamilyEndpoints {
        FamilyEndpoints {
            default_base_url: HOSTED_BASE_URL,
            submit_path: "/api/v1/flux/kontext/generate",
            status_path: "/api/v1/flux/kontext/record-info",
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

        let mut body = Map::new();
        body.insert("prompt".to_string(), json!(prompt));
        body.insert("model".to_string(), json!(model_id));
        body.insert(
            "aspectRatio".to_string(),
            json!(options.aspect_ratio.as_deref().unwrap_or("16:9")),
        );
        body.insert(
            "outputFormat".to_string(),
            json!(options.output_format.as_deref().unwrap_or("jpeg")),
        );
        body.insert("enableTranslation".to_string(), json!(true));
        insert_opt(&mut body, "inputImage", options.image_urls.first().cloned());
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
        // 0 generating, 1 success, 2 task creation failed, 3 generation failed
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
            .or_else(|| {
                nonzero_code(envelope_data(body), ERROR_CODE).map(|code| format!("error code {code}"))
            })
    }
}
