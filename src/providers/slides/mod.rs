use serde_json::{Map, Value, json};

use crate::core::error::ProviderError;
use crate::core::types::{GenerationRequest, MediaKind, ProviderFamily, StatusReading};
use crate::payload::{self, PayloadPath, json_path};
use crate::providers::family_contract::{FamilyCodec, FamilyEndpoints, StatusLocator};
use crate::providers::request::{insert_opt, merge_extra, protocol_error, require_prompt};
use crate::providers::signals::Evidence;

const SLIDES_BASE_URL: &str = "https://public-api.gamma.app";
const SLIDES_API_KEY_ENV: &[&str] = &["GAMMA_API_KEY"];

const EXPORT_FORMATS: &[&str] = &["pdf", "pptx"];
const DEFAULT_CARDS: i64 = 10;

const ID_PATHS: &[PayloadPath] = &[json_path!("generationId"), json_path!("id")];
const STATUS_PATHS: &[PayloadPath] = &[json_path!("status")];
const RESULT_PATHS: &[PayloadPath] = &[
    json_path!("exportUrl"),
    json_path!("file" "url"),
    json_path!("gammaUrl"),
    json_path!("urls" "export"),
];
const ERROR_PATHS: &[PayloadPath] = &[json_path!("error" "message"), json_path!("error")];
const REJECTION_PATHS: &[PayloadPath] = &[
    json_path!("message"),
    json_path!("error" "message"),
    json_path!("error"),
];

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SlidesCodec;

impl FamilyCodec for SlidesCodec {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::SlidesStyle
    }

    fn endpoints(&self) -> FamilyEndpoints {
        FamilyEndpoints {
            default_base_url: SLIDES_BASE_URL,
            submit_path: "/v0.2/generations",
            status_path: "/v0.2/generations",
            status_locator: StatusLocator::PathSegment,
        }
    }

    fn credential_env(&self) -> &'static [&'static str] {
        SLIDES_API_KEY_ENV
    }

    fn build_payload(
        &self,
        model_id: &str,
        media_kind: MediaKind,
        request: &GenerationRequest,
    ) -> Result<Value, ProviderError> {
        if media_kind != MediaKind::Slides {
            return Err(protocol_error(
                self.family(),
                model_id,
                format!("{media_kind} is not produced by the slides family"),
            ));
        }
        let prompt = require_prompt(self.family(), model_id, request)?;
        let options = &request.options;

        let export_as = options.output_format.as_deref().unwrap_or("pdf");
        if !EXPORT_FORMATS.contains(&export_as) {
            return Err(protocol_error(
                self.family(),
                model_id,
                format!("unsupported export format {export_as}; expected pdf or pptx"),
            ));
        }

        let mut body = Map::new();
        body.insert("inputText".to_string(), json!(prompt));
        body.insert("textMode".to_string(), json!("generate"));
        body.insert("format".to_string(), json!("presentation"));
        body.insert("numCards".to_string(), json!(DEFAULT_CARDS));
        body.insert("exportAs".to_string(), json!(export_as));
        insert_opt(&mut body, "themeName", options.style.clone());
        insert_opt(
            &mut body,
            "additionalInstructions",
            options
                .negative_prompt
                .as_deref()
                .map(|avoid| format!("Avoid: {avoid}")),
        );
        merge_extra(&mut body, request);

        Ok(Value::Object(body))
    }

    fn remote_task_id(&self, body: &Value) -> Result<String, String> {
        if let Some(id) = payload::first_text(body, ID_PATHS) {
            return Ok(id);
        }
        Err(payload::first_text(body, REJECTION_PATHS)
            .unwrap_or_else(|| "submission response did not include a generation id".to_string()))
    }

    fn normalize(&self, body: &Value) -> StatusReading {
        let mut evidence = Evidence::new();

        if let Some(word) = payload::status_word(body, STATUS_PATHS) {
            evidence.word("status", &word);
        }
        evidence.error_field("error", payload::first_text(body, ERROR_PATHS));
        evidence.result_present(self.extract(body));

        evidence.into_reading()
    }

    fn extract(&self, body: &Value) -> Option<String> {
        payload::first_url(body, RESULT_PATHS)
    }

    fn failure_detail(&self, body: &Value) -> Option<String> {
        payload::first_text(body, ERROR_PATHS)
    }
}
