use serde_json::{Map, Value, json};

use crate::core::error::ProviderError;
use crate::core::types::{GenerationRequest, MediaKind, ProviderFamily, StatusReading};
use crate::payload::{self, PayloadPath, json_path};
use crate::providers::family_contract::{FamilyCodec, FamilyEndpoints, StatusLocator};
use crate::providers::request::{insert_opt, merge_extra, protocol_error, require_prompt};
use crate::providers::signals::Evidence;

const REPLICATE_BASE_URL: &str = "https://api.replicate.com";
const REPLICATE_API_KEY_ENV: &[&str] = &["REPLICATE_API_TOKEN", "REPLICATE_API_KEY"];

const ID_PATHS: &[PayloadPath] = &[json_path!("id")];
const STATUS_PATHS: &[PayloadPath] = &[json_path!("status")];
// `output` is a bare URL, a list of URLs or an object, depending on the model.
const RESULT_PATHS: &[PayloadPath] = &[
    json_path!("output"),
    json_path!("output" [0]),
    json_path!("output" "url"),
    json_path!("output" "audio"),
    json_path!("output" "video"),
    json_path!("output" "image"),
];
const ERROR_PATHS: &[PayloadPath] = &[json_path!("error"), json_path!("detail")];

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ReplicateCodec;

impl FamilyCodec for ReplicateCodec {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::ReplicateStyle
    }

    fn endpoints(&self) -> FamilyEndpoints {
        FamilyEndpoints {
            default_base_url: REPLICATE_BASE_URL,
            submit_path: "/v1/predictions",
            status_path: "/v1/predictions",
            status_locator: StatusLocator::PathSegment,
        }
    }

    fn credential_env(&self) -> &'static [&'static str] {
        REPLICATE_API_KEY_ENV
    }

    /// Official models are addressed as `/v1/models/{owner}/{name}/predictions`.
    fn submit_path(&self, model_id: &str, _media_kind: MediaKind) -> String {
        format!("/v1/models/{}/predictions", model_id.trim_matches('/'))
    }

    fn build_payload(
        &self,
        model_id: &str,
        media_kind: MediaKind,
        request: &GenerationRequest,
    ) -> Result<Value, ProviderError> {
        let prompt = require_prompt(self.family(), model_id, request)?;
        let options = &request.options;

        let segments = model_id.trim_matches('/').split('/').collect::<Vec<_>>();
        if segments.len() != 2 || segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(protocol_error(
                self.family(),
                model_id,
                "model id must have the form owner/name",
            ));
        }

        let mut input = Map::new();
        match media_kind {
            MediaKind::Speech => {
                input.insert("text".to_string(), json!(prompt));
                insert_opt(&mut input, "voice", options.voice.clone());
            }
            MediaKind::Music => {
                input.insert("prompt".to_string(), json!(prompt));
                insert_opt(&mut input, "duration", options.duration_seconds);
            }
            MediaKind::Video => {
                input.insert("prompt".to_string(), json!(prompt));
                insert_opt(&mut input, "duration", options.duration_seconds);
                insert_opt(&mut input, "aspect_ratio", options.aspect_ratio.clone());
                insert_opt(
                    &mut input,
                    "first_frame_image",
                    options.image_urls.first().cloned(),
                );
            }
            MediaKind::Image => {
                input.insert("prompt".to_string(), json!(prompt));
                insert_opt(&mut input, "aspect_ratio", options.aspect_ratio.clone());
                insert_opt(&mut input, "output_format", options.output_format.clone());
                insert_opt(&mut input, "negative_prompt", options.negative_prompt.clone());
            }
            MediaKind::Slides => {
                return Err(protocol_error(
                    self.family(),
                    model_id,
                    "slide decks are not produced through predictions",
                ));
            }
        }
        insert_opt(&mut input, "seed", options.seed);
        merge_extra(&mut input, request);

        Ok(json!({ "input": Value::Object(input) }))
    }

    fn remote_task_id(&self, body: &Value) -> Result<String, String> {
        if let Some(error) = payload::first_text(body, ERROR_PATHS) {
            return Err(error);
        }
        payload::first_text(body, ID_PATHS)
            .ok_or_else(|| "submission response did not include a prediction id".to_string())
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
        payload::first_text(body, ERROR_PATHS).or_else(|| {
            payload::status_word(body, STATUS_PATHS)
                .filter(|status| status == "canceled")
                .map(|_| "prediction was canceled".to_string())
        })
    }
}
