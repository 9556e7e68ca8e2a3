use serde_json::json;

use super::*;
use crate::core::types::{CanonicalStatus, GenerationOptions};

#[test]
fn test_veo_response_result_urls() {
    let body = json!({
        "code": 200,
        "data": {
            "taskId": "veo-1",
            "successFlag": 1,
            "response": {"resultUrls": ["https://cdn.example/veo/clip.mp4"], "resolution": "1080p"}
        }
    });

    assert_eq!(VeoCodec.normalize(&body).status, CanonicalStatus::Succeeded);
    assert_eq!(
        VeoCodec.extract(&body),
        Some("https://cdn.example/veo/clip.mp4".to_string())
    );
}

#[test]
fn test_veo_info_result_urls_as_encoded_string() {
    let body = json!({
        "code": 200,
        "data": {
            "successFlag": 1,
            "response": null,
            "info": {"resultUrls": "[\"https://cdn.example/veo/info.mp4\"]"}
        }
    });
    assert_eq!(
        VeoCodec.extract(&body),
        Some("https://cdn.example/veo/info.mp4".to_string())
    );
}

#[test]
fn test_veo_top_level_result_urls_array() {
    let body = json!({
        "code": 200,
        "data": {"resultUrls": ["https://cdn.example/veo/top.mp4"]}
    });

    let reading = VeoCodec.normalize(&body);
    assert_eq!(reading.status, CanonicalStatus::Succeeded);
    assert_eq!(
        reading.success_signal,
        Some("result=https://cdn.example/veo/top.mp4".to_string())
    );
}

#[test]
fn test_veo_failure_flag_with_stub_result() {
    let body = json!({
        "code": 200,
        "data": {
            "successFlag": 2,
            "errorMessage": "public error: unsafe content",
            "info": {"resultUrls": "[\"https://cdn.example/veo/stub.mp4\"]"}
        }
    });

    assert_eq!(VeoCodec.normalize(&body).status, CanonicalStatus::Failed);
    assert_eq!(
        VeoCodec.failure_detail(&body),
        Some("public error: unsafe content".to_string())
    );
}

#[test]
fn test_veo_success_flag_as_string() {
    let body = json!({"code": 200, "data": {"successFlag": "0"}});
    assert_eq!(VeoCodec.normalize(&body).status, CanonicalStatus::Running);
}

#[test]
fn test_veo_payload() {
    let request = GenerationRequest::new("drone shot").with_options(GenerationOptions {
        aspect_ratio: Some("9:16".to_string()),
        seed: Some(42),
        ..GenerationOptions::default()
    });

    let body = VeoCodec
        .build_payload("veo3_fast", MediaKind::Video, &request)
        .expect("payload should build");
    assert_eq!(
        body,
        json!({
            "prompt": "drone shot",
            "model": "veo3_fast",
            "aspectRatio": "9:16",
            "seeds": 42
        })
    );

    let request = GenerationRequest::new("drone shot").with_options(GenerationOptions {
        aspect_ratio: Some("4:3".to_string()),
        ..GenerationOptions::default()
    });
    assert!(VeoCodec.build_payload("veo3", MediaKind::Video, &request).is_err());
}
