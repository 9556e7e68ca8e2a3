use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::core::error::ProviderError;
use crate::core::types::{AdapterContext, ProviderFamily};
use crate::test_support::{MockResponse, MockServer};
use crate::transport::http::HttpTransport;

fn transport() -> HttpTransport {
    HttpTransport::new(2_000).expect("create transport")
}

#[tokio::test]
async fn test_post_maps_status_errors_without_retrying() {
    let mut server = MockServer::start(vec![MockResponse::new(
        429,
        vec![("x-request-id".to_string(), "req-123".to_string())],
        r#"{"error":"rate limit"}"#,
    )]);

    let result = transport()
        .post_json::<Value, Value>(
            ProviderFamily::FluxStyle,
            Some("flux-kontext-pro"),
            &format!("{}/api/v1/flux/kontext/generate", server.url()),
            &json!({"prompt": "x"}),
            Some("key"),
            &AdapterContext::default(),
        )
        .await;

    match result {
        Err(ProviderError::Status {
            family,
            model,
            status_code,
            request_id,
            message,
        }) => {
            assert_eq!(family, ProviderFamily::FluxStyle);
            assert_eq!(model, Some("flux-kontext-pro".to_string()));
            assert_eq!(status_code, 429);
            assert_eq!(request_id, Some("req-123".to_string()));
            assert_eq!(message, r#"{"error":"rate limit"}"#);
        }
        other => panic!("expected ProviderError::Status, got {other:?}"),
    }

    server.shutdown();
    assert_eq!(server.request_count(), 1);
}

#[tokio::test]
async fn test_post_sends_bearer_custom_headers_and_body() {
    let mut server = MockServer::start(vec![MockResponse::json(json!({"code": 200}))]);

    let mut metadata = BTreeMap::new();
    metadata.insert(
        "transport.header.x-custom-header".to_string(),
        "custom-value".to_string(),
    );
    let ctx = AdapterContext { metadata };

    let reply: Value = transport()
        .post_json(
            ProviderFamily::KlingStyle,
            None,
            &format!("{}/v1/videos/text2video", server.url()),
            &json!({"prompt": "koi"}),
            Some("token-abc"),
            &ctx,
        )
        .await
        .expect("successful response");
    assert_eq!(reply, json!({"code": 200}));

    server.shutdown();
    let captured = server.captured_requests();
    assert_eq!(captured.len(), 1);
    let request = &captured[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/v1/videos/text2video");
    assert_eq!(
        request.headers.get("authorization"),
        Some(&"Bearer token-abc".to_string())
    );
    assert_eq!(
        request.headers.get("x-custom-header"),
        Some(&"custom-value".to_string())
    );
    assert_eq!(
        request.headers.get("content-type"),
        Some(&"application/json".to_string())
    );
    assert_eq!(request.json_body(), json!({"prompt": "koi"}));
}

#[tokio::test]
async fn test_get_json_reply_keeps_error_objects() {
    let mut server = MockServer::start(vec![
        MockResponse::new(
            404,
            vec![("x-trace".to_string(), "trace-9".to_string())],
            r#"{"detail":"prediction not found"}"#,
        ),
        MockResponse::new(502, vec![], "<html>bad gateway</html>"),
        MockResponse::new(500, vec![], r#"["not", "an", "object"]"#),
    ]);

    let mut metadata = BTreeMap::new();
    metadata.insert(
        "transport.request_id_header".to_string(),
        "x-trace".to_string(),
    );
    let ctx = AdapterContext { metadata };
    let transport = transport();
    let url = format!("{}/v1/predictions/p-1", server.url());

    let reply = transport
        .get_json_reply(ProviderFamily::ReplicateStyle, &url, None, &ctx)
        .await
        .expect("json object error body is a reply");
    assert_eq!(reply.status_code, 404);
    assert!(!reply.is_success());
    assert_eq!(reply.request_id, Some("trace-9".to_string()));
    assert_eq!(reply.body, json!({"detail": "prediction not found"}));

    let html = transport
        .get_json_reply(ProviderFamily::ReplicateStyle, &url, None, &ctx)
        .await;
    assert!(matches!(
        html,
        Err(ProviderError::Status {
            status_code: 502,
            ..
        })
    ));

    let array = transport
        .get_json_reply(ProviderFamily::ReplicateStyle, &url, None, &ctx)
        .await;
    assert!(matches!(
        array,
        Err(ProviderError::Status {
            status_code: 500,
            ..
        })
    ));

    server.shutdown();
    assert!(server.captured_requests()[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_malformed_success_body_is_a_serialization_error() {
    let mut server = MockServer::start(vec![MockResponse::new(200, vec![], "not json")]);

    let result = transport()
        .get_json_reply(
            ProviderFamily::LumaStyle,
            &format!("{}/dream-machine/v1/generations/x", server.url()),
            Some("key"),
            &AdapterContext::default(),
        )
        .await;

    assert!(matches!(result, Err(ProviderError::Serialization { .. })));
    server.shutdown();
}

#[tokio::test]
async fn test_invalid_header_name_is_rejected_before_sending() {
    let mut metadata = BTreeMap::new();
    metadata.insert("transport.header.bad header".to_string(), "v".to_string());
    let ctx = AdapterContext { metadata };

    let result = transport()
        .post_json::<Value, Value>(
            ProviderFamily::SunoStyle,
            Some("V4_5"),
            "http://127.0.0.1:9/never",
            &json!({"prompt": "x"}),
            None,
            &ctx,
        )
        .await;

    assert!(matches!(result, Err(ProviderError::Protocol { .. })));
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    let result = transport()
        .get_json_reply(
            ProviderFamily::VeoStyle,
            "http://127.0.0.1:9/api/v1/veo/record-info?taskId=t",
            None,
            &AdapterContext::default(),
        )
        .await;

    assert!(matches!(
        result,
        Err(ProviderError::Transport {
            family: ProviderFamily::VeoStyle,
            ..
        })
    ));
}
