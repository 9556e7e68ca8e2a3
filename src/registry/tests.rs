use std::collections::BTreeMap;

use serde_json::json;

use super::*;
use crate::core::types::CanonicalStatus;

fn ctx_with(entries: &[(&str, &str)]) -> AdapterContext {
    AdapterContext {
        metadata: entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<BTreeMap<_, _>>(),
    }
}

#[test]
fn test_default_registry_resolves_every_builtin_route() {
    let registry = AdapterRegistry::default();
    for route in registry.routes() {
        let model_id = match &route.matcher {
            catalog::ModelMatch::Exact(model_id) => model_id.clone(),
            catalog::ModelMatch::Prefix(prefix) => format!("{prefix}probe"),
        };
        let adapter = registry
            .resolve(route.media_kind, &model_id)
            .expect("builtin route should resolve");
        assert_eq!(adapter.family(), route.family, "{model_id}");
    }
}

#[test]
fn test_unknown_pair_is_unknown_model() {
    let registry = AdapterRegistry::default();
    let error = registry
        .resolve(MediaKind::Image, "dall-e-9")
        .expect_err("unrouted model");
    assert_eq!(
        error,
        GenerationError::UnknownModel {
            media_kind: MediaKind::Image,
            model: "dall-e-9".to_string(),
        }
    );
}

#[test]
fn test_route_without_adapter_is_unknown_model() {
    let mut registry = AdapterRegistry::new(catalog::builtin_routes());
    registry.register(ProviderAdapter::new(ProviderFamily::VeoStyle));

    assert!(registry.resolve(MediaKind::Video, "veo3").is_ok());
    assert!(matches!(
        registry.resolve(MediaKind::Video, "ray-2"),
        Err(GenerationError::UnknownModel { .. })
    ));
}

#[test]
fn test_register_replaces_same_family_in_place() {
    let mut registry = AdapterRegistry::new(Vec::new());
    registry.register(ProviderAdapter::new(ProviderFamily::LumaStyle));
    registry.register(ProviderAdapter::new(ProviderFamily::KlingStyle));
    registry.register(
        ProviderAdapter::new(ProviderFamily::LumaStyle)
            .with_base_url("http://127.0.0.1:8080/")
            .expect("valid base url"),
    );

    let families = registry
        .adapters()
        .map(ProviderAdapter::family)
        .collect::<Vec<_>>();
    assert_eq!(
        families,
        vec![ProviderFamily::LumaStyle, ProviderFamily::KlingStyle]
    );
    assert_eq!(
        registry
            .adapter(ProviderFamily::LumaStyle)
            .map(ProviderAdapter::base_url),
        Some("http://127.0.0.1:8080")
    );
}

#[test]
fn test_add_route_overrides_builtin_and_validates() {
    let mut registry = AdapterRegistry::default();
    registry
        .add_route(ModelRoute::exact(
            MediaKind::Video,
            "veo3",
            ProviderFamily::JobsGeneric,
        ))
        .expect("valid route");

    assert_eq!(
        registry
            .resolve(MediaKind::Video, "veo3")
            .map(ProviderAdapter::family),
        Ok(ProviderFamily::JobsGeneric)
    );

    assert!(matches!(
        registry.add_route(ModelRoute::prefix(MediaKind::Video, "", ProviderFamily::VeoStyle)),
        Err(ConfigError::InvalidRoute { .. })
    ));
}

#[test]
fn test_status_url_query_and_path_placement() {
    let flux = ProviderAdapter::new(ProviderFamily::FluxStyle);
    assert_eq!(
        flux.status_url("task 1&x").expect("status url"),
        "https://api.kie.ai/api/v1/flux/kontext/record-info?taskId=task+1%26x"
    );

    let luma = ProviderAdapter::new(ProviderFamily::LumaStyle)
        .with_base_url("http://127.0.0.1:9000/proxy/")
        .expect("valid base url");
    assert_eq!(
        luma.status_url("lm-1").expect("status url"),
        "http://127.0.0.1:9000/proxy/dream-machine/v1/generations/lm-1"
    );
}

#[test]
fn test_submission_url_uses_family_path() {
    let replicate = ProviderAdapter::new(ProviderFamily::ReplicateStyle);
    assert_eq!(
        replicate.submission_url("meta/musicgen", MediaKind::Music),
        "https://api.replicate.com/v1/models/meta/musicgen/predictions"
    );

    let suno = ProviderAdapter::new(ProviderFamily::SunoStyle);
    assert_eq!(
        suno.submission_url("V4_5", MediaKind::Music),
        "https://api.kie.ai/api/v1/generate"
    );
}

#[test]
fn test_invalid_base_urls_are_rejected() {
    for base_url in ["not a url", "ftp://files.example", "https://x.example/?a=1"] {
        let result = ProviderAdapter::new(ProviderFamily::KlingStyle).with_base_url(base_url);
        assert!(
            matches!(
                result,
                Err(ConfigError::InvalidBaseUrl {
                    family: ProviderFamily::KlingStyle,
                    ..
                })
            ),
            "{base_url}"
        );
    }
}

#[test]
fn test_credential_resolution_order() {
    let env = |name: &str| (name == "KLING_API_KEY").then(|| "from-env".to_string());

    let adapter = ProviderAdapter::new(ProviderFamily::KlingStyle);
    assert_eq!(
        adapter.resolve_credential_with(&AdapterContext::default(), env),
        Some("from-env".to_string())
    );

    let ctx = ctx_with(&[("kling-style.api_key", "from-metadata")]);
    assert_eq!(
        adapter.resolve_credential_with(&ctx, env),
        Some("from-metadata".to_string())
    );

    let explicit = adapter.clone().with_api_key("explicit");
    assert_eq!(
        explicit.resolve_credential_with(&ctx, env),
        Some("explicit".to_string())
    );

    let blank = ctx_with(&[("kling-style.api_key", "  ")]);
    assert_eq!(
        adapter.resolve_credential_with(&blank, |_| None),
        None
    );
}

#[test]
fn test_debug_redacts_api_key() {
    let adapter = ProviderAdapter::new(ProviderFamily::SlidesStyle).with_api_key("sk-secret");
    let rendered = format!("{adapter:?}");
    assert!(!rendered.contains("sk-secret"));
    assert!(rendered.contains("<redacted>"));
}

#[test]
fn test_adapter_delegates_to_family_codec() {
    let adapter = ProviderAdapter::new(ProviderFamily::FluxStyle);
    let body = json!({
        "code": 200,
        "data": {"successFlag": 1, "response": {"resultImageUrl": "https://cdn.example/f.png"}}
    });

    assert_eq!(adapter.normalize(&body).status, CanonicalStatus::Succeeded);
    assert_eq!(
        adapter.extract(&body),
        Some("https://cdn.example/f.png".to_string())
    );
    assert_eq!(
        adapter.read_remote_task_id(&json!({"code": 200, "data": {"taskId": "abc123"}})),
        Ok("abc123".to_string())
    );
    assert_eq!(adapter.credential_env(), &["KIE_API_KEY"]);
}
