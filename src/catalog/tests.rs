use super::*;

#[test]
fn test_builtin_routes_cover_every_family_and_validate() {
    let routes = builtin_routes();
    for family in ProviderFamily::ALL {
        assert!(
            routes.iter().any(|route| route.family == family),
            "no builtin route for {family}"
        );
    }
    for route in &routes {
        route.validate().expect("builtin route should validate");
    }
}

#[test]
fn test_builtin_routes_have_no_duplicate_matchers() {
    let routes = builtin_routes();
    for (index, route) in routes.iter().enumerate() {
        assert!(
            routes[index + 1..]
                .iter()
                .all(|other| other.media_kind != route.media_kind || other.matcher != route.matcher),
            "duplicate route {route:?}"
        );
    }
}

#[test]
fn test_resolve_known_models() {
    let routes = builtin_routes();
    let cases = [
        (MediaKind::Image, "flux-kontext-pro", ProviderFamily::FluxStyle),
        (MediaKind::Image, "gpt-image-1", ProviderFamily::GptImageStyle),
        (MediaKind::Image, "midjourney", ProviderFamily::MidjourneyStyle),
        (MediaKind::Image, "google/nano-banana", ProviderFamily::JobsGeneric),
        (MediaKind::Image, "black-forest-labs/flux-schnell", ProviderFamily::ReplicateStyle),
        (MediaKind::Video, "veo3_fast", ProviderFamily::VeoStyle),
        (MediaKind::Video, "runway-gen4", ProviderFamily::RunwayStyle),
        (MediaKind::Video, "kling-v2-1-master", ProviderFamily::KlingStyle),
        (MediaKind::Video, "kling/v2-1-standard", ProviderFamily::JobsGeneric),
        (MediaKind::Video, "ray-2", ProviderFamily::LumaStyle),
        (MediaKind::Video, "bytedance/seedance-1-lite", ProviderFamily::JobsGeneric),
        (MediaKind::Music, "V4_5", ProviderFamily::SunoStyle),
        (MediaKind::Music, "meta/musicgen", ProviderFamily::ReplicateStyle),
        (
            MediaKind::Speech,
            "elevenlabs/text-to-speech-multilingual-v2",
            ProviderFamily::JobsGeneric,
        ),
        (MediaKind::Slides, "gamma", ProviderFamily::SlidesStyle),
    ];

    for (media_kind, model_id, expected) in cases {
        assert_eq!(
            resolve_route(&routes, media_kind, model_id),
            Some(expected),
            "{media_kind}/{model_id}"
        );
    }
}

#[test]
fn test_resolve_is_scoped_by_media_kind() {
    let routes = builtin_routes();
    assert_eq!(resolve_route(&routes, MediaKind::Video, "flux-kontext-pro"), None);
    assert_eq!(resolve_route(&routes, MediaKind::Image, "veo3"), None);
    assert_eq!(resolve_route(&routes, MediaKind::Image, "dall-e-9"), None);
}

#[test]
fn test_exact_beats_prefix_and_longest_prefix_wins() {
    let routes = vec![
        ModelRoute::prefix(MediaKind::Video, "acme/", ProviderFamily::JobsGeneric),
        ModelRoute::prefix(MediaKind::Video, "acme/turbo-", ProviderFamily::ReplicateStyle),
        ModelRoute::exact(MediaKind::Video, "acme/turbo-2", ProviderFamily::LumaStyle),
    ];

    assert_eq!(
        resolve_route(&routes, MediaKind::Video, "acme/slow"),
        Some(ProviderFamily::JobsGeneric)
    );
    assert_eq!(
        resolve_route(&routes, MediaKind::Video, "acme/turbo-3"),
        Some(ProviderFamily::ReplicateStyle)
    );
    assert_eq!(
        resolve_route(&routes, MediaKind::Video, "acme/turbo-2"),
        Some(ProviderFamily::LumaStyle)
    );
}

#[test]
fn test_merge_routes_replaces_same_matcher_and_appends_new() {
    let builtin = vec![
        ModelRoute::exact(MediaKind::Video, "veo3", ProviderFamily::VeoStyle),
        ModelRoute::exact(MediaKind::Image, "midjourney", ProviderFamily::MidjourneyStyle),
    ];
    let extra = vec![
        ModelRoute::exact(MediaKind::Video, "veo3", ProviderFamily::JobsGeneric),
        ModelRoute::prefix(MediaKind::Video, "acme/", ProviderFamily::ReplicateStyle),
    ];

    let merged = merge_routes(&builtin, &extra);

    assert_eq!(
        merged,
        vec![
            ModelRoute::exact(MediaKind::Video, "veo3", ProviderFamily::JobsGeneric),
            ModelRoute::exact(MediaKind::Image, "midjourney", ProviderFamily::MidjourneyStyle),
            ModelRoute::prefix(MediaKind::Video, "acme/", ProviderFamily::ReplicateStyle),
        ]
    );
}

#[test]
fn test_validate_rejects_blank_patterns() {
    let blank = ModelRoute::prefix(MediaKind::Image, "  ", ProviderFamily::FluxStyle);
    assert!(matches!(
        blank.validate(),
        Err(ConfigError::InvalidRoute {
            media_kind: MediaKind::Image,
            ..
        })
    ));

    let padded = ModelRoute::exact(MediaKind::Image, " gpt-image-1", ProviderFamily::GptImageStyle);
    assert!(padded.validate().is_err());
}

#[test]
fn test_route_json_shape() {
    let routes = vec![ModelRoute::exact(MediaKind::Video, "veo3", ProviderFamily::VeoStyle)];
    let exported = export_routes_json(&routes).expect("routes should serialize");
    let value: serde_json::Value = serde_json::from_str(&exported).expect("export should be json");

    assert_eq!(
        value,
        serde_json::json!([{"media_kind": "video", "matcher": {"exact": "veo3"}, "family": "veo-style"}])
    );

    let parsed: Vec<ModelRoute> = serde_json::from_str(&exported).expect("export should parse");
    assert_eq!(parsed, routes);
}
