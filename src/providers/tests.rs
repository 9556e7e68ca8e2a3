use serde_json::{Value, json};

use crate::core::types::{CanonicalStatus, ProviderFamily};

struct Fixture {
    family: ProviderFamily,
    success: Value,
    failure: Value,
    /// Failure signal next to a result-like field.
    contradictory: Value,
}

fn fixtures() -> Vec<Fixture> {
    let url = "https://cdn.example/out/result.bin";
    vec![
        Fixture {
            family: ProviderFamily::FluxStyle,
            success: json!({"code": 200, "data": {"successFlag": 1, "response": {"resultImageUrl": url}}}),
            failure: json!({"code": 200, "data": {"successFlag": 3, "errorMessage": "nsfw"}}),
            contradictory: json!({"code": 200, "data": {"successFlag": 2, "response": {"resultImageUrl": url}}}),
        },
        Fixture {
            family: ProviderFamily::GptImageStyle,
            success: json!({"code": 200, "data": {"successFlag": 1, "response": {"resultUrls": [url]}}}),
            failure: json!({"code": 200, "data": {"successFlag": 2, "errorMessage": "content policy"}}),
            contradictory: json!({"code": 200, "data": {"status": "GENERATE_FAILED", "response": {"resultUrls": [url]}}}),
        },
        Fixture {
            family: ProviderFamily::MidjourneyStyle,
            success: json!({"code": 200, "data": {"successFlag": 1, "resultInfoJson": {"resultUrls": [{"resultUrl": url}]}}}),
            failure: json!({"code": 200, "data": {"successFlag": 3, "errorMessage": "banned prompt"}}),
            contradictory: json!({"code": 200, "data": {"successFlag": 1, "errorCode": 500, "resultUrls": [url]}}),
        },
        Fixture {
            family: ProviderFamily::JobsGeneric,
            success: json!({"code": 200, "data": {"state": "success", "resultJson": format!("{{\"resultUrls\":[\"{url}\"]}}")}}),
            failure: json!({"code": 200, "data": {"state": "fail", "failCode": "500", "failMsg": "internal error"}}),
            contradictory: json!({"code": 200, "data": {"state": "success", "failMsg": "partial", "resultUrls": [url]}}),
        },
        Fixture {
            family: ProviderFamily::VeoStyle,
            success: json!({"code": 200, "data": {"successFlag": 1, "response": {"resultUrls": [url]}}}),
            failure: json!({"code": 200, "data": {"successFlag": 2, "errorMessage": "public error"}}),
            contradictory: json!({"code": 200, "data": {"successFlag": 3, "info": {"resultUrls": [url]}}}),
        },
        Fixture {
            family: ProviderFamily::RunwayStyle,
            success: json!({"code": 200, "data": {"state": "success", "videoInfo": {"videoUrl": url}}}),
            failure: json!({"code": 200, "data": {"state": "fail", "failMsg": "moderation"}}),
            contradictory: json!({"code": 200, "data": {"state": "fail", "videoUrl": url}}),
        },
        Fixture {
            family: ProviderFamily::SunoStyle,
            success: json!({"code": 200, "data": {"status": "SUCCESS", "response": {"sunoData": [{"audioUrl": url}]}}}),
            failure: json!({"code": 200, "data": {"status": "GENERATE_AUDIO_FAILED", "errorMessage": "artist name"}}),
            contradictory: json!({"code": 200, "data": {"status": "SENSITIVE_WORD_ERROR", "response": {"sunoData": [{"audioUrl": url}]}}}),
        },
        Fixture {
            family: ProviderFamily::KlingStyle,
            success: json!({"code": 0, "data": {"task_status": "succeed", "task_result": {"videos": [{"url": url}]}}}),
            failure: json!({"code": 0, "data": {"task_status": "failed", "task_status_msg": "risk control"}}),
            contradictory: json!({"code": 1303, "message": "quota", "data": {"task_result": {"videos": [{"url": url}]}}}),
        },
        Fixture {
            family: ProviderFamily::LumaStyle,
            success: json!({"state": "completed", "assets": {"video": url}}),
            failure: json!({"state": "failed", "failure_reason": "prompt rejected"}),
            contradictory: json!({"state": "completed", "failure_reason": "upscale failed", "assets": {"video": url}}),
        },
        Fixture {
            family: ProviderFamily::ReplicateStyle,
            success: json!({"status": "succeeded", "output": [url]}),
            failure: json!({"status": "failed", "error": "NSFW content detected"}),
            contradictory: json!({"status": "processing", "error": "worker crashed", "output": url}),
        },
        Fixture {
            family: ProviderFamily::SlidesStyle,
            success: json!({"status": "completed", "exportUrl": url}),
            failure: json!({"status": "failed", "error": {"message": "too many cards"}}),
            contradictory: json!({"status": "failed", "gammaUrl": url}),
        },
    ]
}

#[test]
fn test_every_family_has_a_fixture() {
    let covered = fixtures()
        .into_iter()
        .map(|fixture| fixture.family)
        .collect::<Vec<_>>();
    assert_eq!(covered, ProviderFamily::ALL.to_vec());
}

#[test]
fn test_success_fixtures_yield_succeeded_with_url() {
    for fixture in fixtures() {
        let codec = fixture.family.codec();
        let reading = codec.normalize(&fixture.success);
        assert_eq!(reading.status, CanonicalStatus::Succeeded, "{}", fixture.family);
        assert!(reading.success_signal.is_some(), "{}", fixture.family);

        let url = codec.extract(&fixture.success);
        assert!(
            url.as_deref().is_some_and(|url| !url.is_empty()),
            "{} extracted {url:?}",
            fixture.family
        );
    }
}

#[test]
fn test_failure_fixtures_yield_failed_with_detail() {
    for fixture in fixtures() {
        let codec = fixture.family.codec();
        let reading = codec.normalize(&fixture.failure);
        assert_eq!(reading.status, CanonicalStatus::Failed, "{}", fixture.family);
        assert!(reading.failure_signal.is_some(), "{}", fixture.family);

        let detail = codec.failure_detail(&fixture.failure);
        assert!(
            detail.as_deref().is_some_and(|detail| !detail.is_empty()),
            "{} detail {detail:?}",
            fixture.family
        );
    }
}

#[test]
fn test_failure_signal_beats_result_like_field() {
    for fixture in fixtures() {
        let codec = fixture.family.codec();
        assert!(
            codec.extract(&fixture.contradictory).is_some(),
            "{} fixture should carry a result",
            fixture.family
        );
        assert_eq!(
            codec.normalize(&fixture.contradictory).status,
            CanonicalStatus::Failed,
            "{}",
            fixture.family
        );
    }
}

#[test]
fn test_empty_object_is_pending_for_every_family() {
    for family in ProviderFamily::ALL {
        let reading = family.codec().normalize(&json!({}));
        assert_eq!(reading.status, CanonicalStatus::Pending, "{family}");
        assert_eq!(reading.success_signal, None);
        assert_eq!(reading.failure_signal, None);
    }
}

#[test]
fn test_codec_reports_its_own_family() {
    for family in ProviderFamily::ALL {
        assert_eq!(family.codec().family(), family);
        assert!(!family.codec().credential_env().is_empty());
    }
}
