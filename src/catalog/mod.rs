use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::core::types::{MediaKind, ProviderFamily};

/// How a route claims model ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelMatch {
    Exact(String),
    Prefix(String),
}

impl ModelMatch {
    pub fn matches(&self, model_id: &str) -> bool {
        match self {
            Self::Exact(expected) => model_id == expected,
            Self::Prefix(prefix) => model_id.starts_with(prefix.as_str()),
        }
    }

    fn pattern(&self) -> &str {
        match self {
            Self::Exact(pattern) | Self::Prefix(pattern) => pattern,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRoute {
    pub media_kind: MediaKind,
    pub matcher: ModelMatch,
    pub family: ProviderFamily,
}

impl ModelRoute {
    pub fn exact(media_kind: MediaKind, model_id: impl Into<String>, family: ProviderFamily) -> Self {
        Self {
            media_kind,
            matcher: ModelMatch::Exact(model_id.into()),
            family,
        }
    }

    pub fn prefix(media_kind: MediaKind, prefix: impl Into<String>, family: ProviderFamily) -> Self {
        Self {
            media_kind,
            matcher: ModelMatch::Prefix(prefix.into()),
            family,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let pattern = self.matcher.pattern();
        if pattern.trim().is_empty() {
            return Err(ConfigError::InvalidRoute {
                media_kind: self.media_kind,
                reason: "model pattern must not be empty".to_string(),
            });
        }
        if pattern.trim() != pattern {
            return Err(ConfigError::InvalidRoute {
                media_kind: self.media_kind,
                reason: format!("model pattern {pattern:?} has surrounding whitespace"),
            });
        }
        Ok(())
    }
}

/// Built-in routes first, then caller routes. A caller route with the same
/// media kind and matcher replaces the built-in entry in place.
pub fn merge_routes(builtin: &[ModelRoute], extra: &[ModelRoute]) -> Vec<ModelRoute> {
    let mut merged: Vec<ModelRoute> = Vec::with_capacity(builtin.len() + extra.len());

    for route in builtin.iter().chain(extra) {
        match merged.iter_mut().find(|existing| {
            existing.media_kind == route.media_kind && existing.matcher == route.matcher
        }) {
            Some(existing) => existing.family = route.family,
            None => merged.push(route.clone()),
        }
    }

    merged
}

/// Exact matches win; among prefix matches the longest prefix wins.
pub fn resolve_route(
    routes: &[ModelRoute],
    media_kind: MediaKind,
    model_id: &str,
) -> Option<ProviderFamily> {
    let candidates = routes
        .iter()
        .filter(|route| route.media_kind == media_kind && route.matcher.matches(model_id));

    let mut best: Option<(usize, ProviderFamily)> = None;
    for route in candidates {
        let rank = match &route.matcher {
            ModelMatch::Exact(_) => return Some(route.family),
            ModelMatch::Prefix(prefix) => prefix.len(),
        };
        if best.is_none_or(|(best_rank, _)| rank > best_rank) {
            best = Some((rank, route.family));
        }
    }

    best.map(|(_, family)| family)
}

pub fn export_routes_json(routes: &[ModelRoute]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(routes)
}

pub fn builtin_routes() -> Vec<ModelRoute> {
    use MediaKind::{Image, Music, Slides, Speech, Video};
    use ProviderFamily::*;

    vec![
        ModelRoute::exact(Image, "flux-kontext-pro", FluxStyle),
        ModelRoute::exact(Image, "flux-kontext-max", FluxStyle),
        ModelRoute::exact(Image, "gpt-image-1", GptImageStyle),
        ModelRoute::exact(Image, "gpt-4o-image", GptImageStyle),
        ModelRoute::exact(Image, "midjourney", MidjourneyStyle),
        ModelRoute::prefix(Image, "midjourney-", MidjourneyStyle),
        ModelRoute::prefix(Image, "google/", JobsGeneric),
        ModelRoute::prefix(Image, "bytedance/", JobsGeneric),
        ModelRoute::prefix(Image, "qwen/", JobsGeneric),
        ModelRoute::prefix(Image, "ideogram/", JobsGeneric),
        ModelRoute::prefix(Image, "black-forest-labs/", ReplicateStyle),
        ModelRoute::prefix(Image, "stability-ai/", ReplicateStyle),
        ModelRoute::prefix(Image, "recraft-ai/", ReplicateStyle),
        ModelRoute::exact(Video, "veo3", VeoStyle),
        ModelRoute::exact(Video, "veo3_fast", VeoStyle),
        ModelRoute::prefix(Video, "runway-", RunwayStyle),
        ModelRoute::prefix(Video, "kling-", KlingStyle),
        ModelRoute::prefix(Video, "ray-", LumaStyle),
        ModelRoute::prefix(Video, "bytedance/", JobsGeneric),
        ModelRoute::prefix(Video, "kling/", JobsGeneric),
        ModelRoute::prefix(Video, "wan/", JobsGeneric),
        ModelRoute::prefix(Video, "hailuo/", JobsGeneric),
        ModelRoute::prefix(Video, "minimax/", ReplicateStyle),
        ModelRoute::prefix(Video, "wan-video/", ReplicateStyle),
        ModelRoute::exact(Music, "V3_5", SunoStyle),
        ModelRoute::exact(Music, "V4", SunoStyle),
        ModelRoute::exact(Music, "V4_5", SunoStyle),
        ModelRoute::exact(Music, "V4_5PLUS", SunoStyle),
        ModelRoute::exact(Music, "V5", SunoStyle),
        ModelRoute::exact(Music, "meta/musicgen", ReplicateStyle),
        ModelRoute::prefix(Speech, "elevenlabs/", JobsGeneric),
        ModelRoute::exact(Speech, "jaaari/kokoro-82m", ReplicateStyle),
        ModelRoute::exact(Speech, "minimax/speech-02-hd", ReplicateStyle),
        ModelRoute::exact(Slides, "gamma", SlidesStyle),
        ModelRoute::prefix(Slides, "gamma-", SlidesStyle),
    ]
}

#[cfg(test)]
mod tests;
