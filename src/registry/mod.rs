use std::fmt;

use indexmap::IndexMap;
use reqwest::Url;
use serde_json::Value;

use crate::catalog::{self, ModelRoute};
use crate::core::error::{ConfigError, GenerationError, ProviderError};
use crate::core::types::{
    AdapterContext, GenerationRequest, MediaKind, ProviderFamily, StatusReading,
};
use crate::providers::family_contract::{FamilyCodec, FamilyEndpoints, StatusLocator};

/// Metadata key suffix for a per-family credential, e.g. `kling-style.api_key`.
const API_KEY_METADATA_SUFFIX: &str = ".api_key";

/// Static, read-only configuration for one provider family.
#[derive(Clone)]
pub struct ProviderAdapter {
    family: ProviderFamily,
    base_url: String,
    api_key: Option<String>,
    codec: &'static dyn FamilyCodec,
}

impl ProviderAdapter {
    pub fn new(family: ProviderFamily) -> Self {
        let codec = family.codec();

        Self {
            family,
            base_url: codec.endpoints().default_base_url.to_string(),
            api_key: None,
            codec,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        let parsed = parse_base_url(self.family, base_url)?;
        self.base_url = parsed.as_str().trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.trim().is_empty()).then_some(api_key);
        self
    }

    pub fn family(&self) -> ProviderFamily {
        self.family
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoints(&self) -> FamilyEndpoints {
        self.codec.endpoints()
    }

    pub fn build_submission_payload(
        &self,
        model_id: &str,
        media_kind: MediaKind,
        request: &GenerationRequest,
    ) -> Result<Value, ProviderError> {
        self.codec.build_payload(model_id, media_kind, request)
    }

    pub fn submission_url(&self, model_id: &str, media_kind: MediaKind) -> String {
        format!(
            "{}{}",
            self.base_url(),
            self.codec.submit_path(model_id, media_kind)
        )
    }

    pub fn status_url(&self, remote_task_id: &str) -> Result<String, ProviderError> {
        let endpoints = self.codec.endpoints();
        let raw = format!("{}{}", self.base_url(), endpoints.status_path);
        let mut url = Url::parse(&raw).map_err(|error| ProviderError::Protocol {
            family: self.family,
            model: None,
            request_id: None,
            message: format!("invalid status url {raw}: {error}"),
        })?;

        match endpoints.status_locator {
            StatusLocator::Query(param) => {
                url.query_pairs_mut().append_pair(param, remote_task_id);
            }
            StatusLocator::PathSegment => {
                url.path_segments_mut()
                    .map_err(|()| ProviderError::Protocol {
                        family: self.family,
                        model: None,
                        request_id: None,
                        message: format!("status url {raw} cannot take a path segment"),
                    })?
                    .pop_if_empty()
                    .push(remote_task_id);
            }
        }

        Ok(url.into())
    }

    /// Explicit key, then `AdapterContext.metadata["<family>.api_key"]`, then
    /// the family's environment variables.
    pub fn resolve_credential(&self, ctx: &AdapterContext) -> Option<String> {
        self.resolve_credential_with(ctx, |name| std::env::var(name).ok())
    }

    pub(crate) fn resolve_credential_with(
        &self,
        ctx: &AdapterContext,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        if let Some(api_key) = &self.api_key {
            return Some(api_key.clone());
        }

        let metadata_key = format!("{}{API_KEY_METADATA_SUFFIX}", self.family);
        if let Some(api_key) = ctx.metadata.get(&metadata_key).filter(|key| !key.trim().is_empty())
        {
            return Some(api_key.clone());
        }

        self.codec
            .credential_env()
            .iter()
            .find_map(|name| env(name).filter(|value| !value.trim().is_empty()))
    }

    pub fn credential_env(&self) -> &'static [&'static str] {
        self.codec.credential_env()
    }

    pub fn read_remote_task_id(&self, body: &Value) -> Result<String, String> {
        self.codec.remote_task_id(body)
    }

    pub fn normalize(&self, body: &Value) -> StatusReading {
        self.codec.normalize(body)
    }

    pub fn extract(&self, body: &Value) -> Option<String> {
        self.codec.extract(body)
    }

    pub fn failure_detail(&self, body: &Value) -> Option<String> {
        self.codec.failure_detail(body)
    }
}

impl fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("family", &self.family)
            .field("base_url", &self.base_url())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn parse_base_url(family: ProviderFamily, base_url: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(base_url.trim()).map_err(|error| ConfigError::InvalidBaseUrl {
        family,
        reason: error.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl {
            family,
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidBaseUrl {
            family,
            reason: "base url must not carry a query or fragment".to_string(),
        });
    }

    Ok(url)
}

/// Maps `(media kind, model id)` to the adapter that serves it.
///
/// Built once and read-only afterwards, so `&AdapterRegistry` is shared
/// across concurrent generations without locking.
#[derive(Debug, Clone)]
pub struct AdapterRegistry {
    adapters: IndexMap<ProviderFamily, ProviderAdapter>,
    routes: Vec<ModelRoute>,
}

impl AdapterRegistry {
    pub fn new(routes: Vec<ModelRoute>) -> Self {
        Self {
            adapters: IndexMap::new(),
            routes,
        }
    }

    /// Registers `adapter`, replacing any adapter of the same family.
    pub fn register(&mut self, adapter: ProviderAdapter) {
        self.adapters.insert(adapter.family(), adapter);
    }

    pub fn add_route(&mut self, route: ModelRoute) -> Result<(), ConfigError> {
        route.validate()?;
        self.routes = catalog::merge_routes(&self.routes, std::slice::from_ref(&route));
        Ok(())
    }

    pub fn resolve(
        &self,
        media_kind: MediaKind,
        model_id: &str,
    ) -> Result<&ProviderAdapter, GenerationError> {
        catalog::resolve_route(&self.routes, media_kind, model_id)
            .and_then(|family| self.adapters.get(&family))
            .ok_or_else(|| GenerationError::UnknownModel {
                media_kind,
                model: model_id.to_string(),
            })
    }

    pub fn adapter(&self, family: ProviderFamily) -> Option<&ProviderAdapter> {
        self.adapters.get(&family)
    }

    pub fn adapters(&self) -> impl Iterator<Item = &ProviderAdapter> {
        self.adapters.values()
    }

    pub fn routes(&self) -> &[ModelRoute] {
        &self.routes
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        let mut registry = Self::new(catalog::builtin_routes());
        for family in ProviderFamily::ALL {
            registry.register(ProviderAdapter::new(family));
        }
        registry
    }
}

#[cfg(test)]
mod tests;
