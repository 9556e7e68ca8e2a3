use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{self, ModelRoute};
use crate::core::error::{ConfigError, GenerationError};
use crate::core::traits::PollObserver;
use crate::core::types::{
    AdapterContext, GenerationRequest, GenerationTask, MediaKind, ProviderFamily,
};
use crate::polling::{self, HttpStatusFetcher, PollPolicy, TracingPollObserver};
use crate::registry::{AdapterRegistry, ProviderAdapter};
use crate::transport::HttpTransport;
use crate::transport::http::DEFAULT_TIMEOUT_MS;

/// Submit, wait, and hand back an artifact URL or a typed error.
///
/// Immutable after `build()`; concurrent `generate` calls share it by
/// reference and each owns its task.
pub struct GenerationRuntime {
    registry: AdapterRegistry,
    transport: HttpTransport,
    adapter_context: AdapterContext,
    poll_policies: BTreeMap<MediaKind, PollPolicy>,
    observer: Arc<dyn PollObserver>,
}

pub struct GenerationRuntimeBuilder {
    timeout_ms: u64,
    client: Option<reqwest::Client>,
    adapter_context: AdapterContext,
    api_keys: BTreeMap<ProviderFamily, String>,
    base_urls: BTreeMap<ProviderFamily, String>,
    poll_policies: BTreeMap<MediaKind, PollPolicy>,
    observer: Option<Arc<dyn PollObserver>>,
    routes: Vec<ModelRoute>,
    families: Option<Vec<ProviderFamily>>,
}

impl GenerationRuntime {
    pub fn builder() -> GenerationRuntimeBuilder {
        GenerationRuntimeBuilder {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            client: None,
            adapter_context: AdapterContext::default(),
            api_keys: BTreeMap::new(),
            base_urls: BTreeMap::new(),
            poll_policies: BTreeMap::new(),
            observer: None,
            routes: Vec::new(),
            families: None,
        }
    }

    pub async fn generate(
        &self,
        media_kind: MediaKind,
        model_id: &str,
        request: &GenerationRequest,
    ) -> Result<String, GenerationError> {
        self.run_task(media_kind, model_id, request)
            .await?
            .into_artifact()
    }

    /// Like `generate`, but hands back the terminal task whatever its
    /// outcome. Errors only before polling starts.
    pub async fn run_task(
        &self,
        media_kind: MediaKind,
        model_id: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationTask, GenerationError> {
        let task = self.submit(media_kind, model_id, request).await?;
        self.resume(task).await
    }

    /// Submits once and returns the task in `Submitted` state. Nothing here
    /// is retried.
    pub async fn submit(
        &self,
        media_kind: MediaKind,
        model_id: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationTask, GenerationError> {
        let adapter = self.registry.resolve(media_kind, model_id)?;
        let family = adapter.family();
        let task_id = request
            .correlation_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let payload = adapter
            .build_submission_payload(model_id, media_kind, request)
            .map_err(|error| submission_failed(&task_id, GenerationError::submission(error, model_id)))?;

        let Some(api_key) = adapter.resolve_credential(&self.adapter_context) else {
            return Err(submission_failed(
                &task_id,
                GenerationError::SubmissionError {
                    family,
                    model: model_id.to_string(),
                    status_code: None,
                    message: format!(
                        "missing credential; set {} or configure an api key",
                        adapter.credential_env().join(" or ")
                    ),
                },
            ));
        };

        let url = adapter.submission_url(model_id, media_kind);
        debug!(
            task_id = %task_id,
            family = %family,
            model = model_id,
            media_kind = %media_kind,
            "submitting generation task"
        );

        let body: Value = self
            .transport
            .post_json(
                family,
                Some(model_id),
                &url,
                &payload,
                Some(&api_key),
                &self.adapter_context,
            )
            .await
            .map_err(|error| submission_failed(&task_id, GenerationError::submission(error, model_id)))?;

        let remote_task_id = adapter.read_remote_task_id(&body).map_err(|message| {
            submission_failed(
                &task_id,
                GenerationError::SubmissionError {
                    family,
                    model: model_id.to_string(),
                    status_code: None,
                    message,
                },
            )
        })?;

        let mut task = GenerationTask::new(task_id, media_kind, family, model_id);
        task.assign_remote_task_id(remote_task_id)?;
        debug!(
            task_id = %task.id(),
            remote_task_id = task.remote_task_id().unwrap_or_default(),
            family = %family,
            "generation task submitted"
        );

        Ok(task)
    }

    /// Polls a submitted task to a terminal state, e.g. one restored after a
    /// restart from its stored remote id.
    pub async fn resume(&self, task: GenerationTask) -> Result<GenerationTask, GenerationError> {
        let adapter = self
            .registry
            .adapter(task.provider_family())
            .ok_or_else(|| GenerationError::UnknownModel {
                media_kind: task.media_kind(),
                model: task.model_id().to_string(),
            })?;

        let fetcher = HttpStatusFetcher::new(
            &self.transport,
            adapter,
            adapter.resolve_credential(&self.adapter_context),
            &self.adapter_context,
        );
        let policy = self.poll_policy(task.media_kind());

        let task =
            polling::poll_task(task, adapter, &fetcher, &policy, self.observer.as_ref()).await?;
        info!(
            task_id = %task.id(),
            family = %task.provider_family(),
            status = %task.status(),
            attempts = task.attempts(),
            "generation task finished"
        );

        Ok(task)
    }

    pub fn poll_policy(&self, media_kind: MediaKind) -> PollPolicy {
        self.poll_policies
            .get(&media_kind)
            .copied()
            .unwrap_or_else(|| PollPolicy::for_media_kind(media_kind))
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn export_routes_json(&self) -> Result<String, serde_json::Error> {
        catalog::export_routes_json(self.registry.routes())
    }
}

fn submission_failed(task_id: &str, error: GenerationError) -> GenerationError {
    warn!(task_id, error = %error, "generation submission failed");
    error
}

impl GenerationRuntimeBuilder {
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_adapter_context(mut self, adapter_context: AdapterContext) -> Self {
        self.adapter_context = adapter_context;
        self
    }

    pub fn with_api_key(mut self, family: ProviderFamily, api_key: impl Into<String>) -> Self {
        self.api_keys.insert(family, api_key.into());
        self
    }

    pub fn with_base_url(mut self, family: ProviderFamily, base_url: impl Into<String>) -> Self {
        self.base_urls.insert(family, base_url.into());
        self
    }

    pub fn with_poll_policy(mut self, media_kind: MediaKind, policy: PollPolicy) -> Self {
        self.poll_policies.insert(media_kind, policy);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PollObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Adds a route; it replaces a built-in route with the same kind and matcher.
    pub fn with_route(mut self, route: ModelRoute) -> Self {
        self.routes.push(route);
        self
    }

    /// Restricts the runtime to `families`; models routed elsewhere become
    /// `UnknownModel`.
    pub fn with_families(mut self, families: impl IntoIterator<Item = ProviderFamily>) -> Self {
        self.families = Some(families.into_iter().collect());
        self
    }

    pub fn build(self) -> Result<GenerationRuntime, ConfigError> {
        let transport = match self.client {
            Some(client) => HttpTransport::with_client(client, self.timeout_ms)?,
            None => HttpTransport::new(self.timeout_ms)?,
        };

        for (media_kind, policy) in &self.poll_policies {
            policy.validate(*media_kind)?;
        }
        for route in &self.routes {
            route.validate()?;
        }

        let routes = catalog::merge_routes(&catalog::builtin_routes(), &self.routes);
        let mut registry = AdapterRegistry::new(routes);
        let families = self
            .families
            .unwrap_or_else(|| ProviderFamily::ALL.to_vec());

        for family in families {
            let mut adapter = ProviderAdapter::new(family);
            if let Some(base_url) = self.base_urls.get(&family) {
                adapter = adapter.with_base_url(base_url)?;
            }
            if let Some(api_key) = self.api_keys.get(&family) {
                adapter = adapter.with_api_key(api_key.clone());
            }
            registry.register(adapter);
        }

        Ok(GenerationRuntime {
            registry,
            transport,
            adapter_context: self.adapter_context,
            poll_policies: self.poll_policies,
            observer: self
                .observer
                .unwrap_or_else(|| Arc::new(TracingPollObserver)),
        })
    }
}

impl Default for GenerationRuntimeBuilder {
    fn default() -> Self {
        GenerationRuntime::builder()
    }
}
