use crate::adapters::{AdapterOutput, ChatCompletionsAdapter, GeminiAdapter, ProviderAdapter};
use crate::catalog::{Backend, ModelCatalog, ModelDescriptor};
use crate::client::types::GenerateResponse;
use crate::client::validation::validate_request;
use crate::config::SuiteConfig;
use crate::fallback::{resolve_with_fallback, AttemptError, FallbackPolicy};
use crate::request::{GenerateRequest, RequestBuilder};
use crate::telemetry::{ResolutionSink, TracingSink};
use crate::transport::HttpTransport;
use crate::types::Attachment;
use crate::{Error, ErrorContext, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, Instrument};

/// Entry point for generation: picks candidates, shapes requests and walks
/// the fallback loop across adapters.
///
/// Holds no per-request mutable state; one instance serves concurrent callers.
pub struct SuiteClient {
    pub(crate) catalog: Arc<ModelCatalog>,
    pub(crate) adapters: HashMap<Backend, Arc<dyn ProviderAdapter>>,
    pub(crate) builder: RequestBuilder,
    pub(crate) policy: FallbackPolicy,
    pub(crate) sink: Arc<dyn ResolutionSink>,
}

impl std::fmt::Debug for SuiteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteClient")
            .field("catalog", &self.catalog)
            .field("backends", &self.adapters.keys().collect::<Vec<_>>())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl SuiteClient {
    pub fn builder() -> crate::client::SuiteClientBuilder {
        crate::client::SuiteClientBuilder::new()
    }

    /// Wire every backend from configuration, resolving credentials once.
    /// Resolution events go to the `pen2pdf::resolution` log target.
    pub fn from_config(config: &SuiteConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config.http)?);
        let mut builder = Self::builder()
            .catalog(config.catalog())
            .instructions(config.instructions())
            .policy(config.fallback_policy())
            .sink(Arc::new(TracingSink));

        for backend in Backend::ALL {
            let provider = config.providers.get(backend);
            let api_key = config.resolve_api_key(backend);
            if api_key.is_none() {
                tracing::warn!(backend = backend.as_str(), "no credential configured");
            }
            let adapter: Arc<dyn ProviderAdapter> = match backend {
                Backend::Gemini => {
                    let mut a = GeminiAdapter::new(transport.clone(), api_key)
                        .with_history_mode(provider.history_mode(backend))
                        .with_generation(provider.temperature, provider.max_tokens);
                    if let Some(url) = &provider.base_url {
                        a = a.with_base_url(url.clone());
                    }
                    Arc::new(a)
                }
                Backend::GithubModels | Backend::Longcat => {
                    let mut a = ChatCompletionsAdapter::new(backend, transport.clone(), api_key)
                        .with_history_mode(provider.history_mode(backend))
                        .with_generation(provider.temperature, provider.max_tokens);
                    if let Some(url) = &provider.base_url {
                        a = a.with_base_url(url.clone());
                    }
                    Arc::new(a)
                }
            };
            builder = builder.adapter(adapter);
        }
        builder.build()
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn adapter(&self, backend: Backend) -> Option<&Arc<dyn ProviderAdapter>> {
        self.adapters.get(&backend)
    }

    pub fn is_backend_configured(&self, backend: Backend) -> bool {
        self.adapters
            .get(&backend)
            .map(|a| a.is_configured())
            .unwrap_or(false)
    }

    /// Ordered candidates for a request: the explicit model alone, or the
    /// task list (with a preferred model moved to the front).
    pub fn candidates_for(&self, request: &GenerateRequest) -> Result<Vec<ModelDescriptor>> {
        if let Some(model) = request.model.as_deref() {
            return Ok(vec![self.catalog.resolve(model)]);
        }
        match request.preferred_model.as_deref() {
            Some(preferred) => self.catalog.candidates_preferring(request.task, preferred),
            None => self.catalog.candidates(request.task),
        }
    }

    /// File-policy check for an upload against the first candidate of `request`.
    pub fn check_attachment(&self, request: &GenerateRequest, attachment: &Attachment) -> Result<()> {
        let candidates = self.candidates_for(request)?;
        match candidates.first() {
            Some(first) => RequestBuilder::check_attachments(first, std::slice::from_ref(attachment)),
            None => Ok(()),
        }
    }

    /// Resolve one request across its candidates.
    pub async fn generate_response(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let span = info_span!(
            "generate",
            task = request.task.as_str(),
            model = request.model.as_deref().unwrap_or("auto")
        );
        async move {
            validate_request(request)?;
            let candidates = self.candidates_for(request)?;
            let started = Instant::now();

            let resolved = resolve_with_fallback(&candidates, &self.policy, self.sink.as_ref(), |model| {
                self.attempt(model, request)
            })
            .await?;

            let backend = candidates
                .iter()
                .find(|c| c.id == resolved.model_used)
                .map(|c| c.backend)
                .unwrap_or_else(|| Backend::infer(&resolved.model_used));
            let output = resolved.value;
            info!(
                model_used = %resolved.model_used,
                attempts = resolved.attempted.len(),
                extracted_from = output.extracted_from,
                response_preview = %preview(&output.text, 200),
                "response generated"
            );
            Ok(GenerateResponse {
                text: output.text,
                model_used: resolved.model_used,
                backend,
                attempted: resolved.attempted,
                metadata: output.metadata,
                usage: output.usage,
                request_id: resolved.request_id,
                duration_ms: started.elapsed().as_millis() as u64,
            })
        }
        .instrument(span)
        .await
    }

    /// [`generate_response`](Self::generate_response) bounded by a caller deadline.
    /// On expiry the in-flight call is dropped.
    pub async fn generate_within(
        &self,
        request: &GenerateRequest,
        deadline: Duration,
    ) -> Result<GenerateResponse> {
        tokio::time::timeout(deadline, self.generate_response(request))
            .await
            .map_err(|_| Error::DeadlineExceeded {
                deadline_ms: deadline.as_millis() as u64,
            })?
    }

    /// Ask a backend for its current model list and swap it into the catalog.
    /// Returns whether the list changed; failures keep the existing list.
    pub async fn refresh_models(&self, backend: Backend) -> Result<bool> {
        let adapter = self.adapter_for(backend)?;
        let discovered = adapter.discover_models().await?;
        Ok(self.catalog.refresh(backend, discovered))
    }

    fn adapter_for(&self, backend: Backend) -> Result<&Arc<dyn ProviderAdapter>> {
        self.adapters.get(&backend).ok_or_else(|| {
            Error::configuration_with_context(
                format!("no adapter registered for backend {}", backend),
                ErrorContext::new()
                    .with_field_path(format!("providers.{}", backend.as_str()))
                    .with_source("suite_client"),
            )
        })
    }

    /// One candidate: shape (file policy first), check credentials, call.
    async fn attempt(
        &self,
        model: ModelDescriptor,
        request: &GenerateRequest,
    ) -> std::result::Result<AdapterOutput, AttemptError> {
        let provider_request = self
            .builder
            .build(&model, request)
            .map_err(AttemptError::Rejected)?;
        let adapter = self.adapter_for(model.backend).map_err(AttemptError::Rejected)?;
        adapter.ensure_configured().map_err(AttemptError::Rejected)?;
        adapter
            .invoke(&model, &provider_request)
            .await
            .map_err(AttemptError::Failed)
    }
}

/// First `max` characters, with an ellipsis when cut.
pub fn preview(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
