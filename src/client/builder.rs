use crate::adapters::ProviderAdapter;
use crate::catalog::ModelCatalog;
use crate::client::core::SuiteClient;
use crate::fallback::FallbackPolicy;
use crate::request::{RequestBuilder, SystemInstructions, HISTORY_WINDOW};
use crate::telemetry::ResolutionSink;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Builder for [`SuiteClient`].
///
/// Keep this surface area small and predictable. Tests use it to register
/// scripted adapters; the server goes through [`SuiteClient::from_config`].
pub struct SuiteClientBuilder {
    catalog: Option<ModelCatalog>,
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    instructions: SystemInstructions,
    history_window: usize,
    policy: FallbackPolicy,
    sink: Arc<dyn ResolutionSink>,
}

impl SuiteClientBuilder {
    pub fn new() -> Self {
        Self {
            catalog: None,
            adapters: Vec::new(),
            instructions: SystemInstructions::default(),
            history_window: HISTORY_WINDOW,
            policy: FallbackPolicy::default(),
            sink: crate::telemetry::noop_sink(),
        }
    }

    /// Inject the model catalog. Default is [`ModelCatalog::default`].
    pub fn catalog(mut self, catalog: ModelCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Register an adapter; a later adapter for the same backend replaces the earlier one.
    pub fn adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn instructions(mut self, instructions: SystemInstructions) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Inject a resolution sink. Default is a no-op sink.
    pub fn sink(mut self, sink: Arc<dyn ResolutionSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn build(self) -> Result<SuiteClient> {
        let adapters: HashMap<_, _> = self
            .adapters
            .into_iter()
            .map(|a| (a.backend(), a))
            .collect();
        Ok(SuiteClient {
            catalog: Arc::new(self.catalog.unwrap_or_default()),
            adapters,
            builder: RequestBuilder::new(self.instructions).with_history_window(self.history_window),
            policy: self.policy,
            sink: self.sink,
        })
    }
}

impl Default for SuiteClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
