//! OpenAI-compatible chat completions adapter, shared by GitHub Models and LongCat.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use super::{finish, AdapterOutput, ProviderAdapter};
use crate::catalog::{Backend, ModelDescriptor};
use crate::fallback::ProviderFailure;
use crate::request::{HistoryMode, ProviderRequest};
use crate::transport::{Auth, HttpTransport};
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_GITHUB_MODELS_BASE_URL: &str = "https://models.inference.ai.azure.com";
pub const DEFAULT_LONGCAT_BASE_URL: &str = "https://api.longcat.chat/openai/v1";

#[derive(Debug)]
pub struct ChatCompletionsAdapter {
    backend: Backend,
    transport: Arc<HttpTransport>,
    base_url: String,
    api_key: Option<String>,
    history_mode: HistoryMode,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
}

impl ChatCompletionsAdapter {
    pub fn new(backend: Backend, transport: Arc<HttpTransport>, api_key: Option<String>) -> Self {
        let (base_url, history_mode) = match backend {
            Backend::Longcat => (DEFAULT_LONGCAT_BASE_URL, HistoryMode::Flattened),
            _ => (DEFAULT_GITHUB_MODELS_BASE_URL, HistoryMode::Structured),
        };
        Self {
            backend,
            transport,
            base_url: base_url.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            history_mode,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn github_models(transport: Arc<HttpTransport>, pat: Option<String>) -> Self {
        Self::new(Backend::GithubModels, transport, pat)
    }

    pub fn longcat(transport: Arc<HttpTransport>, api_key: Option<String>) -> Self {
        Self::new(Backend::Longcat, transport, api_key)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_history_mode(mut self, mode: HistoryMode) -> Self {
        self.history_mode = mode;
        self
    }

    pub fn with_generation(mut self, temperature: Option<f64>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn user_content(request: &ProviderRequest) -> Value {
        if request.inline_parts.is_empty() {
            return json!(request.user_text);
        }
        let mut blocks = Vec::with_capacity(request.inline_parts.len() + 1);
        if !request.user_text.is_empty() {
            blocks.push(json!({ "type": "text", "text": request.user_text }));
        }
        for part in &request.inline_parts {
            blocks.push(json!({
                "type": "image_url",
                "image_url": { "url": format!("data:{};base64,{}", part.mime_type, part.data_base64) }
            }));
        }
        Value::Array(blocks)
    }
}

#[async_trait]
impl ProviderAdapter for ChatCompletionsAdapter {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn history_mode(&self) -> HistoryMode {
        self.history_mode
    }

    fn credential_label(&self) -> &'static str {
        match self.backend {
            Backend::Longcat => "LongCat API key",
            _ => "GitHub Models PAT",
        }
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn build_body(&self, model: &ModelDescriptor, request: &ProviderRequest) -> Value {
        let mut messages = vec![json!({ "role": "system", "content": request.system_instruction })];

        match self.history_mode {
            HistoryMode::Structured => {
                messages.extend(
                    request
                        .history
                        .iter()
                        .map(|t| json!({ "role": t.role.as_str(), "content": t.content })),
                );
            }
            HistoryMode::Flattened => {
                if let Some(block) = request.flattened_history() {
                    messages.push(json!({ "role": "system", "content": block }));
                }
            }
        }

        messages.push(json!({ "role": "user", "content": Self::user_content(request) }));

        let mut body = json!({ "model": model.id, "messages": messages });
        if let Some(t) = request.temperature.or(self.temperature) {
            body["temperature"] = json!(t);
        }
        if let Some(mt) = request.max_tokens.or(self.max_tokens) {
            body["max_tokens"] = json!(mt);
        }
        body
    }

    async fn invoke(
        &self,
        model: &ModelDescriptor,
        request: &ProviderRequest,
    ) -> std::result::Result<AdapterOutput, ProviderFailure> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            ProviderFailure::from_status(401, format!("{} not configured", self.credential_label()))
        })?;
        let body = self.build_body(model, request);
        let url = format!("{}/chat/completions", self.base_url);
        debug!(
            backend = self.backend.as_str(),
            model = %model.id,
            messages = body["messages"].as_array().map(Vec::len).unwrap_or(0),
            "sending chat completion"
        );
        let raw = self
            .transport
            .post_json(&url, Auth::Bearer(key), &body)
            .await
            .map_err(|e| ProviderFailure::network(e.to_string()))?;
        finish(raw)
    }

    async fn discover_models(&self) -> Result<Vec<String>> {
        self.ensure_configured()?;
        let key = self.api_key.as_deref().unwrap_or_default();
        let url = format!("{}/models", self.base_url);
        let raw = self.transport.get(&url, Auth::Bearer(key)).await?;
        if !raw.is_success() {
            return Err(Error::configuration_with_context(
                format!(
                    "{} model discovery failed with HTTP {}",
                    self.backend.as_str(),
                    raw.status
                ),
                ErrorContext::new().with_source("model_discovery"),
            ));
        }
        let body: Value = serde_json::from_str(&raw.body)?;
        let entries = body
            .get("data")
            .and_then(Value::as_array)
            .or_else(|| body.as_array());
        Ok(entries
            .map(|items| {
                items
                    .iter()
                    .filter_map(|m| {
                        m.get("id")
                            .or_else(|| m.get("name"))
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
