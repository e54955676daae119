//! Gemini generateContent 适配器：结构化多轮内容，系统指令放在 systemInstruction 字段。
//!
//! Google Gemini `generateContent` adapter. Key differences from chat completions:
//! - Uses `contents` with `parts` instead of `messages` with `content`.
//! - Roles are `user` and `model`; the system prompt goes to `systemInstruction`.
//! - Attachments are `inlineData {mimeType, data}` parts on the current user turn.
//! - `generationConfig` wraps temperature and `maxOutputTokens`.
//! - The API key travels as the `?key=` query parameter.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use super::{finish, AdapterOutput, ProviderAdapter};
use crate::catalog::{Backend, ModelDescriptor};
use crate::fallback::ProviderFailure;
use crate::request::{HistoryMode, ProviderRequest};
use crate::transport::{Auth, HttpTransport};
use crate::types::Role;
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug)]
pub struct GeminiAdapter {
    transport: Arc<HttpTransport>,
    base_url: String,
    api_key: Option<String>,
    history_mode: HistoryMode,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
}

impl GeminiAdapter {
    pub fn new(transport: Arc<HttpTransport>, api_key: Option<String>) -> Self {
        Self {
            transport,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            history_mode: HistoryMode::Flattened,
            temperature: None,
            max_tokens: None,
        }
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

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn turn_to_content(role: Role, text: &str) -> Value {
        let role = match role {
            Role::Assistant => "model",
            Role::User | Role::System => "user",
        };
        json!({ "role": role, "parts": [{ "text": text }] })
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn backend(&self) -> Backend {
        Backend::Gemini
    }

    fn history_mode(&self) -> HistoryMode {
        self.history_mode
    }

    fn credential_label(&self) -> &'static str {
        "Gemini API key"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn build_body(&self, _model: &ModelDescriptor, request: &ProviderRequest) -> Value {
        let mut contents: Vec<Value> = Vec::new();
        let mut current_parts: Vec<Value> = Vec::new();

        match self.history_mode {
            HistoryMode::Structured => {
                contents.extend(
                    request
                        .history
                        .iter()
                        .map(|t| Self::turn_to_content(t.role, &t.content)),
                );
            }
            HistoryMode::Flattened => {
                if let Some(block) = request.flattened_history() {
                    current_parts.push(json!({ "text": block }));
                }
            }
        }

        if !request.user_text.is_empty() {
            current_parts.push(json!({ "text": request.user_text }));
        }
        for part in &request.inline_parts {
            current_parts.push(json!({
                "inlineData": { "mimeType": part.mime_type, "data": part.data_base64 }
            }));
        }
        contents.push(json!({ "role": "user", "parts": current_parts }));

        let mut body = json!({
            "systemInstruction": { "parts": [{ "text": request.system_instruction }] },
            "contents": contents,
        });

        let mut gen_config = serde_json::Map::new();
        if let Some(t) = request.temperature.or(self.temperature) {
            gen_config.insert("temperature".into(), json!(t));
        }
        if let Some(mt) = request.max_tokens.or(self.max_tokens) {
            gen_config.insert("maxOutputTokens".into(), json!(mt));
        }
        if !gen_config.is_empty() {
            body["generationConfig"] = Value::Object(gen_config);
        }
        body
    }

    async fn invoke(
        &self,
        model: &ModelDescriptor,
        request: &ProviderRequest,
    ) -> std::result::Result<AdapterOutput, ProviderFailure> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderFailure::from_status(401, "Gemini API key not configured"))?;
        let body = self.build_body(model, request);
        debug!(model = %model.id, parts = request.inline_parts.len(), "sending generateContent");
        let raw = self
            .transport
            .post_json(&self.endpoint(&model.id), Auth::QueryKey(key), &body)
            .await
            .map_err(|e| ProviderFailure::network(e.to_string()))?;
        finish(raw)
    }

    async fn discover_models(&self) -> Result<Vec<String>> {
        self.ensure_configured()?;
        let key = self.api_key.as_deref().unwrap_or_default();
        let url = format!("{}/v1beta/models", self.base_url);
        let raw = self.transport.get(&url, Auth::QueryKey(key)).await?;
        if !raw.is_success() {
            return Err(Error::configuration_with_context(
                format!("Gemini model discovery failed with HTTP {}", raw.status),
                ErrorContext::new().with_source("model_discovery"),
            ));
        }
        let body: Value = serde_json::from_str(&raw.body)?;
        Ok(body
            .get("models")
            .and_then(Value::as_array)
            .map(|models| {
                models
                    .iter()
                    .filter(|m| {
                        m.get("supportedGenerationMethods")
                            .and_then(Value::as_array)
                            .map(|methods| methods.iter().any(|x| x == "generateContent"))
                            .unwrap_or(true)
                    })
                    .filter_map(|m| m.get("name").and_then(Value::as_str))
                    .map(|name| name.trim_start_matches("models/").to_string())
                    .collect()
            })
            .unwrap_or_default())
    }
}
