//! Provider 适配层：每种线协议一个适配器，负责序列化请求、发起一次调用并提取文本。
//!
//! Provider adapters.
//!
//! One adapter per wire protocol:
//!
//! - [`GeminiAdapter`]: structured turns against `generateContent`.
//! - [`ChatCompletionsAdapter`]: OpenAI-style `/chat/completions`, used by
//!   GitHub Models and LongCat.
//!
//! An adapter performs exactly one HTTP call per [`ProviderAdapter::invoke`]
//! and never retries; advancing to another model is the orchestrator's job.

pub mod chat_completions;
pub mod extract;
pub mod gemini;

pub use crate::transport::ResponseMetadata;
pub use chat_completions::ChatCompletionsAdapter;
pub use extract::{extract_text, extract_usage, ExtractionResult};
pub use gemini::GeminiAdapter;

use crate::catalog::{Backend, ModelDescriptor};
use crate::fallback::ProviderFailure;
use crate::request::{HistoryMode, ProviderRequest};
use crate::transport::RawResponse;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageInfo {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Normalized result of one successful call.
#[derive(Debug, Clone)]
pub struct AdapterOutput {
    pub text: String,
    /// Name of the response shape the text came from.
    pub extracted_from: &'static str,
    pub usage: Option<UsageInfo>,
    pub metadata: ResponseMetadata,
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync + std::fmt::Debug {
    fn backend(&self) -> Backend;

    fn history_mode(&self) -> HistoryMode;

    /// Human label of the credential, used in configuration errors.
    fn credential_label(&self) -> &'static str;

    fn is_configured(&self) -> bool;

    /// Missing credentials are a configuration error, never a provider failure.
    fn ensure_configured(&self) -> Result<()> {
        if self.is_configured() {
            return Ok(());
        }
        Err(Error::configuration_with_context(
            format!("{} not configured", self.credential_label()),
            ErrorContext::new()
                .with_field_path(format!("providers.{}.api_key", self.backend().as_str()))
                .with_source("provider_adapter"),
        ))
    }

    /// Wire body for one request.
    fn build_body(&self, model: &ModelDescriptor, request: &ProviderRequest) -> Value;

    /// Exactly one HTTP call.
    async fn invoke(
        &self,
        model: &ModelDescriptor,
        request: &ProviderRequest,
    ) -> std::result::Result<AdapterOutput, ProviderFailure>;

    /// Model ids the backend currently offers. Empty when discovery is unsupported.
    async fn discover_models(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Best-effort error message from a failed response body.
pub(crate) fn error_message(raw: &RawResponse) -> String {
    let from_json = raw.json().and_then(|v| {
        v.pointer("/error/message")
            .or_else(|| v.get("message"))
            .or_else(|| v.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match from_json {
        Some(m) => m,
        None if raw.body.trim().is_empty() => format!("HTTP {}", raw.status),
        None => raw.body.chars().take(500).collect(),
    }
}

/// Turn a raw HTTP exchange into an output or a classified failure.
pub(crate) fn finish(raw: RawResponse) -> std::result::Result<AdapterOutput, ProviderFailure> {
    if !raw.is_success() {
        return Err(ProviderFailure::from_status(raw.status, error_message(&raw))
            .with_metadata(raw.metadata));
    }
    let body = raw.json().unwrap_or(Value::Null);
    match extract_text(&body) {
        Some(result) => Ok(AdapterOutput {
            extracted_from: result.source(),
            text: result.into_text(),
            usage: extract_usage(&body),
            metadata: raw.metadata,
        }),
        None => Err(ProviderFailure::empty_response(Some(raw.status)).with_metadata(raw.metadata)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FailureKind;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            metadata: ResponseMetadata::default(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_error_message_sources() {
        assert_eq!(
            error_message(&raw(400, r#"{"error":{"message":"API key not valid"}}"#)),
            "API key not valid"
        );
        assert_eq!(error_message(&raw(500, "")), "HTTP 500");
        assert_eq!(error_message(&raw(502, "bad gateway")), "bad gateway");
    }

    #[test]
    fn test_finish_classifies() {
        let failure = finish(raw(429, r#"{"error":{"message":"slow down"}}"#)).unwrap_err();
        assert_eq!(failure.kind, FailureKind::RateLimited);

        let empty = finish(raw(200, r#"{"candidates":[]}"#)).unwrap_err();
        assert_eq!(empty.kind, FailureKind::EmptyResponse);

        let not_json = finish(raw(200, "<html>")).unwrap_err();
        assert_eq!(not_json.kind, FailureKind::EmptyResponse);

        let ok = finish(raw(200, r#"{"choices":[{"message":{"content":"hi"}}]}"#)).unwrap();
        assert_eq!(ok.text, "hi");
        assert_eq!(ok.extracted_from, "chat_choices");
    }
}
