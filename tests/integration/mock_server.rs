//! Mock HTTP server setup for integration tests

use mockito::{Matcher, Mock, Server, ServerGuard};
use pen2pdf_ai::adapters::{ChatCompletionsAdapter, GeminiAdapter};
use pen2pdf_ai::catalog::{Backend, ModelCatalog};
use pen2pdf_ai::config::HttpConfig;
use pen2pdf_ai::transport::HttpTransport;
use pen2pdf_ai::{SuiteClient, Task};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const TEST_KEY: &str = "test-key";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    pub fn transport() -> Arc<HttpTransport> {
        let config = HttpConfig {
            timeout_secs: 5,
            ..HttpConfig::default()
        };
        Arc::new(HttpTransport::new(&config).expect("transport"))
    }

    pub fn gemini_adapter(&self) -> GeminiAdapter {
        GeminiAdapter::new(Self::transport(), Some(TEST_KEY.to_string())).with_base_url(&self.base_url)
    }

    pub fn chat_adapter(&self, backend: Backend) -> ChatCompletionsAdapter {
        ChatCompletionsAdapter::new(backend, Self::transport(), Some(TEST_KEY.to_string()))
            .with_base_url(&self.base_url)
    }

    /// Client whose chat task walks `candidates` on the Gemini backend of this server.
    pub fn gemini_client(&self, candidates: &[&str]) -> SuiteClient {
        let ids: Vec<String> = candidates.iter().map(|s| s.to_string()).collect();
        SuiteClient::builder()
            .catalog(
                ModelCatalog::new()
                    .with_models(Backend::Gemini, ids.clone())
                    .with_task(Task::Chat, ids.clone())
                    .with_task(Task::TextExtraction, ids),
            )
            .adapter(Arc::new(self.gemini_adapter()))
            .build()
            .expect("client")
    }

    /// Create a mock for a Gemini `generateContent` call
    pub async fn mock_generate(&self, model: &str, status: u16, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", format!("/v1beta/models/{}:generateContent", model).as_str())
            .match_query(Matcher::UrlEncoded("key".into(), TEST_KEY.into()))
            .with_status(status.into())
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Create a mock for a chat-completions call
    pub async fn mock_chat_completion(&self, status: u16, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", "/chat/completions")
            .match_header("authorization", format!("Bearer {}", TEST_KEY).as_str())
            .with_status(status.into())
            .with_header("content-type", "application/json")
            .with_header("x-ratelimit-remaining", "41")
            .with_header("x-ms-request-id", "req-123")
            .with_body(body)
            .create_async()
            .await
    }

    pub async fn mock_get(&self, path: &str, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("GET", path)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}

pub fn gemini_text(text: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }],
        "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 3, "totalTokenCount": 15 }
    })
    .to_string()
}

pub fn gemini_error(code: u16, status: &str, message: &str) -> String {
    serde_json::json!({ "error": { "code": code, "message": message, "status": status } }).to_string()
}
