//! Adapters and the client against a mock HTTP server

use super::mock_server::{gemini_error, gemini_text, MockServerFixture};
use pen2pdf_ai::adapters::ProviderAdapter;
use pen2pdf_ai::catalog::{Backend, ModelDescriptor};
use pen2pdf_ai::fallback::FailureKind;
use pen2pdf_ai::request::{GenerateRequest, RequestBuilder};
use pen2pdf_ai::{SuiteClient, Task};
use std::sync::Arc;

fn request_for(model: &ModelDescriptor, message: &str) -> pen2pdf_ai::request::ProviderRequest {
    RequestBuilder::default()
        .build(model, &GenerateRequest::new(Task::Chat, message))
        .unwrap()
}

#[tokio::test]
async fn test_gemini_invoke_extracts_text_and_usage() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_generate("gemini-2.5-flash", 200, &gemini_text("Hello"))
        .await;

    let model = ModelDescriptor::from_id("gemini-2.5-flash", Backend::Gemini, 0);
    let output = fixture
        .gemini_adapter()
        .invoke(&model, &request_for(&model, "hi"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(output.text, "Hello");
    assert_eq!(output.extracted_from, "nested_candidates");
    assert_eq!(output.usage.map(|u| u.total_tokens), Some(15));
}

#[tokio::test]
async fn test_gemini_http_failure_is_classified() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_generate(
            "gemini-2.5-pro",
            429,
            &gemini_error(429, "RESOURCE_EXHAUSTED", "Quota exceeded for metric"),
        )
        .await;

    let model = ModelDescriptor::from_id("gemini-2.5-pro", Backend::Gemini, 0);
    let failure = fixture
        .gemini_adapter()
        .invoke(&model, &request_for(&model, "hi"))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::RateLimited);
    assert_eq!(failure.status, Some(429));
    assert!(failure.message.contains("Quota exceeded"));
}

#[tokio::test]
async fn test_blank_candidate_text_is_empty_response() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_generate("gemini-2.5-flash", 200, r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#)
        .await;

    let model = ModelDescriptor::from_id("gemini-2.5-flash", Backend::Gemini, 0);
    let failure = fixture
        .gemini_adapter()
        .invoke(&model, &request_for(&model, "hi"))
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::EmptyResponse);
}

#[tokio::test]
async fn test_chat_completion_captures_provider_headers() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_chat_completion(
            200,
            r#"{"model":"gpt-4o","choices":[{"message":{"role":"assistant","content":"Hi there"}}],"usage":{"prompt_tokens":5,"completion_tokens":2,"total_tokens":7}}"#,
        )
        .await;

    let model = ModelDescriptor::from_id("gpt-4o", Backend::GithubModels, 0);
    let output = fixture
        .chat_adapter(Backend::GithubModels)
        .invoke(&model, &request_for(&model, "hi"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(output.text, "Hi there");
    assert_eq!(output.extracted_from, "chat_choices");
    assert_eq!(output.metadata.ratelimit_remaining.as_deref(), Some("41"));
    assert_eq!(output.metadata.request_id.as_deref(), Some("req-123"));
}

#[tokio::test]
async fn test_unreachable_host_is_network_failure() {
    let adapter = pen2pdf_ai::adapters::GeminiAdapter::new(
        MockServerFixture::transport(),
        Some("k".to_string()),
    )
    .with_base_url("http://127.0.0.1:1");
    let model = ModelDescriptor::from_id("gemini-2.5-flash", Backend::Gemini, 0);

    let failure = adapter
        .invoke(&model, &request_for(&model, "hi"))
        .await
        .unwrap_err();
    assert_eq!(failure.status, None);
    assert!(!failure.retryable());
}

#[tokio::test]
async fn test_e2e_overloaded_then_hello() {
    let fixture = MockServerFixture::new().await;
    let first = fixture
        .mock_generate("m1", 503, &gemini_error(503, "UNAVAILABLE", "The model is overloaded."))
        .await;
    let second = fixture.mock_generate("m2", 200, &gemini_text("Hello")).await;

    let client = fixture.gemini_client(&["m1", "m2"]);
    let response = client
        .generate_response(&GenerateRequest::new(Task::Chat, "hi"))
        .await
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(response.text, "Hello");
    assert_eq!(response.model_used, "m2");
    assert_eq!(response.attempted, vec!["m1", "m2"]);
}

#[tokio::test]
async fn test_e2e_rejected_key_stops_after_one_attempt() {
    let fixture = MockServerFixture::new().await;
    let first = fixture
        .mock_generate("m1", 401, &gemini_error(401, "UNAUTHENTICATED", "API key not valid"))
        .await;
    let _second = fixture.mock_generate("m2", 200, &gemini_text("unreachable")).await;

    let client = fixture.gemini_client(&["m1", "m2"]);
    let err = client
        .generate_response(&GenerateRequest::new(Task::Chat, "hi"))
        .await
        .unwrap_err();

    first.assert_async().await;
    assert_eq!(err.kind(), "configuration_error");
}

#[tokio::test]
async fn test_discovery_refreshes_catalog() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_get(
            "/v1beta/models",
            r#"{"models":[
                {"name":"models/gemini-3-pro","supportedGenerationMethods":["generateContent"]},
                {"name":"models/text-embedding-004","supportedGenerationMethods":["embedContent"]}
            ]}"#,
        )
        .await;

    let client = SuiteClient::builder()
        .adapter(Arc::new(fixture.gemini_adapter()))
        .build()
        .unwrap();
    assert!(client.refresh_models(Backend::Gemini).await.unwrap());
    assert_eq!(
        client.catalog().model_ids(Backend::Gemini).to_vec(),
        vec!["gemini-3-pro".to_string()]
    );
}

#[tokio::test]
async fn test_discovery_with_empty_result_keeps_static_list() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_get("/models", r#"{"data":[]}"#).await;

    let client = SuiteClient::builder()
        .adapter(Arc::new(fixture.chat_adapter(Backend::GithubModels)))
        .build()
        .unwrap();
    let before = client.catalog().model_ids(Backend::GithubModels).len();
    assert!(!client.refresh_models(Backend::GithubModels).await.unwrap());
    assert_eq!(client.catalog().model_ids(Backend::GithubModels).len(), before);
}
