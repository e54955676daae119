//! HTTP routes driven through `tower::ServiceExt::oneshot`

use super::mock_server::{gemini_error, gemini_text, MockServerFixture};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pen2pdf_ai::server::{self, AppState};
use pen2pdf_ai::SuiteClient;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(client: SuiteClient) -> Router {
    server::router(AppState::in_memory(client))
}

fn offline_app() -> Router {
    app(SuiteClient::builder().build().unwrap())
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn multipart_request(uri: &str, fields: &[(&str, &str)], file: (&str, &str, &str, &[u8])) -> Request<Body> {
    let boundary = "pen2pdf-test-boundary";
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    let (field, file_name, mime, data) = file;
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&offline_app(), empty_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "OK", "message": "Backend server is running" }));
}

#[tokio::test]
async fn test_text_extract_requires_prompt() {
    let (status, body) = send(&offline_app(), json_request("POST", "/textExtract", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["type"], json!("validation_error"));
    assert_eq!(body["error"]["status"], json!(400));
    assert!(body["trace_id"].is_string());
}

#[tokio::test]
async fn test_text_extract_returns_model_used() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_generate("m1", 200, &gemini_text("scanned text")).await;
    let app = app(fixture.gemini_client(&["m1"]));

    let (status, body) =
        send(&app, json_request("POST", "/textExtract", json!({ "prompt": "read this" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "text": "scanned text", "modelUsed": "m1" }));
}

#[tokio::test]
async fn test_chat_round_trip_persists_turns() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_generate("m1", 200, &gemini_text("Hi, I'm Bella")).await;
    let app = app(fixture.gemini_client(&["m1"]));

    let (status, body) = send(&app, empty_request("GET", "/api/chat")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["messages"], json!([]));

    let (status, body) = send(
        &app,
        json_request("POST", "/api/chat", json!({ "message": "hello", "model": "m1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["userMessage"]["content"], json!("hello"));
    assert_eq!(body["data"]["assistantMessage"]["content"], json!("Hi, I'm Bella"));
    assert_eq!(body["data"]["assistantMessage"]["model"], json!("m1"));

    let (_, body) = send(&app, empty_request("GET", "/api/chat")).await;
    assert_eq!(body["data"]["messages"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["currentModel"], json!("m1"));

    let (status, body) = send(&app, empty_request("DELETE", "/api/chat")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Chat history cleared successfully"));

    let (_, body) = send(&app, empty_request("GET", "/api/chat")).await;
    assert_eq!(body["data"]["messages"], json!([]));
}

#[tokio::test]
async fn test_chat_rate_limit_names_model() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_generate("m1", 429, &gemini_error(429, "RESOURCE_EXHAUSTED", "quota"))
        .await;
    let app = app(fixture.gemini_client(&["m1"]));

    let (status, body) = send(
        &app,
        json_request("POST", "/api/chat", json!({ "message": "hello", "model": "m1" })),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["type"], json!("rate_limit"));
    assert_eq!(body["error"]["model"], json!("m1"));

    // A failed exchange is not persisted.
    let (_, body) = send(&app, empty_request("GET", "/api/chat")).await;
    assert_eq!(body["data"]["messages"], json!([]));
}

#[tokio::test]
async fn test_github_models_listing() {
    let (status, body) = send(&offline_app(), empty_request("GET", "/api/github-models/models")).await;
    assert_eq!(status, StatusCode::OK);
    let models = body["models"].as_array().cloned().unwrap_or_default();
    assert_eq!(models.len(), 38);

    let gpt4o = models.iter().find(|m| m["id"] == json!("gpt-4o")).unwrap();
    assert_eq!(gpt4o["available"], json!(false));
    assert_eq!(gpt4o["capabilities"]["images"], json!(true));
    assert_eq!(gpt4o["displayName"], json!("Gpt 4o"));
}

#[tokio::test]
async fn test_github_models_chat_requires_fields() {
    let (status, body) = send(
        &offline_app(),
        json_request("POST", "/api/github-models/chat", json!({ "model": "gpt-4o" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], json!("Missing required fields: model and messages"));
}

#[tokio::test]
async fn test_github_models_chat_checks_file_before_credentials() {
    let request = multipart_request(
        "/api/github-models/chat",
        &[("model", "gpt-4o"), ("messages", r#"[{"role":"user","content":"grade this"}]"#)],
        ("file", "essay.doc", "application/msword", b"not really a doc"),
    );
    let (status, body) = send(&offline_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], json!("validation_error"));
}

#[tokio::test]
async fn test_github_models_chat_without_credentials() {
    let (status, body) = send(
        &offline_app(),
        json_request(
            "POST",
            "/api/github-models/chat",
            json!({ "model": "gpt-4o", "messages": [{ "role": "user", "content": "hi" }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["type"], json!("configuration_error"));
}

#[tokio::test]
async fn test_notes_generate_from_upload() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_generate("gemini-2.5-flash", 200, &gemini_text("# Notes")).await;
    let client = SuiteClient::builder()
        .catalog(
            pen2pdf_ai::catalog::ModelCatalog::default()
                .with_task(pen2pdf_ai::Task::NotesGeneration, vec!["gemini-2.5-flash".into()]),
        )
        .adapter(std::sync::Arc::new(fixture.gemini_adapter()))
        .build()
        .unwrap();

    let request = multipart_request(
        "/notesGenerate",
        &[("retryInstruction", "shorter")],
        ("files", "lecture.pdf", "application/pdf", b"%PDF-1.4"),
    );
    let (status, body) = send(&app(client), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["text"], json!("# Notes"));
    assert_eq!(body["modelUsed"], json!("gemini-2.5-flash"));
}

#[tokio::test]
async fn test_whiteboard_save_and_clear() {
    let app = offline_app();

    let (status, body) = send(&app, empty_request("GET", "/api/whiteboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["elements"], json!([]));
    let board_id = body["data"]["_id"].clone();

    let elements = json!([
        { "id": "e1", "type": "drawing", "data": { "points": [[0, 0], [4, 4]] } },
        { "id": "e2", "type": "text", "data": { "text": "entropy" }, "position": { "x": 12, "y": 30 } }
    ]);
    let (status, body) = send(
        &app,
        json_request("POST", "/api/whiteboard", json!({ "elements": elements })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Whiteboard saved successfully"));
    assert_eq!(body["data"]["_id"], board_id);
    assert_eq!(body["data"]["elements"][1]["type"], json!("text"));

    let (status, _) = send(&app, empty_request("DELETE", "/api/whiteboard")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, empty_request("GET", "/api/whiteboard")).await;
    assert_eq!(body["data"]["elements"], json!([]));
}

#[tokio::test]
async fn test_whiteboard_save_requires_elements() {
    let (status, body) = send(&offline_app(), json_request("POST", "/api/whiteboard", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], json!("Elements are required."));
}

#[tokio::test]
async fn test_todo_cards_and_sub_todos() {
    let app = offline_app();

    let (status, body) = send(&app, json_request("POST", "/api/todos", json!({ "title": "Exam prep" }))).await;
    assert_eq!(status, StatusCode::OK);
    let card_id = body["data"]["_id"].as_str().unwrap_or_default().to_string();

    let (_, body) = send(
        &app,
        json_request("POST", &format!("/api/todos/{card_id}/subtodos"), json!({ "text": "Chapter 3" })),
    )
    .await;
    assert_eq!(body["data"]["subTodos"][0]["text"], json!("Chapter 3"));
    assert_eq!(body["data"]["subTodos"][0]["completed"], json!(false));
    let sub_id = body["data"]["subTodos"][0]["_id"].as_str().unwrap_or_default().to_string();

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/todos/{card_id}/subtodos/{sub_id}"),
            json!({ "completed": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subTodos"][0]["completed"], json!(true));

    let (_, body) = send(
        &app,
        json_request("PUT", &format!("/api/todos/{card_id}"), json!({ "title": "Finals" })),
    )
    .await;
    assert_eq!(body["data"]["title"], json!("Finals"));

    let (_, body) = send(
        &app,
        empty_request("DELETE", &format!("/api/todos/{card_id}/subtodos/{sub_id}")),
    )
    .await;
    assert_eq!(body["data"]["subTodos"], json!([]));

    let (status, _) = send(&app, empty_request("DELETE", &format!("/api/todos/{card_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, empty_request("GET", "/api/todos")).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_unknown_todo_card_is_404() {
    let (status, body) = send(
        &offline_app(),
        json_request("PUT", "/api/todos/missing", json!({ "title": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], json!("not_found"));
}

#[tokio::test]
async fn test_notes_library_save_and_list() {
    let app = offline_app();
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/notes",
            json!({
                "title": "lecture-4",
                "originalFiles": ["lecture-4.pdf"],
                "generatedNotes": "# Thermodynamics",
                "modelUsed": "gemini-2.5-pro"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["originalFiles"], json!(["lecture-4.pdf"]));

    let (_, body) = send(&app, empty_request("GET", "/api/notes")).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["modelUsed"], json!("gemini-2.5-pro"));

    let (status, _) = send(&app, json_request("POST", "/api/notes", json!({ "title": "empty" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
