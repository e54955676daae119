use super::error::ApiError;
use super::form::RequestForm;
use super::AppState;
use crate::catalog::Backend;
use crate::client::{preview, SuiteClient};
use crate::request::GenerateRequest;
use crate::session::DEFAULT_SESSION_MODEL;
use crate::types::{Attachment, ContextNote, ConversationTurn, Role, Task};
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

type ApiResult = Result<Json<Value>, ApiError>;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "message": "Backend server is running" }))
}

/// File policy runs before any credential check or provider call.
fn check_uploads(client: &SuiteClient, request: &GenerateRequest) -> Result<(), ApiError> {
    for attachment in &request.attachments {
        client.check_attachment(request, attachment)?;
    }
    Ok(())
}

pub async fn text_extract(State(state): State<AppState>, form: RequestForm) -> ApiResult {
    let prompt = form.text("prompt").unwrap_or_default().to_string();
    let files: Vec<Attachment> = form.files_named("file").cloned().collect();
    if prompt.is_empty() && files.is_empty() {
        return Err(ApiError::validation("Prompt is required.", "prompt"));
    }

    let request = GenerateRequest::new(Task::TextExtraction, prompt).with_attachments(files);
    check_uploads(&state.client, &request)?;
    let response = state.client.generate_response(&request).await?;
    Ok(Json(json!({ "text": response.text, "modelUsed": response.model_used })))
}

pub async fn notes_generate(State(state): State<AppState>, form: RequestForm) -> ApiResult {
    let files: Vec<Attachment> = form.files_named("files").cloned().collect();
    if files.is_empty() {
        return Err(ApiError::validation("At least one file is required.", "files"));
    }
    info!(files = files.len(), preferred_model = form.text("preferredModel"), "notes requested");

    let mut request = GenerateRequest::new(
        Task::NotesGeneration,
        form.text("prompt").unwrap_or_default(),
    )
    .with_attachments(files);
    if let Some(model) = form.text("preferredModel") {
        request = request.with_preferred_model(model);
    }
    if let Some(instruction) = form.text("retryInstruction") {
        request = request.with_retry_instruction(instruction);
    }

    check_uploads(&state.client, &request)?;
    let response = state.client.generate_response(&request).await?;
    Ok(Json(json!({
        "success": true,
        "text": response.text,
        "modelUsed": response.model_used,
    })))
}

pub async fn chat_history(State(state): State<AppState>) -> ApiResult {
    let session = state.sessions.find_or_create(DEFAULT_SESSION_MODEL).await?;
    Ok(Json(json!({ "success": true, "data": session })))
}

pub async fn chat_send(State(state): State<AppState>, form: RequestForm) -> ApiResult {
    let message = form.text("message").unwrap_or_default().to_string();
    let model = form.text("model").map(str::to_string);
    let attachments: Vec<Attachment> = form.parse("attachments")?.unwrap_or_default();
    let notes: Vec<ContextNote> = form.parse("contextNotes")?.unwrap_or_default();

    info!(
        model = model.as_deref().unwrap_or("session default"),
        user_message = %preview(&message, 100),
        context_notes = notes.len(),
        "chat message received"
    );

    let mut session = state
        .sessions
        .find_or_create(model.as_deref().unwrap_or(DEFAULT_SESSION_MODEL))
        .await?;
    if let Some(m) = &model {
        session.current_model = m.clone();
    }

    let user_turn = ConversationTurn::user(message.clone())
        .with_attachments(attachments.clone())
        .with_context_notes(notes.clone());
    session.push(user_turn.clone());

    let mut request = GenerateRequest::new(Task::Chat, message)
        .with_attachments(attachments)
        .with_context_notes(notes)
        .with_history(session.history());
    request = match &model {
        Some(m) => request.with_model(m.clone()),
        None => request.with_preferred_model(session.current_model.clone()),
    };
    check_uploads(&state.client, &request)?;

    let response = state.client.generate_response(&request).await?;
    let assistant_turn =
        ConversationTurn::assistant(response.text).with_model(response.model_used.clone());
    session.current_model = response.model_used;
    session.push(assistant_turn.clone());
    state.sessions.save(&session).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "userMessage": user_turn, "assistantMessage": assistant_turn },
    })))
}

pub async fn chat_clear(State(state): State<AppState>) -> ApiResult {
    let removed = state.sessions.clear().await?;
    info!(removed, "chat history cleared");
    Ok(Json(json!({ "success": true, "message": "Chat history cleared successfully" })))
}

pub async fn github_models_list(State(state): State<AppState>) -> ApiResult {
    let available = state.client.is_backend_configured(Backend::GithubModels);
    let models: Vec<Value> = state
        .client
        .catalog()
        .list_models(Backend::GithubModels)
        .into_iter()
        .map(|model| {
            let mut entry = serde_json::to_value(&model).unwrap_or(Value::Null);
            if let Value::Object(map) = &mut entry {
                map.insert("available".to_string(), Value::Bool(available));
            }
            entry
        })
        .collect();
    Ok(Json(json!({ "success": true, "models": models })))
}

/// Incoming OpenAI-style message. `content` may be a string or a part array.
#[derive(Debug, Deserialize)]
pub struct ChatMessageIn {
    pub role: Role,
    #[serde(default)]
    pub content: Value,
}

impl ChatMessageIn {
    fn text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            Value::Array(parts) => parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        }
    }
}

/// Split a message list into prior turns and the final user message.
fn split_messages(messages: &[ChatMessageIn]) -> (Vec<ConversationTurn>, String) {
    let last_user = messages.iter().rposition(|m| m.role == Role::User);
    let (prior, current) = match last_user {
        Some(i) => (&messages[..i], messages[i].text()),
        None => (messages, String::new()),
    };
    let history = prior
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| ConversationTurn::new(m.role, m.text()))
        .collect();
    (history, current)
}

pub async fn github_models_chat(State(state): State<AppState>, form: RequestForm) -> ApiResult {
    let model = form.text("model").map(str::to_string);
    let messages: Option<Vec<ChatMessageIn>> = form.parse("messages")?;
    let (model, messages) = match (model, messages) {
        (Some(model), Some(messages)) => (model, messages),
        _ => {
            return Err(ApiError::validation(
                "Missing required fields: model and messages",
                "model",
            ))
        }
    };

    let (history, message) = split_messages(&messages);
    info!(model = %model, user_message = %preview(&message, 100), "chat_request");

    let mut request = GenerateRequest::new(Task::Chat, message)
        .with_model(format!("{}/{}", Backend::GithubModels.as_str(), model))
        .with_history(history)
        .with_attachments(form.files_named("file").cloned().collect());
    if let Some(t) = form.parse::<f64>("temperature")? {
        request = request.with_temperature(t);
    }
    if let Some(n) = form.parse::<u32>("max_tokens")? {
        request = request.with_max_tokens(n);
    }

    check_uploads(&state.client, &request)?;
    let response = state.client.generate_response(&request).await?;
    info!(
        model = %response.model_used,
        response_preview = %preview(&response.text, 200),
        remote_request_id = response.metadata.request_id.as_deref(),
        "chat_response"
    );
    Ok(Json(json!({
        "success": true,
        "message": response.text,
        "usage": response.usage,
        "model": response.model_used,
    })))
}
