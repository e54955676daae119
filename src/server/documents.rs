//! Whiteboard, todo and notes-library handlers.

use super::error::ApiError;
use super::form::RequestForm;
use super::AppState;
use crate::documents::{SavedNote, SubTodoUpdate, WhiteboardElement};
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::{debug, info};

type ApiResult = Result<Json<Value>, ApiError>;

fn required<'a>(form: &'a RequestForm, field: &str, message: &str) -> Result<&'a str, ApiError> {
    form.text(field)
        .map(str::trim)
        .ok_or_else(|| ApiError::validation(message, field))
}

pub async fn whiteboard_get(State(state): State<AppState>) -> ApiResult {
    let board = state.whiteboard.load_whiteboard().await?;
    Ok(Json(json!({ "success": true, "data": board })))
}

pub async fn whiteboard_save(State(state): State<AppState>, form: RequestForm) -> ApiResult {
    let elements: Vec<WhiteboardElement> = form
        .parse("elements")?
        .ok_or_else(|| ApiError::validation("Elements are required.", "elements"))?;
    debug!(elements = elements.len(), "saving whiteboard");
    let board = state.whiteboard.save_whiteboard(elements).await?;
    Ok(Json(json!({
        "success": true,
        "data": board,
        "message": "Whiteboard saved successfully",
    })))
}

pub async fn whiteboard_clear(State(state): State<AppState>) -> ApiResult {
    let removed = state.whiteboard.clear_whiteboard().await?;
    info!(removed, "whiteboard cleared");
    Ok(Json(json!({ "success": true, "message": "Whiteboard cleared successfully" })))
}

pub async fn todos_list(State(state): State<AppState>) -> ApiResult {
    let cards = state.todos.list_cards().await?;
    Ok(Json(json!({ "success": true, "data": cards })))
}

pub async fn todos_create(State(state): State<AppState>, form: RequestForm) -> ApiResult {
    let title = required(&form, "title", "Title is required.")?;
    let card = state.todos.create_card(title).await?;
    Ok(Json(json!({ "success": true, "data": card })))
}

pub async fn todos_rename(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    form: RequestForm,
) -> ApiResult {
    let title = required(&form, "title", "Title is required.")?;
    let card = state.todos.rename_card(&card_id, title).await?;
    Ok(Json(json!({ "success": true, "data": card })))
}

pub async fn todos_delete(State(state): State<AppState>, Path(card_id): Path<String>) -> ApiResult {
    state.todos.delete_card(&card_id).await?;
    Ok(Json(json!({ "success": true, "message": "Todo card deleted successfully" })))
}

pub async fn sub_todo_add(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    form: RequestForm,
) -> ApiResult {
    let text = required(&form, "text", "Text is required.")?;
    let card = state.todos.add_sub_todo(&card_id, text).await?;
    Ok(Json(json!({ "success": true, "data": card })))
}

pub async fn sub_todo_update(
    State(state): State<AppState>,
    Path((card_id, sub_id)): Path<(String, String)>,
    form: RequestForm,
) -> ApiResult {
    let update = SubTodoUpdate {
        text: form.text("text").map(|t| t.trim().to_string()),
        completed: form.parse("completed")?,
    };
    if update.text.is_none() && update.completed.is_none() {
        return Err(ApiError::validation("Provide text or completed.", "text"));
    }
    let card = state.todos.update_sub_todo(&card_id, &sub_id, update).await?;
    Ok(Json(json!({ "success": true, "data": card })))
}

pub async fn sub_todo_delete(
    State(state): State<AppState>,
    Path((card_id, sub_id)): Path<(String, String)>,
) -> ApiResult {
    let card = state.todos.delete_sub_todo(&card_id, &sub_id).await?;
    Ok(Json(json!({ "success": true, "data": card })))
}

pub async fn notes_list(State(state): State<AppState>) -> ApiResult {
    let notes = state.notes.list_notes().await?;
    Ok(Json(json!({ "success": true, "data": notes })))
}

pub async fn notes_save(State(state): State<AppState>, form: RequestForm) -> ApiResult {
    let generated = required(&form, "generatedNotes", "Generated notes are required.")?;
    let note = SavedNote::new(form.text("title").unwrap_or("Untitled notes"), generated)
        .with_original_files(form.parse("originalFiles")?.unwrap_or_default())
        .with_model_used(form.text("modelUsed").map(str::to_string));
    let note = state.notes.save_note(note).await?;
    info!(note_id = %note.id, model_used = note.model_used.as_deref(), "notes saved to library");
    Ok(Json(json!({ "success": true, "data": note })))
}

pub async fn notes_delete(State(state): State<AppState>, Path(note_id): Path<String>) -> ApiResult {
    state.notes.delete_note(&note_id).await?;
    Ok(Json(json!({ "success": true, "message": "Notes deleted successfully" })))
}
