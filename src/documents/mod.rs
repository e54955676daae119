//! 工作区文档：白板状态、待办卡片与笔记库，每类一个窄接口的存储。
//!
//! Workspace documents served next to the AI routes.
//!
//! | Resource | Store trait | Shape |
//! |----------|-------------|-------|
//! | whiteboard | [`WhiteboardStore`] | one canvas state per collection |
//! | todos | [`TodoStore`] | cards, each holding ordered sub-todos |
//! | notes library | [`NotesStore`] | generated notes saved from the notes page |
//!
//! Ids are opaque strings serialized as `_id`. [`InMemoryDocumentStore`]
//! implements all three traits; a durable backend can implement them
//! separately.

mod memory;

pub use memory::InMemoryDocumentStore;

use crate::session::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

/// One drawing, text box or image on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteboardElement {
    pub id: String,
    /// `drawing`, `text` or `image`; opaque to the backend.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Whiteboard {
    #[serde(rename = "_id")]
    pub id: String,
    pub elements: Vec<WhiteboardElement>,
    pub updated_at: DateTime<Utc>,
}

impl Whiteboard {
    pub fn new(elements: Vec<WhiteboardElement>) -> Self {
        Self {
            id: new_id(),
            elements,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTodo {
    #[serde(rename = "_id")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoCard {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub sub_todos: Vec<SubTodo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TodoCard {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            title: title.into(),
            sub_todos: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn sub_todo_mut(&mut self, sub_id: &str) -> Result<&mut SubTodo, StoreError> {
        self.sub_todos
            .iter_mut()
            .find(|s| s.id == sub_id)
            .ok_or_else(|| StoreError::NotFound(format!("sub-todo {}", sub_id)))
    }

    pub fn add_sub_todo(&mut self, text: impl Into<String>) -> &SubTodo {
        let now = Utc::now();
        self.sub_todos.push(SubTodo {
            id: new_id(),
            text: text.into(),
            completed: false,
            created_at: now,
        });
        self.updated_at = now;
        &self.sub_todos[self.sub_todos.len() - 1]
    }

    pub fn update_sub_todo(&mut self, sub_id: &str, update: &SubTodoUpdate) -> Result<(), StoreError> {
        let sub = self.sub_todo_mut(sub_id)?;
        if let Some(text) = &update.text {
            sub.text = text.clone();
        }
        if let Some(completed) = update.completed {
            sub.completed = completed;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn remove_sub_todo(&mut self, sub_id: &str) -> Result<(), StoreError> {
        let before = self.sub_todos.len();
        self.sub_todos.retain(|s| s.id != sub_id);
        if self.sub_todos.len() == before {
            return Err(StoreError::NotFound(format!("sub-todo {}", sub_id)));
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Partial update for a sub-todo; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubTodoUpdate {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

/// Notes saved to the library from the notes page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedNote {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub original_files: Vec<String>,
    pub generated_notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SavedNote {
    pub fn new(title: impl Into<String>, generated_notes: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            original_files: Vec::new(),
            generated_notes: generated_notes.into(),
            model_used: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_original_files(mut self, files: Vec<String>) -> Self {
        self.original_files = files;
        self
    }

    pub fn with_model_used(mut self, model: Option<String>) -> Self {
        self.model_used = model;
        self
    }
}

#[async_trait]
pub trait WhiteboardStore: Send + Sync {
    /// The stored canvas, created empty on first read.
    async fn load_whiteboard(&self) -> Result<Whiteboard, StoreError>;

    /// Replace every element.
    async fn save_whiteboard(&self, elements: Vec<WhiteboardElement>) -> Result<Whiteboard, StoreError>;

    /// Drop every element; returns how many were removed.
    async fn clear_whiteboard(&self) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Every card, newest first.
    async fn list_cards(&self) -> Result<Vec<TodoCard>, StoreError>;

    async fn create_card(&self, title: &str) -> Result<TodoCard, StoreError>;

    async fn rename_card(&self, card_id: &str, title: &str) -> Result<TodoCard, StoreError>;

    async fn delete_card(&self, card_id: &str) -> Result<(), StoreError>;

    async fn add_sub_todo(&self, card_id: &str, text: &str) -> Result<TodoCard, StoreError>;

    async fn update_sub_todo(
        &self,
        card_id: &str,
        sub_id: &str,
        update: SubTodoUpdate,
    ) -> Result<TodoCard, StoreError>;

    async fn delete_sub_todo(&self, card_id: &str, sub_id: &str) -> Result<TodoCard, StoreError>;
}

#[async_trait]
pub trait NotesStore: Send + Sync {
    /// Saved notes, newest first.
    async fn list_notes(&self) -> Result<Vec<SavedNote>, StoreError>;

    async fn save_note(&self, note: SavedNote) -> Result<SavedNote, StoreError>;

    async fn delete_note(&self, note_id: &str) -> Result<(), StoreError>;
}
