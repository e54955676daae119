//! HTTP 接入层：axum 路由，把上传与聊天请求交给 [`SuiteClient`]。
//!
//! HTTP surface.
//!
//! Routes keep the browser-facing contract of the Pen2PDF frontend:
//!
//! | Route | Method | Purpose |
//! |-------|--------|---------|
//! | `/health` | GET | liveness |
//! | `/textExtract` | POST | handwriting to text, multipart `file` or JSON `prompt` |
//! | `/notesGenerate` | POST | study notes from uploaded `files` |
//! | `/api/chat` | GET/POST/DELETE | persisted assistant conversation |
//! | `/api/github-models/models` | GET | GitHub Models catalog |
//! | `/api/github-models/chat` | POST | single-model chat against GitHub Models |
//! | `/api/whiteboard` | GET/POST/DELETE | canvas state |
//! | `/api/todos[/{id}[/subtodos[/{sub_id}]]]` | GET/POST/PUT/DELETE | todo cards and sub-todos |
//! | `/api/notes[/{id}]` | GET/POST/DELETE | saved notes library |

mod documents;
mod error;
mod form;
mod routes;

pub use error::ApiError;
pub use form::RequestForm;

use crate::client::SuiteClient;
use crate::documents::{InMemoryDocumentStore, NotesStore, TodoStore, WhiteboardStore};
use crate::session::{InMemorySessionStore, SessionStore};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Upload ceiling shared by JSON and multipart bodies.
pub const DEFAULT_BODY_LIMIT: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<SuiteClient>,
    pub sessions: Arc<dyn SessionStore>,
    pub whiteboard: Arc<dyn WhiteboardStore>,
    pub todos: Arc<dyn TodoStore>,
    pub notes: Arc<dyn NotesStore>,
}

impl AppState {
    /// State with the given session store and in-memory workspace documents.
    pub fn new(client: Arc<SuiteClient>, sessions: Arc<dyn SessionStore>) -> Self {
        let documents = Arc::new(InMemoryDocumentStore::new());
        Self {
            client,
            sessions,
            whiteboard: documents.clone(),
            todos: documents.clone(),
            notes: documents,
        }
    }

    /// State backed entirely by in-memory stores.
    pub fn in_memory(client: SuiteClient) -> Self {
        Self::new(Arc::new(client), Arc::new(InMemorySessionStore::new()))
    }

    /// Swap in one backend for every workspace document.
    pub fn with_documents<D>(mut self, store: Arc<D>) -> Self
    where
        D: WhiteboardStore + TodoStore + NotesStore + 'static,
    {
        self.whiteboard = store.clone();
        self.todos = store.clone();
        self.notes = store;
        self
    }
}

pub fn router(state: AppState) -> Router {
    router_with_limit(state, DEFAULT_BODY_LIMIT)
}

pub fn router_with_limit(state: AppState, body_limit: usize) -> Router {
    let api = Router::new()
        .route(
            "/chat",
            get(routes::chat_history)
                .post(routes::chat_send)
                .delete(routes::chat_clear),
        )
        .route("/github-models/models", get(routes::github_models_list))
        .route("/github-models/chat", post(routes::github_models_chat))
        .route(
            "/whiteboard",
            get(documents::whiteboard_get)
                .post(documents::whiteboard_save)
                .delete(documents::whiteboard_clear),
        )
        .route(
            "/todos",
            get(documents::todos_list).post(documents::todos_create),
        )
        .route(
            "/todos/{id}",
            put(documents::todos_rename).delete(documents::todos_delete),
        )
        .route("/todos/{id}/subtodos", post(documents::sub_todo_add))
        .route(
            "/todos/{id}/subtodos/{sub_id}",
            put(documents::sub_todo_update).delete(documents::sub_todo_delete),
        )
        .route("/notes", get(documents::notes_list).post(documents::notes_save))
        .route("/notes/{id}", axum::routing::delete(documents::notes_delete));

    Router::new()
        .route("/health", get(routes::health))
        .route("/textExtract", post(routes::text_extract))
        .route("/notesGenerate", post(routes::notes_generate))
        .nest("/api", api)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
