//! # pen2pdf-ai
//!
//! Pen2PDF 生产力套件的后端：在 Gemini、GitHub Models 与 LongCat 之间做模型回退与请求整形。
//!
//! Multi-provider model fallback and request shaping for the Pen2PDF
//! productivity suite.
//!
//! ## Overview
//!
//! Every AI feature of the suite (handwriting extraction, study-notes
//! generation, the chat assistant) goes through one path: pick an ordered list
//! of candidate models for the task, shape the request for each candidate's
//! backend, call it once, and advance to the next candidate only when the
//! failure is one a different model could fix.
//!
//! ## Key Features
//!
//! - **Unified Client**: [`SuiteClient`] resolves a [`GenerateRequest`] across candidates
//! - **Injected Catalog**: [`catalog::ModelCatalog`] owns model lists and per-task candidates
//! - **File Policy**: [`file_policy`] decides which uploads a model may receive
//! - **Failure Classification**: [`fallback::classify_failure`] is the single retry decision point
//! - **Telemetry**: resolution events via [`telemetry::ResolutionSink`]
//! - **HTTP Surface**: axum routes in [`server`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pen2pdf_ai::{GenerateRequest, SuiteClient, SuiteConfig, Task};
//!
//! #[tokio::main]
//! async fn main() -> pen2pdf_ai::Result<()> {
//!     let config = SuiteConfig::load()?;
//!     let client = SuiteClient::from_config(&config)?;
//!
//!     let request = GenerateRequest::new(Task::Chat, "Summarize my notes on entropy");
//!     let response = client.generate_response(&request).await?;
//!     println!("{} (via {})", response.text, response.model_used);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`catalog`] | Model descriptors, backend lists, per-task candidates |
//! | [`file_policy`] | Upload MIME rules derived from model ids |
//! | [`request`] | System instructions and per-backend request shaping |
//! | [`adapters`] | Gemini and chat-completions wire adapters |
//! | [`fallback`] | Failure classification and the candidate loop |
//! | [`client`] | Suite client and builder |
//! | [`config`] | YAML configuration and credential resolution |
//! | [`session`] | Chat session persistence |
//! | [`documents`] | Whiteboard, todo and notes-library stores |
//! | [`server`] | axum routes |
//! | [`telemetry`] | Resolution event sinks |

pub mod adapters;
pub mod catalog;
pub mod client;
pub mod config;
pub mod documents;
pub mod fallback;
pub mod file_policy;
pub mod request;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{GenerateResponse, SuiteClient, SuiteClientBuilder};
pub use config::SuiteConfig;
pub use file_policy::is_file_allowed;
pub use request::GenerateRequest;
pub use telemetry::{ResolutionEvent, ResolutionSink};
pub use types::{Attachment, ContextNote, ConversationTurn, Role, Task};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
