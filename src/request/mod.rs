//! 请求构建：把任务、用户消息、附件、上下文笔记和历史记录整理成与具体厂商无关的 ProviderRequest。
//!
//! Request shaping.
//!
//! [`RequestBuilder::build`] turns a caller-level [`GenerateRequest`] into a
//! provider-agnostic [`ProviderRequest`] for one candidate model:
//!
//! 1. every attachment is checked against the candidate's file policy,
//! 2. the task's system instruction comes first, with an optional
//!    `Additional instruction: ...` suffix,
//! 3. context notes are rendered as titled blocks ahead of the message,
//! 4. history is cut to the last [`HISTORY_WINDOW`] turns.
//!
//! Adapters decide how the history is rendered on the wire.

mod instructions;

pub use instructions::{
    SystemInstructions, CHAT_INSTRUCTION, DEFAULT_ASSISTANT_NAME, NOTES_GENERATION_INSTRUCTION,
    TEXT_EXTRACTION_INSTRUCTION,
};

use crate::catalog::ModelDescriptor;
use crate::file_policy::normalize_mime;
use crate::types::{Attachment, ContextNote, ConversationTurn, Role, Task};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};

/// Number of prior turns kept as conversational context.
pub const HISTORY_WINDOW: usize = 20;

/// How prior turns are placed into the outbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    /// One wire message per turn.
    Structured,
    /// A single "previous chat" text block ahead of the current turn.
    #[default]
    Flattened,
}

/// Caller-level generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub task: Task,
    /// Use exactly this model, with no fallback.
    pub model: Option<String>,
    /// Try this model first, then the task's candidates.
    pub preferred_model: Option<String>,
    pub message: String,
    pub attachments: Vec<Attachment>,
    pub context_notes: Vec<ContextNote>,
    pub history: Vec<ConversationTurn>,
    pub retry_instruction: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl GenerateRequest {
    pub fn new(task: Task, message: impl Into<String>) -> Self {
        Self {
            task,
            model: None,
            preferred_model: None,
            message: message.into(),
            attachments: Vec::new(),
            context_notes: Vec::new(),
            history: Vec::new(),
            retry_instruction: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_preferred_model(mut self, model: impl Into<String>) -> Self {
        self.preferred_model = Some(model.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_context_notes(mut self, notes: Vec<ContextNote>) -> Self {
        self.context_notes = notes;
        self
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_retry_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.retry_instruction = Some(instruction.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// An attachment ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePart {
    pub mime_type: String,
    pub data_base64: String,
    pub file_name: String,
}

/// Provider-agnostic payload for exactly one candidate.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub task: Task,
    pub model: String,
    pub system_instruction: String,
    /// Oldest first, at most [`HISTORY_WINDOW`] turns.
    pub history: Vec<ConversationTurn>,
    pub user_text: String,
    pub inline_parts: Vec<InlinePart>,
    pub assistant_name: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl ProviderRequest {
    /// History rendered as one text block, or `None` when there is none.
    pub fn flattened_history(&self) -> Option<String> {
        if self.history.is_empty() {
            return None;
        }
        let lines = self
            .history
            .iter()
            .map(|turn| {
                let label = match turn.role {
                    Role::User => "User",
                    Role::Assistant => self.assistant_name.as_str(),
                    Role::System => "System",
                };
                format!("{}: {}", label, turn.content)
            })
            .collect::<Vec<_>>()
            .join("\n");
        Some(format!(
            "Here is your previous chat with the user:\n\n{}\n\nNow respond to their current message below.",
            lines
        ))
    }
}

/// `Context from notes:` followed by one titled block per note, then the message.
pub fn compose_user_text(message: &str, notes: &[ContextNote]) -> String {
    if notes.is_empty() {
        return message.to_string();
    }
    let blocks = notes
        .iter()
        .map(ContextNote::render)
        .collect::<Vec<_>>()
        .join("\n\n");
    if message.is_empty() {
        format!("Context from notes:\n\n{}", blocks)
    } else {
        format!("Context from notes:\n\n{}\n\n{}", blocks, message)
    }
}

/// Last `window` turns of `history`, oldest first.
pub fn window_history(history: &[ConversationTurn], window: usize) -> Vec<ConversationTurn> {
    let start = history.len().saturating_sub(window);
    history[start..].to_vec()
}

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    instructions: SystemInstructions,
    history_window: usize,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(SystemInstructions::default())
    }
}

impl RequestBuilder {
    pub fn new(instructions: SystemInstructions) -> Self {
        Self {
            instructions,
            history_window: HISTORY_WINDOW,
        }
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn instructions(&self) -> &SystemInstructions {
        &self.instructions
    }

    /// Check every attachment against the model's file policy.
    pub fn check_attachments(model: &ModelDescriptor, attachments: &[Attachment]) -> Result<()> {
        for (i, attachment) in attachments.iter().enumerate() {
            if !model.file_policy.allows(&attachment.mime_type) {
                return Err(Error::validation_with_context(
                    format!(
                        "File type {} is not supported by model {}",
                        normalize_mime(&attachment.mime_type),
                        model.id
                    ),
                    ErrorContext::new()
                        .with_field_path(format!("attachments[{}].mime_type", i))
                        .with_details(attachment.file_name.clone())
                        .with_source("request_builder"),
                ));
            }
        }
        Ok(())
    }

    pub fn build(&self, model: &ModelDescriptor, input: &GenerateRequest) -> Result<ProviderRequest> {
        Self::check_attachments(model, &input.attachments)?;

        let base = self.instructions.for_task(input.task).trim();
        let system_instruction = match input.retry_instruction.as_deref().map(str::trim) {
            Some(extra) if !extra.is_empty() => {
                format!("{}\n\nAdditional instruction: {}", base, extra)
            }
            _ => base.to_string(),
        };

        let inline_parts = input
            .attachments
            .iter()
            .map(|a| InlinePart {
                mime_type: normalize_mime(&a.mime_type),
                data_base64: a.to_base64(),
                file_name: a.file_name.clone(),
            })
            .collect();

        Ok(ProviderRequest {
            task: input.task,
            model: model.id.clone(),
            system_instruction,
            history: window_history(&input.history, self.history_window),
            user_text: compose_user_text(&input.message, &input.context_notes),
            inline_parts,
            assistant_name: self.instructions.assistant_name().to_string(),
            temperature: input.temperature,
            max_tokens: input.max_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Backend;

    fn gemini() -> ModelDescriptor {
        ModelDescriptor::from_id("gemini-2.5-flash", Backend::Gemini, 0)
    }

    #[test]
    fn test_context_notes_precede_message() {
        let req = GenerateRequest::new(Task::Chat, "hello").with_context_notes(vec![
            ContextNote::new("A", "x"),
            ContextNote::new("B", "y"),
        ]);
        let built = RequestBuilder::default().build(&gemini(), &req).unwrap();
        let a = built.user_text.find("--- A ---\nx").unwrap();
        let b = built.user_text.find("--- B ---\ny").unwrap();
        let msg = built.user_text.rfind("hello").unwrap();
        assert!(a < b && b < msg);
        assert!(built.user_text.contains("--- A ---\nx\n\n--- B ---\ny\n\nhello"));
    }

    #[test]
    fn test_history_window_keeps_last_twenty() {
        let history: Vec<_> = (1..=25)
            .map(|i| ConversationTurn::user(format!("turn {}", i)))
            .collect();
        let req = GenerateRequest::new(Task::Chat, "now").with_history(history);
        let built = RequestBuilder::default().build(&gemini(), &req).unwrap();
        assert_eq!(built.history.len(), 20);
        assert_eq!(built.history[0].content, "turn 6");
        assert_eq!(built.history[19].content, "turn 25");
    }

    #[test]
    fn test_retry_instruction_is_appended() {
        let req = GenerateRequest::new(Task::NotesGeneration, "")
            .with_retry_instruction("focus on chapter 2");
        let built = RequestBuilder::default().build(&gemini(), &req).unwrap();
        assert!(built.system_instruction.starts_with("# 📘 Study Notes Generator"));
        assert!(built
            .system_instruction
            .ends_with("\n\nAdditional instruction: focus on chapter 2"));
    }

    #[test]
    fn test_disallowed_attachment_is_validation_error() {
        let model = ModelDescriptor::from_id("gpt-3.5-turbo", Backend::GithubModels, 0);
        let req = GenerateRequest::new(Task::Chat, "see file")
            .with_attachment(Attachment::new("a.png", "image/png", vec![1, 2, 3]));
        let err = RequestBuilder::default().build(&model, &req).unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("attachments[0].mime_type")
        );
    }

    #[test]
    fn test_flattened_history_labels() {
        let req = GenerateRequest::new(Task::Chat, "next").with_history(vec![
            ConversationTurn::user("hi"),
            ConversationTurn::assistant("hello there"),
        ]);
        let built = RequestBuilder::default().build(&gemini(), &req).unwrap();
        let flat = built.flattened_history().unwrap();
        assert!(flat.contains("User: hi\nBella: hello there"));
        assert!(flat.ends_with("Now respond to their current message below."));
    }

    #[test]
    fn test_attachments_are_encoded() {
        let req = GenerateRequest::new(Task::TextExtraction, "")
            .with_attachment(Attachment::new("scan.pdf", "application/pdf", b"hello".to_vec()));
        let built = RequestBuilder::default().build(&gemini(), &req).unwrap();
        assert_eq!(built.inline_parts[0].data_base64, "aGVsbG8=");
        assert!(built.system_instruction.starts_with("You are a handwriting-to-digital"));
    }
}
