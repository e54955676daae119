use crate::fallback::{FailureKind, ProviderFailure};
use crate::session::StoreError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "attachments[0].mime_type", "tasks.chat.candidates")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., offending value, attempted models)
    pub details: Option<String>,
    /// Source of the error (e.g., "request_builder", "fallback_orchestrator")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type surfaced to callers of the suite backend.
///
/// Per-candidate failures never show up here individually; the fallback
/// orchestrator folds them into one terminal variant.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Model \"{model}\" has reached its quota or rate limit: {message}")]
    RateLimited {
        model: String,
        message: String,
        attempted: Vec<String>,
    },

    #[error("Provider error ({kind}): {message} (attempted: {})", .attempted.join(", "))]
    Provider {
        kind: FailureKind,
        status: Option<u16>,
        message: String,
        attempted: Vec<String>,
    },

    #[error("No usable text returned by any candidate (attempted: {})", .attempted.join(", "))]
    EmptyResponse { attempted: Vec<String> },

    #[error("Deadline of {deadline_ms}ms exceeded while resolving a response")]
    DeadlineExceeded { deadline_ms: u64 },

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Fold the terminal failure of a call resolution into a caller-facing error.
    ///
    /// `model` is the candidate that produced `last`; `attempted` lists every
    /// candidate tried, in order.
    pub fn from_exhausted(last: ProviderFailure, model: &str, attempted: Vec<String>) -> Self {
        match last.kind {
            FailureKind::RateLimited => Error::RateLimited {
                model: model.to_string(),
                message: last.message,
                attempted,
            },
            FailureKind::EmptyResponse => Error::EmptyResponse { attempted },
            FailureKind::Authentication => Error::Configuration {
                message: format!(
                    "credentials for model \"{}\" were rejected by the provider: {}",
                    model, last.message
                ),
                context: ErrorContext::new()
                    .with_details(format!("attempted: {}", attempted.join(", ")))
                    .with_source("fallback_orchestrator"),
            },
            kind => Error::Provider {
                kind,
                status: last.status,
                message: last.message,
                attempted,
            },
        }
    }

    /// Note a retryable failure from an earlier candidate on a rejection
    /// raised by a later one. Only context-carrying variants change.
    pub fn with_prior_failure(self, model: &str, failure: &ProviderFailure) -> Self {
        let note = format!("{} failed earlier: {}", model, failure);
        let extend = |context: ErrorContext| {
            let details = match context.details.as_deref() {
                Some(existing) => format!("{}; {}", existing, note),
                None => note.clone(),
            };
            context.with_details(details)
        };
        match self {
            Error::Validation { message, context } => Error::Validation {
                message,
                context: extend(context),
            },
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: extend(context),
            },
            other => other,
        }
    }

    /// Machine-readable error kind for JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "validation_error",
            Error::Configuration { .. } => "configuration_error",
            Error::RateLimited { .. } => "rate_limit",
            Error::Provider { .. } => "provider_error",
            Error::EmptyResponse { .. } => "empty_response",
            Error::DeadlineExceeded { .. } => "deadline_exceeded",
            Error::Transport(_) => "network_error",
            Error::Store(StoreError::NotFound(_)) => "not_found",
            Error::Store(_) | Error::Io(_) | Error::Serialization(_) => "internal_error",
        }
    }

    /// HTTP status a route handler should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation { .. } => 400,
            Error::RateLimited { .. } => 429,
            Error::Provider { .. } | Error::EmptyResponse { .. } | Error::Transport(_) => 502,
            Error::DeadlineExceeded { .. } => 504,
            Error::Store(StoreError::NotFound(_)) => 404,
            Error::Configuration { .. }
            | Error::Store(_)
            | Error::Io(_)
            | Error::Serialization(_) => 500,
        }
    }

    /// Model ids tried before this error was raised, oldest first.
    pub fn attempted_models(&self) -> &[String] {
        match self {
            Error::RateLimited { attempted, .. }
            | Error::Provider { attempted, .. }
            | Error::EmptyResponse { attempted } => attempted,
            _ => &[],
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Validation { context, .. } | Error::Configuration { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }
}
