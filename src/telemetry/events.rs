//! Resolution events emitted by the fallback loop.

use crate::catalog::Backend;
use crate::fallback::{FailureKind, ProviderFailure};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

fn timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// A candidate is about to be called.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptStarted {
    pub request_id: String,
    pub model: String,
    pub backend: Backend,
    pub index: usize,
    pub timestamp: f64,
}

/// A candidate call failed and was classified.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptFailed {
    pub request_id: String,
    pub model: String,
    pub index: usize,
    pub kind: FailureKind,
    pub status: Option<u16>,
    pub message: String,
    pub remote_request_id: Option<String>,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Succeeded {
    pub request_id: String,
    pub model: String,
    pub attempts: usize,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Exhausted {
    pub request_id: String,
    pub attempted: Vec<String>,
    pub last_kind: FailureKind,
    pub aborted: bool,
    pub timestamp: f64,
}

/// Typed resolution events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionEvent {
    AttemptStarted(AttemptStarted),
    AttemptFailed(AttemptFailed),
    Succeeded(Succeeded),
    Exhausted(Exhausted),
}

impl ResolutionEvent {
    pub fn attempt_started(request_id: &str, model: &str, backend: Backend, index: usize) -> Self {
        Self::AttemptStarted(AttemptStarted {
            request_id: request_id.to_string(),
            model: model.to_string(),
            backend,
            index,
            timestamp: timestamp(),
        })
    }

    pub fn attempt_failed(
        request_id: &str,
        model: &str,
        index: usize,
        failure: &ProviderFailure,
    ) -> Self {
        Self::AttemptFailed(AttemptFailed {
            request_id: request_id.to_string(),
            model: model.to_string(),
            index,
            kind: failure.kind,
            status: failure.status,
            message: failure.message.clone(),
            remote_request_id: failure.metadata.request_id.clone(),
            timestamp: timestamp(),
        })
    }

    pub fn succeeded(request_id: &str, model: &str, attempts: usize) -> Self {
        Self::Succeeded(Succeeded {
            request_id: request_id.to_string(),
            model: model.to_string(),
            attempts,
            timestamp: timestamp(),
        })
    }

    pub fn exhausted(
        request_id: &str,
        attempted: &[String],
        last_kind: FailureKind,
        aborted: bool,
    ) -> Self {
        Self::Exhausted(Exhausted {
            request_id: request_id.to_string(),
            attempted: attempted.to_vec(),
            last_kind,
            aborted,
            timestamp: timestamp(),
        })
    }

    pub fn request_id(&self) -> &str {
        match self {
            ResolutionEvent::AttemptStarted(e) => &e.request_id,
            ResolutionEvent::AttemptFailed(e) => &e.request_id,
            ResolutionEvent::Succeeded(e) => &e.request_id,
            ResolutionEvent::Exhausted(e) => &e.request_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            ResolutionEvent::AttemptStarted(_) => "attempt_started",
            ResolutionEvent::AttemptFailed(_) => "attempt_failed",
            ResolutionEvent::Succeeded(_) => "succeeded",
            ResolutionEvent::Exhausted(_) => "exhausted",
        }
    }
}
