use crate::adapters::{ResponseMetadata, UsageInfo};
use crate::catalog::Backend;
use serde::Serialize;

/// Normalized result of one call resolution.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub text: String,
    pub model_used: String,
    pub backend: Backend,
    /// Candidate ids tried, in order; the last one is `model_used`.
    pub attempted: Vec<String>,
    pub metadata: ResponseMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageInfo>,
    pub request_id: String,
    pub duration_ms: u64,
}

impl GenerateResponse {
    /// Number of candidates that failed before the winning one.
    pub fn fallbacks(&self) -> usize {
        self.attempted.len().saturating_sub(1)
    }
}
