//! 失败分类：把一次 provider 调用的失败归为固定的几类，并决定是否可以换下一个候选模型。
//!
//! Failure classification for a single provider call.
//!
//! Every failed attempt is reduced to a [`FailureKind`] by one pure function,
//! [`classify_failure`]. The orchestrator only ever looks at the kind.
//!
//! | Kind               | Status   | Message fragments                              | Retryable |
//! |--------------------|----------|------------------------------------------------|-----------|
//! | NotFound           | 404      | "not found", "unsupported", "does not support" | yes       |
//! | RateLimited        | 429      | "quota", "rate limit"                          | yes       |
//! | ServiceUnavailable | 503      | "overloaded", "unavailable"                    | yes       |
//! | EmptyResponse      | -        | (no extractable text)                          | yes       |
//! | Authentication     | 401, 403 (after the scan) | "api key", "unauthorized", "permission denied" | no |
//! | InvalidRequest     | 400, 413, 422 | -                                         | no        |
//! | Network            | -        | (transport failure)                            | no        |
//! | Other              | anything else |                                           | no        |

use crate::adapters::ResponseMetadata;
use serde::Serialize;
use std::fmt;

/// Closed set of failure kinds a provider call can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Model does not exist or does not support the request shape
    NotFound,
    /// Quota exhausted or request rate exceeded
    RateLimited,
    /// Provider temporarily overloaded
    ServiceUnavailable,
    /// Call succeeded but no usable text could be extracted
    EmptyResponse,
    /// Credentials missing, invalid or rejected
    Authentication,
    /// Malformed request rejected by the provider
    InvalidRequest,
    /// Connection, DNS or timeout failure before a response arrived
    Network,
    /// Anything that could not be classified
    Other,
}

impl FailureKind {
    /// Returns the standard name (e.g., `"rate_limited"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::ServiceUnavailable => "service_unavailable",
            Self::EmptyResponse => "empty_response",
            Self::Authentication => "authentication",
            Self::InvalidRequest => "invalid_request",
            Self::Network => "network",
            Self::Other => "other",
        }
    }

    /// Whether the orchestrator may advance to the next candidate.
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::RateLimited | Self::ServiceUnavailable | Self::EmptyResponse
        )
    }

    /// Kind implied by the HTTP status alone, if the status is decisive.
    ///
    /// Only the retryable statuses are decisive. 401/403 are settled after
    /// the message scan, so a 403 carrying a rate-limit body stays retryable.
    pub fn from_http_status(status: u16) -> Option<Self> {
        match status {
            404 => Some(Self::NotFound),
            429 => Some(Self::RateLimited),
            503 => Some(Self::ServiceUnavailable),
            _ => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a failed provider call.
///
/// A decisive status code (404, 429, 503) wins. Otherwise the lower-cased
/// message is scanned in table order, and only then do 401/403 map to
/// `Authentication` and the remaining client statuses to `InvalidRequest`.
pub fn classify_failure(status: Option<u16>, message: &str) -> FailureKind {
    if let Some(kind) = status.and_then(FailureKind::from_http_status) {
        return kind;
    }

    let msg = message.to_lowercase();
    let contains_any = |needles: &[&str]| needles.iter().any(|n| msg.contains(n));

    if contains_any(&["not found", "unsupported", "does not support"]) {
        return FailureKind::NotFound;
    }
    if contains_any(&["quota", "rate limit"]) {
        return FailureKind::RateLimited;
    }
    if contains_any(&["overloaded", "unavailable"]) {
        return FailureKind::ServiceUnavailable;
    }
    if contains_any(&["api key", "unauthorized", "permission denied"]) {
        return FailureKind::Authentication;
    }

    match status {
        Some(401) | Some(403) => FailureKind::Authentication,
        Some(400) | Some(413) | Some(422) => FailureKind::InvalidRequest,
        _ => FailureKind::Other,
    }
}

/// A classified failure of exactly one adapter call.
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    pub kind: FailureKind,
    pub status: Option<u16>,
    pub message: String,
    pub metadata: ResponseMetadata,
}

impl ProviderFailure {
    /// Failure for a non-2xx HTTP answer.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: classify_failure(Some(status), &message),
            status: Some(status),
            message,
            metadata: ResponseMetadata::default(),
        }
    }

    /// Failure raised before any response arrived.
    ///
    /// Transport messages that still match a retryable fragment keep that
    /// kind; everything else is `Network`.
    pub fn network(message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = match classify_failure(None, &message) {
            FailureKind::Other => FailureKind::Network,
            kind => kind,
        };
        Self {
            kind,
            status: None,
            message,
            metadata: ResponseMetadata::default(),
        }
    }

    /// A 2xx answer with nothing usable in it.
    pub fn empty_response(status: Option<u16>) -> Self {
        Self {
            kind: FailureKind::EmptyResponse,
            status,
            message: "Provider returned no extractable text".to_string(),
            metadata: ResponseMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ResponseMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    #[inline]
    pub fn retryable(&self) -> bool {
        self.kind.retryable()
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "[{}] HTTP {}: {}", self.kind, status, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}
