//! 候选模型回退：按优先级依次尝试候选模型，遇到可重试失败则前进，遇到不可重试失败立即停止。
//!
//! Candidate fallback resolution.
//!
//! One call resolution walks an ordered candidate list through an explicit
//! state machine:
//!
//! ```text
//! Pending(0) --ok--> Success
//!     |  retryable failure, more candidates
//!     v
//! Pending(1) ... --non-retryable / last candidate--> Exhausted
//! ```
//!
//! Candidates are attempted in ascending priority order, each at most once,
//! with no delay in between. Every resolution starts fresh at `Pending(0)`.

mod failure;

pub use failure::{classify_failure, FailureKind, ProviderFailure};

use crate::catalog::ModelDescriptor;
use crate::telemetry::{ResolutionEvent, ResolutionSink};
use crate::{Error, ErrorContext, Result};
use std::future::Future;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Decision taken after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Fallback,
    Fail,
}

/// Knobs for the candidate loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackPolicy {
    /// Stop early once this many retryable failures were seen. `None` always exhausts.
    pub max_retryable_failures: Option<usize>,
}

impl FallbackPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retryable_failures(mut self, max: usize) -> Self {
        self.max_retryable_failures = Some(max);
        self
    }

    /// Decide what to do after `failure`.
    ///
    /// `retryable_failures` counts retryable failures so far, including this one.
    pub fn decide(
        &self,
        failure: &ProviderFailure,
        retryable_failures: usize,
        has_fallback: bool,
    ) -> Decision {
        if !failure.retryable() || !has_fallback {
            return Decision::Fail;
        }
        match self.max_retryable_failures {
            Some(max) if retryable_failures >= max => Decision::Fail,
            _ => Decision::Fallback,
        }
    }
}

/// Why a single attempt did not produce a value.
#[derive(Debug)]
pub enum AttemptError {
    /// The provider call failed; the policy decides whether to advance.
    Failed(ProviderFailure),
    /// The attempt was refused before any call (validation, missing credentials).
    /// Always ends the resolution with this error unchanged.
    Rejected(Error),
}

impl From<ProviderFailure> for AttemptError {
    fn from(f: ProviderFailure) -> Self {
        AttemptError::Failed(f)
    }
}

/// State of one call resolution.
#[derive(Debug)]
pub enum ResolutionState<T> {
    /// About to attempt the candidate at this index.
    Pending(usize),
    Success {
        value: T,
        model_used: String,
    },
    Exhausted {
        last_failure: ProviderFailure,
        last_model: String,
        /// True when a non-retryable failure (or the policy) stopped the loop early.
        aborted: bool,
    },
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub model_used: String,
    /// Every candidate id attempted, in order; the last one is `model_used`.
    pub attempted: Vec<String>,
    pub request_id: String,
}

/// Walk `candidates` in order until one attempt succeeds.
///
/// `attempt` performs exactly one provider call for the given candidate. The
/// policy is consulted after every [`AttemptError::Failed`]; a
/// [`AttemptError::Rejected`] ends the resolution immediately. When the loop
/// ends without success the last failure is folded into an [`Error`]
/// annotated with every attempted model id.
pub async fn resolve_with_fallback<T, F, Fut>(
    candidates: &[ModelDescriptor],
    policy: &FallbackPolicy,
    sink: &dyn ResolutionSink,
    mut attempt: F,
) -> Result<Resolved<T>>
where
    F: FnMut(ModelDescriptor) -> Fut,
    Fut: Future<Output = std::result::Result<T, AttemptError>>,
{
    if candidates.is_empty() {
        return Err(Error::configuration_with_context(
            "no candidate models configured",
            ErrorContext::new().with_source("fallback_orchestrator"),
        ));
    }

    let request_id = uuid::Uuid::new_v4().to_string();
    let started = Instant::now();
    let mut attempted: Vec<String> = Vec::with_capacity(candidates.len());
    let mut retryable_failures = 0usize;
    // Last retryable failure, kept so a later rejection does not hide it.
    let mut prior_failure: Option<(String, ProviderFailure)> = None;
    let mut state = ResolutionState::Pending(0);

    loop {
        state = match state {
            ResolutionState::Pending(index) => {
                let candidate = &candidates[index];
                attempted.push(candidate.id.clone());
                debug!(
                    request_id = %request_id,
                    model = %candidate.id,
                    backend = candidate.backend.as_str(),
                    attempt = index + 1,
                    "attempting candidate"
                );
                let _ = sink
                    .report(ResolutionEvent::attempt_started(
                        &request_id,
                        &candidate.id,
                        candidate.backend,
                        index,
                    ))
                    .await;

                match attempt(candidate.clone()).await {
                    Ok(value) => ResolutionState::Success {
                        value,
                        model_used: candidate.id.clone(),
                    },
                    Err(AttemptError::Rejected(err)) => {
                        warn!(
                            request_id = %request_id,
                            model = %candidate.id,
                            error_kind = err.kind(),
                            prior_model = prior_failure.as_ref().map(|(m, _)| m.as_str()),
                            prior_failure_kind = prior_failure.as_ref().map(|(_, f)| f.kind.name()),
                            "candidate rejected before provider call"
                        );
                        return Err(match prior_failure {
                            Some((model, failure)) => err.with_prior_failure(&model, &failure),
                            None => err,
                        });
                    }
                    Err(AttemptError::Failed(failure)) => {
                        if failure.retryable() {
                            retryable_failures += 1;
                        }
                        let has_fallback = index + 1 < candidates.len();
                        let decision = policy.decide(&failure, retryable_failures, has_fallback);
                        warn!(
                            request_id = %request_id,
                            model = %candidate.id,
                            attempt = index + 1,
                            failure_kind = failure.kind.name(),
                            http_status = failure.status,
                            remote_request_id = failure.metadata.request_id.as_deref(),
                            ratelimit_remaining = failure.metadata.ratelimit_remaining.as_deref(),
                            decision = ?decision,
                            "candidate failed: {}",
                            failure.message
                        );
                        let _ = sink
                            .report(ResolutionEvent::attempt_failed(
                                &request_id,
                                &candidate.id,
                                index,
                                &failure,
                            ))
                            .await;
                        match decision {
                            Decision::Fallback => {
                                prior_failure = Some((candidate.id.clone(), failure));
                                ResolutionState::Pending(index + 1)
                            }
                            Decision::Fail => ResolutionState::Exhausted {
                                aborted: !failure.retryable() || has_fallback,
                                last_failure: failure,
                                last_model: candidate.id.clone(),
                            },
                        }
                    }
                }
            }
            ResolutionState::Success { value, model_used } => {
                info!(
                    request_id = %request_id,
                    model = %model_used,
                    attempts = attempted.len(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "resolution succeeded"
                );
                let _ = sink
                    .report(ResolutionEvent::succeeded(
                        &request_id,
                        &model_used,
                        attempted.len(),
                    ))
                    .await;
                return Ok(Resolved {
                    value,
                    model_used,
                    attempted,
                    request_id,
                });
            }
            ResolutionState::Exhausted {
                last_failure,
                last_model,
                aborted,
            } => {
                warn!(
                    request_id = %request_id,
                    attempted = %attempted.join(","),
                    failure_kind = last_failure.kind.name(),
                    aborted,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "all candidates failed"
                );
                let _ = sink
                    .report(ResolutionEvent::exhausted(
                        &request_id,
                        &attempted,
                        last_failure.kind,
                        aborted,
                    ))
                    .await;
                return Err(Error::from_exhausted(last_failure, &last_model, attempted));
            }
        };
    }
}
