use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use http::Method;

use crate::config::RetryCfg;
use crate::pipeline::{Call, Failure, Outcome, ResponseHook};

/// Retry bookkeeping owned by exactly one logical request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Re-issues performed so far.
    pub retry_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    NonIdempotentMethod,
    NotRetryable,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    Stop(StopReason),
}

/// Immutable retry configuration, fixed at client construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    retryable_statuses: BTreeSet<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryCfg::default())
    }
}

impl From<&RetryCfg> for RetryPolicy {
    fn from(cfg: &RetryCfg) -> Self {
        Self {
            max_retries: cfg.max_retries,
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            retryable_statuses: cfg.retryable_statuses.iter().copied().collect(),
        }
    }
}

impl RetryPolicy {
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Methods whose repeated execution is safe.
    pub fn is_idempotent(method: &Method) -> bool {
        matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT)
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Wait before re-issue number `retry_count` (0-indexed): `base * 2^n`.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let factor = 1u32.checked_shl(retry_count).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    pub fn decide(&self, method: &Method, failure: &Failure, state: &RetryState) -> RetryDecision {
        if !Self::is_idempotent(method) {
            return RetryDecision::Stop(StopReason::NonIdempotentMethod);
        }
        let eligible = match failure {
            Failure::Transport(_) => true,
            Failure::Status(resp) => self.is_retryable_status(resp.status),
            Failure::Normalized(_) => false,
        };
        if !eligible {
            return RetryDecision::Stop(StopReason::NotRetryable);
        }
        if state.retry_count >= self.max_retries {
            return RetryDecision::Stop(StopReason::Exhausted);
        }
        RetryDecision::Retry {
            delay: self.delay_for(state.retry_count),
        }
    }
}

/// Inbound hook that transparently re-issues transient failures.
#[derive(Debug, Clone)]
pub struct RetryHook {
    policy: RetryPolicy,
    dev_mode: bool,
}

impl RetryHook {
    /// `dev_mode` enables per-attempt diagnostics.
    pub fn new(policy: RetryPolicy, dev_mode: bool) -> Self {
        Self { policy, dev_mode }
    }
}

#[async_trait]
impl ResponseHook for RetryHook {
    fn name(&self) -> &str {
        "retry"
    }

    async fn on_failure(&self, failure: Failure, call: &mut Call<'_>) -> Outcome {
        let method = call.request().method.clone();
        let mut failure = failure;
        loop {
            match self.policy.decide(&method, &failure, call.state()) {
                RetryDecision::Retry { delay } => {
                    if self.dev_mode {
                        tracing::debug!(
                            method = %method,
                            path = %call.request().path,
                            retry = call.state().retry_count + 1,
                            delay_ms = delay.as_millis() as u64,
                            "retrying request"
                        );
                    }
                    tokio::time::sleep(delay).await;
                    call.state_mut().retry_count += 1;
                    match call.reissue().await {
                        Ok(resp) => return Ok(resp),
                        Err(next) => failure = next,
                    }
                }
                RetryDecision::Stop(reason) => {
                    if self.dev_mode && reason == StopReason::Exhausted {
                        tracing::debug!(path = %call.request().path, "retries exhausted");
                    }
                    return Err(failure);
                }
            }
        }
    }
}
