//! Bounded retries with exponential backoff and jitter.
//!
//! ### Policy
//! - Only GET and POST are sent. Anything else short-circuits to a local 405.
//! - An optional pre-delay runs once before the first attempt.
//! - Transient failures (connect, timeout, body read) are retried up to
//!   `retries` extra times. HTTP error statuses are returned untouched.
//! - Delay before retry `n` (0-indexed) is `backoff_factor * 2^n` seconds
//!   plus jitter in `[0, 0.1)` seconds.
//! - Exhaustion yields the pseudo-status 599 with the last error as body.
//!
//! Delays go through a [`Sleeper`] so the loop runs without wall-clock
//! sleeps in tests.

use async_trait::async_trait;
use rand::Rng;
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use super::transport::{Transport, TransportError, TransportResult};

/// Status returned when every attempt failed at the network level.
pub const RETRIES_EXHAUSTED_STATUS: u16 = 599;

/// Status returned for methods other than GET and POST.
pub const METHOD_NOT_ALLOWED_STATUS: u16 = 405;

/// Upper bound (exclusive) of the random jitter added to each backoff.
const MAX_JITTER_SECS: f64 = 0.1;

/// Delay primitive used between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retry knobs for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub retries: u32,
    /// Base of the exponential backoff, in seconds.
    pub backoff_factor: f64,
    /// Sleep once before the first attempt.
    pub pre_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { retries: 3, backoff_factor: 0.5, pre_delay: None }
    }
}

/// Backoff before retry `attempt` (0-indexed), with the supplied jitter in seconds.
pub fn backoff_delay(backoff_factor: f64, attempt: u32, jitter_secs: f64) -> Duration {
    let exp = 2f64.powi(attempt.min(30) as i32);
    let secs = (backoff_factor * exp + jitter_secs).max(0.0);
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

fn random_jitter() -> f64 {
    rand::thread_rng().gen_range(0.0..MAX_JITTER_SECS)
}

/// States of one retrying call.
#[derive(Debug)]
enum RetryState {
    Attempting { attempt: u32 },
    BackoffWait { attempt: u32, delay: Duration },
    Succeeded(TransportResult),
    Exhausted(TransportError),
}

/// Wraps a [`Transport`] with the retry policy.
#[derive(Clone)]
pub struct RetryingTransport {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryingTransport {
    pub fn new(transport: Arc<dyn Transport>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { transport, sleeper }
    }

    /// Run the call to completion. Never fails; failures are encoded in the status.
    pub async fn call(
        &self, method: &Method, url: &str, params: Option<&Map<String, Value>>, policy: &RetryPolicy,
    ) -> TransportResult {
        if *method != Method::GET && *method != Method::POST {
            tracing::error!("unsupported HTTP method: {}", method);
            return TransportResult::new(METHOD_NOT_ALLOWED_STATUS, format!("Unsupported method: {method}"));
        }

        if let Some(delay) = policy.pre_delay {
            self.sleeper.sleep(delay).await;
        }

        let total = policy.retries.saturating_add(1);
        let mut state = RetryState::Attempting { attempt: 0 };

        loop {
            state = match state {
                RetryState::Attempting { attempt } => match self.transport.send(method, url, params).await {
                    Ok(result) => RetryState::Succeeded(result),
                    Err(err) if attempt < policy.retries => {
                        let delay = backoff_delay(policy.backoff_factor, attempt, random_jitter());
                        tracing::warn!(
                            "request failed (attempt {}/{}), retrying in {:?}: {}",
                            attempt + 1,
                            total,
                            delay,
                            err
                        );
                        RetryState::BackoffWait { attempt, delay }
                    }
                    Err(err) => {
                        tracing::error!("request to {} failed after {} attempts: {}", url, total, err);
                        RetryState::Exhausted(err)
                    }
                },
                RetryState::BackoffWait { attempt, delay } => {
                    self.sleeper.sleep(delay).await;
                    RetryState::Attempting { attempt: attempt + 1 }
                }
                RetryState::Succeeded(result) => return result,
                RetryState::Exhausted(err) => {
                    return TransportResult::new(RETRIES_EXHAUSTED_STATUS, format!("All retry attempts failed: {err}"));
                }
            };
        }
    }
}
