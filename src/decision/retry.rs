//! Bounded retry with an attempt-indexed backoff schedule.

use crate::errors::DecisionError;
use std::future::Future;
use std::time::Duration;

/// Default number of attempts per decision.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff schedule, indexed by the attempt that follows the wait.
pub const DEFAULT_RETRY_DELAYS_MS: [u64; 3] = [1000, 2000, 4000];

/// How many times to call the decision service and how long to wait in between.
///
/// `delays[0]` is waited before attempt 2, `delays[1]` before attempt 3, and so
/// on. Attempts past the end of the schedule reuse its last entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delays: DEFAULT_RETRY_DELAYS_MS
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
        }
    }
}

/// Outcome of [`RetryPolicy::run`].
#[derive(Debug)]
pub enum Attempted<T> {
    Succeeded {
        value: T,
        attempts: u32,
    },
    Exhausted {
        attempts: u32,
        last_error: Option<DecisionError>,
    },
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delays: Vec<Duration>) -> Self {
        Self {
            max_attempts,
            delays,
        }
    }

    /// A policy that never calls the service; every decision falls back.
    pub fn none() -> Self {
        Self::new(0, Vec::new())
    }

    /// Wait before the 1-based `attempt`. The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let idx = (attempt - 2) as usize;
        self.delays
            .get(idx)
            .or(self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// Failures are logged here and never returned individually; the caller
    /// only sees the last one on exhaustion.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Attempted<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, DecisionError>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            let delay = self.delay_before(attempt);
            if !delay.is_zero() {
                tracing::debug!(operation, attempt, delay_ms = delay.as_millis() as u64, "backing off");
                tokio::time::sleep(delay).await;
            }

            match op(attempt).await {
                Ok(value) => {
                    return Attempted::Succeeded {
                        value,
                        attempts: attempt,
                    };
                }
                Err(err) => {
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "decision attempt failed"
                    );
                    last_error = Some(err);
                }
            }
        }

        Attempted::Exhausted {
            attempts: self.max_attempts,
            last_error,
        }
    }
}
