// ABOUTME: Retry policy value type governing all polling in the crate.
// ABOUTME: Constant or squared backoff delays, attempt-bounded.

use std::future::Future;
use std::time::Duration;

/// Delay schedule between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backoff {
    Constant(Duration),
    /// Delay grows as attempt number squared, in seconds.
    SquaredSeconds,
}

/// How many times to poll and how long to sleep between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    times: u32,
    backoff: Backoff,
}

/// Raised when a retry policy runs out of attempts.
#[derive(Debug, thiserror::Error)]
#[error("condition not met after {attempts} attempt(s)")]
pub struct RetryExhausted {
    pub attempts: u32,
}

impl RetryPolicy {
    /// Retry `times` times with a constant one second delay.
    pub fn after_secs(times: u32) -> Self {
        Self {
            times,
            backoff: Backoff::Constant(Duration::from_secs(1)),
        }
    }

    /// Retry `times` times sleeping `attempt * attempt` seconds between tries.
    pub fn after_squared_secs(times: u32) -> Self {
        Self {
            times,
            backoff: Backoff::SquaredSeconds,
        }
    }

    /// Retry `times` times with a fixed custom delay.
    pub fn with_delay(times: u32, delay: Duration) -> Self {
        Self {
            times,
            backoff: Backoff::Constant(delay),
        }
    }

    pub fn times(&self) -> u32 {
        self.times
    }

    /// Delay applied after the given 1-based attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Constant(d) => d,
            Backoff::SquaredSeconds => Duration::from_secs(u64::from(attempt) * u64::from(attempt)),
        }
    }

    /// Poll an async predicate until it returns true or attempts run out.
    ///
    /// Returns the 1-based attempt on which the predicate first held.
    pub async fn poll_until<F, Fut>(&self, mut predicate: F) -> Result<u32, RetryExhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        for attempt in 1..=self.times {
            if predicate().await {
                return Ok(attempt);
            }
            if attempt < self.times {
                tokio::time::sleep(self.delay(attempt)).await;
            }
        }
        Err(RetryExhausted {
            attempts: self.times,
        })
    }
}
