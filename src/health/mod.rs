// ABOUTME: Named-check registry with retry/backoff evaluation.
// ABOUTME: One engine serves both the hard pre-flight gate and the soft background pass.

mod http;
mod status;

pub use http::HttpCheck;
pub use status::HealthStatus;

use futures::future::{BoxFuture, join_all};
use thiserror::Error;

use crate::retry::RetryPolicy;

/// Error produced by a probe body to signal failure.
pub type ProbeError = Box<dyn std::error::Error + Send + Sync>;

type Probe = Box<dyn Fn() -> BoxFuture<'static, Result<(), ProbeError>> + Send + Sync>;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("environment health check(s) failed. Success ratio: {ratio}:\n{statuses}")]
    Failed { ratio: String, statuses: String },
}

/// A named side-effecting probe; failure is signaled through its error.
pub struct HealthCheck {
    name: String,
    probe: Probe,
}

impl HealthCheck {
    async fn perform(&self) -> HealthStatus {
        match (self.probe)().await {
            Ok(()) => HealthStatus::passed(&self.name),
            Err(cause) => HealthStatus::failed(&self.name, cause.to_string()),
        }
    }
}

pub struct HealthChecker {
    checks: Vec<HealthCheck>,
    retry: RetryPolicy,
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthChecker {
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            retry: RetryPolicy::after_squared_secs(10),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Register a named check with an async probe body.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, probe: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ProbeError>> + Send + 'static,
    {
        self.checks.push(HealthCheck {
            name: name.into(),
            probe: Box::new(move || Box::pin(probe())),
        });
    }

    /// Register an HTTP probe.
    pub fn http(&mut self, name: impl Into<String>, check: HttpCheck) {
        self.register(name, move || {
            let check = check.clone();
            async move { check.probe().await }
        });
    }

    /// Evaluate all checks under the configured retry policy.
    pub async fn check(&self, verbose: bool) -> Result<Vec<HealthStatus>, HealthError> {
        self.check_with(verbose, self.retry).await
    }

    /// Evaluate all checks under an explicit retry policy.
    ///
    /// Every attempt runs all registered checks concurrently. When attempts
    /// exhaust with failures: verbose raises a final error listing every
    /// status sorted by name; non-verbose logs the same listing at error
    /// level and returns the statuses, so callers can reconcile softly.
    pub async fn check_with(
        &self,
        verbose: bool,
        retry: RetryPolicy,
    ) -> Result<Vec<HealthStatus>, HealthError> {
        let mut all: Vec<HealthStatus> = Vec::new();
        let mut failed_count = 0usize;

        for attempt in 1..=retry.times() {
            if attempt > 1 {
                tracing::info!(
                    attempt = attempt - 1,
                    attempts = retry.times(),
                    failed = failed_count,
                    "health rechecking"
                );
            } else {
                tracing::info!(checks = self.checks.len(), "health checking");
            }

            all = join_all(self.checks.iter().map(HealthCheck::perform)).await;
            failed_count = all.iter().filter(|s| !s.succeeded()).count();

            if failed_count == 0 {
                tracing::info!(ratio = %self.ratio(&all), "environment health check(s) succeed");
                return Ok(all);
            }

            if attempt < retry.times() {
                tokio::time::sleep(retry.delay(attempt)).await;
            }
        }

        let mut sorted = all.clone();
        sorted.sort_by(|a, b| a.check().cmp(b.check()));
        let statuses = sorted
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        let error = HealthError::Failed {
            ratio: self.ratio(&all),
            statuses,
        };

        if verbose {
            Err(error)
        } else {
            tracing::error!("{error}");
            Ok(all)
        }
    }

    fn ratio(&self, all: &[HealthStatus]) -> String {
        let passed = all.iter().filter(|s| s.succeeded()).count();
        let percent = if all.is_empty() {
            100.0
        } else {
            passed as f64 * 100.0 / all.len() as f64
        };
        format!("{passed}/{} ({percent:.0}%)", all.len())
    }
}
