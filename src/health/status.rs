// ABOUTME: Immutable per-attempt snapshot of one health check outcome.
// ABOUTME: Produced fresh every attempt, reported, then discarded.

use std::fmt;

/// Outcome of one probe attempt for one named check.
#[derive(Debug, Clone)]
pub struct HealthStatus {
    check: String,
    failure: Option<String>,
}

impl HealthStatus {
    pub fn passed(check: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            failure: None,
        }
    }

    pub fn failed(check: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            failure: Some(cause.into()),
        }
    }

    pub fn check(&self) -> &str {
        &self.check
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    fn indicator(&self) -> char {
        if self.succeeded() { '+' } else { '-' }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            Some(cause) => write!(f, "[{}] {} | {}", self.indicator(), self.check, cause),
            None => write!(f, "[{}] {}", self.indicator(), self.check),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_pass_and_fail() {
        assert_eq!(HealthStatus::passed("web").to_string(), "[+] web");
        assert_eq!(
            HealthStatus::failed("db", "connection refused").to_string(),
            "[-] db | connection refused"
        );
    }
}
