// ABOUTME: Value types describing a single process invocation and its outcome.
// ABOUTME: Exit-code expectations follow Docker CLI conventions: default {0}, empty = any.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Whether process output is streamed to the terminal or captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stdio {
    /// Inherit the parent's stdout/stderr (interactive operations).
    #[default]
    Inherit,
    /// Capture output for later inspection.
    Capture,
}

/// Description of one external process invocation.
#[derive(Debug, Clone)]
pub struct ExecSpec {
    pub program: String,
    pub args: Vec<String>,
    pub work_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
    /// Accepted exit codes. Empty set accepts any code.
    pub expected_exit_codes: BTreeSet<i32>,
    pub input: Option<Vec<u8>>,
    pub stdio: Stdio,
}

impl ExecSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: None,
            timeout: None,
            expected_exit_codes: BTreeSet::from([0]),
            input: None,
            stdio: Stdio::default(),
        }
    }

    /// Shorthand for a `docker` invocation.
    pub fn docker<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("docker").with_args(args)
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the accepted exit code set. An empty iterator accepts any code.
    pub fn expecting_exit_codes<I: IntoIterator<Item = i32>>(mut self, codes: I) -> Self {
        self.expected_exit_codes = codes.into_iter().collect();
        self
    }

    pub fn with_input(mut self, input: Vec<u8>) -> Self {
        self.input = Some(input);
        self
    }

    pub fn captured(mut self) -> Self {
        self.stdio = Stdio::Capture;
        self
    }

    pub fn exit_code_accepted(&self, code: i32) -> bool {
        self.expected_exit_codes.is_empty() || self.expected_exit_codes.contains(&code)
    }

    /// Human-readable command line for logs and error messages.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Result of one process invocation.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutcome {
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_expects_zero() {
        let spec = ExecSpec::docker(["ps"]);
        assert!(spec.exit_code_accepted(0));
        assert!(!spec.exit_code_accepted(1));
    }

    #[test]
    fn empty_set_accepts_any_code() {
        let spec = ExecSpec::docker(["ps"]).expecting_exit_codes([]);
        assert!(spec.exit_code_accepted(0));
        assert!(spec.exit_code_accepted(137));
    }

    #[test]
    fn display_joins_command_line() {
        let spec = ExecSpec::docker(["network", "inspect", "dev_devstack-net"]);
        assert_eq!(spec.display(), "docker network inspect dev_devstack-net");
    }
}
