// ABOUTME: The process boundary - the sole channel to the container engine.
// ABOUTME: Spawns one `docker` process per call with timeout and exit-code validation.

mod spec;

pub use spec::{ExecSpec, ProcessOutcome, Stdio};

use async_trait::async_trait;
use snafu::Snafu;
use std::process::Stdio as OsStdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Errors raised at the process boundary.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProcessError {
    #[snafu(display("process timed out after {millis} ms: '{command}'"))]
    Timeout { command: String, millis: u64 },

    #[snafu(display("process failed with exit code {code}: '{command}', stderr: '{stderr}'"))]
    Failure {
        command: String,
        code: i32,
        stderr: String,
    },

    #[snafu(display("cannot spawn process '{command}': {source}"))]
    Spawn {
        command: String,
        source: std::io::Error,
    },
}

pub type ProcessResult<T> = Result<T, ProcessError>;

/// Executes external commands. The seam that lets tests substitute the engine.
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run the spec, validating the exit code against `expected_exit_codes`.
    async fn run(&self, spec: ExecSpec) -> ProcessResult<ProcessOutcome>;

    /// Run the spec with suppressed stdio, accepting any exit code.
    /// The caller inspects the returned code.
    async fn run_quietly(&self, spec: ExecSpec) -> ProcessResult<ProcessOutcome>;
}

pub type SharedRunner = Arc<dyn Runner>;

/// Production runner spawning real processes via tokio.
#[derive(Debug, Default)]
pub struct CliRunner;

impl CliRunner {
    pub fn shared() -> SharedRunner {
        Arc::new(CliRunner)
    }

    async fn spawn(&self, spec: &ExecSpec, quiet: bool) -> ProcessResult<ProcessOutcome> {
        let display = spec.display();

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(dir) = &spec.work_dir {
            command.current_dir(dir);
        }
        // The timeout branch drops the wait future; the child must not outlive it.
        command.kill_on_drop(true);

        let capture = quiet || spec.stdio == Stdio::Capture;
        if capture {
            command.stdout(OsStdio::piped()).stderr(OsStdio::piped());
        } else {
            command.stdout(OsStdio::inherit()).stderr(OsStdio::inherit());
        }
        command.stdin(if spec.input.is_some() {
            OsStdio::piped()
        } else {
            OsStdio::null()
        });

        let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
            command: display.clone(),
            source,
        })?;

        if let Some(input) = &spec.input
            && let Some(mut stdin) = child.stdin.take()
        {
            stdin
                .write_all(input)
                .await
                .map_err(|source| ProcessError::Spawn {
                    command: display.clone(),
                    source,
                })?;
        }

        let waited = match spec.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(output) => output,
                Err(_) => {
                    return Err(ProcessError::Timeout {
                        command: display,
                        millis: timeout.as_millis() as u64,
                    });
                }
            },
            None => child.wait_with_output().await,
        };

        let output = waited.map_err(|source| ProcessError::Spawn {
            command: display,
            source,
        })?;

        Ok(ProcessOutcome {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[async_trait]
impl Runner for CliRunner {
    async fn run(&self, spec: ExecSpec) -> ProcessResult<ProcessOutcome> {
        tracing::debug!(command = %spec.display(), "executing process");
        let outcome = self.spawn(&spec, false).await?;

        if !spec.exit_code_accepted(outcome.exit_code) {
            return Err(ProcessError::Failure {
                command: spec.display(),
                code: outcome.exit_code,
                stderr: outcome.stderr,
            });
        }
        Ok(outcome)
    }

    async fn run_quietly(&self, spec: ExecSpec) -> ProcessResult<ProcessOutcome> {
        tracing::debug!(command = %spec.display(), "executing process quietly");
        self.spawn(&spec, true).await
    }
}
