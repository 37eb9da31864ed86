// ABOUTME: Cluster-level lifecycle for one local stack: init, deploy, undeploy, readiness.
// ABOUTME: Two interchangeable backends (Compose, Swarm) share the same state machine.

mod compose;
mod swarm;

pub use compose::ComposeStack;
pub use swarm::SwarmStack;

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::process::{ExecSpec, SharedRunner};
use crate::retry::RetryPolicy;
use crate::types::StackName;

/// Suffix appended to the stack name to form the backing network name.
pub const NETWORK_SUFFIX: &str = "devstack-net";

/// Which orchestration protocol realizes the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Compose,
    Swarm,
}

/// Tunables shared by both backends.
#[derive(Debug, Clone)]
pub struct StackSettings {
    pub name: StackName,
    pub topology_file: PathBuf,
    pub init_timeout: Duration,
    pub network_timeout: Duration,
    pub deploy_retry: RetryPolicy,
    pub undeploy_retry: RetryPolicy,
}

impl StackSettings {
    pub fn new(name: StackName, topology_file: impl Into<PathBuf>) -> Self {
        Self {
            name,
            topology_file: topology_file.into(),
            init_timeout: Duration::from_secs(30),
            network_timeout: Duration::from_secs(10),
            deploy_retry: RetryPolicy::after_secs(30),
            undeploy_retry: RetryPolicy::after_secs(30),
        }
    }

    /// Name of the network whose presence signals the stack is up.
    pub fn network_name(&self) -> String {
        format!("{}_{}", self.name, NETWORK_SUFFIX)
    }

    pub fn topology_path(&self) -> String {
        self.topology_file.display().to_string()
    }
}

/// Cluster lifecycle errors. Init/start/stop failures are fatal beyond
/// the built-in retry policies.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("stack cannot be initialized; is Docker running / installed? {details}")]
    Init { details: String },

    #[error("failed to start stack '{name}'!\n{details}")]
    Start { name: StackName, details: String },

    #[error("failed to stop stack '{name}'! {hint}")]
    Stop { name: StackName, hint: String },

    #[error("unable to determine stack '{name}' status: {details}")]
    Status { name: StackName, details: String },
}

/// One orchestration backend realizing the stack lifecycle.
///
/// Default methods implement the shared machine; concrete backends supply
/// only the engine commands and one-time init semantics.
#[async_trait]
pub trait StackBackend: Send + Sync {
    fn settings(&self) -> &StackSettings;

    fn runner(&self) -> &SharedRunner;

    /// Idempotent backend reachability check. Fatal on failure.
    async fn init(&self) -> Result<(), StackError>;

    /// Bring the stack up and await network readiness.
    async fn deploy(&self) -> Result<(), StackError>;

    /// Tear the stack down and await network disappearance.
    /// Safe to call when already down.
    async fn undeploy(&self) -> Result<(), StackError>;

    /// Best-effort diagnostic text for failure messages. Never fails.
    async fn troubleshoot(&self) -> Vec<String>;

    /// Probe whether the stack's backing network exists.
    async fn network_available(&self) -> Result<bool, StackError> {
        let settings = self.settings();
        let spec = ExecSpec::docker(["network", "inspect", &settings.network_name()])
            .with_timeout(settings.network_timeout)
            .captured();

        let outcome = self
            .runner()
            .run_quietly(spec)
            .await
            .map_err(|e| StackError::Status {
                name: settings.name.clone(),
                details: e.to_string(),
            })?;

        if outcome.exit_code == 0 {
            Ok(true)
        } else if outcome.stderr.contains("No such network") {
            Ok(false)
        } else {
            Err(StackError::Status {
                name: settings.name.clone(),
                details: outcome.stderr.trim().to_string(),
            })
        }
    }

    /// Whether the stack is up: backend reachable and network present.
    async fn running(&self) -> Result<bool, StackError> {
        self.init().await?;
        self.network_available().await
    }

    /// Undeploy then deploy. Not atomic.
    async fn reset(&self) -> Result<(), StackError> {
        self.undeploy().await?;
        self.deploy().await
    }

    /// Poll network readiness until it matches `expect_available` or the
    /// policy exhausts. Probe errors count as an unmet condition.
    async fn await_network(&self, expect_available: bool, retry: RetryPolicy) -> bool {
        retry
            .poll_until(|| async {
                matches!(self.network_available().await, Ok(a) if a == expect_available)
            })
            .await
            .is_ok()
    }
}

pub(crate) fn troubleshoot_lines(command_hint: &str, ps_output: Option<String>) -> Vec<String> {
    let mut lines = vec!["Consider troubleshooting:".to_string()];
    match ps_output {
        Some(out) => {
            lines.push("* restarting Docker".to_string());
            lines.push(format!("* using output of command: '{command_hint}':\n"));
            lines.push(out);
        }
        None => {
            lines.push(format!("* using command: '{command_hint}'"));
            lines.push("* restarting Docker".to_string());
        }
    }
    lines
}
