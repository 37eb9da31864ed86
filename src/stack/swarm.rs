// ABOUTME: Swarm-style backend - `docker stack` lifecycle on a single-node swarm.
// ABOUTME: Init bootstraps the swarm once, tolerating an already-joined node.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{StackBackend, StackError, StackSettings, troubleshoot_lines};
use crate::process::{ExecSpec, SharedRunner};

pub struct SwarmStack {
    settings: StackSettings,
    runner: SharedRunner,
    initialized: OnceCell<()>,
}

impl SwarmStack {
    pub fn new(settings: StackSettings, runner: SharedRunner) -> Self {
        Self {
            settings,
            runner,
            initialized: OnceCell::new(),
        }
    }

    async fn init_swarm(&self) -> Result<(), StackError> {
        let spec = ExecSpec::docker(["swarm", "init"])
            .with_timeout(self.settings.init_timeout)
            .captured();
        let outcome = self
            .runner
            .run_quietly(spec)
            .await
            .map_err(|e| StackError::Init {
                details: e.to_string(),
            })?;

        // A node that already joined a swarm is fine; anything else is fatal.
        if outcome.exit_code != 0
            && !outcome
                .stderr
                .contains("This node is already part of a swarm")
        {
            return Err(StackError::Init {
                details: format!("error: '{}'", outcome.stderr.trim()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StackBackend for SwarmStack {
    fn settings(&self) -> &StackSettings {
        &self.settings
    }

    fn runner(&self) -> &SharedRunner {
        &self.runner
    }

    async fn init(&self) -> Result<(), StackError> {
        self.initialized
            .get_or_try_init(|| async {
                tracing::info!("initializing stack - Docker Swarm");
                self.init_swarm().await
            })
            .await?;
        Ok(())
    }

    async fn deploy(&self) -> Result<(), StackError> {
        self.init().await?;

        let name = &self.settings.name;
        tracing::info!(stack = %name, "starting stack");

        let deploy = ExecSpec::docker([
            "stack",
            "deploy",
            "-c",
            &self.settings.topology_path(),
            name.as_str(),
            "--resolve-image=always",
        ]);
        self.runner
            .run(deploy)
            .await
            .map_err(|e| StackError::Start {
                name: name.clone(),
                details: e.to_string(),
            })?;

        tracing::info!(stack = %name, "awaiting started stack");
        if !self.await_network(true, self.settings.deploy_retry).await {
            return Err(StackError::Start {
                name: name.clone(),
                details: self.troubleshoot().await.join("\n"),
            });
        }
        Ok(())
    }

    async fn undeploy(&self) -> Result<(), StackError> {
        self.init().await?;

        let name = &self.settings.name;
        tracing::info!(stack = %name, "stopping stack");

        let rm_args = ["stack", "rm", name.as_str()];
        self.runner
            .run(ExecSpec::docker(rm_args))
            .await
            .map_err(|e| StackError::Stop {
                name: name.clone(),
                hint: e.to_string(),
            })?;

        tracing::info!(stack = %name, "awaiting stopped stack");
        if !self.await_network(false, self.settings.undeploy_retry).await {
            return Err(StackError::Stop {
                name: name.clone(),
                hint: format!(
                    "try to stop manually using Docker command: 'docker {}'",
                    rm_args.join(" ")
                ),
            });
        }
        Ok(())
    }

    async fn troubleshoot(&self) -> Vec<String> {
        let hint = format!("docker stack ps {} --no-trunc", self.settings.name.as_str());
        let spec =
            ExecSpec::docker(["stack", "ps", self.settings.name.as_str(), "--no-trunc"]).captured();

        let ps_output = match self.runner.run(spec).await {
            Ok(outcome) => Some(outcome.stdout),
            Err(_) => None,
        };
        troubleshoot_lines(&hint, ps_output)
    }
}
