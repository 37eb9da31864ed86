// ABOUTME: Compose-style backend - `docker compose` project lifecycle.
// ABOUTME: Init is a lightweight version probe; no daemon-side bootstrap needed.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{StackBackend, StackError, StackSettings, troubleshoot_lines};
use crate::process::{ExecSpec, SharedRunner};

pub struct ComposeStack {
    settings: StackSettings,
    runner: SharedRunner,
    initialized: OnceCell<()>,
}

impl ComposeStack {
    pub fn new(settings: StackSettings, runner: SharedRunner) -> Self {
        Self {
            settings,
            runner,
            initialized: OnceCell::new(),
        }
    }

    async fn probe_version(&self) -> Result<(), StackError> {
        let spec = ExecSpec::docker(["compose", "version"])
            .with_timeout(self.settings.init_timeout)
            .captured();
        let outcome = self
            .runner
            .run_quietly(spec)
            .await
            .map_err(|e| StackError::Init {
                details: e.to_string(),
            })?;
        if outcome.exit_code != 0 {
            return Err(StackError::Init {
                details: format!("error: '{}'", outcome.stderr.trim()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StackBackend for ComposeStack {
    fn settings(&self) -> &StackSettings {
        &self.settings
    }

    fn runner(&self) -> &SharedRunner {
        &self.runner
    }

    async fn init(&self) -> Result<(), StackError> {
        self.initialized
            .get_or_try_init(|| async {
                tracing::info!("initializing stack - Docker Compose");
                self.probe_version().await
            })
            .await?;
        Ok(())
    }

    async fn deploy(&self) -> Result<(), StackError> {
        self.init().await?;

        let name = &self.settings.name;
        tracing::info!(stack = %name, "starting stack");

        let up = ExecSpec::docker([
            "compose",
            "-p",
            name.as_str(),
            "-f",
            &self.settings.topology_path(),
            "up",
            "-d",
        ]);
        self.runner.run(up).await.map_err(|e| StackError::Start {
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

        let down_args = [
            "compose",
            "-p",
            name.as_str(),
            "-f",
            &self.settings.topology_path(),
            "down",
        ];
        self.runner
            .run(ExecSpec::docker(down_args))
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
                    down_args.join(" ")
                ),
            });
        }
        Ok(())
    }

    async fn troubleshoot(&self) -> Vec<String> {
        let hint = format!(
            "docker compose -p {} ps --no-trunc",
            self.settings.name.as_str()
        );
        let spec = ExecSpec::docker([
            "compose",
            "-p",
            self.settings.name.as_str(),
            "ps",
            "--no-trunc",
        ])
        .captured();

        let ps_output = match self.runner.run(spec).await {
            Ok(outcome) => Some(outcome.stdout),
            Err(_) => None,
        };
        troubleshoot_lines(&hint, ps_output)
    }
}
