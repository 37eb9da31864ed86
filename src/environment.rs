// ABOUTME: The environment facade composing stack, containers, health checks, and the dev loop.
// ABOUTME: Public operations: resolve, up, down, restart, destroy, check, reload, dev.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::EnvConfig;
use crate::container::{ContainerDefinition, ContainerManager};
use crate::error::{Error, Result};
use crate::health::{HealthChecker, HealthStatus};
use crate::process::SharedRunner;
use crate::reloader::Reloader;
use crate::retry::RetryPolicy;
use crate::stack::{Backend, ComposeStack, StackBackend, SwarmStack};

pub struct Environment {
    root_dir: PathBuf,
    up_check: Option<Duration>,
    recheck_retry: RetryPolicy,
    stack: Box<dyn StackBackend>,
    containers: ContainerManager,
    checker: Arc<HealthChecker>,
}

impl Environment {
    /// Compose the environment from configuration.
    ///
    /// `definitions` carry programmatically attached hooks; when empty, the
    /// config's declared containers are used, and when those are empty too,
    /// names are discovered from the topology file.
    pub fn new(
        config: &EnvConfig,
        mut definitions: Vec<ContainerDefinition>,
        runner: SharedRunner,
    ) -> Result<Self> {
        let settings = config.stack_settings();
        let stack: Box<dyn StackBackend> = match config.backend {
            Backend::Compose => Box::new(ComposeStack::new(settings, Arc::clone(&runner))),
            Backend::Swarm => Box::new(SwarmStack::new(settings, Arc::clone(&runner))),
        };

        if definitions.is_empty() {
            definitions = config.container_definitions();
        }

        let containers = ContainerManager::new(
            definitions,
            &config.topology,
            &config.stack,
            runner,
            config.root_dir.clone(),
            config.manager_settings(),
        )?;

        let mut checker = HealthChecker::new().with_retry(config.health_retry());
        for (name, check) in config.http_checks() {
            checker.http(name, check);
        }

        Ok(Self {
            root_dir: config.root_dir.clone(),
            up_check: config.up_check,
            recheck_retry: config.recheck_retry(),
            stack,
            containers,
            checker: Arc::new(checker),
        })
    }

    pub fn containers(&self) -> &ContainerManager {
        &self.containers
    }

    /// Register additional programmatic health checks before first use.
    pub fn checker_mut(&mut self) -> Option<&mut HealthChecker> {
        Arc::get_mut(&mut self.checker)
    }

    /// Stack reachable and all containers running.
    pub async fn running(&self) -> Result<bool> {
        Ok(self.stack.running().await? && self.containers.running().await?)
    }

    /// Stack reachable and all containers up (running and configured).
    pub async fn is_up(&self) -> Result<bool> {
        Ok(self.stack.running().await? && self.containers.up().await?)
    }

    /// Prepare host-side files for every container.
    pub async fn resolve(&self) -> Result<()> {
        self.containers.resolve().await?;
        Ok(())
    }

    /// Bring the whole environment up; idempotent.
    pub async fn up(&self) -> Result<()> {
        if self.is_up().await? {
            tracing::info!("environment is already running");
            return Ok(());
        }

        tracing::info!("turning environment on");
        self.containers.resolve().await?;
        self.stack.reset().await?;
        self.containers.bring_up().await?;
        self.verify_stable().await?;
        tracing::info!("turned environment on");
        Ok(())
    }

    /// Tear the environment down; safe to call when already down.
    pub async fn down(&self) -> Result<()> {
        if !self.running().await? {
            tracing::info!("environment is not yet running");
            return Ok(());
        }

        tracing::info!("turning environment off");
        self.stack.undeploy().await?;
        tracing::info!("turned environment off");
        Ok(())
    }

    pub async fn restart(&self) -> Result<()> {
        self.down().await?;
        self.up().await
    }

    /// Remove the environment's host state entirely.
    pub async fn destroy(&self) -> Result<()> {
        tracing::info!(root = %self.root_dir.display(), "destroying environment");
        if self.root_dir.exists() {
            tokio::fs::remove_dir_all(&self.root_dir).await?;
        }
        tracing::info!("destroyed environment");
        Ok(())
    }

    /// Evaluate health checks; a hard gate when verbose, soft otherwise.
    pub async fn check(&self, verbose: bool) -> Result<Vec<HealthStatus>> {
        if !self.is_up().await? {
            return Err(Error::NotUp { operation: "check" });
        }
        Ok(self.checker.check(verbose).await?)
    }

    /// Reload every container's configuration.
    pub async fn reload(&self) -> Result<()> {
        if !self.is_up().await? {
            return Err(Error::NotUp {
                operation: "reload",
            });
        }

        tracing::info!("reloading environment");
        self.containers.reload().await?;
        tracing::info!("reloaded environment");
        Ok(())
    }

    /// Prepare host files, then run the development loop until the process
    /// exits.
    pub async fn dev(&self) -> Result<()> {
        self.resolve().await?;
        let reloader = Reloader::new(&self.containers, Arc::clone(&self.checker))
            .with_recheck_retry(self.recheck_retry);
        reloader.start().await?;
        Ok(())
    }

    /// Optional post-up grace check: catches containers restarted by the
    /// engine right after their entrypoints exited non-zero.
    async fn verify_stable(&self) -> Result<()> {
        let Some(delay) = self.up_check else {
            return Ok(());
        };
        if delay.is_zero() {
            return Ok(());
        }

        tracing::info!(delay = ?delay, "delaying after initial up");
        tokio::time::sleep(delay).await;

        if !self.is_up().await? {
            let details = self.stack.troubleshoot().await.join("\n");
            return Err(Error::Unstable { details });
        }
        Ok(())
    }
}
