// ABOUTME: A single managed container: identity, state queries, exec, one-time-setup locking.
// ABOUTME: Engine access goes through the process boundary; hooks supply per-container behavior.

mod exec;
mod hooks;
mod host;
mod manager;

pub use exec::ContainerExecSpec;
pub use hooks::{ContainerHooks, HookError, NoHooks};
pub use host::HostFiles;
pub use manager::{ContainerManager, ManagerSettings};

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::process::{ExecSpec, ProcessOutcome, SharedRunner};
use crate::retry::RetryPolicy;
use crate::types::{ContainerName, StackName};

/// Directory inside the container holding lock marker files.
pub const LOCK_ROOT: &str = "/var/devstack/lock";

/// Lock name guarding the one-time up hook.
pub const LOCK_UP: &str = "up";

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("cannot exec command '{command}' since container '{name}' is not running")]
    NotRunning { name: ContainerName, command: String },

    #[error("failed to await container '{name}'!\n{details}")]
    AwaitTimeout { name: ContainerName, details: String },

    #[error("failed to load container ID for name '{internal_name}': {details}")]
    Id {
        internal_name: String,
        details: String,
    },

    #[error("failed to check container '{name}' state: {details}")]
    State { name: ContainerName, details: String },

    #[error("failed to perform operation \"{operation}\" on container '{name}': {details}")]
    Exec {
        name: ContainerName,
        operation: String,
        details: String,
    },

    #[error("host file operation failed for container '{name}': {source}")]
    Host {
        name: ContainerName,
        source: std::io::Error,
    },

    #[error("container named '{0}' is not defined")]
    Undefined(ContainerName),

    #[error("cannot read topology file '{path}': {details}")]
    Topology { path: PathBuf, details: String },

    #[error("hook '{hook}' failed for container '{name}': {details}")]
    Hook {
        name: ContainerName,
        hook: String,
        details: String,
    },
}

/// Per-container tunables consumed from configuration.
#[derive(Debug, Clone, Copy)]
pub struct ContainerSettings {
    pub running_timeout: Duration,
    pub await_retry: RetryPolicy,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            running_timeout: Duration::from_secs(10),
            await_retry: RetryPolicy::after_secs(60),
        }
    }
}

/// Configuration-time description of a container; immutable once built.
pub struct ContainerDefinition {
    pub name: ContainerName,
    pub watch_dirs: Vec<PathBuf>,
    hooks: Arc<dyn ContainerHooks>,
    locks_up: bool,
}

impl ContainerDefinition {
    pub fn new(name: ContainerName) -> Self {
        Self {
            name,
            watch_dirs: Vec::new(),
            hooks: Arc::new(NoHooks),
            locks_up: false,
        }
    }

    /// Attach lifecycle hooks. When the hooks carry a one-time up action,
    /// pass `locks_up = true` so the lock marker protocol applies.
    pub fn with_hooks(mut self, hooks: Arc<dyn ContainerHooks>, locks_up: bool) -> Self {
        self.hooks = hooks;
        self.locks_up = locks_up;
        self
    }

    /// Watch a host directory; any change under it triggers a reload.
    pub fn watch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.watch_dirs.push(dir.into());
        self
    }
}

pub struct Container {
    name: ContainerName,
    internal_name: String,
    stack_name: StackName,
    runner: SharedRunner,
    hooks: Arc<dyn ContainerHooks>,
    host: HostFiles,
    watch_dirs: Vec<PathBuf>,
    lock_required: BTreeSet<&'static str>,
    settings: ContainerSettings,
}

impl Container {
    pub fn new(
        definition: ContainerDefinition,
        stack_name: StackName,
        runner: SharedRunner,
        host_root: impl Into<PathBuf>,
        settings: ContainerSettings,
    ) -> Self {
        let internal_name = format!("{}_{}", stack_name, definition.name);
        let host = HostFiles::new(definition.name.clone(), host_root.into());
        let mut lock_required = BTreeSet::new();
        if definition.locks_up {
            lock_required.insert(LOCK_UP);
        }
        Self {
            name: definition.name,
            internal_name,
            stack_name,
            runner,
            hooks: definition.hooks,
            host,
            watch_dirs: definition.watch_dirs,
            lock_required,
            settings,
        }
    }

    pub fn name(&self) -> &ContainerName {
        &self.name
    }

    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    pub fn host(&self) -> &HostFiles {
        &self.host
    }

    pub fn watch_dirs(&self) -> &[PathBuf] {
        &self.watch_dirs
    }

    /// Engine ID of the container, or `None` when not created.
    pub async fn id(&self) -> Result<Option<String>, ContainerError> {
        tracing::debug!(container = %self.internal_name, "determining container ID");
        let filter = format!("name={}", self.internal_name);
        let spec = ExecSpec::docker(["ps", "-l", "-q", "-f", &filter])
            .with_timeout(self.settings.running_timeout)
            .captured();

        let outcome = self.runner.run(spec).await.map_err(|e| ContainerError::Id {
            internal_name: self.internal_name.clone(),
            details: e.to_string(),
        })?;

        let id = outcome.stdout_trimmed();
        Ok(if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        })
    }

    /// Whether the engine reports the container as running.
    pub async fn running(&self) -> Result<bool, ContainerError> {
        let Some(id) = self.id().await? else {
            return Ok(false);
        };

        tracing::debug!(container = %self.name, "checking running state");
        let spec = ExecSpec::docker(["inspect", "-f", "{{.State.Running}}", &id])
            .with_timeout(self.settings.running_timeout)
            .captured();

        let outcome = self
            .runner
            .run(spec)
            .await
            .map_err(|e| ContainerError::State {
                name: self.name.clone(),
                details: e.to_string(),
            })?;

        Ok(outcome.stdout_trimmed() == "true")
    }

    /// Running and one-time setup completed (lock marker present).
    pub async fn up(&self) -> Result<bool, ContainerError> {
        Ok(self.running().await? && self.locked(LOCK_UP).await?)
    }

    /// Poll until the container runs, or fail with diagnostics.
    /// Intermediate probe errors count as "not yet running".
    pub async fn await_running(&self) -> Result<(), ContainerError> {
        tracing::info!(container = %self.name, "awaiting container");
        let result = self
            .settings
            .await_retry
            .poll_until(|| async { matches!(self.running().await, Ok(true)) })
            .await;

        if result.is_err() {
            let details = [
                "Consider troubleshooting:".to_string(),
                format!(
                    "* using command: 'docker stack ps {} --no-trunc'",
                    self.stack_name
                ),
                "* restarting Docker".to_string(),
            ]
            .join("\n");
            return Err(ContainerError::AwaitTimeout {
                name: self.name.clone(),
                details,
            });
        }
        Ok(())
    }

    /// Await the container, run the one-time up hook, persist the lock marker.
    ///
    /// For a lock-requiring hook, a persisted marker short-circuits to
    /// "already up" and the hook does not run again.
    pub async fn bring_up(&self) -> Result<(), ContainerError> {
        self.await_running().await?;

        if self.lock_required(LOCK_UP) && self.marker_present(LOCK_UP).await? {
            tracing::info!(container = %self.name, "already up, skipping one-time setup");
            return Ok(());
        }

        self.hooks
            .up(self)
            .await
            .map_err(|e| ContainerError::Hook {
                name: self.name.clone(),
                hook: "up".to_string(),
                details: e.to_string(),
            })?;
        self.lock(LOCK_UP).await?;
        Ok(())
    }

    /// Run the reload hook unconditionally.
    pub async fn reload(&self) -> Result<(), ContainerError> {
        self.hooks
            .reload(self)
            .await
            .map_err(|e| ContainerError::Hook {
                name: self.name.clone(),
                hook: "reload".to_string(),
                details: e.to_string(),
            })
    }

    /// Run the pre-deploy host-side preparation hook.
    pub async fn resolve(&self) -> Result<(), ContainerError> {
        self.hooks
            .resolve(&self.host)
            .await
            .map_err(|e| ContainerError::Hook {
                name: self.name.clone(),
                hook: "resolve".to_string(),
                details: e.to_string(),
            })
    }

    /// Execute a command inside the running container.
    pub async fn exec(&self, spec: ContainerExecSpec) -> Result<ProcessOutcome, ContainerError> {
        let operation = spec.operation_label();

        if !self.running().await? {
            return Err(ContainerError::NotRunning {
                name: self.name.clone(),
                command: spec.command_display(),
            });
        }

        let id = self.id().await?.ok_or_else(|| ContainerError::NotRunning {
            name: self.name.clone(),
            command: spec.command_display(),
        })?;

        let process_spec = spec.to_process_spec(&id);
        tracing::info!(container = %self.name, command = %process_spec.display(), "executing in container");

        self.runner
            .run(process_spec)
            .await
            .map_err(|e| ContainerError::Exec {
                name: self.name.clone(),
                operation,
                details: e.to_string(),
            })
    }

    /// Execute a shell command inside the container.
    pub async fn exec_shell(&self, command: &str) -> Result<ProcessOutcome, ContainerError> {
        self.exec(ContainerExecSpec::shell(command)).await
    }

    async fn exec_shell_quiet(&self, command: &str) -> Result<ProcessOutcome, ContainerError> {
        self.exec(ContainerExecSpec::shell(command).accepting_any_exit_code())
            .await
    }

    /// Create files (and their parent directories) inside the container.
    pub async fn ensure_file<S: AsRef<str>>(&self, paths: &[S]) -> Result<(), ContainerError> {
        if paths.is_empty() {
            tracing::info!(container = %self.name, "no files to ensure");
            return Ok(());
        }
        let dirs: BTreeSet<String> = paths
            .iter()
            .filter_map(|p| p.as_ref().rsplit_once('/').map(|(dir, _)| dir.to_string()))
            .collect();
        let dirs: Vec<String> = dirs.into_iter().collect();
        self.ensure_dir(&dirs).await?;

        let joined = paths
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!(container = %self.name, count = paths.len(), "ensuring file(s)");
        self.exec_shell(&format!("touch {joined}")).await?;
        Ok(())
    }

    /// Create directories inside the container.
    pub async fn ensure_dir<S: AsRef<str>>(&self, paths: &[S]) -> Result<(), ContainerError> {
        if paths.is_empty() {
            tracing::info!(container = %self.name, "no directories to ensure");
            return Ok(());
        }
        let joined = paths
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!(container = %self.name, count = paths.len(), "ensuring directory(ies)");
        self.exec_shell(&format!("mkdir -p {joined}")).await?;
        Ok(())
    }

    /// Remove the contents of directories inside the container.
    pub async fn clean_dir<S: AsRef<str>>(&self, paths: &[S]) -> Result<(), ContainerError> {
        if paths.is_empty() {
            return Ok(());
        }
        let joined = paths
            .iter()
            .map(|p| format!("{}/*", p.as_ref()))
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!(container = %self.name, count = paths.len(), "cleaning directory(ies)");
        self.exec_shell(&format!("rm -fr {joined}")).await?;
        Ok(())
    }

    fn lock_required(&self, lock: &str) -> bool {
        self.lock_required.contains(lock)
    }

    /// Write the lock marker, but only when the lock is required.
    async fn lock(&self, lock: &'static str) -> Result<(), ContainerError> {
        if self.lock_required(lock) {
            self.exec_shell_quiet(&format!("mkdir -p {LOCK_ROOT} && touch {LOCK_ROOT}/{lock}"))
                .await?;
        }
        Ok(())
    }

    /// A lock that is not required counts as held.
    async fn locked(&self, lock: &str) -> Result<bool, ContainerError> {
        Ok(!self.lock_required(lock) || self.marker_present(lock).await?)
    }

    async fn marker_present(&self, lock: &str) -> Result<bool, ContainerError> {
        let outcome = self
            .exec_shell_quiet(&format!("test -f {LOCK_ROOT}/{lock}"))
            .await?;
        Ok(outcome.exit_code == 0)
    }
}
