// ABOUTME: The collection of managed containers with dependent/independent processing.
// ABOUTME: Falls back to names discovered from the topology file's services map.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;

use crate::process::SharedRunner;
use crate::types::{ContainerName, StackName};

use super::{Container, ContainerDefinition, ContainerError, ContainerSettings};

/// Manager-level configuration consumed from the environment config.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    /// Dependent mode processes containers sequentially in declaration
    /// order; independent mode processes them concurrently.
    pub dependent: bool,
    pub container: ContainerSettings,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            dependent: true,
            container: ContainerSettings::default(),
        }
    }
}

pub struct ContainerManager {
    containers: Vec<Arc<Container>>,
    dependent: bool,
}

impl ContainerManager {
    /// Build the manager from declared definitions; when none are declared,
    /// discover container names from the topology file.
    pub fn new(
        definitions: Vec<ContainerDefinition>,
        topology_file: &Path,
        stack_name: &StackName,
        runner: SharedRunner,
        host_root: impl Into<PathBuf>,
        settings: ManagerSettings,
    ) -> Result<Self, ContainerError> {
        let definitions = if definitions.is_empty() {
            discover_names(topology_file)?
                .into_iter()
                .map(ContainerDefinition::new)
                .collect()
        } else {
            definitions
        };

        let host_root = host_root.into();
        let containers = definitions
            .into_iter()
            .map(|definition| {
                Arc::new(Container::new(
                    definition,
                    stack_name.clone(),
                    Arc::clone(&runner),
                    host_root.clone(),
                    settings.container,
                ))
            })
            .collect();

        Ok(Self {
            containers,
            dependent: settings.dependent,
        })
    }

    pub fn all(&self) -> &[Arc<Container>] {
        &self.containers
    }

    pub fn names(&self) -> String {
        if self.containers.is_empty() {
            "none".to_string()
        } else {
            self.containers
                .iter()
                .map(|c| c.name().as_str())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    pub fn named(&self, name: &ContainerName) -> Result<&Arc<Container>, ContainerError> {
        self.containers
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| ContainerError::Undefined(name.clone()))
    }

    /// Containers declaring at least one watched directory.
    pub fn watched(&self) -> Vec<Arc<Container>> {
        self.containers
            .iter()
            .filter(|c| !c.watch_dirs().is_empty())
            .cloned()
            .collect()
    }

    /// All containers report running.
    pub async fn running(&self) -> Result<bool, ContainerError> {
        for container in &self.containers {
            if !container.running().await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// All containers report up (running and configured).
    pub async fn up(&self) -> Result<bool, ContainerError> {
        for container in &self.containers {
            if !container.up().await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub async fn resolve(&self) -> Result<(), ContainerError> {
        tracing::info!(containers = %self.names(), "resolving container(s)");
        self.each(|c| async move { c.resolve().await }).await
    }

    pub async fn bring_up(&self) -> Result<(), ContainerError> {
        tracing::info!(containers = %self.names(), "configuring container(s)");
        self.each(|c| async move { c.bring_up().await }).await
    }

    pub async fn reload(&self) -> Result<(), ContainerError> {
        tracing::info!(containers = %self.names(), "reloading container(s)");
        self.each(|c| async move { c.reload().await }).await
    }

    /// Run an operation over members: strictly in declaration order in
    /// dependent mode, concurrently in independent mode.
    async fn each<F, Fut>(&self, operation: F) -> Result<(), ContainerError>
    where
        F: Fn(Arc<Container>) -> Fut,
        Fut: Future<Output = Result<(), ContainerError>>,
    {
        if self.dependent {
            for container in &self.containers {
                operation(Arc::clone(container)).await?;
            }
            Ok(())
        } else {
            let results = join_all(
                self.containers
                    .iter()
                    .map(|container| operation(Arc::clone(container))),
            )
            .await;
            results.into_iter().collect()
        }
    }
}

/// Read container names from the topology file's top-level `services` map.
fn discover_names(topology_file: &Path) -> Result<Vec<ContainerName>, ContainerError> {
    let content =
        std::fs::read_to_string(topology_file).map_err(|e| ContainerError::Topology {
            path: topology_file.to_path_buf(),
            details: e.to_string(),
        })?;

    let document: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| ContainerError::Topology {
            path: topology_file.to_path_buf(),
            details: e.to_string(),
        })?;

    let services = document
        .get("services")
        .and_then(|v| v.as_mapping())
        .ok_or_else(|| ContainerError::Topology {
            path: topology_file.to_path_buf(),
            details: "missing top-level 'services' map".to_string(),
        })?;

    services
        .keys()
        .map(|key| {
            let name = key.as_str().ok_or_else(|| ContainerError::Topology {
                path: topology_file.to_path_buf(),
                details: format!("non-string service key: {key:?}"),
            })?;
            ContainerName::new(name).map_err(|e| ContainerError::Topology {
                path: topology_file.to_path_buf(),
                details: format!("invalid service name '{name}': {e}"),
            })
        })
        .collect()
}
