// ABOUTME: Configuration types and parsing for devstack.yml.
// ABOUTME: Plain named scalars with defaults; hooks are attached programmatically.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::container::{ContainerDefinition, ContainerSettings, ManagerSettings};
use crate::error::{Error, Result};
use crate::health::HttpCheck;
use crate::retry::RetryPolicy;
use crate::stack::{Backend, StackSettings};
use crate::types::{ContainerName, StackName};

pub const CONFIG_FILENAME: &str = "devstack.yml";
pub const CONFIG_FILENAME_ALT: &str = "devstack.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".devstack/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct EnvConfig {
    #[serde(deserialize_with = "deserialize_stack_name")]
    pub stack: StackName,

    #[serde(default)]
    pub backend: Backend,

    #[serde(default = "default_topology")]
    pub topology: PathBuf,

    /// Host directory holding per-container staged files and work state.
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Sequential container processing in declaration order.
    #[serde(default = "default_true")]
    pub dependent: bool,

    #[serde(default)]
    pub containers: Vec<ContainerEntry>,

    #[serde(default)]
    pub checks: Vec<CheckEntry>,

    #[serde(default = "default_init_timeout", with = "humantime_serde")]
    pub stack_init_timeout: Duration,

    #[serde(default = "default_network_timeout", with = "humantime_serde")]
    pub network_timeout: Duration,

    #[serde(default = "default_stack_retries")]
    pub deploy_retries: u32,

    #[serde(default = "default_stack_retries")]
    pub undeploy_retries: u32,

    #[serde(default = "default_running_timeout", with = "humantime_serde")]
    pub container_running_timeout: Duration,

    #[serde(default = "default_await_retries")]
    pub container_await_retries: u32,

    #[serde(default = "default_health_retries")]
    pub health_retries: u32,

    #[serde(default = "default_recheck_retries")]
    pub recheck_retries: u32,

    /// Optional grace delay after up; the environment is re-verified once
    /// it elapses, catching containers restarted right after their hooks.
    #[serde(default, with = "humantime_serde")]
    pub up_check: Option<Duration>,
}

/// A declared container: name plus watched host directories.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerEntry {
    #[serde(deserialize_with = "deserialize_container_name")]
    pub name: ContainerName,

    #[serde(default)]
    pub watch_dirs: Vec<PathBuf>,
}

/// A declared HTTP health check.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckEntry {
    pub name: String,
    pub url: String,

    #[serde(default = "default_status")]
    pub status: u16,

    #[serde(default)]
    pub contains: Option<String>,

    #[serde(default = "default_connection_timeout", with = "humantime_serde")]
    pub connection_timeout: Duration,

    #[serde(default)]
    pub connection_retries: bool,
}

fn default_topology() -> PathBuf {
    PathBuf::from("docker-compose.yml")
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(".devstack")
}

fn default_true() -> bool {
    true
}

fn default_init_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_network_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_stack_retries() -> u32 {
    30
}

fn default_running_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_await_retries() -> u32 {
    60
}

fn default_health_retries() -> u32 {
    10
}

fn default_recheck_retries() -> u32 {
    3
}

fn default_status() -> u16 {
    200
}

fn default_connection_timeout() -> Duration {
    Duration::from_secs(3)
}

impl EnvConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    pub fn stack_settings(&self) -> StackSettings {
        let mut settings = StackSettings::new(self.stack.clone(), self.topology.clone());
        settings.init_timeout = self.stack_init_timeout;
        settings.network_timeout = self.network_timeout;
        settings.deploy_retry = RetryPolicy::after_secs(self.deploy_retries);
        settings.undeploy_retry = RetryPolicy::after_secs(self.undeploy_retries);
        settings
    }

    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            dependent: self.dependent,
            container: ContainerSettings {
                running_timeout: self.container_running_timeout,
                await_retry: RetryPolicy::after_secs(self.container_await_retries),
            },
        }
    }

    pub fn health_retry(&self) -> RetryPolicy {
        RetryPolicy::after_squared_secs(self.health_retries)
    }

    pub fn recheck_retry(&self) -> RetryPolicy {
        RetryPolicy::after_squared_secs(self.recheck_retries)
    }

    /// Container definitions from declared entries (no hooks attached).
    pub fn container_definitions(&self) -> Vec<ContainerDefinition> {
        self.containers
            .iter()
            .map(|entry| {
                let mut definition = ContainerDefinition::new(entry.name.clone());
                for dir in &entry.watch_dirs {
                    definition = definition.watch_dir(dir);
                }
                definition
            })
            .collect()
    }

    /// HTTP checks from declared entries.
    pub fn http_checks(&self) -> Vec<(String, HttpCheck)> {
        self.checks
            .iter()
            .map(|entry| {
                let mut check = HttpCheck::new(&entry.url)
                    .responds_with(entry.status)
                    .with_connection_timeout(entry.connection_timeout)
                    .with_connection_retries(entry.connection_retries);
                if let Some(text) = &entry.contains {
                    check = check.contains_text(text);
                }
                (entry.name.clone(), check)
            })
            .collect()
    }
}

/// Write a starter devstack.yml into the given directory.
pub fn init_config(dir: &Path, stack: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let stack = match stack {
        Some(s) => StackName::new(s).map_err(|e| Error::InvalidConfig(e.to_string()))?,
        None => StackName::new("devstack").expect("default stack name is valid"),
    };

    let yaml = format!(
        r#"stack: {stack}
backend: compose
topology: docker-compose.yml
containers: []
checks: []
"#
    );
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn deserialize_stack_name<'de, D>(deserializer: D) -> std::result::Result<StackName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    StackName::new(&s).map_err(serde::de::Error::custom)
}

fn deserialize_container_name<'de, D>(
    deserializer: D,
) -> std::result::Result<ContainerName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ContainerName::new(&s).map_err(serde::de::Error::custom)
}
