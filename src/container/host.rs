// ABOUTME: Host-side file staging for one container.
// ABOUTME: One directory root per container for files shared into it via volumes.

use std::path::{Path, PathBuf};

use crate::types::ContainerName;

use super::ContainerError;

/// Manages the host filesystem root staged for one container.
#[derive(Debug, Clone)]
pub struct HostFiles {
    container: ContainerName,
    root: PathBuf,
}

impl HostFiles {
    pub(crate) fn new(container: ContainerName, env_root: PathBuf) -> Self {
        let root = env_root.join(container.as_str());
        Self { container, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path relative to this container's staging root.
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Create the staging root itself.
    pub fn ensure_root(&self) -> Result<(), ContainerError> {
        tracing::info!(container = %self.container, dir = %self.root.display(), "ensuring root directory");
        std::fs::create_dir_all(&self.root).map_err(|source| ContainerError::Host {
            name: self.container.clone(),
            source,
        })
    }

    /// Create directories under the staging root.
    pub fn ensure_dir<S: AsRef<Path>>(&self, paths: &[S]) -> Result<(), ContainerError> {
        for path in paths {
            let dir = self.path(path);
            tracing::info!(container = %self.container, dir = %dir.display(), "ensuring directory");
            std::fs::create_dir_all(&dir).map_err(|source| ContainerError::Host {
                name: self.container.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Remove and recreate directories under the staging root.
    pub fn clean_dir<S: AsRef<Path>>(&self, paths: &[S]) -> Result<(), ContainerError> {
        for path in paths {
            let dir = self.path(path);
            tracing::info!(container = %self.container, dir = %dir.display(), "cleaning directory");
            if dir.exists() {
                std::fs::remove_dir_all(&dir).map_err(|source| ContainerError::Host {
                    name: self.container.clone(),
                    source,
                })?;
            }
            std::fs::create_dir_all(&dir).map_err(|source| ContainerError::Host {
                name: self.container.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Stage a file under the root, creating parent directories.
    pub fn write_file(
        &self,
        relative: impl AsRef<Path>,
        contents: &str,
    ) -> Result<PathBuf, ContainerError> {
        let target = self.path(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ContainerError::Host {
                name: self.container.clone(),
                source,
            })?;
        }
        std::fs::write(&target, contents).map_err(|source| ContainerError::Host {
            name: self.container.clone(),
            source,
        })?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(dir: &Path) -> HostFiles {
        HostFiles::new(ContainerName::new("web").unwrap(), dir.to_path_buf())
    }

    #[test]
    fn root_is_namespaced_by_container() {
        let tmp = tempfile::tempdir().unwrap();
        let host = host(tmp.path());
        assert_eq!(host.root(), tmp.path().join("web"));
    }

    #[test]
    fn writes_files_with_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let host = host(tmp.path());
        let path = host.write_file("conf/httpd.conf", "Listen 8080\n").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Listen 8080\n");
    }

    #[test]
    fn clean_dir_empties_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let host = host(tmp.path());
        host.write_file("data/old.txt", "stale").unwrap();
        host.clean_dir(&["data"]).unwrap();
        assert!(host.path("data").exists());
        assert!(!host.path("data/old.txt").exists());
    }
}
