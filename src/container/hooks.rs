// ABOUTME: Late-bound per-container lifecycle behavior.
// ABOUTME: A trait with no-op defaults instead of an inheritance hierarchy.

use async_trait::async_trait;

use super::{Container, HostFiles};

/// Error type for user-supplied hook bodies.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Lifecycle hooks attached to one container definition.
///
/// `resolve` prepares host-side files before deployment; `up` performs
/// one-time in-container setup after start; `reload` reconfigures the
/// container after watched files change.
#[async_trait]
pub trait ContainerHooks: Send + Sync {
    async fn resolve(&self, host: &HostFiles) -> Result<(), HookError> {
        let _ = host;
        Ok(())
    }

    async fn up(&self, container: &Container) -> Result<(), HookError> {
        let _ = container;
        Ok(())
    }

    async fn reload(&self, container: &Container) -> Result<(), HookError> {
        let _ = container;
        Ok(())
    }
}

/// Default hooks doing nothing; used for auto-discovered containers.
pub struct NoHooks;

#[async_trait]
impl ContainerHooks for NoHooks {}
