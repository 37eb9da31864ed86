// ABOUTME: The interactive dev loop: watch host dirs, reload affected containers, recheck health.
// ABOUTME: Two workers joined by unbounded queues; bursts are drained and coalesced.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::container::{Container, ContainerManager};
use crate::health::HealthChecker;
use crate::retry::RetryPolicy;
use crate::types::ContainerName;

/// A single observed host file change, attributed to one container.
#[derive(Debug, Clone)]
pub struct FileChangeEvent {
    pub container: ContainerName,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Token requesting a health re-verification pass; bursts coalesce.
#[derive(Debug, Clone, Copy)]
pub struct RecheckToken;

#[derive(Debug, Error)]
pub enum ReloaderError {
    #[error("cannot watch directory for container '{container}': {details}")]
    Watch {
        container: ContainerName,
        details: String,
    },
}

pub struct Reloader {
    watched: Vec<Arc<Container>>,
    checker: Arc<HealthChecker>,
    recheck_retry: RetryPolicy,
}

impl Reloader {
    pub fn new(manager: &ContainerManager, checker: Arc<HealthChecker>) -> Self {
        Self {
            watched: manager.watched(),
            checker,
            recheck_retry: RetryPolicy::after_squared_secs(3),
        }
    }

    pub fn with_recheck_retry(mut self, retry: RetryPolicy) -> Self {
        self.recheck_retry = retry;
        self
    }

    /// At least one container declares a watched directory.
    pub fn configured(&self) -> bool {
        !self.watched.is_empty()
    }

    /// Run the dev loop until the process exits.
    ///
    /// A no-op with a warning when no container watches any directory.
    pub async fn start(&self) -> Result<(), ReloaderError> {
        if !self.configured() {
            tracing::warn!("no container watches any directory, reloader not started");
            return Ok(());
        }

        let (changes_tx, changes_rx) = unbounded_channel::<FileChangeEvent>();
        let (rechecks_tx, rechecks_rx) = unbounded_channel::<RecheckToken>();

        // Watchers stay alive for the whole loop lifetime.
        let _watchers = self.start_watchers(&changes_tx)?;

        let reload_loop = {
            let watched = self.watched.clone();
            let rechecks_tx = rechecks_tx.clone();
            async move {
                let mut changes_rx = changes_rx;
                while run_reload_pass(&watched, &mut changes_rx, &rechecks_tx).await {}
            }
        };

        let recheck_loop = {
            let checker = Arc::clone(&self.checker);
            let retry = self.recheck_retry;
            async move {
                let mut rechecks_rx = rechecks_rx;
                while run_recheck_pass(&checker, retry, &mut rechecks_rx).await {}
            }
        };

        tokio::join!(reload_loop, recheck_loop);
        Ok(())
    }

    fn start_watchers(
        &self,
        changes: &UnboundedSender<FileChangeEvent>,
    ) -> Result<Vec<notify::RecommendedWatcher>, ReloaderError> {
        let mut watchers = Vec::with_capacity(self.watched.len());

        for container in &self.watched {
            let name = container.name().clone();
            let tx = changes.clone();

            let callback_name = name.clone();
            let mut watcher =
                notify::recommended_watcher(move |result: Result<Event, notify::Error>| {
                    let Ok(event) = result else { return };
                    if !relevant(&event.kind) {
                        return;
                    }
                    for path in &event.paths {
                        let _ = tx.send(FileChangeEvent {
                            container: callback_name.clone(),
                            description: format!("{} ({:?})", path.display(), event.kind),
                            timestamp: Utc::now(),
                        });
                    }
                })
                .map_err(|e| ReloaderError::Watch {
                    container: name.clone(),
                    details: e.to_string(),
                })?;

            for dir in container.watch_dirs() {
                watcher
                    .watch(dir, RecursiveMode::Recursive)
                    .map_err(|e| ReloaderError::Watch {
                        container: name.clone(),
                        details: e.to_string(),
                    })?;
            }

            tracing::info!(
                container = %name,
                dirs = ?container.watch_dirs(),
                "watching for container file changes"
            );
            watchers.push(watcher);
        }

        Ok(watchers)
    }
}

fn relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Block for at least one item, then drain everything currently queued.
/// Returns `None` when the channel closed.
pub async fn receive_available<T>(rx: &mut UnboundedReceiver<T>) -> Option<Vec<T>> {
    let first = rx.recv().await?;
    let mut items = vec![first];
    while let Ok(next) = rx.try_recv() {
        items.push(next);
    }
    Some(items)
}

/// One iteration of the reload worker: drain a burst of change events,
/// reload each affected container once, then request a single recheck.
/// Returns `false` when the change queue closed.
pub async fn run_reload_pass(
    containers: &[Arc<Container>],
    changes: &mut UnboundedReceiver<FileChangeEvent>,
    rechecks: &UnboundedSender<RecheckToken>,
) -> bool {
    let Some(events) = receive_available(changes).await else {
        return false;
    };

    let mut grouped: HashMap<ContainerName, Vec<FileChangeEvent>> = HashMap::new();
    for event in events {
        grouped.entry(event.container.clone()).or_default().push(event);
    }

    for (name, batch) in grouped {
        let Some(container) = containers.iter().find(|c| c.name() == &name) else {
            continue;
        };

        let changes_text = batch
            .iter()
            .map(|e| e.description.clone())
            .collect::<Vec<_>>()
            .join("\n");
        tracing::info!(container = %name, "reloading container due to file changes:\n{changes_text}");

        // A broken container must not stop watching the rest.
        if let Err(e) = container.reload().await {
            tracing::error!(container = %name, "cannot reload container properly: {e}");
        }
    }

    let _ = rechecks.send(RecheckToken);
    true
}

/// One iteration of the recheck worker: coalesce queued tokens into a
/// single soft health pass. Returns `false` when the token queue closed.
pub async fn run_recheck_pass(
    checker: &HealthChecker,
    retry: RetryPolicy,
    rechecks: &mut UnboundedReceiver<RecheckToken>,
) -> bool {
    if receive_available(rechecks).await.is_none() {
        return false;
    }
    // Soft pass: failures are logged by the checker, never raised.
    let _ = checker.check_with(false, retry).await;
    true
}
