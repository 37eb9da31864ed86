// ABOUTME: Container lifecycle tests against the scripted fake engine.
// ABOUTME: Covers awaiting, one-time-setup locking, and exec gating.

mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use devstack::container::{
    Container, ContainerDefinition, ContainerError, ContainerHooks, ContainerSettings, HookError,
};
use devstack::retry::RetryPolicy;
use devstack::types::{ContainerName, StackName};

use support::{FakeEngine, FakeRunner, RunningScript};

#[derive(Default)]
struct CountingHooks {
    ups: AtomicU32,
    reloads: AtomicU32,
}

#[async_trait]
impl ContainerHooks for CountingHooks {
    async fn up(&self, _container: &Container) -> Result<(), HookError> {
        self.ups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reload(&self, _container: &Container) -> Result<(), HookError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn fast_settings() -> ContainerSettings {
    ContainerSettings {
        running_timeout: Duration::from_secs(1),
        await_retry: RetryPolicy::with_delay(3, Duration::from_millis(1)),
    }
}

fn web_container(
    runner: &Arc<FakeRunner>,
    hooks: Arc<dyn ContainerHooks>,
    locks_up: bool,
) -> Container {
    let definition = ContainerDefinition::new(ContainerName::new("web").unwrap())
        .with_hooks(hooks, locks_up);
    Container::new(
        definition,
        StackName::new("demo").unwrap(),
        runner.clone(),
        std::env::temp_dir(),
        fast_settings(),
    )
}

#[tokio::test]
async fn one_time_setup_runs_only_once() {
    let mut engine = FakeEngine::default();
    engine
        .containers
        .insert("demo_web".to_string(), RunningScript::Always(true));
    let runner = FakeRunner::new(engine);
    let hooks = Arc::new(CountingHooks::default());

    let container = web_container(&runner, hooks.clone(), true);

    container.bring_up().await.unwrap();
    container.bring_up().await.unwrap();

    assert_eq!(hooks.ups.load(Ordering::SeqCst), 1);
    assert!(runner.has_lock("demo_web", "up"));
}

#[tokio::test]
async fn hook_without_lock_runs_every_time() {
    let mut engine = FakeEngine::default();
    engine
        .containers
        .insert("demo_web".to_string(), RunningScript::Always(true));
    let runner = FakeRunner::new(engine);
    let hooks = Arc::new(CountingHooks::default());

    let container = web_container(&runner, hooks.clone(), false);

    container.bring_up().await.unwrap();
    container.bring_up().await.unwrap();

    assert_eq!(hooks.ups.load(Ordering::SeqCst), 2);
    assert!(!runner.has_lock("demo_web", "up"));
}

#[tokio::test]
async fn up_reflects_lock_marker() {
    let mut engine = FakeEngine::default();
    engine
        .containers
        .insert("demo_web".to_string(), RunningScript::Always(true));
    let runner = FakeRunner::new(engine);

    let container = web_container(&runner, Arc::new(CountingHooks::default()), true);

    assert!(!container.up().await.unwrap());
    container.bring_up().await.unwrap();
    assert!(container.up().await.unwrap());
}

#[tokio::test]
async fn bring_up_awaits_a_slow_container() {
    let mut engine = FakeEngine::default();
    engine
        .containers
        .insert("demo_web".to_string(), RunningScript::AfterProbes(2));
    let runner = FakeRunner::new(engine);
    let hooks = Arc::new(CountingHooks::default());

    let container = web_container(&runner, hooks.clone(), false);
    container.bring_up().await.unwrap();

    assert_eq!(hooks.ups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn await_timeout_skips_hooks_and_hints_troubleshooting() {
    let mut engine = FakeEngine::default();
    engine
        .containers
        .insert("demo_web".to_string(), RunningScript::Always(false));
    let runner = FakeRunner::new(engine);
    let hooks = Arc::new(CountingHooks::default());

    let container = web_container(&runner, hooks.clone(), true);
    let err = container.bring_up().await.unwrap_err();

    match err {
        ContainerError::AwaitTimeout { name, details } => {
            assert_eq!(name.as_str(), "web");
            assert!(details.contains("docker stack ps demo --no-trunc"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(hooks.ups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn exec_rejected_when_not_running() {
    let mut engine = FakeEngine::default();
    engine
        .containers
        .insert("demo_web".to_string(), RunningScript::Always(false));
    let runner = FakeRunner::new(engine);

    let container = web_container(&runner, Arc::new(CountingHooks::default()), false);
    let err = container.exec_shell("ls /").await.unwrap_err();

    assert!(matches!(err, ContainerError::NotRunning { .. }));
}

#[tokio::test]
async fn exec_runs_against_resolved_id() {
    let mut engine = FakeEngine::default();
    engine
        .containers
        .insert("demo_web".to_string(), RunningScript::Always(true));
    let runner = FakeRunner::new(engine);

    let container = web_container(&runner, Arc::new(CountingHooks::default()), false);
    container.exec_shell("ls /").await.unwrap();

    let commands = runner.commands();
    assert!(
        commands
            .iter()
            .any(|c| c.contains("exec id-demo_web sh -c ls /")),
        "missing exec command in: {commands:#?}"
    );
}

#[tokio::test]
async fn shell_helpers_compose_expected_commands() {
    let mut engine = FakeEngine::default();
    engine
        .containers
        .insert("demo_web".to_string(), RunningScript::Always(true));
    let runner = FakeRunner::new(engine);

    let container = web_container(&runner, Arc::new(CountingHooks::default()), false);
    container
        .ensure_file(&["/etc/app/app.conf", "/etc/app/extra.conf"])
        .await
        .unwrap();
    container.clean_dir(&["/var/cache/app"]).await.unwrap();

    let commands = runner.commands();
    assert!(commands.iter().any(|c| c.contains("mkdir -p /etc/app")));
    assert!(
        commands
            .iter()
            .any(|c| c.contains("touch /etc/app/app.conf /etc/app/extra.conf"))
    );
    assert!(commands.iter().any(|c| c.contains("rm -fr /var/cache/app/*")));
}
