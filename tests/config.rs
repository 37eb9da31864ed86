// ABOUTME: Configuration parsing tests: defaults, discovery, template init.
// ABOUTME: Exercises the derived settings accessors as well.

use std::time::Duration;

use devstack::config::{self, CONFIG_FILENAME, EnvConfig};
use devstack::error::Error;
use devstack::stack::Backend;

#[test]
fn minimal_config_applies_defaults() {
    let config = EnvConfig::from_yaml("stack: demo\n").unwrap();

    assert_eq!(config.stack.as_str(), "demo");
    assert_eq!(config.backend, Backend::Compose);
    assert_eq!(config.topology.to_str().unwrap(), "docker-compose.yml");
    assert_eq!(config.root_dir.to_str().unwrap(), ".devstack");
    assert!(config.dependent);
    assert!(config.containers.is_empty());
    assert!(config.checks.is_empty());
    assert_eq!(config.deploy_retries, 30);
    assert_eq!(config.health_retries, 10);
    assert!(config.up_check.is_none());
}

#[test]
fn full_config_parses() {
    let yaml = r#"
stack: myproject
backend: swarm
topology: stack.yml
root_dir: .myproject
dependent: false
containers:
  - name: web
    watch_dirs: [src, conf]
  - name: db
checks:
  - name: web-root
    url: http://localhost:8080/
    status: 204
    contains: ok
    connection_timeout: 5s
    connection_retries: true
stack_init_timeout: 1m
deploy_retries: 10
container_await_retries: 20
up_check: 3s
"#;
    let config = EnvConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.backend, Backend::Swarm);
    assert!(!config.dependent);
    assert_eq!(config.containers.len(), 2);
    assert_eq!(config.containers[0].name.as_str(), "web");
    assert_eq!(config.containers[0].watch_dirs.len(), 2);
    assert_eq!(config.checks.len(), 1);
    assert_eq!(config.checks[0].status, 204);
    assert_eq!(config.checks[0].connection_timeout, Duration::from_secs(5));
    assert_eq!(config.stack_init_timeout, Duration::from_secs(60));
    assert_eq!(config.up_check, Some(Duration::from_secs(3)));
}

#[test]
fn invalid_stack_name_is_rejected() {
    assert!(EnvConfig::from_yaml("stack: Bad Name\n").is_err());
    assert!(EnvConfig::from_yaml("stack: -edge\n").is_err());
}

#[test]
fn stack_settings_reflect_overrides() {
    let config = EnvConfig::from_yaml("stack: demo\nnetwork_timeout: 2s\n").unwrap();
    let settings = config.stack_settings();

    assert_eq!(settings.network_timeout, Duration::from_secs(2));
    assert_eq!(settings.network_name(), "demo_devstack-net");
}

#[test]
fn manager_settings_reflect_dependent_flag() {
    let config = EnvConfig::from_yaml("stack: demo\ndependent: false\n").unwrap();
    assert!(!config.manager_settings().dependent);
}

#[test]
fn container_definitions_carry_watch_dirs() {
    let yaml = "stack: demo\ncontainers:\n  - name: app\n    watch_dirs: [src]\n";
    let config = EnvConfig::from_yaml(yaml).unwrap();

    let definitions = config.container_definitions();
    assert_eq!(definitions.len(), 1);
    assert_eq!(definitions[0].name.as_str(), "app");
    assert_eq!(definitions[0].watch_dirs.len(), 1);
}

#[test]
fn discover_finds_candidate_filenames() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join(".devstack")).unwrap();
    std::fs::write(dir.path().join(".devstack/config.yml"), "stack: nested\n").unwrap();

    let config = EnvConfig::discover(dir.path()).unwrap();
    assert_eq!(config.stack.as_str(), "nested");

    // the root-level file wins over the nested one
    std::fs::write(dir.path().join(CONFIG_FILENAME), "stack: toplevel\n").unwrap();
    let config = EnvConfig::discover(dir.path()).unwrap();
    assert_eq!(config.stack.as_str(), "toplevel");
}

#[test]
fn discover_fails_without_any_config() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        EnvConfig::discover(dir.path()),
        Err(Error::ConfigNotFound(_))
    ));
}

#[test]
fn init_writes_a_loadable_template() {
    let dir = tempfile::tempdir().unwrap();

    config::init_config(dir.path(), Some("demo"), false).unwrap();
    let config = EnvConfig::discover(dir.path()).unwrap();
    assert_eq!(config.stack.as_str(), "demo");

    assert!(matches!(
        config::init_config(dir.path(), Some("demo"), false),
        Err(Error::AlreadyExists(_))
    ));
    config::init_config(dir.path(), Some("other"), true).unwrap();
    let config = EnvConfig::discover(dir.path()).unwrap();
    assert_eq!(config.stack.as_str(), "other");
}
