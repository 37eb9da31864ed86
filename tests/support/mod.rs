// ABOUTME: Shared test support - a scripted fake process runner standing in for Docker.
// ABOUTME: Lets lifecycle tests run without a container engine.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use devstack::process::{ExecSpec, ProcessError, ProcessOutcome, ProcessResult, Runner};

/// How the fake engine reports a container's running state.
#[derive(Debug, Clone, Copy)]
pub enum RunningScript {
    Always(bool),
    /// Report "not running" for N state probes, then "running".
    AfterProbes(u32),
}

#[derive(Default)]
pub struct FakeEngine {
    /// internal container name -> running behavior; absent = not created
    pub containers: HashMap<String, RunningScript>,
    /// lock markers written inside containers, keyed "{internal}:{lock}"
    pub locks: HashSet<String>,
    pub network_available: bool,
    /// after an up/deploy command, failed probes before the network appears
    pub network_probes_until_available: u32,
    /// when set, network inspect fails with this stderr and a weird code
    pub network_probe_error: Option<String>,
    pub swarm_init_exit: i32,
    pub swarm_init_stderr: String,
    pub compose_version_exit: i32,
    /// whether an up/deploy command was issued and readiness is pending
    pending_up: bool,
    /// every command line observed, in order
    pub commands: Vec<String>,
}

pub struct FakeRunner {
    pub engine: Arc<Mutex<FakeEngine>>,
}

impl FakeRunner {
    pub fn new(engine: FakeEngine) -> Arc<Self> {
        Arc::new(Self {
            engine: Arc::new(Mutex::new(engine)),
        })
    }

    pub fn commands(&self) -> Vec<String> {
        self.engine.lock().unwrap().commands.clone()
    }

    pub fn has_lock(&self, internal_name: &str, lock: &str) -> bool {
        self.engine
            .lock()
            .unwrap()
            .locks
            .contains(&format!("{internal_name}:{lock}"))
    }

    fn respond(&self, spec: &ExecSpec) -> ProcessOutcome {
        let mut engine = self.engine.lock().unwrap();
        engine.commands.push(spec.display());

        let args: Vec<&str> = spec.args.iter().map(String::as_str).collect();
        match args.as_slice() {
            ["compose", "version"] => exit(engine.compose_version_exit),
            ["swarm", "init"] => ProcessOutcome {
                exit_code: engine.swarm_init_exit,
                stdout: String::new(),
                stderr: engine.swarm_init_stderr.clone(),
            },
            ["network", "inspect", _name] => {
                if let Some(stderr) = &engine.network_probe_error {
                    return ProcessOutcome {
                        exit_code: 125,
                        stdout: String::new(),
                        stderr: stderr.clone(),
                    };
                }
                if engine.network_available {
                    exit(0)
                } else if engine.pending_up {
                    if engine.network_probes_until_available > 0 {
                        engine.network_probes_until_available -= 1;
                        no_such_network()
                    } else {
                        engine.network_available = true;
                        exit(0)
                    }
                } else {
                    no_such_network()
                }
            }
            ["ps", "-l", "-q", "-f", filter] => {
                let name = filter.strip_prefix("name=").unwrap_or(filter);
                if engine.containers.contains_key(name) {
                    ProcessOutcome {
                        exit_code: 0,
                        stdout: format!("id-{name}\n"),
                        stderr: String::new(),
                    }
                } else {
                    exit(0)
                }
            }
            ["inspect", "-f", "{{.State.Running}}", id] => {
                let name = id.strip_prefix("id-").unwrap_or(id).to_string();
                let running = match engine.containers.get_mut(&name) {
                    Some(RunningScript::Always(value)) => *value,
                    Some(RunningScript::AfterProbes(remaining)) => {
                        if *remaining > 0 {
                            *remaining -= 1;
                            false
                        } else {
                            true
                        }
                    }
                    None => false,
                };
                ProcessOutcome {
                    exit_code: 0,
                    stdout: format!("{running}\n"),
                    stderr: String::new(),
                }
            }
            ["exec", rest @ ..] => Self::respond_exec(&mut engine, rest),
            _ => {
                // stack deploy / compose up / down / rm and the like
                let line = spec.display();
                if line.contains("up -d") || line.contains("stack deploy") {
                    engine.pending_up = true;
                } else if line.contains("down") || line.contains("stack rm") {
                    engine.network_available = false;
                    engine.pending_up = false;
                }
                exit(0)
            }
        }
    }

    fn respond_exec(engine: &mut FakeEngine, rest: &[&str]) -> ProcessOutcome {
        // rest = [options..., id, command...]; tests use no exec options
        let Some(id) = rest.first() else {
            return exit(1);
        };
        let name = id.strip_prefix("id-").unwrap_or(id).to_string();
        let command = rest[1..].join(" ");

        if let Some(lock) = lock_target(&command, "touch") {
            engine.locks.insert(format!("{name}:{lock}"));
            return exit(0);
        }
        if let Some(lock) = lock_target(&command, "test -f") {
            let held = engine.locks.contains(&format!("{name}:{lock}"));
            return exit(if held { 0 } else { 1 });
        }
        exit(0)
    }
}

fn lock_target(command: &str, verb: &str) -> Option<String> {
    let marker = format!("{verb} /var/devstack/lock/");
    command
        .split_once(&marker)
        .map(|(_, lock)| lock.split_whitespace().next().unwrap_or("").to_string())
}

fn exit(code: i32) -> ProcessOutcome {
    ProcessOutcome {
        exit_code: code,
        stdout: String::new(),
        stderr: String::new(),
    }
}

fn no_such_network() -> ProcessOutcome {
    ProcessOutcome {
        exit_code: 1,
        stdout: String::new(),
        stderr: "Error: No such network".to_string(),
    }
}

#[async_trait]
impl Runner for FakeRunner {
    async fn run(&self, spec: ExecSpec) -> ProcessResult<ProcessOutcome> {
        let outcome = self.respond(&spec);
        if !spec.exit_code_accepted(outcome.exit_code) {
            return Err(ProcessError::Failure {
                command: spec.display(),
                code: outcome.exit_code,
                stderr: outcome.stderr,
            });
        }
        Ok(outcome)
    }

    async fn run_quietly(&self, spec: ExecSpec) -> ProcessResult<ProcessOutcome> {
        Ok(self.respond(&spec))
    }
}
