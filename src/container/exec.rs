// ABOUTME: Specification of a command executed inside a container via `docker exec`.
// ABOUTME: Carries an operation label for error messages and an exit-code expectation.

use crate::process::ExecSpec;

/// A scoped exec operation against one container.
#[derive(Debug, Clone)]
pub struct ContainerExecSpec {
    /// argv executed inside the container.
    pub command: Vec<String>,
    /// Extra `docker exec` options, e.g. `-u`, `-w`.
    pub options: Vec<String>,
    /// Human label used in progress and error messages.
    pub operation: Option<String>,
    /// Accepted exit codes; empty accepts any.
    pub exit_codes: Vec<i32>,
    pub input: Option<Vec<u8>>,
}

impl ContainerExecSpec {
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            options: Vec::new(),
            operation: None,
            exit_codes: vec![0],
            input: None,
        }
    }

    /// Run a command through `sh -c`.
    pub fn shell(command: &str) -> Self {
        Self::new(["sh", "-c", command])
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }

    pub fn expecting_exit_code(mut self, code: i32) -> Self {
        self.exit_codes = vec![code];
        self
    }

    pub fn accepting_any_exit_code(mut self) -> Self {
        self.exit_codes.clear();
        self
    }

    pub fn with_input(mut self, input: Vec<u8>) -> Self {
        self.input = Some(input);
        self
    }

    pub fn command_display(&self) -> String {
        self.command.join(" ")
    }

    pub fn operation_label(&self) -> String {
        self.operation
            .clone()
            .unwrap_or_else(|| format!("exec: {}", self.command_display()))
    }

    /// Lower to a `docker exec` process spec targeting the given container ID.
    pub fn to_process_spec(&self, container_id: &str) -> ExecSpec {
        let mut args = vec!["exec".to_string()];
        args.extend(self.options.iter().cloned());
        args.push(container_id.to_string());
        args.extend(self.command.iter().cloned());

        let mut spec = ExecSpec::docker(args)
            .captured()
            .expecting_exit_codes(self.exit_codes.iter().copied());
        if let Some(input) = &self.input {
            spec = spec.with_input(input.clone());
        }
        spec
    }
}
