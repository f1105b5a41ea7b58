//! Test doubles for driving the pipeline without spawning processes.

use crate::{CommandSpec, ProcessOutput, ProcessRunner, RunnerError};
use std::cell::RefCell;

/// A [`ProcessRunner`] that answers from a script and records every call.
///
/// Commands without a scripted response succeed with empty output, so a test
/// only scripts the steps it cares about.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: Vec<(String, Vec<String>, ProcessOutput)>,
    unspawnable: Vec<String>,
    calls: RefCell<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the exact argv `program args...` with `output`.
    #[must_use]
    pub fn respond(mut self, program: &str, args: &[&str], output: ProcessOutput) -> Self {
        self.responses.push((
            program.to_string(),
            args.iter().map(|a| (*a).to_string()).collect(),
            output,
        ));
        self
    }

    /// Make any invocation of `program` fail to spawn.
    #[must_use]
    pub fn spawn_fails(mut self, program: &str) -> Self {
        self.unspawnable.push(program.to_string());
        self
    }

    /// Every command run so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    /// Index of the first call matching `program args...`, if any.
    #[must_use]
    pub fn position(&self, program: &str, args: &[&str]) -> Option<usize> {
        self.calls
            .borrow()
            .iter()
            .position(|c| c.matches(program, args))
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<ProcessOutput, RunnerError> {
        self.calls.borrow_mut().push(cmd.clone());

        let program = cmd.program.to_string_lossy();
        if self.unspawnable.iter().any(|p| *p == program) {
            return Err(RunnerError::SpawnFailed {
                program: program.into_owned(),
                reason: "No such file or directory (os error 2)".to_string(),
            });
        }

        let scripted = self.responses.iter().find(|(p, args, _)| {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            cmd.matches(p, &args)
        });

        Ok(scripted
            .map(|(_, _, output)| output.clone())
            .unwrap_or_else(|| ProcessOutput::ok(Vec::<u8>::new())))
    }
}
