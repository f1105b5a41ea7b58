use crate::error::RunnerError;
use std::process::Stdio;

use super::{CommandSpec, ProcessOutput, ProcessRunner};

// ============================================================================
// NativeRunner - Native Process Execution
// ============================================================================

/// Native process runner using `std::process::Command`.
///
/// Stdin is closed, stdout and stderr are captured, and the calling thread
/// blocks until the child exits. No shell is involved.
///
/// # Example
///
/// ```rust,no_run
/// use parsec_ci_runner::{CommandSpec, NativeRunner, ProcessRunner};
///
/// let output = NativeRunner::new()
///     .run(&CommandSpec::new("cargo").arg("--version"))
///     .unwrap();
/// assert!(output.success());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRunner;

impl NativeRunner {
    /// Create a new `NativeRunner`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ProcessRunner for NativeRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<ProcessOutput, RunnerError> {
        let program = cmd.program.to_string_lossy().into_owned();

        let mut command = cmd.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = command.spawn().map_err(|e| RunnerError::SpawnFailed {
            program: program.clone(),
            reason: e.to_string(),
        })?;

        let output = child
            .wait_with_output()
            .map_err(|e| RunnerError::WaitFailed {
                program,
                reason: e.to_string(),
            })?;

        Ok(ProcessOutput::new(
            output.stdout,
            output.stderr,
            output.status.code(),
        ))
    }
}
