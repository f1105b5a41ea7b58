use crate::error::RunnerError;

use super::CommandSpec;

// ============================================================================
// ProcessRunner Trait - Process Execution Interface
// ============================================================================

/// Output from a process execution.
///
/// Created when the child exits, relayed to the operator, then dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Standard output from the process
    pub stdout: Vec<u8>,
    /// Standard error from the process
    pub stderr: Vec<u8>,
    /// Exit code from the process (None if terminated by signal)
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    /// Create a new `ProcessOutput` with the given values.
    #[must_use]
    pub fn new(stdout: Vec<u8>, stderr: Vec<u8>, exit_code: Option<i32>) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
        }
    }

    /// A successful exit with the given stdout and nothing on stderr.
    #[must_use]
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self::new(stdout.into(), Vec::new(), Some(0))
    }

    /// An exit with `code` and the given stderr.
    #[must_use]
    pub fn failed(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self::new(Vec::new(), stderr.into(), Some(code))
    }

    /// Get stdout as a UTF-8 string, lossy conversion.
    #[must_use]
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a UTF-8 string, lossy conversion.
    #[must_use]
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Check if the process exited successfully (exit code 0).
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait for process execution.
///
/// Implementations MUST use argv-style APIs only (no shell string evaluation).
/// [`crate::NativeRunner`] is the production implementation; tests substitute
/// scripted runners to drive the pipeline without spawning anything.
///
/// # Example
///
/// ```rust
/// use parsec_ci_runner::{CommandSpec, ProcessOutput, ProcessRunner, RunnerError};
///
/// struct AlwaysOk;
///
/// impl ProcessRunner for AlwaysOk {
///     fn run(&self, _cmd: &CommandSpec) -> Result<ProcessOutput, RunnerError> {
///         Ok(ProcessOutput::ok("fine\n"))
///     }
/// }
///
/// let out = AlwaysOk.run(&CommandSpec::new("cargo").arg("build")).unwrap();
/// assert!(out.success());
/// ```
pub trait ProcessRunner {
    /// Execute `cmd` and block until it exits.
    ///
    /// # Returns
    ///
    /// * `Ok(ProcessOutput)` - The process ran (possibly with non-zero exit code)
    /// * `Err(RunnerError)` - The process could not be spawned or waited on
    fn run(&self, cmd: &CommandSpec) -> Result<ProcessOutput, RunnerError>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, cmd: &CommandSpec) -> Result<ProcessOutput, RunnerError> {
        (**self).run(cmd)
    }
}
