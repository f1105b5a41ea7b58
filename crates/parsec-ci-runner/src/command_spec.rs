use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

// ============================================================================
// CommandSpec - Structured Process Invocation
// ============================================================================

/// Specification for a command to execute.
///
/// Every child process the driver spawns is described by one of these.
/// Arguments are discrete `OsString` elements and are never joined into a
/// shell string, so quoting and metacharacters have no effect.
///
/// Environment overrides are kept in a `BTreeMap` so that rendering a plan
/// (see [`fmt::Display`]) is deterministic.
///
/// # Example
///
/// ```rust
/// use parsec_ci_runner::CommandSpec;
/// use std::ffi::OsString;
///
/// let cmd = CommandSpec::new("cargo")
///     .arg("build")
///     .args(["--features", "spiffe-auth"])
///     .env("RUST_BACKTRACE", "1");
///
/// assert_eq!(cmd.program, OsString::from("cargo"));
/// assert_eq!(cmd.args.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to execute
    pub program: OsString,
    /// Arguments as discrete elements (NOT shell strings)
    pub args: Vec<OsString>,
    /// Optional working directory
    pub cwd: Option<PathBuf>,
    /// Environment overrides applied on top of the inherited environment
    pub env: BTreeMap<OsString, OsString>,
}

impl CommandSpec {
    /// Create a new `CommandSpec` for `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    /// Add a single argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory for the command.
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set a single environment override. A later call with the same key wins.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set multiple environment overrides.
    #[must_use]
    pub fn envs<I, K, V>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        for (key, value) in envs {
            self.env.insert(key.into(), value.into());
        }
        self
    }

    /// Look up an environment override by name.
    #[must_use]
    pub fn env_value(&self, key: &str) -> Option<&OsString> {
        self.env.get(&OsString::from(key))
    }

    /// Whether this command's argv starts with `program` followed by `args`.
    ///
    /// Used by test doubles and log lines to identify a step without
    /// comparing the full environment.
    #[must_use]
    pub fn matches(&self, program: &str, args: &[&str]) -> bool {
        self.program == OsString::from(program)
            && self.args.len() == args.len()
            && self.args.iter().zip(args).all(|(a, b)| a == *b)
    }

    /// Convert into a `std::process::Command` using argv-style APIs only.
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        cmd
    }
}

/// Renders the command line as `KEY=value program arg...` for display only.
///
/// The output is never passed to a shell.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key.to_string_lossy(), value.to_string_lossy())?;
        }
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
