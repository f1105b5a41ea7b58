//! Environment configuration shared by every child process
//!
//! The entries are fixed before the first command is spawned and never
//! change afterwards. Instead of mutating the driver's own process
//! environment, each [`CommandSpec`] receives them as explicit overrides, so
//! every child (including the very first build) observes the same values.

use parsec_ci_runner::CommandSpec;
use std::collections::BTreeMap;

use crate::config::CiConfig;

/// Service endpoint variable read by the Parsec client libraries.
pub const SERVICE_ENDPOINT_VAR: &str = "PARSEC_SERVICE_ENDPOINT";

/// Log filter variable read by the tools under test.
pub const LOG_LEVEL_VAR: &str = "RUST_LOG";

/// Backtrace switch set on build steps only.
pub const BACKTRACE_VAR: &str = "RUST_BACKTRACE";

/// Path of the CLI binary, consumed by the functional suite.
pub const CLI_BINARY_VAR: &str = "PARSEC_TOOL";

/// Write-once map of environment entries applied to every child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiEnvironment {
    entries: BTreeMap<String, String>,
}

impl CiEnvironment {
    #[must_use]
    pub fn from_config(config: &CiConfig) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            SERVICE_ENDPOINT_VAR.to_string(),
            config.environment.service_endpoint.clone(),
        );
        entries.insert(
            LOG_LEVEL_VAR.to_string(),
            config.environment.log_level.clone(),
        );
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Attach every entry to `cmd` as an environment override.
    #[must_use]
    pub fn apply(&self, cmd: CommandSpec) -> CommandSpec {
        cmd.envs(self.iter())
    }
}
