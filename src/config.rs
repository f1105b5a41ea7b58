//! Configuration for the CI driver
//!
//! Values are resolved with precedence: CLI flags > `PARSEC_TOOL` env >
//! config file > built-in defaults. The config file is `--config <path>` when
//! given, otherwise the first `.parsec-ci.toml` found searching upward from
//! the workspace directory.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::environment::CLI_BINARY_VAR;
use crate::error::ConfigError;

/// File name searched for during discovery.
pub const CONFIG_FILE_NAME: &str = ".parsec-ci.toml";

pub const DEFAULT_SERVICE_ENDPOINT: &str = "unix:/tmp/parsec.sock";
pub const DEFAULT_LOG_LEVEL: &str = "error";
pub const DEFAULT_CARGO: &str = "cargo";
pub const DEFAULT_FEATURES: &str = "spiffe-auth";
pub const DEFAULT_CLI_BINARY: &str = "./target/debug/parsec-tool";
pub const DEFAULT_TEST_SUITE: &str = "tests/parsec-cli-tests.sh";

/// Where an effective value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    ConfigFile(PathBuf),
    Env(&'static str),
    Cli,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::ConfigFile(path) => write!(f, "config file {}", path.display()),
            Self::Env(var) => write!(f, "env {var}"),
            Self::Cli => f.write_str("cli"),
        }
    }
}

/// Values coming from the command line that take part in resolution.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub workspace: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    pub service_endpoint: String,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub cargo: String,
    /// Feature list for the second build; `None` skips that build
    pub features: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliToolConfig {
    pub binary: PathBuf,
    pub test_suite: String,
    pub test_suite_args: Vec<String>,
}

/// Effective configuration for one run.
#[derive(Debug, Clone)]
pub struct CiConfig {
    pub environment: EnvironmentConfig,
    pub build: BuildConfig,
    pub cli: CliToolConfig,
    /// Working directory for every child process
    pub workspace: PathBuf,
    /// Config file that was loaded, if any
    pub config_file: Option<PathBuf>,
    pub source_attribution: BTreeMap<&'static str, ConfigSource>,
}

impl Default for CiConfig {
    fn default() -> Self {
        let source_attribution = [
            "environment.service_endpoint",
            "environment.log_level",
            "build.cargo",
            "build.features",
            "cli.binary",
            "cli.test_suite",
            "cli.test_suite_args",
            "workspace",
        ]
        .into_iter()
        .map(|key| (key, ConfigSource::Default))
        .collect();

        Self {
            environment: EnvironmentConfig {
                service_endpoint: DEFAULT_SERVICE_ENDPOINT.to_string(),
                log_level: DEFAULT_LOG_LEVEL.to_string(),
            },
            build: BuildConfig {
                cargo: DEFAULT_CARGO.to_string(),
                features: Some(DEFAULT_FEATURES.to_string()),
            },
            cli: CliToolConfig {
                binary: PathBuf::from(DEFAULT_CLI_BINARY),
                test_suite: DEFAULT_TEST_SUITE.to_string(),
                test_suite_args: vec!["-d".to_string()],
            },
            workspace: PathBuf::from("."),
            config_file: None,
            source_attribution,
        }
    }
}

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    environment: Option<TomlEnvironment>,
    build: Option<TomlBuild>,
    cli: Option<TomlCli>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlEnvironment {
    service_endpoint: Option<String>,
    log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlBuild {
    cargo: Option<String>,
    /// An empty string disables the feature build
    features: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlCli {
    binary: Option<PathBuf>,
    test_suite: Option<String>,
    test_suite_args: Option<Vec<String>>,
}

impl CiConfig {
    /// Resolve configuration from the current directory and process environment.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::InvalidValue {
            key: "workspace".to_string(),
            reason: format!("cannot determine current directory: {e}"),
        })?;
        let cli_binary = std::env::var_os(CLI_BINARY_VAR);
        Self::discover_from(&cwd, cli_args, cli_binary)
    }

    /// Path-driven variant of [`discover`](Self::discover) that touches no
    /// process-global state. `cli_binary_env` is the value of `PARSEC_TOOL`
    /// in the invoking environment; an empty value counts as unset.
    pub fn discover_from(
        start_dir: &Path,
        cli_args: &CliArgs,
        cli_binary_env: Option<OsString>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match &cli_args.workspace {
            Some(workspace) => {
                config.workspace = start_dir.join(workspace);
                config.source_attribution.insert("workspace", ConfigSource::Cli);
            }
            None => config.workspace = start_dir.to_path_buf(),
        }

        let config_path = match &cli_args.config_path {
            Some(explicit) => Some(start_dir.join(explicit)),
            None => discover_config_file_from(&config.workspace),
        };

        if let Some(path) = config_path {
            let file = load_config_file(&path)?;
            config.apply_file(file, &path);
            config.config_file = Some(path);
        }

        if let Some(binary) = cli_binary_env.filter(|value| !value.is_empty()) {
            config.cli.binary = PathBuf::from(binary);
            config
                .source_attribution
                .insert("cli.binary", ConfigSource::Env(CLI_BINARY_VAR));
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: TomlConfig, path: &Path) {
        let source = ConfigSource::ConfigFile(path.to_path_buf());
        let set = |key: &'static str, attribution: &mut BTreeMap<&'static str, ConfigSource>| {
            attribution.insert(key, source.clone());
        };

        if let Some(env) = file.environment {
            if let Some(endpoint) = env.service_endpoint {
                self.environment.service_endpoint = endpoint;
                set("environment.service_endpoint", &mut self.source_attribution);
            }
            if let Some(level) = env.log_level {
                self.environment.log_level = level;
                set("environment.log_level", &mut self.source_attribution);
            }
        }

        if let Some(build) = file.build {
            if let Some(cargo) = build.cargo {
                self.build.cargo = cargo;
                set("build.cargo", &mut self.source_attribution);
            }
            if let Some(features) = build.features {
                self.build.features = (!features.trim().is_empty()).then_some(features);
                set("build.features", &mut self.source_attribution);
            }
        }

        if let Some(cli) = file.cli {
            if let Some(binary) = cli.binary {
                self.cli.binary = binary;
                set("cli.binary", &mut self.source_attribution);
            }
            if let Some(suite) = cli.test_suite {
                self.cli.test_suite = suite;
                set("cli.test_suite", &mut self.source_attribution);
            }
            if let Some(args) = cli.test_suite_args {
                self.cli.test_suite_args = args;
                set("cli.test_suite_args", &mut self.source_attribution);
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            (
                "environment.service_endpoint",
                &self.environment.service_endpoint,
            ),
            ("environment.log_level", &self.environment.log_level),
            ("build.cargo", &self.build.cargo),
            ("cli.test_suite", &self.cli.test_suite),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(empty_value(key));
            }
        }
        if self.cli.binary.as_os_str().is_empty() {
            return Err(empty_value("cli.binary"));
        }

        Ok(())
    }
}

fn empty_value(key: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: "must not be empty".to_string(),
    }
}

/// Search upward from `start_dir` for [`CONFIG_FILE_NAME`].
fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

fn load_config_file(path: &Path) -> Result<TomlConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
