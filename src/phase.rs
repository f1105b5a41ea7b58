//! Phase definitions and the fixed CI plan
//!
//! A run is four phases executed strictly in order:
//!
//! Build → StaticAnalysis → CliSmoke → FunctionalSuite
//!
//! Each phase holds one or more [`Step`]s. The plan is rebuilt from the
//! configuration on every call to [`plan`]; no argument list is shared
//! between runs.

use parsec_ci_runner::CommandSpec;
use std::ffi::OsString;
use std::fmt;

use crate::config::CiConfig;
use crate::environment::{BACKTRACE_VAR, CLI_BINARY_VAR, CiEnvironment};
use crate::probe::Probe;

/// Identifier for each phase of the run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PhaseId {
    Build,
    StaticAnalysis,
    CliSmoke,
    FunctionalSuite,
}

impl PhaseId {
    pub const ALL: [PhaseId; 4] = [
        PhaseId::Build,
        PhaseId::StaticAnalysis,
        PhaseId::CliSmoke,
        PhaseId::FunctionalSuite,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::StaticAnalysis => "static-analysis",
            Self::CliSmoke => "cli-smoke",
            Self::FunctionalSuite => "functional-suite",
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One external command invocation inside a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Stable name used in logs and errors
    pub name: String,
    pub command: CommandSpec,
    /// When present, the step only runs if the probe reports the tool available
    pub probe: Option<Probe>,
    /// A failing required step aborts the run; a failing optional one is logged
    pub required: bool,
}

impl Step {
    #[must_use]
    pub fn required(name: impl Into<String>, command: CommandSpec) -> Self {
        Self {
            name: name.into(),
            command,
            probe: None,
            required: true,
        }
    }

    #[must_use]
    pub fn with_probe(mut self, probe: Probe) -> Self {
        self.probe = Some(probe);
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    pub id: PhaseId,
    pub steps: Vec<Step>,
}

/// Knobs that change which steps are planned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOptions {
    /// Plan the static-analysis phase with no steps
    pub skip_static_checks: bool,
}

/// Build the ordered phase list for a run.
#[must_use]
pub fn plan(config: &CiConfig, env: &CiEnvironment, options: PlanOptions) -> Vec<Phase> {
    let static_steps = if options.skip_static_checks {
        Vec::new()
    } else {
        static_analysis_steps(config, env)
    };

    vec![
        Phase {
            id: PhaseId::Build,
            steps: build_steps(config, env),
        },
        Phase {
            id: PhaseId::StaticAnalysis,
            steps: static_steps,
        },
        Phase {
            id: PhaseId::CliSmoke,
            steps: vec![Step::required(
                "cli-help",
                command(config, env, &config.cli.binary).arg("--help"),
            )],
        },
        Phase {
            id: PhaseId::FunctionalSuite,
            steps: vec![Step::required(
                "functional-suite",
                command(config, env, &config.cli.test_suite)
                    .args(&config.cli.test_suite_args)
                    .env(CLI_BINARY_VAR, &config.cli.binary),
            )],
        },
    ]
}

fn command(config: &CiConfig, env: &CiEnvironment, program: impl Into<OsString>) -> CommandSpec {
    env.apply(CommandSpec::new(program).cwd(&config.workspace))
}

fn build_steps(config: &CiConfig, env: &CiEnvironment) -> Vec<Step> {
    let cargo = &config.build.cargo;
    let mut steps = vec![Step::required(
        "build",
        command(config, env, cargo)
            .arg("build")
            .env(BACKTRACE_VAR, "1"),
    )];

    if let Some(features) = &config.build.features {
        steps.push(Step::required(
            format!("build-{}", features.replace([',', ' '], "-")),
            command(config, env, cargo)
                .args(["build", "--features", features.as_str()])
                .env(BACKTRACE_VAR, "1"),
        ));
    }

    steps
}

fn static_analysis_steps(config: &CiConfig, env: &CiEnvironment) -> Vec<Step> {
    let cargo = &config.build.cargo;
    vec![
        Step::required(
            "format",
            command(config, env, cargo).args(["fmt", "--all", "--", "--check"]),
        )
        .with_probe(Probe::new(
            "rustfmt",
            command(config, env, cargo).args(["fmt", "-h"]),
        )),
        Step::required(
            "lint",
            command(config, env, cargo).args([
                "clippy",
                "--all-targets",
                "--",
                "-D",
                "clippy::all",
                "-D",
                "clippy::cargo",
            ]),
        )
        .with_probe(Probe::new(
            "clippy",
            command(config, env, cargo).args(["clippy", "-h"]),
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{LOG_LEVEL_VAR, SERVICE_ENDPOINT_VAR};

    fn default_plan(options: PlanOptions) -> Vec<Phase> {
        let config = CiConfig::default();
        let env = CiEnvironment::from_config(&config);
        plan(&config, &env, options)
    }

    #[test]
    fn test_phases_in_fixed_order() {
        let ids: Vec<PhaseId> = default_plan(PlanOptions::default())
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, PhaseId::ALL.to_vec());
    }

    #[test]
    fn test_command_surface() {
        let phases = default_plan(PlanOptions::default());
        let steps: Vec<&Step> = phases.iter().flat_map(|p| &p.steps).collect();

        assert_eq!(steps.len(), 6);
        assert!(steps[0].command.matches("cargo", &["build"]));
        assert!(
            steps[1]
                .command
                .matches("cargo", &["build", "--features", "spiffe-auth"])
        );
        assert!(
            steps[2]
                .command
                .matches("cargo", &["fmt", "--all", "--", "--check"])
        );
        assert!(steps[3].command.matches(
            "cargo",
            &[
                "clippy",
                "--all-targets",
                "--",
                "-D",
                "clippy::all",
                "-D",
                "clippy::cargo"
            ]
        ));
        assert!(
            steps[4]
                .command
                .matches("./target/debug/parsec-tool", &["--help"])
        );
        assert!(
            steps[5]
                .command
                .matches("tests/parsec-cli-tests.sh", &["-d"])
        );
    }

    #[test]
    fn test_only_analyzers_are_probed() {
        let phases = default_plan(PlanOptions::default());
        for phase in &phases {
            for step in &phase.steps {
                assert!(step.required);
                assert_eq!(
                    step.probe.is_some(),
                    phase.id == PhaseId::StaticAnalysis,
                    "unexpected probe setting on {}",
                    step.name
                );
            }
        }

        let probes: Vec<&Probe> = phases[1]
            .steps
            .iter()
            .filter_map(|s| s.probe.as_ref())
            .collect();
        assert!(probes[0].command.matches("cargo", &["fmt", "-h"]));
        assert!(probes[1].command.matches("cargo", &["clippy", "-h"]));
    }

    #[test]
    fn test_backtraces_only_on_build_steps() {
        for phase in default_plan(PlanOptions::default()) {
            for step in phase.steps {
                let expected = (phase.id == PhaseId::Build).then(|| OsString::from("1"));
                assert_eq!(step.command.env_value(BACKTRACE_VAR).cloned(), expected);
            }
        }
    }

    #[test]
    fn test_every_command_carries_environment() {
        for phase in default_plan(PlanOptions::default()) {
            for step in &phase.steps {
                let cmds = std::iter::once(&step.command)
                    .chain(step.probe.as_ref().map(|p| &p.command));
                for cmd in cmds {
                    assert_eq!(
                        cmd.env_value(SERVICE_ENDPOINT_VAR),
                        Some(&OsString::from("unix:/tmp/parsec.sock"))
                    );
                    assert_eq!(cmd.env_value(LOG_LEVEL_VAR), Some(&OsString::from("error")));
                }
            }
        }
    }

    #[test]
    fn test_functional_suite_receives_cli_binary() {
        let phases = default_plan(PlanOptions::default());
        let suite = &phases[3].steps[0];
        assert_eq!(
            suite.command.env_value(CLI_BINARY_VAR),
            Some(&OsString::from("./target/debug/parsec-tool"))
        );
    }

    #[test]
    fn test_skip_static_checks_keeps_phase_without_steps() {
        let phases = default_plan(PlanOptions {
            skip_static_checks: true,
        });
        assert_eq!(phases.len(), 4);
        assert_eq!(phases[1].id, PhaseId::StaticAnalysis);
        assert!(phases[1].steps.is_empty());
    }

    #[test]
    fn test_no_features_means_single_build() {
        let mut config = CiConfig::default();
        config.build.features = None;
        let env = CiEnvironment::from_config(&config);
        let phases = plan(&config, &env, PlanOptions::default());
        assert_eq!(phases[0].steps.len(), 1);
    }

    #[test]
    fn test_plans_are_independent() {
        let mut first = default_plan(PlanOptions::default());
        first[0].steps[0].command.args.push(OsString::from("--release"));

        let second = default_plan(PlanOptions::default());
        assert!(second[0].steps[0].command.matches("cargo", &["build"]));
    }

    #[test]
    fn test_phase_id_display() {
        assert_eq!(PhaseId::StaticAnalysis.to_string(), "static-analysis");
        assert!(PhaseId::Build < PhaseId::FunctionalSuite);
    }
}
