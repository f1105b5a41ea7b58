//! Tests that run the parsec-ci binary itself.
//!
//! The unix-only scenarios build a throwaway workspace with a fake `cargo`,
//! a fake `parsec-tool`, and a fake functional suite, all of which append
//! their invocation to `calls.log` so the tests can check order and
//! environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn parsec_ci_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_parsec-ci"))
}

/// Command for the binary with a clean, predictable environment.
fn parsec_ci(work_dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(parsec_ci_bin());
    cmd.current_dir(work_dir)
        .args(args)
        .env_remove("PARSEC_TOOL")
        .env_remove("PARSEC_CI_LOG")
        .env_remove("PARSEC_SERVICE_ENDPOINT");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_succeeds_without_running_anything() {
    let temp = TempDir::new().unwrap();
    let output = parsec_ci(temp.path(), &["--help"]).output().unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).contains("--dry-run"));
}

#[test]
fn unknown_flag_exits_with_cli_args_code() {
    let temp = TempDir::new().unwrap();
    let output = parsec_ci(temp.path(), &["--features", "spiffe-auth"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--features"));
}

#[test]
fn dry_run_prints_plan() {
    let temp = TempDir::new().unwrap();
    let output = parsec_ci(temp.path(), &["--dry-run"]).output().unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let plan = stdout(&output);
    assert!(plan.contains("[build]"));
    assert!(plan.contains("RUST_BACKTRACE=1 RUST_LOG=error cargo build --features spiffe-auth"));
    assert!(plan.contains("cargo clippy --all-targets -- -D clippy::all -D clippy::cargo"));
    assert!(plan.contains("./target/debug/parsec-tool --help"));
    assert!(plan.contains("tests/parsec-cli-tests.sh -d"));
}

#[test]
fn dry_run_honours_parsec_tool_env() {
    let temp = TempDir::new().unwrap();
    let output = parsec_ci(temp.path(), &["--dry-run"])
        .env("PARSEC_TOOL", "/usr/bin/parsec-tool")
        .output()
        .unwrap();

    assert!(output.status.success());
    let plan = stdout(&output);
    assert!(plan.contains("/usr/bin/parsec-tool --help"));
    assert!(plan.contains("PARSEC_TOOL=/usr/bin/parsec-tool"));
}

#[test]
fn empty_parsec_tool_env_falls_back_to_default() {
    let temp = TempDir::new().unwrap();
    let output = parsec_ci(temp.path(), &["--dry-run"])
        .env("PARSEC_TOOL", "")
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("./target/debug/parsec-tool --help"));
}

#[test]
fn dry_run_skip_static_checks() {
    let temp = TempDir::new().unwrap();
    let output = parsec_ci(temp.path(), &["--dry-run", "--skip-static-checks"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let plan = stdout(&output);
    assert!(plan.contains("[static-analysis]\n  (no steps)\n"));
    assert!(!plan.contains("clippy"));
}

#[test]
fn malformed_config_exits_with_cli_args_code() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".parsec-ci.toml"), "[build\ncargo = ").unwrap();

    let output = parsec_ci(temp.path(), &["--dry-run"]).output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("failed to parse config file"));
}

#[cfg(unix)]
mod fake_workspace {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    const CLIPPY_CALL: &str =
        "cargo clippy --all-targets -- -D clippy::all -D clippy::cargo";

    /// Fake tools plus a config pointing the driver at the fake cargo.
    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let ws = Self { dir };
            fs::create_dir_all(ws.path().join("target/debug")).unwrap();
            fs::create_dir_all(ws.path().join("tests")).unwrap();

            ws.script(
                "fake-cargo",
                r#"echo "cargo $* | $PARSEC_SERVICE_ENDPOINT | $RUST_LOG | ${RUST_BACKTRACE:-}" >> calls.log
if [ "$1 $2" = "fmt -h" ] && [ -e no-rustfmt ]; then exit 1; fi
if [ "$1 $2" = "clippy -h" ] && [ -e no-clippy ]; then exit 1; fi
echo "cargo $1 ok""#,
            );
            ws.script(
                "target/debug/parsec-tool",
                r#"echo "parsec-tool $* | $PARSEC_SERVICE_ENDPOINT" >> calls.log
if [ -e broken-cli ]; then echo "panicked" >&2; exit 101; fi
echo "parsec-tool usage""#,
            );
            ws.script(
                "tests/parsec-cli-tests.sh",
                r#"echo "suite $* | $PARSEC_TOOL | $RUST_LOG" >> calls.log
echo "- Test ping"
if [ -e suite-status ]; then exit "$(cat suite-status)"; fi"#,
            );

            let cargo = ws.path().join("fake-cargo");
            fs::write(
                ws.path().join(".parsec-ci.toml"),
                format!("[build]\ncargo = \"{}\"\n", cargo.display()),
            )
            .unwrap();
            ws
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        fn script(&self, rel: &str, body: &str) {
            let path = self.path().join(rel);
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }

        fn touch(&self, rel: &str, content: &str) {
            fs::write(self.path().join(rel), content).unwrap();
        }

        fn run(&self) -> Output {
            parsec_ci(self.path(), &[]).output().unwrap()
        }

        fn calls(&self) -> Vec<String> {
            fs::read_to_string(self.path().join("calls.log"))
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect()
        }

        fn commands(&self) -> Vec<String> {
            self.calls()
                .iter()
                .map(|line| line.split(" | ").next().unwrap().to_string())
                .collect()
        }
    }

    #[test]
    fn full_run_succeeds_in_order() {
        let ws = Workspace::new();
        let output = ws.run();

        assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
        assert_eq!(
            ws.commands(),
            vec![
                "cargo build",
                "cargo build --features spiffe-auth",
                "cargo fmt -h",
                "cargo fmt --all -- --check",
                "cargo clippy -h",
                CLIPPY_CALL,
                "parsec-tool --help",
                "suite -d",
            ]
        );
        assert_eq!(
            stdout(&output),
            "cargo build ok\ncargo build ok\ncargo fmt ok\ncargo clippy ok\nparsec-tool usage\n- Test ping\n"
        );
    }

    #[test]
    fn environment_reaches_every_child() {
        let ws = Workspace::new();
        assert!(ws.run().status.success());

        let calls = ws.calls();
        assert_eq!(
            calls[0],
            "cargo build | unix:/tmp/parsec.sock | error | 1"
        );
        for line in &calls {
            assert!(line.contains("unix:/tmp/parsec.sock"), "{line}");
        }
        assert_eq!(
            calls.last().unwrap(),
            "suite -d | ./target/debug/parsec-tool | error"
        );
    }

    #[test]
    fn missing_analyzers_are_skipped() {
        let ws = Workspace::new();
        ws.touch("no-rustfmt", "");
        ws.touch("no-clippy", "");

        let output = ws.run();

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert_eq!(
            ws.commands(),
            vec![
                "cargo build",
                "cargo build --features spiffe-auth",
                "cargo fmt -h",
                "cargo clippy -h",
                "parsec-tool --help",
                "suite -d",
            ]
        );
    }

    #[test]
    fn broken_cli_stops_before_suite() {
        let ws = Workspace::new();
        ws.touch("broken-cli", "");

        let output = ws.run();

        assert_eq!(output.status.code(), Some(101));
        assert!(stderr(&output).contains("panicked"));
        assert!(stderr(&output).contains("cli-smoke phase failed"));
        assert!(!ws.commands().iter().any(|c| c.starts_with("suite")));
    }

    #[test]
    fn suite_exit_status_is_propagated() {
        let ws = Workspace::new();
        ws.touch("suite-status", "7");

        let output = ws.run();

        assert_eq!(output.status.code(), Some(7));
        assert!(stdout(&output).ends_with("- Test ping\n"));
        assert_eq!(ws.commands().last().unwrap(), "suite -d");
    }
}
