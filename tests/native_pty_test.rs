//! End-to-end runs against a real `/bin/sh` in a pseudo-terminal

#![cfg(unix)]

mod common;

use common::project_dir;
use ptyrun::config::{Config, EnvPolicy, Quoting, SessionSettings, ShellSpec};
use ptyrun::session::SessionRunner;
use ptyrun::{SessionError, TaskRequest, Termination};
use std::time::{Duration, Instant};

const LIMIT: Duration = Duration::from_secs(30);

/// `/bin/sh` for the host, `sh -c <instructions>` as the command
fn sh_config() -> Config {
    let mut config = Config {
        session: SessionSettings {
            kill_grace_ms: 2_000,
            startup_delay_ms: 200,
            ..SessionSettings::without_timeouts()
        },
        env: EnvPolicy::isolated(),
        ..Config::default()
    };
    config
        .env
        .set
        .insert("PATH".to_string(), "/usr/bin:/bin".to_string());
    config.shell.insert(
        std::env::consts::OS,
        ShellSpec::new("/bin/sh", &[], Quoting::Posix),
    );
    config.command.program = "sh".to_string();
    config.command.context = "-c".to_string();
    config
}

#[tokio::test]
async fn test_sentinel_printed_by_command() {
    let dir = project_dir();
    let runner = SessionRunner::new(sh_config()).unwrap();

    // The echoed command line never contains the sentinel itself
    let instructions = "printf '%s%s\\n' Comp 'lete!'";
    let outcome = tokio::time::timeout(
        LIMIT,
        runner.run(&TaskRequest::new(instructions, dir.path()), None),
    )
    .await
    .expect("session hung")
    .unwrap();

    assert!(!outcome.command_line.contains("Complete!"));
    assert_eq!(outcome.termination, Termination::Sentinel);
    assert!(outcome.output.contains("Complete!"));
}

#[tokio::test]
async fn test_exit_observed_while_descendant_holds_terminal() {
    let dir = project_dir();
    let mut config = sh_config();
    config.session.kill_grace_ms = 1_000;
    let runner = SessionRunner::new(config).unwrap();

    // The inner shell and its sleep ignore SIGHUP and keep the terminal open
    let instructions = "trap '' HUP; sleep 1; printf '%s%s\\n' Comp 'lete!'; sleep 15";
    let started = Instant::now();
    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        runner.run(&TaskRequest::new(instructions, dir.path()), None),
    )
    .await
    .expect("session hung")
    .unwrap();

    assert_eq!(outcome.termination, Termination::Sentinel);
    assert!(outcome.output.contains("Complete!"));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_shell_exits_on_its_own() {
    let dir = project_dir();
    let mut config = sh_config();
    config.command.exit_after = true;
    let runner = SessionRunner::new(config).unwrap();

    let outcome = tokio::time::timeout(
        LIMIT,
        runner.run(&TaskRequest::new("printf %s hello", dir.path()), None),
    )
    .await
    .expect("session hung")
    .unwrap();

    assert_eq!(outcome.termination, Termination::Exited);
    assert_eq!(outcome.exit_code, Some(0));
    assert!(outcome.output.contains("hello"));
}

#[tokio::test]
async fn test_missing_shell_fails_to_spawn() {
    let dir = project_dir();
    let mut config = sh_config();
    config.shell.insert(
        std::env::consts::OS,
        ShellSpec::new("/nonexistent/ptyrun-shell", &[], Quoting::Posix),
    );
    let runner = SessionRunner::new(config).unwrap();

    let err = runner
        .run(&TaskRequest::new("x", dir.path()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Spawn { .. }));
}

#[tokio::test]
async fn test_concurrent_sessions_are_independent() {
    let first_dir = project_dir();
    let second_dir = project_dir();
    let mut config = sh_config();
    config.command.exit_after = true;
    let runner = SessionRunner::new(config).unwrap();

    let first = TaskRequest::new("echo alpha", first_dir.path());
    let second = TaskRequest::new("echo bravo", second_dir.path());

    let (a, b) = tokio::time::timeout(
        LIMIT,
        async { tokio::join!(runner.run(&first, None), runner.run(&second, None)) },
    )
    .await
    .expect("sessions hung");

    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(a.output.contains("alpha") && !a.output.contains("bravo"));
    assert!(b.output.contains("bravo") && !b.output.contains("alpha"));
}
