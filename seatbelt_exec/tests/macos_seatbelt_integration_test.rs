//! End-to-end tests that run commands under the real `/usr/bin/sandbox-exec`.
//!
//! Skipped when the enforcer cannot be applied (e.g. when the test process is itself
//! inside another sandbox).
#![cfg(target_os = "macos")]

use seatbelt_exec::exec::{ExecConfig, RawExec, SpawnOptions, Termination};
use seatbelt_exec::sandbox::{SandboxError, SeatbeltExecutor, probe_enforcer};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

const NO_ROOTS: &[PathBuf] = &[];

fn enforcer_usable() -> bool {
    match probe_enforcer() {
        Ok(()) => true,
        Err(e) => {
            eprintln!("Skipping seatbelt integration test: {e}");
            false
        }
    }
}

fn executor() -> SeatbeltExecutor {
    SeatbeltExecutor::new(RawExec).with_implicit_roots(Vec::new())
}

#[tokio::test]
async fn test_echo_inside_writable_root() {
    if !enforcer_usable() {
        return;
    }
    let work = tempdir().unwrap();
    let executor = executor();

    let prepared = executor.prepare(&["echo", "hi"], &[work.path()]).unwrap();
    assert_eq!(prepared.policy.writable_root_count(), 1);
    assert_eq!(prepared.policy.params()[0].name(), "WRITABLE_ROOT_0");
    assert_eq!(
        prepared.policy.params()[0].value(),
        std::fs::canonicalize(work.path()).unwrap()
    );

    let result = executor
        .run(
            &["echo", "hi"],
            &SpawnOptions::default(),
            &[work.path()],
            &ExecConfig::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.stdout, "hi\n");
}

#[tokio::test]
async fn test_write_outside_roots_is_denied() {
    if !enforcer_usable() {
        return;
    }
    let outside = tempdir().unwrap();
    let blocked = outside.path().join("blocked");

    let result = executor()
        .run(
            &["touch", blocked.to_str().unwrap()],
            &SpawnOptions::default(),
            NO_ROOTS,
            &ExecConfig::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(!blocked.exists());
    let err = SandboxError::from(result.into_result().unwrap_err());
    assert!(!err.is_environment_error());
    assert!(err.to_string().contains("Operation not permitted"));
}

#[tokio::test]
async fn test_write_inside_root_and_read_anywhere_succeed() {
    if !enforcer_usable() {
        return;
    }
    let work = tempdir().unwrap();
    let target = work.path().join("allowed.txt");
    let script = format!(
        "head -c 1 /etc/hosts >/dev/null && echo ok > '{}'",
        target.display()
    );

    let result = executor()
        .run(
            &["sh", "-c", script.as_str()],
            &SpawnOptions::default(),
            &[work.path()],
            &ExecConfig::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(result.success(), "stderr: {}", result.stderr);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "ok\n");
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_root_grants_access_to_its_target() {
    if !enforcer_usable() {
        return;
    }
    let temp = tempdir().unwrap();
    let real = temp.path().join("real");
    std::fs::create_dir(&real).unwrap();
    let alias = temp.path().join("alias");
    std::os::unix::fs::symlink(&real, &alias).unwrap();

    let result = executor()
        .run(
            &["touch", real.join("file").to_str().unwrap()],
            &SpawnOptions::default(),
            &[&alias],
            &ExecConfig::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(result.success(), "stderr: {}", result.stderr);
    assert!(real.join("file").exists());
}

#[tokio::test]
async fn test_cancelled_run_reports_cancellation() {
    if !enforcer_usable() {
        return;
    }
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let result = executor()
        .run(
            &["sleep", "30"],
            &SpawnOptions::default(),
            NO_ROOTS,
            &ExecConfig::default(),
            cancel,
        )
        .await
        .unwrap();

    assert_eq!(result.termination, Termination::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(10));
}
