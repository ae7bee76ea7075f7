//! Integration tests for process automation on a pseudo-terminal

#![cfg(unix)]

use shellexpect::{Expect, ExpectError, Pattern, PatternError};
use std::io::ErrorKind;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const TIMEOUT: Duration = Duration::from_secs(10);

fn sh(script: &str) -> Expect {
    Expect::builder("sh")
        .args(["-c", script])
        .timeout(TIMEOUT)
        .build()
}

#[tokio::test]
async fn test_basic_command_execution() {
    let mut process = Expect::new("echo", ["Hello World"]);
    process.start().expect("Failed to spawn command");

    let result = process
        .wait_for(Pattern::exact("Hello"), TIMEOUT)
        .await
        .expect("Failed to find 'Hello'");

    assert_eq!(result.matched, "Hello");
    assert_eq!(result.before, "");
}

#[tokio::test]
async fn test_environment_is_applied() {
    let mut process = Expect::with_env("sh", ["-c", "echo $TESTVAR"], ["TESTVAR=foobar"]);
    process.start().expect("Failed to spawn");

    let result = process
        .wait_for("\n", TIMEOUT)
        .await
        .expect("No output line");
    assert_eq!(result.before, "foobar");
}

#[tokio::test]
async fn test_regex_with_captures() {
    let mut process = Expect::new("echo", ["user@example.com"]);
    process.start().expect("Failed to spawn");

    let pattern = Pattern::regex(r"(\w+)@(\w+)\.(\w+)").expect("Invalid regex");
    let result = process.expect(pattern).await.expect("Pattern not found");

    assert_eq!(result.matched, "user@example.com");
    assert_eq!(result.captures, vec!["user@example.com", "user", "example", "com"]);
}

#[tokio::test]
async fn test_first_occurrence_wins() {
    let mut process = sh("echo one; echo two");
    process.start().expect("Failed to spawn");

    let first = assert_ok!(process.wait_for("o", TIMEOUT).await);
    assert_eq!(first.before, "");

    let second = assert_ok!(process.wait_for("o", TIMEOUT).await);
    assert_eq!(second.before, "ne\ntw");
    assert_eq!(second.consumed(), "ne\ntwo");
}

#[tokio::test]
async fn test_timeout_preserves_output() {
    let mut process = sh("echo ready; sleep 5");
    process.start().expect("Failed to spawn");

    let err = assert_err!(
        process
            .wait_for("NEVER_APPEARS", Duration::from_millis(200))
            .await
    );
    match err {
        ExpectError::Timeout { duration } => assert_eq!(duration, Duration::from_millis(200)),
        other => panic!("Unexpected error: {other}"),
    }

    // The timed-out wait consumed nothing.
    let result = assert_ok!(process.wait_for("ready\n", TIMEOUT).await);
    assert_eq!(result.before, "");
}

#[tokio::test]
async fn test_exit_reports_partial_output() {
    let mut process = sh("echo partial; exit 0");
    process.start().expect("Failed to spawn");

    match process.wait_for("NEVER_APPEARS", TIMEOUT).await {
        Err(ExpectError::ProcessExited { partial }) => assert_eq!(partial, "partial\n"),
        other => panic!("Expected ProcessExited, got {other:?}"),
    }
    assert!(process.is_closed());
}

#[tokio::test]
async fn test_output_before_exit_still_matches() {
    let mut process = sh("echo done; exit 0");
    process.start().expect("Failed to spawn");

    // Give the process time to exit before waiting.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let result = assert_ok!(process.wait_for("done", TIMEOUT).await);
    assert_eq!(result.matched, "done");
}

#[tokio::test]
async fn test_killed_process_wakes_waiter() {
    let mut process = sh("sleep 0.2; kill -KILL $$");
    process.start().expect("Failed to spawn");

    let err = assert_err!(process.wait_for("NEVER_APPEARS", TIMEOUT).await);
    assert!(err.is_process_exited(), "got {err}");
}

#[tokio::test]
async fn test_send_and_receive() {
    let mut process = Expect::builder("cat").timeout(TIMEOUT).spawn().expect("Failed to spawn");

    process.send_line("hello").await.expect("Failed to send");

    // Once from the terminal echo, once from cat.
    assert_ok!(process.expect("hello\n").await);
    assert_ok!(process.expect("hello\n").await);
    assert_eq!(process.pending_output(), "");
}

#[tokio::test]
async fn test_debug_toggle_while_running() {
    let mut process = Expect::new("cat", Vec::<String>::new());
    process.start().expect("Failed to spawn");

    process.set_debug(true);
    assert!(process.is_debug());
    process.send_line("traced").await.expect("Failed to send");
    assert_ok!(process.wait_for("traced", TIMEOUT).await);

    process.set_debug(false);
    assert!(!process.is_debug());
}

#[tokio::test]
async fn test_stop() {
    let mut process = Expect::new("cat", Vec::<String>::new());
    process.start().expect("Failed to spawn");
    assert!(process.pid().is_some());
    assert!(process.is_alive().expect("is_alive failed"));

    process.stop().expect("Failed to stop");
    assert!(process.is_closed());
    assert_eq!(process.pid(), None);

    let err = assert_err!(process.wait_for("anything", TIMEOUT).await);
    assert!(err.is_process_exited());

    match process.send(b"late\n").await {
        Err(ExpectError::IoError(e)) => assert_eq!(e.kind(), ErrorKind::BrokenPipe),
        other => panic!("Expected BrokenPipe, got {other:?}"),
    }

    // Stopping again is harmless.
    assert_ok!(process.stop());
    assert!(process.is_alive().is_err());
}

#[tokio::test]
async fn test_stop_does_not_block_on_ignored_hangup() {
    let mut process = sh("trap '' HUP; echo armed; sleep 5");
    process.start().expect("Failed to spawn");
    assert_ok!(process.wait_for("armed", TIMEOUT).await);

    let started = std::time::Instant::now();
    process.stop().expect("Failed to stop");
    assert!(
        started.elapsed() < Duration::from_millis(150),
        "stop took {:?}",
        started.elapsed()
    );
    assert!(process.is_closed());
}

#[tokio::test]
async fn test_wait_without_deadline() {
    let mut process = sh("sleep 0.1; echo late");
    process.start().expect("Failed to spawn");

    let result = assert_ok!(process.wait_for("late", Duration::MAX).await);
    assert_eq!(result.matched, "late");
}

#[tokio::test]
async fn test_wait_for_exit_status() {
    let mut process = sh("exit 3");
    process.start().expect("Failed to spawn");

    let status = process.wait().await.expect("Failed to wait");
    assert_eq!(status.exit_code(), 3);
    assert!(!status.success());

    let err = assert_err!(process.wait().await);
    assert!(err.is_process_exited());
}

#[tokio::test]
async fn test_already_started() {
    let mut process = Expect::new("cat", Vec::<String>::new());
    process.start().expect("Failed to spawn");

    assert!(matches!(process.start(), Err(ExpectError::AlreadyStarted)));
}

#[tokio::test]
async fn test_spawn_invalid_command() {
    let mut process = Expect::new("/nonexistent/not-a-real-program", Vec::<String>::new());
    assert!(matches!(process.start(), Err(ExpectError::SpawnError(_))));
}

#[tokio::test]
async fn test_empty_pattern_error() {
    let mut process = Expect::new("cat", Vec::<String>::new());
    process.start().expect("Failed to spawn");

    let err = assert_err!(process.wait_for("", TIMEOUT).await);
    assert!(matches!(
        err,
        ExpectError::PatternError(PatternError::EmptyPattern)
    ));
}

#[tokio::test]
async fn test_ansi_stripping() {
    let script = "printf '\\033[31mred\\033[0m\\n'";

    let mut process = sh(script);
    process.start().expect("Failed to spawn");
    let result = assert_ok!(process.wait_for("\n", TIMEOUT).await);
    assert_eq!(result.before, "red");

    let mut raw = Expect::builder("sh")
        .args(["-c", script])
        .strip_ansi(false)
        .build();
    raw.start().expect("Failed to spawn");
    let result = assert_ok!(raw.wait_for("\n", TIMEOUT).await);
    assert_eq!(result.before, "\x1b[31mred\x1b[0m");
}

#[tokio::test]
async fn test_newline_normalization_can_be_disabled() {
    let mut process = Expect::builder("echo")
        .arg("hi")
        .normalize_newlines(false)
        .spawn()
        .expect("Failed to spawn");

    let result = assert_ok!(process.wait_for("hi\r\n", TIMEOUT).await);
    assert_eq!(result.matched, "hi\r\n");
}

#[tokio::test]
async fn test_resize() {
    let mut process = Expect::new("cat", Vec::<String>::new());
    process.start().expect("Failed to spawn");
    assert_ok!(process.resize(40, 120));
}

#[tokio::test]
async fn test_utf8_support() {
    let mut process = Expect::new("echo", ["Hello 世界"]);
    process.start().expect("Failed to spawn");

    let result = assert_ok!(process.expect("世界").await);
    assert_eq!(result.before, "Hello ");
}
