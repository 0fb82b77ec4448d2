//! Signal handling for a running check
//!
//! Kept in its own test binary: it sends SIGTERM to the whole test process.
#![cfg(unix)]

mod common;

use std::time::Duration;

use common::{CollectingReporter, VALID_JS, Workspace, stuck_validator};
use fixcheck::cli::{ExitCode, check_fixtures_until, shutdown_signal};

#[tokio::test]
async fn test_sigterm_stops_run_and_cleans_up() {
    let ws = Workspace::new(&[("a.js", VALID_JS), ("b.js", VALID_JS)]);
    let config = ws.config().with_validator(stuck_validator());
    let mut reporter = CollectingReporter::default();

    let run = check_fixtures_until(ws.dir(), config, &mut reporter, shutdown_signal());
    let send_sigterm = async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());
        std::future::pending::<()>().await
    };

    let code = tokio::select! {
        outcome = run => outcome.unwrap(),
        () = send_sigterm => unreachable!(),
    };

    assert_eq!(code, ExitCode::TERMINATED);
    assert!(!reporter.started.is_empty());
    assert!(reporter.seen.is_empty());
    assert!(!reporter.completed);
    assert!(ws.leftover_temp_files().is_empty());
}
