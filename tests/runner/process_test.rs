//! Process runner tests that launch real child processes.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use watchdesk::config::RunnerConfig;
use watchdesk::runner::{JobRequest, JobRunner, ProcessRunner, RunnerError};

fn runner_with(dir: &TempDir, command: &[&str], timeout_secs: u64) -> ProcessRunner {
    ProcessRunner::new(&RunnerConfig {
        project_dir: dir.path().to_path_buf(),
        output_dir: dir.path().join("reports"),
        timeout_secs,
        command: command.iter().map(|c| (*c).to_owned()).collect(),
    })
}

fn request(name: &str) -> JobRequest {
    JobRequest {
        test_name: name.to_owned(),
        source_path: PathBuf::from("src/test").join(format!("{name}.java")),
        parameters: BTreeMap::new(),
        output_format: "csv".to_owned(),
    }
}

#[tokio::test]
async fn captures_stdout_and_exit_code() {
    let dir = TempDir::new().expect("temp dir");
    let runner = runner_with(&dir, &["sh", "-c", "echo hello from the suite"], 5);

    let outcome = runner.run(&request("EchoTest")).await.expect("run");

    assert!(outcome.success());
    assert_eq!(outcome.exit_code, Some(0));
    assert_eq!(outcome.stdout, "hello from the suite\n");
    assert!(outcome.stderr.is_empty());
}

#[tokio::test]
async fn nonzero_exit_is_an_outcome_not_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let runner = runner_with(&dir, &["sh", "-c", "echo boom >&2; exit 3"], 5);

    let outcome = runner.run(&request("FailingTest")).await.expect("run");

    assert!(!outcome.success());
    assert_eq!(outcome.exit_code, Some(3));
    assert!(outcome.stderr.contains("boom"));
}

#[tokio::test]
async fn timeout_kills_the_run_and_reports_the_budget() {
    let dir = TempDir::new().expect("temp dir");
    let runner = runner_with(&dir, &["sh", "-c", "sleep 30"], 1);

    let started = Instant::now();
    let err = runner.run(&request("SlowTest")).await.expect_err("timeout");

    assert!(matches!(err, RunnerError::Timeout { seconds: 1 }));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn missing_program_reports_spawn_failure() {
    let dir = TempDir::new().expect("temp dir");
    let runner = runner_with(&dir, &["watchdesk-no-such-binary-7215"], 5);

    let err = runner.run(&request("AnyTest")).await.expect_err("spawn failure");

    match err {
        RunnerError::Spawn { program, .. } => {
            assert_eq!(program, "watchdesk-no-such-binary-7215");
        }
        other => panic!("expected spawn error, got {other:?}"),
    }
}

#[tokio::test]
async fn fresh_report_is_attached_to_the_outcome() {
    let dir = TempDir::new().expect("temp dir");
    let reports = dir.path().join("reports");
    fs::create_dir_all(&reports).expect("create reports dir");
    let script = format!(
        "echo done > '{}'",
        reports.join("wash_trade_report.csv").display()
    );
    let runner = runner_with(&dir, &["sh", "-c", &script], 5);

    let outcome = runner
        .run(&request("WashTradeDetectionTest"))
        .await
        .expect("run");

    let report = outcome.report_path.expect("report path");
    assert!(report.ends_with("wash_trade_report.csv"));
}

#[tokio::test]
async fn missing_output_dir_means_no_report() {
    let dir = TempDir::new().expect("temp dir");
    let runner = runner_with(&dir, &["sh", "-c", "true"], 5);

    let outcome = runner.run(&request("QuietTest")).await.expect("run");

    assert_eq!(outcome.report_path, None);
}
