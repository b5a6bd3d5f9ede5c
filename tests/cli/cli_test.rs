//! End-to-end tests that drive the compiled binary.

use std::fs;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

const WASH_CONFIG: &str = "\
# @name: wash_trade_detection
# @report_type: wash_trade
# @domain: equities
# @tags: wash trade, alerts
threshold: 0.75
";

const SPOOF_CONFIG: &str = "\
# @name: spoofing_detection
# @report_type: spoofing
# @domain: futures
# @tags: spoofing, layering
depth: 5
";

const WASH_TEST: &str = r#"
@Meta(name = "WashTradeDetectionTest", report_type = "wash_trade")
@Meta(config_file = "wash_trade_detection.yml", tags = "wash trade, regression")
public class WashTradeDetectionTest {
    @Parameter("windowMinutes")
    private int windowMinutes = 30;
}
"#;

const WORKSPACE_CONFIG: &str = r#"
[catalog]
roots = ["configs", "src/test"]

[runner]
project_dir = "."
output_dir = "reports"
timeout_secs = 5
command = ["sh", "-c", "echo Alerts found: 2"]
"#;

/// Build a self-contained workspace the binary can run in: catalog files
/// plus a `watchdesk.toml` that the default config lookup picks up.
fn setup_workspace() -> TempDir {
    let temp = TempDir::new().expect("temp dir");
    let root = temp.path();
    fs::create_dir_all(root.join("configs")).expect("create configs dir");
    fs::create_dir_all(root.join("src/test")).expect("create tests dir");
    fs::write(root.join("configs/wash_trade_detection.yml"), WASH_CONFIG).expect("write config");
    fs::write(root.join("configs/spoofing_detection.yml"), SPOOF_CONFIG).expect("write config");
    fs::write(root.join("src/test/WashTradeDetectionTest.java"), WASH_TEST).expect("write test");
    fs::write(root.join("watchdesk.toml"), WORKSPACE_CONFIG).expect("write toml");
    temp
}

fn watchdesk(workspace: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("watchdesk").expect("binary");
    cmd.current_dir(workspace.path());
    cmd
}

#[test]
fn help_lists_every_subcommand() {
    let output = Command::cargo_bin("watchdesk")
        .expect("binary")
        .arg("--help")
        .output()
        .expect("help run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["process", "search", "reports", "params", "preview", "execute", "serve"] {
        assert!(stdout.contains(name), "help is missing {name}");
    }
}

#[test]
fn reports_lists_types_with_their_files() {
    let temp = setup_workspace();
    let output = watchdesk(&temp).arg("reports").output().expect("reports run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("wash_trade"));
    assert!(stdout.contains("spoofing"));
    assert!(stdout.contains("configs/wash_trade_detection.yml"));
    assert!(stdout.contains("src/test/WashTradeDetectionTest.java"));
}

#[test]
fn search_json_is_parseable_and_scored() {
    let temp = setup_workspace();
    let output = watchdesk(&temp)
        .args([
            "--json",
            "search",
            "--report-type",
            "wash_trade",
            "--keyword",
            "wash_trade",
        ])
        .output()
        .expect("search run");

    assert!(output.status.success());
    let matches: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let results = matches.as_array().expect("results array");
    assert_eq!(results.len(), 2);
    // The config outranks the test definition: 10 + 3 + 2 vs 10 + 3.
    assert_eq!(results[0]["score"], 15);
    assert_eq!(results[0]["record"]["report_type"], "wash_trade");
    assert_eq!(results[1]["score"], 13);
}

#[test]
fn params_shows_declared_parameters() {
    let temp = setup_workspace();
    let output = watchdesk(&temp)
        .args(["params", "WashTradeDetectionTest.java"])
        .output()
        .expect("params run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("windowMinutes: integer = 30 (default 30)"));
}

#[test]
fn preview_rejects_bad_changes_and_lists_them() {
    let temp = setup_workspace();
    let output = watchdesk(&temp)
        .args([
            "preview",
            "WashTradeDetectionTest.java",
            "--set",
            "windowMinutes=soon",
            "--set",
            "nope=1",
        ])
        .output()
        .expect("preview run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("2 invalid parameter change(s):"));
    assert!(stderr.contains("nope: not a declared parameter"));
    assert!(stderr.contains("windowMinutes: expected an integer literal"));
}

#[test]
fn preview_accepts_valid_changes_without_writing() {
    let temp = setup_workspace();
    let source = temp.path().join("src/test/WashTradeDetectionTest.java");
    let before = fs::read(&source).expect("read before");

    let output = watchdesk(&temp)
        .args([
            "preview",
            "WashTradeDetectionTest.java",
            "--set",
            "windowMinutes=45",
        ])
        .output()
        .expect("preview run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Preview (nothing written):"));
    assert!(stdout.contains("windowMinutes: integer = 45 (default 30)"));
    assert_eq!(fs::read(&source).expect("read after"), before);
}

#[test]
fn process_with_execute_runs_the_recommended_test() {
    let temp = setup_workspace();
    let output = watchdesk(&temp)
        .args([
            "process",
            "--text",
            "Suspected wash trades on the equities desk.",
            "--execute",
        ])
        .output()
        .expect("process run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Recommended action: execute test"));
    assert!(stdout.contains("Test run succeeded"));
    assert!(stdout.contains("Alerts found: 2"));
}

#[test]
fn serve_answers_a_json_line() {
    let temp = setup_workspace();
    let output = watchdesk(&temp)
        .arg("serve")
        .write_stdin("{\"tool\":\"list_report_types\"}\n")
        .output()
        .expect("serve run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let body: Value =
        serde_json::from_str(stdout.lines().next().expect("one line")).expect("valid json");
    assert_eq!(body["ok"], true);
    assert_eq!(body["result"][0]["report_type"], "spoofing");
    assert_eq!(body["result"][1]["report_type"], "wash_trade");
}

#[test]
fn missing_explicit_config_is_an_error() {
    let temp = setup_workspace();
    let output = watchdesk(&temp)
        .args(["--config", "no-such-file.toml", "reports"])
        .output()
        .expect("reports run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read config"));
}
