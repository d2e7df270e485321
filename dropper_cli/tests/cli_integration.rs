use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid config; pins are unused by the simulation but must be present
fn write_config(dir: &tempfile::TempDir, extra: &str) -> PathBuf {
    let toml = format!(
        r#"
[pins]
light_sensor = 17
hall_sensor = 27
servo = 18
trigger = 22

[simulation]
initial_period_us = 600000
duration_ms = 6000
trigger_at_ms = 3000
trigger_hold_ms = 50
tick_us = 100
{extra}
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["predict", "--period-us", "1000000", "--elapsed-us", "100000"], 0, "release in 487407 us", "stdout")]
#[case(&["predict", "--period-us", "9000000"], 0, "not computable", "stdout")]
#[case(&["predict"], 2, "required", "stderr")]
#[case(&["simulate"], 0, "release #1", "stdout")]
#[case(&["simulate", "--trigger-at-ms", "9000"], 0, "0 release(s)", "stdout")]
#[case(&["simulate", "--disturb-at-ms", "100"], 2, "disturb-factor", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let mut cmd = Command::cargo_bin("dropper").unwrap();
    // Always include a valid config to avoid relying on default path
    cmd.arg("--config").arg(&cfg).arg("--log-level").arg("error");
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn invalid_config_exits_with_config_code() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[monitor]\nlight_factor = 0\n");

    Command::cargo_bin("dropper")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("simulate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("light_factor"));
}

#[rstest]
fn missing_config_exits_with_config_code() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("dropper")
        .unwrap()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("simulate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read config"));
}

#[cfg(not(feature = "hardware"))]
#[rstest]
fn run_without_hardware_backend_exits_with_hardware_code() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    Command::cargo_bin("dropper")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("run")
        .arg("--max-run-ms")
        .arg("10")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("hardware"));
}

/// Validate the JSONL schema of a simulated run.
#[rstest]
fn simulate_json_lines_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let out = Command::cargo_bin("dropper")
        .unwrap()
        .arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .arg("simulate")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).expect("valid JSON"))
        .collect();
    assert_eq!(lines.len(), 2, "stdout was: {stdout}");

    let release = &lines[0];
    assert_eq!(release["event"], "release");
    for key in ["release_us", "landing_us", "passage_us"] {
        assert!(release[key].as_u64().is_some(), "{key} missing");
    }
    let miss = release["miss_us"].as_i64().expect("miss_us");
    assert!(miss.abs() < 1_000, "missed by {miss} us");

    let summary = &lines[1];
    assert_eq!(summary["event"], "summary");
    assert_eq!(summary["releases"], 1);
    assert_eq!(summary["aborted"], 0);
}

#[rstest]
fn disturbance_from_command_line_aborts_release() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    Command::cargo_bin("dropper")
        .unwrap()
        .args(["--json", "--log-level", "error", "--config"])
        .arg(&cfg)
        .args(["simulate", "--disturb-at-ms", "2500", "--disturb-factor", "1.2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""aborted":1"#))
        .stdout(predicate::str::contains(r#""releases":0"#));
}

#[rstest]
fn predict_json_reports_rounds() {
    let out = Command::cargo_bin("dropper")
        .unwrap()
        .args(["--json", "predict", "--period-us", "1000000", "--elapsed-us", "100000"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).expect("valid JSON");
    assert_eq!(v["wait_us"], 487_407);
    assert_eq!(v["rounds"], 1);
    assert_eq!(v["projected_periods_us"][0], 1_006_532);
    assert!(v["not_computable"].is_null());
}
