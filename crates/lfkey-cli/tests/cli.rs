use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("lfkey"))
}

fn render_trace(dir: &TempDir, key_type: &str, data: &str) -> std::path::PathBuf {
    let trace = dir.path().join("trace.txt");
    cmd()
        .arg("trace")
        .arg("render")
        .arg(key_type)
        .arg(data)
        .arg("-o")
        .arg(&trace)
        .arg("--quiet")
        .assert()
        .success();
    trace
}

#[test]
fn help_supports_analyse_and_analyze() {
    cmd()
        .arg("trace")
        .arg("analyse")
        .arg("--help")
        .assert()
        .success();
    cmd()
        .arg("trace")
        .arg("analyze")
        .arg("--help")
        .assert()
        .success();
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.txt");
    let report = temp.path().join("report.json");

    cmd()
        .arg("trace")
        .arg("analyse")
        .arg(missing)
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn render_then_analyse_round_trips() {
    let temp = TempDir::new().expect("tempdir");
    let trace = render_trace(&temp, "EM4100", "12 34 56 78 9A");

    let assert = cmd()
        .arg("trace")
        .arg("analyse")
        .arg(&trace)
        .arg("--stdout")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let report: Value = serde_json::from_str(&stdout).expect("valid json");

    assert_eq!(report["report_version"], 1);
    let reads = report["summary"]["reads"].as_array().expect("reads array");
    assert_eq!(reads.len(), 1);
    assert_eq!(reads[0]["key_type"], "EM4100");
    assert_eq!(reads[0]["data"], "12 34 56 78 9A");
    assert_eq!(reads[0]["manufacturer"], "EM-Micro");
    assert_eq!(report["summary"]["antenna_detected"], true);
}

#[test]
fn hid_credentials_round_trip_too() {
    let temp = TempDir::new().expect("tempdir");
    let trace = render_trace(&temp, "H10301", "0C 34 56");

    let assert = cmd()
        .arg("trace")
        .arg("analyse")
        .arg(&trace)
        .arg("--stdout")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let report: Value = serde_json::from_str(&stdout).expect("valid json");
    let reads = report["summary"]["reads"].as_array().expect("reads array");
    assert_eq!(reads[0]["key_type"], "H10301");
    assert_eq!(reads[0]["data"], "0C 34 56");
}

#[test]
fn strict_fails_on_an_empty_trace() {
    let temp = TempDir::new().expect("tempdir");
    let trace = temp.path().join("empty.txt");
    std::fs::write(&trace, "# no pulses\n").expect("write trace");

    cmd()
        .arg("trace")
        .arg("analyse")
        .arg(&trace)
        .arg("--stdout")
        .arg("--strict")
        .assert()
        .failure()
        .stderr(contains("no stable read"));
}

#[test]
fn malformed_trace_entries_are_reported() {
    let temp = TempDir::new().expect("tempdir");
    let trace = temp.path().join("bad.txt");
    std::fs::write(&trace, "128\n-128\nbogus\n").expect("write trace");

    cmd()
        .arg("trace")
        .arg("analyse")
        .arg(&trace)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("invalid trace entry 'bogus'"));
}

#[test]
fn render_rejects_contact_keys() {
    let temp = TempDir::new().expect("tempdir");
    let out = temp.path().join("trace.txt");
    cmd()
        .arg("trace")
        .arg("render")
        .arg("Cyfral")
        .arg("C3 5A")
        .arg("-o")
        .arg(out)
        .assert()
        .failure()
        .stderr(contains("cannot be emulated"));
}

#[test]
fn render_rejects_bad_hex_with_hint() {
    let temp = TempDir::new().expect("tempdir");
    let out = temp.path().join("trace.txt");
    cmd()
        .arg("trace")
        .arg("render")
        .arg("EM4100")
        .arg("12 34 5G 78 9A")
        .arg("-o")
        .arg(out)
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let trace = render_trace(&temp, "EM4100", "12 34 56 78 9A");
    let report = temp.path().join("report.json");

    cmd()
        .arg("trace")
        .arg("analyse")
        .arg(trace)
        .arg("-o")
        .arg(report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn pretty_and_compact_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let trace = render_trace(&temp, "EM4100", "12 34 56 78 9A");
    let report = temp.path().join("report.json");

    cmd()
        .arg("trace")
        .arg("analyse")
        .arg(trace)
        .arg("-o")
        .arg(report)
        .arg("--pretty")
        .arg("--compact")
        .assert()
        .failure()
        .stderr(contains("error:"));
}
