//! Tests of the `dr-flex-sim` binary.

use std::collections::HashMap;
use std::process::Command;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_dr-flex-sim"))
}

/// Parses the `Label:  value` lines of the flexibility report.
fn report_fields(stdout: &str) -> HashMap<String, String> {
    stdout
        .lines()
        .skip_while(|l| !l.starts_with("--- Flexibility Report ---"))
        .skip(1)
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

#[test]
fn help_exits_cleanly() {
    let out = bin().arg("--help").output().unwrap();
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("--demo"));
    assert!(stderr.contains("--ranking-out"));
}

#[test]
fn unknown_argument_fails() {
    let out = bin().arg("--bogus").output().unwrap();
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn unknown_preset_fails() {
    let out = bin().args(["--preset", "tumble_dryer", "--demo"]).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown preset"));
}

#[test]
fn missing_inputs_fail_without_demo() {
    let out = bin().output().unwrap();
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn demo_run_prints_report_and_writes_csv() {
    let dir = std::env::temp_dir().join(format!("dr-flex-sim-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let best = dir.join("best.csv");
    let ranking = dir.join("ranking.csv");

    let out = bin()
        .args(["--demo", "--seed", "5"])
        .arg("--summary-out")
        .arg(&best)
        .arg("--ranking-out")
        .arg(&ranking)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("Ranked candidate days:"));
    let fields = report_fields(&stdout);
    assert_eq!(fields.get("Peak periods").map(String::as_str), Some("150"));
    let events: usize = fields["Events simulated"].parse().unwrap();
    assert!(events > 0);
    assert_eq!(events % 9, 0);

    let best_csv = std::fs::read_to_string(&best).unwrap();
    assert!(best_csv.starts_with("event_date,rank,"));
    assert_eq!(best_csv.lines().count(), events / 9 + 1);
    let ranking_csv = std::fs::read_to_string(&ranking).unwrap();
    assert!(ranking_csv.starts_with("rank,date,"));

    std::fs::remove_dir_all(&dir).ok();
}
