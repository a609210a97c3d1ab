use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "fintwin-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_writes_careers_and_strategies() {
    let exe = env!("CARGO_BIN_EXE_fintwin-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available careers"));
    assert!(content.contains("student"));
    assert!(content.contains("debt-crusher"));
}

#[test]
fn cli_json_report_covers_requested_plans() {
    let exe = env!("CARGO_BIN_EXE_fintwin-tester");
    let output_path = temp_path("json");
    let output = Command::new(exe)
        .args([
            "--careers",
            "student,banker",
            "--strategies",
            "saver,random",
            "--report",
            "json",
            "--iterations",
            "2",
            "--seeds",
            "7",
            "--turns",
            "6",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(report["total_scenarios"], 4);
    assert_eq!(report["passed"], 4);
    let leaderboard = report["leaderboard"].as_array().expect("leaderboard");
    assert_eq!(leaderboard.len(), 8);
}

#[test]
fn cli_share_code_seed_runs_only_its_career() {
    let exe = env!("CARGO_BIN_EXE_fintwin-tester");
    let output_path = temp_path("csv");
    let output = Command::new(exe)
        .args([
            "--seeds",
            "AR-PENNY42",
            "--report",
            "csv",
            "--iterations",
            "1",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());

    let content = std::fs::read_to_string(output_path).expect("read output");
    let rows: Vec<_> = content.lines().skip(1).collect();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].starts_with("artist/balanced,artist,balanced,AR-PENNY42,true"));
}

#[test]
fn cli_rejects_unknown_career() {
    let exe = env!("CARGO_BIN_EXE_fintwin-tester");
    let output = Command::new(exe)
        .args(["--careers", "astronaut", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown career"));
}

#[test]
fn cli_rejects_out_of_range_event_probability() {
    let exe = env!("CARGO_BIN_EXE_fintwin-tester");
    let output = Command::new(exe)
        .args(["--event-probability", "2.5", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
}
