use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("ohh-{nanos}-{name}"))
}

fn run(store_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ohh"))
        .args(args)
        .env("OHH_STORE_DIR", store_dir)
        .env("OHH_CONFIG_PATH", store_dir.join("config.json"))
        .output()
        .expect("failed to run ohh")
}

#[test]
fn every_invocation_counts_a_session() {
    let dir = temp_path("cli-usage");
    assert!(run(&dir, &["quick", "first"]).status.success());
    assert!(run(&dir, &["list", "--search", "first", "--sort", "status"]).status.success());

    let output = run(&dir, &["usage", "--json"]);
    std::fs::remove_dir_all(&dir).ok();

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total_sessions"], 3);
    assert_eq!(report["total_tasks_created"], 1);
    assert_eq!(report["features"]["search_used"], 1);
    assert_eq!(report["features"]["sort_used"], 1);
    assert_eq!(report["features"]["filter_used"], 0);
    assert_eq!(report["task_completion_rate"], "0.00%");
}

#[test]
fn bad_config_override_is_invalid_input() {
    let dir = temp_path("cli-override");
    let output = run(&dir, &["list", "--config-override", "colour=red"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown config field"));
}

#[test]
fn config_file_default_filter_applies_to_list() {
    let dir = temp_path("cli-config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("config.json"),
        r#"{ "default_filter": "completed" }"#,
    )
    .unwrap();
    assert!(run(&dir, &["quick", "open task"]).status.success());

    let output = run(&dir, &["list", "--json"]);
    std::fs::remove_dir_all(&dir).ok();

    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 0);
}
