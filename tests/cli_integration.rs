//! Integration tests for the `tc` CLI.
//!
//! Each test creates a temp data directory, runs `tc` as a subprocess
//! against it with `-d`, and verifies stdout and/or file contents.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use pretty_assertions::assert_eq;

/// Get the path to the built `tc` binary.
fn tc_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tc"))
}

/// Seed a data directory with a small Taskwarrior-shaped task file.
///
/// Main: "Buy groceries" (M), "Call mom" (H)
/// Workouts: "Run 5k" (H, project Health, +outdoor), "Stretch" (done)
/// plus one deleted record that must never show up.
fn create_test_data(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("tasks.json"),
        r#"[
  {
    "uuid": "6f1c2a3e-0b1d-4c55-9d0a-1a2b3c4d5e01",
    "id": 1,
    "description": "Buy groceries",
    "status": "pending",
    "priority": "M",
    "entry": "20250501T090000Z",
    "module": "Main"
  },
  {
    "uuid": "6f1c2a3e-0b1d-4c55-9d0a-1a2b3c4d5e02",
    "id": 2,
    "description": "Call mom",
    "status": "pending",
    "priority": "H",
    "entry": "20250502T090000Z",
    "module": "Main"
  },
  {
    "uuid": "6f1c2a3e-0b1d-4c55-9d0a-1a2b3c4d5e03",
    "id": 3,
    "description": "Run 5k",
    "status": "pending",
    "priority": "H",
    "project": "Health",
    "tags": ["outdoor"],
    "entry": "20250503T090000Z",
    "module": "Workouts"
  },
  {
    "uuid": "6f1c2a3e-0b1d-4c55-9d0a-1a2b3c4d5e04",
    "id": 0,
    "description": "Stretch",
    "status": "completed",
    "entry": "20250504T090000Z",
    "end": "20250505T090000Z",
    "module": "Workouts"
  },
  {
    "uuid": "6f1c2a3e-0b1d-4c55-9d0a-1a2b3c4d5e05",
    "id": 0,
    "description": "Old thing",
    "status": "deleted",
    "entry": "20250401T090000Z",
    "end": "20250402T090000Z"
  }
]
"#,
    )
    .unwrap();
}

/// Run `tc` against `dir`, returning (stdout, stderr, success).
fn run_tc(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(tc_bin())
        .arg("-d")
        .arg(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run tc");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `tc` expecting success, return stdout.
fn run_tc_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_tc(dir, args);
    if !success {
        panic!(
            "tc {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

/// Run `tc` expecting failure, return stderr.
fn run_tc_err(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_tc(dir, args);
    if success {
        panic!("tc {:?} unexpectedly succeeded:\nstdout: {}", args, stdout);
    }
    stderr
}

fn run_tc_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = args.to_vec();
    full.push("--json");
    let out = run_tc_ok(dir, &full);
    serde_json::from_str(&out).unwrap()
}

fn descriptions(module_json: &serde_json::Value) -> Vec<String> {
    module_json["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["description"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Read command tests
// ---------------------------------------------------------------------------

#[test]
fn test_list_default() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    let out = run_tc_ok(tmp.path(), &["list"]);
    assert!(out.contains("== Main =="));
    assert!(out.contains("Buy groceries"));
    assert!(out.contains("== Workouts =="));
    assert!(out.contains("[x] Stretch"));
    assert!(!out.contains("Old thing"));
}

#[test]
fn test_list_empty_data_dir() {
    let tmp = tempfile::TempDir::new().unwrap();

    let out = run_tc_ok(tmp.path(), &["list"]);
    assert!(out.contains("== Main =="));
    assert!(out.contains("(no tasks)"));
}

#[test]
fn test_list_specific_module() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    let out = run_tc_ok(tmp.path(), &["list", "Workouts"]);
    assert!(out.contains("Run 5k"));
    assert!(!out.contains("Buy groceries"));
}

#[test]
fn test_list_unknown_module() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    let err = run_tc_err(tmp.path(), &["list", "Nowhere"]);
    assert!(err.contains("unknown module: Nowhere"));
}

#[test]
fn test_list_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    let parsed = run_tc_json(tmp.path(), &["list", "Workouts"]);
    let arr = parsed.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["module"], "Workouts");
    assert_eq!(descriptions(&arr[0]), vec!["Run 5k", "Stretch"]);
    assert_eq!(arr[0]["tasks"][0]["index"], 1);
    assert_eq!(arr[0]["tasks"][0]["project"], "Health");
    assert_eq!(arr[0]["tasks"][1]["status"], "completed");
}

#[test]
fn test_list_sort_override() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    let by_name = run_tc_json(tmp.path(), &["list", "Main"]);
    assert_eq!(descriptions(&by_name[0]), vec!["Buy groceries", "Call mom"]);

    let by_priority = run_tc_json(tmp.path(), &["list", "Main", "--sort", "priority"]);
    assert_eq!(descriptions(&by_priority[0]), vec!["Call mom", "Buy groceries"]);
}

#[test]
fn test_list_bad_sort() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    let err = run_tc_err(tmp.path(), &["list", "--sort", "urgency"]);
    assert!(err.starts_with("error:"));
}

#[test]
fn test_modules() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    let out = run_tc_ok(tmp.path(), &["modules"]);
    assert!(out.contains("Main (0/2 done)"));
    assert!(out.contains("Workouts (1/2 done)"));
}

#[test]
fn test_xp_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    let parsed = run_tc_json(tmp.path(), &["xp"]);
    // M(5) + H(10) + H(10) + unprioritized(0.5), of which Stretch is done
    assert_eq!(parsed["main"]["max_xp"], 25.5);
    assert_eq!(parsed["main"]["cur_xp"], 0.5);
    assert_eq!(parsed["bars"].as_array().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// Write command tests
// ---------------------------------------------------------------------------

#[test]
fn test_add() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    let out = run_tc_ok(
        tmp.path(),
        &[
            "add", "Write", "report", "-p", "H", "--project", "Work", "-t", "office", "--col",
            "estimate=2h",
        ],
    );
    assert!(out.contains("added to Main:"));
    assert!(out.contains("Write report !H @Work +office"));

    let parsed = run_tc_json(tmp.path(), &["list", "Main"]);
    assert_eq!(
        descriptions(&parsed[0]),
        vec!["Buy groceries", "Call mom", "Write report"]
    );

    let raw = fs::read_to_string(tmp.path().join("tasks.json")).unwrap();
    assert!(raw.contains("\"estimate\": \"2h\""));
}

#[test]
fn test_add_to_new_module() {
    let tmp = tempfile::TempDir::new().unwrap();

    run_tc_ok(tmp.path(), &["add", "Pay rent", "-m", "Personal Finance"]);
    let out = run_tc_ok(tmp.path(), &["modules"]);
    assert!(out.contains("Personal Finance (0/1 done)"));
}

#[test]
fn test_add_json_returns_identity() {
    let tmp = tempfile::TempDir::new().unwrap();

    let task = run_tc_json(tmp.path(), &["add", "First", "--due", "2025-06-01"]);
    assert_eq!(task["description"], "First");
    assert_eq!(task["id"], 1);
    assert_eq!(task["status"], "pending");
    assert_eq!(task["due"], "2025-06-01");
    assert!(task["uuid"].as_str().unwrap().len() == 36);
}

#[test]
fn test_add_bad_priority() {
    let tmp = tempfile::TempDir::new().unwrap();

    let err = run_tc_err(tmp.path(), &["add", "Thing", "-p", "urgent"]);
    assert!(err.contains("error:"));
    assert!(!tmp.path().join("tasks.json").exists());
}

#[test]
fn test_done_and_undo() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    let out = run_tc_ok(tmp.path(), &["done", "Main", "1"]);
    assert!(out.contains("completed: Buy groceries (+5 xp)"));
    assert!(out.contains("Main XP Bar"));

    let parsed = run_tc_json(tmp.path(), &["xp"]);
    assert_eq!(parsed["main"]["cur_xp"], 5.5);

    let out = run_tc_ok(tmp.path(), &["undo", "Main", "1"]);
    assert!(out.contains("reopened: Buy groceries (-5 xp)"));

    let parsed = run_tc_json(tmp.path(), &["list", "Main"]);
    assert_eq!(parsed[0]["tasks"][0]["status"], "pending");
}

#[test]
fn test_done_json_lists_relevant_bars() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());
    fs::write(
        tmp.path().join("config.toml"),
        r#"[[bars]]
name = "Urgent"
priority = "H"
completion_value = 10.0

[[bars]]
name = "Outside"
tags = ["outdoor"]
"#,
    )
    .unwrap();

    let parsed = run_tc_json(tmp.path(), &["done", "Main", "2"]);
    assert_eq!(parsed["task"]["description"], "Call mom");
    assert_eq!(parsed["xp"], 10.0);
    let names: Vec<&str> = parsed["bars"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Urgent", "Main XP Bar"]);
}

#[test]
fn test_done_out_of_range() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    let err = run_tc_err(tmp.path(), &["done", "Main", "9"]);
    assert!(err.contains("no task at index 9 in module Main"));
    let err = run_tc_err(tmp.path(), &["done", "Main", "0"]);
    assert!(err.contains("task index starts at 1"));
}

#[test]
fn test_modify() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    let out = run_tc_ok(tmp.path(), &["modify", "Main", "1", "priority=L", "project=Home"]);
    assert!(out.contains("modified: Buy groceries"));

    let parsed = run_tc_json(tmp.path(), &["list", "Main"]);
    assert_eq!(parsed[0]["tasks"][0]["priority"], "L");
    assert_eq!(parsed[0]["tasks"][0]["project"], "Home");
}

#[test]
fn test_modify_moves_module() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    run_tc_ok(tmp.path(), &["modify", "Main", "2", "module=Workouts"]);
    let parsed = run_tc_json(tmp.path(), &["list", "Workouts"]);
    assert_eq!(descriptions(&parsed[0]), vec!["Call mom", "Run 5k", "Stretch"]);
}

#[test]
fn test_modify_rejects_uuid() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    let err = run_tc_err(tmp.path(), &["modify", "Main", "1", "uuid=abc"]);
    assert!(err.contains("uuid"));
    let err = run_tc_err(tmp.path(), &["modify", "Main", "1", "priority"]);
    assert!(err.contains("expected KEY=VALUE"));
}

#[test]
fn test_delete() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    let out = run_tc_ok(tmp.path(), &["delete", "Workouts", "1"]);
    assert!(out.contains("deleted: Run 5k"));

    let parsed = run_tc_json(tmp.path(), &["list", "Workouts"]);
    assert_eq!(descriptions(&parsed[0]), vec!["Stretch"]);

    // Still on disk, marked deleted
    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tmp.path().join("tasks.json")).unwrap())
            .unwrap();
    let run = raw
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["description"] == "Run 5k")
        .unwrap();
    assert_eq!(run["status"], "deleted");
    assert_eq!(run["id"], 0);
}

#[test]
fn test_module_add_and_preset() {
    let tmp = tempfile::TempDir::new().unwrap();

    let out = run_tc_ok(tmp.path(), &["module", "add", "Fitness"]);
    assert!(out.contains("added module Fitness"));
    run_tc_ok(tmp.path(), &["module", "preset"]);
    let out = run_tc_ok(tmp.path(), &["module", "preset"]);
    assert!(out.contains("no new modules"));

    let parsed = run_tc_json(tmp.path(), &["modules"]);
    let names: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "Main",
            "Fitness",
            "Workouts",
            "Personal Finance",
            "Programming Project"
        ]
    );
}

#[test]
fn test_xp_set() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    run_tc_ok(tmp.path(), &["xp", "set", "tag", "outdoor", "2"]);
    let parsed = run_tc_json(tmp.path(), &["xp"]);
    assert_eq!(parsed["main"]["max_xp"], 35.5);

    run_tc_ok(tmp.path(), &["xp", "set", "priority", "none", "1"]);
    let parsed = run_tc_json(tmp.path(), &["xp"]);
    assert_eq!(parsed["main"]["max_xp"], 36.0);
    assert_eq!(parsed["main"]["cur_xp"], 1.0);

    let raw = fs::read_to_string(tmp.path().join("user_defined_xp.json")).unwrap();
    assert!(raw.contains("\"outdoor\": 2.0"));
}

#[test]
fn test_xp_malformed_config_falls_back() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());
    fs::write(tmp.path().join("user_defined_xp.json"), "{not json").unwrap();

    let parsed = run_tc_json(tmp.path(), &["xp"]);
    assert_eq!(parsed["main"]["max_xp"], 25.5);
}

#[test]
fn test_sort_persists() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());

    let out = run_tc_ok(tmp.path(), &["sort", "priority-descending"]);
    assert!(out.contains("default sort: priority-descending"));

    let config = fs::read_to_string(tmp.path().join("config.toml")).unwrap();
    assert!(config.contains("sort = \"priority-descending\""));

    let parsed = run_tc_json(tmp.path(), &["list", "Main"]);
    assert_eq!(descriptions(&parsed[0]), vec!["Buy groceries", "Call mom"]);
}

#[test]
fn test_malformed_app_config_is_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());
    fs::write(tmp.path().join("config.toml"), "sort = [").unwrap();

    let err = run_tc_err(tmp.path(), &["list"]);
    assert!(err.contains("could not parse"));
}

#[test]
fn test_lock_released_after_write() {
    let tmp = tempfile::TempDir::new().unwrap();

    run_tc_ok(tmp.path(), &["add", "one"]);
    run_tc_ok(tmp.path(), &["add", "two"]);
    assert!(tmp.path().join(".lock").exists());

    let parsed = run_tc_json(tmp.path(), &["list", "Main"]);
    assert_eq!(parsed[0]["tasks"].as_array().unwrap().len(), 2);
}
