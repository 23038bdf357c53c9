//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data
//! directory and inspects stdout, stderr and the exit code.

use std::path::Path;
use std::process::Command;

use chrono::Local;
use distill_core::storage::database::STATE_KEY;
use distill_core::Database;
use serde_json::Value;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_distill"))
        .args(args)
        .env("DISTILL_DATA_DIR", data_dir)
        .env_remove("DISTILL_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout is not JSON")
}

fn add_task(data_dir: &Path, args: &[&str]) -> String {
    let mut full = vec!["task", "add"];
    full.extend_from_slice(args);
    let task = run_json(data_dir, &full);
    task["id"].as_str().unwrap().to_string()
}

#[test]
fn test_task_add_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(dir.path(), &["task", "add", "Water plants"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("Task created:"));
    let task: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(task["title"], "Water plants");
    assert_eq!(task["priority"], 2);
    assert_eq!(task["status"], 1);

    let id = task["id"].as_str().unwrap();
    let fetched = run_json(dir.path(), &["task", "get", id]);
    assert_eq!(fetched, task);
}

#[test]
fn test_task_add_rejects_empty_title() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["task", "add", "   "]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_task_get_unknown_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["task", "get", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("task not found"));
}

#[test]
fn test_task_list_filter_and_sort() {
    let dir = tempfile::tempdir().unwrap();
    add_task(dir.path(), &["Someday", "--priority", "low"]);
    add_task(dir.path(), &["Urgent", "--priority", "high", "--due", "2020-01-01"]);

    let overdue = run_json(dir.path(), &["task", "list", "--filter", "overdue"]);
    let overdue = overdue.as_array().unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0]["title"], "Urgent");

    let by_due = run_json(dir.path(), &["task", "list", "--sort", "due-date", "--order", "asc"]);
    assert_eq!(by_due[0]["title"], "Urgent");
    assert_eq!(by_due[1]["title"], "Someday");
}

#[test]
fn test_task_top_skips_completed() {
    let dir = tempfile::tempdir().unwrap();
    add_task(dir.path(), &["Done already", "--priority", "high", "--status", "completed"]);
    add_task(dir.path(), &["Low", "--priority", "low"]);
    add_task(dir.path(), &["Doing", "--status", "in-progress"]);

    let top = run_json(dir.path(), &["task", "top", "--count", "5"]);
    let titles: Vec<_> = top
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["Doing", "Low"]);
    assert_eq!(top[0]["score"], 350);
}

#[test]
fn test_task_edit_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let id = add_task(dir.path(), &["Draft", "--due", "2030-01-01"]);

    let edited = run_json(
        dir.path(),
        &["task", "edit", &id, "--title", "Final", "--clear-due"],
    );
    assert_eq!(edited["title"], "Final");
    assert!(edited.get("dueDate").is_none());

    let (stdout, _, code) = run_cli(dir.path(), &["task", "delete", &id]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Task deleted"));
    let (_, _, code) = run_cli(dir.path(), &["task", "delete", &id]);
    assert_eq!(code, 1);
}

#[test]
fn test_notify_complete_marks_task() {
    let dir = tempfile::tempdir().unwrap();
    let id = add_task(dir.path(), &["Write report"]);

    let outcomes = run_json(
        dir.path(),
        &["notify", "action", "complete", "--task-id", &id, "--title", "Write report"],
    );
    assert_eq!(outcomes[0]["outcome"], "task_completed");

    let task = run_json(dir.path(), &["task", "get", &id]);
    assert_eq!(task["status"], 3);
}

#[test]
fn test_notify_rejects_unknown_action() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["notify", "action", "default"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown notification action"));
}

#[test]
fn test_settings_validation() {
    let dir = tempfile::tempdir().unwrap();
    let settings = run_json(dir.path(), &["settings", "show"]);
    assert_eq!(settings["timeDuration"], 25);

    let settings = run_json(dir.path(), &["settings", "set", "--duration", "50"]);
    assert_eq!(settings["timeDuration"], 50);

    let (_, _, code) = run_cli(dir.path(), &["settings", "set", "--duration", "500"]);
    assert_eq!(code, 1);
    let settings = run_json(dir.path(), &["settings", "show"]);
    assert_eq!(settings["timeDuration"], 50);
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "today.top_count"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "3");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "today.top_count", "4"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "today.top_count"]);
    assert_eq!(stdout.trim(), "4");

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "ui.dark_mode"]);
    assert_eq!(code, 1);
}

#[test]
fn test_stats_overview() {
    let dir = tempfile::tempdir().unwrap();
    add_task(dir.path(), &["One", "--priority", "high"]);
    add_task(dir.path(), &["Two", "--status", "completed"]);

    let stats = run_json(dir.path(), &["stats"]);
    assert_eq!(stats["total_tasks"], 2);
    assert_eq!(stats["status"]["completed"], 1);
    assert_eq!(stats["priority"]["high"], 1);
    assert_eq!(stats["last_7_days"].as_array().unwrap().len(), 7);
}

#[test]
fn test_timer_rejects_unknown_task() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "run", "--task", "ghost"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("task not found"));
}

fn write_state(data_dir: &Path, raw: &str) {
    let db = Database::open_at(&data_dir.join("distill.db")).unwrap();
    db.kv_set(STATE_KEY, raw).unwrap();
}

fn read_state(data_dir: &Path) -> Option<String> {
    let db = Database::open_at(&data_dir.join("distill.db")).unwrap();
    db.kv_get(STATE_KEY).unwrap()
}

#[test]
fn test_read_only_command_leaves_document_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let today = Local::now().date_naive().format("%Y-%m-%d");
    let raw = format!(
        r#"{{ "tasks": [], "sessions": [], "date": "{today}", "extra": "kept verbatim" }}"#
    );
    write_state(dir.path(), &raw);

    run_json(dir.path(), &["task", "list"]);
    assert_eq!(read_state(dir.path()).as_deref(), Some(raw.as_str()));
}

#[test]
fn test_bad_setting_does_not_lose_tasks() {
    let dir = tempfile::tempdir().unwrap();
    write_state(
        dir.path(),
        r#"{"tasks": [{"id": "a", "title": "Keep me", "createdAt": "2026-05-01T08:00:00Z"}],
            "timeDuration": "thirty"}"#,
    );

    let tasks = run_json(dir.path(), &["task", "list"]);
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["title"], "Keep me");

    let stored: Value = serde_json::from_str(&read_state(dir.path()).unwrap()).unwrap();
    assert_eq!(stored["tasks"][0]["id"], "a");
    assert_eq!(stored["timeDuration"], 25);
}
