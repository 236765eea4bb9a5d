use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("prodline-{nanos}-{file_name}"))
}

fn rfc3339(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap()
}

fn write_store(path: &PathBuf, components: serde_json::Value) {
    let content = serde_json::json!({
        "schema_version": 1,
        "revision": 7,
        "jobs": [{
            "id": "job-1",
            "name": "Unit A",
            "model": "79k",
            "startDate": "2025-03-03T00:00:00Z",
            "deadline": "2025-03-20T00:00:00Z",
            "status": "In Progress",
            "respUser": "Somchai",
            "createdAt": "2025-03-01T08:00:00Z",
            "updatedAt": "2025-03-01T08:00:00Z",
            "components": components
        }]
    });
    std::fs::write(path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
}

fn draft_component(id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "jobId": "job-1",
        "name": "Steel frame",
        "sequence": 0,
        "description": "Weld the galvanized steel frame",
        "status": "Draft",
        "startedAt": null,
        "finishedAt": null,
        "pausedAt": null,
        "pauseHistory": [],
        "totalTimeSpent": 0,
        "createdAt": "2025-03-01T08:00:00Z",
        "updatedAt": "2025-03-01T08:00:00Z"
    })
}

fn run(store_path: &PathBuf, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_prodline"))
        .args(args)
        .env("PRODLINE_STORE_PATH", store_path)
        .env("PRODLINE_CONFIG_PATH", temp_path("no-config.json"))
        .output()
        .expect("failed to run prodline")
}

fn stored_component(path: &PathBuf) -> serde_json::Value {
    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    stored["jobs"][0]["components"][0].clone()
}

#[test]
fn start_pause_resume_records_pause_history() {
    let store_path = temp_path("cli-pause.json");
    write_store(&store_path, serde_json::json!([draft_component("job-1-c0")]));

    let started = run(&store_path, &["component", "job-1-c0", "in-progress"]);
    assert!(started.status.success());
    let after_start = stored_component(&store_path);

    let paused = run(&store_path, &["component", "job-1-c0", "draft"]);
    assert!(paused.status.success());
    let after_pause = stored_component(&store_path);

    let resumed = run(&store_path, &["component", "job-1-c0", "in-progress", "--json"]);
    let after_resume = stored_component(&store_path);
    std::fs::remove_file(&store_path).ok();

    assert_eq!(after_start["status"], "In Progress");
    assert!(after_start["startedAt"].is_string());
    assert!(after_start["pauseHistory"].as_array().unwrap().is_empty());

    assert_eq!(after_pause["status"], "Draft");
    assert!(after_pause["pausedAt"].is_string());
    let pauses = after_pause["pauseHistory"].as_array().unwrap();
    assert_eq!(pauses.len(), 1);
    assert_eq!(pauses[0]["startedAt"], after_pause["pausedAt"]);
    assert!(pauses[0]["finishedAt"].is_null());

    assert!(resumed.status.success());
    let printed: serde_json::Value = serde_json::from_slice(&resumed.stdout).expect("json");
    assert_eq!(printed, after_resume);
    assert_eq!(after_resume["status"], "In Progress");
    assert!(after_resume["pausedAt"].is_null());
    assert!(after_resume["pauseHistory"][0]["finishedAt"].is_string());
    assert_eq!(after_resume["startedAt"], after_start["startedAt"]);
}

#[test]
fn done_command_subtracts_closed_pauses() {
    let store_path = temp_path("cli-done.json");
    let now = OffsetDateTime::now_utc();
    let mut component = draft_component("job-1-c0");
    component["status"] = "In Progress".into();
    component["startedAt"] = rfc3339(now - Duration::hours(2)).into();
    component["pauseHistory"] = serde_json::json!([{
        "startedAt": rfc3339(now - Duration::minutes(100)),
        "finishedAt": rfc3339(now - Duration::minutes(70))
    }]);
    write_store(&store_path, serde_json::json!([component]));

    let output = run(&store_path, &["component", "job-1-c0", "done"]);
    let stored = stored_component(&store_path);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Time spent: 90 min"));
    assert_eq!(stored["status"], "Done");
    assert_eq!(stored["totalTimeSpent"], 90);
    assert!(stored["finishedAt"].is_string());
}

#[test]
fn done_to_draft_needs_lenient_transitions() {
    let store_path = temp_path("cli-reopen.json");
    let mut component = draft_component("job-1-c0");
    component["status"] = "Done".into();
    component["startedAt"] = "2025-03-03T09:00:00Z".into();
    component["finishedAt"] = "2025-03-03T10:00:00Z".into();
    component["totalTimeSpent"] = 60.into();
    write_store(&store_path, serde_json::json!([component]));

    let strict = run(&store_path, &["component", "job-1-c0", "draft"]);
    let untouched = stored_component(&store_path);
    let lenient = run(
        &store_path,
        &[
            "component",
            "job-1-c0",
            "draft",
            "--config-override",
            "tracker.transitions=lenient",
        ],
    );
    let overwritten = stored_component(&store_path);
    std::fs::remove_file(&store_path).ok();

    assert!(!strict.status.success());
    let stderr = String::from_utf8_lossy(&strict.stderr);
    assert!(stderr.contains("ERROR: invalid_transition"));
    assert_eq!(untouched["status"], "Done");

    assert!(lenient.status.success());
    assert_eq!(overwritten["status"], "Draft");
    assert_eq!(overwritten["finishedAt"], "2025-03-03T10:00:00Z");
    assert_eq!(overwritten["totalTimeSpent"], 60);
}

#[test]
fn component_command_reports_missing_component() {
    let store_path = temp_path("cli-missing-component.json");
    write_store(&store_path, serde_json::json!([draft_component("job-1-c0")]));

    let output = run(&store_path, &["component", "job-1-c9", "done"]);
    std::fs::remove_file(&store_path).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: not_found - component not found"));
}

#[test]
fn component_command_rejects_unknown_status() {
    let store_path = temp_path("cli-bad-status.json");
    write_store(&store_path, serde_json::json!([draft_component("job-1-c0")]));

    let output = run(&store_path, &["component", "job-1-c0", "someday"]);
    let stored = stored_component(&store_path);
    std::fs::remove_file(&store_path).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
    assert_eq!(stored["status"], "Draft");
}
