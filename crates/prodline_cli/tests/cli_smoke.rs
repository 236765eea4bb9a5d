use std::process::Command;

#[test]
fn cli_smoke_help() {
    let exe = env!("CARGO_BIN_EXE_prodline");
    let output = Command::new(exe)
        .arg("--help")
        .output()
        .expect("failed to run prodline --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("component"));
}

#[test]
fn cli_models_lists_catalog() {
    let exe = env!("CARGO_BIN_EXE_prodline");
    let output = Command::new(exe)
        .args(["models", "--json"])
        .output()
        .expect("failed to run models command");

    assert!(output.status.success());
    let models: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("models json");
    let keys: Vec<&str> = models
        .as_array()
        .expect("models array")
        .iter()
        .filter_map(|model| model["key"].as_str())
        .collect();
    assert_eq!(keys, vec!["79k", "109k", "129k", "139k"]);
}

#[test]
fn cli_rejects_unknown_subcommand() {
    let exe = env!("CARGO_BIN_EXE_prodline");
    let output = Command::new(exe)
        .arg("frobnicate")
        .output()
        .expect("failed to run prodline");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}
