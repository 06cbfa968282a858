use assert_cmd::Command;

#[test]
fn cli_help_runs() {
    let mut cmd = Command::cargo_bin("trial-scope").expect("binary exists");
    cmd.arg("--help").assert().success();
}

#[test]
fn tools_prints_every_schema() {
    let mut cmd = Command::cargo_bin("trial-scope").expect("binary exists");
    let output = cmd.arg("tools").output().expect("runs");
    assert!(output.status.success());
    let tools: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let names: Vec<&str> = tools
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|tool| tool["name"].as_str())
        .collect();
    assert_eq!(names, ["studies", "study", "drugLabeling"]);
}

#[test]
fn unknown_tool_fails() {
    let mut cmd = Command::cargo_bin("trial-scope").expect("binary exists");
    cmd.args(["tools", "--name", "nope"]).assert().failure();
}

#[test]
fn search_requires_a_question() {
    let mut cmd = Command::cargo_bin("trial-scope").expect("binary exists");
    cmd.arg("search").assert().failure();
}

#[test]
fn logs_stay_off_stdout() {
    let mut cmd = Command::cargo_bin("trial-scope").expect("binary exists");
    let output = cmd
        .env("RUST_LOG", "trace")
        .args(["tools", "--name", "study"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    let tool: serde_json::Value = serde_json::from_slice(&output.stdout).expect("clean json");
    assert_eq!(tool["name"], "study");
    assert!(String::from_utf8_lossy(&output.stderr).contains("starting command"));
}
