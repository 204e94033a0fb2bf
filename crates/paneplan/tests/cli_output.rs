//! Integration tests for CLI output behavior
//!
//! The default behavior is quiet (no logs). Use -v/--verbose to enable logs.

use std::path::Path;
use std::process::{Command, Output};

const CONFIG: &str = r#"
[presets.pair]
name = "Pair"
description = "two panes side by side"

[presets.pair.layout]
type = "horizontal"
ratio = [3, 2]

[[presets.pair.layout.panes]]
name = "left"
command = "nvim"

[[presets.pair.layout.panes]]
name = "right"
"#;

const BROKEN: &str = r#"
[presets.bad]
name = "Bad"

[presets.bad.layout]
type = "vertical"
ratio = [1, 2, 3]

[[presets.bad.layout.panes]]
name = "a"

[[presets.bad.layout.panes]]
name = "b"
"#;

fn write_config(dir: &Path, content: &str) -> String {
    let path = dir.join("config.toml");
    std::fs::write(&path, content).expect("write config");
    path.display().to_string()
}

/// Run paneplan with a clean multiplexer environment and no RUST_LOG override.
fn run_paneplan(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_paneplan"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("TMUX")
        .env_remove("TMUX_PANE")
        .env_remove("WEZTERM_PANE")
        .output()
        .expect("Failed to execute paneplan")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "paneplan failed with exit code {:?}. stderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_list_stdout_is_clean() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);
    let output = run_paneplan(&["--config", &config, "list"]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stdout.contains("pair"), "got: {}", stdout);
    assert!(stdout.contains("two panes side by side"), "got: {}", stdout);
    assert!(
        !stdout.contains(r#""event":"#),
        "stdout should not contain JSON logs, got: {}",
        stdout
    );
    assert!(
        stderr.is_empty(),
        "Default quiet mode should have empty stderr, got: {}",
        stderr
    );
}

#[test]
fn test_verbose_logs_go_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);
    let output = run_paneplan(&["-v", "--config", &config, "list"]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!stdout.contains(r#""event":"#), "got: {}", stdout);
    assert!(
        stderr.contains("cli.list_completed"),
        "verbose mode should log events to stderr, got: {}",
        stderr
    );
}

#[test]
fn test_validate_prints_counts() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);
    let output = run_paneplan(&["--config", &config, "validate"]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("ok pair: 2 pane(s), 1 split(s), 2 step(s)"),
        "got: {}",
        stdout
    );
}

#[test]
fn test_validate_failure_reports_code_and_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), BROKEN);
    let output = run_paneplan(&["--config", &config, "validate", "bad"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.starts_with("error [RATIO_PANES_MISMATCH]: "),
        "got: {}",
        stderr
    );
}

#[test]
fn test_unknown_preset_reports_code() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);
    let output = run_paneplan(&["--config", &config, "apply", "nope", "--dry-run"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error [PRESET_NOT_FOUND]"), "got: {}", stderr);
}

#[test]
fn test_dry_run_prints_one_line_per_step() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);
    let output = run_paneplan(&[
        "--config", &config, "apply", "pair", "--dry-run", "--backend", "tmux",
    ]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines[0].starts_with("Dry run of 'pair' via tmux"), "got: {}", stdout);

    let split = lines
        .iter()
        .find(|line| line.contains("split-window"))
        .expect("split step");
    assert!(split.contains("-h -t root.0 -l 40%"), "got: {}", split);
    assert!(
        lines.iter().any(|line| line.contains("select-pane -t root.0")),
        "got: {}",
        stdout
    );
    assert!(
        lines.iter().any(|line| line.contains("nvim")),
        "got: {}",
        stdout
    );
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml").display().to_string();
    let output = run_paneplan(&["--config", &missing, "list"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error [CONFIG_IO_ERROR]"), "got: {}", stderr);
}
