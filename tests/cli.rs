//! Runs the `agent-bench` binary end to end against a temporary track.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=bench", "-c", "user.email=bench@localhost"])
        .args(args)
        .status()
        .unwrap();
    assert!(status.success(), "git {:?} failed", args);
}

fn track() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let exercise = dir.path().join("exercises/practice/two-fer");
    std::fs::create_dir_all(exercise.join(".docs")).unwrap();
    std::fs::write(exercise.join("two-fer.ts"), "// TODO\n").unwrap();
    std::fs::write(exercise.join("two-fer.test.ts"), "// original suite\n").unwrap();
    std::fs::write(exercise.join(".docs/instructions.md"), "One for X, one for me.").unwrap();
    git(dir.path(), &["init", "-q"]);
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-q", "-m", "track"]);
    dir
}

#[test]
fn test_json_output_stays_clean_with_progress() {
    let track = track();
    let out = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_agent-bench"))
        .args(["run", "--agent", "custom", "--local", "--json", "--show-progress"])
        .args(["--progress-interval", "1", "--delay", "0", "--exercise", "two-fer"])
        .args([
            "--agent-command",
            "cat > /dev/null; echo solved > two-fer.ts; sleep 2",
        ])
        .args(["--test-command", "grep -q solved two-fer.ts"])
        .arg("--exercism-path")
        .arg(track.path())
        .arg("--output-dir")
        .arg(out.path())
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "agent-bench failed: {}", stderr);

    // all of stdout is one JSON document
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["overall_successes"], 1);
    assert!(stderr.contains("Agent changed files"));

    let log = std::fs::read_to_string(out.path().join("custom/logs/two-fer.log")).unwrap();
    assert!(log.starts_with("STDOUT:\n"));
    let latest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.path().join("latest.json")).unwrap())
            .unwrap();
    assert_eq!(latest["run_id"], summary["run_id"]);
}
