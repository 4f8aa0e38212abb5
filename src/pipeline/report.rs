//! Files written about a run: the JSON summary and per-exercise agent logs.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use super::runner::BenchmarkSummary;
use crate::error::ReportError;
use crate::utils::redact;

/// Copy of the most recent summary, overwritten by every export.
pub const LATEST_REPORT_NAME: &str = "latest.json";

/// Default file name for a summary: `benchmark-<agent>-<model>-<timestamp>.json`.
pub fn default_report_name(summary: &BenchmarkSummary) -> String {
    let model: String = summary
        .model
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    format!(
        "benchmark-{}-{}-{}.json",
        summary.agent,
        model,
        summary.started_at.format("%Y-%m-%dT%H-%M-%S")
    )
}

/// Writes `summary` as pretty JSON into `dir`, creating it if needed, and
/// refreshes `dir/latest.json` with the same content.
///
/// # Returns
///
/// The path of the timestamped file.
pub async fn export_json(summary: &BenchmarkSummary, dir: &Path) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(default_report_name(summary));
    write_json(summary, &path).await?;
    write_json(summary, &dir.join(LATEST_REPORT_NAME)).await?;
    Ok(path)
}

/// Writes `summary` as pretty JSON to `path`.
pub async fn write_json(summary: &BenchmarkSummary, path: &Path) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(summary)?;
    let mut file = fs::File::create(path).await?;
    file.write_all(json.as_bytes()).await?;
    file.sync_all().await?;
    info!(path = %path.display(), run_id = %summary.run_id, "Results exported");
    Ok(())
}

/// Writes the agent's output for `exercise` to `dir/<exercise>.log`, with
/// secrets masked.
pub async fn write_agent_log(
    dir: &Path,
    exercise: &str,
    stdout: &str,
    stderr: &str,
) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{}.log", exercise));
    let content = redact(&format!("STDOUT:\n{}\n\nSTDERR:\n{}", stdout, stderr));
    fs::write(&path, content).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::agents::AgentKind;
    use crate::pipeline::{ExerciseOutcome, PhaseResult};

    fn summary() -> BenchmarkSummary {
        let ok = PhaseResult::success(Duration::from_millis(5), "done");
        let started = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 5).unwrap();
        BenchmarkSummary::new(
            AgentKind::Claude,
            "anthropic/claude-sonnet-4",
            Some("anthropic".to_string()),
            started,
            vec![ExerciseOutcome::new("two-fer", ok.clone(), ok, Duration::from_millis(10))],
        )
    }

    #[test]
    fn test_default_report_name() {
        assert_eq!(
            default_report_name(&summary()),
            "benchmark-claude-anthropic_claude-sonnet-4-2025-03-01T12-30-05.json"
        );
    }

    #[tokio::test]
    async fn test_export_json_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("results/nested");
        let summary = summary();

        let path = export_json(&summary, &out).await.unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(value["agent"], "claude");
        assert_eq!(value["provider"], "anthropic");
        assert_eq!(value["run_id"], summary.run_id.to_string());
        assert_eq!(value["outcomes"][0]["exercise"], "two-fer");
        assert_eq!(value["outcomes"][0]["overall_success"], true);
    }

    #[tokio::test]
    async fn test_export_json_refreshes_latest() {
        let dir = tempfile::tempdir().unwrap();
        let first = summary();
        let second = summary();

        export_json(&first, dir.path()).await.unwrap();
        let path = export_json(&second, dir.path()).await.unwrap();

        let latest = std::fs::read_to_string(dir.path().join(LATEST_REPORT_NAME)).unwrap();
        assert_eq!(latest, std::fs::read_to_string(path).unwrap());
        let value: serde_json::Value = serde_json::from_str(&latest).unwrap();
        assert_eq!(value["run_id"], second.run_id.to_string());
    }

    #[tokio::test]
    async fn test_agent_log_layout_and_redaction() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("claude/logs");

        let path = write_agent_log(
            &logs,
            "two-fer",
            "using ANTHROPIC_API_KEY=sk-ant-abcdefghijklmnop",
            "warning",
        )
        .await
        .unwrap();

        assert_eq!(path, logs.join("two-fer.log"));
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("STDOUT:\nusing ANTHROPIC_API_KEY=***"));
        assert!(content.ends_with("\n\nSTDERR:\nwarning"));
        assert!(!content.contains("abcdefghijklmnop"));
    }
}
