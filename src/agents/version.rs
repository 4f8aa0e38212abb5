//! Agent CLI version detection.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use super::AgentKind;
use crate::execution::PreparedCommand;
use crate::process::ProcessExecutor;

/// Recorded when the version command fails or cannot be started.
pub const FALLBACK_VERSION: &str = "0.0.0";

/// Recorded when the version command prints no number at all.
pub const UNKNOWN_VERSION: &str = "unknown";

const VERSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Returns the binary whose `--version` identifies `kind`.
///
/// The custom agent is an arbitrary command and has none.
pub fn version_binary(kind: AgentKind) -> Option<&'static str> {
    match kind {
        AgentKind::Cursor => Some("cursor-agent"),
        AgentKind::Custom => None,
        other => Some(other.as_str()),
    }
}

/// Runs `<binary> --version` on the host and extracts the version.
///
/// Returns `None` for the custom agent.
pub async fn detect_version(kind: AgentKind, executor: &dyn ProcessExecutor) -> Option<String> {
    let binary = version_binary(kind)?;
    let command = PreparedCommand::new(vec![binary.to_string(), "--version".to_string()]);

    let version = match executor.execute(&command, Some(VERSION_TIMEOUT)).await {
        Ok(result) if result.is_success() => parse_version(&result.stdout),
        Ok(result) => {
            warn!(agent = %kind, stderr = %result.stderr.trim(), "Failed to detect agent version");
            FALLBACK_VERSION.to_string()
        }
        Err(e) => {
            warn!(agent = %kind, error = %e, "Failed to detect agent version");
            FALLBACK_VERSION.to_string()
        }
    };
    debug!(agent = %kind, version = %version, "Detected agent version");
    Some(version)
}

/// Extracts `x.y.z` from version output, padding `x.y` and `x` with zeros.
pub fn parse_version(output: &str) -> String {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(\d+\.\d+\.\d+)").expect("Invalid regex for full versions"),
            Regex::new(r"(\d+\.\d+)").expect("Invalid regex for short versions"),
            Regex::new(r"(\d+)").expect("Invalid regex for major versions"),
        ]
    });

    let output = output.trim();
    for (re, suffix) in patterns.iter().zip(["", ".0", ".0.0"]) {
        if let Some(m) = re.captures(output).and_then(|c| c.get(1)) {
            return format!("{}{}", m.as_str(), suffix);
        }
    }
    UNKNOWN_VERSION.to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::ExecError;
    use crate::process::ExecutionResult;

    struct FixedExecutor {
        answer: Option<ExecutionResult>,
        seen: Mutex<Vec<Vec<String>>>,
    }

    impl FixedExecutor {
        fn answering(answer: Option<ExecutionResult>) -> Self {
            Self {
                answer,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ProcessExecutor for FixedExecutor {
        async fn execute(
            &self,
            command: &PreparedCommand,
            _timeout: Option<Duration>,
        ) -> Result<ExecutionResult, ExecError> {
            self.seen.lock().unwrap().push(command.argv.clone());
            self.answer.clone().ok_or_else(|| ExecError::Spawn {
                program: command.argv[0].clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            })
        }
    }

    #[test]
    fn test_parse_version_fallbacks() {
        assert_eq!(parse_version("claude-code 1.0.98 (Claude Code)\n"), "1.0.98");
        assert_eq!(parse_version("aider v0.86"), "0.86.0");
        assert_eq!(parse_version("build 7"), "7.0.0");
        assert_eq!(parse_version("dev"), "unknown");
    }

    #[test]
    fn test_version_binaries() {
        assert_eq!(version_binary(AgentKind::Cursor), Some("cursor-agent"));
        assert_eq!(version_binary(AgentKind::Goose), Some("goose"));
        assert_eq!(version_binary(AgentKind::Custom), None);
    }

    #[tokio::test]
    async fn test_detect_version_runs_binary() {
        let executor =
            FixedExecutor::answering(Some(ExecutionResult::exited(Some(0), "goose 1.2.0\n", "")));
        let version = detect_version(AgentKind::Goose, &executor).await;

        assert_eq!(version.as_deref(), Some("1.2.0"));
        assert_eq!(executor.seen.lock().unwrap()[0], vec!["goose", "--version"]);
    }

    #[tokio::test]
    async fn test_detect_version_failures_fall_back() {
        let failing = FixedExecutor::answering(Some(ExecutionResult::exited(Some(1), "", "boom")));
        assert_eq!(
            detect_version(AgentKind::Codex, &failing).await.as_deref(),
            Some(FALLBACK_VERSION)
        );

        let missing = FixedExecutor::answering(None);
        assert_eq!(
            detect_version(AgentKind::Claude, &missing).await.as_deref(),
            Some(FALLBACK_VERSION)
        );

        assert_eq!(detect_version(AgentKind::Custom, &missing).await, None);
        assert!(missing.seen.lock().unwrap().len() == 1);
    }
}
