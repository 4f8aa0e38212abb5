//! Per-phase and per-exercise results.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExecError;
use crate::process::executor::format_secs;
use crate::process::ExecutionResult;

/// Result of one phase (agent or test) of an exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseResult {
    /// Whether the phase succeeded.
    pub success: bool,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Failure description, including captured output when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Captured stdout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl PhaseResult {
    /// Creates a successful phase result.
    pub fn success(duration: Duration, output: impl Into<String>) -> Self {
        Self {
            success: true,
            duration_ms: millis(duration),
            error: None,
            output: Some(output.into()),
        }
    }

    /// Creates a failed phase result.
    pub fn failure(duration: Duration, error: impl Into<String>) -> Self {
        Self {
            success: false,
            duration_ms: millis(duration),
            error: Some(error.into()),
            output: None,
        }
    }

    /// Derives a phase result from a finished process.
    ///
    /// Success means exit code 0 without a timeout. A timed-out phase's
    /// error starts with the configured limit; any other failure carries the
    /// captured stdout and stderr.
    pub fn from_execution(
        result: &ExecutionResult,
        duration: Duration,
        timeout: Option<Duration>,
    ) -> Self {
        if result.is_success() {
            return Self::success(duration, result.stdout.clone());
        }

        let streams = format!("STDOUT: {}\nSTDERR: {}", result.stdout, result.stderr);
        let error = if result.timed_out {
            let secs = timeout.map(format_secs).unwrap_or_else(|| "0".to_string());
            format!("Process timed out after {} seconds\n{}", secs, streams)
        } else {
            streams
        };

        Self {
            output: Some(result.stdout.clone()),
            ..Self::failure(duration, error)
        }
    }

    /// Records a process that could not be started.
    pub fn spawn_failure(duration: Duration, err: &ExecError) -> Self {
        Self::failure(duration, err.to_string())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Aggregate result of one exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseOutcome {
    pub exercise: String,
    pub agent_phase: PhaseResult,
    pub test_phase: PhaseResult,
    /// `agent_phase.success && test_phase.success`.
    pub overall_success: bool,
    pub total_duration_ms: u64,
}

impl ExerciseOutcome {
    /// Combines the two phases.
    pub fn new(
        exercise: impl Into<String>,
        agent_phase: PhaseResult,
        test_phase: PhaseResult,
        total: Duration,
    ) -> Self {
        let overall_success = agent_phase.success && test_phase.success;
        Self {
            exercise: exercise.into(),
            agent_phase,
            test_phase,
            overall_success,
            total_duration_ms: millis(total),
        }
    }
}

/// Result of a test-only run of one exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOnlyOutcome {
    pub exercise: String,
    pub test_phase: PhaseResult,
}

pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec(exit_code: Option<i32>, timed_out: bool) -> ExecutionResult {
        ExecutionResult {
            exit_code,
            stdout: "out".to_string(),
            stderr: "err".to_string(),
            timed_out,
        }
    }

    #[test]
    fn test_success_requires_exit_zero() {
        let phase = PhaseResult::from_execution(&exec(Some(0), false), Duration::from_millis(5), None);
        assert!(phase.success);
        assert_eq!(phase.output.as_deref(), Some("out"));
        assert_eq!(phase.error, None);

        let phase = PhaseResult::from_execution(&exec(Some(2), false), Duration::ZERO, None);
        assert!(!phase.success);
        assert_eq!(phase.error.as_deref(), Some("STDOUT: out\nSTDERR: err"));
    }

    #[test]
    fn test_signal_without_exit_code_fails() {
        let phase = PhaseResult::from_execution(&exec(None, false), Duration::ZERO, None);
        assert!(!phase.success);
    }

    #[test]
    fn test_timeout_message_names_limit() {
        let phase = PhaseResult::from_execution(
            &exec(Some(124), true),
            Duration::from_secs(30),
            Some(Duration::from_secs(30)),
        );
        assert!(!phase.success);
        assert!(phase
            .error
            .unwrap()
            .starts_with("Process timed out after 30 seconds"));
    }

    #[test]
    fn test_sub_second_timeout_is_not_truncated() {
        let phase = PhaseResult::from_execution(
            &exec(Some(124), true),
            Duration::from_millis(500),
            Some(Duration::from_millis(500)),
        );
        assert!(phase
            .error
            .unwrap()
            .starts_with("Process timed out after 0.5 seconds"));
    }

    #[test]
    fn test_spawn_failure_keeps_raw_message() {
        let err = ExecError::Spawn {
            program: "goose".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let phase = PhaseResult::spawn_failure(Duration::from_millis(3), &err);
        assert!(!phase.success);
        assert_eq!(phase.error, Some(err.to_string()));
        assert_eq!(phase.duration_ms, 3);
    }

    #[test]
    fn test_overall_success_is_conjunction() {
        let ok = PhaseResult::success(Duration::ZERO, "");
        let bad = PhaseResult::failure(Duration::ZERO, "boom");

        assert!(ExerciseOutcome::new("a", ok.clone(), ok.clone(), Duration::ZERO).overall_success);
        assert!(!ExerciseOutcome::new("a", ok.clone(), bad.clone(), Duration::ZERO).overall_success);
        assert!(!ExerciseOutcome::new("a", bad.clone(), ok, Duration::ZERO).overall_success);
    }

    #[test]
    fn test_serialization_skips_missing_fields() {
        let json = serde_json::to_value(PhaseResult::failure(Duration::from_millis(7), "x")).unwrap();
        assert_eq!(json["duration_ms"], 7);
        assert!(json.get("output").is_none());
    }
}
