//! The test phase: grade an exercise with its own test command.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use super::cleanup::stop_leftovers;
use super::config::BenchmarkConfig;
use super::outcome::PhaseResult;
use crate::agents::CoreCommand;
use crate::exercises::Exercise;
use crate::execution::ExecutionContext;
use crate::process::ProcessExecutor;
use crate::utils::{preview, sanitize_command};

const OUTPUT_PREVIEW_LEN: usize = 500;

/// Runs `sh -c <test_command>` in an exercise directory.
#[derive(Clone)]
pub struct TestPhase {
    config: BenchmarkConfig,
    executor: Arc<dyn ProcessExecutor>,
}

impl TestPhase {
    pub fn new(config: BenchmarkConfig, executor: Arc<dyn ProcessExecutor>) -> Self {
        Self { config, executor }
    }

    /// Replaces the process executor.
    pub fn with_executor(mut self, executor: Arc<dyn ProcessExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Runs the exercise's tests against the current workspace contents.
    pub async fn run(&self, exercise: &Exercise) -> PhaseResult {
        let start = Instant::now();
        let core = CoreCommand::shell(&self.config.test_command);
        let ctx = ExecutionContext::new(&exercise.path)
            .with_protected_files(exercise.files.test_files.iter().cloned())
            .with_timeout(self.config.effective_test_timeout());
        let strategy = self.config.test_strategy();
        let prepared = strategy.prepare(&core, &ctx);

        if self.config.verbose {
            info!(
                exercise = %exercise.name,
                strategy = strategy.name(),
                command = %sanitize_command(&prepared.argv),
                "Test command"
            );
        }

        let result = self.executor.execute(&prepared, ctx.timeout).await;
        if let Ok(result) = &result {
            stop_leftovers(self.executor.as_ref(), &prepared, result, &exercise.name).await;
        }
        let duration = start.elapsed();

        match result {
            Ok(result) => {
                let phase = PhaseResult::from_execution(&result, duration, ctx.timeout);
                if phase.success {
                    info!(exercise = %exercise.name, duration_ms = phase.duration_ms, "Tests passed");
                } else {
                    warn!(
                        exercise = %exercise.name,
                        duration_ms = phase.duration_ms,
                        exit_code = ?result.exit_code,
                        timed_out = result.timed_out,
                        "Tests failed"
                    );
                    if self.config.verbose {
                        info!(
                            exercise = %exercise.name,
                            stdout = %preview(&result.stdout, OUTPUT_PREVIEW_LEN),
                            stderr = %preview(&result.stderr, OUTPUT_PREVIEW_LEN),
                            "Test output"
                        );
                    }
                }
                phase
            }
            Err(e) => {
                error!(exercise = %exercise.name, error = %e, "Test command could not be started");
                PhaseResult::spawn_failure(duration, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::agents::FileList;
    use crate::process::TokioExecutor;

    fn exercise(dir: &std::path::Path) -> Exercise {
        Exercise::new("demo", dir, FileList::default(), "")
    }

    fn phase(test_command: &str) -> TestPhase {
        let config = BenchmarkConfig::default().with_test_command(test_command);
        TestPhase::new(config, Arc::new(TokioExecutor::new()))
    }

    #[tokio::test]
    async fn test_runs_in_exercise_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "").unwrap();

        let result = phase("test -f marker && echo ok").run(&exercise(dir.path())).await;
        assert!(result.success);
        assert_eq!(result.output.as_deref(), Some("ok\n"));
    }

    #[tokio::test]
    async fn test_failure_carries_streams() {
        let dir = tempfile::tempdir().unwrap();
        let result = phase("echo fail-out; echo fail-err >&2; exit 1")
            .run(&exercise(dir.path()))
            .await;
        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.contains("STDOUT: fail-out"));
        assert!(error.contains("STDERR: fail-err"));
    }

    #[tokio::test]
    async fn test_agent_timeout_bounds_tests_without_test_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let config = BenchmarkConfig::default()
            .with_test_command("sleep 10")
            .with_agent_timeout(Some(Duration::from_secs(1)));

        let start = std::time::Instant::now();
        let result = TestPhase::new(config, Arc::new(TokioExecutor::new()))
            .run(&exercise(dir.path()))
            .await;

        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(!result.success);
        assert!(result
            .error
            .unwrap()
            .starts_with("Process timed out after 1 seconds"));
    }
}
