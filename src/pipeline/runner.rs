//! Benchmark runner: exercise selection and sequential execution.
//!
//! Exercises run strictly one after another, with a fixed pause between
//! two consecutive exercises to ease pressure on rate-limited model APIs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use super::config::BenchmarkConfig;
use super::exercise::ExercisePipeline;
use super::outcome::{ExerciseOutcome, PhaseResult, TestOnlyOutcome};
use super::test_phase::TestPhase;
use crate::agents::{detect_version, AgentKind};
use crate::error::{ExerciseError, PipelineError};
use crate::exercises::{Exercise, ExerciseReader};
use crate::process::{ProcessExecutor, TokioExecutor};

/// Which exercises to run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExerciseSelection {
    /// Only the first available exercise.
    #[default]
    FirstOnly,
    /// One named exercise.
    Single(String),
    /// Several named exercises, in the given order.
    List(Vec<String>),
    /// The first `n` exercises.
    Count(usize),
}

impl ExerciseSelection {
    /// Resolves the selection against the available exercise names.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::NotFound` listing every unknown name.
    pub fn resolve(&self, available: &[String]) -> Result<Vec<String>, ExerciseError> {
        match self {
            Self::FirstOnly => Ok(available.iter().take(1).cloned().collect()),
            Self::Count(n) => Ok(available.iter().take(*n).cloned().collect()),
            Self::Single(name) => Self::List(vec![name.clone()]).resolve(available),
            Self::List(names) => {
                let missing: Vec<&str> = names
                    .iter()
                    .filter(|n| !available.contains(n))
                    .map(String::as_str)
                    .collect();
                if missing.is_empty() {
                    Ok(names.clone())
                } else {
                    Err(ExerciseError::NotFound(missing.join(", ")))
                }
            }
        }
    }
}

impl std::str::FromStr for ExerciseSelection {
    type Err = std::convert::Infallible;

    /// Parses `--exercise` values: a count (`5`), a comma-separated list
    /// (`acronym,bob`) or a single name. Path-like entries
    /// (`exercises/practice/bob`) keep only their last segment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::FirstOnly);
        }
        if let Ok(n) = s.parse::<usize>() {
            return Ok(Self::Count(n));
        }
        let names: Vec<String> = s
            .split(',')
            .map(|entry| entry.trim().trim_end_matches('/'))
            .map(|entry| entry.rsplit('/').next().unwrap_or(entry).to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Ok(match names.len() {
            0 => Self::FirstOnly,
            1 if !s.contains(',') => Self::Single(names.into_iter().next().unwrap_or_default()),
            _ => Self::List(names),
        })
    }
}

/// Aggregate results of a benchmark run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkSummary {
    pub run_id: Uuid,
    pub agent: AgentKind,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Version reported by the agent CLI; absent for the custom agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_version: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub agent_successes: usize,
    pub test_successes: usize,
    pub overall_successes: usize,
    /// Share of exercises with overall success, in percent.
    pub success_rate: f64,
    pub total_duration_ms: u64,
    pub outcomes: Vec<ExerciseOutcome>,
}

impl BenchmarkSummary {
    /// Computes the summary counters from `outcomes`.
    pub fn new(
        agent: AgentKind,
        model: impl Into<String>,
        provider: Option<String>,
        started_at: DateTime<Utc>,
        outcomes: Vec<ExerciseOutcome>,
    ) -> Self {
        let total = outcomes.len();
        let agent_successes = outcomes.iter().filter(|o| o.agent_phase.success).count();
        let test_successes = outcomes.iter().filter(|o| o.test_phase.success).count();
        let overall_successes = outcomes.iter().filter(|o| o.overall_success).count();
        let success_rate = if total > 0 {
            overall_successes as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            run_id: Uuid::new_v4(),
            agent,
            model: model.into(),
            provider,
            agent_version: None,
            started_at,
            finished_at: Utc::now(),
            total,
            agent_successes,
            test_successes,
            overall_successes,
            success_rate,
            total_duration_ms: outcomes.iter().map(|o| o.total_duration_ms).sum(),
            outcomes,
        }
    }

    /// Records the agent CLI version.
    pub fn with_agent_version(mut self, version: Option<String>) -> Self {
        self.agent_version = version;
        self
    }
}

/// Runs a selection of exercises through an [`ExercisePipeline`].
pub struct BenchmarkRunner {
    reader: ExerciseReader,
    pipeline: ExercisePipeline,
}

impl BenchmarkRunner {
    pub fn new(reader: ExerciseReader, pipeline: ExercisePipeline) -> Self {
        Self { reader, pipeline }
    }

    pub fn reader(&self) -> &ExerciseReader {
        &self.reader
    }

    /// Resolves `selection` against the exercises on disk.
    pub async fn select(&self, selection: &ExerciseSelection) -> Result<Vec<String>, ExerciseError> {
        let available = self.reader.list().await?;
        let selected = selection.resolve(&available)?;
        info!(
            selected = selected.len(),
            available = available.len(),
            "Selected exercises"
        );
        Ok(selected)
    }

    /// Runs the agent benchmark over `names`.
    ///
    /// # Errors
    ///
    /// Fails if an exercise directory cannot be read or if no command can
    /// be built for the agent.
    pub async fn run(&self, names: &[String]) -> Result<BenchmarkSummary, PipelineError> {
        let started_at = Utc::now();
        let spec = self.pipeline.spec();
        let agent_version = detect_version(spec.kind, self.pipeline.executor()).await;
        if let Some(version) = &agent_version {
            info!(agent = %spec.kind, version = %version, "Agent version");
        }
        let delay = self.pipeline.config().exercise_delay;
        let mut outcomes = Vec::with_capacity(names.len());

        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                pause(delay).await;
            }
            info!(exercise = %name, index = i + 1, total = names.len(), "Running exercise");
            outcomes.push(self.run_one(name).await?);
        }

        Ok(BenchmarkSummary::new(
            spec.kind,
            &spec.model,
            spec.provider.clone(),
            started_at,
            outcomes,
        )
        .with_agent_version(agent_version))
    }

    async fn run_one(&self, name: &str) -> Result<ExerciseOutcome, PipelineError> {
        let start = Instant::now();
        let custom = self.pipeline.config().custom_instruction.as_deref();
        let files = self.reader.file_list(name).await?;

        match self.reader.instructions(name, custom).await {
            Ok(instructions) => {
                let exercise = Exercise::new(name, self.reader.exercise_path(name), files, instructions);
                self.pipeline.run(&exercise).await
            }
            Err(e) => {
                // the agent cannot be briefed, but the tests are still measured
                error!(exercise = %name, error = %e, "Failed to load instructions");
                let exercise = Exercise::new(name, self.reader.exercise_path(name), files, "");
                let test_phase = self.pipeline.test_phase().run(&exercise).await;
                Ok(ExerciseOutcome::new(
                    name,
                    PhaseResult::failure(start.elapsed(), e.to_string()),
                    test_phase,
                    start.elapsed(),
                ))
            }
        }
    }
}

/// Runs only the test phase, against the current workspace contents.
pub struct TestOnlyRunner {
    reader: ExerciseReader,
    test_phase: TestPhase,
    delay: Duration,
}

impl TestOnlyRunner {
    pub fn new(reader: ExerciseReader, config: BenchmarkConfig) -> Self {
        let delay = config.exercise_delay;
        Self {
            reader,
            test_phase: TestPhase::new(config, Arc::new(TokioExecutor::new())),
            delay,
        }
    }

    /// Replaces the process executor.
    pub fn with_executor(mut self, executor: Arc<dyn ProcessExecutor>) -> Self {
        self.test_phase = self.test_phase.with_executor(executor);
        self
    }

    /// Resolves `selection` against the exercises on disk.
    pub async fn select(&self, selection: &ExerciseSelection) -> Result<Vec<String>, ExerciseError> {
        selection.resolve(&self.reader.list().await?)
    }

    /// Tests every exercise in `names`, one after another.
    pub async fn run(&self, names: &[String]) -> Result<Vec<TestOnlyOutcome>, ExerciseError> {
        let mut outcomes = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                pause(self.delay).await;
            }
            let files = self.reader.file_list(name).await?;
            let exercise = Exercise::new(name, self.reader.exercise_path(name), files, "");
            outcomes.push(TestOnlyOutcome {
                exercise: name.clone(),
                test_phase: self.test_phase.run(&exercise).await,
            });
        }
        Ok(outcomes)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::agents::{AgentSpec, Credentials};
    use crate::error::ExecError;
    use crate::execution::PreparedCommand;
    use crate::process::ExecutionResult;

    /// Answers every command as a CLI printing its version.
    struct VersionExecutor;

    #[async_trait]
    impl ProcessExecutor for VersionExecutor {
        async fn execute(
            &self,
            command: &PreparedCommand,
            _timeout: Option<Duration>,
        ) -> Result<ExecutionResult, ExecError> {
            let stdout = format!("{} 1.4.2\n", command.argv[0]);
            Ok(ExecutionResult::exited(Some(0), stdout, ""))
        }
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_selection_defaults_to_first() {
        let available = names(&["acronym", "bob", "two-fer"]);
        assert_eq!(
            ExerciseSelection::default().resolve(&available).unwrap(),
            names(&["acronym"])
        );
        assert!(ExerciseSelection::default().resolve(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_selection_count_is_capped() {
        let available = names(&["acronym", "bob"]);
        assert_eq!(
            ExerciseSelection::Count(5).resolve(&available).unwrap(),
            available
        );
    }

    #[test]
    fn test_selection_rejects_unknown_names() {
        let available = names(&["acronym", "bob"]);
        let err = ExerciseSelection::List(names(&["bob", "nope", "zilch"]))
            .resolve(&available)
            .unwrap_err();
        assert_eq!(err.to_string(), "Exercise 'nope, zilch' not found");

        assert!(ExerciseSelection::Single("nope".into()).resolve(&available).is_err());
        assert_eq!(
            ExerciseSelection::Single("bob".into()).resolve(&available).unwrap(),
            names(&["bob"])
        );
    }

    #[test]
    fn test_selection_parsing() {
        assert_eq!("3".parse::<ExerciseSelection>().unwrap(), ExerciseSelection::Count(3));
        assert_eq!(
            "bob".parse::<ExerciseSelection>().unwrap(),
            ExerciseSelection::Single("bob".into())
        );
        assert_eq!(
            "exercises/practice/bob".parse::<ExerciseSelection>().unwrap(),
            ExerciseSelection::Single("bob".into())
        );
        assert_eq!(
            "acronym, practice/bob,".parse::<ExerciseSelection>().unwrap(),
            ExerciseSelection::List(names(&["acronym", "bob"]))
        );
        assert_eq!("".parse::<ExerciseSelection>().unwrap(), ExerciseSelection::FirstOnly);
    }

    #[test]
    fn test_summary_counts() {
        let ok = PhaseResult::success(Duration::from_millis(10), "");
        let bad = PhaseResult::failure(Duration::from_millis(10), "x");
        let outcomes = vec![
            ExerciseOutcome::new("a", ok.clone(), ok.clone(), Duration::from_millis(20)),
            ExerciseOutcome::new("b", ok.clone(), bad.clone(), Duration::from_millis(20)),
            ExerciseOutcome::new("c", bad, ok, Duration::from_millis(20)),
        ];
        let summary = BenchmarkSummary::new(AgentKind::Claude, "sonnet", None, Utc::now(), outcomes);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.agent_successes, 2);
        assert_eq!(summary.test_successes, 2);
        assert_eq!(summary.overall_successes, 1);
        assert!((summary.success_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.total_duration_ms, 60);
    }

    #[tokio::test]
    async fn test_summary_records_agent_version() {
        let dir = tempfile::tempdir().unwrap();
        let spec = AgentSpec::new(AgentKind::Goose, "gpt-4o", "img");
        let pipeline = ExercisePipeline::new(spec, Credentials::default(), BenchmarkConfig::default())
            .with_executor(Arc::new(VersionExecutor));

        let summary = BenchmarkRunner::new(ExerciseReader::new(dir.path()), pipeline)
            .run(&[])
            .await
            .unwrap();

        assert_eq!(summary.agent_version.as_deref(), Some("1.4.2"));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["agent_version"], "1.4.2");
    }

    #[test]
    fn test_empty_summary_rate_is_zero() {
        let summary = BenchmarkSummary::new(AgentKind::Aider, "gpt-4o", None, Utc::now(), vec![]);
        assert_eq!(summary.success_rate, 0.0);
    }
}
