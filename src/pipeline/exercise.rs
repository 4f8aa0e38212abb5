//! End-to-end execution of a single exercise.
//!
//! The phases always run in this order:
//!
//! 1. reset the workspace to `HEAD` (best effort)
//! 2. run the agent, with the progress monitor around the process
//! 3. restore every protected test file from `HEAD`
//! 4. run the tests, whatever the agent did
//! 5. aggregate both phases into an [`ExerciseOutcome`]
//!
//! Only a failure to build the agent command stops an exercise early.
//! Version-control failures are logged as warnings and never change a
//! phase's result.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::cleanup::stop_leftovers;
use super::config::BenchmarkConfig;
use super::outcome::{ExerciseOutcome, PhaseResult};
use super::report::write_agent_log;
use super::test_phase::TestPhase;
use crate::agents::{AgentSpec, CommandBuilder, Credentials};
use crate::error::PipelineError;
use crate::exercises::Exercise;
use crate::execution::ExecutionContext;
use crate::monitor::{ProgressMonitor, ProgressProbe};
use crate::process::{ProcessExecutor, TokioExecutor};
use crate::utils::{preview, sanitize_command};
use crate::workspace::GitWorkspace;

const OUTPUT_PREVIEW_LEN: usize = 500;

/// Runs exercises for one agent.
pub struct ExercisePipeline {
    spec: AgentSpec,
    credentials: Credentials,
    config: BenchmarkConfig,
    executor: Arc<dyn ProcessExecutor>,
}

impl ExercisePipeline {
    /// Creates a pipeline backed by a [`TokioExecutor`].
    pub fn new(spec: AgentSpec, credentials: Credentials, config: BenchmarkConfig) -> Self {
        Self {
            spec,
            credentials,
            config,
            executor: Arc::new(TokioExecutor::new()),
        }
    }

    /// Replaces the process executor.
    pub fn with_executor(mut self, executor: Arc<dyn ProcessExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub fn executor(&self) -> &dyn ProcessExecutor {
        self.executor.as_ref()
    }

    /// Runs every phase of `exercise`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Build` if no command can be built for the
    /// agent; in that case the workspace is not touched.
    pub async fn run(&self, exercise: &Exercise) -> Result<ExerciseOutcome, PipelineError> {
        let start = Instant::now();
        let builder = CommandBuilder::for_agent(&self.spec, &self.credentials)?;
        let workspace = GitWorkspace::new(&exercise.path);

        info!(
            exercise = %exercise.name,
            agent = %self.spec.kind,
            model = %self.spec.model,
            "Starting exercise"
        );

        self.reset(&workspace, exercise).await;
        let agent_phase = self.run_agent(&builder, &workspace, exercise).await;
        self.restore_test_files(&workspace, exercise).await;
        if self.config.verbose {
            self.log_agent_diff(&workspace, exercise).await;
        }
        let test_phase = self.test_phase().run(exercise).await;

        let outcome = ExerciseOutcome::new(&exercise.name, agent_phase, test_phase, start.elapsed());
        info!(
            exercise = %exercise.name,
            agent_success = outcome.agent_phase.success,
            test_success = outcome.test_phase.success,
            overall_success = outcome.overall_success,
            total_duration_ms = outcome.total_duration_ms,
            "Exercise finished"
        );
        Ok(outcome)
    }

    /// The test phase this pipeline uses, for test-only runs.
    pub fn test_phase(&self) -> TestPhase {
        TestPhase::new(self.config.clone(), Arc::clone(&self.executor))
    }

    async fn reset(&self, workspace: &GitWorkspace, exercise: &Exercise) {
        match workspace.reset().await {
            Ok(()) => info!(exercise = %exercise.name, "Workspace reset"),
            Err(e) => warn!(exercise = %exercise.name, error = %e, "Failed to reset workspace"),
        }
    }

    async fn run_agent(
        &self,
        builder: &CommandBuilder,
        workspace: &GitWorkspace,
        exercise: &Exercise,
    ) -> PhaseResult {
        let start = Instant::now();
        let core = builder.build_core_command(&exercise.instructions, &exercise.files);
        let ctx = ExecutionContext::new(&exercise.path)
            .with_protected_files(exercise.files.test_files.iter().cloned())
            .with_timeout(self.config.agent_timeout);
        let strategy = self.config.agent_strategy(&self.spec.container_id);
        let prepared = strategy.prepare(&core, &ctx);

        if self.config.verbose {
            info!(
                exercise = %exercise.name,
                strategy = strategy.name(),
                command = %sanitize_command(&prepared.argv),
                "Agent command"
            );
        }

        let mut monitor = self.config.show_progress.then(|| {
            ProgressMonitor::start(
                ProgressProbe::new(&exercise.name, workspace.clone()),
                self.config.progress_interval,
                None,
            )
        });

        let result = self.executor.execute(&prepared, ctx.timeout).await;
        if let Ok(result) = &result {
            stop_leftovers(self.executor.as_ref(), &prepared, result, &exercise.name).await;
        }

        if let Some(monitor) = monitor.as_mut() {
            monitor.stop().await;
        }
        let duration = start.elapsed();

        match &result {
            Ok(r) => self.save_agent_log(exercise, &r.stdout, &r.stderr).await,
            Err(e) => self.save_agent_log(exercise, "", &e.to_string()).await,
        }

        match result {
            Ok(result) => {
                let phase = PhaseResult::from_execution(&result, duration, ctx.timeout);
                if phase.success {
                    info!(exercise = %exercise.name, duration_ms = phase.duration_ms, "Agent finished");
                } else {
                    warn!(
                        exercise = %exercise.name,
                        duration_ms = phase.duration_ms,
                        exit_code = ?result.exit_code,
                        timed_out = result.timed_out,
                        "Agent failed"
                    );
                }
                if self.config.verbose {
                    info!(
                        exercise = %exercise.name,
                        stdout = %preview(&result.stdout, OUTPUT_PREVIEW_LEN),
                        stderr = %preview(&result.stderr, OUTPUT_PREVIEW_LEN),
                        "Agent output"
                    );
                }
                phase
            }
            Err(e) => {
                error!(exercise = %exercise.name, error = %e, "Agent could not be started");
                PhaseResult::spawn_failure(duration, &e)
            }
        }
    }

    async fn save_agent_log(&self, exercise: &Exercise, stdout: &str, stderr: &str) {
        let Some(dir) = &self.config.agent_log_dir else {
            return;
        };
        match write_agent_log(dir, &exercise.name, stdout, stderr).await {
            Ok(path) => debug!(exercise = %exercise.name, path = %path.display(), "Agent log saved"),
            Err(e) => warn!(exercise = %exercise.name, error = %e, "Failed to save agent log"),
        }
    }

    async fn restore_test_files(&self, workspace: &GitWorkspace, exercise: &Exercise) {
        for file in &exercise.files.test_files {
            match workspace.restore(file).await {
                Ok(()) => info!(exercise = %exercise.name, file = %file, "Restored test file"),
                Err(e) => warn!(
                    exercise = %exercise.name,
                    file = %file,
                    error = %e,
                    "Failed to restore test file"
                ),
            }
        }
    }

    async fn log_agent_diff(&self, workspace: &GitWorkspace, exercise: &Exercise) {
        match workspace.diff_head_excluding_lockfiles().await {
            Ok(diff) if diff.trim().is_empty() => {
                info!(exercise = %exercise.name, "No changes made by agent")
            }
            Ok(diff) => info!(exercise = %exercise.name, "Changes made by agent:\n{}", diff),
            Err(e) => warn!(exercise = %exercise.name, error = %e, "Failed to diff workspace"),
        }
    }
}
