//! Exercise execution pipeline.
//!
//! This module runs agents against exercises and grades the result.
//!
//! # Architecture
//!
//! - **ExercisePipeline**: runs one exercise through reset, agent, restore,
//!   test and aggregate phases
//! - **TestPhase**: the grading step, also used on its own by `TestOnlyRunner`
//! - **BenchmarkRunner**: selects exercises and runs them sequentially
//! - **Config**: timeouts, isolation, progress and pacing
//! - **Report**: JSON export of a run's summary and per-exercise agent logs
//! - **Cleanup**: removal of containers left behind by a timed-out phase
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_bench::agents::{AgentKind, AgentSpec, Credentials};
//! use agent_bench::exercises::ExerciseReader;
//! use agent_bench::pipeline::{BenchmarkConfig, BenchmarkRunner, ExercisePipeline, ExerciseSelection};
//! use std::time::Duration;
//!
//! let config = BenchmarkConfig::new()
//!     .with_agent_timeout(Some(Duration::from_secs(600)))
//!     .with_progress(true);
//! let spec = AgentSpec::new(AgentKind::Claude, "claude-sonnet-4", "agent-bench:latest");
//! let pipeline = ExercisePipeline::new(spec, Credentials::from_env(), config);
//!
//! let runner = BenchmarkRunner::new(ExerciseReader::new("./exercism-typescript"), pipeline);
//! let names = runner.select(&ExerciseSelection::Count(5)).await?;
//! let summary = runner.run(&names).await?;
//! println!("{} / {} solved", summary.overall_successes, summary.total);
//! ```

pub mod cleanup;
pub mod config;
pub mod exercise;
pub mod outcome;
pub mod report;
pub mod runner;
pub mod test_phase;

pub use config::{BenchmarkConfig, DEFAULT_CONTAINER_IMAGE, DEFAULT_TEST_COMMAND};
pub use exercise::ExercisePipeline;
pub use outcome::{ExerciseOutcome, PhaseResult, TestOnlyOutcome};
pub use report::{default_report_name, export_json, write_agent_log, write_json, LATEST_REPORT_NAME};
pub use runner::{BenchmarkRunner, BenchmarkSummary, ExerciseSelection, TestOnlyRunner};
pub use test_phase::TestPhase;
