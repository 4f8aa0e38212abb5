//! agent-bench: benchmark harness for AI coding agents.
//!
//! This library runs an external coding agent against practice exercises,
//! protects the exercises' test files from tampering and grades the result
//! with each exercise's own test suite.

// Core modules
pub mod agents;
pub mod cli;
pub mod error;
pub mod execution;
pub mod exercises;
pub mod monitor;
pub mod pipeline;
pub mod process;
pub mod utils;
pub mod workspace;

// Re-export commonly used types
pub use agents::{AgentKind, AgentSpec, CommandBuilder, CoreCommand, Credentials, FileList};
pub use error::{
    BuildError, ConfigError, ExecError, ExerciseError, PipelineError, ReportError, VcsError,
};
pub use execution::{ExecutionContext, ExecutionStrategy, PreparedCommand};
pub use pipeline::{BenchmarkConfig, BenchmarkRunner, ExerciseOutcome, ExercisePipeline, PhaseResult};
pub use process::{ExecutionResult, ProcessExecutor, TokioExecutor};
