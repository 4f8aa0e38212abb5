//! Error types for agent-bench operations.
//!
//! Defines the error taxonomy shared by the execution pipeline:
//! - Command construction for a given agent
//! - Process spawning and output capture
//! - Version-control operations on exercise workspaces
//! - Exercise discovery and instruction loading
//! - Configuration validation
//! - Report export
//!
//! Timeouts and non-zero exits are deliberately absent: they are ordinary
//! outcomes and are reported through `ExecutionResult` / `PhaseResult`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that prevent a Command Builder from producing a command.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Model name must not be empty")]
    EmptyModel,

    #[error("The custom agent requires a command (--agent-command)")]
    MissingCustomCommand,
}

/// Errors raised by the process executor.
///
/// Only setup defects end up here; a process that starts and then fails or
/// times out is reported as an `ExecutionResult`.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Cannot execute an empty command")]
    EmptyCommand,

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from version-control operations on a workspace.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("git {args} failed: {stderr}")]
    CommandFailed { args: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while reading exercises from disk.
#[derive(Debug, Error)]
pub enum ExerciseError {
    #[error("Exercise '{0}' not found")]
    NotFound(String),

    #[error("Failed to read exercise instructions for {exercise}: {source}")]
    Instructions {
        exercise: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read exercise directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors that can occur while writing benchmark reports.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that stop an exercise, or a whole run, before any phase runs.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Command build failed: {0}")]
    Build(#[from] BuildError),

    #[error(transparent)]
    Exercise(#[from] ExerciseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_names_program() {
        let err = ExecError::Spawn {
            program: "claude".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("claude"));
        assert!(msg.contains("No such file"));
    }

    #[test]
    fn test_pipeline_error_wraps_build_error() {
        let err: PipelineError = BuildError::UnknownAgent("bogus".to_string()).into();
        assert_eq!(err.to_string(), "Command build failed: Unknown agent: bogus");
    }
}
