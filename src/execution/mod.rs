//! Execution strategies: where and how a [`CoreCommand`] runs.
//!
//! A strategy turns an agent-agnostic [`CoreCommand`] plus an
//! [`ExecutionContext`] into a [`PreparedCommand`] that the process executor
//! can spawn. Strategy choice is orthogonal to the agent: every builder's
//! output is valid input to every strategy.
//!
//! ```text
//! CommandBuilder → CoreCommand ─┬─ LocalStrategy ─────┬→ PreparedCommand → ProcessExecutor
//!                               └─ ContainerStrategy ─┘
//! ```

pub mod container;
pub mod local;
pub mod shell;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::agents::CoreCommand;

pub use container::{ContainerStrategy, VolumeMount, CONTAINER_WORKSPACE};
pub use local::LocalStrategy;

/// Per-phase facts a strategy needs about the exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Exercise directory on the host.
    pub exercise_path: PathBuf,
    /// Test files (relative to `exercise_path`) the agent must not alter.
    pub protected_test_files: BTreeSet<String>,
    /// Hard limit for the phase's process.
    pub timeout: Option<Duration>,
}

impl ExecutionContext {
    /// Creates a context with no protected files and no timeout.
    pub fn new(exercise_path: impl Into<PathBuf>) -> Self {
        Self {
            exercise_path: exercise_path.into(),
            protected_test_files: BTreeSet::new(),
            timeout: None,
        }
    }

    /// Sets the protected test files.
    pub fn with_protected_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected_test_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the exercise path made absolute against the current directory.
    pub fn absolute_path(&self) -> PathBuf {
        absolute(&self.exercise_path)
    }
}

/// Options applied when spawning a [`PreparedCommand`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnOptions {
    /// Working directory; inherits the caller's when `None`.
    pub cwd: Option<PathBuf>,
    /// Variables merged over the ambient environment.
    pub env: Option<BTreeMap<String, String>>,
}

/// A concrete, runnable command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedCommand {
    pub argv: Vec<String>,
    pub options: SpawnOptions,
    /// Command that stops whatever the run leaves behind when it is killed,
    /// such as a detached container.
    pub cleanup: Option<Vec<String>>,
}

impl PreparedCommand {
    /// Creates a prepared command with default spawn options.
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            options: SpawnOptions::default(),
            cleanup: None,
        }
    }

    /// Sets the cleanup command.
    pub fn with_cleanup(mut self, argv: Vec<String>) -> Self {
        self.cleanup = Some(argv);
        self
    }

    /// Returns the cleanup command as a runnable command, if there is one.
    pub fn cleanup_command(&self) -> Option<PreparedCommand> {
        self.cleanup.clone().map(PreparedCommand::new)
    }

    /// Sets the working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(cwd.into());
        self
    }

    /// Returns the program name, if any.
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}

/// The isolation strategy selected for a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Run on the host inside the exercise directory.
    Local(LocalStrategy),
    /// Run inside an ephemeral container with the exercise mounted.
    Container(ContainerStrategy),
}

impl ExecutionStrategy {
    /// Host execution.
    pub fn local() -> Self {
        Self::Local(LocalStrategy)
    }

    /// Container execution with the given image and the default runtime.
    pub fn container(image: impl Into<String>) -> Self {
        Self::Container(ContainerStrategy::new(image))
    }

    /// Transforms `core` into a runnable command for this strategy.
    pub fn prepare(&self, core: &CoreCommand, ctx: &ExecutionContext) -> PreparedCommand {
        match self {
            Self::Local(s) => s.prepare(core, ctx),
            Self::Container(s) => s.prepare(core, ctx),
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Container(_) => "container",
        }
    }
}

pub(crate) fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_keeps_absolute() {
        let ctx = ExecutionContext::new("/tmp/exercise");
        assert_eq!(ctx.absolute_path(), PathBuf::from("/tmp/exercise"));
    }

    #[test]
    fn test_absolute_path_joins_relative() {
        let ctx = ExecutionContext::new("exercises/practice/two-fer");
        let abs = ctx.absolute_path();
        assert!(abs.is_absolute());
        assert!(abs.ends_with("exercises/practice/two-fer"));
    }

    #[test]
    fn test_both_strategies_accept_any_core_command() {
        let core = CoreCommand::new(vec!["goose".into(), "run".into()]).with_env("A", "1");
        let ctx = ExecutionContext::new("/ex").with_protected_files(["a.test.ts"]);

        let local = ExecutionStrategy::local().prepare(&core, &ctx);
        assert_eq!(local.argv, core.argv);
        assert_eq!(local.cleanup_command(), None);

        let container = ExecutionStrategy::container("img").prepare(&core, &ctx);
        assert!(container.argv.ends_with(&core.argv));
    }
}
