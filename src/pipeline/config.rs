//! Benchmark configuration.
//!
//! Controls how each exercise is executed: the test command, per-phase
//! timeouts, where the agent and the tests run, progress monitoring, and
//! pacing between exercises.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::execution::container::DEFAULT_RUNTIME;
use crate::execution::{ContainerStrategy, ExecutionStrategy};
use crate::monitor::DEFAULT_PROGRESS_INTERVAL;

/// Command run inside the exercise directory to grade it.
pub const DEFAULT_TEST_COMMAND: &str = "corepack yarn && corepack yarn test";

/// Image used by the containerized strategy.
pub const DEFAULT_CONTAINER_IMAGE: &str = "agent-bench:latest";

/// Pause between two consecutive exercises.
pub const DEFAULT_EXERCISE_DELAY: Duration = Duration::from_secs(1);

/// Configuration for a benchmark run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Shell command that runs the exercise's tests.
    pub test_command: String,
    /// Hard limit for the agent process.
    pub agent_timeout: Option<Duration>,
    /// Hard limit for the test process. Falls back to `agent_timeout`.
    pub test_timeout: Option<Duration>,
    /// Run the agent inside a container.
    pub use_container: bool,
    /// Run the tests inside a container as well.
    pub tests_in_container: bool,
    /// Image for containerized phases.
    pub container_image: String,
    /// Container runtime binary.
    pub container_runtime: String,
    /// Start a progress monitor during the agent phase.
    pub show_progress: bool,
    /// Interval between progress checks.
    pub progress_interval: Duration,
    /// Pause between exercises.
    pub exercise_delay: Duration,
    /// Log commands, agent output and the post-agent diff.
    pub verbose: bool,
    /// Extra text appended to every exercise's instructions.
    pub custom_instruction: Option<String>,
    /// Directory receiving one `<exercise>.log` per agent run.
    pub agent_log_dir: Option<PathBuf>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            test_command: DEFAULT_TEST_COMMAND.to_string(),
            agent_timeout: None,
            test_timeout: None,
            use_container: true,
            tests_in_container: false,
            container_image: DEFAULT_CONTAINER_IMAGE.to_string(),
            container_runtime: DEFAULT_RUNTIME.to_string(),
            show_progress: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            exercise_delay: DEFAULT_EXERCISE_DELAY,
            verbose: false,
            custom_instruction: None,
            agent_log_dir: None,
        }
    }
}

impl BenchmarkConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.test_command.trim().is_empty() {
            return Err(invalid("test_command", "cannot be empty"));
        }
        if self.agent_timeout.is_some_and(|t| t.is_zero()) {
            return Err(invalid("agent_timeout", "must be greater than 0"));
        }
        if self.test_timeout.is_some_and(|t| t.is_zero()) {
            return Err(invalid("test_timeout", "must be greater than 0"));
        }
        if self.progress_interval.is_zero() {
            return Err(invalid("progress_interval", "must be greater than 0"));
        }
        if (self.use_container || self.tests_in_container) && self.container_image.trim().is_empty() {
            return Err(invalid("container_image", "cannot be empty when containers are used"));
        }
        if self.container_runtime.trim().is_empty() {
            return Err(invalid("container_runtime", "cannot be empty"));
        }
        Ok(())
    }

    /// Limit applied to the test process.
    pub fn effective_test_timeout(&self) -> Option<Duration> {
        self.test_timeout.or(self.agent_timeout)
    }

    /// Strategy for the agent phase.
    ///
    /// `agent_image` is the agent's own container; an empty value means
    /// `container_image`.
    pub fn agent_strategy(&self, agent_image: &str) -> ExecutionStrategy {
        if !self.use_container {
            return ExecutionStrategy::local();
        }
        if agent_image.trim().is_empty() {
            self.container_strategy(&self.container_image)
        } else {
            self.container_strategy(agent_image)
        }
    }

    /// Strategy for the test phase.
    pub fn test_strategy(&self) -> ExecutionStrategy {
        if self.tests_in_container {
            self.container_strategy(&self.container_image)
        } else {
            ExecutionStrategy::local()
        }
    }

    fn container_strategy(&self, image: &str) -> ExecutionStrategy {
        ExecutionStrategy::Container(
            ContainerStrategy::new(image).with_runtime(&self.container_runtime),
        )
    }

    /// Builder method to set the test command.
    pub fn with_test_command(mut self, command: impl Into<String>) -> Self {
        self.test_command = command.into();
        self
    }

    /// Builder method to set the agent timeout.
    pub fn with_agent_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.agent_timeout = timeout;
        self
    }

    /// Builder method to set the test timeout.
    pub fn with_test_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.test_timeout = timeout;
        self
    }

    /// Builder method to run the agent in a container or on the host.
    pub fn with_container(mut self, enabled: bool) -> Self {
        self.use_container = enabled;
        self
    }

    /// Builder method to run the tests in a container or on the host.
    pub fn with_tests_in_container(mut self, enabled: bool) -> Self {
        self.tests_in_container = enabled;
        self
    }

    /// Builder method to set the container image.
    pub fn with_container_image(mut self, image: impl Into<String>) -> Self {
        self.container_image = image.into();
        self
    }

    /// Builder method to set the container runtime.
    pub fn with_container_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.container_runtime = runtime.into();
        self
    }

    /// Builder method to enable progress monitoring.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Builder method to set the progress interval.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Builder method to set the delay between exercises.
    pub fn with_exercise_delay(mut self, delay: Duration) -> Self {
        self.exercise_delay = delay;
        self
    }

    /// Builder method to enable verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builder method to set the custom instruction.
    pub fn with_custom_instruction(mut self, instruction: Option<String>) -> Self {
        self.custom_instruction = instruction;
        self
    }

    /// Builder method to set where agent logs are written.
    pub fn with_agent_log_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.agent_log_dir = dir;
        self
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.test_command, "corepack yarn && corepack yarn test");
        assert!(config.use_container);
        assert!(!config.tests_in_container);
        assert_eq!(config.progress_interval, Duration::from_secs(8));
        assert_eq!(config.exercise_delay, Duration::from_secs(1));
        assert_eq!(config.container_runtime, "docker");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strategies_follow_flags() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.agent_strategy("").name(), "container");
        assert_eq!(config.test_strategy().name(), "local");

        let config = config.with_container(false).with_tests_in_container(true);
        assert_eq!(config.agent_strategy("agent-img").name(), "local");
        assert_eq!(config.test_strategy().name(), "container");
    }

    #[test]
    fn test_agent_image_overrides_test_image() {
        let config = BenchmarkConfig::default()
            .with_container_image("tests:latest")
            .with_tests_in_container(true);

        let image = |strategy: ExecutionStrategy| match strategy {
            ExecutionStrategy::Container(c) => c.image,
            ExecutionStrategy::Local(_) => panic!("expected a container"),
        };
        assert_eq!(image(config.agent_strategy("goose:1.2")), "goose:1.2");
        assert_eq!(image(config.agent_strategy(" ")), "tests:latest");
        assert_eq!(image(config.test_strategy()), "tests:latest");
    }

    #[test]
    fn test_test_timeout_falls_back_to_agent_timeout() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.effective_test_timeout(), None);

        let config = config.with_agent_timeout(Some(Duration::from_secs(300)));
        assert_eq!(config.effective_test_timeout(), Some(Duration::from_secs(300)));

        let config = config.with_test_timeout(Some(Duration::from_secs(60)));
        assert_eq!(config.effective_test_timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_validation_empty_test_command() {
        let result = BenchmarkConfig::default().with_test_command("  ").validate();
        assert!(result.unwrap_err().to_string().contains("test_command"));
    }

    #[test]
    fn test_validation_zero_timeouts() {
        let result = BenchmarkConfig::default()
            .with_agent_timeout(Some(Duration::ZERO))
            .validate();
        assert!(result.unwrap_err().to_string().contains("agent_timeout"));

        let result = BenchmarkConfig::default()
            .with_test_timeout(Some(Duration::ZERO))
            .validate();
        assert!(result.unwrap_err().to_string().contains("test_timeout"));
    }

    #[test]
    fn test_validation_zero_interval() {
        let result = BenchmarkConfig::default()
            .with_progress_interval(Duration::ZERO)
            .validate();
        assert!(result.unwrap_err().to_string().contains("progress_interval"));
    }

    #[test]
    fn test_validation_image_only_needed_for_containers() {
        let config = BenchmarkConfig::default().with_container_image("");
        assert!(config.validate().is_err());
        assert!(config.with_container(false).validate().is_ok());
    }

    #[test]
    fn test_serializes_to_json() {
        let config = BenchmarkConfig::default().with_agent_timeout(Some(Duration::from_secs(300)));
        let json = serde_json::to_string(&config).unwrap();
        let back: BenchmarkConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
