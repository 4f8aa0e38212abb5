//! Teardown after a killed phase.

use std::time::Duration;

use tracing::{info, warn};

use crate::execution::PreparedCommand;
use crate::process::{ExecutionResult, ProcessExecutor};

/// Limit for a cleanup command.
pub const CLEANUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the cleanup command of `prepared` when `result` timed out.
///
/// Failures are logged and otherwise ignored.
pub(crate) async fn stop_leftovers(
    executor: &dyn ProcessExecutor,
    prepared: &PreparedCommand,
    result: &ExecutionResult,
    exercise: &str,
) {
    if !result.timed_out {
        return;
    }
    let Some(cleanup) = prepared.cleanup_command() else {
        return;
    };

    match executor.execute(&cleanup, Some(CLEANUP_TIMEOUT)).await {
        Ok(r) if r.is_success() => {
            info!(exercise, command = ?cleanup.argv, "Stopped timed-out run")
        }
        Ok(r) => warn!(
            exercise,
            command = ?cleanup.argv,
            exit_code = ?r.exit_code,
            stderr = %r.stderr.trim(),
            "Cleanup after timeout failed"
        ),
        Err(e) => warn!(exercise, error = %e, "Cleanup after timeout could not be started"),
    }
}
