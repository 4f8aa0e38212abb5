//! Process execution with timeout enforcement.
//!
//! The executor spawns a [`PreparedCommand`](crate::execution::PreparedCommand),
//! captures its output and always hands back an [`ExecutionResult`]: a
//! non-zero exit or a timeout is data, not an error. Only a failure to start
//! the process at all surfaces as [`ExecError`](crate::error::ExecError).

pub mod executor;
pub mod result;

pub use executor::{filter_noise, ProcessExecutor, TokioExecutor, TIMEOUT_EXIT_CODE};
pub use result::ExecutionResult;
