//! Shared utility functions for agent-bench.
//!
//! This module provides helpers used across modules, currently secret
//! redaction for anything that ends up in logs.

pub mod redact;

pub use redact::{preview, redact, sanitize_command, truncate, MAX_LOGGED_COMMAND_LEN};
