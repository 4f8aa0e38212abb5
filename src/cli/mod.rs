//! Command-line interface for agent-bench.
//!
//! Provides commands to run a benchmark, grade exercises without an agent,
//! list exercises and preview agent instructions.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
