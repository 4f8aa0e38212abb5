//! Workspace progress monitoring during the agent phase.

pub mod progress;

pub use progress::{DiffSummary, ProgressEvent, ProgressMonitor, ProgressProbe, DEFAULT_PROGRESS_INTERVAL};
