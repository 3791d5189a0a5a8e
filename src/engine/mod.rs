// src/engine/mod.rs

//! Execution engine.
//!
//! - [`workflow`] is the public state machine and graph-building API.
//! - [`driver`] walks the graph: join barrier, cancellation check, task
//!   execution and fan-out.
//! - [`completion`] is the once-only completion signal shared by all
//!   branches of a run.

pub mod completion;
pub mod driver;
pub mod workflow;

pub use workflow::Workflow;

use std::fmt;

/// How a workflow run ended. Exactly one outcome is delivered per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every branch reached the end marker.
    Succeeded,
    /// A branch observed the cancellation token before reaching the end.
    Cancelled,
    /// A task returned an error; the run's token was cancelled.
    Failed { node: String, error: String },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }

    /// Short tag for structured logging.
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Succeeded => "succeeded",
            RunOutcome::Cancelled => "cancelled",
            RunOutcome::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Failed { node, error } => write!(f, "failed in '{node}': {error}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Lifecycle of a [`Workflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Graph may be edited; not started yet.
    Building,
    /// Running, or finished but not yet awaited.
    Started,
    /// Completion has been observed by a waiter.
    Completed,
}

/// Engine tuning knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Upper bound on task bodies running at the same time.
    ///
    /// `None` means unbounded: fan-out width alone decides concurrency.
    pub max_concurrency: Option<usize>,
}
