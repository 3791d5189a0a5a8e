// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("workflow already started; the graph is frozen")]
    AlreadyStarted,

    #[error("workflow has not been started")]
    NotStarted,

    #[error("completion was already observed for this run")]
    AlreadyCompleted,

    #[error("node {0} does not belong to this workflow")]
    UnknownNode(usize),

    #[error("invalid edge: {0}")]
    InvalidEdge(String),

    #[error("workflow has no start nodes")]
    NoStartNodes,

    #[error("cycle detected in workflow graph involving node '{node}'")]
    Cycle { node: String },

    #[error("node '{node}' is not reachable from any start node")]
    Unreachable { node: String },

    #[error("node '{node}' has no path to the end of the workflow")]
    Unterminated { node: String },

    #[error("start must be called from within a tokio runtime")]
    NoRuntime,

    #[error("completion signal was dropped before delivery")]
    CompletionLost,

    #[error("blocking_wait cannot be called from within a tokio runtime; use wait_for_completion")]
    BlockingInRuntime,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
