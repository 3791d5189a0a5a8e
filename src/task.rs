// src/task.rs

//! The task contract.
//!
//! A task is the opaque unit of user logic owned by a work node. The engine
//! awaits it once, hands it the run's shared context, and only looks at
//! whether it returned `Ok` or `Err`.
//!
//! The context type `C` is chosen by the caller. Because several tasks may
//! run at the same time, `C` must be `Send + Sync`; any interior mutability
//! (a `Mutex`, atomics, channels) is part of the caller's type.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`Task::run`].
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'a>>;

/// Error returned by a failing task.
///
/// The engine reacts to it by cancelling the run; the message ends up in
/// [`RunOutcome::Failed`](crate::engine::RunOutcome::Failed).
#[derive(Debug)]
pub struct TaskError {
    source: anyhow::Error,
}

impl TaskError {
    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self {
            source: anyhow::Error::msg(message),
        }
    }

    /// Turn a panic payload caught from a task into an error.
    pub(crate) fn panicked(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::msg(format!("task panicked: {message}"))
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.source)
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(source: anyhow::Error) -> Self {
        Self { source }
    }
}

/// A unit of work run by a workflow node.
pub trait Task<C>: Send + Sync {
    /// Run the task against the shared context.
    fn run<'a>(&'a self, ctx: &'a C) -> TaskFuture<'a>;
}

/// Adapter turning a synchronous closure into a [`Task`].
///
/// The closure runs inline on the node's tokio task, so it should be short;
/// long blocking work belongs in a hand-written task using
/// `tokio::task::spawn_blocking`.
pub struct FnTask<F> {
    f: F,
}

impl<C, F> Task<C> for FnTask<F>
where
    C: Sync,
    F: Fn(&C) -> Result<(), TaskError> + Send + Sync,
{
    fn run<'a>(&'a self, ctx: &'a C) -> TaskFuture<'a> {
        let result = (self.f)(ctx);
        Box::pin(async move { result })
    }
}

/// Build a task from a synchronous closure.
pub fn task_fn<C, F>(f: F) -> FnTask<F>
where
    F: Fn(&C) -> Result<(), TaskError> + Send + Sync,
{
    FnTask { f }
}
