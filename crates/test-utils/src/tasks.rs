use std::sync::Arc;
use std::time::Duration;

use dagflow::task::{Task, TaskError, TaskFuture};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::journal::Journal;

/// Records start/finish in the journal, optionally sleeping in between.
pub struct RecordingTask {
    name: String,
    delay: Duration,
}

impl RecordingTask {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(name: &str, delay: Duration) -> Self {
        Self {
            name: name.to_string(),
            delay,
        }
    }
}

impl Task<Journal> for RecordingTask {
    fn run<'a>(&'a self, ctx: &'a Journal) -> TaskFuture<'a> {
        Box::pin(async move {
            ctx.record_start(&self.name);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            } else {
                tokio::task::yield_now().await;
            }
            ctx.record_finish(&self.name);
            Ok(())
        })
    }
}

/// Records its start, optionally sleeps, then fails.
pub struct FailingTask {
    name: String,
    delay: Duration,
}

impl FailingTask {
    pub fn new(name: &str) -> Self {
        Self::with_delay(name, Duration::ZERO)
    }

    pub fn with_delay(name: &str, delay: Duration) -> Self {
        Self {
            name: name.to_string(),
            delay,
        }
    }
}

impl Task<Journal> for FailingTask {
    fn run<'a>(&'a self, ctx: &'a Journal) -> TaskFuture<'a> {
        Box::pin(async move {
            ctx.record_start(&self.name);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            ctx.record_finish(&self.name);
            Err(TaskError::msg(format!("{} failed on purpose", self.name)))
        })
    }
}

/// Records its start, yields once, then panics.
pub struct PanickingTask {
    name: String,
}

impl PanickingTask {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Task<Journal> for PanickingTask {
    fn run<'a>(&'a self, ctx: &'a Journal) -> TaskFuture<'a> {
        Box::pin(async move {
            ctx.record_start(&self.name);
            tokio::task::yield_now().await;
            explode(&self.name)
        })
    }
}

fn explode(name: &str) -> Result<(), TaskError> {
    panic!("{name} blew up")
}

/// Runs normally, then cancels the given token.
pub struct CancellingTask {
    name: String,
    token: CancellationToken,
}

impl CancellingTask {
    pub fn new(name: &str, token: CancellationToken) -> Self {
        Self {
            name: name.to_string(),
            token,
        }
    }
}

impl Task<Journal> for CancellingTask {
    fn run<'a>(&'a self, ctx: &'a Journal) -> TaskFuture<'a> {
        Box::pin(async move {
            ctx.record_start(&self.name);
            self.token.cancel();
            ctx.record_finish(&self.name);
            Ok(())
        })
    }
}

/// Blocks until its gate is opened with `Notify::notify_one`.
pub struct GatedTask {
    name: String,
    gate: Arc<Notify>,
}

impl GatedTask {
    pub fn new(name: &str, gate: Arc<Notify>) -> Self {
        Self {
            name: name.to_string(),
            gate,
        }
    }
}

impl Task<Journal> for GatedTask {
    fn run<'a>(&'a self, ctx: &'a Journal) -> TaskFuture<'a> {
        Box::pin(async move {
            ctx.record_start(&self.name);
            self.gate.notified().await;
            ctx.record_finish(&self.name);
            Ok(())
        })
    }
}
