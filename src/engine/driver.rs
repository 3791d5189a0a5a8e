// src/engine/driver.rs

//! Concurrent graph traversal.
//!
//! Each branch is a tokio task walking the graph. At every node it:
//! 1. passes the node's dependency gate, or stops if other predecessors are
//!    still outstanding;
//! 2. checks the run's cancellation token;
//! 3. runs the node's task (or delivers completion, for the end marker). With
//!    a concurrency limit the token is checked again once the permit is held,
//!    since the run may have been cancelled while the node was queued;
//! 4. spawns one branch per outgoing edge except the first, and continues
//!    with the first edge itself.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::dag::{Graph, NodeId, NodeKind};
use crate::engine::RunOutcome;
use crate::engine::completion::CompletionSignal;
use crate::task::{Task, TaskError};

pub(crate) type BranchFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Everything a branch needs, shared by all branches of one run.
#[derive(Debug)]
pub(crate) struct RunState<C> {
    pub(crate) graph: Graph<C>,
    pub(crate) ctx: Arc<C>,
    pub(crate) cancel: CancellationToken,
    pub(crate) completion: CompletionSignal,
    /// Caps concurrently running task bodies when set.
    pub(crate) limiter: Option<Semaphore>,
    pub(crate) spawned_branches: AtomicUsize,
}

impl<C> RunState<C> {
    fn cancel_and_signal_done(&self, outcome: RunOutcome) {
        let label = outcome.label();
        if self.completion.cancel_and_signal_done(outcome) {
            info!(outcome = label, "workflow run stopped early");
        } else {
            trace!(outcome = label, "completion already delivered; ignoring");
        }
    }

    fn fail(&self, node: &str, err: TaskError) {
        warn!(node = %node, error = %err, "task failed; cancelling workflow run");
        let outcome = RunOutcome::Failed {
            node: node.to_string(),
            error: err.to_string(),
        };
        if !self.completion.cancel_token_and_signal_done(&self.cancel, outcome) {
            debug!(node = %node, "completion already delivered; failure not reported");
        }
    }

    /// Wait for a slot under the concurrency limit, if there is one.
    async fn acquire_permit(&self) -> Result<Option<SemaphorePermit<'_>>, TaskError> {
        match &self.limiter {
            Some(limiter) => limiter
                .acquire()
                .await
                .map(Some)
                .map_err(|e| TaskError::from(anyhow::Error::from(e))),
            None => Ok(None),
        }
    }

    /// Await the task body. A panic inside the task is reported as an error.
    async fn run_task(&self, node: &str, task: &dyn Task<C>) -> Result<(), TaskError> {
        debug!(node = %node, "running task");
        let started = Instant::now();

        // The call itself sits inside the block so panics raised before the
        // first poll are caught too.
        let body = async { task.run(self.ctx.as_ref()).await };
        let result = match AssertUnwindSafe(body).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(TaskError::panicked(payload)),
        };

        debug!(
            node = %node,
            elapsed_ms = started.elapsed().as_millis() as u64,
            success = result.is_ok(),
            "task finished"
        );
        result
    }
}

/// Walk the graph starting with an arrival at `start`.
///
/// Returns a boxed future so that branches can spawn further branches of the
/// same type.
pub(crate) fn execute<C>(run: Arc<RunState<C>>, start: NodeId) -> BranchFuture
where
    C: Send + Sync + 'static,
{
    Box::pin(async move {
        let mut current = start;

        loop {
            let node = run.graph.get(current);

            let arrival = node.arrive();
            if !arrival.opens_gate() {
                trace!(
                    node = %node.name(),
                    arrived = arrival.arrived,
                    expected = arrival.expected,
                    "dependency satisfied; waiting for the rest"
                );
                return;
            }

            if run.cancel.is_cancelled() {
                info!(node = %node.name(), "cancellation observed; skipping node");
                run.cancel_and_signal_done(RunOutcome::Cancelled);
                return;
            }

            match node.kind() {
                NodeKind::Start => debug!("workflow run started"),
                NodeKind::Work(task) => {
                    let permit = match run.acquire_permit().await {
                        Ok(permit) => permit,
                        Err(err) => {
                            run.fail(node.name(), err);
                            return;
                        }
                    };

                    if permit.is_some() && run.cancel.is_cancelled() {
                        info!(
                            node = %node.name(),
                            "cancelled while queued for a permit; skipping node"
                        );
                        run.cancel_and_signal_done(RunOutcome::Cancelled);
                        return;
                    }

                    if let Err(err) = run.run_task(node.name(), task.as_ref()).await {
                        run.fail(node.name(), err);
                        return;
                    }
                }
                NodeKind::End => {
                    if run.completion.deliver(RunOutcome::Succeeded) {
                        info!("all branches reached the end; workflow run succeeded");
                    } else {
                        debug!("end reached after completion was already delivered");
                    }
                }
            }

            let Some((first, rest)) = node.children().split_first() else {
                return;
            };

            for edge in rest {
                spawn_branch(&run, edge.to);
            }

            current = first.to;
        }
    })
}

fn spawn_branch<C>(run: &Arc<RunState<C>>, node: NodeId)
where
    C: Send + Sync + 'static,
{
    run.spawned_branches.fetch_add(1, Ordering::Relaxed);
    tokio::spawn(execute(Arc::clone(run), node));
}
