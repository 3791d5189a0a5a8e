// src/engine/workflow.rs

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::runtime::Handle;
use tokio::sync::{Semaphore, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::dag::{Graph, NodeId, validate_graph};
use crate::engine::completion::CompletionSignal;
use crate::engine::driver::{RunState, execute};
use crate::engine::{EngineOptions, RunOutcome, WorkflowState};
use crate::errors::{Result, WorkflowError};
use crate::task::Task;

enum Phase<C> {
    Building(Graph<C>),
    Running(Arc<RunState<C>>),
}

/// A DAG of tasks that runs once.
///
/// Lifecycle: build the graph with [`add_node`](Self::add_node) and the edge
/// helpers, call [`start`](Self::start) once, then
/// [`wait_for_completion`](Self::wait_for_completion) once. Anything else
/// (editing after start, starting twice, waiting twice) returns a
/// [`WorkflowError`].
///
/// `C` is the shared context handed to every task. It is shared across
/// concurrently running tasks, so it must be `Send + Sync`.
pub struct Workflow<C> {
    phase: Phase<C>,
    options: EngineOptions,
    done: Option<oneshot::Receiver<RunOutcome>>,
    outcome: Option<RunOutcome>,
}

impl<C> Workflow<C>
where
    C: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            phase: Phase::Building(Graph::new()),
            options,
            done: None,
            outcome: None,
        }
    }

    /// Register a task node. Wire it with [`add_start_node`](Self::add_start_node),
    /// [`add_edge`](Self::add_edge) and [`connect_to_end`](Self::connect_to_end).
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        task: impl Task<C> + 'static,
    ) -> Result<NodeId> {
        let graph = self.building_graph()?;
        Ok(graph.add_task(name, Box::new(task)))
    }

    /// Make `node` run as soon as the workflow starts.
    pub fn add_start_node(&mut self, node: NodeId) -> Result<()> {
        let graph = self.building_graph()?;
        let root = graph.root();
        graph.add_edge(root, node)?;
        Ok(())
    }

    /// `to` runs only after `from` (and every other predecessor of `to`).
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.building_graph()?.add_edge(from, to)?;
        Ok(())
    }

    /// The run succeeds only after `node` (and every other end node) finished.
    pub fn connect_to_end(&mut self, node: NodeId) -> Result<()> {
        let graph = self.building_graph()?;
        let terminal = graph.terminal();
        graph.add_edge(node, terminal)?;
        Ok(())
    }

    /// Validate the graph and launch the run on the current tokio runtime.
    ///
    /// Returns as soon as the root branch is spawned; use
    /// [`wait_for_completion`](Self::wait_for_completion) to wait for the
    /// outcome. If `cancel` is already cancelled, no task runs and the run
    /// completes as [`RunOutcome::Cancelled`].
    pub fn start(&mut self, cancel: CancellationToken, ctx: impl Into<Arc<C>>) -> Result<()> {
        let Phase::Building(graph) = &mut self.phase else {
            return Err(WorkflowError::AlreadyStarted);
        };

        if self.options.max_concurrency == Some(0) {
            return Err(WorkflowError::ConfigError(
                "max_concurrency must be >= 1 (got 0)".to_string(),
            ));
        }

        validate_graph(graph)?;
        let handle = Handle::try_current().map_err(|_| WorkflowError::NoRuntime)?;

        let graph = std::mem::take(graph);
        let (completion, done) = CompletionSignal::new();
        let root = graph.root();

        info!(
            nodes = graph.node_count(),
            edges = graph.edges().len(),
            max_concurrency = ?self.options.max_concurrency,
            "starting workflow run"
        );

        let run = Arc::new(RunState {
            graph,
            ctx: ctx.into(),
            cancel,
            completion,
            limiter: self.options.max_concurrency.map(Semaphore::new),
            spawned_branches: AtomicUsize::new(0),
        });

        handle.spawn(execute(Arc::clone(&run), root));

        self.phase = Phase::Running(run);
        self.done = Some(done);
        Ok(())
    }

    /// Wait for the run's single completion signal.
    ///
    /// Not idempotent: once an outcome has been returned, further calls fail
    /// with [`WorkflowError::AlreadyCompleted`] (the outcome stays available
    /// through [`outcome`](Self::outcome)). Dropping the returned future before
    /// it resolves is safe; the signal can still be awaited later.
    pub async fn wait_for_completion(&mut self) -> Result<RunOutcome> {
        if matches!(self.phase, Phase::Building(_)) {
            return Err(WorkflowError::NotStarted);
        }

        let done = self.done.as_mut().ok_or(WorkflowError::AlreadyCompleted)?;
        let received = done.await;
        self.finish(received)
    }

    /// Blocking variant of [`wait_for_completion`](Self::wait_for_completion)
    /// for callers outside of async code.
    ///
    /// Returns [`WorkflowError::BlockingInRuntime`] when called with a tokio
    /// runtime entered on this thread; the run can still be awaited afterwards.
    pub fn blocking_wait(&mut self) -> Result<RunOutcome> {
        if matches!(self.phase, Phase::Building(_)) {
            return Err(WorkflowError::NotStarted);
        }
        if Handle::try_current().is_ok() {
            return Err(WorkflowError::BlockingInRuntime);
        }

        let done = self.done.take().ok_or(WorkflowError::AlreadyCompleted)?;
        let received = done.blocking_recv();
        self.finish(received)
    }

    fn finish(
        &mut self,
        received: std::result::Result<RunOutcome, oneshot::error::RecvError>,
    ) -> Result<RunOutcome> {
        self.done = None;
        let outcome = received.map_err(|_| WorkflowError::CompletionLost)?;

        info!(
            outcome = outcome.label(),
            spawned_branches = self.spawned_branches(),
            "workflow run completed"
        );
        self.outcome = Some(outcome.clone());
        Ok(outcome)
    }

    fn building_graph(&mut self) -> Result<&mut Graph<C>> {
        match &mut self.phase {
            Phase::Building(graph) => Ok(graph),
            Phase::Running(_) => {
                debug!("graph mutation attempted after start");
                Err(WorkflowError::AlreadyStarted)
            }
        }
    }
}

impl<C> Workflow<C> {
    pub fn state(&self) -> WorkflowState {
        match (&self.phase, &self.outcome) {
            (Phase::Building(_), _) => WorkflowState::Building,
            (Phase::Running(_), None) => WorkflowState::Started,
            (Phase::Running(_), Some(_)) => WorkflowState::Completed,
        }
    }

    /// The outcome returned by the completed wait, if any.
    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// Whether any branch observed cancellation or a task failed.
    pub fn is_cancelled(&self) -> bool {
        match &self.phase {
            Phase::Building(_) => false,
            Phase::Running(run) => run.completion.is_cancelled(),
        }
    }

    /// Whether the completion signal has been sent, awaited or not.
    pub fn is_signalled(&self) -> bool {
        match &self.phase {
            Phase::Building(_) => false,
            Phase::Running(run) => run.completion.is_delivered(),
        }
    }

    /// Number of tokio tasks spawned by fan-out so far.
    ///
    /// The first child of every node runs on its parent's task, so for a
    /// completed run this is `edges - nodes with at least one child`.
    pub fn spawned_branches(&self) -> usize {
        match &self.phase {
            Phase::Building(_) => 0,
            Phase::Running(run) => run.spawned_branches.load(Ordering::Relaxed),
        }
    }

    /// The shared context, once the workflow has started.
    pub fn context(&self) -> Option<&Arc<C>> {
        match &self.phase {
            Phase::Building(_) => None,
            Phase::Running(run) => Some(&run.ctx),
        }
    }

    pub fn graph(&self) -> &Graph<C> {
        match &self.phase {
            Phase::Building(graph) => graph,
            Phase::Running(run) => &run.graph,
        }
    }

    /// Number of nodes, including the start and end markers.
    pub fn node_count(&self) -> usize {
        self.graph().node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph().edges().len()
    }

    pub fn root(&self) -> NodeId {
        self.graph().root()
    }

    pub fn terminal(&self) -> NodeId {
        self.graph().terminal()
    }

    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        self.graph().node(id).map(|n| n.name())
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }
}

impl<C> Default for Workflow<C>
where
    C: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Workflow<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("state", &self.state())
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .field("options", &self.options)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}
