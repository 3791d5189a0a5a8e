#![allow(dead_code)]

use std::collections::HashMap;

use dagflow::dag::NodeId;
use dagflow::engine::{EngineOptions, Workflow};
use dagflow::task::Task;

use crate::journal::Journal;
use crate::tasks::RecordingTask;

/// Name-based builder for `Workflow<Journal>` to simplify test setup.
pub struct WorkflowBuilder {
    wf: Workflow<Journal>,
    ids: HashMap<String, NodeId>,
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            wf: Workflow::with_options(options),
            ids: HashMap::new(),
        }
    }

    /// Add a `RecordingTask` named `name`.
    pub fn task(self, name: &str) -> Self {
        self.task_with(name, RecordingTask::new(name))
    }

    pub fn task_with(mut self, name: &str, task: impl Task<Journal> + 'static) -> Self {
        let id = self.wf.add_node(name, task).expect("add_node while building");
        self.ids.insert(name.to_string(), id);
        self
    }

    pub fn start(mut self, name: &str) -> Self {
        let id = self.id(name);
        self.wf.add_start_node(id).expect("add_start_node");
        self
    }

    pub fn edge(mut self, from: &str, to: &str) -> Self {
        let (from, to) = (self.id(from), self.id(to));
        self.wf.add_edge(from, to).expect("add_edge");
        self
    }

    pub fn end(mut self, name: &str) -> Self {
        let id = self.id(name);
        self.wf.connect_to_end(id).expect("connect_to_end");
        self
    }

    pub fn id(&self, name: &str) -> NodeId {
        *self
            .ids
            .get(name)
            .unwrap_or_else(|| panic!("unknown task '{name}' in builder"))
    }

    pub fn build(self) -> Workflow<Journal> {
        self.wf
    }

    pub fn build_with_ids(self) -> (Workflow<Journal>, HashMap<String, NodeId>) {
        (self.wf, self.ids)
    }
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The reference scenario:
///
/// ```text
/// start -> A, B, C, D
/// A -> E -> F
/// B -> F
/// C -> G
/// D -> G
/// F, G -> end
/// ```
pub fn scenario() -> WorkflowBuilder {
    scenario_with(WorkflowBuilder::new(), |b, name| b.task(name))
}

/// Same shape as [`scenario`], letting the caller choose each task.
pub fn scenario_with(
    builder: WorkflowBuilder,
    mut add: impl FnMut(WorkflowBuilder, &str) -> WorkflowBuilder,
) -> WorkflowBuilder {
    let mut b = builder;
    for name in ["A", "B", "C", "D", "E", "F", "G"] {
        b = add(b, name);
    }
    b.start("A")
        .start("B")
        .start("C")
        .start("D")
        .edge("A", "E")
        .edge("E", "F")
        .edge("B", "F")
        .edge("C", "G")
        .edge("D", "G")
        .end("F")
        .end("G")
}

/// `start -> t0 -> t1 -> ... -> t(n-1) -> end`
pub fn chain(n: usize) -> WorkflowBuilder {
    assert!(n > 0, "chain needs at least one task");
    let mut b = WorkflowBuilder::new();
    for i in 0..n {
        b = b.task(&format!("t{i}"));
    }
    b = b.start("t0");
    for i in 1..n {
        b = b.edge(&format!("t{}", i - 1), &format!("t{i}"));
    }
    b.end(&format!("t{}", n - 1))
}
