// src/dag/node.rs

//! Graph vertices and the fan-in barrier.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::dag::edge::Edge;
use crate::task::Task;

/// Index of a node inside its workflow's graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node does once its dependencies are satisfied.
pub enum NodeKind<C> {
    /// Synthetic root: no work, fans out to every start node.
    Start,
    /// A user task.
    Work(Box<dyn Task<C>>),
    /// Synthetic terminal: delivers the completion signal.
    End,
}

impl<C> fmt::Debug for NodeKind<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Start => f.write_str("Start"),
            NodeKind::Work(_) => f.write_str("Work(..)"),
            NodeKind::End => f.write_str("End"),
        }
    }
}

/// Result of one arrival at a node's dependency gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrival {
    /// Counter value produced by this arrival's own increment.
    pub arrived: usize,
    /// Number of arrivals required to open the gate.
    pub expected: usize,
}

impl Arrival {
    /// Whether this arrival is the one that opens the gate.
    pub fn opens_gate(&self) -> bool {
        self.arrived == self.expected
    }
}

/// A graph vertex.
///
/// `dependencies` and `children` are fixed once the workflow starts; the only
/// state touched during a run is `completed_dependencies`.
pub struct Node<C> {
    name: String,
    kind: NodeKind<C>,
    dependencies: Vec<Edge>,
    children: Vec<Edge>,
    completed_dependencies: AtomicUsize,
}

impl<C> Node<C> {
    pub(crate) fn new(name: impl Into<String>, kind: NodeKind<C>) -> Self {
        Self {
            name: name.into(),
            kind,
            dependencies: Vec::new(),
            children: Vec::new(),
            completed_dependencies: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind<C> {
        &self.kind
    }

    pub fn dependencies(&self) -> &[Edge] {
        &self.dependencies
    }

    /// Outgoing edges, in insertion order.
    pub fn children(&self) -> &[Edge] {
        &self.children
    }

    pub(crate) fn push_dependency(&mut self, edge: Edge) {
        self.dependencies.push(edge);
    }

    pub(crate) fn push_child(&mut self, edge: Edge) {
        self.children.push(edge);
    }

    /// Register one predecessor traversal.
    ///
    /// Every call increments the counter exactly once, and the decision is
    /// made on the value returned by that same `fetch_add`, so out of N
    /// concurrent arrivals exactly one sees `arrived == N`. A node with no
    /// dependencies (the root) expects a single arrival.
    pub(crate) fn arrive(&self) -> Arrival {
        let arrived = self.completed_dependencies.fetch_add(1, Ordering::AcqRel) + 1;
        Arrival {
            arrived,
            expected: self.dependencies.len().max(1),
        }
    }

    /// How many predecessor traversals have reached this node so far.
    pub fn completed_dependencies(&self) -> usize {
        self.completed_dependencies.load(Ordering::Acquire)
    }
}

impl<C> fmt::Debug for Node<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("dependencies", &self.dependencies.len())
            .field("children", &self.children.len())
            .field("completed_dependencies", &self.completed_dependencies())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn node_with_deps(n: usize) -> Node<()> {
        let mut node = Node::new("join", NodeKind::End);
        for i in 0..n {
            node.push_dependency(Edge {
                from: NodeId(i + 10),
                to: NodeId(0),
            });
        }
        node
    }

    #[test]
    fn root_opens_on_first_arrival() {
        let node: Node<()> = Node::new("start", NodeKind::Start);
        assert!(node.arrive().opens_gate());
        assert!(!node.arrive().opens_gate());
    }

    #[test]
    fn single_dependency_opens_once() {
        let node = node_with_deps(1);
        assert!(node.arrive().opens_gate());
        assert!(!node.arrive().opens_gate());
    }

    #[test]
    fn gate_opens_only_on_last_arrival() {
        let node = node_with_deps(3);
        assert_eq!(
            node.arrive(),
            Arrival {
                arrived: 1,
                expected: 3
            }
        );
        assert!(!node.arrive().opens_gate());
        assert!(node.arrive().opens_gate());
        assert_eq!(node.completed_dependencies(), 3);
    }

    #[test]
    fn concurrent_arrivals_open_gate_exactly_once() {
        const ARRIVALS: usize = 32;

        for _ in 0..50 {
            let node = Arc::new(node_with_deps(ARRIVALS));
            let winners = Arc::new(AtomicUsize::new(0));

            let handles: Vec<_> = (0..ARRIVALS)
                .map(|_| {
                    let node = Arc::clone(&node);
                    let winners = Arc::clone(&winners);
                    thread::spawn(move || {
                        if node.arrive().opens_gate() {
                            winners.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();

            for h in handles {
                h.join().unwrap();
            }

            assert_eq!(winners.load(Ordering::SeqCst), 1);
        }
    }
}
