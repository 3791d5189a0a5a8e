// src/dag/graph.rs

use crate::dag::edge::Edge;
use crate::dag::node::{Node, NodeId, NodeKind};
use crate::errors::{Result, WorkflowError};
use crate::task::Task;

/// Arena of workflow nodes addressed by [`NodeId`].
///
/// A fresh graph already contains the synthetic root (`Start`) and terminal
/// (`End`) nodes. Edges are recorded on both endpoints and in a flat list.
#[derive(Debug)]
pub struct Graph<C> {
    nodes: Vec<Node<C>>,
    edges: Vec<Edge>,
    root: NodeId,
    terminal: NodeId,
}

impl<C> Graph<C> {
    pub fn new() -> Self {
        let nodes = vec![
            Node::new("start", NodeKind::Start),
            Node::new("end", NodeKind::End),
        ];
        Self {
            nodes,
            edges: Vec::new(),
            root: NodeId(0),
            terminal: NodeId(1),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn terminal(&self) -> NodeId {
        self.terminal
    }

    /// Register a work node. It takes part in a run only once it is wired
    /// with edges.
    pub fn add_task(&mut self, name: impl Into<String>, task: Box<dyn Task<C>>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name, NodeKind::Work(task)));
        id
    }

    /// Record the edge `from -> to` on both endpoints.
    ///
    /// Rejects ids from another graph, edges into the root, and edges out of
    /// the terminal. Acyclicity is checked later, by
    /// [`validate_graph`](crate::dag::validate::validate_graph).
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Result<Edge> {
        self.check_id(from)?;
        self.check_id(to)?;

        if to == self.root {
            return Err(WorkflowError::InvalidEdge(format!(
                "'{}' -> 'start': the start marker cannot have dependencies",
                self.nodes[from.0].name()
            )));
        }
        if from == self.terminal {
            return Err(WorkflowError::InvalidEdge(format!(
                "'end' -> '{}': the end marker cannot have children",
                self.nodes[to.0].name()
            )));
        }

        let edge = Edge { from, to };
        self.nodes[from.0].push_child(edge);
        self.nodes[to.0].push_dependency(edge);
        self.edges.push(edge);
        Ok(edge)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<C>> {
        self.nodes.get(id.0)
    }

    /// Node lookup for ids taken from this graph's own edges.
    pub(crate) fn get(&self, id: NodeId) -> &Node<C> {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node<C>)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes wired directly to the root.
    pub fn start_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[self.root.0].children().iter().map(|e| e.to)
    }

    /// Nodes wired directly to the terminal.
    pub fn end_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[self.terminal.0].dependencies().iter().map(|e| e.from)
    }

    fn check_id(&self, id: NodeId) -> Result<()> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(WorkflowError::UnknownNode(id.0))
        }
    }
}

impl<C> Default for Graph<C> {
    fn default() -> Self {
        Self::new()
    }
}
