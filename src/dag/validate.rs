// src/dag/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;

use crate::dag::graph::Graph;
use crate::dag::node::NodeId;
use crate::errors::{Result, WorkflowError};

/// Check that a workflow graph can be run to completion.
///
/// This checks:
/// - there is at least one start node
/// - the graph has no cycles
/// - every node is reachable from the start marker
/// - every node has a path to the end marker
///
/// A graph passing these checks delivers its completion signal exactly once
/// when run, as long as every task returns.
pub fn validate_graph<C>(graph: &Graph<C>) -> Result<()> {
    ensure_has_start_nodes(graph)?;

    let (forward, backward) = build_petgraphs(graph);
    ensure_acyclic(graph, &forward)?;
    ensure_reachable(graph, &forward)?;
    ensure_terminated(graph, &backward)?;
    Ok(())
}

fn ensure_has_start_nodes<C>(graph: &Graph<C>) -> Result<()> {
    if graph.start_nodes().next().is_none() {
        return Err(WorkflowError::NoStartNodes);
    }
    Ok(())
}

/// Build the graph once in each direction, keyed by node index.
fn build_petgraphs<C>(graph: &Graph<C>) -> (DiGraphMap<usize, ()>, DiGraphMap<usize, ()>) {
    let mut forward: DiGraphMap<usize, ()> = DiGraphMap::new();
    let mut backward: DiGraphMap<usize, ()> = DiGraphMap::new();

    for (id, _) in graph.nodes() {
        forward.add_node(id.index());
        backward.add_node(id.index());
    }

    for edge in graph.edges() {
        forward.add_edge(edge.from.index(), edge.to.index(), ());
        backward.add_edge(edge.to.index(), edge.from.index(), ());
    }

    (forward, backward)
}

fn ensure_acyclic<C>(graph: &Graph<C>, forward: &DiGraphMap<usize, ()>) -> Result<()> {
    match toposort(forward, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(WorkflowError::Cycle {
            node: name_of(graph, cycle.node_id()),
        }),
    }
}

fn ensure_reachable<C>(graph: &Graph<C>, forward: &DiGraphMap<usize, ()>) -> Result<()> {
    let seen = reachable_from(forward, graph.root().index());

    // The end marker is reported through `ensure_terminated` instead: if it is
    // unreachable, some start node is necessarily unterminated.
    let missing = graph
        .nodes()
        .map(|(id, _)| id)
        .filter(|id| *id != graph.terminal())
        .find(|id| !seen.contains(&id.index()));

    match missing {
        Some(id) => Err(WorkflowError::Unreachable {
            node: name_of(graph, id.index()),
        }),
        None => Ok(()),
    }
}

fn ensure_terminated<C>(graph: &Graph<C>, backward: &DiGraphMap<usize, ()>) -> Result<()> {
    let seen = reachable_from(backward, graph.terminal().index());

    let missing = graph
        .nodes()
        .map(|(id, _)| id)
        .find(|id| !seen.contains(&id.index()));

    match missing {
        Some(id) => Err(WorkflowError::Unterminated {
            node: name_of(graph, id.index()),
        }),
        None => Ok(()),
    }
}

fn reachable_from(g: &DiGraphMap<usize, ()>, start: usize) -> HashSet<usize> {
    let mut seen = HashSet::new();
    let mut dfs = Dfs::new(g, start);
    while let Some(n) = dfs.next(g) {
        seen.insert(n);
    }
    seen
}

fn name_of<C>(graph: &Graph<C>, index: usize) -> String {
    graph
        .node(NodeId(index))
        .map(|n| n.name().to_string())
        .unwrap_or_else(|| format!("#{index}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Task, task_fn};

    fn noop() -> Box<dyn Task<()>> {
        Box::new(task_fn(|_: &()| Ok(())))
    }

    /// start -> a -> b -> end
    fn chain() -> (Graph<()>, NodeId, NodeId) {
        let mut graph = Graph::new();
        let a = graph.add_task("a", noop());
        let b = graph.add_task("b", noop());
        let (root, terminal) = (graph.root(), graph.terminal());
        graph.add_edge(root, a).unwrap();
        graph.add_edge(a, b).unwrap();
        graph.add_edge(b, terminal).unwrap();
        (graph, a, b)
    }

    #[test]
    fn accepts_well_formed_chain() {
        let (graph, _, _) = chain();
        validate_graph(&graph).unwrap();
    }

    #[test]
    fn rejects_graph_without_start_nodes() {
        let graph: Graph<()> = Graph::new();
        assert!(matches!(
            validate_graph(&graph),
            Err(WorkflowError::NoStartNodes)
        ));
    }

    #[test]
    fn rejects_cycle() {
        let (mut graph, a, b) = chain();
        graph.add_edge(b, a).unwrap();

        match validate_graph(&graph) {
            Err(WorkflowError::Cycle { node }) => assert!(node == "a" || node == "b"),
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn rejects_self_loop() {
        let (mut graph, a, _) = chain();
        graph.add_edge(a, a).unwrap();

        assert!(matches!(
            validate_graph(&graph),
            Err(WorkflowError::Cycle { .. })
        ));
    }

    #[test]
    fn rejects_unwired_node() {
        let (mut graph, _, _) = chain();
        graph.add_task("orphan", noop());

        match validate_graph(&graph) {
            Err(WorkflowError::Unreachable { node }) => assert_eq!(node, "orphan"),
            other => panic!("expected Unreachable, got {other:?}"),
        }
    }

    #[test]
    fn rejects_node_that_never_reaches_end() {
        let (mut graph, a, _) = chain();
        let dangling = graph.add_task("dangling", noop());
        graph.add_edge(a, dangling).unwrap();

        match validate_graph(&graph) {
            Err(WorkflowError::Unterminated { node }) => assert_eq!(node, "dangling"),
            other => panic!("expected Unterminated, got {other:?}"),
        }
    }
}
