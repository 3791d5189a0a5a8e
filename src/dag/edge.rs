// src/dag/edge.rs

use crate::dag::node::NodeId;

/// Directed dependency link: `to` cannot run before `from` has finished.
///
/// The same value is stored as a child of `from` and as a dependency of `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}
