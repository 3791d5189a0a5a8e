// src/dag/mod.rs

//! Graph representation.
//!
//! - [`node`] holds the vertex type and its fan-in barrier.
//! - [`edge`] is the directed link recorded on both endpoints.
//! - [`graph`] is the node arena with the synthetic start/end markers.
//! - [`validate`] checks a graph can run to completion before it starts.

pub mod edge;
pub mod graph;
pub mod node;
pub mod validate;

pub use edge::Edge;
pub use graph::Graph;
pub use node::{Arrival, Node, NodeId, NodeKind};
pub use validate::validate_graph;
