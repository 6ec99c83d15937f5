use std::collections::HashMap;

use crate::runtime::{RuntimeEdge, RuntimeNode};

/// Graph structure for traversal.
///
/// Edges are addressed by their index in the runtime edge list, so the index
/// stays valid while edge statuses change during a run.
#[derive(Debug, Clone, Default)]
pub struct Graph {
  /// node_id -> indices of edges entering the node.
  incoming: HashMap<String, Vec<usize>>,
  /// Nodes with no incoming edges, in node order.
  entry_points: Vec<String>,
}

impl Graph {
  /// Build a graph from runtime nodes and edges.
  pub fn new(nodes: &[RuntimeNode], edges: &[RuntimeEdge]) -> Self {
    let mut incoming: HashMap<String, Vec<usize>> = HashMap::new();

    for node in nodes {
      incoming.entry(node.node_id.clone()).or_default();
    }

    for (index, edge) in edges.iter().enumerate() {
      incoming.entry(edge.target.clone()).or_default().push(index);
    }

    let entry_points = nodes
      .iter()
      .filter(|node| incoming.get(&node.node_id).is_none_or(|v| v.is_empty()))
      .map(|node| node.node_id.clone())
      .collect();

    Self {
      incoming,
      entry_points,
    }
  }

  /// Nodes with no incoming edges.
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Indices of edges entering a node.
  pub fn incoming(&self, node_id: &str) -> &[usize] {
    self
      .incoming
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }
}
