use serde::{Deserialize, Serialize};

use crate::edge::StoreEdge;
use crate::node::StoreNode;

/// A persisted workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  #[serde(default)]
  pub workflow_id: String,
  #[serde(default)]
  pub name: String,
  pub nodes: Vec<StoreNode>,
  #[serde(default)]
  pub edges: Vec<StoreEdge>,
}

impl WorkflowDef {
  pub fn get_node(&self, node_id: &str) -> Option<&StoreNode> {
    self.nodes.iter().find(|node| node.node_id == node_id)
  }
}
