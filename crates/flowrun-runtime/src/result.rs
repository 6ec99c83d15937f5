//! Step and run result types.

use std::collections::HashMap;

use flowrun_config::NodeType;
use flowrun_workflow::{NodeStatus, RuntimeEdge, RuntimeNode};
use serde::{Deserialize, Serialize};

use crate::error::NodeError;

/// Report for one dispatched node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResponse {
  pub node_id: String,
  pub node_type: NodeType,
  /// `success` or `failed`.
  pub status: NodeStatus,
  /// Outputs the executor produced. Empty on failure.
  pub outputs: serde_json::Map<String, serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<NodeError>,
  /// Wall time of the executor call.
  pub run_time_ms: u64,
  pub total_points: f64,
}

/// Outcome of one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
  pub finished_nodes: Vec<RuntimeNode>,
  pub finished_edges: Vec<RuntimeEdge>,
  /// Ready set for the next step, in node order.
  pub next_ready: Vec<String>,
  /// One response per dispatched node, in ready-set order.
  pub results: Vec<NodeResponse>,
  /// Nodes skipped during the step.
  pub skipped: Vec<String>,
  pub errors: Vec<NodeError>,
}

impl StepResult {
  /// The step dispatched nothing observable.
  pub fn is_empty(&self) -> bool {
    self.results.is_empty()
  }

  pub fn response(&self, node_id: &str) -> Option<&NodeResponse> {
    self.results.iter().find(|r| r.node_id == node_id)
  }
}

/// Overall status of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  Succeeded,
  /// Some nodes failed but the entry nodes ran.
  PartiallyFailed,
  /// An entry node failed.
  Failed,
}

/// Outcome of a run to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
  pub run_id: String,
  pub finished_nodes: Vec<RuntimeNode>,
  pub finished_edges: Vec<RuntimeEdge>,
  /// Every node response of the run, in dispatch order.
  pub results: Vec<NodeResponse>,
  pub errors: Vec<NodeError>,
  pub variables: HashMap<String, serde_json::Value>,
  pub status: RunStatus,
}

impl RunResult {
  pub fn node(&self, node_id: &str) -> Option<&RuntimeNode> {
    self.finished_nodes.iter().find(|n| n.node_id == node_id)
  }

  pub fn response(&self, node_id: &str) -> Option<&NodeResponse> {
    self.results.iter().find(|r| r.node_id == node_id)
  }

  pub fn is_success(&self) -> bool {
    self.status == RunStatus::Succeeded
  }

  /// Sum of the points every dispatched node reported.
  pub fn total_points(&self) -> f64 {
    self.results.iter().map(|r| r.total_points).sum()
  }
}
