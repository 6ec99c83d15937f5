//! Edge status machine.
//!
//! Edges only ever move forward, `waiting -> active | skipped`. A node may run
//! once none of its incoming edges is waiting and at least one is active. A
//! node whose incoming edges are all skipped is skipped itself, and the skip
//! travels on through its outgoing edges.

use flowrun_workflow::{EdgeStatus, NodeStatus, RuntimeEdge, RuntimeNode};
use serde_json::Value;

/// What the walker should do with a candidate node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRunStatus {
  Run,
  Skip,
  Wait,
}

/// Decide a node's fate from the status of its incoming edges.
///
/// A node with no incoming edges can always run.
pub fn node_run_status(node_id: &str, edges: &[RuntimeEdge]) -> NodeRunStatus {
  let mut incoming = edges.iter().filter(|edge| edge.target == node_id).peekable();
  if incoming.peek().is_none() {
    return NodeRunStatus::Run;
  }

  let mut any_active = false;
  for edge in incoming {
    match edge.status {
      EdgeStatus::Waiting => return NodeRunStatus::Wait,
      EdgeStatus::Active => any_active = true,
      EdgeStatus::Skipped => {}
    }
  }

  if any_active {
    NodeRunStatus::Run
  } else {
    NodeRunStatus::Skip
  }
}

/// Settle the waiting outgoing edges of a node that finished successfully.
///
/// Edges leaving a branching output are activated only toward the targets
/// listed in that output's value. Every other edge is activated when its
/// source output was produced and skipped otherwise. Returns the indices of
/// the edges that changed.
pub fn settle_outgoing_edges(node: &RuntimeNode, edges: &mut [RuntimeEdge]) -> Vec<usize> {
  let mut settled = Vec::new();

  for (index, edge) in edges.iter_mut().enumerate() {
    if edge.source != node.node_id || !edge.is_waiting() {
      continue;
    }

    let produced = node.output_value(&edge.source_handle);
    let branching = node
      .output(&edge.source_handle)
      .is_some_and(|output| output.is_branching());

    let active = if branching {
      produced.is_some_and(|value| selects(value, &edge.target))
    } else {
      produced.is_some()
    };

    let status = if active {
      EdgeStatus::Active
    } else {
      EdgeStatus::Skipped
    };
    if edge.settle(status) {
      settled.push(index);
    }
  }

  settled
}

/// Skip every waiting edge leaving `node_id`.
pub fn skip_outgoing_edges(node_id: &str, edges: &mut [RuntimeEdge]) -> Vec<usize> {
  edges
    .iter_mut()
    .enumerate()
    .filter(|(_, edge)| edge.source == node_id)
    .filter_map(|(index, edge)| edge.settle(EdgeStatus::Skipped).then_some(index))
    .collect()
}

/// Skip pending nodes whose incoming edges are all skipped, repeating until
/// nothing changes. Returns the newly skipped node ids in the order they were
/// skipped.
pub fn propagate_skips(nodes: &mut [RuntimeNode], edges: &mut [RuntimeEdge]) -> Vec<String> {
  let mut skipped = Vec::new();

  loop {
    let mut changed = false;
    for node in nodes.iter_mut() {
      if node.status != NodeStatus::Pending {
        continue;
      }
      if node_run_status(&node.node_id, edges) == NodeRunStatus::Skip {
        node.status = NodeStatus::Skipped;
        skip_outgoing_edges(&node.node_id, edges);
        skipped.push(node.node_id.clone());
        changed = true;
      }
    }
    if !changed {
      return skipped;
    }
  }
}

/// A branching output selects a target by id, either as a single string or
/// inside an array of strings.
fn selects(value: &Value, target: &str) -> bool {
  match value {
    Value::String(id) => id == target,
    Value::Array(ids) => ids.iter().any(|id| id.as_str() == Some(target)),
    _ => false,
  }
}
