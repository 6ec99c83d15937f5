//! Run events and notifiers.
//!
//! The walker emits an event for every node it starts, finishes, or skips,
//! and once per step, so hosts can stream progress to a debugger view or
//! persist it.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted while a run advances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
  RunStarted {
    run_id: String,
    entry_node_ids: Vec<String>,
  },

  NodeStarted {
    run_id: String,
    node_id: String,
  },

  NodeCompleted {
    run_id: String,
    node_id: String,
    outputs: serde_json::Map<String, serde_json::Value>,
  },

  /// The node was skipped without running its executor.
  NodeSkipped {
    run_id: String,
    node_id: String,
  },

  NodeFailed {
    run_id: String,
    node_id: String,
    error: String,
  },

  /// One ready set was processed.
  StepCompleted {
    run_id: String,
    finished: Vec<String>,
    next_ready: Vec<String>,
  },

  /// The ready set is empty.
  RunCompleted { run_id: String, failed_nodes: usize },

  RunCancelled { run_id: String },
}

/// Receives run events.
///
/// The walker calls `notify` synchronously from the stepping task, so
/// implementations should hand events off rather than block.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow debugger view never stalls a step. Volume is a few
  // events per node.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // The receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
