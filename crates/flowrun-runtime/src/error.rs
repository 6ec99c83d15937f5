//! Runtime error types.

use flowrun_config::Reference;
use flowrun_workflow::WorkflowError;
use serde::{Deserialize, Serialize};

/// Errors that end or refuse a whole run.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
  /// The run was stopped by its caller.
  #[error("execution cancelled")]
  Cancelled,

  /// The graph is structurally invalid.
  #[error("invalid graph: {0}")]
  Graph(#[from] WorkflowError),

  /// A node id given by the caller does not exist in the run.
  #[error("node not found: {node_id}")]
  NodeNotFound { node_id: String },

  /// A spawned node task panicked or was aborted.
  #[error("task join error: {message}")]
  TaskJoin { message: String },
}

/// A failure confined to one node. The run continues on branches that do
/// not depend on the node; every `NodeError` is returned to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeError {
  /// A required input never became resolvable. `reference` is `None` when
  /// the input has no value configured at all.
  #[error("input '{input_key}' of node '{node_id}' is unresolved{}", display_reference(.reference))]
  Resolution {
    node_id: String,
    input_key: String,
    reference: Option<Reference>,
  },

  /// The node's executor reported a failure.
  #[error("node '{node_id}' failed: {message}")]
  Execution { node_id: String, message: String },

  /// The node's executor did not finish in time.
  #[error("node '{node_id}' timed out")]
  Timeout { node_id: String },
}

impl NodeError {
  pub fn node_id(&self) -> &str {
    match self {
      NodeError::Resolution { node_id, .. }
      | NodeError::Execution { node_id, .. }
      | NodeError::Timeout { node_id } => node_id,
    }
  }
}

fn display_reference(reference: &Option<Reference>) -> String {
  match reference {
    Some(reference) => format!(" (missing {})", reference),
    None => String::new(),
  }
}

/// The failure type executors return.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct NodeExecutionError {
  pub message: String,
}

impl NodeExecutionError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}
