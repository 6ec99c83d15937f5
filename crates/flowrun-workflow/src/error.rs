use thiserror::Error;

/// Structural problems in a graph definition. These are detected at
/// conversion time, before anything is dispatched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
  #[error("node not found: {0}")]
  NodeNotFound(String),

  #[error("duplicate node id: {0}")]
  DuplicateNode(String),

  #[error("edge references unknown node: from={from}, to={to}")]
  InvalidEdge { from: String, to: String },

  #[error("edge leaves node '{node_id}' through undeclared output '{handle}'")]
  UnknownHandle { node_id: String, handle: String },

  #[error("entry node not found: {0}")]
  EntryNotFound(String),
}
