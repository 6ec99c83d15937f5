use serde::{Deserialize, Serialize};

/// A persisted connection from one node's output handle to another node's
/// input handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEdge {
  pub source: String,
  /// Output key on the source node.
  pub source_handle: String,
  pub target: String,
  /// Input key (or connection label) on the target node.
  #[serde(default)]
  pub target_handle: String,
}

impl StoreEdge {
  pub fn new(
    source: impl Into<String>,
    source_handle: impl Into<String>,
    target: impl Into<String>,
    target_handle: impl Into<String>,
  ) -> Self {
    Self {
      source: source.into(),
      source_handle: source_handle.into(),
      target: target.into(),
      target_handle: target_handle.into(),
    }
  }
}
