use flowrun_config::{InputDef, NodeType, OutputDef, OutputKind};
use serde::{Deserialize, Serialize};

/// Execution status of a runtime node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
  #[default]
  Pending,
  Running,
  Success,
  Skipped,
  Failed,
}

impl NodeStatus {
  /// The node will not run again in this execution.
  pub fn is_terminal(&self) -> bool {
    matches!(
      self,
      NodeStatus::Success | NodeStatus::Skipped | NodeStatus::Failed
    )
  }
}

/// Status of a runtime edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStatus {
  #[default]
  Waiting,
  Active,
  Skipped,
}

/// One node instance inside one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeNode {
  pub node_id: String,
  pub node_type: NodeType,
  pub name: String,
  pub inputs: Vec<InputDef>,
  pub outputs: Vec<OutputDef>,
  /// Values the executor produced under keys the node does not declare.
  /// They can be referenced but never drive edges.
  #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
  pub extra_outputs: serde_json::Map<String, serde_json::Value>,
  /// The node starts the current step.
  pub is_entry: bool,
  pub status: NodeStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
}

impl RuntimeNode {
  pub fn input(&self, key: &str) -> Option<&InputDef> {
    self.inputs.iter().find(|input| input.key == key)
  }

  pub fn input_mut(&mut self, key: &str) -> Option<&mut InputDef> {
    self.inputs.iter_mut().find(|input| input.key == key)
  }

  pub fn output(&self, key: &str) -> Option<&OutputDef> {
    self.outputs.iter().find(|output| output.key == key)
  }

  /// The produced value of an output, if it is set.
  pub fn output_value(&self, key: &str) -> Option<&serde_json::Value> {
    match self.output(key) {
      Some(output) => output.value.as_ref(),
      None => self.extra_outputs.get(key),
    }
  }

  /// Set an output value. Undeclared keys land in `extra_outputs`.
  pub fn set_output(&mut self, key: &str, value: serde_json::Value) {
    match self.outputs.iter_mut().find(|output| output.key == key) {
      Some(output) => output.value = Some(value),
      None => {
        self.extra_outputs.insert(key.to_string(), value);
      }
    }
  }

  /// Forget everything the node produced at run time. Static outputs keep
  /// their configured value.
  pub fn clear_outputs(&mut self) {
    for output in &mut self.outputs {
      if output.kind != OutputKind::Static {
        output.value = None;
      }
    }
    self.extra_outputs.clear();
  }

  pub fn is_terminal(&self) -> bool {
    self.status.is_terminal()
  }
}

/// A connection between two runtime nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeEdge {
  pub source: String,
  pub source_handle: String,
  pub target: String,
  pub target_handle: String,
  pub status: EdgeStatus,
}

impl RuntimeEdge {
  /// Move a waiting edge to `status`. Settled edges never change; returns
  /// whether the transition happened.
  pub fn settle(&mut self, status: EdgeStatus) -> bool {
    if self.status != EdgeStatus::Waiting || status == EdgeStatus::Waiting {
      return false;
    }
    self.status = status;
    true
  }

  pub fn is_waiting(&self) -> bool {
    self.status == EdgeStatus::Waiting
  }
}
