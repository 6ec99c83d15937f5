use serde::{Deserialize, Serialize};

use crate::enums::{NodeType, OutputKind, ValueType};
use crate::input::InputDef;

/// A declared node output. Its key doubles as the source handle of edges
/// leaving the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDef {
  pub key: String,
  #[serde(default)]
  pub value_type: ValueType,
  #[serde(default)]
  pub kind: OutputKind,
  /// Only meaningful for static outputs in a persisted graph.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<serde_json::Value>,
}

impl OutputDef {
  pub fn source(key: impl Into<String>, value_type: ValueType) -> Self {
    Self {
      key: key.into(),
      value_type,
      kind: OutputKind::Source,
      value: None,
    }
  }

  pub fn fixed(key: impl Into<String>, value_type: ValueType, value: serde_json::Value) -> Self {
    Self {
      key: key.into(),
      value_type,
      kind: OutputKind::Static,
      value: Some(value),
    }
  }

  /// An output whose value selects which of its edges activate.
  pub fn is_branching(&self) -> bool {
    self.value_type == ValueType::Tools
  }
}

/// A node as persisted in the graph definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreNode {
  pub node_id: String,
  pub node_type: NodeType,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub inputs: Vec<InputDef>,
  #[serde(default)]
  pub outputs: Vec<OutputDef>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
}

impl StoreNode {
  pub fn new(node_id: impl Into<String>, node_type: NodeType) -> Self {
    let node_id = node_id.into();
    Self {
      name: node_id.clone(),
      node_id,
      node_type,
      inputs: Vec::new(),
      outputs: Vec::new(),
      timeout_ms: None,
    }
  }

  pub fn with_input(mut self, input: InputDef) -> Self {
    self.inputs.push(input);
    self
  }

  pub fn with_output(mut self, output: OutputDef) -> Self {
    self.outputs.push(output);
    self
  }

  pub fn input(&self, key: &str) -> Option<&InputDef> {
    self.inputs.iter().find(|input| input.key == key)
  }

  pub fn output(&self, key: &str) -> Option<&OutputDef> {
    self.outputs.iter().find(|output| output.key == key)
  }
}
