//! Input value types for node configuration.
//!
//! An input either carries a literal JSON value or a reference to another
//! node's output (or to a global variable). References are not followed
//! here; the runtime resolves them once the referenced node has run.
//!
//! # Examples
//!
//! ```json
//! [
//!   { "key": "text", "value_type": "string", "value": { "literal": "hello" } },
//!   {
//!     "key": "count",
//!     "value_type": "number",
//!     "required": true,
//!     "value": { "reference": { "node_id": "fetch", "output_key": "total" } }
//!   }
//! ]
//! ```

use serde::{Deserialize, Serialize};

use crate::enums::ValueType;

/// Sentinel node id that addresses the global variable store instead of a
/// graph node.
pub const VARIABLE_NODE_ID: &str = "VARIABLE_NODE_ID";

/// Pointer to a node output, or to a global variable when `node_id` is
/// [`VARIABLE_NODE_ID`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
  pub node_id: String,
  pub output_key: String,
}

impl Reference {
  pub fn new(node_id: impl Into<String>, output_key: impl Into<String>) -> Self {
    Self {
      node_id: node_id.into(),
      output_key: output_key.into(),
    }
  }

  /// Reference to a global variable.
  pub fn variable(key: impl Into<String>) -> Self {
    Self::new(VARIABLE_NODE_ID, key)
  }

  pub fn is_variable(&self) -> bool {
    self.node_id == VARIABLE_NODE_ID
  }

  /// Both halves are non-empty.
  pub fn is_complete(&self) -> bool {
    !self.node_id.is_empty() && !self.output_key.is_empty()
  }
}

impl std::fmt::Display for Reference {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}.{}", self.node_id, self.output_key)
  }
}

/// The configured value of an input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputValue {
  Literal(serde_json::Value),
  Reference(Reference),
}

impl InputValue {
  pub fn as_reference(&self) -> Option<&Reference> {
    match self {
      InputValue::Reference(reference) => Some(reference),
      InputValue::Literal(_) => None,
    }
  }
}

/// A declared node input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDef {
  pub key: String,
  #[serde(default)]
  pub value_type: ValueType,
  #[serde(default)]
  pub required: bool,
  /// Whether the editor allows binding this input to a reference.
  #[serde(default)]
  pub can_reference: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<InputValue>,
}

impl InputDef {
  pub fn literal(key: impl Into<String>, value_type: ValueType, value: serde_json::Value) -> Self {
    Self {
      key: key.into(),
      value_type,
      required: false,
      can_reference: false,
      value: Some(InputValue::Literal(value)),
    }
  }

  pub fn reference(key: impl Into<String>, value_type: ValueType, reference: Reference) -> Self {
    Self {
      key: key.into(),
      value_type,
      required: false,
      can_reference: true,
      value: Some(InputValue::Reference(reference)),
    }
  }

  pub fn required(mut self) -> Self {
    self.required = true;
    self
  }

  pub fn is_reference(&self) -> bool {
    matches!(self.value, Some(InputValue::Reference(_)))
  }
}

/// One entry of a `variable_update` node's update list.
///
/// `variable` names the target: a global variable (sentinel node id) or an
/// output of another node. `value` is either a literal coerced by
/// `value_type` or a reference whose current value is copied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateItem {
  pub variable: Reference,
  #[serde(default)]
  pub value_type: ValueType,
  pub value: InputValue,
}
