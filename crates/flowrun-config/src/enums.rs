use serde::{Deserialize, Serialize};

/// Declared value type of a node input or output.
///
/// The type decides how a resolved value is coerced before it reaches an
/// executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
  String,
  Number,
  Boolean,
  Object,
  ArrayString,
  ArrayNumber,
  ArrayBoolean,
  ArrayObject,
  #[default]
  Any,
  ChatHistory,
  DatasetQuote,
  SelectDataset,
  SelectApp,
  Tools,
  Dynamic,
}

impl ValueType {
  /// Types whose literal form may arrive as a serialized JSON string and are
  /// parsed back into structured values during coercion.
  pub fn is_structured(&self) -> bool {
    matches!(
      self,
      ValueType::Object
        | ValueType::ArrayString
        | ValueType::ArrayNumber
        | ValueType::ArrayBoolean
        | ValueType::ArrayObject
        | ValueType::ChatHistory
        | ValueType::DatasetQuote
        | ValueType::SelectDataset
    )
  }
}

/// How an output gets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
  /// Configured in the editor; the value is part of the graph definition.
  Static,
  /// Produced by the node's executor.
  #[default]
  Source,
  /// Added by the executor at run time under a key the template did not
  /// declare up front.
  Dynamic,
}

/// The closed set of node types. A node's type selects its executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
  WorkflowStart,
  Answer,
  ChatNode,
  DatasetSearch,
  HttpRequest,
  Tools,
  IfElse,
  VariableUpdate,
  PluginInput,
  PluginOutput,
}

impl NodeType {
  pub fn as_str(&self) -> &'static str {
    match self {
      NodeType::WorkflowStart => "workflow_start",
      NodeType::Answer => "answer",
      NodeType::ChatNode => "chat_node",
      NodeType::DatasetSearch => "dataset_search",
      NodeType::HttpRequest => "http_request",
      NodeType::Tools => "tools",
      NodeType::IfElse => "if_else",
      NodeType::VariableUpdate => "variable_update",
      NodeType::PluginInput => "plugin_input",
      NodeType::PluginOutput => "plugin_output",
    }
  }
}

impl std::fmt::Display for NodeType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}
