//! Executors for node types the engine implements itself.

use std::collections::HashMap;

use async_trait::async_trait;
use flowrun_config::{InputValue, UpdateItem, keys};
use serde_json::Value;
use tracing::debug;

use crate::error::NodeExecutionError;
use crate::executor::{Executor, NodeContext, NodeOutcome, SideEffect};
use crate::input::format_value;

/// Input key of `answer` nodes.
const ANSWER_INPUT: &str = "text";

/// Undeclared output of `variable_update` nodes listing the written values.
const UPDATE_RESULT: &str = "updateVarResult";

/// Exposes the user's chat input to the rest of the graph. The input wins
/// over a seeded variable of the same name.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowStartExecutor;

#[async_trait]
impl Executor for WorkflowStartExecutor {
  async fn run(&self, ctx: NodeContext) -> Result<NodeOutcome, NodeExecutionError> {
    let text = ctx
      .input(keys::USER_CHAT_INPUT)
      .cloned()
      .or_else(|| ctx.snapshot.variables().get(keys::USER_CHAT_INPUT).cloned())
      .unwrap_or_else(|| Value::String(String::new()));

    Ok(NodeOutcome::new().with_output(keys::USER_CHAT_INPUT, text))
  }
}

/// Emits its `text` input as the answer. Non-string values are rendered as
/// pretty JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerExecutor;

#[async_trait]
impl Executor for AnswerExecutor {
  async fn run(&self, ctx: NodeContext) -> Result<NodeOutcome, NodeExecutionError> {
    let text = match ctx.input(ANSWER_INPUT) {
      None | Some(Value::Null) => String::new(),
      Some(Value::String(text)) => text.clone(),
      Some(other) => serde_json::to_string_pretty(other)
        .map_err(|e| NodeExecutionError::new(format!("failed to render answer: {}", e)))?,
    };

    Ok(NodeOutcome::new().with_output(keys::ANSWER_TEXT, Value::String(text)))
  }
}

/// Applies the node's `updateList`.
///
/// Items targeting the variable sentinel are written to the store right
/// away. Variable references read the step-start snapshot overlaid with
/// this node's own earlier writes, so a later item in the same list sees
/// the new value while sibling nodes of the same step never do. Items
/// targeting a node output become [`SideEffect::Overwrite`]s. Items with an
/// incomplete target are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariableUpdateExecutor;

#[async_trait]
impl Executor for VariableUpdateExecutor {
  async fn run(&self, ctx: NodeContext) -> Result<NodeOutcome, NodeExecutionError> {
    let items: Vec<UpdateItem> = match ctx.input(keys::UPDATE_LIST) {
      None | Some(Value::Null) => Vec::new(),
      Some(list) => serde_json::from_value(list.clone())
        .map_err(|e| NodeExecutionError::new(format!("invalid {}: {}", keys::UPDATE_LIST, e)))?,
    };

    let mut outcome = NodeOutcome::new().with_points(0.0);
    let mut written = Vec::with_capacity(items.len());
    let mut own_writes: HashMap<String, Value> = HashMap::new();

    for item in items {
      if !item.variable.is_complete() {
        continue;
      }

      let value = match item.value {
        InputValue::Literal(value) => format_value(value, item.value_type),
        InputValue::Reference(reference) if reference.is_variable() => own_writes
          .get(&reference.output_key)
          .or_else(|| ctx.snapshot.variables().get(&reference.output_key))
          .map(|value| format_value(value.clone(), item.value_type))
          .unwrap_or(Value::Null),
        InputValue::Reference(reference) => ctx
          .snapshot
          .resolve(&reference, item.value_type)
          .unwrap_or(Value::Null),
      };

      debug!(target_ref = %item.variable, value = %value, "variable_update_item");
      written.push(value.clone());

      if item.variable.is_variable() {
        own_writes.insert(item.variable.output_key.clone(), value.clone());
        ctx.variables.set(item.variable.output_key, value);
      } else {
        outcome = outcome.with_effect(SideEffect::Overwrite {
          target: item.variable,
          value,
        });
      }
    }

    Ok(outcome.with_output(UPDATE_RESULT, Value::Array(written)))
  }
}
