//! Input resolution and value coercion.
//!
//! Each input of a node is either a literal or a [`Reference`] to another
//! node's output (or to a global variable). Resolution reads a [`Snapshot`]
//! taken at the ready-set boundary, so every node of one step sees the same
//! upstream state no matter how its siblings are scheduled.
//!
//! # Flow
//! 1. Lookup: literal value, referenced output value, or global variable
//! 2. Coercion: the value is formatted according to the input's declared
//!    [`ValueType`] (see [`format_value`])
//!
//! Coercion is lenient. A value that cannot be converted is passed through
//! unchanged and the mismatch is left to the executor.

use std::collections::HashMap;

use flowrun_config::{InputDef, InputValue, Reference, ValueType};
use flowrun_workflow::RuntimeNode;
use serde_json::{Map, Value};

use crate::variables::VariableStore;

/// Read-only view of node outputs and global variables at one instant.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
  nodes: Vec<RuntimeNode>,
  variables: HashMap<String, Value>,
}

impl Snapshot {
  pub fn new(nodes: Vec<RuntimeNode>, variables: HashMap<String, Value>) -> Self {
    Self { nodes, variables }
  }

  /// Capture the current state of a run.
  pub fn capture(nodes: &[RuntimeNode], variables: &VariableStore) -> Self {
    Self::new(nodes.to_vec(), variables.snapshot())
  }

  pub fn node(&self, node_id: &str) -> Option<&RuntimeNode> {
    self.nodes.iter().find(|node| node.node_id == node_id)
  }

  pub fn variables(&self) -> &HashMap<String, Value> {
    &self.variables
  }

  /// The raw value a reference points at, if it has been produced.
  pub fn lookup(&self, reference: &Reference) -> Option<&Value> {
    if reference.is_variable() {
      return self.variables.get(&reference.output_key);
    }
    self
      .node(&reference.node_id)?
      .output_value(&reference.output_key)
  }

  /// Look up a reference and coerce its value to `value_type`.
  pub fn resolve(&self, reference: &Reference, value_type: ValueType) -> Option<Value> {
    self
      .lookup(reference)
      .map(|value| format_value(value.clone(), value_type))
  }
}

/// Outcome of resolving a single input.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
  Value(Value),
  /// No value configured.
  Absent,
  /// The reference points at something not produced (yet).
  Unresolved(Reference),
}

/// A required input that could not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingInput {
  pub input_key: String,
  pub reference: Option<Reference>,
}

/// Resolve one input against a snapshot.
pub fn resolve_input(input: &InputDef, snapshot: &Snapshot) -> Resolved {
  match &input.value {
    None => Resolved::Absent,
    Some(InputValue::Literal(value)) => Resolved::Value(format_value(value.clone(), input.value_type)),
    Some(InputValue::Reference(reference)) => match snapshot.resolve(reference, input.value_type) {
      Some(value) => Resolved::Value(value),
      None => Resolved::Unresolved(reference.clone()),
    },
  }
}

/// Resolve all inputs of a node.
///
/// Optional inputs that cannot be resolved are left out of the result. Any
/// required input that cannot be resolved is reported instead.
pub fn resolve_inputs(
  node: &RuntimeNode,
  snapshot: &Snapshot,
) -> Result<Map<String, Value>, Vec<MissingInput>> {
  let mut resolved = Map::new();
  let mut missing = Vec::new();

  for input in &node.inputs {
    match resolve_input(input, snapshot) {
      Resolved::Value(value) => {
        resolved.insert(input.key.clone(), value);
      }
      Resolved::Absent if input.required => missing.push(MissingInput {
        input_key: input.key.clone(),
        reference: None,
      }),
      Resolved::Unresolved(reference) if input.required => missing.push(MissingInput {
        input_key: input.key.clone(),
        reference: Some(reference),
      }),
      Resolved::Absent | Resolved::Unresolved(_) => {}
    }
  }

  if missing.is_empty() {
    Ok(resolved)
  } else {
    Err(missing)
  }
}

/// Coerce a value to a declared type.
///
/// - `string`: strings pass through, scalars are stringified, objects and
///   arrays are serialized as JSON
/// - `number`: numeric strings are parsed, booleans become 1 / 0, null
///   and the empty string become 0
/// - `boolean`: truthiness (false, null, 0, and "" are false)
/// - structured types (objects, arrays, chat history, dataset quotes and
///   selections): a string is parsed as JSON, anything else passes through
/// - everything else passes through
pub fn format_value(value: Value, value_type: ValueType) -> Value {
  match value_type {
    ValueType::String => match value {
      Value::String(_) => value,
      Value::Number(n) => Value::String(n.to_string()),
      Value::Bool(b) => Value::String(b.to_string()),
      other => Value::String(other.to_string()),
    },

    ValueType::Number => match value {
      Value::Number(_) => value,
      Value::Bool(b) => Value::from(u8::from(b)),
      Value::Null => Value::from(0),
      Value::String(ref s) => {
        let trimmed = s.trim();
        if trimmed.is_empty() {
          return Value::from(0);
        }
        trimmed
          .parse::<f64>()
          .ok()
          .and_then(number_value)
          .unwrap_or(value)
      }
      other => other,
    },

    ValueType::Boolean => Value::Bool(is_truthy(&value)),

    value_type if value_type.is_structured() => match value {
      Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
      other => other,
    },

    _ => value,
  }
}

/// Integral values are kept as integers so they compare equal to JSON
/// integer literals.
fn number_value(n: f64) -> Option<Value> {
  if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
    return Some(Value::from(n as i64));
  }
  serde_json::Number::from_f64(n).map(Value::Number)
}

fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    Value::String(s) => !s.is_empty(),
    Value::Array(_) | Value::Object(_) => true,
  }
}
