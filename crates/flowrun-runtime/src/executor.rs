//! Node dispatch table.
//!
//! Each [`NodeType`] maps to one [`Executor`]. Executors receive their
//! resolved inputs and the run's [`VariableStore`] and return a
//! [`NodeOutcome`]. They never touch another node's state directly: writes
//! to other nodes travel back as [`SideEffect`]s and are applied by the
//! walker once the whole ready set has finished.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use flowrun_config::{NodeType, Reference};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::builtin::{AnswerExecutor, VariableUpdateExecutor, WorkflowStartExecutor};
use crate::error::NodeExecutionError;
use crate::input::Snapshot;
use crate::variables::VariableStore;

/// Everything an executor gets to see.
#[derive(Debug, Clone)]
pub struct NodeContext {
  pub run_id: String,
  pub node_id: String,
  pub node_type: NodeType,
  /// Inputs after resolution and coercion. Unresolved optional inputs are
  /// absent.
  pub inputs: Map<String, Value>,
  pub variables: VariableStore,
  /// Upstream state at the start of the step.
  pub snapshot: Arc<Snapshot>,
}

impl NodeContext {
  pub fn input(&self, key: &str) -> Option<&Value> {
    self.inputs.get(key)
  }

  pub fn input_str(&self, key: &str) -> Option<&str> {
    self.inputs.get(key).and_then(Value::as_str)
  }
}

/// A write to state the executor does not own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SideEffect {
  /// Replace an already produced output of another node, or a global
  /// variable when the target is the variable sentinel.
  Overwrite { target: Reference, value: Value },
}

/// Accounting reported by an executor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeMetrics {
  pub total_points: f64,
}

/// What a node produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeOutcome {
  pub outputs: Map<String, Value>,
  pub effects: Vec<SideEffect>,
  pub metrics: NodeMetrics,
}

impl NodeOutcome {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_outputs(outputs: Map<String, Value>) -> Self {
    Self {
      outputs,
      ..Self::default()
    }
  }

  pub fn with_output(mut self, key: impl Into<String>, value: Value) -> Self {
    self.outputs.insert(key.into(), value);
    self
  }

  pub fn with_effect(mut self, effect: SideEffect) -> Self {
    self.effects.push(effect);
    self
  }

  pub fn with_points(mut self, total_points: f64) -> Self {
    self.metrics.total_points = total_points;
    self
  }
}

/// Business logic for one node type.
#[async_trait]
pub trait Executor: Send + Sync {
  async fn run(&self, ctx: NodeContext) -> Result<NodeOutcome, NodeExecutionError>;
}

/// Adapts an async closure into an [`Executor`].
pub struct FnExecutor<F> {
  f: F,
}

impl<F> FnExecutor<F> {
  pub fn new(f: F) -> Self {
    Self { f }
  }
}

#[async_trait]
impl<F, Fut> Executor for FnExecutor<F>
where
  F: Fn(NodeContext) -> Fut + Send + Sync,
  Fut: Future<Output = Result<NodeOutcome, NodeExecutionError>> + Send,
{
  async fn run(&self, ctx: NodeContext) -> Result<NodeOutcome, NodeExecutionError> {
    (self.f)(ctx).await
  }
}

/// Maps node types to executors.
///
/// [`ExecutorRegistry::default`] comes with the engine's own node types
/// registered. Hosts add the rest.
#[derive(Clone)]
pub struct ExecutorRegistry {
  executors: HashMap<NodeType, Arc<dyn Executor>>,
}

impl ExecutorRegistry {
  /// A registry with nothing registered.
  pub fn empty() -> Self {
    Self {
      executors: HashMap::new(),
    }
  }

  /// A registry with the built-in executors for `workflow_start`, `answer`,
  /// and `variable_update`.
  pub fn with_builtins() -> Self {
    let mut registry = Self::empty();
    registry.register(NodeType::WorkflowStart, WorkflowStartExecutor);
    registry.register(NodeType::Answer, AnswerExecutor);
    registry.register(NodeType::VariableUpdate, VariableUpdateExecutor);
    registry
  }

  /// Register an executor, replacing any previous one for the same type.
  pub fn register(
    &mut self,
    node_type: NodeType,
    executor: impl Executor + 'static,
  ) -> Option<Arc<dyn Executor>> {
    self.executors.insert(node_type, Arc::new(executor))
  }

  /// Register an async closure.
  pub fn register_fn<F, Fut>(&mut self, node_type: NodeType, f: F) -> Option<Arc<dyn Executor>>
  where
    F: Fn(NodeContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<NodeOutcome, NodeExecutionError>> + Send + 'static,
  {
    self.register(node_type, FnExecutor::new(f))
  }

  /// Builder form of [`register_fn`](Self::register_fn).
  pub fn with_fn<F, Fut>(mut self, node_type: NodeType, f: F) -> Self
  where
    F: Fn(NodeContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<NodeOutcome, NodeExecutionError>> + Send + 'static,
  {
    self.register_fn(node_type, f);
    self
  }

  pub fn get(&self, node_type: NodeType) -> Option<Arc<dyn Executor>> {
    self.executors.get(&node_type).cloned()
  }

  pub fn contains(&self, node_type: NodeType) -> bool {
    self.executors.contains_key(&node_type)
  }
}

impl Default for ExecutorRegistry {
  fn default() -> Self {
    Self::with_builtins()
  }
}

impl fmt::Debug for ExecutorRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut types: Vec<_> = self.executors.keys().map(NodeType::as_str).collect();
    types.sort_unstable();
    f.debug_struct("ExecutorRegistry")
      .field("node_types", &types)
      .finish()
  }
}
