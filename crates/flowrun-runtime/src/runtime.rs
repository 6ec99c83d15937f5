//! Graph walker.
//!
//! A [`Runtime`] owns the executor registry and configuration and starts
//! runs. A [`RunHandle`] owns one run's nodes, edges, variables, and ready
//! set, and advances them one step at a time:
//!
//! 1. every node in the ready set is checked against its incoming edges
//!    and its inputs are resolved from a snapshot taken at the step start
//! 2. runnable nodes are dispatched concurrently and joined
//! 3. outputs and side effects are applied, outgoing edges are settled,
//!    and skips are propagated
//! 4. the next ready set is every pending node whose incoming edges are
//!    settled with at least one active, in node order
//!
//! Nothing in a step depends on task completion order, so a fixed graph
//! with fixed executor outputs always yields the same sequence of ready
//! sets.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use flowrun_config::{InputValue, WorkflowDef};
use flowrun_workflow::{
  EdgeStatus, Graph, NodeStatus, RuntimeEdge, RuntimeNode, WorkflowError, build_runtime,
};
use futures::future::join_all;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::edges::{
  NodeRunStatus, node_run_status, propagate_skips, settle_outgoing_edges, skip_outgoing_edges,
};
use crate::error::{NodeError, RuntimeError};
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::executor::{Executor, ExecutorRegistry, NodeContext, NodeOutcome, SideEffect};
use crate::input::{MissingInput, Snapshot, resolve_inputs};
use crate::result::{NodeResponse, RunResult, RunStatus, StepResult};
use crate::variables::VariableStore;

/// Handle for a spawned node dispatch.
type NodeHandle = JoinHandle<(Result<NodeOutcome, NodeError>, Duration)>;

/// Configuration for the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
  /// Applies to nodes without their own `timeout_ms`.
  pub node_timeout: Option<Duration>,
  /// Let [`RunHandle::step_once`] run through steps that dispatch nothing.
  pub skip_empty_steps: bool,
}

impl Default for RuntimeConfig {
  fn default() -> Self {
    Self {
      node_timeout: None,
      skip_empty_steps: true,
    }
  }
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
  /// Waiting for the caller to request the next step.
  Idle,
  Stepping,
  /// The ready set is empty.
  Completed,
  /// The ready set is empty and an entry node failed.
  Failed,
  /// Cancelled by the caller. No further steps are dispatched.
  Stopped,
}

/// The workflow runtime.
#[derive(Clone)]
pub struct Runtime {
  registry: Arc<ExecutorRegistry>,
  config: RuntimeConfig,
  notifier: Arc<dyn ExecutionNotifier>,
}

impl Runtime {
  pub fn new(registry: ExecutorRegistry, config: RuntimeConfig) -> Self {
    Self {
      registry: Arc::new(registry),
      config,
      notifier: Arc::new(NoopNotifier),
    }
  }

  /// Send run events to `notifier`.
  pub fn with_notifier(mut self, notifier: impl ExecutionNotifier + 'static) -> Self {
    self.notifier = Arc::new(notifier);
    self
  }

  pub fn config(&self) -> &RuntimeConfig {
    &self.config
  }

  /// Start a run over an already converted graph.
  ///
  /// Edge statuses are taken as given, so a partially executed graph can be
  /// resumed. With no entry ids the run starts at the nodes without incoming
  /// edges.
  #[instrument(name = "start_run", skip_all, fields(entry_node_ids = ?entry_node_ids))]
  pub fn start_run(
    &self,
    entry_node_ids: &[String],
    mut nodes: Vec<RuntimeNode>,
    edges: Vec<RuntimeEdge>,
    seed_variables: HashMap<String, Value>,
  ) -> Result<RunHandle, RuntimeError> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
      if index.insert(node.node_id.clone(), i).is_some() {
        return Err(WorkflowError::DuplicateNode(node.node_id.clone()).into());
      }
    }
    for edge in &edges {
      if !index.contains_key(&edge.source) || !index.contains_key(&edge.target) {
        return Err(
          WorkflowError::InvalidEdge {
            from: edge.source.clone(),
            to: edge.target.clone(),
          }
          .into(),
        );
      }
    }

    let graph = Graph::new(&nodes, &edges);
    let entries = if entry_node_ids.is_empty() {
      graph.entry_points().to_vec()
    } else {
      entry_node_ids.to_vec()
    };
    if let Some(missing) = entries.iter().find(|id| !index.contains_key(*id)) {
      return Err(WorkflowError::EntryNotFound(missing.clone()).into());
    }

    for node in &mut nodes {
      node.is_entry = entries.contains(&node.node_id);
    }
    let ready: Vec<String> = nodes
      .iter()
      .filter(|node| node.is_entry)
      .map(|node| node.node_id.clone())
      .collect();

    let run_id = uuid::Uuid::new_v4().to_string();
    info!(
      run_id = %run_id,
      entry_node_ids = ?ready,
      node_count = nodes.len(),
      edge_count = edges.len(),
      "run_started"
    );
    self.notifier.notify(ExecutionEvent::RunStarted {
      run_id: run_id.clone(),
      entry_node_ids: ready.clone(),
    });

    Ok(RunHandle {
      run_id,
      nodes,
      edges,
      graph,
      index,
      variables: VariableStore::with_values(seed_variables),
      entry_node_ids: ready.clone(),
      ready,
      phase: RunPhase::Idle,
      cancel: CancellationToken::new(),
      registry: self.registry.clone(),
      config: self.config.clone(),
      notifier: self.notifier.clone(),
      results: Vec::new(),
      errors: Vec::new(),
    })
  }

  /// Validate and convert a definition, then start a run over it.
  pub fn start_workflow(
    &self,
    def: &WorkflowDef,
    entry_node_ids: &[String],
    seed_variables: HashMap<String, Value>,
  ) -> Result<RunHandle, RuntimeError> {
    let entries = if entry_node_ids.is_empty() {
      root_node_ids(def)
    } else {
      entry_node_ids.to_vec()
    };
    let (nodes, edges) = build_runtime(def, &entries)?;
    self.start_run(&entries, nodes, edges, seed_variables)
  }
}

/// Nodes no edge points at.
fn root_node_ids(def: &WorkflowDef) -> Vec<String> {
  def
    .nodes
    .iter()
    .filter(|node| !def.edges.iter().any(|edge| edge.target == node.node_id))
    .map(|node| node.node_id.clone())
    .collect()
}

/// One execution of a graph.
pub struct RunHandle {
  run_id: String,
  nodes: Vec<RuntimeNode>,
  edges: Vec<RuntimeEdge>,
  graph: Graph,
  /// node_id -> position in `nodes`.
  index: HashMap<String, usize>,
  variables: VariableStore,
  /// Entry nodes of the current run, used for the final status.
  entry_node_ids: Vec<String>,
  ready: Vec<String>,
  phase: RunPhase,
  cancel: CancellationToken,
  registry: Arc<ExecutorRegistry>,
  config: RuntimeConfig,
  notifier: Arc<dyn ExecutionNotifier>,
  results: Vec<NodeResponse>,
  errors: Vec<NodeError>,
}

impl RunHandle {
  pub fn run_id(&self) -> &str {
    &self.run_id
  }

  pub fn phase(&self) -> RunPhase {
    self.phase
  }

  pub fn nodes(&self) -> &[RuntimeNode] {
    &self.nodes
  }

  pub fn edges(&self) -> &[RuntimeEdge] {
    &self.edges
  }

  pub fn node(&self, node_id: &str) -> Option<&RuntimeNode> {
    self.index.get(node_id).map(|&i| &self.nodes[i])
  }

  /// Nodes the next step will consider, in node order.
  pub fn ready(&self) -> &[String] {
    &self.ready
  }

  pub fn variables(&self) -> &VariableStore {
    &self.variables
  }

  /// Responses of every node dispatched so far.
  pub fn results(&self) -> &[NodeResponse] {
    &self.results
  }

  pub fn errors(&self) -> &[NodeError] {
    &self.errors
  }

  /// A token that stops the run when cancelled, usable while a step is in
  /// flight.
  pub fn cancel_token(&self) -> CancellationToken {
    self.cancel.clone()
  }

  /// Stop the run. Steps in flight are abandoned and no further step is
  /// dispatched.
  pub fn stop(&mut self) {
    self.cancel.cancel();
    self.mark_stopped();
  }

  pub fn status(&self) -> RunStatus {
    let entry_failed = self
      .entry_node_ids
      .iter()
      .filter_map(|id| self.index.get(id))
      .any(|&i| self.nodes[i].status == NodeStatus::Failed);

    if entry_failed {
      RunStatus::Failed
    } else if self.errors.is_empty() {
      RunStatus::Succeeded
    } else {
      RunStatus::PartiallyFailed
    }
  }

  /// Execute one step and return control.
  ///
  /// A step that dispatched nothing but left nodes ready is followed by the
  /// next one right away (unless disabled in [`RuntimeConfig`]), so the
  /// caller never sees a no-op step. Skips and errors of the steps passed
  /// through are carried into the returned result.
  #[instrument(name = "step_once", skip(self), fields(run_id = %self.run_id))]
  pub async fn step_once(&mut self) -> Result<StepResult, RuntimeError> {
    let mut result = self.step().await?;

    while self.config.skip_empty_steps && result.is_empty() && !result.next_ready.is_empty() {
      debug!(run_id = %self.run_id, next_ready = ?result.next_ready, "advancing past empty step");
      let mut next = self.step().await?;
      result.skipped.append(&mut next.skipped);
      result.errors.append(&mut next.errors);
      next.skipped = std::mem::take(&mut result.skipped);
      next.errors = std::mem::take(&mut result.errors);
      result = next;
    }

    Ok(result)
  }

  /// Execute steps until the ready set is empty.
  #[instrument(name = "run_to_completion", skip(self), fields(run_id = %self.run_id))]
  pub async fn run_to_completion(&mut self) -> Result<RunResult, RuntimeError> {
    while !self.ready.is_empty() {
      self.step().await?;
    }
    self.finish();
    Ok(self.run_result())
  }

  /// Begin a fresh pass from a new entry set.
  ///
  /// Every node returns to `pending` and forgets its run-time outputs. Edges
  /// into the new entries become `active`, all others `waiting`. Global
  /// variables are kept.
  #[instrument(name = "run_restart", skip(self), fields(run_id = %self.run_id))]
  pub fn restart(&mut self, entry_node_ids: &[String]) -> Result<(), RuntimeError> {
    if let Some(missing) = entry_node_ids.iter().find(|id| !self.index.contains_key(*id)) {
      return Err(RuntimeError::NodeNotFound {
        node_id: missing.clone(),
      });
    }

    for node in &mut self.nodes {
      node.status = NodeStatus::Pending;
      node.clear_outputs();
      node.is_entry = entry_node_ids.contains(&node.node_id);
    }
    for edge in &mut self.edges {
      edge.status = if entry_node_ids.contains(&edge.target) {
        EdgeStatus::Active
      } else {
        EdgeStatus::Waiting
      };
    }

    self.ready = self
      .nodes
      .iter()
      .filter(|node| node.is_entry)
      .map(|node| node.node_id.clone())
      .collect();
    self.entry_node_ids = self.ready.clone();
    self.results.clear();
    self.errors.clear();
    self.cancel = CancellationToken::new();
    self.phase = RunPhase::Idle;

    info!(run_id = %self.run_id, entry_node_ids = ?self.ready, "run_restarted");
    Ok(())
  }

  /// Replace input values of a node with literals before it runs.
  /// Keys the node does not declare are ignored.
  pub fn override_inputs(
    &mut self,
    node_id: &str,
    values: Map<String, Value>,
  ) -> Result<(), RuntimeError> {
    let &index = self
      .index
      .get(node_id)
      .ok_or_else(|| RuntimeError::NodeNotFound {
        node_id: node_id.to_string(),
      })?;

    let node = &mut self.nodes[index];
    for (key, value) in values {
      match node.input_mut(&key) {
        Some(input) => input.value = Some(InputValue::Literal(value)),
        None => warn!(node_id = %node_id, input = %key, "ignoring override of unknown input"),
      }
    }
    Ok(())
  }

  /// Snapshot of the run as a result.
  pub fn run_result(&self) -> RunResult {
    RunResult {
      run_id: self.run_id.clone(),
      finished_nodes: self.nodes.clone(),
      finished_edges: self.edges.clone(),
      results: self.results.clone(),
      errors: self.errors.clone(),
      variables: self.variables.snapshot(),
      status: self.status(),
    }
  }

  async fn step(&mut self) -> Result<StepResult, RuntimeError> {
    if self.cancel.is_cancelled() {
      self.mark_stopped();
      return Err(RuntimeError::Cancelled);
    }
    self.phase = RunPhase::Stepping;

    let ready = std::mem::take(&mut self.ready);
    for node in &mut self.nodes {
      node.is_entry = ready.contains(&node.node_id);
    }
    let snapshot = Arc::new(Snapshot::capture(&self.nodes, &self.variables));

    let mut skipped = Vec::new();
    let mut errors = Vec::new();
    let mut deferred = HashSet::new();
    let mut dispatch = Vec::new();

    for node_id in &ready {
      let Some(&index) = self.index.get(node_id) else {
        continue;
      };
      if self.nodes[index].is_terminal() {
        continue;
      }

      match node_run_status(node_id, &self.edges) {
        NodeRunStatus::Wait => {
          debug!(run_id = %self.run_id, node_id = %node_id, "node_waiting");
        }
        NodeRunStatus::Skip => {
          self.nodes[index].status = NodeStatus::Skipped;
          skip_outgoing_edges(node_id, &mut self.edges);
          skipped.push(node_id.clone());
        }
        NodeRunStatus::Run => match resolve_inputs(&self.nodes[index], &snapshot) {
          Ok(inputs) => dispatch.push((index, inputs)),
          Err(missing) => {
            let blocking = missing.iter().find(|m| !self.may_resolve_later(m));
            match blocking {
              Some(m) => {
                let err = resolution_error(node_id, m);
                self.fail_node(index, &err);
                errors.push(err);
              }
              None => {
                debug!(run_id = %self.run_id, node_id = %node_id, "node_deferred");
                deferred.insert(node_id.clone());
              }
            }
          }
        },
      }
    }

    let mut indices = Vec::with_capacity(dispatch.len());
    let mut handles = Vec::with_capacity(dispatch.len());
    for (index, inputs) in dispatch {
      handles.push(self.spawn_node(index, inputs, &snapshot));
      indices.push(index);
    }
    let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();

    // Wait for the whole ready set
    let cancel = self.cancel.clone();
    let joined = tokio::select! {
      joined = join_all(handles) => joined,
      _ = cancel.cancelled() => {
        for abort in aborts {
          abort.abort();
        }
        warn!(run_id = %self.run_id, "run cancelled during step");
        self.mark_stopped();
        return Err(RuntimeError::Cancelled);
      }
    };

    let mut results = Vec::with_capacity(indices.len());
    let mut effects = Vec::new();
    let mut succeeded = Vec::new();

    for (index, joined) in indices.into_iter().zip(joined) {
      let node_id = self.nodes[index].node_id.clone();
      let node_type = self.nodes[index].node_type;
      let (outcome, elapsed) = match joined {
        Ok(pair) => pair,
        Err(e) if e.is_panic() => (
          Err(NodeError::Execution {
            node_id: node_id.clone(),
            message: format!("executor panicked: {}", e),
          }),
          Duration::ZERO,
        ),
        Err(e) => {
          return Err(RuntimeError::TaskJoin {
            message: e.to_string(),
          });
        }
      };
      let run_time_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

      match outcome {
        Ok(outcome) => {
          let node = &mut self.nodes[index];
          node.status = NodeStatus::Success;
          for (key, value) in &outcome.outputs {
            node.set_output(key, value.clone());
          }

          info!(
            run_id = %self.run_id,
            node_id = %node_id,
            run_time_ms,
            "node_completed"
          );
          self.notifier.notify(ExecutionEvent::NodeCompleted {
            run_id: self.run_id.clone(),
            node_id: node_id.clone(),
            outputs: outcome.outputs.clone(),
          });

          effects.extend(outcome.effects);
          succeeded.push(index);
          results.push(NodeResponse {
            node_id,
            node_type,
            status: NodeStatus::Success,
            outputs: outcome.outputs,
            error: None,
            run_time_ms,
            total_points: outcome.metrics.total_points,
          });
        }
        Err(err) => {
          self.fail_node(index, &err);
          results.push(NodeResponse {
            node_id,
            node_type,
            status: NodeStatus::Failed,
            outputs: Map::new(),
            error: Some(err.clone()),
            run_time_ms,
            total_points: 0.0,
          });
          errors.push(err);
        }
      }
    }

    for effect in effects {
      self.apply_effect(effect);
    }
    for index in succeeded {
      settle_outgoing_edges(&self.nodes[index], &mut self.edges);
    }
    skipped.extend(propagate_skips(&mut self.nodes, &mut self.edges));

    for node_id in &skipped {
      info!(run_id = %self.run_id, node_id = %node_id, "node_skipped");
      self.notifier.notify(ExecutionEvent::NodeSkipped {
        run_id: self.run_id.clone(),
        node_id: node_id.clone(),
      });
    }

    // Nothing changed, so nothing can still produce what deferred nodes need
    let progressed = !results.is_empty() || !skipped.is_empty() || !errors.is_empty();
    if !progressed && !deferred.is_empty() {
      errors.extend(self.fail_deferred(&deferred));
      deferred.clear();
    }

    let next_ready: Vec<String> = self
      .nodes
      .iter()
      .filter(|node| node.status == NodeStatus::Pending)
      .filter(|node| {
        deferred.contains(&node.node_id)
          || (!self.graph.incoming(&node.node_id).is_empty()
            && node_run_status(&node.node_id, &self.edges) == NodeRunStatus::Run)
      })
      .map(|node| node.node_id.clone())
      .collect();

    info!(
      run_id = %self.run_id,
      dispatched = results.len(),
      skipped = skipped.len(),
      failed = errors.len(),
      next_ready = ?next_ready,
      "step_completed"
    );
    self.notifier.notify(ExecutionEvent::StepCompleted {
      run_id: self.run_id.clone(),
      finished: results.iter().map(|r| r.node_id.clone()).collect(),
      next_ready: next_ready.clone(),
    });

    self.results.extend(results.iter().cloned());
    self.errors.extend(errors.iter().cloned());
    self.ready = next_ready.clone();
    if self.ready.is_empty() {
      self.finish();
    } else {
      self.phase = RunPhase::Idle;
    }

    Ok(StepResult {
      finished_nodes: self.nodes.clone(),
      finished_edges: self.edges.clone(),
      next_ready,
      results,
      skipped,
      errors,
    })
  }

  /// Mark a node running and dispatch it on its own task.
  fn spawn_node(
    &mut self,
    index: usize,
    inputs: Map<String, Value>,
    snapshot: &Arc<Snapshot>,
  ) -> NodeHandle {
    let node = &mut self.nodes[index];
    node.status = NodeStatus::Running;
    let node_id = node.node_id.clone();
    let node_type = node.node_type;
    let timeout = node
      .timeout_ms
      .map(Duration::from_millis)
      .or(self.config.node_timeout);

    let inputs_json = Value::Object(inputs.clone());
    info!(
      run_id = %self.run_id,
      node_id = %node_id,
      node_type = %node_type,
      inputs = %inputs_json,
      "node_started"
    );
    self.notifier.notify(ExecutionEvent::NodeStarted {
      run_id: self.run_id.clone(),
      node_id: node_id.clone(),
    });

    let executor = self.registry.get(node_type);
    let ctx = NodeContext {
      run_id: self.run_id.clone(),
      node_id,
      node_type,
      inputs,
      variables: self.variables.clone(),
      snapshot: snapshot.clone(),
    };

    tokio::spawn(async move {
      let started = Instant::now();
      let result = dispatch(executor, ctx, timeout).await;
      (result, started.elapsed())
    })
  }

  /// Whether a missing input might still be produced by a later step.
  fn may_resolve_later(&self, missing: &MissingInput) -> bool {
    match &missing.reference {
      None => false,
      Some(reference) if reference.is_variable() => true,
      Some(reference) => self
        .index
        .get(&reference.node_id)
        .is_some_and(|&i| !self.nodes[i].is_terminal()),
    }
  }

  /// Fail deferred nodes, in node order, with the input that blocks them.
  fn fail_deferred(&mut self, deferred: &HashSet<String>) -> Vec<NodeError> {
    let snapshot = Snapshot::capture(&self.nodes, &self.variables);
    let mut errors = Vec::new();

    for index in 0..self.nodes.len() {
      if !deferred.contains(&self.nodes[index].node_id) {
        continue;
      }
      let Err(missing) = resolve_inputs(&self.nodes[index], &snapshot) else {
        continue;
      };
      let Some(first) = missing.first() else {
        continue;
      };
      let err = resolution_error(&self.nodes[index].node_id, first);
      self.fail_node(index, &err);
      errors.push(err);
    }

    errors
  }

  fn fail_node(&mut self, index: usize, err: &NodeError) {
    let node = &mut self.nodes[index];
    node.status = NodeStatus::Failed;
    error!(run_id = %self.run_id, node_id = %node.node_id, error = %err, "node_failed");
    self.notifier.notify(ExecutionEvent::NodeFailed {
      run_id: self.run_id.clone(),
      node_id: node.node_id.clone(),
      error: err.to_string(),
    });
  }

  fn apply_effect(&mut self, effect: SideEffect) {
    match effect {
      SideEffect::Overwrite { target, value } => {
        if target.is_variable() {
          debug!(run_id = %self.run_id, variable = %target.output_key, "variable_overwritten");
          self.variables.set(target.output_key, value);
          return;
        }

        let node = self.index.get(&target.node_id).map(|&i| &mut self.nodes[i]);
        match node {
          Some(node)
            if node.output(&target.output_key).is_some()
              || node.extra_outputs.contains_key(&target.output_key) =>
          {
            debug!(run_id = %self.run_id, target = %target, "output_overwritten");
            node.set_output(&target.output_key, value);
          }
          _ => warn!(run_id = %self.run_id, target = %target, "overwrite target not found"),
        }
      }
    }
  }

  fn finish(&mut self) {
    if matches!(
      self.phase,
      RunPhase::Completed | RunPhase::Failed | RunPhase::Stopped
    ) {
      return;
    }

    let status = self.status();
    self.phase = if status == RunStatus::Failed {
      RunPhase::Failed
    } else {
      RunPhase::Completed
    };

    info!(
      run_id = %self.run_id,
      status = ?status,
      failed_nodes = self.errors.len(),
      "run_completed"
    );
    self.notifier.notify(ExecutionEvent::RunCompleted {
      run_id: self.run_id.clone(),
      failed_nodes: self.errors.len(),
    });
  }

  fn mark_stopped(&mut self) {
    if self.phase == RunPhase::Stopped {
      return;
    }
    self.phase = RunPhase::Stopped;
    for node in &mut self.nodes {
      if node.status == NodeStatus::Running {
        node.status = NodeStatus::Pending;
      }
    }

    warn!(run_id = %self.run_id, "run_cancelled");
    self.notifier.notify(ExecutionEvent::RunCancelled {
      run_id: self.run_id.clone(),
    });
  }
}

impl std::fmt::Debug for RunHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RunHandle")
      .field("run_id", &self.run_id)
      .field("phase", &self.phase)
      .field("ready", &self.ready)
      .finish_non_exhaustive()
  }
}

/// Run an executor under the node's timeout.
async fn dispatch(
  executor: Option<Arc<dyn Executor>>,
  ctx: NodeContext,
  timeout: Option<Duration>,
) -> Result<NodeOutcome, NodeError> {
  let node_id = ctx.node_id.clone();
  let Some(executor) = executor else {
    return Err(NodeError::Execution {
      message: format!("no executor registered for node type '{}'", ctx.node_type),
      node_id,
    });
  };

  let run = executor.run(ctx);
  let result = match timeout {
    Some(limit) => tokio::time::timeout(limit, run)
      .await
      .map_err(|_| NodeError::Timeout {
        node_id: node_id.clone(),
      })?,
    None => run.await,
  };

  result.map_err(|e| NodeError::Execution {
    node_id,
    message: e.message,
  })
}

fn resolution_error(node_id: &str, missing: &MissingInput) -> NodeError {
  NodeError::Resolution {
    node_id: node_id.to_string(),
    input_key: missing.input_key.clone(),
    reference: missing.reference.clone(),
  }
}
