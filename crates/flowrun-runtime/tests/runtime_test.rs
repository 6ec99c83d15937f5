//! Graph walker behavior with scripted executors standing in for the host's
//! node implementations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use flowrun_config::{
  InputDef, NodeType, OutputDef, Reference, StoreEdge, StoreNode, ValueType, WorkflowDef, keys,
};
use flowrun_runtime::{
  ChannelNotifier, ExecutionEvent, ExecutorRegistry, NodeContext, NodeError, NodeExecutionError,
  NodeOutcome, RunPhase, RunStatus, Runtime, RuntimeConfig, RuntimeError,
};
use flowrun_workflow::{EdgeStatus, NodeStatus, RuntimeEdge, build_runtime};
use serde_json::{Map, Value, json};

type Calls = Arc<Mutex<Vec<(String, Map<String, Value>)>>>;

/// Registers one executor for every host node type. Each node returns the
/// outputs scripted for its id, or `{"out": <node id>}` when unscripted.
/// `$error` fails the node, `$sleep_ms` delays it, `$panic` panics.
fn scripted(script: Value) -> (ExecutorRegistry, Calls) {
  let script = Arc::new(script);
  let calls: Calls = Arc::new(Mutex::new(Vec::new()));
  let mut registry = ExecutorRegistry::default();

  for node_type in [
    NodeType::HttpRequest,
    NodeType::Tools,
    NodeType::ChatNode,
    NodeType::DatasetSearch,
    NodeType::IfElse,
  ] {
    let script = script.clone();
    let calls = calls.clone();
    registry.register_fn(node_type, move |ctx: NodeContext| {
      let script = script.clone();
      let calls = calls.clone();
      async move {
        calls
          .lock()
          .unwrap()
          .push((ctx.node_id.clone(), ctx.inputs.clone()));

        let entry = script
          .get(&ctx.node_id)
          .cloned()
          .unwrap_or_else(|| json!({ "out": ctx.node_id }));
        if let Some(ms) = entry.get("$sleep_ms").and_then(Value::as_u64) {
          tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        if entry.get("$panic").is_some() {
          panic!("scripted panic in {}", ctx.node_id);
        }
        if let Some(message) = entry.get("$error").and_then(Value::as_str) {
          return Err(NodeExecutionError::new(message));
        }

        let outputs = entry
          .as_object()
          .cloned()
          .unwrap_or_default()
          .into_iter()
          .filter(|(key, _)| !key.starts_with('$'))
          .collect();
        Ok(NodeOutcome::from_outputs(outputs))
      }
    });
  }

  (registry, calls)
}

fn inputs_of(calls: &Calls, node_id: &str) -> Option<Map<String, Value>> {
  calls
    .lock()
    .unwrap()
    .iter()
    .find(|(id, _)| id == node_id)
    .map(|(_, inputs)| inputs.clone())
}

fn was_called(calls: &Calls, node_id: &str) -> bool {
  inputs_of(calls, node_id).is_some()
}

fn ids(ids: &[&str]) -> Vec<String> {
  ids.iter().map(|id| id.to_string()).collect()
}

fn task(node_id: &str) -> StoreNode {
  StoreNode::new(node_id, NodeType::HttpRequest).with_output(OutputDef::source("out", ValueType::Any))
}

fn start() -> StoreNode {
  StoreNode::new("start", NodeType::WorkflowStart)
    .with_output(OutputDef::source(keys::USER_CHAT_INPUT, ValueType::String))
}

fn link(source: &str, handle: &str, target: &str) -> StoreEdge {
  StoreEdge::new(source, handle, target, "in")
}

fn workflow(nodes: Vec<StoreNode>, edges: Vec<StoreEdge>) -> WorkflowDef {
  WorkflowDef {
    workflow_id: "test".to_string(),
    name: "Test".to_string(),
    nodes,
    edges,
  }
}

fn seed() -> HashMap<String, Value> {
  HashMap::from([(keys::USER_CHAT_INPUT.to_string(), json!("hello"))])
}

/// node1 -> node2 -> node3
fn linear_chain() -> WorkflowDef {
  workflow(
    vec![task("node1"), task("node2"), task("node3")],
    vec![link("node1", "out", "node2"), link("node2", "out", "node3")],
  )
}

/// t selects among tools p1 and p2.
fn tool_branch() -> WorkflowDef {
  workflow(
    vec![
      StoreNode::new("t", NodeType::Tools)
        .with_output(OutputDef::source(keys::SELECTED_TOOLS, ValueType::Tools)),
      task("p1"),
      task("p2"),
    ],
    vec![
      StoreEdge::new("t", keys::SELECTED_TOOLS, "p1", keys::SELECTED_TOOLS),
      StoreEdge::new("t", keys::SELECTED_TOOLS, "p2", keys::SELECTED_TOOLS),
    ],
  )
}

fn edge_status(edges: &[RuntimeEdge], source: &str, target: &str) -> EdgeStatus {
  edges
    .iter()
    .find(|edge| edge.source == source && edge.target == target)
    .map(|edge| edge.status)
    .unwrap()
}

#[tokio::test]
async fn test_reference_is_coerced_to_declared_type() {
  let def = workflow(
    vec![
      start(),
      StoreNode::new("a", NodeType::HttpRequest)
        .with_output(OutputDef::source("result", ValueType::String)),
      StoreNode::new("b", NodeType::HttpRequest)
        .with_input(
          InputDef::reference("x", ValueType::Number, Reference::new("a", "result")).required(),
        )
        .with_output(OutputDef::source("out", ValueType::Any)),
    ],
    vec![
      link("start", keys::USER_CHAT_INPUT, "a"),
      link("a", "result", "b"),
    ],
  );
  let (registry, calls) = scripted(json!({ "a": { "result": "42" } }));
  let runtime = Runtime::new(registry, RuntimeConfig::default());

  let mut handle = runtime
    .start_workflow(&def, &ids(&["start"]), seed())
    .unwrap();
  let result = handle.run_to_completion().await.unwrap();

  assert_eq!(result.status, RunStatus::Succeeded);
  assert_eq!(inputs_of(&calls, "b").unwrap()["x"], json!(42));
  assert_eq!(
    result.node("start").unwrap().output_value(keys::USER_CHAT_INPUT),
    Some(&json!("hello"))
  );
  assert!(
    result
      .finished_nodes
      .iter()
      .all(|node| node.status == NodeStatus::Success)
  );
  assert!(
    result
      .finished_edges
      .iter()
      .all(|edge| edge.status == EdgeStatus::Active)
  );
  assert_eq!(handle.phase(), RunPhase::Completed);
}

#[tokio::test]
async fn test_branch_activates_only_selected_tools() {
  let (registry, calls) = scripted(json!({ "t": { "selectedTools": ["p2"] } }));
  let runtime = Runtime::new(registry, RuntimeConfig::default());
  let mut handle = runtime
    .start_workflow(&tool_branch(), &ids(&["t"]), HashMap::new())
    .unwrap();

  let step = handle.step_once().await.unwrap();

  assert_eq!(edge_status(&step.finished_edges, "t", "p1"), EdgeStatus::Skipped);
  assert_eq!(edge_status(&step.finished_edges, "t", "p2"), EdgeStatus::Active);
  assert_eq!(handle.node("p1").unwrap().status, NodeStatus::Skipped);
  assert_eq!(step.skipped, ids(&["p1"]));
  assert_eq!(step.next_ready, ids(&["p2"]));

  let step = handle.step_once().await.unwrap();
  assert_eq!(step.response("p2").unwrap().status, NodeStatus::Success);
  assert!(step.next_ready.is_empty());
  assert!(!was_called(&calls, "p1"));
}

#[tokio::test]
async fn test_single_step_ready_sets_are_deterministic() {
  let mut runs = Vec::new();

  for _ in 0..3 {
    let (registry, _) = scripted(json!({}));
    let runtime = Runtime::new(registry, RuntimeConfig::default());
    let mut handle = runtime
      .start_workflow(&linear_chain(), &ids(&["node1"]), HashMap::new())
      .unwrap();

    let mut trace = vec![(handle.ready().to_vec(), Vec::new())];
    while !handle.ready().is_empty() {
      let step = handle.step_once().await.unwrap();
      let statuses: Vec<_> = step.finished_edges.iter().map(|e| e.status).collect();
      trace.push((step.next_ready, statuses));
    }
    assert_eq!(handle.phase(), RunPhase::Completed);
    runs.push(trace);
  }

  let ready_sets: Vec<_> = runs[0].iter().map(|(ready, _)| ready.clone()).collect();
  assert_eq!(
    ready_sets,
    vec![ids(&["node1"]), ids(&["node2"]), ids(&["node3"]), ids(&[])]
  );
  assert_eq!(runs[0], runs[1]);
  assert_eq!(runs[1], runs[2]);
}

#[tokio::test]
async fn test_never_produced_output_is_resolution_error() {
  let def = workflow(
    vec![
      start(),
      StoreNode::new("a", NodeType::HttpRequest)
        .with_output(OutputDef::source("result", ValueType::String))
        .with_output(OutputDef::source("other", ValueType::Number)),
      StoreNode::new("b", NodeType::HttpRequest).with_input(
        InputDef::reference("x", ValueType::String, Reference::new("a", "result")).required(),
      ),
    ],
    vec![
      link("start", keys::USER_CHAT_INPUT, "a"),
      link("a", "other", "b"),
    ],
  );
  let (registry, calls) = scripted(json!({ "a": { "other": 1 } }));
  let runtime = Runtime::new(registry, RuntimeConfig::default());
  let mut handle = runtime
    .start_workflow(&def, &ids(&["start"]), seed())
    .unwrap();

  let result = handle.run_to_completion().await.unwrap();

  assert_eq!(result.node("b").unwrap().status, NodeStatus::Failed);
  assert_eq!(
    result.errors,
    vec![NodeError::Resolution {
      node_id: "b".to_string(),
      input_key: "x".to_string(),
      reference: Some(Reference::new("a", "result")),
    }]
  );
  assert_eq!(result.status, RunStatus::PartiallyFailed);
  assert!(!was_called(&calls, "b"));
}

#[tokio::test]
async fn test_reference_to_skipped_node_fails_dependent() {
  let mut def = tool_branch();
  def.nodes.push(task("q").with_input(
    InputDef::reference("x", ValueType::Any, Reference::new("p1", "out")).required(),
  ));
  def.edges.push(link("p2", "out", "q"));

  let (registry, calls) = scripted(json!({ "t": { "selectedTools": ["p2"] } }));
  let runtime = Runtime::new(registry, RuntimeConfig::default());
  let mut handle = runtime
    .start_workflow(&def, &ids(&["t"]), HashMap::new())
    .unwrap();
  let result = handle.run_to_completion().await.unwrap();

  assert_eq!(result.node("p1").unwrap().status, NodeStatus::Skipped);
  assert_eq!(result.node("p2").unwrap().status, NodeStatus::Success);
  assert_eq!(result.node("q").unwrap().status, NodeStatus::Failed);
  assert!(matches!(
    &result.errors[..],
    [NodeError::Resolution { node_id, reference: Some(reference), .. }]
      if node_id == "q" && *reference == Reference::new("p1", "out")
  ));
  assert!(!was_called(&calls, "q"));
}

#[tokio::test]
async fn test_skip_propagates_without_dispatch() {
  let def = workflow(
    vec![
      StoreNode::new("if", NodeType::IfElse)
        .with_output(OutputDef::source("true", ValueType::Boolean))
        .with_output(OutputDef::source("false", ValueType::Boolean)),
      task("yes"),
      task("no1"),
      task("no2"),
    ],
    vec![
      link("if", "true", "yes"),
      link("if", "false", "no1"),
      link("no1", "out", "no2"),
    ],
  );
  let (registry, calls) = scripted(json!({ "if": { "true": true } }));
  let runtime = Runtime::new(registry, RuntimeConfig::default());
  let mut handle = runtime
    .start_workflow(&def, &ids(&["if"]), HashMap::new())
    .unwrap();

  let step = handle.step_once().await.unwrap();
  assert_eq!(step.skipped, ids(&["no1", "no2"]));
  assert_eq!(step.next_ready, ids(&["yes"]));

  let result = handle.run_to_completion().await.unwrap();
  assert_eq!(result.node("no1").unwrap().status, NodeStatus::Skipped);
  assert_eq!(result.node("no2").unwrap().status, NodeStatus::Skipped);
  assert_eq!(edge_status(&result.finished_edges, "no1", "no2"), EdgeStatus::Skipped);
  assert_eq!(result.status, RunStatus::Succeeded);
  assert!(!was_called(&calls, "no1"));
  assert!(!was_called(&calls, "no2"));
}

#[tokio::test]
async fn test_variable_writes_visible_to_later_steps_only() {
  let update_list = json!([
    {
      "variable": { "node_id": "VARIABLE_NODE_ID", "output_key": "city" },
      "value_type": "string",
      "value": { "literal": "Oslo" }
    },
    {
      "variable": { "node_id": "start", "output_key": "userChatInput" },
      "value_type": "string",
      "value": { "literal": "rewritten" }
    }
  ]);
  let def = workflow(
    vec![
      start(),
      StoreNode::new("update", NodeType::VariableUpdate)
        .with_input(InputDef::literal(keys::UPDATE_LIST, ValueType::Any, update_list))
        .with_output(OutputDef::source("updateVarResult", ValueType::Any)),
      task("peer").with_input(InputDef::reference(
        "city",
        ValueType::String,
        Reference::variable("city"),
      )),
      task("reader").with_input(
        InputDef::reference("city", ValueType::String, Reference::variable("city")).required(),
      ),
    ],
    vec![
      link("start", keys::USER_CHAT_INPUT, "update"),
      link("start", keys::USER_CHAT_INPUT, "peer"),
      link("update", "updateVarResult", "reader"),
    ],
  );
  let (registry, calls) = scripted(json!({}));
  let runtime = Runtime::new(registry, RuntimeConfig::default());
  let mut handle = runtime
    .start_workflow(&def, &ids(&["start"]), seed())
    .unwrap();

  let result = handle.run_to_completion().await.unwrap();

  assert_eq!(result.status, RunStatus::Succeeded);
  assert!(!inputs_of(&calls, "peer").unwrap().contains_key("city"));
  assert_eq!(inputs_of(&calls, "reader").unwrap()["city"], json!("Oslo"));
  assert_eq!(result.variables["city"], json!("Oslo"));
  assert_eq!(
    result.node("start").unwrap().output_value(keys::USER_CHAT_INPUT),
    Some(&json!("rewritten"))
  );
  assert_eq!(result.response("update").unwrap().total_points, 0.0);
}

#[tokio::test]
async fn test_deferred_reference_waits_for_sibling() {
  let def = workflow(
    vec![
      start(),
      StoreNode::new("a", NodeType::HttpRequest)
        .with_output(OutputDef::source("result", ValueType::Number)),
      task("b").with_input(
        InputDef::reference("x", ValueType::Number, Reference::new("a", "result")).required(),
      ),
    ],
    vec![
      link("start", keys::USER_CHAT_INPUT, "a"),
      link("start", keys::USER_CHAT_INPUT, "b"),
    ],
  );
  let (registry, calls) = scripted(json!({ "a": { "result": "7" } }));
  let runtime = Runtime::new(registry, RuntimeConfig::default());
  let mut handle = runtime
    .start_workflow(&def, &ids(&["start"]), seed())
    .unwrap();

  assert_eq!(handle.step_once().await.unwrap().next_ready, ids(&["a", "b"]));

  let step = handle.step_once().await.unwrap();
  assert!(step.response("a").is_some());
  assert!(step.response("b").is_none());
  assert_eq!(step.next_ready, ids(&["b"]));

  let step = handle.step_once().await.unwrap();
  assert_eq!(step.response("b").unwrap().status, NodeStatus::Success);
  assert_eq!(inputs_of(&calls, "b").unwrap()["x"], json!(7));
}

fn update_node(node_id: &str, update_list: Value) -> StoreNode {
  StoreNode::new(node_id, NodeType::VariableUpdate)
    .with_input(InputDef::literal(keys::UPDATE_LIST, ValueType::Any, update_list))
    .with_output(OutputDef::source("updateVarResult", ValueType::Any))
}

#[tokio::test]
async fn test_sibling_updates_read_step_start_variables() {
  let writer = update_node(
    "u1",
    json!([{
      "variable": { "node_id": "VARIABLE_NODE_ID", "output_key": "x" },
      "value_type": "string",
      "value": { "literal": "new" }
    }]),
  );
  let reader = update_node(
    "u2",
    json!([{
      "variable": { "node_id": "VARIABLE_NODE_ID", "output_key": "y" },
      "value_type": "string",
      "value": { "reference": { "node_id": "VARIABLE_NODE_ID", "output_key": "x" } }
    }]),
  );

  // The outcome must not depend on which sibling is listed first
  for order in [
    vec![writer.clone(), reader.clone()],
    vec![reader.clone(), writer.clone()],
  ] {
    let mut nodes = vec![start()];
    nodes.extend(order);
    let def = workflow(
      nodes,
      vec![
        link("start", keys::USER_CHAT_INPUT, "u1"),
        link("start", keys::USER_CHAT_INPUT, "u2"),
      ],
    );
    let (registry, _) = scripted(json!({}));
    let runtime = Runtime::new(registry, RuntimeConfig::default());
    let mut variables = seed();
    variables.insert("x".to_string(), json!("old"));
    let mut handle = runtime
      .start_workflow(&def, &ids(&["start"]), variables)
      .unwrap();

    let result = handle.run_to_completion().await.unwrap();

    assert_eq!(result.status, RunStatus::Succeeded);
    assert_eq!(result.variables["x"], json!("new"));
    assert_eq!(result.variables["y"], json!("old"));
  }
}

#[tokio::test]
async fn test_ready_set_members_run_concurrently() {
  let def = workflow(
    vec![start(), task("a"), task("b")],
    vec![
      link("start", keys::USER_CHAT_INPUT, "a"),
      link("start", keys::USER_CHAT_INPUT, "b"),
    ],
  );
  let (registry, _) = scripted(json!({
    "a": { "$sleep_ms": 200, "out": 1 },
    "b": { "$sleep_ms": 200, "out": 2 },
  }));
  let runtime = Runtime::new(registry, RuntimeConfig::default());
  let mut handle = runtime
    .start_workflow(&def, &ids(&["start"]), seed())
    .unwrap();

  assert_eq!(handle.step_once().await.unwrap().next_ready, ids(&["a", "b"]));

  let started = Instant::now();
  let step = handle.step_once().await.unwrap();
  let elapsed = started.elapsed();

  assert!(elapsed < Duration::from_millis(380), "step took {:?}", elapsed);
  assert_eq!(step.response("a").unwrap().outputs["out"], json!(1));
  assert_eq!(step.response("b").unwrap().outputs["out"], json!(2));
  assert!(step.response("a").unwrap().run_time_ms >= 200);
  assert!(step.next_ready.is_empty());
}

#[tokio::test]
async fn test_empty_step_is_advanced_past() {
  let def = workflow(
    vec![task("s"), task("a"), task("b"), task("c")],
    vec![
      link("s", "out", "a"),
      link("a", "out", "b"),
      link("c", "out", "b"),
    ],
  );

  for skip_empty_steps in [true, false] {
    // Resume a graph where s and c already ran and s skipped its edge to a.
    let (mut nodes, mut edges) = build_runtime(&def, &ids(&["a"])).unwrap();
    for node in nodes.iter_mut().filter(|n| n.node_id == "s" || n.node_id == "c") {
      node.status = NodeStatus::Success;
      node.set_output("out", json!("done"));
    }
    edges[0].status = EdgeStatus::Skipped;
    edges[2].status = EdgeStatus::Active;

    let (registry, _) = scripted(json!({}));
    let config = RuntimeConfig {
      skip_empty_steps,
      ..RuntimeConfig::default()
    };
    let mut handle = Runtime::new(registry, config)
      .start_run(&ids(&["a"]), nodes, edges, HashMap::new())
      .unwrap();

    let step = handle.step_once().await.unwrap();
    assert_eq!(step.skipped, ids(&["a"]));
    if skip_empty_steps {
      assert_eq!(step.response("b").unwrap().status, NodeStatus::Success);
      assert!(step.next_ready.is_empty());
    } else {
      assert!(step.is_empty());
      assert_eq!(step.next_ready, ids(&["b"]));
    }
  }
}

#[tokio::test]
async fn test_execution_failure_isolates_branch() {
  let def = workflow(
    vec![start(), task("a"), task("b"), task("c"), task("d")],
    vec![
      link("start", keys::USER_CHAT_INPUT, "a"),
      link("start", keys::USER_CHAT_INPUT, "b"),
      link("b", "out", "c"),
      link("a", "out", "d"),
    ],
  );
  let (registry, calls) = scripted(json!({ "a": { "$error": "boom" } }));
  let runtime = Runtime::new(registry, RuntimeConfig::default());
  let mut handle = runtime
    .start_workflow(&def, &ids(&["start"]), seed())
    .unwrap();

  let result = handle.run_to_completion().await.unwrap();

  assert_eq!(result.node("a").unwrap().status, NodeStatus::Failed);
  assert_eq!(result.node("c").unwrap().status, NodeStatus::Success);
  assert_eq!(result.node("d").unwrap().status, NodeStatus::Pending);
  assert_eq!(edge_status(&result.finished_edges, "a", "d"), EdgeStatus::Waiting);
  assert_eq!(
    result.errors,
    vec![NodeError::Execution {
      node_id: "a".to_string(),
      message: "boom".to_string(),
    }]
  );
  assert_eq!(
    result.response("a").unwrap().error,
    Some(result.errors[0].clone())
  );
  assert_eq!(result.status, RunStatus::PartiallyFailed);
  assert!(!was_called(&calls, "d"));
}

#[tokio::test]
async fn test_entry_failure_fails_run() {
  let (registry, _) = scripted(json!({ "node1": { "$error": "down" } }));
  let runtime = Runtime::new(registry, RuntimeConfig::default());
  let mut handle = runtime
    .start_workflow(&linear_chain(), &ids(&["node1"]), HashMap::new())
    .unwrap();

  let result = handle.run_to_completion().await.unwrap();

  assert_eq!(result.status, RunStatus::Failed);
  assert_eq!(handle.phase(), RunPhase::Failed);
  assert_eq!(result.node("node2").unwrap().status, NodeStatus::Pending);
}

#[tokio::test]
async fn test_panicking_executor_fails_node() {
  let (registry, _) = scripted(json!({ "node2": { "$panic": true } }));
  let runtime = Runtime::new(registry, RuntimeConfig::default());
  let mut handle = runtime
    .start_workflow(&linear_chain(), &ids(&["node1"]), HashMap::new())
    .unwrap();

  let result = handle.run_to_completion().await.unwrap();

  assert_eq!(result.node("node2").unwrap().status, NodeStatus::Failed);
  assert!(matches!(
    &result.errors[..],
    [NodeError::Execution { node_id, .. }] if node_id == "node2"
  ));
}

#[tokio::test]
async fn test_missing_executor_fails_node() {
  let def = workflow(
    vec![task("a"), StoreNode::new("plugin", NodeType::PluginInput)],
    vec![link("a", "out", "plugin")],
  );
  let (registry, _) = scripted(json!({}));
  let runtime = Runtime::new(registry, RuntimeConfig::default());
  let mut handle = runtime.start_workflow(&def, &[], HashMap::new()).unwrap();

  assert_eq!(handle.ready(), ids(&["a"]).as_slice());
  let result = handle.run_to_completion().await.unwrap();

  assert!(matches!(
    &result.errors[..],
    [NodeError::Execution { node_id, message }]
      if node_id == "plugin" && message.contains("no executor registered")
  ));
}

#[tokio::test]
async fn test_node_timeout() {
  let mut def = workflow(
    vec![start(), task("slow"), task("fast")],
    vec![
      link("start", keys::USER_CHAT_INPUT, "slow"),
      link("start", keys::USER_CHAT_INPUT, "fast"),
    ],
  );
  def.nodes[1].timeout_ms = Some(20);
  let (registry, _) = scripted(json!({ "slow": { "$sleep_ms": 5000, "out": 1 } }));
  let runtime = Runtime::new(registry, RuntimeConfig::default());
  let mut handle = runtime
    .start_workflow(&def, &ids(&["start"]), seed())
    .unwrap();

  let result = tokio::time::timeout(Duration::from_secs(2), handle.run_to_completion())
    .await
    .expect("timeout was not enforced")
    .unwrap();

  assert_eq!(
    result.errors,
    vec![NodeError::Timeout {
      node_id: "slow".to_string()
    }]
  );
  assert_eq!(result.node("fast").unwrap().status, NodeStatus::Success);
}

#[tokio::test]
async fn test_config_timeout_applies_to_all_nodes() {
  let (registry, _) = scripted(json!({ "node1": { "$sleep_ms": 5000 } }));
  let config = RuntimeConfig {
    node_timeout: Some(Duration::from_millis(20)),
    ..RuntimeConfig::default()
  };
  let mut handle = Runtime::new(registry, config)
    .start_workflow(&linear_chain(), &ids(&["node1"]), HashMap::new())
    .unwrap();

  let result = handle.run_to_completion().await.unwrap();
  assert!(matches!(&result.errors[..], [NodeError::Timeout { .. }]));
}

#[tokio::test]
async fn test_stop_prevents_further_steps() {
  let (registry, calls) = scripted(json!({}));
  let runtime = Runtime::new(registry, RuntimeConfig::default());
  let mut handle = runtime
    .start_workflow(&linear_chain(), &ids(&["node1"]), HashMap::new())
    .unwrap();

  handle.step_once().await.unwrap();
  handle.stop();

  assert!(matches!(handle.step_once().await, Err(RuntimeError::Cancelled)));
  assert!(matches!(
    handle.run_to_completion().await,
    Err(RuntimeError::Cancelled)
  ));
  assert_eq!(handle.phase(), RunPhase::Stopped);
  assert!(!was_called(&calls, "node2"));
}

#[tokio::test]
async fn test_cancel_during_step() {
  let (registry, _) = scripted(json!({ "node1": { "$sleep_ms": 10_000 } }));
  let runtime = Runtime::new(registry, RuntimeConfig::default());
  let mut handle = runtime
    .start_workflow(&linear_chain(), &ids(&["node1"]), HashMap::new())
    .unwrap();

  let cancel = handle.cancel_token();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
  });

  let result = tokio::time::timeout(Duration::from_secs(2), handle.step_once())
    .await
    .expect("cancellation was not observed");

  assert!(matches!(result, Err(RuntimeError::Cancelled)));
  assert_eq!(handle.phase(), RunPhase::Stopped);
  assert_eq!(handle.node("node1").unwrap().status, NodeStatus::Pending);
}

#[tokio::test]
async fn test_restart_with_overridden_inputs() {
  let mut def = linear_chain();
  def.nodes[1] = task("node2").with_input(InputDef::literal("q", ValueType::String, json!("a")));
  let (registry, calls) = scripted(json!({}));
  let runtime = Runtime::new(registry, RuntimeConfig::default());
  let mut handle = runtime
    .start_workflow(&def, &ids(&["node1"]), HashMap::new())
    .unwrap();
  handle.run_to_completion().await.unwrap();

  handle.restart(&ids(&["node2"])).unwrap();
  assert_eq!(handle.ready(), ids(&["node2"]).as_slice());
  assert_eq!(handle.phase(), RunPhase::Idle);
  assert!(handle.nodes().iter().all(|n| n.status == NodeStatus::Pending));
  assert!(handle.node("node1").unwrap().output_value("out").is_none());
  assert_eq!(edge_status(handle.edges(), "node1", "node2"), EdgeStatus::Active);
  assert_eq!(edge_status(handle.edges(), "node2", "node3"), EdgeStatus::Waiting);

  let mut overrides = Map::new();
  overrides.insert("q".to_string(), json!("b"));
  handle.override_inputs("node2", overrides).unwrap();

  let result = handle.run_to_completion().await.unwrap();
  let node2_calls: Vec<_> = calls
    .lock()
    .unwrap()
    .iter()
    .filter(|(id, _)| id == "node2")
    .map(|(_, inputs)| inputs["q"].clone())
    .collect();
  assert_eq!(node2_calls, vec![json!("a"), json!("b")]);
  assert_eq!(result.node("node1").unwrap().status, NodeStatus::Pending);
  assert_eq!(result.node("node3").unwrap().status, NodeStatus::Success);

  assert!(matches!(
    handle.restart(&ids(&["ghost"])),
    Err(RuntimeError::NodeNotFound { .. })
  ));
  assert!(matches!(
    handle.override_inputs("ghost", Map::new()),
    Err(RuntimeError::NodeNotFound { .. })
  ));
}

#[tokio::test]
async fn test_events_follow_run() {
  let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
  let (registry, _) = scripted(json!({ "t": { "selectedTools": ["p2"] } }));
  let runtime = Runtime::new(registry, RuntimeConfig::default()).with_notifier(ChannelNotifier::new(tx));
  let mut handle = runtime
    .start_workflow(&tool_branch(), &ids(&["t"]), HashMap::new())
    .unwrap();
  handle.run_to_completion().await.unwrap();

  let mut events = Vec::new();
  while let Ok(event) = rx.try_recv() {
    events.push(event);
  }

  assert!(matches!(events.first(), Some(ExecutionEvent::RunStarted { .. })));
  assert!(matches!(
    events.last(),
    Some(ExecutionEvent::RunCompleted { failed_nodes: 0, .. })
  ));
  assert!(events.iter().any(
    |e| matches!(e, ExecutionEvent::NodeSkipped { node_id, .. } if node_id == "p1")
  ));
  let completed: Vec<_> = events
    .iter()
    .filter_map(|e| match e {
      ExecutionEvent::NodeCompleted { node_id, .. } => Some(node_id.as_str()),
      _ => None,
    })
    .collect();
  assert_eq!(completed, vec!["t", "p2"]);
}

#[test]
fn test_start_rejects_bad_graphs() {
  let runtime = Runtime::new(ExecutorRegistry::default(), RuntimeConfig::default());

  let mut def = linear_chain();
  def.edges.push(link("node3", "missing", "node1"));
  assert!(matches!(
    runtime.start_workflow(&def, &[], HashMap::new()),
    Err(RuntimeError::Graph(_))
  ));

  assert!(matches!(
    runtime.start_workflow(&linear_chain(), &ids(&["ghost"]), HashMap::new()),
    Err(RuntimeError::Graph(_))
  ));

  let (nodes, mut edges) = build_runtime(&linear_chain(), &[]).unwrap();
  edges[0].target = "ghost".to_string();
  assert!(matches!(
    runtime.start_run(&[], nodes, edges, HashMap::new()),
    Err(RuntimeError::Graph(_))
  ));
}
