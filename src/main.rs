use std::collections::HashMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use flowrun_config::{NodeType, WorkflowDef, keys};
use flowrun_runtime::{
  ExecutorRegistry, NodeContext, NodeExecutionError, NodeOutcome, RunHandle, Runtime,
  RuntimeConfig, StepResult,
};
use flowrun_workflow::{check_required_inputs, tool_target_ids};

/// Flowrun - a stepwise workflow graph executor
#[derive(Parser)]
#[command(name = "flowrun")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Default per-node timeout in milliseconds
  #[arg(long, global = true)]
  timeout_ms: Option<u64>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a workflow to completion
  Run {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// Entry node ids (default: nodes without incoming edges)
    #[arg(long = "entry")]
    entries: Vec<String>,
  },

  /// Step through a workflow one ready set at a time
  Debug {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// Node to start from
    #[arg(long)]
    entry: String,

    /// Override an input of the entry node, as KEY=JSON
    #[arg(long = "set", value_parser = parse_override)]
    overrides: Vec<(String, Value)>,

    /// Stop after this many steps
    #[arg(long)]
    steps: Option<usize>,

    /// Report steps that dispatched nothing instead of advancing past them
    #[arg(long)]
    show_empty_steps: bool,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .with_target(false)
    .init();

  let cli = Cli::parse();
  let node_timeout = cli.timeout_ms.map(Duration::from_millis);

  match cli.command {
    Some(Commands::Run {
      workflow_file,
      entries,
    }) => {
      let config = RuntimeConfig {
        node_timeout,
        ..RuntimeConfig::default()
      };
      run_workflow(workflow_file, entries, config).await?;
    }
    Some(Commands::Debug {
      workflow_file,
      entry,
      overrides,
      steps,
      show_empty_steps,
    }) => {
      let config = RuntimeConfig {
        node_timeout,
        skip_empty_steps: !show_empty_steps,
      };
      debug_workflow(workflow_file, entry, overrides, steps, config).await?;
    }
    None => {
      println!("flowrun - use --help to see available commands");
    }
  }

  Ok(())
}

async fn run_workflow(
  workflow_file: PathBuf,
  entries: Vec<String>,
  config: RuntimeConfig,
) -> Result<()> {
  let workflow_def = load_workflow(&workflow_file).await?;
  eprintln!("Loaded workflow: {}", workflow_def.name);

  let variables = read_variables_from_stdin()?;
  let runtime = Runtime::new(host_registry(), config);
  let mut handle = runtime
    .start_workflow(&workflow_def, &entries, variables)
    .context("failed to start run")?;
  cancel_on_ctrl_c(handle.cancel_token());

  let result = handle
    .run_to_completion()
    .await
    .context("workflow execution failed")?;

  eprintln!("Run {} finished: {:?}", result.run_id, result.status);
  for err in &result.errors {
    eprintln!("  {}", err);
  }

  let outputs: Map<String, Value> = result
    .results
    .iter()
    .map(|r| (r.node_id.clone(), Value::Object(r.outputs.clone())))
    .collect();
  let summary = json!({
    "status": result.status,
    "outputs": outputs,
    "errors": result.errors,
    "variables": result.variables,
  });
  println!("{}", serde_json::to_string_pretty(&summary)?);

  Ok(())
}

async fn debug_workflow(
  workflow_file: PathBuf,
  entry: String,
  overrides: Vec<(String, Value)>,
  max_steps: Option<usize>,
  config: RuntimeConfig,
) -> Result<()> {
  let workflow_def = load_workflow(&workflow_file).await?;

  let incomplete = check_required_inputs(&workflow_def.nodes);
  if !incomplete.is_empty() {
    warn!(node_ids = ?incomplete, "nodes with unset required inputs");
  }

  let variables = read_variables_from_stdin()?;
  let runtime = Runtime::new(host_registry(), config);
  let mut handle = runtime
    .start_workflow(&workflow_def, std::slice::from_ref(&entry), variables)
    .context("failed to start debug run")?;
  if !overrides.is_empty() {
    handle.override_inputs(&entry, overrides.into_iter().collect())?;
  }
  cancel_on_ctrl_c(handle.cancel_token());

  let mut step = 0;
  while !handle.ready().is_empty() {
    if max_steps.is_some_and(|max| step >= max) {
      eprintln!("Stopped after {} steps, still ready: {:?}", step, handle.ready());
      break;
    }
    step += 1;

    let result = handle
      .step_once()
      .await
      .with_context(|| format!("step {} failed", step))?;
    print_step(step, &result)?;
  }

  print_final(&handle)
}

fn print_step(step: usize, result: &StepResult) -> Result<()> {
  let responses: Map<String, Value> = result
    .results
    .iter()
    .map(|r| {
      let value = match &r.error {
        Some(err) => json!({ "status": r.status, "error": err.to_string() }),
        None => json!({ "status": r.status, "outputs": r.outputs, "run_time_ms": r.run_time_ms }),
      };
      (r.node_id.clone(), value)
    })
    .collect();

  let edges: Vec<Value> = result
    .finished_edges
    .iter()
    .map(|e| json!(format!("{}.{} -> {}: {:?}", e.source, e.source_handle, e.target, e.status)))
    .collect();

  // Tool nodes of this step: every wired tool and the ones chosen
  let tool_choices: Map<String, Value> = result
    .results
    .iter()
    .filter_map(|r| {
      let wired = tool_target_ids(&r.node_id, &result.finished_edges);
      if wired.is_empty() {
        return None;
      }
      let chosen = r.outputs.get(keys::SELECTED_TOOLS).cloned().unwrap_or(Value::Null);
      Some((r.node_id.clone(), json!({ "wired": wired, "chosen": chosen })))
    })
    .collect();

  let summary = json!({
    "step": step,
    "results": responses,
    "tool_choices": tool_choices,
    "skipped": result.skipped,
    "edges": edges,
    "next_ready": result.next_ready,
  });
  println!("{}", serde_json::to_string_pretty(&summary)?);
  Ok(())
}

fn print_final(handle: &RunHandle) -> Result<()> {
  let summary = json!({
    "phase": format!("{:?}", handle.phase()),
    "status": handle.status(),
    "errors": handle.errors(),
    "variables": handle.variables().snapshot(),
  });
  println!("{}", serde_json::to_string_pretty(&summary)?);
  Ok(())
}

/// Built-in executors plus an echo executor for every node type the host
/// would normally provide (model calls, dataset search, HTTP, ...). The echo
/// copies each input into the declared output of the same key, so a graph
/// can be exercised with literal inputs alone.
fn host_registry() -> ExecutorRegistry {
  let mut registry = ExecutorRegistry::default();
  for node_type in [
    NodeType::ChatNode,
    NodeType::DatasetSearch,
    NodeType::HttpRequest,
    NodeType::Tools,
    NodeType::IfElse,
    NodeType::PluginInput,
    NodeType::PluginOutput,
  ] {
    registry.register_fn(node_type, |ctx: NodeContext| async move { echo(ctx) });
  }
  registry
}

fn echo(ctx: NodeContext) -> Result<NodeOutcome, NodeExecutionError> {
  let node = ctx
    .snapshot
    .node(&ctx.node_id)
    .ok_or_else(|| NodeExecutionError::new(format!("node '{}' missing from snapshot", ctx.node_id)))?;

  let outputs = node
    .outputs
    .iter()
    .filter_map(|output| {
      ctx
        .input(&output.key)
        .map(|value| (output.key.clone(), value.clone()))
    })
    .collect();
  Ok(NodeOutcome::from_outputs(outputs))
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      eprintln!("Interrupted, stopping run");
      cancel.cancel();
    }
  });
}

async fn load_workflow(workflow_file: &Path) -> Result<WorkflowDef> {
  let workflow_content = tokio::fs::read_to_string(workflow_file)
    .await
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  serde_json::from_str(&workflow_content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))
}

fn parse_override(raw: &str) -> std::result::Result<(String, Value), String> {
  let Some((key, value)) = raw.split_once('=') else {
    return Err(format!("expected KEY=JSON, got '{}'", raw));
  };
  // Bare words are taken as strings.
  let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
  Ok((key.to_string(), value))
}

fn read_variables_from_stdin() -> Result<HashMap<String, Value>> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe, start with no variables
    return Ok(HashMap::new());
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read variables from stdin")?;

  if input.trim().is_empty() {
    return Ok(HashMap::new());
  }
  serde_json::from_str(&input).context("failed to parse variables JSON from stdin")
}
