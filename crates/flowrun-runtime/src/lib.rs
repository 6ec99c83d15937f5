//! Flowrun Runtime
//!
//! This crate executes runtime graphs. It resolves node inputs against
//! upstream outputs and global variables, dispatches nodes to executors by
//! node type, settles edges, and walks the graph either to completion or one
//! step at a time for interactive debugging.
//!
//! The entry point is [`Runtime`]; each run is driven through a
//! [`RunHandle`].

mod builtin;
mod edges;
mod error;
mod events;
mod executor;
mod input;
mod result;
mod runtime;
mod variables;

pub use builtin::{AnswerExecutor, VariableUpdateExecutor, WorkflowStartExecutor};
pub use edges::{
  NodeRunStatus, node_run_status, propagate_skips, settle_outgoing_edges, skip_outgoing_edges,
};
pub use error::{NodeError, NodeExecutionError, RuntimeError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use executor::{
  Executor, ExecutorRegistry, FnExecutor, NodeContext, NodeMetrics, NodeOutcome, SideEffect,
};
pub use input::{MissingInput, Resolved, Snapshot, format_value, resolve_input, resolve_inputs};
pub use result::{NodeResponse, RunResult, RunStatus, StepResult};
pub use runtime::{RunHandle, RunPhase, Runtime, RuntimeConfig};
pub use variables::VariableStore;
