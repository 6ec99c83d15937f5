//! Flowrun Workflow
//!
//! This crate provides the runtime representation of a workflow graph.
//! A runtime graph is created from a persisted definition at the start of an
//! execution (or a debug session) and is mutated in place as nodes run.
//!
//! Key differences from `flowrun-config`:
//! - Nodes carry an execution status and an entry flag
//! - Outputs hold materialized values once their node has run
//! - Edges carry a `waiting | active | skipped` status
//! - Graph structure is validated (edges name real nodes and output handles)

mod convert;
mod error;
mod graph;
mod runtime;

pub use convert::{
  build_runtime, check_required_inputs, runtime_edges_to_store, runtime_nodes_to_store,
  store_edges_to_runtime, store_nodes_to_runtime, tool_target_ids, validate_graph,
};
pub use error::WorkflowError;
pub use graph::Graph;
pub use runtime::{EdgeStatus, NodeStatus, RuntimeEdge, RuntimeNode};
