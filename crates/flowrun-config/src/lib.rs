//! Flowrun Config
//!
//! This crate contains the serializable graph definition types for flowrun.
//! These types represent a workflow as it is persisted by the editor: an
//! ordered list of nodes, each with declared inputs and outputs, and an
//! ordered list of edges connecting an output handle to an input handle.
//!
//! Definitions can be loaded from:
//! - JSON files (via CLI with `flowrun run workflow.json`)
//! - Document storage (as JSON blobs)
//!
//! The workflow crate converts these definitions into runtime nodes and edges
//! that carry per-execution status and values.

mod edge;
mod enums;
mod input;
pub mod keys;
mod node;
mod workflow;

pub use edge::StoreEdge;
pub use enums::{NodeType, OutputKind, ValueType};
pub use input::{InputDef, InputValue, Reference, UpdateItem, VARIABLE_NODE_ID};
pub use node::{OutputDef, StoreNode};
pub use workflow::WorkflowDef;
