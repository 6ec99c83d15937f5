//! Conversion between persisted graph definitions and runtime graphs.

use std::collections::HashSet;

use flowrun_config::{InputValue, OutputKind, StoreEdge, StoreNode, WorkflowDef, keys};

use crate::error::WorkflowError;
use crate::runtime::{EdgeStatus, NodeStatus, RuntimeEdge, RuntimeNode};

/// Build runtime nodes from persisted nodes.
///
/// Inputs are carried over unchanged; references are not resolved here.
/// Static outputs keep their configured value, all other outputs start unset.
pub fn store_nodes_to_runtime(nodes: &[StoreNode], entry_node_ids: &[String]) -> Vec<RuntimeNode> {
  nodes
    .iter()
    .map(|node| RuntimeNode {
      node_id: node.node_id.clone(),
      node_type: node.node_type,
      name: node.name.clone(),
      inputs: node.inputs.clone(),
      outputs: node
        .outputs
        .iter()
        .map(|output| {
          let mut output = output.clone();
          if output.kind != OutputKind::Static {
            output.value = None;
          }
          output
        })
        .collect(),
      extra_outputs: serde_json::Map::new(),
      is_entry: entry_node_ids.contains(&node.node_id),
      status: NodeStatus::Pending,
      timeout_ms: node.timeout_ms,
    })
    .collect()
}

/// Build runtime edges from persisted edges. Edges entering an entry node
/// start `active`, every other edge starts `waiting`.
pub fn store_edges_to_runtime(edges: &[StoreEdge], entry_node_ids: &[String]) -> Vec<RuntimeEdge> {
  edges
    .iter()
    .map(|edge| RuntimeEdge {
      source: edge.source.clone(),
      source_handle: edge.source_handle.clone(),
      target: edge.target.clone(),
      target_handle: edge.target_handle.clone(),
      status: if entry_node_ids.contains(&edge.target) {
        EdgeStatus::Active
      } else {
        EdgeStatus::Waiting
      },
    })
    .collect()
}

/// Validate graph structure: unique node ids, edges between known nodes,
/// edges leaving through declared outputs, and known entry nodes.
pub fn validate_graph(
  nodes: &[StoreNode],
  edges: &[StoreEdge],
  entry_node_ids: &[String],
) -> Result<(), WorkflowError> {
  let mut node_ids = HashSet::new();
  for node in nodes {
    if !node_ids.insert(node.node_id.as_str()) {
      return Err(WorkflowError::DuplicateNode(node.node_id.clone()));
    }
  }

  for edge in edges {
    let source = nodes.iter().find(|node| node.node_id == edge.source);
    let (Some(source), true) = (source, node_ids.contains(edge.target.as_str())) else {
      return Err(WorkflowError::InvalidEdge {
        from: edge.source.clone(),
        to: edge.target.clone(),
      });
    };

    if source.output(&edge.source_handle).is_none() {
      return Err(WorkflowError::UnknownHandle {
        node_id: edge.source.clone(),
        handle: edge.source_handle.clone(),
      });
    }
  }

  for entry_id in entry_node_ids {
    if !node_ids.contains(entry_id.as_str()) {
      return Err(WorkflowError::EntryNotFound(entry_id.clone()));
    }
  }

  Ok(())
}

/// Validate a definition and convert it into runtime nodes and edges.
pub fn build_runtime(
  def: &WorkflowDef,
  entry_node_ids: &[String],
) -> Result<(Vec<RuntimeNode>, Vec<RuntimeEdge>), WorkflowError> {
  validate_graph(&def.nodes, &def.edges, entry_node_ids)?;
  Ok((
    store_nodes_to_runtime(&def.nodes, entry_node_ids),
    store_edges_to_runtime(&def.edges, entry_node_ids),
  ))
}

/// Convert runtime nodes back into their persisted form, dropping execution
/// state and every output value that was produced at run time.
pub fn runtime_nodes_to_store(nodes: &[RuntimeNode]) -> Vec<StoreNode> {
  nodes
    .iter()
    .map(|node| StoreNode {
      node_id: node.node_id.clone(),
      node_type: node.node_type,
      name: node.name.clone(),
      inputs: node.inputs.clone(),
      outputs: node
        .outputs
        .iter()
        .map(|output| {
          let mut output = output.clone();
          if output.kind != OutputKind::Static {
            output.value = None;
          }
          output
        })
        .collect(),
      timeout_ms: node.timeout_ms,
    })
    .collect()
}

/// Convert runtime edges back into their persisted form.
pub fn runtime_edges_to_store(edges: &[RuntimeEdge]) -> Vec<StoreEdge> {
  edges
    .iter()
    .map(|edge| StoreEdge {
      source: edge.source.clone(),
      source_handle: edge.source_handle.clone(),
      target: edge.target.clone(),
      target_handle: edge.target_handle.clone(),
    })
    .collect()
}

/// Ids of nodes with a required input that has no usable value: no literal,
/// an empty literal, or an incomplete reference.
pub fn check_required_inputs(nodes: &[StoreNode]) -> Vec<String> {
  nodes
    .iter()
    .filter(|node| {
      node.inputs.iter().any(|input| {
        input.required
          && match &input.value {
            None => true,
            Some(InputValue::Literal(value)) => {
              value.is_null() || value.as_str().is_some_and(str::is_empty)
            }
            Some(InputValue::Reference(reference)) => !reference.is_complete(),
          }
      })
    })
    .map(|node| node.node_id.clone())
    .collect()
}

/// Ids of the tool nodes wired to a node's tool-selection output.
pub fn tool_target_ids(node_id: &str, edges: &[RuntimeEdge]) -> Vec<String> {
  edges
    .iter()
    .filter(|edge| {
      edge.source == node_id
        && (edge.source_handle == keys::SELECTED_TOOLS || edge.target_handle == keys::SELECTED_TOOLS)
    })
    .map(|edge| edge.target.clone())
    .collect()
}
