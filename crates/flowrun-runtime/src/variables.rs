//! Global variable store shared by every node of one execution.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

/// A cloneable handle to one execution's global variables.
///
/// Every clone points at the same map. Each write swaps one key atomically;
/// concurrent writers to the same key resolve last-writer-wins.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
  inner: Arc<RwLock<HashMap<String, Value>>>,
}

impl VariableStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a store seeded with caller-supplied values.
  pub fn with_values(values: HashMap<String, Value>) -> Self {
    Self {
      inner: Arc::new(RwLock::new(values)),
    }
  }

  pub fn get(&self, key: &str) -> Option<Value> {
    self
      .inner
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(key)
      .cloned()
  }

  pub fn contains(&self, key: &str) -> bool {
    self
      .inner
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .contains_key(key)
  }

  /// Set a variable, returning the previous value.
  pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
    self
      .inner
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key.into(), value)
  }

  pub fn remove(&self, key: &str) -> Option<Value> {
    self
      .inner
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(key)
  }

  /// Copy of all variables at this instant.
  pub fn snapshot(&self) -> HashMap<String, Value> {
    self
      .inner
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn len(&self) -> usize {
    self
      .inner
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
