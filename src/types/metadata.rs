//! Mergeable string-keyed metadata attached to processes and connections.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// String-keyed metadata map, iterated and serialised in key order.
///
/// Merging overwrites existing keys and drops every key whose merged value
/// is `null`, so `null` acts as a removal marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

impl Metadata {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.0.contains_key(key)
  }

  /// Sets a single key. A `null` value removes the key instead.
  pub fn insert(&mut self, key: impl Into<String>, value: Value) {
    let key = key.into();
    if value.is_null() {
      self.0.remove(&key);
    } else {
      self.0.insert(key, value);
    }
  }

  /// Merges `other` into `self`: later keys win, `null` values remove.
  pub fn merge(&mut self, other: &Metadata) {
    for (key, value) in &other.0 {
      self.insert(key.clone(), value.clone());
    }
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
    self.0.iter()
  }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Metadata {
  /// Collects raw pairs as-is, `null` values included; use [`Metadata::merge`]
  /// to apply them as removals.
  fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
    Metadata(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
  }
}

impl From<BTreeMap<String, Value>> for Metadata {
  fn from(map: BTreeMap<String, Value>) -> Self {
    Metadata(map)
  }
}
