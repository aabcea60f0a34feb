//! Public ports of a network: internal node ports exposed under public names.

use super::{Port, PortDirection, PortRegistry};
use crate::error::PortError;
use crate::types::{EdgeEndSpec, Metadata};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Export {
  internal: EdgeEndSpec,
  metadata: Metadata,
}

/// Registry of public ports; each entry aliases an internal node port.
#[derive(Debug)]
pub struct NetworkPortRegistry {
  ports: PortRegistry,
  exports: HashMap<String, Export>,
}

impl NetworkPortRegistry {
  pub fn new(direction: PortDirection) -> Self {
    Self {
      ports: PortRegistry::new(direction),
      exports: HashMap::new(),
    }
  }

  /// Publishes `port` (found at `internal`) as `public`. An existing entry
  /// under the same public name is replaced.
  pub fn add(
    &mut self,
    public: &str,
    internal: EdgeEndSpec,
    port: &Port,
    metadata: Metadata,
  ) -> Result<&mut Self, PortError> {
    self.remove(public);
    self.ports.insert(port.alias(public))?;
    self
      .exports
      .insert(public.to_string(), Export { internal, metadata });
    Ok(self)
  }

  /// Drops the public entry; no-op if absent.
  pub fn remove(&mut self, public: &str) -> &mut Self {
    self.ports.remove(public);
    self.exports.remove(public);
    self
  }

  pub fn has(&self, public: &str) -> bool {
    self.exports.contains_key(public)
  }

  /// The internal `(node, port)` behind a public name.
  pub fn internal(&self, public: &str) -> Option<&EdgeEndSpec> {
    self.exports.get(public).map(|e| &e.internal)
  }

  pub fn metadata(&self, public: &str) -> Option<&Metadata> {
    self.exports.get(public).map(|e| &e.metadata)
  }

  /// Public entries in declaration order with their internal ends.
  pub fn exports(&self) -> Vec<(&str, &EdgeEndSpec, &Metadata)> {
    self
      .ports
      .iter()
      .filter_map(|p| {
        self
          .exports
          .get(p.name())
          .map(|e| (p.name(), &e.internal, &e.metadata))
      })
      .collect()
  }

  /// Rewrites internal references from node `from` to node `to`.
  pub(crate) fn rename_node(&mut self, from: &str, to: &str) {
    for export in self.exports.values_mut() {
      if export.internal.node_id() == from {
        export.internal = export.internal.with_node_id(to);
      }
    }
  }

  pub(crate) fn clear(&mut self) {
    let names: Vec<String> = self.exports.keys().cloned().collect();
    for name in names {
      self.remove(&name);
    }
  }

  /// Alias ports as a plain registry, for the component view of a network.
  pub fn ports(&self) -> &PortRegistry {
    &self.ports
  }
}
