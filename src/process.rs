//! A node of the network: graph-level identity bound to a component.

use crate::component::Component;
use crate::types::{Metadata, NodeSpec};
use std::fmt;

/// Binds a node id and metadata to the component instance it owns.
pub struct Process {
  id: String,
  component_name: String,
  component: Box<dyn Component>,
  metadata: Metadata,
}

impl Process {
  pub fn new(spec: &NodeSpec, component: Box<dyn Component>) -> Self {
    Self {
      id: spec.id.clone(),
      component_name: spec.component.clone(),
      component,
      metadata: spec.metadata.clone(),
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  /// Renames the process. Uniqueness is the owning network's concern.
  pub fn set_id(&mut self, id: impl Into<String>) {
    self.id = id.into();
  }

  /// Identifier the component was built from.
  pub fn component_name(&self) -> &str {
    &self.component_name
  }

  pub fn component(&self) -> &dyn Component {
    self.component.as_ref()
  }

  pub fn component_mut(&mut self) -> &mut dyn Component {
    self.component.as_mut()
  }

  pub fn metadata(&self) -> &Metadata {
    &self.metadata
  }

  pub fn merge_metadata(&mut self, metadata: &Metadata) {
    self.metadata.merge(metadata);
  }

  /// The node spec this process would be recreated from.
  pub fn to_spec(&self) -> NodeSpec {
    NodeSpec {
      id: self.id.clone(),
      component: self.component_name.clone(),
      metadata: self.metadata.clone(),
    }
  }
}

impl fmt::Debug for Process {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Process")
      .field("id", &self.id)
      .field("component", &self.component_name)
      .field("metadata", &self.metadata)
      .finish()
  }
}
