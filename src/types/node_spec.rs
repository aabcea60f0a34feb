//! Declarative description of a node to add to a network.

use super::Metadata;
use serde::{Deserialize, Serialize};

/// Node id, component identifier and initial metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
  pub id: String,
  pub component: String,
  #[serde(default, skip_serializing_if = "Metadata::is_empty")]
  pub metadata: Metadata,
}

impl NodeSpec {
  pub fn new(id: impl Into<String>, component: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      component: component.into(),
      metadata: Metadata::new(),
    }
  }

  pub fn with_metadata(mut self, metadata: Metadata) -> Self {
    self.metadata = metadata;
    self
  }
}
