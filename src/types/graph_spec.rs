//! In-memory graph definition: what a network is booted from and what
//! [`crate::network::Network::snapshot`] produces.

use super::{EdgeEndSpec, Metadata, NodeSpec};
use crate::component::GraphDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A directed edge between two node ports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
  pub from: EdgeEndSpec,
  pub to: EdgeEndSpec,
  #[serde(default, skip_serializing_if = "Metadata::is_empty")]
  pub metadata: Metadata,
}

/// A constant value injected into an in-port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialSpec {
  pub data: Value,
  pub to: EdgeEndSpec,
}

/// An internal port exposed under a public name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSpec {
  pub public: String,
  pub port: EdgeEndSpec,
  #[serde(default, skip_serializing_if = "Metadata::is_empty")]
  pub metadata: Metadata,
}

/// Graph definition: nodes, edges, initial data and exported ports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSpec {
  pub name: String,
  #[serde(skip_serializing_if = "Metadata::is_empty")]
  pub properties: Metadata,
  pub nodes: Vec<NodeSpec>,
  pub edges: Vec<EdgeSpec>,
  pub initials: Vec<InitialSpec>,
  pub inports: Vec<ExportSpec>,
  pub outports: Vec<ExportSpec>,
}

impl GraphSpec {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  pub fn with_node(mut self, id: &str, component: &str) -> Self {
    self.nodes.push(NodeSpec::new(id, component));
    self
  }

  pub fn with_edge(mut self, from: EdgeEndSpec, to: EdgeEndSpec) -> Self {
    self.edges.push(EdgeSpec {
      from,
      to,
      metadata: Metadata::new(),
    });
    self
  }

  pub fn with_initial(mut self, data: Value, to: EdgeEndSpec) -> Self {
    self.initials.push(InitialSpec { data, to });
    self
  }
}

impl GraphDefinition for GraphSpec {
  fn add_initial(&mut self, data: Value, node_id: &str, port_name: &str) {
    self.initials.push(InitialSpec {
      data,
      to: EdgeEndSpec::new(node_id, port_name),
    });
  }

  fn as_graph_spec(&self) -> Option<&GraphSpec> {
    Some(self)
  }
}
