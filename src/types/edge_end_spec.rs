//! Edge end descriptors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Immutable `(node id, port name)` pair addressing one end of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeEndSpec {
  node_id: String,
  port_name: String,
}

impl EdgeEndSpec {
  pub fn new(node_id: impl Into<String>, port_name: impl Into<String>) -> Self {
    Self {
      node_id: node_id.into(),
      port_name: port_name.into(),
    }
  }

  pub fn node_id(&self) -> &str {
    &self.node_id
  }

  pub fn port_name(&self) -> &str {
    &self.port_name
  }

  /// Returns a copy pointing at `node_id`, keeping the port.
  pub(crate) fn with_node_id(&self, node_id: &str) -> Self {
    Self::new(node_id, self.port_name.clone())
  }
}

impl fmt::Display for EdgeEndSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.node_id, self.port_name)
  }
}

/// What feeds a connection: an upstream out-port or a literal initial value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionSource {
  /// A normal edge from a node's out-port.
  Port(EdgeEndSpec),
  /// A constant payload injected in place of an upstream port.
  InitialData(Value),
}

impl ConnectionSource {
  pub fn is_initial(&self) -> bool {
    matches!(self, ConnectionSource::InitialData(_))
  }

  /// The out-port reference, or `None` for initial data.
  pub fn as_port(&self) -> Option<&EdgeEndSpec> {
    match self {
      ConnectionSource::Port(end) => Some(end),
      ConnectionSource::InitialData(_) => None,
    }
  }

  /// The literal payload, or `None` for a port source.
  pub fn initial_data(&self) -> Option<&Value> {
    match self {
      ConnectionSource::Port(_) => None,
      ConnectionSource::InitialData(data) => Some(data),
    }
  }
}
