//! Error types for the network engine.
//!
//! Every precondition violation surfaces as its own variant so callers can
//! branch on the specific kind. The definition-error family (structural
//! misuse of the graph) is grouped by [`NetworkError::is_definition_error`].

use crate::types::EdgeEndSpec;
use thiserror::Error;

/// Which end of an edge a missing node was referenced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndRole {
  /// Plain node lookup.
  Lookup,
  /// The source end of an edge.
  Source,
  /// The target end of an edge or initial-data connection.
  Target,
}

/// Errors raised by [`crate::port::Port`] and [`crate::port::PortRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
  /// A port with this name is already declared in the registry.
  #[error("The port {0} already exists!")]
  AlreadyExists(String),
  /// No port with this name is declared in the registry.
  #[error("The port {0} does not exist!")]
  DoesNotExist(String),
  /// An indexed operation was attempted on a scalar port.
  #[error("The port {0} is not addressable")]
  NotAddressable(String),
  /// No connection is attached at the given socket index.
  #[error("No socket attached to port {port} at index {index}")]
  IndexNotAttached { port: String, index: usize },
  /// The port has no attached connection to signal.
  #[error("The port {0} is not attached")]
  NotAttached(String),
}

/// Errors raised by a [`crate::component::ComponentBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// The builder knows no component under this name.
  #[error("Component '{0}' is not registered")]
  UnknownComponent(String),
}

/// Errors raised by [`crate::network::Network`] operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
  /// Structural misuse of the graph definition.
  #[error("{0}")]
  InvalidDefinition(String),
  /// A node id did not resolve to a live process.
  #[error("{}", node_missing_message(id, *role))]
  NodeDoesNotExist { id: String, role: EndRole },
  /// `change_edge` found zero or several candidate connections.
  #[error("Edge {from} -> {to} does not exist uniquely ({matches} matches)")]
  EdgeDoesNotExist {
    from: EdgeEndSpec,
    to: EdgeEndSpec,
    matches: usize,
  },
  /// Out-port and in-port declared datatypes are not compatible.
  #[error(
    "Process {from_node}: outport type \"{from_type}\" of port \"{from_port}\" does not match {to_node} inport type \"{to_type}\" of port \"{to_port}\""
  )]
  IncompatibleDatatype {
    from_node: String,
    from_port: String,
    from_type: String,
    to_node: String,
    to_port: String,
    to_type: String,
  },
  /// Operational misuse, e.g. running before a graph is loaded.
  #[error("{0}")]
  Flow(String),
  /// Port registry lookup or attachment failure.
  #[error(transparent)]
  Port(#[from] PortError),
  /// The component builder could not produce a component.
  #[error(transparent)]
  Build(#[from] BuildError),
}

impl NetworkError {
  /// Returns true for the definition-error family: everything except
  /// datatype mismatches and flow errors.
  pub fn is_definition_error(&self) -> bool {
    !matches!(
      self,
      NetworkError::IncompatibleDatatype { .. } | NetworkError::Flow(_)
    )
  }

  pub(crate) fn invalid(msg: impl Into<String>) -> Self {
    NetworkError::InvalidDefinition(msg.into())
  }

  pub(crate) fn missing_node(id: &str, role: EndRole) -> Self {
    NetworkError::NodeDoesNotExist {
      id: id.to_string(),
      role,
    }
  }
}

fn node_missing_message(id: &str, role: EndRole) -> String {
  match role {
    EndRole::Lookup => format!("Node '{id}' does not exist"),
    EndRole::Source => format!("No process defined for source node {id}"),
    EndRole::Target => format!("No process defined for target node {id}"),
  }
}

/// Result alias used throughout the crate.
pub type Result<T, E = NetworkError> = std::result::Result<T, E>;
