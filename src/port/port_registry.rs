//! Ordered, name-unique set of a component's in-ports or out-ports.

use super::{Port, PortAttributes, PortDirection};
use crate::error::PortError;

/// Owns one direction's ports for one component, in declaration order.
#[derive(Debug)]
pub struct PortRegistry {
  direction: PortDirection,
  ports: Vec<Port>,
}

impl PortRegistry {
  pub fn new(direction: PortDirection) -> Self {
    Self {
      direction,
      ports: Vec::new(),
    }
  }

  /// A registry declaring exactly one port.
  pub fn single(direction: PortDirection, name: &str, attributes: PortAttributes) -> Self {
    Self {
      direction,
      ports: vec![Port::new(name, attributes, direction)],
    }
  }

  pub fn inputs() -> Self {
    Self::new(PortDirection::In)
  }

  pub fn outputs() -> Self {
    Self::new(PortDirection::Out)
  }

  pub fn direction(&self) -> PortDirection {
    self.direction
  }

  /// Declares a port. Fails if the name is taken.
  pub fn add(&mut self, name: &str, attributes: PortAttributes) -> Result<&mut Self, PortError> {
    let port = Port::new(name, attributes, self.direction);
    self.insert(port)
  }

  /// Inserts an existing port (e.g. an alias). Fails if the name is taken.
  pub fn insert(&mut self, port: Port) -> Result<&mut Self, PortError> {
    if self.has(port.name()) {
      return Err(PortError::AlreadyExists(port.name().to_string()));
    }
    self.ports.push(port);
    Ok(self)
  }

  pub fn has(&self, name: &str) -> bool {
    self.ports.iter().any(|p| p.name() == name)
  }

  pub fn get(&self, name: &str) -> Result<&Port, PortError> {
    self
      .ports
      .iter()
      .find(|p| p.name() == name)
      .ok_or_else(|| PortError::DoesNotExist(name.to_string()))
  }

  /// Removes and returns the port; `None` if it was not declared.
  pub fn remove(&mut self, name: &str) -> Option<Port> {
    let index = self.ports.iter().position(|p| p.name() == name)?;
    Some(self.ports.remove(index))
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Port> {
    self.ports.iter()
  }

  pub fn names(&self) -> Vec<&str> {
    self.ports.iter().map(Port::name).collect()
  }

  pub fn len(&self) -> usize {
    self.ports.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ports.is_empty()
  }

  /// Detaches every connection from every port and drops port listeners.
  pub fn shutdown(&self) {
    for port in &self.ports {
      port.detach_all();
      port.clear_listeners();
    }
  }
}

impl<'a> IntoIterator for &'a PortRegistry {
  type Item = &'a Port;
  type IntoIter = std::slice::Iter<'a, Port>;

  fn into_iter(self) -> Self::IntoIter {
    self.ports.iter()
  }
}
