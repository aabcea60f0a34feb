//! Declarative component: a description plus declared ports, no behavior.

use crate::component::Component;
use crate::error::PortError;
use crate::port::{PortAttributes, PortRegistry};

/// Component made only of its description and port declarations.
///
/// Useful as a placeholder node, and as the base other components build
/// their registries on.
#[derive(Debug)]
pub struct BasicComponent {
  description: String,
  in_ports: PortRegistry,
  out_ports: PortRegistry,
}

impl BasicComponent {
  pub fn new(description: impl Into<String>) -> Self {
    Self {
      description: description.into(),
      in_ports: PortRegistry::inputs(),
      out_ports: PortRegistry::outputs(),
    }
  }

  pub fn with_in_port(mut self, name: &str, attributes: PortAttributes) -> Result<Self, PortError> {
    self.in_ports.add(name, attributes)?;
    Ok(self)
  }

  pub fn with_out_port(mut self, name: &str, attributes: PortAttributes) -> Result<Self, PortError> {
    self.out_ports.add(name, attributes)?;
    Ok(self)
  }
}

impl Component for BasicComponent {
  fn description(&self) -> &str {
    &self.description
  }

  fn in_ports(&self) -> &PortRegistry {
    &self.in_ports
  }

  fn out_ports(&self) -> &PortRegistry {
    &self.out_ports
  }
}
