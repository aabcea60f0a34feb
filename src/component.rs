//! Collaborator seams: components, the component builder and graph
//! definitions.

use crate::error::BuildError;
use crate::port::PortRegistry;
use crate::types::{GraphSpec, Payload};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A processing component with typed in-ports and out-ports.
///
/// Components wire their behavior at construction time by registering
/// listeners on their in-ports and signalling through their out-ports.
pub trait Component: Send {
  fn description(&self) -> &str;

  fn in_ports(&self) -> &PortRegistry;

  fn out_ports(&self) -> &PortRegistry;

  /// Detaches everything the component owns. Called during network
  /// teardown; must tolerate being called more than once.
  fn shutdown(&mut self) {
    self.in_ports().shutdown();
    self.out_ports().shutdown();
  }
}

/// Instantiates components by identifier.
pub trait ComponentBuilder: Send + Sync {
  fn build(&self, component: &str) -> Result<Box<dyn Component>, BuildError>;
}

/// Graph definition a network can delegate initial data to.
pub trait GraphDefinition: Send {
  fn add_initial(&mut self, data: Payload, node_id: &str, port_name: &str);

  /// The definition as a [`GraphSpec`], when it is one.
  fn as_graph_spec(&self) -> Option<&GraphSpec> {
    None
  }
}

type Factory = Arc<dyn Fn() -> Box<dyn Component> + Send + Sync>;

/// [`ComponentBuilder`] backed by a name → factory table.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
  factories: BTreeMap<String, Factory>,
}

impl ComponentRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `factory` under `name`, replacing any previous entry.
  pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
  where
    F: Fn() -> Box<dyn Component> + Send + Sync + 'static,
  {
    self.factories.insert(name.into(), Arc::new(factory));
    self
  }

  pub fn contains(&self, name: &str) -> bool {
    self.factories.contains_key(name)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.factories.keys().map(String::as_str)
  }
}

impl ComponentBuilder for ComponentRegistry {
  fn build(&self, component: &str) -> Result<Box<dyn Component>, BuildError> {
    self
      .factories
      .get(component)
      .map(|factory| factory())
      .ok_or_else(|| BuildError::UnknownComponent(component.to_string()))
  }
}

impl fmt::Debug for ComponentRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ComponentRegistry")
      .field("components", &self.factories.keys().collect::<Vec<_>>())
      .finish()
  }
}
