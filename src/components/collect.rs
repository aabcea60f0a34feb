//! Sink component that records every signal it receives.

use crate::component::Component;
use crate::port::{PortAttributes, PortDirection, PortRegistry};
use crate::sync::lock;
use crate::types::{Payload, SocketEvent};
use std::sync::{Arc, Mutex};

/// Shared, cloneable view of the signals a [`CollectComponent`] received.
#[derive(Debug, Clone, Default)]
pub struct Collected(Arc<Mutex<Vec<(usize, SocketEvent)>>>);

impl Collected {
  /// Every recorded signal with the socket index it arrived on.
  pub fn events(&self) -> Vec<(usize, SocketEvent)> {
    lock(&self.0).clone()
  }

  /// Payloads of the recorded data signals, in arrival order.
  pub fn data(&self) -> Vec<Payload> {
    lock(&self.0)
      .iter()
      .filter_map(|(_, event)| match event {
        SocketEvent::Data(data) => Some(data.clone()),
        _ => None,
      })
      .collect()
  }

  pub fn len(&self) -> usize {
    lock(&self.0).len()
  }

  pub fn is_empty(&self) -> bool {
    lock(&self.0).is_empty()
  }

  fn record(&self, index: usize, event: &SocketEvent) {
    lock(&self.0).push((index, event.clone()));
  }
}

/// Sink with a single `in` port; records signals into a [`Collected`].
#[derive(Debug)]
pub struct CollectComponent {
  in_ports: PortRegistry,
  out_ports: PortRegistry,
  collected: Collected,
}

impl CollectComponent {
  pub fn new(attributes: PortAttributes) -> Self {
    let in_ports = PortRegistry::single(PortDirection::In, "in", attributes);
    let collected = Collected::default();
    if let Ok(port) = in_ports.get("in") {
      let sink = collected.clone();
      port.on(move |event, index| sink.record(index, event));
    }
    Self {
      in_ports,
      out_ports: PortRegistry::outputs(),
      collected,
    }
  }

  pub fn collected(&self) -> Collected {
    self.collected.clone()
  }
}

impl Component for CollectComponent {
  fn description(&self) -> &str {
    "Records every signal arriving on in"
  }

  fn in_ports(&self) -> &PortRegistry {
    &self.in_ports
  }

  fn out_ports(&self) -> &PortRegistry {
    &self.out_ports
  }
}
