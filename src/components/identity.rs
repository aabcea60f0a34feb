//! Identity / pass-through component.
//! Forwards every signal arriving on `in` to `out` unchanged.

use crate::component::Component;
use crate::port::{PortAttributes, PortDirection, PortRegistry};
use crate::types::SocketEvent;
use tracing::trace;

/// Pass-through component with one `in` and one `out` port.
#[derive(Debug)]
pub struct IdentityComponent {
  in_ports: PortRegistry,
  out_ports: PortRegistry,
}

impl IdentityComponent {
  /// Creates an identity component whose ports carry `datatype`.
  pub fn new(datatype: &str) -> Self {
    let in_ports = PortRegistry::single(PortDirection::In, "in", PortAttributes::new(datatype));
    let out_ports = PortRegistry::single(PortDirection::Out, "out", PortAttributes::new(datatype));

    if let (Ok(input), Ok(output)) = (in_ports.get("in"), out_ports.get("out")) {
      let out = output.sender();
      input.on(move |event, index| {
        trace!(event = event.kind(), socket = index, "IdentityComponent forwarding");
        let forwarded = match event {
          SocketEvent::Connect => out.connect(),
          SocketEvent::Data(data) => out.send(data.clone()),
          SocketEvent::BeginGroup(group) => out.begin_group(group),
          SocketEvent::EndGroup(group) => out.end_group(group),
          SocketEvent::Disconnect => out.disconnect(),
          SocketEvent::Shutdown => Ok(()),
        };
        if let Err(e) = forwarded {
          trace!(error = %e, "IdentityComponent dropped signal");
        }
      });
    }

    Self {
      in_ports,
      out_ports,
    }
  }
}

impl Default for IdentityComponent {
  fn default() -> Self {
    Self::new(crate::types::ALL)
  }
}

impl Component for IdentityComponent {
  fn description(&self) -> &str {
    "Forwards every signal from in to out"
  }

  fn in_ports(&self) -> &PortRegistry {
    &self.in_ports
  }

  fn out_ports(&self) -> &PortRegistry {
    &self.out_ports
  }
}
