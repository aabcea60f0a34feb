//! Ports and port registries.

mod network_port_registry;
#[allow(clippy::module_inception)]
mod port;
mod port_registry;

pub use network_port_registry::NetworkPortRegistry;
pub use port::{Port, PortAttributes, PortDirection, PortKind, PortListener, PortSender};
pub use port_registry::PortRegistry;
