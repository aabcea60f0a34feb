//! # streamweave-flo
//!
//! Flow-based programming network engine: nodes bound to components, typed
//! ports, and connections carrying synchronous signals between them.
//!
//! ## Architecture
//!
//! - [`network::Network`] owns every node ([`process::Process`]) and every
//!   [`connection::Connection`], and is the only place the graph is mutated.
//! - Components ([`component::Component`]) declare their ports in
//!   [`port::PortRegistry`] values; the network attaches connections to them.
//! - A connection emits `connect`, `data`, group and `disconnect` signals
//!   synchronously to its subscribers; in-ports forward them to component
//!   listeners.
//! - A network is itself a component: its public ports alias internal node
//!   ports, so networks nest as subgraphs.

pub mod component;
pub mod components;
pub mod config;
pub mod connection;
pub mod error;
pub mod network;
#[cfg(test)]
mod network_test;
pub mod port;
pub mod process;
mod sync;
pub mod types;

pub use component::{Component, ComponentBuilder, ComponentRegistry, GraphDefinition};
pub use config::NetworkConfig;
pub use connection::{Connection, SubscriptionId};
pub use error::{BuildError, NetworkError, PortError, Result};
pub use network::{EdgeEnds, Network};
pub use port::{Port, PortAttributes, PortRegistry};
pub use process::Process;
pub use types::{EdgeEndSpec, GraphSpec, Metadata, NodeSpec, Payload, SocketEvent};
