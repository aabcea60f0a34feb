//! Value types shared by ports, connections and the network.

pub mod datatype;
mod edge_end_spec;
mod graph_spec;
mod metadata;
mod node_spec;
mod socket_event;

pub use datatype::{ALL, DATATYPES, is_compatible, is_valid_datatype};
pub use edge_end_spec::{ConnectionSource, EdgeEndSpec};
pub use graph_spec::{EdgeSpec, ExportSpec, GraphSpec, InitialSpec};
pub use metadata::Metadata;
pub use node_spec::NodeSpec;
pub use socket_event::SocketEvent;

/// Payload carried by data signals and initial-data connections.
pub type Payload = serde_json::Value;
