//! Signals emitted by a connection.

use serde_json::Value;

/// One signal emitted by a [`crate::connection::Connection`].
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
  Connect,
  Data(Value),
  BeginGroup(String),
  EndGroup(String),
  Disconnect,
  /// Final signal; the connection must not be reused afterwards.
  Shutdown,
}

impl SocketEvent {
  /// Short signal name, as used in log output.
  pub fn kind(&self) -> &'static str {
    match self {
      SocketEvent::Connect => "connect",
      SocketEvent::Data(_) => "data",
      SocketEvent::BeginGroup(_) => "begin.group",
      SocketEvent::EndGroup(_) => "end.group",
      SocketEvent::Disconnect => "disconnect",
      SocketEvent::Shutdown => "shutdown",
    }
  }
}
