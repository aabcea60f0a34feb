//! A single named, typed connection point on a component.
//!
//! Attachment state lives behind an `Arc` so a component can hold a
//! [`PortSender`] inside its listeners, and so a network can expose the same
//! port under a public name ([`Port::alias`]).

use crate::connection::{Connection, SubscriptionId};
use crate::error::PortError;
use crate::sync::lock;
use crate::types::{ALL, Payload, SocketEvent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use tracing::debug;
use uuid::Uuid;

/// Whether a port receives (in) or emits (out).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
  In,
  Out,
}

/// Scalar ports carry one logical stream; addressable ports expose their
/// sockets by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
  Scalar,
  Addressable,
}

/// Declared port attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortAttributes {
  /// Declared datatype name; validated against the datatype table when an
  /// edge is created, not here.
  pub datatype: String,
  pub addressable: bool,
  pub required: bool,
  pub description: Option<String>,
}

impl Default for PortAttributes {
  fn default() -> Self {
    Self {
      datatype: ALL.to_string(),
      addressable: false,
      required: false,
      description: None,
    }
  }
}

impl PortAttributes {
  pub fn new(datatype: impl Into<String>) -> Self {
    Self {
      datatype: datatype.into(),
      ..Self::default()
    }
  }

  pub fn addressable(mut self) -> Self {
    self.addressable = true;
    self
  }

  pub fn required(mut self) -> Self {
    self.required = true;
    self
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }
}

/// Port-level listener: the signal and the socket index it arrived on.
pub type PortListener = Arc<dyn Fn(&SocketEvent, usize) + Send + Sync>;

struct Slot {
  key: Uuid,
  connection: Weak<Connection>,
  subscription: Option<SubscriptionId>,
}

struct PortState {
  direction: PortDirection,
  kind: PortKind,
  slots: Mutex<Vec<Option<Slot>>>,
  listeners: Mutex<Vec<PortListener>>,
}

impl PortState {
  fn dispatch(&self, event: &SocketEvent, index: usize) {
    let listeners: Vec<PortListener> = lock(&self.listeners).iter().cloned().collect();
    for listener in listeners {
      listener(event, index);
    }
  }
}

/// Cloneable handle for signalling through a port's attached connections.
#[derive(Clone)]
pub struct PortSender {
  name: String,
  state: Arc<PortState>,
}

impl PortSender {
  pub fn name(&self) -> &str {
    &self.name
  }

  fn targets(&self, index: Option<usize>) -> Result<Vec<Arc<Connection>>, PortError> {
    let slots = lock(&self.state.slots);
    match index {
      None => {
        let live: Vec<Arc<Connection>> = slots
          .iter()
          .flatten()
          .filter_map(|slot| slot.connection.upgrade())
          .collect();
        if live.is_empty() {
          return Err(PortError::NotAttached(self.name.clone()));
        }
        Ok(live)
      }
      Some(index) => {
        if self.state.kind != PortKind::Addressable {
          return Err(PortError::NotAddressable(self.name.clone()));
        }
        slots
          .get(index)
          .and_then(Option::as_ref)
          .and_then(|slot| slot.connection.upgrade())
          .map(|conn| vec![conn])
          .ok_or_else(|| PortError::IndexNotAttached {
            port: self.name.clone(),
            index,
          })
      }
    }
  }

  fn each(
    &self,
    index: Option<usize>,
    signal: impl Fn(&Connection),
  ) -> Result<(), PortError> {
    for conn in self.targets(index)? {
      signal(&conn);
    }
    Ok(())
  }

  pub fn connect(&self) -> Result<(), PortError> {
    self.each(None, Connection::connect)
  }

  pub fn connect_to(&self, index: usize) -> Result<(), PortError> {
    self.each(Some(index), Connection::connect)
  }

  pub fn send(&self, data: Payload) -> Result<(), PortError> {
    self.each(None, |conn| conn.send(data.clone()))
  }

  pub fn send_to(&self, index: usize, data: Payload) -> Result<(), PortError> {
    self.each(Some(index), |conn| conn.send(data.clone()))
  }

  pub fn begin_group(&self, group: &str) -> Result<(), PortError> {
    self.each(None, |conn| conn.begin_group(group))
  }

  pub fn end_group(&self, group: &str) -> Result<(), PortError> {
    self.each(None, |conn| conn.end_group(group))
  }

  pub fn disconnect(&self) -> Result<(), PortError> {
    self.each(None, Connection::disconnect)
  }

  pub fn disconnect_from(&self, index: usize) -> Result<(), PortError> {
    self.each(Some(index), Connection::disconnect)
  }
}

/// A named, typed port.
pub struct Port {
  name: String,
  attributes: PortAttributes,
  sender: PortSender,
}

impl Port {
  /// Creates a port; the variant follows `attributes.addressable`.
  pub fn new(name: impl Into<String>, attributes: PortAttributes, direction: PortDirection) -> Self {
    let name = name.into();
    let kind = if attributes.addressable {
      PortKind::Addressable
    } else {
      PortKind::Scalar
    };
    Self {
      sender: PortSender {
        name: name.clone(),
        state: Arc::new(PortState {
          direction,
          kind,
          slots: Mutex::new(Vec::new()),
          listeners: Mutex::new(Vec::new()),
        }),
      },
      name,
      attributes,
    }
  }

  /// The same port published under another name. Attachments and
  /// listeners are shared with `self`.
  pub fn alias(&self, name: impl Into<String>) -> Port {
    let name = name.into();
    Port {
      sender: PortSender {
        name: name.clone(),
        state: Arc::clone(&self.sender.state),
      },
      name,
      attributes: self.attributes.clone(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn attributes(&self) -> &PortAttributes {
    &self.attributes
  }

  pub fn datatype(&self) -> &str {
    &self.attributes.datatype
  }

  pub fn kind(&self) -> PortKind {
    self.sender.state.kind
  }

  pub fn direction(&self) -> PortDirection {
    self.sender.state.direction
  }

  pub fn is_addressable(&self) -> bool {
    self.kind() == PortKind::Addressable
  }

  /// True if `other` shares this port's attachment state.
  pub fn same_port(&self, other: &Port) -> bool {
    Arc::ptr_eq(&self.sender.state, &other.sender.state)
  }

  /// Records `connection` as attached and returns its socket index.
  ///
  /// Attaching an already attached connection returns its existing index.
  /// In-ports forward the connection's signals to their listeners.
  pub fn attach(&self, connection: &Arc<Connection>) -> usize {
    let state = &self.sender.state;
    let mut slots = lock(&state.slots);
    if let Some(index) = slots
      .iter()
      .position(|slot| slot.as_ref().is_some_and(|s| s.key == connection.key()))
    {
      return index;
    }
    if self.kind() == PortKind::Scalar && slots.iter().any(Option::is_some) {
      debug!(port = %self.name, connection = %connection, "scalar port attached more than once");
    }
    let index = slots.iter().position(Option::is_none).unwrap_or(slots.len());
    let subscription = match state.direction {
      PortDirection::In => {
        let weak_state = Arc::downgrade(state);
        Some(connection.subscribe(move |event, _| {
          if let Some(state) = weak_state.upgrade() {
            state.dispatch(event, index);
          }
        }))
      }
      PortDirection::Out => None,
    };
    let slot = Slot {
      key: connection.key(),
      connection: Arc::downgrade(connection),
      subscription,
    };
    if index == slots.len() {
      slots.push(Some(slot));
    } else {
      slots[index] = Some(slot);
    }
    index
  }

  /// Removes the attachment record for `connection`. Returns false if it
  /// was not attached.
  pub fn detach(&self, connection: &Connection) -> bool {
    let mut slots = lock(&self.sender.state.slots);
    let Some(index) = slots
      .iter()
      .position(|slot| slot.as_ref().is_some_and(|s| s.key == connection.key()))
    else {
      return false;
    };
    if let Some(subscription) = slots[index].take().and_then(|slot| slot.subscription) {
      connection.unsubscribe(subscription);
    }
    while matches!(slots.last(), Some(None)) {
      slots.pop();
    }
    true
  }

  /// Drops every attachment record.
  pub fn detach_all(&self) {
    let slots = std::mem::take(&mut *lock(&self.sender.state.slots));
    for slot in slots.into_iter().flatten() {
      if let (Some(conn), Some(subscription)) = (slot.connection.upgrade(), slot.subscription) {
        conn.unsubscribe(subscription);
      }
    }
  }

  /// With `None`, true if any connection is attached; with an index, true
  /// if that socket is attached.
  pub fn is_attached(&self, index: Option<usize>) -> bool {
    let slots = lock(&self.sender.state.slots);
    match index {
      None => slots.iter().flatten().any(|s| s.connection.strong_count() > 0),
      Some(i) => slots
        .get(i)
        .and_then(Option::as_ref)
        .is_some_and(|s| s.connection.strong_count() > 0),
    }
  }

  /// True if `connection` is recorded as attached.
  pub fn is_attached_to(&self, connection: &Connection) -> bool {
    lock(&self.sender.state.slots)
      .iter()
      .flatten()
      .any(|s| s.key == connection.key())
  }

  /// Socket indexes that currently hold a live connection.
  pub fn attached_indexes(&self) -> Vec<usize> {
    lock(&self.sender.state.slots)
      .iter()
      .enumerate()
      .filter(|(_, slot)| {
        slot
          .as_ref()
          .is_some_and(|s| s.connection.strong_count() > 0)
      })
      .map(|(i, _)| i)
      .collect()
  }

  /// Live attached connections in socket order.
  pub fn connections(&self) -> Vec<Arc<Connection>> {
    lock(&self.sender.state.slots)
      .iter()
      .flatten()
      .filter_map(|s| s.connection.upgrade())
      .collect()
  }

  pub fn is_connected(&self) -> bool {
    self.connections().iter().any(|c| c.is_connected())
  }

  /// Registers a listener for signals arriving on any attached socket.
  pub fn on<F>(&self, listener: F)
  where
    F: Fn(&SocketEvent, usize) + Send + Sync + 'static,
  {
    lock(&self.sender.state.listeners).push(Arc::new(listener));
  }

  pub fn clear_listeners(&self) {
    lock(&self.sender.state.listeners).clear();
  }

  /// A cloneable signalling handle, for use inside listeners.
  pub fn sender(&self) -> PortSender {
    self.sender.clone()
  }

  pub fn connect(&self) -> Result<(), PortError> {
    self.sender.connect()
  }

  pub fn send(&self, data: Payload) -> Result<(), PortError> {
    self.sender.send(data)
  }

  pub fn send_to(&self, index: usize, data: Payload) -> Result<(), PortError> {
    self.sender.send_to(index, data)
  }

  pub fn begin_group(&self, group: &str) -> Result<(), PortError> {
    self.sender.begin_group(group)
  }

  pub fn end_group(&self, group: &str) -> Result<(), PortError> {
    self.sender.end_group(group)
  }

  pub fn disconnect(&self) -> Result<(), PortError> {
    self.sender.disconnect()
  }
}

impl fmt::Debug for Port {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Port")
      .field("name", &self.name)
      .field("datatype", &self.attributes.datatype)
      .field("kind", &self.kind())
      .field("direction", &self.direction())
      .field("attached", &self.attached_indexes())
      .finish()
  }
}
