//! Connection (socket): one directed edge and its signal state machine.
//!
//! A connection is `disconnected` until [`Connection::connect`], returns to
//! `disconnected` on [`Connection::disconnect`], and is terminal after
//! [`Connection::shutdown`]. Every signal is delivered synchronously to the
//! subscribers registered at emission time, in subscription order.
//!
//! Connections are owned by the [`crate::network::Network`] (as `Arc`) and
//! referenced weakly from the ports they are attached to.

use crate::sync::{lock, read, write};
use crate::types::{ConnectionSource, EdgeEndSpec, Metadata, Payload, SocketEvent};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::trace;
use uuid::Uuid;

/// Display name for an unset connection end.
pub const ANON: &str = "ANON";
/// Display name for an initial-data source.
pub const DATA: &str = "DATA";

/// Subscriber callback: the signal and the connection that emitted it.
pub type Listener = Arc<dyn Fn(&SocketEvent, &Connection) + Send + Sync>;

/// Handle returned by [`Connection::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Query shape shared by every connection lookup in the network.
#[derive(Debug, Clone, Copy)]
pub(crate) enum EdgeQuery<'a> {
  /// Port-to-port edges; `None` filters match any end.
  Edge {
    from: Option<&'a EdgeEndSpec>,
    to: Option<&'a EdgeEndSpec>,
  },
  /// Initial-data connections into `to`.
  Initial { to: &'a EdgeEndSpec },
}

/// One edge between an out-port (or initial data) and an in-port.
pub struct Connection {
  key: Uuid,
  source: RwLock<Option<ConnectionSource>>,
  target: RwLock<Option<EdgeEndSpec>>,
  metadata: Mutex<Metadata>,
  connected: AtomicBool,
  shut_down: AtomicBool,
  listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
  next_subscription: AtomicU64,
}

impl Connection {
  /// Creates a disconnected connection with the given ends.
  pub fn new(
    source: Option<ConnectionSource>,
    target: Option<EdgeEndSpec>,
    metadata: Metadata,
  ) -> Self {
    Self {
      key: Uuid::new_v4(),
      source: RwLock::new(source),
      target: RwLock::new(target),
      metadata: Mutex::new(metadata),
      connected: AtomicBool::new(false),
      shut_down: AtomicBool::new(false),
      listeners: Mutex::new(Vec::new()),
      next_subscription: AtomicU64::new(0),
    }
  }

  /// A port-to-port edge.
  pub fn edge(from: EdgeEndSpec, to: EdgeEndSpec, metadata: Metadata) -> Self {
    Self::new(Some(ConnectionSource::Port(from)), Some(to), metadata)
  }

  /// An initial-data connection carrying `data` into `to`.
  pub fn initial(data: Payload, to: EdgeEndSpec) -> Self {
    Self::new(
      Some(ConnectionSource::InitialData(data)),
      Some(to),
      Metadata::new(),
    )
  }

  /// Unique identity of this connection, independent of its ends.
  pub fn key(&self) -> Uuid {
    self.key
  }

  /// Human-readable `<from>:<to>` identifier for diagnostics.
  pub fn id(&self) -> String {
    let from = match &*read(&self.source) {
      None => ANON.to_string(),
      Some(ConnectionSource::InitialData(_)) => DATA.to_string(),
      Some(ConnectionSource::Port(end)) => end.to_string(),
    };
    let to = match &*read(&self.target) {
      None => ANON.to_string(),
      Some(end) => end.to_string(),
    };
    format!("{from}:{to}")
  }

  pub fn from(&self) -> Option<ConnectionSource> {
    read(&self.source).clone()
  }

  pub fn to(&self) -> Option<EdgeEndSpec> {
    read(&self.target).clone()
  }

  /// Source end as a port reference; `None` when unset or initial data.
  pub fn src(&self) -> Option<EdgeEndSpec> {
    read(&self.source)
      .as_ref()
      .and_then(ConnectionSource::as_port)
      .cloned()
  }

  /// Target end; alias of [`Connection::to`].
  pub fn tgt(&self) -> Option<EdgeEndSpec> {
    self.to()
  }

  /// The literal payload of an initial-data connection.
  pub fn initial_data(&self) -> Option<Payload> {
    read(&self.source)
      .as_ref()
      .and_then(ConnectionSource::initial_data)
      .cloned()
  }

  pub fn is_initial(&self) -> bool {
    read(&self.source)
      .as_ref()
      .is_some_and(ConnectionSource::is_initial)
  }

  pub(crate) fn set_from(&self, source: Option<ConnectionSource>) {
    *write(&self.source) = source;
  }

  pub(crate) fn set_to(&self, target: Option<EdgeEndSpec>) {
    *write(&self.target) = target;
  }

  pub fn metadata(&self) -> Metadata {
    lock(&self.metadata).clone()
  }

  pub fn merge_metadata(&self, metadata: &Metadata) {
    lock(&self.metadata).merge(metadata);
  }

  /// Registers a subscriber for every subsequent signal.
  pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
  where
    F: Fn(&SocketEvent, &Connection) + Send + Sync + 'static,
  {
    let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
    lock(&self.listeners).push((id, Arc::new(listener)));
    id
  }

  /// Removes a subscriber. Returns false if it was not registered.
  pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
    let mut listeners = lock(&self.listeners);
    let before = listeners.len();
    listeners.retain(|(sid, _)| *sid != id);
    listeners.len() != before
  }

  pub fn listener_count(&self) -> usize {
    lock(&self.listeners).len()
  }

  /// Subscribes a channel and returns its receiving end as a stream.
  ///
  /// The stream ends after the `Shutdown` signal, once the connection has
  /// dropped its subscribers.
  pub fn events(&self) -> UnboundedReceiverStream<SocketEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    self.subscribe(move |event, _| {
      // Fails only once the stream was dropped.
      let _ = tx.send(event.clone());
    });
    UnboundedReceiverStream::new(rx)
  }

  pub fn connect(&self) {
    self.connected.store(true, Ordering::SeqCst);
    self.emit(SocketEvent::Connect);
  }

  pub fn send(&self, data: Payload) {
    self.emit(SocketEvent::Data(data));
  }

  pub fn begin_group(&self, name: impl Into<String>) {
    self.emit(SocketEvent::BeginGroup(name.into()));
  }

  pub fn end_group(&self, name: impl Into<String>) {
    self.emit(SocketEvent::EndGroup(name.into()));
  }

  pub fn disconnect(&self) {
    self.connected.store(false, Ordering::SeqCst);
    self.emit(SocketEvent::Disconnect);
  }

  /// Terminal teardown: clears both ends, drops every subscriber and
  /// delivers a final `Shutdown` signal to the subscribers it dropped.
  pub fn shutdown(&self) {
    self.connected.store(false, Ordering::SeqCst);
    self.shut_down.store(true, Ordering::SeqCst);
    self.set_from(None);
    self.set_to(None);
    let listeners = std::mem::take(&mut *lock(&self.listeners));
    trace!(connection = %self.key, listeners = listeners.len(), "shutdown");
    for (_, listener) in listeners {
      listener(&SocketEvent::Shutdown, self);
    }
  }

  pub fn is_connected(&self) -> bool {
    self.connected.load(Ordering::SeqCst)
  }

  pub fn is_shut_down(&self) -> bool {
    self.shut_down.load(Ordering::SeqCst)
  }

  /// The single matching predicate behind edge and initial-data lookups.
  pub(crate) fn matches(&self, query: EdgeQuery<'_>) -> bool {
    let source = read(&self.source);
    let target = read(&self.target);
    match query {
      EdgeQuery::Edge { from, to } => {
        let Some(ConnectionSource::Port(src)) = source.as_ref() else {
          return false;
        };
        from.is_none_or(|f| f == src) && to.is_none_or(|t| target.as_ref() == Some(t))
      }
      EdgeQuery::Initial { to } => {
        source.as_ref().is_some_and(ConnectionSource::is_initial) && target.as_ref() == Some(to)
      }
    }
  }

  /// True when either end names `node_id`.
  pub(crate) fn touches(&self, node_id: &str) -> bool {
    let to_node = read(&self.target)
      .as_ref()
      .is_some_and(|t| t.node_id() == node_id);
    to_node || self.src().is_some_and(|s| s.node_id() == node_id)
  }

  fn emit(&self, event: SocketEvent) {
    let listeners: Vec<Listener> = lock(&self.listeners)
      .iter()
      .map(|(_, listener)| Arc::clone(listener))
      .collect();
    for listener in listeners {
      listener(&event, self);
    }
  }
}

impl fmt::Debug for Connection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Connection")
      .field("id", &self.id())
      .field("from", &self.from())
      .field("metadata", &self.metadata())
      .field("connected", &self.is_connected())
      .field("listeners", &self.listener_count())
      .finish()
  }
}

impl fmt::Display for Connection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.id())
  }
}
