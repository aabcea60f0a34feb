//! The network: sole owner of a graph instance's processes and connections.
//!
//! Every mutation validates all of its preconditions before touching state,
//! so a failed call leaves no connection created and no port attached.
//! Nodes and connections are kept in creation order, which is the order
//! startup, shutdown, lookups and removal scans visit them in.

use crate::component::{Component, ComponentBuilder, GraphDefinition};
use crate::config::NetworkConfig;
use crate::connection::{Connection, EdgeQuery};
use crate::error::{EndRole, NetworkError, Result};
use crate::port::{NetworkPortRegistry, Port, PortDirection, PortRegistry};
use crate::process::Process;
use crate::types::datatype::DATATYPE_TABLE;
use crate::types::{
  ConnectionSource, EdgeEndSpec, EdgeSpec, ExportSpec, GraphSpec, InitialSpec, Metadata, NodeSpec,
  Payload, is_compatible, is_valid_datatype,
};
use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Both ends of a connection touching a node, as reported by
/// [`Network::find_edges_by_node`].
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeEnds {
  /// Source port; `None` for an initial-data connection.
  pub from: Option<EdgeEndSpec>,
  pub to: EdgeEndSpec,
}

/// A live, mutable FBP graph instance.
pub struct Network {
  name: String,
  description: String,
  debug: bool,
  builder: Arc<dyn ComponentBuilder>,
  processes: IndexMap<String, Process>,
  connections: Vec<Arc<Connection>>,
  graph: Option<Box<dyn GraphDefinition>>,
  startup: Option<DateTime<Utc>>,
  in_ports: NetworkPortRegistry,
  out_ports: NetworkPortRegistry,
}

impl Network {
  pub fn new(builder: Arc<dyn ComponentBuilder>, name: impl Into<String>) -> Self {
    Self::with_config(builder, NetworkConfig::named(name))
  }

  pub fn with_config(builder: Arc<dyn ComponentBuilder>, config: NetworkConfig) -> Self {
    Self {
      name: config.name,
      description: String::new(),
      debug: config.debug,
      builder,
      processes: IndexMap::new(),
      connections: Vec::new(),
      graph: None,
      startup: None,
      in_ports: NetworkPortRegistry::new(PortDirection::In),
      out_ports: NetworkPortRegistry::new(PortDirection::Out),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn set_description(&mut self, description: impl Into<String>) {
    self.description = description.into();
  }

  pub fn is_debug(&self) -> bool {
    self.debug
  }

  /// Enables per-signal debug logging for connections created from now on.
  pub fn set_debug(&mut self, enable: bool) {
    self.debug = enable;
  }

  // ---- lifecycle ----

  /// Time since [`Network::startup`]; `None` when not started.
  pub fn uptime(&self) -> Option<TimeDelta> {
    self.startup.map(|started| Utc::now() - started)
  }

  pub fn startup_time(&self) -> Option<DateTime<Utc>> {
    self.startup
  }

  pub fn is_started(&self) -> bool {
    self.startup.is_some()
  }

  /// Always false: signal delivery is synchronous, so no process is
  /// running whenever the caller can observe the network.
  pub fn is_running(&self) -> bool {
    false
  }

  /// Records the startup time and sends every initial value over its
  /// connection, in creation order. Calling it again re-sends them.
  #[instrument(level = "trace", skip(self), fields(network = %self.name))]
  pub fn startup(&mut self) {
    self.startup = Some(Utc::now());
    let initials: Vec<(Arc<Connection>, Payload)> = self
      .connections
      .iter()
      .filter_map(|c| c.initial_data().map(|data| (Arc::clone(c), data)))
      .collect();
    info!(network = %self.name, initials = initials.len(), "network startup");
    for (connection, data) in initials {
      connection.send(data);
    }
  }

  /// Tears everything down: components in creation order, then
  /// connections in creation order, then public ports and the graph
  /// definition. Safe to call when nothing is running.
  #[instrument(level = "trace", skip(self), fields(network = %self.name))]
  pub fn shutdown(&mut self) -> &mut Self {
    self.startup = None;
    self.in_ports.clear();
    self.out_ports.clear();
    for process in self.processes.values_mut() {
      process.component_mut().shutdown();
    }
    for connection in &self.connections {
      connection.shutdown();
    }
    if !self.processes.is_empty() || !self.connections.is_empty() {
      info!(
        network = %self.name,
        nodes = self.processes.len(),
        connections = self.connections.len(),
        "network shutdown"
      );
    }
    self.graph = None;
    self.processes.clear();
    self.connections.clear();
    self
  }

  // ---- nodes ----

  /// Builds the component named by `spec` and adds it as node `spec.id`.
  #[instrument(level = "trace", skip(self, spec), fields(network = %self.name, id = %spec.id))]
  pub fn add_node(&mut self, spec: &NodeSpec) -> Result<&Process> {
    if self.processes.contains_key(&spec.id) {
      return Err(NetworkError::invalid(format!(
        "Node with id '{}' already exists",
        spec.id
      )));
    }
    let component = self.builder.build(&spec.component)?;
    debug!(id = %spec.id, component = %spec.component, "add node");
    let process = self
      .processes
      .entry(spec.id.clone())
      .or_insert_with(|| Process::new(spec, component));
    Ok(process)
  }

  /// Removes a node. Refused while any connection still references it.
  #[instrument(level = "trace", skip(self), fields(network = %self.name))]
  pub fn remove_node(&mut self, id: &str) -> Result<&mut Self> {
    let edges = self.find_edges_by_node(id)?;
    if !edges.is_empty() {
      return Err(NetworkError::invalid(format!(
        "Node '{id}' still has edges"
      )));
    }
    self.processes.shift_remove(id);
    debug!(id, "remove node");
    Ok(self)
  }

  pub fn get_node(&self, id: &str) -> Result<&Process> {
    self
      .processes
      .get(id)
      .ok_or_else(|| NetworkError::missing_node(id, EndRole::Lookup))
  }

  pub fn get_node_mut(&mut self, id: &str) -> Result<&mut Process> {
    self
      .processes
      .get_mut(id)
      .ok_or_else(|| NetworkError::missing_node(id, EndRole::Lookup))
  }

  pub fn has_node(&self, id: &str) -> bool {
    self.processes.contains_key(id)
  }

  /// Nodes in creation order. A renamed node keeps its position.
  pub fn nodes(&self) -> impl Iterator<Item = &Process> {
    self.processes.values()
  }

  pub fn node_count(&self) -> usize {
    self.processes.len()
  }

  /// Renames node `from` to `to`, rewriting every connection end and
  /// public port that referenced it.
  #[instrument(level = "trace", skip(self), fields(network = %self.name))]
  pub fn rename_node(&mut self, from: &str, to: &str) -> Result<&mut Self> {
    self.get_node(from)?;
    if from == to {
      return Ok(self);
    }
    if self.processes.contains_key(to) {
      return Err(NetworkError::invalid(format!(
        "Node with id '{to}' already exists"
      )));
    }
    if let Some((index, _, mut process)) = self.processes.shift_remove_full(from) {
      process.set_id(to);
      self.processes.shift_insert(index, to.to_string(), process);
    }
    for connection in &self.connections {
      if let Some(src) = connection.src().filter(|s| s.node_id() == from) {
        connection.set_from(Some(ConnectionSource::Port(src.with_node_id(to))));
      }
      if let Some(tgt) = connection.to().filter(|t| t.node_id() == from) {
        connection.set_to(Some(tgt.with_node_id(to)));
      }
    }
    self.in_ports.rename_node(from, to);
    self.out_ports.rename_node(from, to);
    debug!(from, to, "rename node");
    Ok(self)
  }

  /// Merges `metadata` into the node's metadata.
  pub fn change_node(&mut self, id: &str, metadata: &Metadata) -> Result<&mut Self> {
    self.get_node_mut(id)?.merge_metadata(metadata);
    Ok(self)
  }

  // ---- edges ----

  /// Connects `from`'s out-port to `to`'s in-port.
  #[instrument(level = "trace", skip(self, from, to, metadata), fields(network = %self.name, %from, %to))]
  pub fn add_edge(
    &mut self,
    from: &EdgeEndSpec,
    to: &EdgeEndSpec,
    metadata: Option<Metadata>,
  ) -> Result<&mut Self> {
    let connection = self.connect_ports(from, to, metadata.unwrap_or_default())?;
    debug!(connection = %connection, "add edge");
    self.connections.push(connection);
    Ok(self)
  }

  /// Merges `metadata` into the single edge `from -> to`.
  pub fn change_edge(
    &mut self,
    from: &EdgeEndSpec,
    to: &EdgeEndSpec,
    metadata: &Metadata,
  ) -> Result<&mut Self> {
    let edges = self.find_edges(EdgeQuery::Edge {
      from: Some(from),
      to: Some(to),
    });
    match edges.as_slice() {
      [edge] => {
        edge.merge_metadata(metadata);
        Ok(self)
      }
      _ => Err(NetworkError::EdgeDoesNotExist {
        from: from.clone(),
        to: to.clone(),
        matches: edges.len(),
      }),
    }
  }

  /// Removes every port-to-port edge matching the filters; `None` matches
  /// any end. Matching nothing is not an error.
  #[instrument(level = "trace", skip(self), fields(network = %self.name))]
  pub fn remove_edge(
    &mut self,
    from: Option<&EdgeEndSpec>,
    to: Option<&EdgeEndSpec>,
  ) -> &mut Self {
    let removed = self.take_connections(EdgeQuery::Edge { from, to }, usize::MAX);
    for connection in &removed {
      debug!(connection = %connection, "remove edge");
    }
    self
  }

  /// The first port-to-port edge `from -> to`.
  pub fn find_edge(&self, from: &EdgeEndSpec, to: &EdgeEndSpec) -> Option<Arc<Connection>> {
    self
      .find_edges(EdgeQuery::Edge {
        from: Some(from),
        to: Some(to),
      })
      .into_iter()
      .next()
  }

  /// Every connection touching node `id`, each reported once.
  pub fn find_edges_by_node(&self, id: &str) -> Result<Vec<EdgeEnds>> {
    self.get_node(id)?;
    Ok(
      self
        .connections
        .iter()
        .filter(|c| c.touches(id))
        .filter_map(|c| {
          c.to().map(|to| EdgeEnds {
            from: c.src(),
            to,
          })
        })
        .collect(),
    )
  }

  /// All connections in creation order, initial-data ones included.
  pub fn connections(&self) -> &[Arc<Connection>] {
    &self.connections
  }

  // ---- initial data ----

  /// Injects `data` into `to`'s in-port. A port holds at most one initial
  /// value.
  #[instrument(level = "trace", skip(self, data, to), fields(network = %self.name, %to))]
  pub fn add_initial(&mut self, data: Payload, to: &EdgeEndSpec) -> Result<&mut Self> {
    let process = self
      .processes
      .get(to.node_id())
      .ok_or_else(|| NetworkError::missing_node(to.node_id(), EndRole::Target))?;
    let port = in_port(process, to.port_name())?;
    if !self.find_edges(EdgeQuery::Initial { to }).is_empty() {
      return Err(NetworkError::invalid(format!(
        "Initial data already defined for node '{}' and port '{}'",
        to.node_id(),
        to.port_name()
      )));
    }
    let connection = Arc::new(Connection::initial(data, to.clone()));
    self.install_hooks(&connection);
    port.attach(&connection);
    connection.connect();
    debug!(connection = %connection, "add initial");
    self.connections.push(connection);
    Ok(self)
  }

  /// The initial value injected into `to`.
  pub fn get_initial(&self, to: &EdgeEndSpec) -> Result<Payload> {
    self.get_node(to.node_id())?;
    self
      .find_edges(EdgeQuery::Initial { to })
      .first()
      .and_then(|c| c.initial_data())
      .ok_or_else(|| no_initial(to))
  }

  /// Removes the initial value injected into `to`.
  #[instrument(level = "trace", skip(self, to), fields(network = %self.name, %to))]
  pub fn remove_initial(&mut self, to: &EdgeEndSpec) -> Result<&mut Self> {
    self.get_node(to.node_id())?;
    let removed = self.take_connections(EdgeQuery::Initial { to }, 1);
    if removed.is_empty() {
      return Err(no_initial(to));
    }
    debug!(%to, "remove initial");
    Ok(self)
  }

  // ---- graph definition ----

  pub fn set_graph(&mut self, graph: Box<dyn GraphDefinition>) {
    self.graph = Some(graph);
  }

  pub fn graph(&self) -> Option<&dyn GraphDefinition> {
    self.graph.as_deref()
  }

  /// Hands initial data to the loaded graph definition.
  pub fn run(&mut self, data: Payload, node_id: &str, port_name: &str) -> Result<&mut Self> {
    let graph = self
      .graph
      .as_mut()
      .ok_or_else(|| NetworkError::Flow("Graph is not yet initialized!".to_string()))?;
    graph.add_initial(data, node_id, port_name);
    Ok(self)
  }

  /// Builds nodes, edges, initial data and public ports from `spec` and
  /// keeps it as this network's graph. On failure the network is shut down.
  #[instrument(level = "trace", skip(self, spec), fields(network = %self.name, graph = %spec.name))]
  pub fn boot(&mut self, spec: GraphSpec) -> Result<&mut Self> {
    if !self.processes.is_empty() || self.graph.is_some() {
      return Err(NetworkError::Flow(format!(
        "Network '{}' is already initialized",
        self.name
      )));
    }
    if let Err(e) = self.apply(&spec) {
      self.shutdown();
      return Err(e);
    }
    info!(
      network = %self.name,
      nodes = spec.nodes.len(),
      edges = spec.edges.len(),
      "network booted"
    );
    self.graph = Some(Box::new(spec));
    Ok(self)
  }

  fn apply(&mut self, spec: &GraphSpec) -> Result<()> {
    for node in &spec.nodes {
      self.add_node(node)?;
    }
    for edge in &spec.edges {
      self.add_edge(&edge.from, &edge.to, Some(edge.metadata.clone()))?;
    }
    for initial in &spec.initials {
      self.add_initial(initial.data.clone(), &initial.to)?;
    }
    for export in &spec.inports {
      self.add_in_port(&export.public, &export.port, export.metadata.clone())?;
    }
    for export in &spec.outports {
      self.add_out_port(&export.public, &export.port, export.metadata.clone())?;
    }
    Ok(())
  }

  /// Current topology as a graph definition. Nodes, edges and initial data
  /// are in creation order. Name and properties come from the
  /// loaded graph when there is one.
  pub fn snapshot(&self) -> GraphSpec {
    let nodes: Vec<NodeSpec> = self.processes.values().map(Process::to_spec).collect();
    let mut edges = Vec::new();
    let mut initials = Vec::new();
    for connection in &self.connections {
      let Some(to) = connection.to() else { continue };
      if let Some(data) = connection.initial_data() {
        initials.push(InitialSpec { data, to });
      } else if let Some(from) = connection.src() {
        edges.push(EdgeSpec {
          from,
          to,
          metadata: connection.metadata(),
        });
      }
    }
    let exports = |registry: &NetworkPortRegistry| -> Vec<ExportSpec> {
      registry
        .exports()
        .into_iter()
        .map(|(public, port, metadata)| ExportSpec {
          public: public.to_string(),
          port: port.clone(),
          metadata: metadata.clone(),
        })
        .collect()
    };
    let loaded = self.graph.as_deref().and_then(|graph| graph.as_graph_spec());
    GraphSpec {
      name: loaded.map_or_else(|| self.name.clone(), |g| g.name.clone()),
      properties: loaded.map(|g| g.properties.clone()).unwrap_or_default(),
      nodes,
      edges,
      initials,
      inports: exports(&self.in_ports),
      outports: exports(&self.out_ports),
    }
  }

  // ---- public ports ----

  /// Exposes node in-port `target` as this network's in-port `public`.
  pub fn add_in_port(
    &mut self,
    public: &str,
    target: &EdgeEndSpec,
    metadata: Metadata,
  ) -> Result<&mut Self> {
    let process = self
      .processes
      .get(target.node_id())
      .ok_or_else(|| NetworkError::missing_node(target.node_id(), EndRole::Target))?;
    let port = in_port(process, target.port_name())?;
    self.in_ports.add(public, target.clone(), port, metadata)?;
    debug!(public, %target, "add inport");
    Ok(self)
  }

  pub fn remove_in_port(&mut self, public: &str) -> &mut Self {
    self.in_ports.remove(public);
    self
  }

  /// Exposes node out-port `source` as this network's out-port `public`.
  pub fn add_out_port(
    &mut self,
    public: &str,
    source: &EdgeEndSpec,
    metadata: Metadata,
  ) -> Result<&mut Self> {
    let process = self
      .processes
      .get(source.node_id())
      .ok_or_else(|| NetworkError::missing_node(source.node_id(), EndRole::Source))?;
    let port = out_port(process, source.port_name())?;
    self.out_ports.add(public, source.clone(), port, metadata)?;
    debug!(public, %source, "add outport");
    Ok(self)
  }

  pub fn remove_out_port(&mut self, public: &str) -> &mut Self {
    self.out_ports.remove(public);
    self
  }

  pub fn public_in_ports(&self) -> &NetworkPortRegistry {
    &self.in_ports
  }

  pub fn public_out_ports(&self) -> &NetworkPortRegistry {
    &self.out_ports
  }

  // ---- internals ----

  /// Validates both ends and their datatypes, then creates the connection
  /// and attaches it to both ports.
  fn connect_ports(
    &self,
    from: &EdgeEndSpec,
    to: &EdgeEndSpec,
    metadata: Metadata,
  ) -> Result<Arc<Connection>> {
    let source = self
      .processes
      .get(from.node_id())
      .ok_or_else(|| NetworkError::missing_node(from.node_id(), EndRole::Source))?;
    let target = self
      .processes
      .get(to.node_id())
      .ok_or_else(|| NetworkError::missing_node(to.node_id(), EndRole::Target))?;
    let out = out_port(source, from.port_name())?;
    let inp = in_port(target, to.port_name())?;

    for (process, port, direction) in [(source, out, "outport"), (target, inp, "inport")] {
      if !is_valid_datatype(port.datatype()) {
        return Err(NetworkError::invalid(format!(
          "Process {} has invalid {} type {}. Valid types: {}",
          process.id(),
          direction,
          port.datatype(),
          DATATYPE_TABLE.describe()
        )));
      }
    }
    if !is_compatible(out.datatype(), inp.datatype()) {
      return Err(NetworkError::IncompatibleDatatype {
        from_node: source.id().to_string(),
        from_port: from.port_name().to_string(),
        from_type: out.datatype().to_string(),
        to_node: target.id().to_string(),
        to_port: to.port_name().to_string(),
        to_type: inp.datatype().to_string(),
      });
    }

    let connection = Arc::new(Connection::edge(from.clone(), to.clone(), metadata));
    self.install_hooks(&connection);
    out.attach(&connection);
    inp.attach(&connection);
    Ok(connection)
  }

  fn find_edges(&self, query: EdgeQuery<'_>) -> Vec<Arc<Connection>> {
    self
      .connections
      .iter()
      .filter(|c| c.matches(query))
      .cloned()
      .collect()
  }

  /// Removes up to `limit` matching connections from the collection and
  /// detaches each from both of its ports before returning.
  fn take_connections(&mut self, query: EdgeQuery<'_>, limit: usize) -> Vec<Arc<Connection>> {
    let mut removed = Vec::new();
    let mut kept = Vec::with_capacity(self.connections.len());
    for connection in std::mem::take(&mut self.connections) {
      if removed.len() < limit && connection.matches(query) {
        removed.push(connection);
      } else {
        kept.push(connection);
      }
    }
    self.connections = kept;
    for connection in &removed {
      self.detach(connection);
    }
    removed
  }

  fn detach(&self, connection: &Connection) {
    if let Some(port) = connection
      .to()
      .and_then(|to| self.port_at(&to, PortDirection::In))
    {
      port.detach(connection);
    }
    if let Some(port) = connection
      .src()
      .and_then(|from| self.port_at(&from, PortDirection::Out))
    {
      port.detach(connection);
    }
  }

  fn port_at(&self, end: &EdgeEndSpec, direction: PortDirection) -> Option<&Port> {
    let component = self.processes.get(end.node_id())?.component();
    let registry = match direction {
      PortDirection::In => component.in_ports(),
      PortDirection::Out => component.out_ports(),
    };
    registry.get(end.port_name()).ok()
  }

  fn install_hooks(&self, connection: &Connection) {
    if !self.debug {
      return;
    }
    let network = self.name.clone();
    connection.subscribe(move |event, connection| {
      debug!(network = %network, connection = %connection, event = event.kind(), "signal");
    });
  }
}

fn in_port<'a>(process: &'a Process, name: &str) -> Result<&'a Port> {
  process.component().in_ports().get(name).map_err(|_| {
    NetworkError::invalid(format!(
      "No inport {name} defined for process {}",
      process.id()
    ))
  })
}

fn out_port<'a>(process: &'a Process, name: &str) -> Result<&'a Port> {
  process.component().out_ports().get(name).map_err(|_| {
    NetworkError::invalid(format!(
      "No outport {name} defined for process {}",
      process.id()
    ))
  })
}

fn no_initial(to: &EdgeEndSpec) -> NetworkError {
  NetworkError::invalid(format!(
    "No initial to node '{}' and port '{}' found",
    to.node_id(),
    to.port_name()
  ))
}

impl Component for Network {
  fn description(&self) -> &str {
    &self.description
  }

  fn in_ports(&self) -> &PortRegistry {
    self.in_ports.ports()
  }

  fn out_ports(&self) -> &PortRegistry {
    self.out_ports.ports()
  }

  fn shutdown(&mut self) {
    Network::shutdown(self);
  }
}

impl fmt::Debug for Network {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Network")
      .field("name", &self.name)
      .field("nodes", &self.processes.len())
      .field("connections", &self.connections.len())
      .field("started", &self.startup)
      .finish()
  }
}
