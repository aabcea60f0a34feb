//! Tests for `Network`.

use crate::component::{Component, ComponentBuilder, ComponentRegistry};
use crate::components::{BasicComponent, IdentityComponent};
use crate::config::NetworkConfig;
use crate::error::{BuildError, EndRole, NetworkError};
use crate::network::{EdgeEnds, Network};
use crate::port::{PortAttributes, PortRegistry};
use crate::types::{EdgeEndSpec, ExportSpec, GraphSpec, Metadata, NodeSpec, SocketEvent};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

fn registry() -> Arc<ComponentRegistry> {
  let mut registry = ComponentRegistry::new();
  registry
    .register("Forward", || Box::new(IdentityComponent::default()))
    .register("Number", || Box::new(IdentityComponent::new("number")))
    .register("String", || Box::new(IdentityComponent::new("string")))
    .register("Bogus", || {
      let component = BasicComponent::new("declares an unknown datatype")
        .with_in_port("in", PortAttributes::new("bogus"))
        .and_then(|c| c.with_out_port("out", PortAttributes::new("bogus")));
      let component: Box<dyn Component> = match component {
        Ok(c) => Box::new(c),
        Err(_) => Box::new(BasicComponent::new("unreachable")),
      };
      component
    });
  Arc::new(registry)
}

fn network() -> Network {
  Network::new(registry(), "test")
}

fn end(node: &str, port: &str) -> EdgeEndSpec {
  EdgeEndSpec::new(node, port)
}

fn with_nodes(nodes: &[(&str, &str)]) -> Network {
  let mut net = network();
  for (id, component) in nodes {
    net.add_node(&NodeSpec::new(*id, *component)).unwrap();
  }
  net
}

/// Records every signal arriving on an in-port of a node.
fn listen(net: &Network, node: &str, port: &str) -> Arc<Mutex<Vec<SocketEvent>>> {
  let seen = Arc::new(Mutex::new(Vec::new()));
  let sink = Arc::clone(&seen);
  net
    .get_node(node)
    .unwrap()
    .component()
    .in_ports()
    .get(port)
    .unwrap()
    .on(move |event, _| sink.lock().unwrap().push(event.clone()));
  seen
}

fn data(seen: &Arc<Mutex<Vec<SocketEvent>>>) -> Vec<Value> {
  seen
    .lock()
    .unwrap()
    .iter()
    .filter_map(|e| match e {
      SocketEvent::Data(v) => Some(v.clone()),
      _ => None,
    })
    .collect()
}

// ---- nodes ----

#[test]
fn add_node_builds_component_and_copies_metadata() {
  let mut net = network();
  let meta: Metadata = [("x", json!(1))].into_iter().collect();
  let node = net
    .add_node(&NodeSpec::new("a", "Forward").with_metadata(meta))
    .unwrap();
  assert_eq!(node.id(), "a");
  assert_eq!(node.component_name(), "Forward");
  assert_eq!(node.metadata().get("x"), Some(&json!(1)));
  assert_eq!(net.node_count(), 1);
}

#[test]
fn duplicate_node_id_is_rejected_and_first_kept() {
  let mut net = with_nodes(&[("a", "Forward")]);
  let err = net.add_node(&NodeSpec::new("a", "Number")).unwrap_err();
  assert!(err.is_definition_error());
  assert_eq!(err.to_string(), "Node with id 'a' already exists");
  assert_eq!(net.get_node("a").unwrap().component_name(), "Forward");
}

#[test]
fn unknown_component_fails_add_node() {
  let mut net = network();
  let err = net.add_node(&NodeSpec::new("a", "Missing")).unwrap_err();
  assert_eq!(
    err,
    NetworkError::Build(BuildError::UnknownComponent("Missing".into()))
  );
  assert!(!net.has_node("a"));
}

#[test]
fn get_node_missing_is_node_does_not_exist() {
  let net = network();
  assert_eq!(
    net.get_node("ghost").unwrap_err(),
    NetworkError::NodeDoesNotExist {
      id: "ghost".into(),
      role: EndRole::Lookup
    }
  );
}

#[test]
fn remove_node_refused_while_edges_remain() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward")]);
  net.add_edge(&end("a", "out"), &end("b", "in"), None).unwrap();

  let err = net.remove_node("a").unwrap_err();
  assert!(err.is_definition_error());
  assert!(net.has_node("a"));

  net.remove_edge(Some(&end("a", "out")), None);
  net.remove_node("a").unwrap();
  net.remove_node("b").unwrap();
  assert_eq!(net.node_count(), 0);
}

#[test]
fn remove_unknown_node_fails() {
  let mut net = network();
  assert!(matches!(
    net.remove_node("x"),
    Err(NetworkError::NodeDoesNotExist { .. })
  ));
}

#[test]
fn initial_data_blocks_remove_node() {
  let mut net = with_nodes(&[("a", "Forward")]);
  net.add_initial(json!(1), &end("a", "in")).unwrap();
  assert!(net.remove_node("a").is_err());
  net.remove_initial(&end("a", "in")).unwrap();
  net.remove_node("a").unwrap();
}

#[test]
fn change_node_merges_metadata() {
  let mut net = network();
  let meta: Metadata = [("a", json!(0)), ("c", json!(2))].into_iter().collect();
  net
    .add_node(&NodeSpec::new("n", "Forward").with_metadata(meta))
    .unwrap();
  let patch: Metadata = [("a", json!(1)), ("b", Value::Null)].into_iter().collect();
  net.change_node("n", &patch).unwrap();
  let expected: Metadata = [("a", json!(1)), ("c", json!(2))].into_iter().collect();
  assert_eq!(net.get_node("n").unwrap().metadata(), &expected);
  assert!(net.change_node("missing", &patch).is_err());
}

// ---- rename ----

#[test]
fn rename_node_rewrites_edges_and_initials() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward")]);
  net.add_edge(&end("a", "out"), &end("b", "in"), None).unwrap();
  net.add_initial(json!("seed"), &end("a", "in")).unwrap();

  net.rename_node("a", "x").unwrap();

  assert!(!net.has_node("a"));
  assert_eq!(net.get_node("x").unwrap().id(), "x");
  assert!(net.find_edge(&end("x", "out"), &end("b", "in")).is_some());
  assert_eq!(net.get_initial(&end("x", "in")).unwrap(), json!("seed"));
  assert_eq!(
    net.connections()[0].id(),
    "x.out:b.in"
  );
}

#[test]
fn rename_node_to_existing_id_fails() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward")]);
  let err = net.rename_node("a", "b").unwrap_err();
  assert!(matches!(err, NetworkError::InvalidDefinition(_)));
  assert!(net.rename_node("ghost", "c").is_err());
  net.rename_node("a", "a").unwrap();
  assert!(net.has_node("a"));
}

// ---- edges ----

#[test]
fn add_edge_attaches_both_ports() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward")]);
  net.add_edge(&end("a", "out"), &end("b", "in"), None).unwrap();
  let connection = net.find_edge(&end("a", "out"), &end("b", "in")).unwrap();
  let a = net.get_node("a").unwrap().component();
  let b = net.get_node("b").unwrap().component();
  assert!(a.out_ports().get("out").unwrap().is_attached_to(&connection));
  assert!(b.in_ports().get("in").unwrap().is_attached_to(&connection));
}

#[test]
fn add_edge_missing_node_names_the_side() {
  let mut net = with_nodes(&[("a", "Forward")]);
  let err = net
    .add_edge(&end("a", "out"), &end("b", "in"), None)
    .unwrap_err();
  assert_eq!(err.to_string(), "No process defined for target node b");
  let err = net
    .add_edge(&end("z", "out"), &end("a", "in"), None)
    .unwrap_err();
  assert_eq!(err.to_string(), "No process defined for source node z");
  assert!(net.connections().is_empty());
}

#[test]
fn add_edge_missing_port_is_definition_error() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward")]);
  let err = net
    .add_edge(&end("a", "nope"), &end("b", "in"), None)
    .unwrap_err();
  assert_eq!(err.to_string(), "No outport nope defined for process a");
  let err = net
    .add_edge(&end("a", "out"), &end("b", "nope"), None)
    .unwrap_err();
  assert_eq!(err.to_string(), "No inport nope defined for process b");
  assert!(net.connections().is_empty());
}

#[test]
fn incompatible_datatypes_create_no_connection() {
  let mut net = with_nodes(&[("s", "String"), ("n", "Number")]);
  let err = net
    .add_edge(&end("s", "out"), &end("n", "in"), None)
    .unwrap_err();
  assert_eq!(
    err,
    NetworkError::IncompatibleDatatype {
      from_node: "s".into(),
      from_port: "out".into(),
      from_type: "string".into(),
      to_node: "n".into(),
      to_port: "in".into(),
      to_type: "number".into(),
    }
  );
  assert!(!err.is_definition_error());
  assert!(net.connections().is_empty());
  let s = net.get_node("s").unwrap().component();
  let n = net.get_node("n").unwrap().component();
  assert!(!s.out_ports().get("out").unwrap().is_attached(None));
  assert!(!n.in_ports().get("in").unwrap().is_attached(None));
}

#[test]
fn all_is_compatible_with_typed_ports() {
  let mut net = with_nodes(&[("s", "String"), ("f", "Forward"), ("n", "Number")]);
  net.add_edge(&end("s", "out"), &end("f", "in"), None).unwrap();
  net.add_edge(&end("f", "out"), &end("n", "in"), None).unwrap();
  assert_eq!(net.connections().len(), 2);
}

#[test]
fn unknown_datatype_is_definition_error() {
  let mut net = with_nodes(&[("bad", "Bogus"), ("f", "Forward")]);
  let err = net
    .add_edge(&end("bad", "out"), &end("f", "in"), None)
    .unwrap_err();
  assert!(matches!(err, NetworkError::InvalidDefinition(ref m) if m.contains("invalid outport type bogus")));
  let err = net
    .add_edge(&end("f", "out"), &end("bad", "in"), None)
    .unwrap_err();
  assert!(matches!(err, NetworkError::InvalidDefinition(ref m) if m.contains("invalid inport type bogus")));
  assert!(net.connections().is_empty());
}

#[test]
fn edge_carries_signals_between_components() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward")]);
  net.add_edge(&end("a", "out"), &end("b", "in"), None).unwrap();
  let seen = listen(&net, "b", "in");
  let out = net.get_node("a").unwrap().component().out_ports().get("out").unwrap();
  out.connect().unwrap();
  out.send(json!("hello")).unwrap();
  out.disconnect().unwrap();
  assert_eq!(
    *seen.lock().unwrap(),
    vec![
      SocketEvent::Connect,
      SocketEvent::Data(json!("hello")),
      SocketEvent::Disconnect
    ]
  );
}

#[test]
fn remove_edge_detaches_both_sides() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward")]);
  net.add_edge(&end("a", "out"), &end("b", "in"), None).unwrap();
  let connection = net.find_edge(&end("a", "out"), &end("b", "in")).unwrap();

  net.remove_edge(Some(&end("a", "out")), Some(&end("b", "in")));

  assert!(net.connections().is_empty());
  let a = net.get_node("a").unwrap().component();
  let b = net.get_node("b").unwrap().component();
  assert!(!a.out_ports().get("out").unwrap().is_attached_to(&connection));
  assert!(!b.in_ports().get("in").unwrap().is_attached_to(&connection));
  assert_eq!(connection.listener_count(), 0);
}

#[test]
fn remove_edge_filters_and_keeps_initials() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward"), ("c", "Forward")]);
  net
    .add_edge(&end("a", "out"), &end("b", "in"), None)
    .unwrap()
    .add_edge(&end("a", "out"), &end("c", "in"), None)
    .unwrap()
    .add_initial(json!(1), &end("a", "in"))
    .unwrap();

  net.remove_edge(None, Some(&end("c", "in")));
  assert_eq!(net.connections().len(), 2);
  assert!(net.find_edge(&end("a", "out"), &end("b", "in")).is_some());

  net.remove_edge(None, None);
  assert_eq!(net.connections().len(), 1);
  assert!(net.connections()[0].is_initial());
}

#[test]
fn remove_edge_without_match_is_noop() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward")]);
  net.add_edge(&end("a", "out"), &end("b", "in"), None).unwrap();
  net.remove_edge(Some(&end("b", "out")), None);
  assert_eq!(net.connections().len(), 1);
}

#[test]
fn change_edge_merges_metadata_on_unique_match() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward")]);
  let meta: Metadata = [("a", json!(0)), ("c", json!(2))].into_iter().collect();
  net
    .add_edge(&end("a", "out"), &end("b", "in"), Some(meta))
    .unwrap();
  let patch: Metadata = [("a", json!(1)), ("b", Value::Null)].into_iter().collect();
  net
    .change_edge(&end("a", "out"), &end("b", "in"), &patch)
    .unwrap();
  let merged = net.connections()[0].metadata();
  let expected: Metadata = [("c", json!(2)), ("a", json!(1))].into_iter().collect();
  assert_eq!(merged, expected);
}

#[test]
fn change_edge_requires_exactly_one_match() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward")]);
  let err = net
    .change_edge(&end("a", "out"), &end("b", "in"), &Metadata::new())
    .unwrap_err();
  assert!(matches!(err, NetworkError::EdgeDoesNotExist { matches: 0, .. }));

  net
    .add_edge(&end("a", "out"), &end("b", "in"), None)
    .unwrap()
    .add_edge(&end("a", "out"), &end("b", "in"), None)
    .unwrap();
  let err = net
    .change_edge(&end("a", "out"), &end("b", "in"), &Metadata::new())
    .unwrap_err();
  assert!(matches!(err, NetworkError::EdgeDoesNotExist { matches: 2, .. }));
}

#[test]
fn find_edges_by_node_reports_both_directions() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward"), ("c", "Forward")]);
  net
    .add_edge(&end("a", "out"), &end("b", "in"), None)
    .unwrap()
    .add_edge(&end("b", "out"), &end("c", "in"), None)
    .unwrap()
    .add_initial(json!(0), &end("b", "in"))
    .unwrap();

  let edges = net.find_edges_by_node("b").unwrap();
  assert_eq!(
    edges,
    vec![
      EdgeEnds {
        from: Some(end("a", "out")),
        to: end("b", "in")
      },
      EdgeEnds {
        from: Some(end("b", "out")),
        to: end("c", "in")
      },
      EdgeEnds {
        from: None,
        to: end("b", "in")
      },
    ]
  );
  assert!(net.find_edges_by_node("ghost").is_err());
}

#[test]
fn self_loop_is_reported_once() {
  let mut net = with_nodes(&[("a", "Forward")]);
  net.add_edge(&end("a", "out"), &end("a", "in"), None).unwrap();
  assert_eq!(net.find_edges_by_node("a").unwrap().len(), 1);
}

// ---- initial data ----

#[test]
fn initial_data_round_trip() {
  let mut net = with_nodes(&[("a", "Forward")]);
  net.add_initial(json!(42), &end("a", "in")).unwrap();
  assert_eq!(net.get_initial(&end("a", "in")).unwrap(), json!(42));

  net.remove_initial(&end("a", "in")).unwrap();
  let err = net.get_initial(&end("a", "in")).unwrap_err();
  assert!(err.is_definition_error());
  assert_eq!(
    err.to_string(),
    "No initial to node 'a' and port 'in' found"
  );
  assert!(net.remove_initial(&end("a", "in")).is_err());
}

#[test]
fn add_initial_validates_target() {
  let mut net = with_nodes(&[("a", "Forward")]);
  assert_eq!(
    net.add_initial(json!(1), &end("ghost", "in")).unwrap_err().to_string(),
    "No process defined for target node ghost"
  );
  assert_eq!(
    net.add_initial(json!(1), &end("a", "nope")).unwrap_err().to_string(),
    "No inport nope defined for process a"
  );
  assert!(net.connections().is_empty());
}

#[test]
fn second_initial_for_same_port_is_rejected() {
  let mut net = with_nodes(&[("a", "Forward")]);
  net.add_initial(json!(1), &end("a", "in")).unwrap();
  let err = net.add_initial(json!(2), &end("a", "in")).unwrap_err();
  assert!(err.is_definition_error());
  assert_eq!(net.connections().len(), 1);
  assert_eq!(net.get_initial(&end("a", "in")).unwrap(), json!(1));
}

#[test]
fn add_initial_connects_immediately() {
  let mut net = with_nodes(&[("a", "Forward")]);
  let seen = listen(&net, "a", "in");
  net.add_initial(json!(1), &end("a", "in")).unwrap();
  assert!(net.connections()[0].is_connected());
  assert_eq!(*seen.lock().unwrap(), vec![SocketEvent::Connect]);
}

#[test]
fn remove_initial_detaches_in_port() {
  let mut net = with_nodes(&[("a", "Forward")]);
  net.add_initial(json!(1), &end("a", "in")).unwrap();
  let connection = Arc::clone(&net.connections()[0]);
  net.remove_initial(&end("a", "in")).unwrap();
  let a = net.get_node("a").unwrap().component();
  assert!(!a.in_ports().get("in").unwrap().is_attached_to(&connection));
}

// ---- lifecycle ----

#[test]
fn startup_delivers_each_initial_to_its_own_target() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward")]);
  net
    .add_initial(json!("for-a"), &end("a", "in"))
    .unwrap()
    .add_initial(json!("for-b"), &end("b", "in"))
    .unwrap();
  let (seen_a, seen_b) = (listen(&net, "a", "in"), listen(&net, "b", "in"));

  assert!(!net.is_started());
  net.startup();

  assert!(net.is_started());
  assert!(net.startup_time().is_some());
  assert!(!net.is_running());
  assert_eq!(data(&seen_a), vec![json!("for-a")]);
  assert_eq!(data(&seen_b), vec![json!("for-b")]);
}

#[test]
fn startup_cascades_through_edges() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward"), ("c", "Forward")]);
  net
    .add_edge(&end("a", "out"), &end("b", "in"), None)
    .unwrap()
    .add_edge(&end("b", "out"), &end("c", "in"), None)
    .unwrap()
    .add_initial(json!({"n": 3}), &end("a", "in"))
    .unwrap();
  let seen = listen(&net, "c", "in");
  net.startup();
  assert_eq!(data(&seen), vec![json!({"n": 3})]);
}

#[test]
fn repeated_startup_resends_initials() {
  let mut net = with_nodes(&[("a", "Forward")]);
  net.add_initial(json!(7), &end("a", "in")).unwrap();
  let seen = listen(&net, "a", "in");
  net.startup();
  net.startup();
  assert_eq!(data(&seen), vec![json!(7), json!(7)]);
}

#[test]
fn uptime_is_none_until_started() {
  let mut net = network();
  assert!(net.uptime().is_none());
  net.startup();
  let uptime = net.uptime().unwrap();
  assert!(uptime >= chrono::TimeDelta::zero());
}

#[test]
fn shutdown_is_idempotent_and_clears_everything() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward")]);
  net
    .add_edge(&end("a", "out"), &end("b", "in"), None)
    .unwrap()
    .add_initial(json!(1), &end("a", "in"))
    .unwrap();
  net.startup();
  let connection = Arc::clone(&net.connections()[0]);

  net.shutdown();
  net.shutdown();

  assert_eq!(net.node_count(), 0);
  assert!(net.connections().is_empty());
  assert!(net.uptime().is_none());
  assert!(!net.is_started());
  assert!(net.graph().is_none());
  assert!(connection.is_shut_down());
  assert_eq!(connection.to(), None);
}

#[test]
fn shutdown_on_empty_network_is_fine() {
  let mut net = network();
  net.shutdown();
  assert_eq!(net.node_count(), 0);
}

// ---- graph definition ----

#[test]
fn run_without_graph_is_flow_error() {
  let mut net = network();
  let err = net.run(json!(1), "a", "in").unwrap_err();
  assert_eq!(err, NetworkError::Flow("Graph is not yet initialized!".into()));
  assert!(!err.is_definition_error());
}

#[test]
fn run_delegates_to_graph() {
  let mut net = network();
  net.set_graph(Box::new(GraphSpec::new("g")));
  net.run(json!(5), "a", "in").unwrap();
  let graph = net.graph().and_then(|g| g.as_graph_spec()).unwrap();
  assert_eq!(graph.initials.len(), 1);
  assert_eq!(graph.initials[0].data, json!(5));
}

fn sample_graph() -> GraphSpec {
  let mut spec = GraphSpec::new("sample")
    .with_node("a", "Forward")
    .with_node("b", "Number")
    .with_edge(end("a", "out"), end("b", "in"))
    .with_initial(json!(1), end("a", "in"));
  spec.properties.insert("author", json!("ops"));
  spec.inports.push(ExportSpec {
    public: "input".into(),
    port: end("a", "in"),
    metadata: Metadata::new(),
  });
  spec.outports.push(ExportSpec {
    public: "output".into(),
    port: end("b", "out"),
    metadata: Metadata::new(),
  });
  spec
}

#[test]
fn boot_builds_topology_and_keeps_graph() {
  let mut net = network();
  net.boot(sample_graph()).unwrap();
  assert_eq!(net.node_count(), 2);
  assert_eq!(net.connections().len(), 2);
  assert!(net.in_ports().has("input"));
  assert!(net.out_ports().has("output"));
  assert!(net.graph().is_some());
  net.run(json!(2), "a", "in").unwrap();
}

#[test]
fn boot_failure_leaves_network_empty() {
  let mut net = network();
  let spec = GraphSpec::new("broken")
    .with_node("s", "String")
    .with_node("n", "Number")
    .with_edge(end("s", "out"), end("n", "in"));
  let err = net.boot(spec).unwrap_err();
  assert!(matches!(err, NetworkError::IncompatibleDatatype { .. }));
  assert_eq!(net.node_count(), 0);
  assert!(net.graph().is_none());
}

#[test]
fn boot_twice_is_flow_error() {
  let mut net = network();
  net.boot(sample_graph()).unwrap();
  assert!(matches!(net.boot(sample_graph()), Err(NetworkError::Flow(_))));
  assert_eq!(net.node_count(), 2);
}

#[test]
fn snapshot_reproduces_booted_graph() {
  let mut net = network();
  let spec = sample_graph();
  net.boot(spec.clone()).unwrap();
  assert_eq!(net.snapshot(), spec);
}

#[test]
fn snapshot_reflects_mutations() {
  let mut net = with_nodes(&[("b", "Forward"), ("a", "Forward")]);
  let meta: Metadata = [("route", json!(1))].into_iter().collect();
  net
    .add_edge(&end("a", "out"), &end("b", "in"), Some(meta.clone()))
    .unwrap();
  let snapshot = net.snapshot();
  assert_eq!(snapshot.name, "test");
  let ids: Vec<&str> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
  assert_eq!(ids, vec!["b", "a"]);
  assert_eq!(snapshot.edges[0].metadata, meta);
  assert!(snapshot.initials.is_empty());
}

// ---- public ports ----

#[test]
fn public_in_port_aliases_internal_port() {
  let mut net = with_nodes(&[("a", "Forward")]);
  let meta: Metadata = [("x", json!(1))].into_iter().collect();
  net.add_in_port("input", &end("a", "in"), meta.clone()).unwrap();

  let public = net.in_ports().get("input").unwrap();
  let internal = net.get_node("a").unwrap().component().in_ports().get("in").unwrap();
  assert!(public.same_port(internal));
  assert_eq!(net.public_in_ports().metadata("input"), Some(&meta));

  net.remove_in_port("input");
  assert!(!net.in_ports().has("input"));
}

#[test]
fn public_port_validation() {
  let mut net = with_nodes(&[("a", "Forward")]);
  assert!(net.add_in_port("x", &end("ghost", "in"), Metadata::new()).is_err());
  assert!(net.add_in_port("x", &end("a", "out"), Metadata::new()).is_err());
  assert!(net.add_out_port("y", &end("a", "in"), Metadata::new()).is_err());
  net.add_out_port("y", &end("a", "out"), Metadata::new()).unwrap();
  assert_eq!(net.out_ports().names(), vec!["y"]);
}

#[test]
fn rename_node_updates_public_ports() {
  let mut net = with_nodes(&[("a", "Forward")]);
  net.add_out_port("output", &end("a", "out"), Metadata::new()).unwrap();
  net.rename_node("a", "z").unwrap();
  assert_eq!(
    net.public_out_ports().internal("output"),
    Some(&end("z", "out"))
  );
}

#[test]
fn network_composes_as_subgraph() {
  let mut inner = with_nodes(&[("a", "Forward"), ("b", "Forward")]);
  inner
    .add_edge(&end("a", "out"), &end("b", "in"), None)
    .unwrap()
    .add_in_port("input", &end("a", "in"), Metadata::new())
    .unwrap()
    .add_out_port("output", &end("b", "out"), Metadata::new())
    .unwrap();
  inner.set_description("forward twice");

  let inner = Arc::new(Mutex::new(Some(inner)));
  let slot = Arc::clone(&inner);
  let mut registry = ComponentRegistry::new();
  registry
    .register("Forward", || Box::new(IdentityComponent::default()))
    .register("Sub", move || {
      let component: Box<dyn Component> = match slot.lock().unwrap().take() {
        Some(net) => Box::new(net),
        None => Box::new(BasicComponent::new("empty")),
      };
      component
    });

  let mut outer = Network::new(Arc::new(registry), "outer");
  outer.add_node(&NodeSpec::new("sub", "Sub")).unwrap();
  outer.add_node(&NodeSpec::new("sink", "Forward")).unwrap();
  assert_eq!(
    outer.get_node("sub").unwrap().component().description(),
    "forward twice"
  );
  outer
    .add_edge(&end("sub", "output"), &end("sink", "in"), None)
    .unwrap()
    .add_initial(json!("through"), &end("sub", "input"))
    .unwrap();
  let seen = listen(&outer, "sink", "in");

  outer.startup();
  assert_eq!(data(&seen), vec![json!("through")]);

  outer.shutdown();
  assert_eq!(outer.node_count(), 0);
}

// ---- config / debug ----

#[test]
fn with_config_applies_name_and_debug() {
  let config = NetworkConfig {
    name: "configured".into(),
    debug: true,
  };
  let mut net = Network::with_config(registry(), config);
  assert_eq!(net.name(), "configured");
  assert!(net.is_debug());
  net.add_node(&NodeSpec::new("a", "Forward")).unwrap();
  net.add_node(&NodeSpec::new("b", "Forward")).unwrap();
  net.add_edge(&end("a", "out"), &end("b", "in"), None).unwrap();
  // debug hook plus the in-port forwarder
  assert_eq!(net.connections()[0].listener_count(), 2);
}

#[test]
fn set_debug_affects_new_connections_only() {
  let mut net = with_nodes(&[("a", "Forward"), ("b", "Forward")]);
  net.add_edge(&end("a", "out"), &end("b", "in"), None).unwrap();
  net.set_debug(true);
  net.add_initial(json!(1), &end("a", "in")).unwrap();
  assert_eq!(net.connections()[0].listener_count(), 1);
  assert_eq!(net.connections()[1].listener_count(), 2);
}

// ---- ordering ----

/// Component that logs its label when shut down.
struct Recorder {
  label: String,
  log: Arc<Mutex<Vec<String>>>,
  in_ports: PortRegistry,
  out_ports: PortRegistry,
}

impl Component for Recorder {
  fn description(&self) -> &str {
    "records shutdown"
  }

  fn in_ports(&self) -> &PortRegistry {
    &self.in_ports
  }

  fn out_ports(&self) -> &PortRegistry {
    &self.out_ports
  }

  fn shutdown(&mut self) {
    self.log.lock().unwrap().push(self.label.clone());
  }
}

/// Builds a [`Recorder`] labelled with the requested component name, or
/// hands out a staged child network registered under that name.
struct RecorderBuilder {
  log: Arc<Mutex<Vec<String>>>,
  children: Mutex<Vec<(String, Network)>>,
}

impl RecorderBuilder {
  fn new(log: &Arc<Mutex<Vec<String>>>) -> Self {
    Self {
      log: Arc::clone(log),
      children: Mutex::new(Vec::new()),
    }
  }
}

impl ComponentBuilder for RecorderBuilder {
  fn build(&self, component: &str) -> Result<Box<dyn Component>, BuildError> {
    let mut children = self.children.lock().unwrap();
    if let Some(at) = children.iter().position(|(name, _)| name == component) {
      return Ok(Box::new(children.remove(at).1));
    }
    Ok(Box::new(Recorder {
      label: component.to_string(),
      log: Arc::clone(&self.log),
      in_ports: PortRegistry::inputs(),
      out_ports: PortRegistry::outputs(),
    }))
  }
}

#[test]
fn shutdown_visits_components_in_creation_order() {
  for _ in 0..20 {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut net = Network::new(Arc::new(RecorderBuilder::new(&log)), "order");
    for id in ["c", "a", "d", "b", "e"] {
      net.add_node(&NodeSpec::new(id, id)).unwrap();
    }
    net.shutdown();
    assert_eq!(*log.lock().unwrap(), vec!["c", "a", "d", "b", "e"]);
  }
}

#[test]
fn nodes_keep_creation_order_across_remove_and_rename() {
  let mut net = with_nodes(&[("z", "Forward"), ("m", "Forward"), ("a", "Forward")]);
  net.remove_node("m").unwrap();
  net.add_node(&NodeSpec::new("b", "Forward")).unwrap();
  net.rename_node("z", "y").unwrap();
  let ids: Vec<&str> = net.nodes().map(|p| p.id()).collect();
  assert_eq!(ids, vec!["y", "a", "b"]);
}

#[test]
fn nested_networks_shut_down_in_creation_order() {
  let log = Arc::new(Mutex::new(Vec::new()));
  let builder = Arc::new(RecorderBuilder::new(&log));
  for id in ["second", "first"] {
    let mut child = Network::new(Arc::new(RecorderBuilder::new(&log)), id);
    child.add_node(&NodeSpec::new("x", format!("{id}.x"))).unwrap();
    child.add_node(&NodeSpec::new("w", format!("{id}.w"))).unwrap();
    builder
      .children
      .lock()
      .unwrap()
      .push((format!("sub-{id}"), child));
  }
  let mut outer = Network::new(builder, "outer");
  outer.add_node(&NodeSpec::new("second", "sub-second")).unwrap();
  outer.add_node(&NodeSpec::new("first", "sub-first")).unwrap();
  outer.add_node(&NodeSpec::new("last", "leaf")).unwrap();

  outer.shutdown();
  assert_eq!(
    *log.lock().unwrap(),
    vec!["second.x", "second.w", "first.x", "first.w", "leaf"]
  );
}
