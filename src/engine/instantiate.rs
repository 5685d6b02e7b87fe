//! Building live elements from graphs, and extracting graphs back.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use crate::elements::{Clock, Composite, Element, Indicator, Nand, SourceSwitch};
use crate::error::{LogicError, Result};
use crate::graph::{validate_graph, Edge, Graph, Node, NodeKind};

use super::circuit::{Circuit, CircuitConfig, Entry};
use super::connection::Wiring;
use super::types::ElementId;

/// Creation order for a graph's nodes.
///
/// Declaration order, except that the slots held by `Input` (and `Output`)
/// nodes are filled in exposed-port order, so creation order and port order
/// agree.
fn creation_order(graph: &Graph) -> Vec<usize> {
    let mut inputs = graph.exposed_inputs().into_iter();
    let mut outputs = graph.exposed_outputs().into_iter();
    graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| match node.kind {
            NodeKind::Input => inputs.next().unwrap_or(i),
            NodeKind::Output => outputs.next().unwrap_or(i),
            _ => i,
        })
        .collect()
}

impl Circuit {
    /// Build a new circuit from a graph.
    pub fn from_graph(graph: &Graph) -> Result<Self> {
        Self::from_graph_with_config(graph, CircuitConfig::default())
    }

    /// Build a new circuit from a graph with custom configuration.
    pub fn from_graph_with_config(graph: &Graph, config: CircuitConfig) -> Result<Self> {
        let mut circuit = Self::with_config(config);
        circuit.load_graph(graph)?;
        Ok(circuit)
    }

    /// Add every node and edge of a graph to this circuit.
    ///
    /// The whole graph, nested definitions included, is validated before
    /// anything is created: on error the circuit is untouched. Node ids
    /// become the new elements' keys and must not collide with existing
    /// top-level keys.
    pub fn load_graph(&mut self, graph: &Graph) -> Result<Vec<ElementId>> {
        validate_graph(graph)?;
        if let Some(node) = graph.nodes.iter().find(|n| self.keys.contains_key(&n.id)) {
            return Err(LogicError::DuplicateKey {
                id: node.id.clone(),
            });
        }

        let mut by_key: HashMap<&str, ElementId> = HashMap::with_capacity(graph.nodes.len());
        let mut created = Vec::with_capacity(graph.nodes.len());
        for idx in creation_order(graph) {
            let node = &graph.nodes[idx];
            let id = self.instantiate_node(node, None);
            self.register_top_level(id, node.id.clone());
            by_key.insert(node.id.as_str(), id);
            created.push(id);
        }
        self.wire_edges(&graph.edges, &by_key);

        debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            depth = graph.nesting_depth(),
            "graph loaded"
        );
        Ok(created)
    }

    fn wire_edges(&mut self, edges: &[Edge], by_key: &HashMap<&str, ElementId>) {
        for edge in edges {
            let from = by_key.get(edge.from.as_str());
            let to = by_key.get(edge.to.as_str());
            let (Some(&from), Some(&to)) = (from, to) else {
                continue;
            };
            self.wire(from, edge.from_port, to, edge.to_port);
        }
    }

    /// Create the element for one (already validated) node.
    fn instantiate_node(&mut self, node: &Node, parent: Option<ElementId>) -> ElementId {
        let label = if node.label.is_empty() {
            node.kind.default_label().to_string()
        } else {
            node.label.clone()
        };
        let key = node.id.clone();
        match node.kind {
            NodeKind::Input => {
                let switch = SourceSwitch::new(false);
                self.insert(key, label, parent, Element::Switch(switch))
            }
            NodeKind::Output => {
                self.insert(key, label, parent, Element::Indicator(Indicator::new()))
            }
            NodeKind::Nand => self.insert(key, label, parent, Element::Nand(Nand::new())),
            NodeKind::Clock => {
                let period = node
                    .period_ms
                    .map_or(self.config.clock_period, Duration::from_millis);
                self.insert(key, label, parent, Element::Clock(Clock::new(period)))
            }
            NodeKind::Composite => {
                let definition = Rc::new(node.inner_graph.clone().unwrap_or_default());
                self.instantiate_composite(key, label, parent, definition)
            }
        }
    }

    /// Eagerly instantiate a composite and, recursively, all its children.
    ///
    /// `definition` must already be validated.
    pub(crate) fn instantiate_composite(
        &mut self,
        key: String,
        label: String,
        parent: Option<ElementId>,
        definition: Rc<Graph>,
    ) -> ElementId {
        let graph = Rc::clone(&definition);
        let id = self.insert(key, label, parent, Element::Composite(Composite::new(definition)));

        let mut by_key: HashMap<&str, ElementId> = HashMap::with_capacity(graph.nodes.len());
        let mut children = Vec::with_capacity(graph.nodes.len());
        for idx in creation_order(&graph) {
            let node = &graph.nodes[idx];
            let child = self.instantiate_node(node, Some(id));
            by_key.insert(node.id.as_str(), child);
            children.push(child);
        }
        let exposed = |indices: Vec<usize>| -> Vec<ElementId> {
            indices
                .into_iter()
                .filter_map(|i| by_key.get(graph.nodes[i].id.as_str()).copied())
                .collect()
        };
        let inputs = exposed(graph.exposed_inputs());
        let outputs = exposed(graph.exposed_outputs());

        if let Ok(entry) = self.entry_mut(id) {
            entry.wiring = Wiring::new(inputs.len(), outputs.len());
            if let Element::Composite(c) = &mut entry.element {
                c.inputs = inputs;
                c.outputs = outputs;
                c.children = children;
            }
        }

        self.wire_edges(&graph.edges, &by_key);
        id
    }

    /// Extract the top-level circuit as a graph.
    ///
    /// Composites embed the graph they were built from. Switches and
    /// indicators are numbered with explicit `port` values in creation order.
    pub fn to_graph(&self) -> Graph {
        let mut nodes = Vec::with_capacity(self.top_level.len());
        let mut edges = Vec::new();
        let (mut next_input, mut next_output) = (0, 0);

        for &id in &self.top_level {
            let Ok(entry) = self.entry(id) else {
                continue;
            };
            let mut node = self.node_of(entry);
            match node.kind {
                NodeKind::Input => {
                    node.port = Some(next_input);
                    next_input += 1;
                }
                NodeKind::Output => {
                    node.port = Some(next_output);
                    next_output += 1;
                }
                _ => {}
            }
            nodes.push(node);
            edges.extend(self.edges_of(entry));
        }

        Graph { nodes, edges }
    }

    /// Node serializer for one element.
    fn node_of(&self, entry: &Entry) -> Node {
        match &entry.element {
            Element::Composite(c) => {
                Node::composite(entry.key.clone(), entry.label.clone(), (*c.definition).clone())
            }
            Element::Clock(clock) => {
                let millis = u64::try_from(clock.period().as_millis()).unwrap_or(u64::MAX);
                Node {
                    label: entry.label.clone(),
                    ..Node::clock(entry.key.clone(), millis)
                }
            }
            other => Node {
                label: entry.label.clone(),
                ..Node::primitive(entry.key.clone(), other.node_kind())
            },
        }
    }

    /// Edge serializer for one element: one edge per connected input.
    fn edges_of(&self, entry: &Entry) -> Vec<Edge> {
        entry
            .wiring
            .connected_inputs()
            .filter_map(|(port, wire)| {
                let conn = self.connections.get(&wire)?;
                let source = self.entry(conn.source).ok()?;
                Some(Edge::new(
                    source.key.clone(),
                    conn.source_port,
                    entry.key.clone(),
                    port,
                ))
            })
            .collect()
    }

    /// Package the current top-level circuit as a named composite definition
    /// and clear the canvas.
    pub fn save_as_composite(&mut self, label: impl Into<String>) -> Result<()> {
        let label = label.into();
        let graph = self.to_graph();
        self.library.define(label.clone(), graph)?;
        self.clear()?;
        debug!(definition = %label, "circuit packaged as composite");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementSpec;
    use pretty_assertions::assert_eq;

    /// `AND` built from two NANDs.
    fn and_graph() -> Graph {
        Graph {
            nodes: vec![
                Node::primitive("a", NodeKind::Input),
                Node::primitive("b", NodeKind::Input),
                Node::primitive("n1", NodeKind::Nand),
                Node::primitive("n2", NodeKind::Nand),
                Node::primitive("q", NodeKind::Output),
            ],
            edges: vec![
                Edge::new("a", 0, "n1", 0),
                Edge::new("b", 0, "n1", 1),
                Edge::new("n1", 0, "n2", 0),
                Edge::new("n1", 0, "n2", 1),
                Edge::new("n2", 0, "q", 0),
            ],
        }
    }

    /// `NOT` as a composite wrapping one NAND.
    fn not_graph() -> Graph {
        Graph {
            nodes: vec![
                Node::primitive("x", NodeKind::Input),
                Node::primitive("g", NodeKind::Nand),
                Node::primitive("y", NodeKind::Output),
            ],
            edges: vec![
                Edge::new("x", 0, "g", 0),
                Edge::new("x", 0, "g", 1),
                Edge::new("g", 0, "y", 0),
            ],
        }
    }

    /// `OR(a, b) = NAND(NOT a, NOT b)` with two nested `NOT` composites.
    fn or_graph() -> Graph {
        Graph {
            nodes: vec![
                Node::primitive("a", NodeKind::Input),
                Node::primitive("b", NodeKind::Input),
                Node::composite("na", "NOT", not_graph()),
                Node::composite("nb", "NOT", not_graph()),
                Node::primitive("g", NodeKind::Nand),
                Node::primitive("q", NodeKind::Output),
            ],
            edges: vec![
                Edge::new("a", 0, "na", 0),
                Edge::new("b", 0, "nb", 0),
                Edge::new("na", 0, "g", 0),
                Edge::new("nb", 0, "g", 1),
                Edge::new("g", 0, "q", 0),
            ],
        }
    }

    /// Drive every switch combination and collect the indicator states.
    fn responses(c: &mut Circuit) -> Vec<Vec<bool>> {
        let table = c.truth_table().unwrap();
        table.rows.into_iter().map(|row| row.outputs).collect()
    }

    #[test]
    fn test_load_and_graph() {
        let mut c = Circuit::from_graph(&and_graph()).unwrap();
        assert_eq!(
            responses(&mut c),
            vec![vec![false], vec![false], vec![false], vec![true]]
        );
    }

    #[test]
    fn test_composite_port_counts_and_behaviour() {
        let mut c = Circuit::new();
        c.library_mut().define("AND", and_graph()).unwrap();
        let and = c.spawn(ElementSpec::Composite("AND".into())).unwrap();
        assert_eq!(c.port_counts(and).unwrap(), (2, 1));

        let a = c.spawn(ElementSpec::Switch).unwrap();
        let b = c.spawn(ElementSpec::Switch).unwrap();
        let led = c.spawn(ElementSpec::Indicator).unwrap();
        c.connect(a, 0, and, 0).unwrap();
        c.connect(b, 0, and, 1).unwrap();
        c.connect(and, 0, led, 0).unwrap();

        assert!(!c.input_state(led, 0).unwrap());
        c.set_switch(a, true).unwrap();
        c.set_switch(b, true).unwrap();
        assert!(c.input_state(and, 0).unwrap());
        assert!(c.output_state(and, 0).unwrap());
        assert!(c.input_state(led, 0).unwrap());
        c.set_switch(a, false).unwrap();
        assert!(!c.input_state(led, 0).unwrap());
    }

    #[test]
    fn test_composite_output_reaches_every_external_consumer() {
        let mut c = Circuit::new();
        c.library_mut().define("NOT", not_graph()).unwrap();
        let not = c.spawn(ElementSpec::Composite("NOT".into())).unwrap();
        let sw = c.spawn(ElementSpec::Switch).unwrap();
        let l1 = c.spawn(ElementSpec::Indicator).unwrap();
        let l2 = c.spawn(ElementSpec::Indicator).unwrap();
        c.connect(sw, 0, not, 0).unwrap();
        c.connect(not, 0, l1, 0).unwrap();
        c.connect(not, 0, l2, 0).unwrap();
        assert!(c.input_state(l1, 0).unwrap());
        assert!(c.input_state(l2, 0).unwrap());

        c.toggle(sw).unwrap();
        assert!(!c.output_state(not, 0).unwrap());
        assert!(!c.input_state(l1, 0).unwrap());
        assert!(!c.input_state(l2, 0).unwrap());

        // detached consumer no longer follows
        c.disconnect(l2, 0).unwrap();
        c.toggle(sw).unwrap();
        assert!(c.input_state(l1, 0).unwrap());
        assert!(!c.input_state(l2, 0).unwrap());
        assert!(c.wiring_consistent());
    }

    #[test]
    fn test_nested_composites() {
        let mut c = Circuit::new();
        c.library_mut().define("OR", or_graph()).unwrap();
        let or = c.spawn(ElementSpec::Composite("OR".into())).unwrap();
        let a = c.spawn(ElementSpec::Switch).unwrap();
        let b = c.spawn(ElementSpec::Switch).unwrap();
        let led = c.spawn(ElementSpec::Indicator).unwrap();
        c.connect(a, 0, or, 0).unwrap();
        c.connect(b, 0, or, 1).unwrap();
        c.connect(or, 0, led, 0).unwrap();

        assert_eq!(
            responses(&mut c),
            vec![vec![false], vec![true], vec![true], vec![true]]
        );
    }

    #[test]
    fn test_internal_children_are_not_addressable() {
        let mut c = Circuit::new();
        c.library_mut().define("NOT", not_graph()).unwrap();
        let not = c.spawn(ElementSpec::Composite("NOT".into())).unwrap();
        // children follow their composite in the arena
        let child = ElementId(not.0 + 1);
        assert!(matches!(
            c.output_state(child, 0),
            Err(LogicError::NotTopLevel { .. })
        ));
        assert!(matches!(
            c.remove_element(child),
            Err(LogicError::NotTopLevel { .. })
        ));
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let mut c = Circuit::new();
        c.library_mut().define("OR", or_graph()).unwrap();
        c.library_mut().define("AND", and_graph()).unwrap();
        let or = c.spawn(ElementSpec::Composite("OR".into())).unwrap();
        let and = c.spawn(ElementSpec::Composite("AND".into())).unwrap();
        let a = c.spawn(ElementSpec::Switch).unwrap();
        let b = c.spawn(ElementSpec::Switch).unwrap();
        let s = c.spawn(ElementSpec::Switch).unwrap();
        let q1 = c.spawn(ElementSpec::Indicator).unwrap();
        let q2 = c.spawn(ElementSpec::Indicator).unwrap();
        c.connect(a, 0, or, 0).unwrap();
        c.connect(b, 0, or, 1).unwrap();
        c.connect(or, 0, and, 0).unwrap();
        c.connect(s, 0, and, 1).unwrap();
        c.connect(and, 0, q1, 0).unwrap();
        c.connect(or, 0, q2, 0).unwrap();

        let saved = c.to_graph();
        let mut restored = Circuit::from_graph(&saved).unwrap();

        assert_eq!(restored.to_graph(), saved);
        assert_eq!(restored.elements().len(), c.elements().len());
        for (&x, &y) in c.elements().iter().zip(restored.elements()) {
            assert_eq!(c.port_counts(x).unwrap(), restored.port_counts(y).unwrap());
        }
        assert_eq!(responses(&mut restored), responses(&mut c));
        assert_eq!(restored.element_count(), c.element_count());
        assert_eq!(restored.connection_count(), c.connection_count());
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut c = Circuit::new();
        c.library_mut().define("OR", or_graph()).unwrap();
        let or = c.spawn(ElementSpec::Composite("OR".into())).unwrap();
        let a = c.spawn(ElementSpec::Switch).unwrap();
        let q = c.spawn(ElementSpec::Indicator).unwrap();
        c.connect(a, 0, or, 1).unwrap();
        c.connect(or, 0, q, 0).unwrap();

        let json = c.to_graph().to_json_pretty().unwrap();
        let restored = Circuit::from_graph(&Graph::from_json(&json).unwrap()).unwrap();
        let nested = restored.to_graph();
        assert_eq!(nested.nesting_depth(), 2);
        assert_eq!(nested, c.to_graph());
    }

    #[test]
    fn test_malformed_graph_leaves_circuit_untouched() {
        let mut c = Circuit::new();
        let sw = c.spawn(ElementSpec::Switch).unwrap();
        let mut bad = or_graph();
        if let Some(inner) = bad.nodes[2].inner_graph.as_mut() {
            inner.edges.push(Edge::new("g", 0, "missing", 0));
        }
        assert!(matches!(
            c.load_graph(&bad),
            Err(LogicError::InnerGraph { .. })
        ));
        assert_eq!(c.elements(), &[sw]);
        assert_eq!(c.element_count(), 1);
        assert_eq!(c.connection_count(), 0);
    }

    #[test]
    fn test_load_rejects_key_collision() {
        let mut c = Circuit::from_graph(&and_graph()).unwrap();
        let before = c.element_count();
        assert!(matches!(
            c.load_graph(&and_graph()),
            Err(LogicError::DuplicateKey { .. })
        ));
        assert_eq!(c.element_count(), before);
        // spawned keys avoid loaded ones
        let sw = c.spawn(ElementSpec::Switch).unwrap();
        assert!(!["a", "b", "n1", "n2", "q"].contains(&c.key(sw).unwrap()));
    }

    #[test]
    fn test_explicit_port_order() {
        let mut g = and_graph();
        // swap the exposed inputs without touching declaration order
        g.nodes[0].port = Some(1);
        g.nodes[1].port = Some(0);
        let mut c = Circuit::new();
        c.library_mut().define("AND", g).unwrap();
        let and = c.spawn(ElementSpec::Composite("AND".into())).unwrap();
        let Element::Composite(comp) = c.element(and).unwrap() else {
            panic!("expected composite");
        };
        let keys: Vec<&str> = comp
            .inputs
            .iter()
            .map(|id| c.entry(*id).unwrap().key.as_str())
            .collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_remove_composite_frees_children() {
        let mut c = Circuit::new();
        c.library_mut().define("OR", or_graph()).unwrap();
        let or = c.spawn(ElementSpec::Composite("OR".into())).unwrap();
        let sw = c.spawn(ElementSpec::Switch).unwrap();
        let led = c.spawn(ElementSpec::Indicator).unwrap();
        c.connect(sw, 0, or, 0).unwrap();
        c.connect(or, 0, led, 0).unwrap();

        c.remove_element(or).unwrap();
        assert_eq!(c.element_count(), 2);
        assert_eq!(c.connection_count(), 0);
        assert!(!c.input_state(led, 0).unwrap());
        assert!(c.outgoing(sw, 0).unwrap().is_empty());
    }

    #[test]
    fn test_save_as_composite() {
        let mut c = Circuit::from_graph(&not_graph()).unwrap();
        c.save_as_composite("NOT").unwrap();
        assert!(c.elements().is_empty());
        assert_eq!(c.library().labels().collect::<Vec<_>>(), vec!["NOT"]);

        let not = c.spawn(ElementSpec::Composite("NOT".into())).unwrap();
        assert_eq!(c.port_counts(not).unwrap(), (1, 1));
        assert!(c.output_state(not, 0).unwrap());

        assert!(matches!(
            c.save_as_composite("NOT"),
            Err(LogicError::DuplicateDefinition { .. })
        ));
        assert_eq!(c.elements(), &[not]);
    }

    #[test]
    fn test_clock_period_survives_round_trip() {
        let mut c = Circuit::new();
        let fast = c
            .spawn(ElementSpec::Clock {
                period: Some(Duration::from_millis(200)),
            })
            .unwrap();
        let tuned = c.spawn(ElementSpec::Clock { period: None }).unwrap();
        c.set_clock_period(tuned, Duration::from_millis(300)).unwrap();
        let l1 = c.spawn(ElementSpec::Indicator).unwrap();
        let l2 = c.spawn(ElementSpec::Indicator).unwrap();
        c.connect(fast, 0, l1, 0).unwrap();
        c.connect(tuned, 0, l2, 0).unwrap();

        let saved = c.to_graph();
        let periods: Vec<Option<u64>> = saved
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Clock)
            .map(|n| n.period_ms)
            .collect();
        assert_eq!(periods, vec![Some(200), Some(300)]);

        let mut restored = Circuit::from_graph(&saved).unwrap();
        for circuit in [&mut c, &mut restored] {
            circuit.advance(Duration::from_millis(200));
        }
        let leds = |circuit: &Circuit| -> Vec<bool> {
            circuit
                .elements()
                .iter()
                .filter(|id| matches!(circuit.element(**id), Ok(Element::Indicator(_))))
                .map(|id| circuit.input_state(*id, 0).unwrap())
                .collect()
        };
        assert_eq!(leds(&c), vec![true, false]);
        assert_eq!(leds(&restored), leds(&c));
    }

    #[test]
    fn test_clock_node_defaults_to_configured_period() {
        let graph = Graph {
            nodes: vec![
                Node::primitive("clk", NodeKind::Clock),
                Node::primitive("led", NodeKind::Output),
            ],
            edges: vec![Edge::new("clk", 0, "led", 0)],
        };
        let config = CircuitConfig::new().with_clock_period(Duration::from_millis(50));
        let mut c = Circuit::from_graph_with_config(&graph, config).unwrap();
        let led = c.find("led").unwrap();

        c.advance(Duration::from_millis(49));
        assert!(!c.input_state(led, 0).unwrap());
        c.advance(Duration::from_millis(1));
        assert!(c.input_state(led, 0).unwrap());

        let clk = c.find("clk").unwrap();
        c.tick(clk).unwrap();
        assert!(!c.input_state(led, 0).unwrap());
        assert_eq!(c.to_graph().nodes[0].period_ms, Some(50));
    }

    #[test]
    fn test_nested_clock_is_advanced() {
        let blink = Graph {
            nodes: vec![
                Node::clock("clk", 100),
                Node::primitive("y", NodeKind::Output),
            ],
            edges: vec![Edge::new("clk", 0, "y", 0)],
        };
        let mut c = Circuit::new();
        c.library_mut().define("BLINK", blink).unwrap();
        let b = c.spawn(ElementSpec::Composite("BLINK".into())).unwrap();
        let led = c.spawn(ElementSpec::Indicator).unwrap();
        c.connect(b, 0, led, 0).unwrap();
        assert_eq!(c.port_counts(b).unwrap(), (0, 1));

        c.advance(Duration::from_millis(100));
        assert!(c.output_state(b, 0).unwrap());
        assert!(c.input_state(led, 0).unwrap());
        c.advance(Duration::from_millis(100));
        assert!(!c.input_state(led, 0).unwrap());
    }

    #[test]
    fn test_inner_composite_feeding_exposed_output() {
        let wrap = Graph {
            nodes: vec![
                Node::primitive("x", NodeKind::Input),
                Node::composite("inv", "NOT", not_graph()),
                Node::primitive("y", NodeKind::Output),
            ],
            edges: vec![Edge::new("x", 0, "inv", 0), Edge::new("inv", 0, "y", 0)],
        };
        let mut c = Circuit::new();
        c.library_mut().define("WRAP", wrap).unwrap();
        let w = c.spawn(ElementSpec::Composite("WRAP".into())).unwrap();
        let sw = c.spawn(ElementSpec::Switch).unwrap();
        let led = c.spawn(ElementSpec::Indicator).unwrap();
        c.connect(sw, 0, w, 0).unwrap();
        c.connect(w, 0, led, 0).unwrap();
        assert!(c.input_state(led, 0).unwrap());

        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        c.set_change_hook(move |change| sink.borrow_mut().push(change));

        c.toggle(sw).unwrap();
        assert!(!c.output_state(w, 0).unwrap());
        assert!(!c.input_state(led, 0).unwrap());
        assert!(seen.borrow().contains(&crate::engine::StateChange {
            element: w,
            side: crate::engine::Side::Output,
            port: 0,
            value: false,
        }));

        c.toggle(sw).unwrap();
        assert!(c.input_state(led, 0).unwrap());
        assert!(c.wiring_consistent());
    }
}
