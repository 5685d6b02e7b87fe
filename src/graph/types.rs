//! Serialized (node/edge) form of a circuit.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A complete circuit in portable form.
///
/// This is the one persisted format: a flat list of nodes plus the edges
/// wiring them. Composite nodes embed their own defining graph, so nesting is
/// a tree of `Graph`s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Kind of a serialized node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Manual source switch; an exposed input when inside a composite
    #[serde(alias = "I", alias = "INPUT")]
    Input,
    /// Indicator; an exposed output when inside a composite
    #[serde(alias = "O", alias = "OUTPUT")]
    Output,
    /// Two-input NAND gate
    #[serde(alias = "NAND")]
    Nand,
    /// Free-running clock source
    #[serde(alias = "CLOCK")]
    Clock,
    /// Black box defined by an inner graph
    #[serde(alias = "BB")]
    Composite,
}

impl NodeKind {
    /// Label used when a node is created without one.
    pub fn default_label(&self) -> &'static str {
        match self {
            NodeKind::Input => "I",
            NodeKind::Output => "O",
            NodeKind::Nand => "NAND",
            NodeKind::Clock => "CLK",
            NodeKind::Composite => "BB",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Input => "Input",
            NodeKind::Output => "Output",
            NodeKind::Nand => "Nand",
            NodeKind::Clock => "Clock",
            NodeKind::Composite => "Composite",
        };
        f.write_str(name)
    }
}

/// One element of a serialized circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node id, unique within its graph
    pub id: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub label: String,
    /// Defining graph, present only for composites
    #[serde(
        rename = "innerGraph",
        alias = "innerG",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub inner_graph: Option<Graph>,
    /// Explicit position among the exposed inputs (or outputs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<usize>,
    /// Toggle period of a `Clock` node in milliseconds; absent means the
    /// circuit's configured default
    #[serde(rename = "periodMs", default, skip_serializing_if = "Option::is_none")]
    pub period_ms: Option<u64>,
}

impl Node {
    /// Create a primitive (non-composite) node.
    pub fn primitive(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            label: kind.default_label().to_string(),
            inner_graph: None,
            port: None,
            period_ms: None,
        }
    }

    /// Create a composite node wrapping `inner`.
    pub fn composite(id: impl Into<String>, label: impl Into<String>, inner: Graph) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Composite,
            label: label.into(),
            inner_graph: Some(inner),
            port: None,
            period_ms: None,
        }
    }

    /// Create a clock node with an explicit toggle period.
    pub fn clock(id: impl Into<String>, period_ms: u64) -> Self {
        Self {
            period_ms: Some(period_ms),
            ..Self::primitive(id, NodeKind::Clock)
        }
    }

    /// Set the explicit exposed-port position.
    pub fn with_port(mut self, port: usize) -> Self {
        self.port = Some(port);
        self
    }

    /// Number of input ports this node has once instantiated.
    pub fn input_count(&self) -> usize {
        match self.kind {
            NodeKind::Input | NodeKind::Clock => 0,
            NodeKind::Output => 1,
            NodeKind::Nand => 2,
            NodeKind::Composite => self.inner_graph.as_ref().map_or(0, Graph::input_count),
        }
    }

    /// Number of output ports this node has once instantiated.
    pub fn output_count(&self) -> usize {
        match self.kind {
            NodeKind::Output => 0,
            NodeKind::Input | NodeKind::Clock | NodeKind::Nand => 1,
            NodeKind::Composite => self.inner_graph.as_ref().map_or(0, Graph::output_count),
        }
    }
}

/// A wire between two nodes.
///
/// The persisted field names put the consumer first: `n1`/`n1Index` is the
/// destination node and input port, `n2`/`n2Index` the source node and
/// output port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "n1")]
    pub to: String,
    #[serde(rename = "n1Index")]
    pub to_port: usize,
    #[serde(rename = "n2")]
    pub from: String,
    #[serde(rename = "n2Index")]
    pub from_port: usize,
}

impl Edge {
    /// Wire output `from_port` of `from` into input `to_port` of `to`.
    pub fn new(
        from: impl Into<String>,
        from_port: usize,
        to: impl Into<String>,
        to_port: usize,
    ) -> Self {
        Self {
            to: to.into(),
            to_port,
            from: from.into(),
            from_port,
        }
    }
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of exposed inputs (`Input` nodes).
    pub fn input_count(&self) -> usize {
        self.count(NodeKind::Input)
    }

    /// Number of exposed outputs (`Output` nodes).
    pub fn output_count(&self) -> usize {
        self.count(NodeKind::Output)
    }

    fn count(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    /// Indices into `nodes` of the exposed inputs, in port order.
    pub fn exposed_inputs(&self) -> Vec<usize> {
        self.exposed(NodeKind::Input)
    }

    /// Indices into `nodes` of the exposed outputs, in port order.
    pub fn exposed_outputs(&self) -> Vec<usize> {
        self.exposed(NodeKind::Output)
    }

    /// Explicit `port` values first (ascending), then unnumbered nodes in
    /// declaration order.
    fn exposed(&self, kind: NodeKind) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == kind)
            .map(|(i, _)| i)
            .collect();
        indices.sort_by_key(|&i| {
            let port = self.nodes[i].port;
            (port.is_none(), port, i)
        });
        indices
    }

    /// Depth of composite nesting (0 for a graph of primitives only).
    pub fn nesting_depth(&self) -> usize {
        self.nodes
            .iter()
            .filter_map(|n| n.inner_graph.as_ref())
            .map(|g| 1 + g.nesting_depth())
            .max()
            .unwrap_or(0)
    }
}
