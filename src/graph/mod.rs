//! Portable node/edge representation of a circuit, and its validation.
//!
//! A [`Graph`] is what gets saved and loaded. It is also the definition of a
//! composite element: a composite node carries the graph it was built from in
//! `innerGraph`, so arbitrarily deep nesting is just a tree of graphs.
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "nodes": [
//!     { "id": "a", "kind": "Input", "label": "I", "port": 0 },
//!     { "id": "g", "kind": "Nand", "label": "NAND" },
//!     { "id": "q", "kind": "Output", "label": "O", "port": 0 },
//!     { "id": "k", "kind": "Clock", "label": "CLK", "periodMs": 500 }
//!   ],
//!   "edges": [
//!     { "n1": "g", "n1Index": 0, "n2": "a", "n2Index": 0 },
//!     { "n1": "g", "n1Index": 1, "n2": "a", "n2Index": 0 },
//!     { "n1": "q", "n1Index": 0, "n2": "g", "n2Index": 0 }
//!   ]
//! }
//! ```

mod types;
mod validate;

pub use types::*;
pub use validate::validate_graph;

use crate::error::Result;

impl Graph {
    /// Decode a graph from JSON. Structure is not validated here.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Encode the graph as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Encode the graph as compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Read and decode a graph file.
#[cfg(feature = "cli")]
pub fn read_file(path: &std::path::Path) -> Result<Graph> {
    let content =
        std::fs::read_to_string(path).map_err(|e| crate::error::LogicError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
    Graph::from_json(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_legacy_field_names() {
        let json = r#"{
            "nodes": [
                { "id": "x", "kind": "I", "label": "I" },
                { "id": "bb", "kind": "BB", "label": "NOT",
                  "innerG": { "nodes": [ { "id": "o", "kind": "O", "label": "O" } ], "edges": [] } }
            ],
            "edges": [ { "n1": "bb", "n1Index": 0, "n2": "x", "n2Index": 0 } ]
        }"#;
        let g = Graph::from_json(json).unwrap();
        assert_eq!(g.nodes[0].kind, NodeKind::Input);
        assert_eq!(g.nodes[1].kind, NodeKind::Composite);
        assert_eq!(g.nodes[1].inner_graph.as_ref().map(|g| g.nodes.len()), Some(1));
        assert_eq!(g.edges[0], Edge::new("x", 0, "bb", 0));
    }

    #[test]
    fn test_writes_persisted_field_names() {
        let g = Graph {
            nodes: vec![
                Node::primitive("s", NodeKind::Input).with_port(0),
                Node::composite("c", "BOX", Graph::new()),
                Node::clock("k", 250),
            ],
            edges: vec![Edge::new("s", 0, "c", 1)],
        };
        let value: serde_json::Value = serde_json::from_str(&g.to_json().unwrap()).unwrap();
        assert_eq!(value["nodes"][0]["kind"], "Input");
        assert_eq!(value["nodes"][0]["port"], 0);
        assert!(value["nodes"][0].get("innerGraph").is_none());
        assert!(value["nodes"][1].get("innerGraph").is_some());
        assert!(value["nodes"][1].get("periodMs").is_none());
        assert_eq!(value["nodes"][2]["kind"], "Clock");
        assert_eq!(value["nodes"][2]["periodMs"], 250);
        assert_eq!(value["edges"][0]["n1"], "c");
        assert_eq!(value["edges"][0]["n1Index"], 1);
        assert_eq!(value["edges"][0]["n2"], "s");
        assert_eq!(value["edges"][0]["n2Index"], 0);
    }

    #[test]
    fn test_exposed_port_order() {
        let g = Graph {
            nodes: vec![
                Node::primitive("late", NodeKind::Input),
                Node::primitive("second", NodeKind::Input).with_port(1),
                Node::primitive("first", NodeKind::Input).with_port(0),
                Node::primitive("out", NodeKind::Output),
            ],
            edges: vec![],
        };
        assert_eq!(g.exposed_inputs(), vec![2, 1, 0]);
        assert_eq!(g.exposed_outputs(), vec![3]);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Graph::from_json("{ \"nodes\": [ { \"id\": 1 } ] }"),
            Err(crate::error::LogicError::Json(_))
        ));
    }
}
