//! Error types for the Nandbox circuit engine.
//!
//! This module provides a unified error type [`LogicError`] that covers
//! every failure the engine reports: bad handles, bad ports, malformed
//! persisted graphs and the I/O done by the CLI frontend.
//!
//! Wiring into an input that is already driven is deliberately *not* an
//! error; [`crate::Circuit::connect`] reports it as `Ok(false)`.

use thiserror::Error;

use crate::engine::ElementId;

/// Result type alias using [`LogicError`].
pub type Result<T> = std::result::Result<T, LogicError>;

/// Unified error type for all Nandbox operations.
#[derive(Error, Debug)]
pub enum LogicError {
    // ============ Handle / Port Errors ============
    /// Handle does not name a live element
    #[error("No live element with handle {id}")]
    UnknownElement { id: ElementId },

    /// Input port index beyond the element's input count
    #[error("Element '{element}' has {available} input port(s), can't access input {port}")]
    InputPortOutOfRange {
        element: String,
        port: usize,
        available: usize,
    },

    /// Output port index beyond the element's output count
    #[error("Element '{element}' has {available} output port(s), can't access output {port}")]
    OutputPortOutOfRange {
        element: String,
        port: usize,
        available: usize,
    },

    /// Element lives inside a composite and can't be addressed directly
    #[error("Element {id} is internal to a composite and can't be addressed directly")]
    NotTopLevel { id: ElementId },

    /// No top-level element carries this node id
    #[error("No element with node id '{key}'")]
    UnknownKey { key: String },

    /// Operation only applies to a clock
    #[error("Element '{element}' is not a clock")]
    NotAClock { element: String },

    /// Operation only applies to a source switch
    #[error("Element '{element}' is not a switch")]
    NotASwitch { element: String },

    // ============ Library Errors ============
    /// Unknown composite definition
    #[error("No composite definition named '{name}'")]
    UnknownDefinition { name: String },

    /// Composite definition already registered
    #[error("A composite definition named '{name}' already exists")]
    DuplicateDefinition { name: String },

    // ============ Graph Errors ============
    /// Two nodes share an id
    #[error("Duplicate node id '{id}'")]
    DuplicateNode { id: String },

    /// Loaded node id collides with an element already on the canvas
    #[error("Node id '{id}' is already used by an element on the canvas")]
    DuplicateKey { id: String },

    /// Edge references a node id not present in the graph
    #[error("Edge {edge} references unknown node '{node}'")]
    UnknownNode { edge: usize, node: String },

    /// Edge addresses a port the node doesn't have
    #[error("Edge {edge} addresses {direction} port {port} of '{node}', which has {available}")]
    EdgePortOutOfRange {
        edge: usize,
        node: String,
        direction: &'static str,
        port: usize,
        available: usize,
    },

    /// Two edges drive the same input port
    #[error("Input {port} of node '{node}' is driven by more than one edge")]
    InputAlreadyDriven { node: String, port: usize },

    /// Composite node without its defining graph
    #[error("Composite node '{node}' has no innerGraph")]
    MissingInnerGraph { node: String },

    /// Two exposed ports of the same direction claim one position
    #[error("Port position {port} is claimed by more than one {direction} node (second: '{node}')")]
    DuplicatePort {
        node: String,
        direction: &'static str,
        port: usize,
    },

    /// Failure inside the inner graph of a composite node
    #[error("In inner graph of composite '{node}': {source}")]
    InnerGraph {
        node: String,
        #[source]
        source: Box<LogicError>,
    },

    /// Graph JSON couldn't be decoded
    #[error("Malformed graph JSON: {0}")]
    Json(#[from] serde_json::Error),

    // ============ Analysis Errors ============
    /// Truth table would be too large to enumerate
    #[error("Truth table over {inputs} inputs exceeds the configured limit of {limit}")]
    TruthTableTooWide { inputs: usize, limit: usize },

    // ============ I/O Errors ============
    /// Error reading a graph file
    #[error("Failed to read graph file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed `NAME=VALUE` assignment
    #[error("Invalid assignment '{value}' (expected NAME=0 or NAME=1)")]
    InvalidAssignment { value: String },
}

impl LogicError {
    /// Create an unknown element error
    pub fn unknown_element(id: ElementId) -> Self {
        Self::UnknownElement { id }
    }

    /// Create an out-of-range input port error
    pub fn input_port(element: impl Into<String>, port: usize, available: usize) -> Self {
        Self::InputPortOutOfRange {
            element: element.into(),
            port,
            available,
        }
    }

    /// Create an out-of-range output port error
    pub fn output_port(element: impl Into<String>, port: usize, available: usize) -> Self {
        Self::OutputPortOutOfRange {
            element: element.into(),
            port,
            available,
        }
    }

    /// Wrap an error raised while validating a composite's inner graph
    pub fn in_inner_graph(node: impl Into<String>, source: LogicError) -> Self {
        Self::InnerGraph {
            node: node.into(),
            source: Box::new(source),
        }
    }
}
