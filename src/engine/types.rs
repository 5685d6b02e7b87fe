//! Core handle and port types.

use std::fmt;

/// Stable handle to an element in a [`super::Circuit`].
///
/// Handles index the circuit's arena and are never reused, so a handle to a
/// removed element stays invalid for the life of the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Process-unique identifier of a connection, used for targeted removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{}", self.0)
    }
}

/// An (element, port index) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub element: ElementId,
    pub port: usize,
}

impl PortRef {
    pub fn new(element: ElementId, port: usize) -> Self {
        Self { element, port }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.element, self.port)
    }
}

/// Which side of an element a port is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Input,
    Output,
}

/// A top-level port changed value.
///
/// Delivered to the circuit's change hook; this is how a frontend learns
/// what to redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub element: ElementId,
    pub side: Side,
    pub port: usize,
    pub value: bool,
}
