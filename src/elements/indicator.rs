//! The indicator sink.

use crate::engine::{ConnectionId, PortRef};

/// One relay target of an indicator.
///
/// Tagged with the connection it mirrors so it can be dropped when that
/// connection is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forward {
    pub connection: ConnectionId,
    pub target: PortRef,
}

/// One input, no outputs. Mirrors its input.
///
/// When the indicator is the output-facing child of a composite, its
/// forwarding list holds the consumers wired to the composite's matching
/// output port, outside the composite boundary.
#[derive(Debug, Clone, Default)]
pub struct Indicator {
    pub state: bool,
    pub forwarding: Vec<Forward>,
}

impl Indicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a consumer outside the composite boundary.
    pub fn add_forward(&mut self, connection: ConnectionId, target: PortRef) {
        self.forwarding.push(Forward { connection, target });
    }

    /// Drop the relay entry belonging to `connection`.
    pub fn remove_forward(&mut self, connection: ConnectionId) {
        self.forwarding.retain(|f| f.connection != connection);
    }
}
