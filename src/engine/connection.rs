//! Connections and per-element port bookkeeping.

use super::types::{ConnectionId, ElementId};

/// A directed wire from one output port to one input port.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: ElementId,
    pub source_port: usize,
    pub destination: ElementId,
    pub destination_port: usize,
    /// Value last pushed along this wire
    pub value: bool,
}

/// Connection slots of one element.
///
/// An input slot holds at most one connection; an output holds a fan-out
/// list of any length.
#[derive(Debug, Clone, Default)]
pub struct Wiring {
    inputs: Vec<Option<ConnectionId>>,
    outputs: Vec<Vec<ConnectionId>>,
}

impl Wiring {
    /// Create empty wiring for the given port counts.
    pub fn new(input_count: usize, output_count: usize) -> Self {
        Self {
            inputs: vec![None; input_count],
            outputs: vec![Vec::new(); output_count],
        }
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Connection occupying an input slot, if any.
    pub fn input(&self, port: usize) -> Option<ConnectionId> {
        self.inputs.get(port).copied().flatten()
    }

    /// Fan-out list of an output port.
    pub fn fan_out(&self, port: usize) -> &[ConnectionId] {
        self.outputs.get(port).map_or(&[][..], Vec::as_slice)
    }

    pub(crate) fn set_input(&mut self, port: usize, connection: Option<ConnectionId>) {
        self.inputs[port] = connection;
    }

    pub(crate) fn push_output(&mut self, port: usize, connection: ConnectionId) {
        self.outputs[port].push(connection);
    }

    pub(crate) fn remove_output(&mut self, port: usize, connection: ConnectionId) {
        self.outputs[port].retain(|c| *c != connection);
    }

    /// Take the whole fan-out list of a port, leaving it empty.
    pub(crate) fn drain_output(&mut self, port: usize) -> Vec<ConnectionId> {
        std::mem::take(&mut self.outputs[port])
    }

    /// Iterate over occupied input slots as `(port, connection)`.
    pub fn connected_inputs(&self) -> impl Iterator<Item = (usize, ConnectionId)> + '_ {
        self.inputs
            .iter()
            .enumerate()
            .filter_map(|(port, c)| c.map(|c| (port, c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wiring_slots() {
        let mut w = Wiring::new(2, 1);
        assert_eq!(w.input(0), None);
        w.set_input(1, Some(ConnectionId(7)));
        assert_eq!(w.input(1), Some(ConnectionId(7)));
        assert_eq!(w.connected_inputs().collect::<Vec<_>>(), vec![(1, ConnectionId(7))]);

        w.push_output(0, ConnectionId(1));
        w.push_output(0, ConnectionId(2));
        w.remove_output(0, ConnectionId(1));
        assert_eq!(w.fan_out(0), &[ConnectionId(2)]);
        assert_eq!(w.drain_output(0), vec![ConnectionId(2)]);
        assert!(w.fan_out(0).is_empty());
    }

    #[test]
    fn test_out_of_range_reads_are_empty() {
        let w = Wiring::new(0, 0);
        assert_eq!(w.input(3), None);
        assert!(w.fan_out(3).is_empty());
    }
}
