//! Connection lifecycle: connect, disconnect, teardown.

use tracing::{debug, warn};

use crate::elements::{Element, Indicator};
use crate::error::{LogicError, Result};

use super::circuit::Circuit;
use super::connection::Connection;
use super::types::{ConnectionId, ElementId, PortRef};

impl Circuit {
    /// Wire output `source_port` of `source` to input `destination_port` of
    /// `destination`.
    ///
    /// Returns `Ok(false)` without changing anything when the input is
    /// already driven. On success the destination immediately receives the
    /// source's current value.
    pub fn connect(
        &mut self,
        source: ElementId,
        source_port: usize,
        destination: ElementId,
        destination_port: usize,
    ) -> Result<bool> {
        let src = self.top_entry(source)?;
        let outputs = src.element.output_count();
        if source_port >= outputs {
            return Err(LogicError::output_port(&src.key, source_port, outputs));
        }
        let dst = self.top_entry(destination)?;
        let inputs = dst.element.input_count();
        if destination_port >= inputs {
            return Err(LogicError::input_port(&dst.key, destination_port, inputs));
        }

        let wired = self.wire(source, source_port, destination, destination_port);
        if !wired {
            warn!(
                destination = %destination,
                port = destination_port,
                "input already driven; connection rejected"
            );
        }
        Ok(wired)
    }

    /// Unchecked `connect` between elements of the same scope.
    pub(crate) fn wire(
        &mut self,
        source: ElementId,
        source_port: usize,
        destination: ElementId,
        destination_port: usize,
    ) -> bool {
        let occupied = match self.entry(destination) {
            Ok(entry) => entry.wiring.input(destination_port).is_some(),
            Err(_) => return false,
        };
        if occupied {
            return false;
        }

        let id = self.new_connection_id();
        let value = self.output_value(source, source_port);
        self.connections.insert(
            id,
            Connection {
                id,
                source,
                source_port,
                destination,
                destination_port,
                value,
            },
        );

        if let Ok(entry) = self.entry_mut(destination) {
            entry.wiring.set_input(destination_port, Some(id));
        }
        let from = PortRef::new(source, source_port);
        let to = PortRef::new(destination, destination_port);
        self.attach_output(source, source_port, id, to);
        debug!(connection = %id, %from, %to, "connected");

        self.drive(destination, destination_port, value);
        true
    }

    /// Append to the source's fan-out, and to the backing indicator's
    /// forwarding list when the source is a composite.
    fn attach_output(&mut self, source: ElementId, port: usize, id: ConnectionId, target: PortRef) {
        let indicator = match self.entry_mut(source) {
            Ok(entry) => {
                entry.wiring.push_output(port, id);
                entry
                    .element
                    .as_composite()
                    .and_then(|c| c.outputs.get(port).copied())
            }
            Err(_) => return,
        };
        if let Some(child) = indicator {
            if let Some(ind) = self.indicator_mut(child) {
                ind.add_forward(id, target);
            }
        }
    }

    fn indicator_mut(&mut self, id: ElementId) -> Option<&mut Indicator> {
        self.entry_mut(id).ok()?.element.as_indicator_mut()
    }

    /// Remove the connection driving input `port` of a top-level element.
    ///
    /// A no-op when nothing is connected. Otherwise the input reads low
    /// afterwards.
    pub fn disconnect(&mut self, destination: ElementId, port: usize) -> Result<()> {
        let dst = self.top_entry(destination)?;
        let inputs = dst.element.input_count();
        if port >= inputs {
            return Err(LogicError::input_port(&dst.key, port, inputs));
        }
        self.unwire(destination, port);
        Ok(())
    }

    /// Remove every connection on output `port` of a top-level element.
    pub fn disconnect_all_from_output(&mut self, source: ElementId, port: usize) -> Result<()> {
        let src = self.top_entry(source)?;
        let outputs = src.element.output_count();
        if port >= outputs {
            return Err(LogicError::output_port(&src.key, port, outputs));
        }
        self.clear_output(source, port);
        Ok(())
    }

    /// Unchecked `disconnect`.
    pub(crate) fn unwire(&mut self, destination: ElementId, port: usize) {
        let id = match self.entry(destination) {
            Ok(entry) => match entry.wiring.input(port) {
                Some(id) => id,
                None => return,
            },
            Err(_) => return,
        };

        if let Some(conn) = self.connections.remove(&id) {
            self.detach_output(conn.source, conn.source_port, id);
        }
        if let Ok(entry) = self.entry_mut(destination) {
            entry.wiring.set_input(port, None);
        }
        debug!(connection = %id, "disconnected");

        self.drive(destination, port, false);
    }

    fn detach_output(&mut self, source: ElementId, port: usize, id: ConnectionId) {
        let indicator = match self.entry_mut(source) {
            Ok(entry) => {
                entry.wiring.remove_output(port, id);
                entry
                    .element
                    .as_composite()
                    .and_then(|c| c.outputs.get(port).copied())
            }
            Err(_) => return,
        };
        if let Some(child) = indicator {
            if let Some(ind) = self.indicator_mut(child) {
                ind.remove_forward(id);
            }
        }
    }

    /// Unchecked `disconnect_all_from_output`.
    ///
    /// The fan-out list is drained up front and each drained connection is
    /// disconnected from its destination side, so this ends after exactly
    /// one pass over the list.
    pub(crate) fn clear_output(&mut self, source: ElementId, port: usize) {
        let drained = match self.entry_mut(source) {
            Ok(entry) => entry.wiring.drain_output(port),
            Err(_) => return,
        };
        for id in drained {
            let Some(conn) = self.connections.get(&id) else {
                continue;
            };
            let (dest, dest_port) = (conn.destination, conn.destination_port);
            self.unwire(dest, dest_port);
        }
    }

    /// Sever every connection of an element. Must run before it is discarded.
    pub(crate) fn teardown(&mut self, id: ElementId) -> Result<()> {
        let (inputs, outputs) = {
            let entry = self.entry(id)?;
            (entry.wiring.input_count(), entry.wiring.output_count())
        };
        for port in 0..inputs {
            self.unwire(id, port);
        }
        for port in 0..outputs {
            self.clear_output(id, port);
        }
        Ok(())
    }

    /// Connections feeding the inputs of a top-level element, as
    /// `(input port, source, source port)`.
    pub fn incoming(&self, id: ElementId) -> Result<Vec<(usize, PortRef)>> {
        let entry = self.top_entry(id)?;
        Ok(entry
            .wiring
            .connected_inputs()
            .filter_map(|(port, c)| {
                self.connections
                    .get(&c)
                    .map(|conn| (port, PortRef::new(conn.source, conn.source_port)))
            })
            .collect())
    }

    /// Destinations wired to output `port` of a top-level element.
    pub fn outgoing(&self, id: ElementId, port: usize) -> Result<Vec<PortRef>> {
        let entry = self.top_entry(id)?;
        Ok(entry
            .wiring
            .fan_out(port)
            .iter()
            .filter_map(|c| self.connections.get(c))
            .map(|conn| PortRef::new(conn.destination, conn.destination_port))
            .collect())
    }

    /// Whether every registered connection is present on both of its ends.
    pub(crate) fn wiring_consistent(&self) -> bool {
        self.connections.values().all(|conn| {
            let dest_ok = self
                .entry(conn.destination)
                .map_or(false, |e| e.wiring.input(conn.destination_port) == Some(conn.id));
            let src_ok = self
                .entry(conn.source)
                .map_or(false, |e| e.wiring.fan_out(conn.source_port).contains(&conn.id));
            let forward_ok = match self.entry(conn.source).map(|e| &e.element) {
                Ok(Element::Composite(c)) => c
                    .outputs
                    .get(conn.source_port)
                    .and_then(|child| self.entry(*child).ok())
                    .map_or(false, |child| match &child.element {
                        Element::Indicator(ind) => {
                            ind.forwarding.iter().any(|f| f.connection == conn.id)
                        }
                        _ => false,
                    }),
                _ => true,
            };
            dest_ok && src_ok && forward_ok
        })
    }
}
