//! Push-based propagation.
//!
//! `drive` is the single state-transition primitive. A change recurses
//! depth-first along every outgoing connection before the call returns.
//!
//! There is no cycle detection: a combinational feedback loop (an output
//! wired back to one of its own inputs through combinational elements only)
//! recurses until the stack is exhausted. Loops that settle, such as a latch
//! built from cross-coupled NANDs, are fine; the idempotent no-op on an
//! unchanged port is what ends the recursion.

use tracing::trace;

use crate::elements::Reaction;
use crate::error::{LogicError, Result};

use super::circuit::Circuit;
use super::types::{ElementId, Side};

impl Circuit {
    /// Set input `port` of a top-level element to `value` and propagate.
    ///
    /// On a switch or clock, port 0 sets the output directly. Driving an
    /// input that is also fed by a connection overrides it until the source
    /// next changes.
    pub fn set_input(&mut self, id: ElementId, port: usize, value: bool) -> Result<()> {
        let entry = self.top_entry(id)?;
        let count = entry.element.settable_ports();
        if port >= count {
            return Err(LogicError::input_port(&entry.key, port, count));
        }
        self.drive(id, port, value);
        Ok(())
    }

    /// Unchecked `set_input` at any depth.
    pub(crate) fn drive(&mut self, id: ElementId, port: usize, value: bool) {
        let reaction = match self.entry_mut(id) {
            Ok(entry) => entry.element.apply(port, value),
            Err(_) => return,
        };
        trace!(element = %id, port, value, ?reaction, "drive");

        match reaction {
            Reaction::Unchanged => {}
            Reaction::Stored => self.notify(id, Side::Input, port, value),
            Reaction::Output(out) => {
                if !self.is_source(id) {
                    self.notify(id, Side::Input, port, value);
                }
                self.notify(id, Side::Output, 0, out);
                self.fan_out(id, 0, out);
            }
            Reaction::Forward(v) => {
                self.notify(id, Side::Input, port, v);
                self.forward(id, v);
            }
            Reaction::Delegate(child) => {
                let before = self.output_value(child, 0);
                self.drive(child, 0, value);
                if before != value {
                    self.notify(id, Side::Input, port, value);
                }
            }
        }
    }

    fn is_source(&self, id: ElementId) -> bool {
        self.entry(id).map_or(false, |e| e.element.input_count() == 0)
    }

    /// Push `value` along every connection on output `port` of `id`.
    fn fan_out(&mut self, id: ElementId, port: usize, value: bool) {
        let targets = match self.entry(id) {
            Ok(entry) => entry.wiring.fan_out(port).to_vec(),
            Err(_) => return,
        };
        for wire in targets {
            // An earlier branch of this pass may have removed the wire.
            let Some(conn) = self.connections.get_mut(&wire) else {
                continue;
            };
            conn.value = value;
            let (dest, dest_port) = (conn.destination, conn.destination_port);
            self.drive(dest, dest_port, value);
        }
    }

    /// Relay an indicator's new value across its composite boundary.
    fn forward(&mut self, id: ElementId, value: bool) {
        let (forwarding, parent) = match self.entry_mut(id) {
            Ok(entry) => match entry.element.as_indicator_mut() {
                Some(ind) => (ind.forwarding.clone(), entry.parent),
                None => return,
            },
            Err(_) => return,
        };

        if let Some(parent) = parent {
            let port = self
                .entry(parent)
                .ok()
                .and_then(|p| p.element.as_composite())
                .and_then(|c| c.output_port_of(id));
            if let Some(port) = port {
                self.notify(parent, Side::Output, port, value);
            }
        }

        for fwd in forwarding {
            let Some(conn) = self.connections.get_mut(&fwd.connection) else {
                continue;
            };
            conn.value = value;
            self.drive(fwd.target.element, fwd.target.port, value);
        }
    }
}
