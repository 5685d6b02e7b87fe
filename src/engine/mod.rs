//! Live circuit engine.
//!
//! This module owns the running circuit: element storage, connections,
//! propagation, and conversion to and from [`crate::graph::Graph`].
//!
//! ## Propagation
//!
//! Propagation is push-based and synchronous. Setting an input stores the
//! value; if the element's output changes, the new value is pushed along
//! every outgoing connection, depth-first, before the call returns:
//!
//! ```text
//! set_input(e, port, v)
//!   unchanged?           -> stop
//!   recompute output
//!   output unchanged?    -> stop
//!   for each connection on the output:
//!       set_input(destination, destination_port, output)
//! ```
//!
//! A composite has no logic of its own. Driving its input `k` drives the
//! `k`-th child switch; its output `k` is the `k`-th child indicator, which
//! relays every change to the connections leaving the composite.
//!
//! ## Handles
//!
//! Elements are addressed by [`ElementId`], an index into an arena that
//! never reuses slots. A removed element's handle stays invalid forever.

mod circuit;
mod connection;
mod instantiate;
mod propagate;
mod truth_table;
mod types;
mod wiring;

use std::time::Duration;

pub use circuit::{Circuit, CircuitConfig};
pub use connection::{Connection, Wiring};
pub use truth_table::{bitwise_counter, TruthRow, TruthTable, MAX_COUNTER_BITS};
pub use types::{ConnectionId, ElementId, PortRef, Side, StateChange};

/// Toggle period of a clock created without an explicit one.
pub const DEFAULT_CLOCK_PERIOD: Duration = Duration::from_millis(1000);

/// Default cap on the number of switches a truth table enumerates.
pub const DEFAULT_MAX_TRUTH_TABLE_INPUTS: usize = 16;
