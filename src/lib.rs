//! # Nandbox Core
//!
//! An event-driven digital logic engine built from NAND gates.
//!
//! This library provides:
//! - Switches, clocks, indicators and two-input NAND gates
//! - Composite "black box" elements defined by a graph, nestable to any depth
//! - Push-based propagation: every change settles before the call returns
//! - A JSON node/edge format for saving, loading and defining composites
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`graph`] - Portable node/edge representation and its validation
//! - [`elements`] - Element models and their per-input state transitions
//! - [`engine`] - The live circuit: arena, wiring, propagation, (de)serialization
//! - [`library`] - Named composite definitions
//!
//! ## Usage
//!
//! ### Native
//!
//! ```
//! use nandbox_core::{Circuit, ElementSpec};
//!
//! let mut circuit = Circuit::new();
//! let a = circuit.spawn(ElementSpec::Switch)?;
//! let b = circuit.spawn(ElementSpec::Switch)?;
//! let gate = circuit.spawn(ElementSpec::Nand)?;
//! let led = circuit.spawn(ElementSpec::Indicator)?;
//! circuit.connect(a, 0, gate, 0)?;
//! circuit.connect(b, 0, gate, 1)?;
//! circuit.connect(gate, 0, led, 0)?;
//!
//! assert!(circuit.input_state(led, 0)?);
//! circuit.toggle(a)?;
//! circuit.toggle(b)?;
//! assert!(!circuit.input_state(led, 0)?);
//! # Ok::<(), nandbox_core::LogicError>(())
//! ```
//!
//! ### CLI
//!
//! ```bash
//! nandbox half_adder.json --set a=1 --set b=1 --truth-table
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmCircuit } from 'nandbox_core';
//!
//! const circuit = WasmCircuit.from_json(savedGraph);
//! circuit.set_switch(0, true);
//! const changes = JSON.parse(circuit.take_changes());
//! ```

pub mod elements;
pub mod engine;
pub mod error;
pub mod graph;
pub mod library;

// Re-export main types for convenience
pub use elements::{Element, ElementSpec};
pub use engine::{Circuit, CircuitConfig, ElementId, PortRef, Side, StateChange, TruthTable};
pub use error::{LogicError, Result};
pub use graph::{Edge, Graph, Node, NodeKind};
pub use library::Library;

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmCircuit;
