//! WASM bindings for Nandbox Core.
//!
//! This module provides JavaScript-friendly bindings for driving a circuit
//! from a browser canvas.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCircuit } from 'nandbox_core';
//!
//! await init();
//!
//! const circuit = new WasmCircuit();
//! const sw = circuit.spawn_switch();
//! const led = circuit.spawn_indicator();
//! circuit.connect(sw, 0, led, 0);
//! circuit.toggle(sw);
//!
//! // After each interaction, redraw what changed:
//! for (const c of JSON.parse(circuit.take_changes())) {
//!   redraw(c.element, c.side, c.port, c.value);
//! }
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde_json::json;
use wasm_bindgen::prelude::*;

use crate::elements::ElementSpec;
use crate::engine::{Circuit, ElementId, Side, StateChange};
use crate::error::LogicError;
use crate::graph::Graph;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn js_err(e: LogicError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-compatible circuit session.
///
/// Wraps the native [`Circuit`] and buffers every top-level state change
/// until the page collects them with `take_changes`.
#[wasm_bindgen]
pub struct WasmCircuit {
    circuit: Circuit,
    changes: Rc<RefCell<Vec<StateChange>>>,
}

impl WasmCircuit {
    fn wrap(mut circuit: Circuit) -> Self {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        circuit.set_change_hook(move |change| sink.borrow_mut().push(change));
        Self { circuit, changes }
    }

    fn spawn(&mut self, spec: ElementSpec) -> Result<usize, JsValue> {
        self.circuit.spawn(spec).map(|id| id.0).map_err(js_err)
    }
}

#[wasm_bindgen]
impl WasmCircuit {
    /// Create an empty circuit.
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmCircuit {
        Self::wrap(Circuit::new())
    }

    /// Load a circuit from its saved JSON graph.
    #[wasm_bindgen]
    pub fn from_json(json: &str) -> Result<WasmCircuit, JsValue> {
        let graph = Graph::from_json(json).map_err(js_err)?;
        let circuit = Circuit::from_graph(&graph).map_err(js_err)?;
        Ok(Self::wrap(circuit))
    }

    /// Save the circuit as a JSON graph.
    #[wasm_bindgen]
    pub fn to_json(&self) -> Result<String, JsValue> {
        self.circuit.to_graph().to_json().map_err(js_err)
    }

    /// Add the nodes and edges of a saved graph to this circuit.
    #[wasm_bindgen]
    pub fn load_json(&mut self, json: &str) -> Result<Vec<usize>, JsValue> {
        let graph = Graph::from_json(json).map_err(js_err)?;
        let ids = self.circuit.load_graph(&graph).map_err(js_err)?;
        Ok(ids.into_iter().map(|id| id.0).collect())
    }

    #[wasm_bindgen]
    pub fn spawn_switch(&mut self) -> Result<usize, JsValue> {
        self.spawn(ElementSpec::Switch)
    }

    #[wasm_bindgen]
    pub fn spawn_indicator(&mut self) -> Result<usize, JsValue> {
        self.spawn(ElementSpec::Indicator)
    }

    #[wasm_bindgen]
    pub fn spawn_nand(&mut self) -> Result<usize, JsValue> {
        self.spawn(ElementSpec::Nand)
    }

    /// Spawn a clock; a `period_ms` of 0 uses the configured default.
    #[wasm_bindgen]
    pub fn spawn_clock(&mut self, period_ms: u32) -> Result<usize, JsValue> {
        let period = (period_ms > 0).then(|| Duration::from_millis(u64::from(period_ms)));
        self.spawn(ElementSpec::Clock { period })
    }

    /// Spawn an instance of a library definition.
    #[wasm_bindgen]
    pub fn spawn_composite(&mut self, name: &str) -> Result<usize, JsValue> {
        self.spawn(ElementSpec::Composite(name.to_string()))
    }

    /// Register a JSON graph as a composite definition.
    #[wasm_bindgen]
    pub fn define(&mut self, label: &str, json: &str) -> Result<(), JsValue> {
        let graph = Graph::from_json(json).map_err(js_err)?;
        self.circuit.library_mut().define(label, graph).map_err(js_err)
    }

    /// Package the whole canvas as a composite definition and clear it.
    #[wasm_bindgen]
    pub fn save_as_composite(&mut self, label: &str) -> Result<(), JsValue> {
        self.circuit.save_as_composite(label).map_err(js_err)
    }

    /// Labels of every definition, in registration order.
    #[wasm_bindgen]
    pub fn definitions(&self) -> Vec<String> {
        self.circuit.library().labels().map(str::to_string).collect()
    }

    /// Wire an output to an input. `false` if the input is already driven.
    #[wasm_bindgen]
    pub fn connect(
        &mut self,
        source: usize,
        source_port: usize,
        destination: usize,
        destination_port: usize,
    ) -> Result<bool, JsValue> {
        self.circuit
            .connect(
                ElementId(source),
                source_port,
                ElementId(destination),
                destination_port,
            )
            .map_err(js_err)
    }

    #[wasm_bindgen]
    pub fn disconnect(&mut self, destination: usize, port: usize) -> Result<(), JsValue> {
        self.circuit
            .disconnect(ElementId(destination), port)
            .map_err(js_err)
    }

    #[wasm_bindgen]
    pub fn disconnect_all_from_output(
        &mut self,
        source: usize,
        port: usize,
    ) -> Result<(), JsValue> {
        self.circuit
            .disconnect_all_from_output(ElementId(source), port)
            .map_err(js_err)
    }

    #[wasm_bindgen]
    pub fn remove(&mut self, id: usize) -> Result<(), JsValue> {
        self.circuit.remove_element(ElementId(id)).map_err(js_err)
    }

    #[wasm_bindgen]
    pub fn clear(&mut self) -> Result<(), JsValue> {
        self.circuit.clear().map_err(js_err)
    }

    #[wasm_bindgen]
    pub fn toggle(&mut self, id: usize) -> Result<(), JsValue> {
        self.circuit.toggle(ElementId(id)).map_err(js_err)
    }

    #[wasm_bindgen]
    pub fn set_switch(&mut self, id: usize, value: bool) -> Result<(), JsValue> {
        self.circuit.set_switch(ElementId(id), value).map_err(js_err)
    }

    #[wasm_bindgen]
    pub fn tick(&mut self, id: usize) -> Result<(), JsValue> {
        self.circuit.tick(ElementId(id)).map_err(js_err)
    }

    /// Advance every clock by `elapsed_ms` of wall time.
    ///
    /// Meant to be called from `requestAnimationFrame` with the frame delta.
    #[wasm_bindgen]
    pub fn advance(&mut self, elapsed_ms: f64) {
        let elapsed = Duration::try_from_secs_f64(elapsed_ms.max(0.0) / 1000.0)
            .unwrap_or(Duration::ZERO);
        self.circuit.advance(elapsed);
    }

    #[wasm_bindgen]
    pub fn input_state(&self, id: usize, port: usize) -> Result<bool, JsValue> {
        self.circuit.input_state(ElementId(id), port).map_err(js_err)
    }

    #[wasm_bindgen]
    pub fn output_state(&self, id: usize, port: usize) -> Result<bool, JsValue> {
        self.circuit.output_state(ElementId(id), port).map_err(js_err)
    }

    /// Handles of every top-level element, in creation order.
    #[wasm_bindgen]
    pub fn elements(&self) -> Vec<usize> {
        self.circuit.elements().iter().map(|id| id.0).collect()
    }

    /// Drain the buffered state changes as a JSON array of
    /// `{ element, side, port, value }`.
    #[wasm_bindgen]
    pub fn take_changes(&mut self) -> String {
        let drained: Vec<StateChange> = self.changes.borrow_mut().drain(..).collect();
        let changes: Vec<serde_json::Value> = drained
            .iter()
            .map(|c| {
                json!({
                    "element": c.element.0,
                    "side": match c.side {
                        Side::Input => "input",
                        Side::Output => "output",
                    },
                    "port": c.port,
                    "value": c.value,
                })
            })
            .collect();
        serde_json::Value::Array(changes).to_string()
    }
}

impl Default for WasmCircuit {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
