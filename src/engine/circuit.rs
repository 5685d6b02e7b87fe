//! The circuit session: arena of elements, connections, and public surface.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::elements::{Clock, Element, ElementSpec, Indicator, Nand, SourceSwitch};
use crate::error::{LogicError, Result};
use crate::library::Library;

use super::connection::{Connection, Wiring};
use super::types::{ConnectionId, ElementId, Side, StateChange};
use super::{DEFAULT_CLOCK_PERIOD, DEFAULT_MAX_TRUTH_TABLE_INPUTS};

/// Configuration for a circuit session.
#[derive(Debug, Clone)]
pub struct CircuitConfig {
    /// Toggle period of clocks spawned without an explicit one.
    pub clock_period: Duration,
    /// Largest number of switches a truth table may enumerate.
    pub max_truth_table_inputs: usize,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            clock_period: DEFAULT_CLOCK_PERIOD,
            max_truth_table_inputs: DEFAULT_MAX_TRUTH_TABLE_INPUTS,
        }
    }
}

impl CircuitConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default clock period.
    pub fn with_clock_period(mut self, period: Duration) -> Self {
        self.clock_period = period;
        self
    }

    /// Set the truth table width limit.
    ///
    /// The table has `2^n` rows, each a full propagation pass.
    pub fn with_max_truth_table_inputs(mut self, limit: usize) -> Self {
        self.max_truth_table_inputs = limit;
        self
    }
}

/// One arena slot.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    /// Node id used when serializing, unique within the enclosing scope
    pub key: String,
    pub label: String,
    /// Owning composite, `None` at the top level
    pub parent: Option<ElementId>,
    pub wiring: Wiring,
    pub element: Element,
}

type ChangeHook = Box<dyn FnMut(StateChange)>;

/// A live circuit.
///
/// All elements, including the children of composites at any depth, live in
/// one arena addressed by [`ElementId`]. Only top-level elements are
/// addressable through the public API; a composite's children are reached
/// through its ports.
///
/// Everything runs synchronously: each call that changes a value propagates
/// it to completion before returning.
pub struct Circuit {
    pub(crate) config: CircuitConfig,
    pub(crate) elements: Vec<Option<Entry>>,
    pub(crate) connections: HashMap<ConnectionId, Connection>,
    /// Top-level elements in creation order
    pub(crate) top_level: Vec<ElementId>,
    /// Top-level node keys
    pub(crate) keys: HashMap<String, ElementId>,
    pub(crate) library: Library,
    next_connection: u64,
    next_key: usize,
    on_change: Option<ChangeHook>,
}

impl Circuit {
    /// Create an empty circuit with default configuration.
    pub fn new() -> Self {
        Self::with_config(CircuitConfig::default())
    }

    /// Create an empty circuit with custom configuration.
    pub fn with_config(config: CircuitConfig) -> Self {
        Self {
            config,
            elements: Vec::new(),
            connections: HashMap::new(),
            top_level: Vec::new(),
            keys: HashMap::new(),
            library: Library::new(),
            next_connection: 0,
            next_key: 0,
            on_change: None,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    /// Composite definitions available to [`Circuit::spawn`].
    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Mutable access to the definition library.
    pub fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    /// Install the change hook, replacing any previous one.
    pub fn set_change_hook(&mut self, hook: impl FnMut(StateChange) + 'static) {
        self.on_change = Some(Box::new(hook));
    }

    /// Remove the change hook.
    pub fn clear_change_hook(&mut self) {
        self.on_change = None;
    }

    // ============ Arena ============

    pub(crate) fn entry(&self, id: ElementId) -> Result<&Entry> {
        self.elements
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| LogicError::unknown_element(id))
    }

    pub(crate) fn entry_mut(&mut self, id: ElementId) -> Result<&mut Entry> {
        self.elements
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| LogicError::unknown_element(id))
    }

    /// Look up a top-level element.
    pub(crate) fn top_entry(&self, id: ElementId) -> Result<&Entry> {
        let entry = self.entry(id)?;
        if entry.parent.is_some() {
            return Err(LogicError::NotTopLevel { id });
        }
        Ok(entry)
    }

    pub(crate) fn insert(
        &mut self,
        key: String,
        label: String,
        parent: Option<ElementId>,
        element: Element,
    ) -> ElementId {
        let id = ElementId(self.elements.len());
        let wiring = Wiring::new(element.input_count(), element.output_count());
        self.elements.push(Some(Entry {
            key,
            label,
            parent,
            wiring,
            element,
        }));
        id
    }

    pub(crate) fn register_top_level(&mut self, id: ElementId, key: String) {
        self.keys.insert(key, id);
        self.top_level.push(id);
    }

    pub(crate) fn new_connection_id(&mut self) -> ConnectionId {
        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;
        id
    }

    /// A top-level key not used by any element.
    fn fresh_key(&mut self) -> String {
        loop {
            let key = format!("n{}", self.next_key);
            self.next_key += 1;
            if !self.keys.contains_key(&key) {
                return key;
            }
        }
    }

    pub(crate) fn notify(&mut self, element: ElementId, side: Side, port: usize, value: bool) {
        let top_level = matches!(self.elements.get(element.0), Some(Some(e)) if e.parent.is_none());
        if !top_level {
            return;
        }
        if let Some(hook) = self.on_change.as_mut() {
            hook(StateChange {
                element,
                side,
                port,
                value,
            });
        }
    }

    // ============ Element lifecycle ============

    /// Create a new top-level element.
    pub fn spawn(&mut self, spec: ElementSpec) -> Result<ElementId> {
        let key = self.fresh_key();
        let id = match spec {
            ElementSpec::Switch => self.insert(
                key.clone(),
                "I".to_string(),
                None,
                Element::Switch(SourceSwitch::new(false)),
            ),
            ElementSpec::Indicator => self.insert(
                key.clone(),
                "O".to_string(),
                None,
                Element::Indicator(Indicator::new()),
            ),
            ElementSpec::Nand => self.insert(
                key.clone(),
                "NAND".to_string(),
                None,
                Element::Nand(Nand::new()),
            ),
            ElementSpec::Clock { period } => {
                let period = period.unwrap_or(self.config.clock_period);
                self.insert(
                    key.clone(),
                    "CLK".to_string(),
                    None,
                    Element::Clock(Clock::new(period)),
                )
            }
            ElementSpec::Composite(name) => {
                let definition = self.library.get(&name)?;
                self.instantiate_composite(key.clone(), name, None, definition)
            }
        };
        self.register_top_level(id, key);
        debug!(element = %id, kind = self.entry(id)?.element.kind_name(), "spawned");
        Ok(id)
    }

    /// Tear down and discard a top-level element.
    ///
    /// Removing an already-removed handle is a no-op.
    pub fn remove_element(&mut self, id: ElementId) -> Result<()> {
        let entry = match self.elements.get(id.0).and_then(Option::as_ref) {
            Some(entry) => entry,
            None => return Ok(()),
        };
        if entry.parent.is_some() {
            return Err(LogicError::NotTopLevel { id });
        }
        let key = entry.key.clone();

        self.teardown(id)?;
        self.discard(id);
        self.keys.remove(&key);
        self.top_level.retain(|e| *e != id);
        debug!(element = %id, "removed");
        Ok(())
    }

    /// Free an element's slot, and its children's if it is a composite.
    ///
    /// The element must already be torn down.
    fn discard(&mut self, id: ElementId) {
        let entry = match self.elements.get_mut(id.0).and_then(Option::take) {
            Some(entry) => entry,
            None => return,
        };
        if let Element::Composite(c) = entry.element {
            for child in c.children {
                let wires: Vec<ConnectionId> = self
                    .entry(child)
                    .map(|e| e.wiring.connected_inputs().map(|(_, c)| c).collect())
                    .unwrap_or_default();
                for wire in wires {
                    self.connections.remove(&wire);
                }
                self.discard(child);
            }
        }
    }

    /// Remove every top-level element.
    pub fn clear(&mut self) -> Result<()> {
        while let Some(&id) = self.top_level.first() {
            self.remove_element(id)?;
        }
        Ok(())
    }

    // ============ Reads ============

    /// Top-level elements in creation order.
    pub fn elements(&self) -> &[ElementId] {
        &self.top_level
    }

    /// Whether a handle names a live top-level element.
    pub fn contains(&self, id: ElementId) -> bool {
        self.top_entry(id).is_ok()
    }

    /// Get a top-level element.
    pub fn element(&self, id: ElementId) -> Result<&Element> {
        Ok(&self.top_entry(id)?.element)
    }

    /// Node key of a top-level element.
    pub fn key(&self, id: ElementId) -> Result<&str> {
        Ok(&self.top_entry(id)?.key)
    }

    /// Find a top-level element by node key.
    pub fn find(&self, key: &str) -> Option<ElementId> {
        self.keys.get(key).copied()
    }

    /// Label of a top-level element.
    pub fn label(&self, id: ElementId) -> Result<&str> {
        Ok(&self.top_entry(id)?.label)
    }

    /// Rename a top-level element.
    pub fn set_label(&mut self, id: ElementId, label: impl Into<String>) -> Result<()> {
        self.top_entry(id)?;
        self.entry_mut(id)?.label = label.into();
        Ok(())
    }

    /// `(inputs, outputs)` port counts of a top-level element.
    pub fn port_counts(&self, id: ElementId) -> Result<(usize, usize)> {
        let e = &self.top_entry(id)?.element;
        Ok((e.input_count(), e.output_count()))
    }

    /// Current value of an input port.
    pub fn input_state(&self, id: ElementId, port: usize) -> Result<bool> {
        let entry = self.top_entry(id)?;
        let count = entry.element.input_count();
        if port >= count {
            return Err(LogicError::input_port(&entry.key, port, count));
        }
        Ok(self.input_value(id, port))
    }

    /// Current value of an output port.
    pub fn output_state(&self, id: ElementId, port: usize) -> Result<bool> {
        let entry = self.top_entry(id)?;
        let count = entry.element.output_count();
        if port >= count {
            return Err(LogicError::output_port(&entry.key, port, count));
        }
        Ok(self.output_value(id, port))
    }

    /// Unchecked input read at any depth; false for anything unresolvable.
    pub(crate) fn input_value(&self, id: ElementId, port: usize) -> bool {
        let Ok(entry) = self.entry(id) else {
            return false;
        };
        match &entry.element {
            Element::Composite(c) => c
                .inputs
                .get(port)
                .map_or(false, |child| self.output_value(*child, 0)),
            other => other.input_state(port).unwrap_or(false),
        }
    }

    /// Unchecked output read at any depth; false for anything unresolvable.
    pub(crate) fn output_value(&self, id: ElementId, port: usize) -> bool {
        let Ok(entry) = self.entry(id) else {
            return false;
        };
        match &entry.element {
            Element::Composite(c) => c
                .outputs
                .get(port)
                .map_or(false, |child| self.input_value(*child, 0)),
            other => other.output_state(port).unwrap_or(false),
        }
    }

    /// Every live connection, internal ones included, in no particular
    /// order. Each carries the value last pushed along it.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.connections.values()
    }

    /// Number of live connections, internal ones included.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of live elements, composite children included.
    pub fn element_count(&self) -> usize {
        self.elements.iter().filter(|e| e.is_some()).count()
    }

    // ============ Sources ============

    /// Flip a top-level switch.
    pub fn toggle(&mut self, id: ElementId) -> Result<()> {
        let state = self.switch_state(id)?;
        self.set_input(id, 0, !state)
    }

    /// Set a top-level switch to a value.
    pub fn set_switch(&mut self, id: ElementId, value: bool) -> Result<()> {
        self.switch_state(id)?;
        self.set_input(id, 0, value)
    }

    fn switch_state(&self, id: ElementId) -> Result<bool> {
        let entry = self.top_entry(id)?;
        match &entry.element {
            Element::Switch(s) => Ok(s.state),
            _ => Err(LogicError::NotASwitch {
                element: entry.key.clone(),
            }),
        }
    }

    /// Force an edge on a top-level clock now.
    pub fn tick(&mut self, id: ElementId) -> Result<()> {
        let entry = self.top_entry(id)?;
        let state = match &entry.element {
            Element::Clock(c) => c.state,
            _ => {
                return Err(LogicError::NotAClock {
                    element: entry.key.clone(),
                })
            }
        };
        self.set_input(id, 0, !state)
    }

    /// Advance wall time for every clock, nested ones included.
    ///
    /// Each clock toggles once per full period elapsed; each toggle is a
    /// complete propagation pass.
    pub fn advance(&mut self, elapsed: Duration) {
        let clocks: Vec<ElementId> = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e, Some(Entry { element: Element::Clock(_), .. })))
            .map(|(i, _)| ElementId(i))
            .collect();

        for id in clocks {
            let due = match self.entry_mut(id).ok().and_then(|e| e.element.as_clock_mut()) {
                Some(clock) => clock.accumulate(elapsed),
                None => continue,
            };
            for _ in 0..due {
                let state = self.output_value(id, 0);
                self.drive(id, 0, !state);
            }
        }
    }

    /// Change the period of a top-level clock.
    pub fn set_clock_period(&mut self, id: ElementId, period: Duration) -> Result<()> {
        let key = self.top_entry(id)?.key.clone();
        match self.entry_mut(id)?.element.as_clock_mut() {
            Some(clock) => {
                clock.set_period(period);
                Ok(())
            }
            None => Err(LogicError::NotAClock { element: key }),
        }
    }
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}
