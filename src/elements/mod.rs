//! Circuit element models.
//!
//! This module provides the closed set of element variants:
//! - Sources: [`SourceSwitch`], [`Clock`]
//! - Combinational: [`Nand`]
//! - Sink: [`Indicator`]
//! - Hierarchical: [`Composite`]
//!
//! Each variant owns its own state. Wiring (connection slots) and the
//! recursive fan-out live in [`crate::engine`]; an element only answers
//! "what happens when this input becomes `value`" through
//! [`Element::apply`].

mod composite;
mod indicator;
mod nand;
mod sources;

pub use composite::Composite;
pub use indicator::{Forward, Indicator};
pub use nand::Nand;
pub use sources::{Clock, SourceSwitch};

use std::time::Duration;

use crate::engine::ElementId;
use crate::graph::NodeKind;

/// What to create with [`crate::Circuit::spawn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementSpec {
    Switch,
    Indicator,
    Nand,
    /// Clock with an optional period override
    Clock { period: Option<Duration> },
    /// Instance of a named library definition
    Composite(String),
}

/// Outcome of driving one input of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// The port already held the value
    Unchanged,
    /// Input stored, output unaffected
    Stored,
    /// Output 0 changed to this value
    Output(bool),
    /// Indicator changed; relay to its forwarding list
    Forward(bool),
    /// Composite input; drive this child switch instead
    Delegate(ElementId),
}

/// A circuit element.
#[derive(Debug, Clone)]
pub enum Element {
    Switch(SourceSwitch),
    Clock(Clock),
    Nand(Nand),
    Indicator(Indicator),
    Composite(Composite),
}

impl Element {
    /// Apply a new value to input `port` and report what changed.
    ///
    /// Sources have no inputs; port 0 on a source sets its output directly.
    /// Setting a value a port already holds is a no-op, as is driving a
    /// port the element doesn't have.
    pub(crate) fn apply(&mut self, port: usize, value: bool) -> Reaction {
        match self {
            Element::Switch(SourceSwitch { state }) | Element::Clock(Clock { state, .. }) => {
                if *state == value {
                    return Reaction::Unchanged;
                }
                *state = value;
                Reaction::Output(value)
            }
            Element::Nand(nand) => {
                let Some(input) = nand.inputs.get_mut(port) else {
                    return Reaction::Unchanged;
                };
                if *input == value {
                    return Reaction::Unchanged;
                }
                *input = value;
                let next = nand.eval();
                if next == nand.state {
                    return Reaction::Stored;
                }
                nand.state = next;
                Reaction::Output(next)
            }
            Element::Indicator(ind) => {
                if ind.state == value {
                    return Reaction::Unchanged;
                }
                ind.state = value;
                Reaction::Forward(value)
            }
            Element::Composite(c) => match c.inputs.get(port) {
                Some(child) => Reaction::Delegate(*child),
                None => Reaction::Unchanged,
            },
        }
    }

    /// Number of input ports.
    pub fn input_count(&self) -> usize {
        match self {
            Element::Switch(_) | Element::Clock(_) => 0,
            Element::Nand(_) => 2,
            Element::Indicator(_) => 1,
            Element::Composite(c) => c.inputs.len(),
        }
    }

    /// Number of output ports.
    pub fn output_count(&self) -> usize {
        match self {
            Element::Switch(_) | Element::Clock(_) | Element::Nand(_) => 1,
            Element::Indicator(_) => 0,
            Element::Composite(c) => c.outputs.len(),
        }
    }

    /// Ports accepted by [`Element::apply`]; sources take port 0.
    pub fn settable_ports(&self) -> usize {
        match self {
            Element::Switch(_) | Element::Clock(_) => 1,
            other => other.input_count(),
        }
    }

    /// Stored value of an input port.
    ///
    /// `None` for a composite, whose inputs live in its child switches, or
    /// for a port out of range.
    pub fn input_state(&self, port: usize) -> Option<bool> {
        match self {
            Element::Switch(_) | Element::Clock(_) => None,
            Element::Nand(n) => n.inputs.get(port).copied(),
            Element::Indicator(i) => (port == 0).then_some(i.state),
            Element::Composite(_) => None,
        }
    }

    /// Current value of an output port.
    ///
    /// `None` for a composite, whose outputs live in its child indicators,
    /// or for a port out of range.
    pub fn output_state(&self, port: usize) -> Option<bool> {
        match self {
            Element::Switch(SourceSwitch { state })
            | Element::Clock(Clock { state, .. })
            | Element::Nand(Nand { state, .. }) => (port == 0).then_some(*state),
            Element::Indicator(_) | Element::Composite(_) => None,
        }
    }

    /// Kind this element serializes as.
    pub fn node_kind(&self) -> NodeKind {
        match self {
            Element::Switch(_) => NodeKind::Input,
            Element::Clock(_) => NodeKind::Clock,
            Element::Nand(_) => NodeKind::Nand,
            Element::Indicator(_) => NodeKind::Output,
            Element::Composite(_) => NodeKind::Composite,
        }
    }

    /// Short human-readable name of the variant.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Element::Switch(_) => "switch",
            Element::Clock(_) => "clock",
            Element::Nand(_) => "nand",
            Element::Indicator(_) => "indicator",
            Element::Composite(_) => "composite",
        }
    }

    pub fn as_composite(&self) -> Option<&Composite> {
        match self {
            Element::Composite(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_indicator_mut(&mut self) -> Option<&mut Indicator> {
        match self {
            Element::Indicator(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_clock_mut(&mut self) -> Option<&mut Clock> {
        match self {
            Element::Clock(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(false, false, true)]
    #[case(false, true, true)]
    #[case(true, false, true)]
    #[case(true, true, false)]
    fn test_nand_truth_table(#[case] a: bool, #[case] b: bool, #[case] expected: bool) {
        let mut gate = Element::Nand(Nand::new());
        gate.apply(0, a);
        gate.apply(1, b);
        assert_eq!(gate.output_state(0), Some(expected));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut gate = Element::Nand(Nand::new());
        assert_eq!(gate.apply(0, true), Reaction::Stored);
        assert_eq!(gate.apply(0, true), Reaction::Unchanged);
        assert_eq!(gate.apply(1, true), Reaction::Output(false));
        assert_eq!(gate.apply(1, true), Reaction::Unchanged);
    }

    #[test]
    fn test_apply_ignores_missing_ports() {
        let mut gate = Element::Nand(Nand::new());
        assert_eq!(gate.apply(2, true), Reaction::Unchanged);
        assert_eq!(gate.output_state(0), Some(true));

        let definition = std::rc::Rc::new(crate::graph::Graph::new());
        let mut empty = Element::Composite(Composite::new(definition));
        assert_eq!(empty.apply(0, true), Reaction::Unchanged);
    }

    #[test]
    fn test_source_port_zero_sets_output() {
        let mut sw = Element::Switch(SourceSwitch::new(false));
        assert_eq!(sw.apply(0, true), Reaction::Output(true));
        assert_eq!(sw.output_state(0), Some(true));
        assert_eq!(sw.input_count(), 0);
        assert_eq!(sw.settable_ports(), 1);
    }

    #[test]
    fn test_indicator_forwards_changes_only() {
        let mut ind = Element::Indicator(Indicator::new());
        assert_eq!(ind.apply(0, false), Reaction::Unchanged);
        assert_eq!(ind.apply(0, true), Reaction::Forward(true));
        assert_eq!(ind.input_state(0), Some(true));
        assert_eq!(ind.output_count(), 0);
    }
}
