//! Composite ("black box") elements.

use std::rc::Rc;

use crate::engine::ElementId;
use crate::graph::Graph;

/// A sub-circuit exposing a fixed set of ports.
///
/// Children live in the circuit's arena like any other element; the
/// composite only holds their handles. Input `i` is backed by the child
/// switch `inputs[i]`, output `i` by the child indicator `outputs[i]`.
#[derive(Debug, Clone)]
pub struct Composite {
    /// Graph this composite was instantiated from, re-emitted verbatim on save
    pub definition: Rc<Graph>,
    pub inputs: Vec<ElementId>,
    pub outputs: Vec<ElementId>,
    /// Every child, exposed ones included, in creation order
    pub children: Vec<ElementId>,
}

impl Composite {
    /// Create a composite shell; children are attached during instantiation.
    pub fn new(definition: Rc<Graph>) -> Self {
        Self {
            definition,
            inputs: Vec::new(),
            outputs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Exposed output port backed by `child`, if any.
    pub fn output_port_of(&self, child: ElementId) -> Option<usize> {
        self.outputs.iter().position(|c| *c == child)
    }
}
