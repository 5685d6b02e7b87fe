//! Named composite definitions.

use std::rc::Rc;

use tracing::debug;

use crate::error::{LogicError, Result};
use crate::graph::{validate_graph, Graph};

/// One registered definition.
#[derive(Debug, Clone)]
pub struct Definition {
    pub label: String,
    pub graph: Rc<Graph>,
}

/// Composite definitions, in registration order.
///
/// Every graph is validated on entry, so instantiating one never fails
/// part-way. Instances share the definition's graph.
#[derive(Debug, Clone, Default)]
pub struct Library {
    definitions: Vec<Definition>,
}

impl Library {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `graph` under `label`.
    pub fn define(&mut self, label: impl Into<String>, graph: Graph) -> Result<()> {
        let label = label.into();
        if self.contains(&label) {
            return Err(LogicError::DuplicateDefinition { name: label });
        }
        validate_graph(&graph)?;
        debug!(
            definition = %label,
            inputs = graph.input_count(),
            outputs = graph.output_count(),
            "definition registered"
        );
        self.definitions.push(Definition {
            label,
            graph: Rc::new(graph),
        });
        Ok(())
    }

    /// Look up a definition's graph.
    pub fn get(&self, label: &str) -> Result<Rc<Graph>> {
        self.definitions
            .iter()
            .find(|d| d.label == label)
            .map(|d| Rc::clone(&d.graph))
            .ok_or_else(|| LogicError::UnknownDefinition {
                name: label.to_string(),
            })
    }

    pub fn contains(&self, label: &str) -> bool {
        self.definitions.iter().any(|d| d.label == label)
    }

    /// Drop a definition. Existing instances keep their own copy.
    pub fn remove(&mut self, label: &str) -> Option<Definition> {
        let idx = self.definitions.iter().position(|d| d.label == label)?;
        Some(self.definitions.remove(idx))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
