//! Exhaustive truth tables over the top-level switches.

use std::fmt;

use tracing::debug;

use crate::elements::Element;
use crate::error::{LogicError, Result};

use super::circuit::Circuit;
use super::types::ElementId;

/// One assignment of the switches and the indicator states it settles to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthRow {
    pub inputs: Vec<bool>,
    pub outputs: Vec<bool>,
}

/// Truth table of a circuit: switch columns, then indicator columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthTable {
    /// Switch keys, in top-level order
    pub inputs: Vec<String>,
    /// Indicator keys, in top-level order
    pub outputs: Vec<String>,
    /// One row per assignment, counting up from all-low
    pub rows: Vec<TruthRow>,
}

impl TruthTable {
    /// Indicator values for a given switch assignment.
    pub fn lookup(&self, inputs: &[bool]) -> Option<&[bool]> {
        self.rows
            .iter()
            .find(|row| row.inputs == inputs)
            .map(|row| row.outputs.as_slice())
    }
}

impl fmt::Display for TruthTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cols: Vec<&str> = self
            .inputs
            .iter()
            .chain(&self.outputs)
            .map(String::as_str)
            .collect();
        // header width plus two spaces a side
        let widths: Vec<usize> = cols.iter().map(|c| c.len().max(1) + 4).collect();
        let total: usize = widths.iter().map(|w| w + 1).sum::<usize>().saturating_sub(1);

        writeln!(f, "|{}|", "-".repeat(total))?;
        write!(f, "|")?;
        for (col, w) in cols.iter().zip(&widths) {
            write!(f, "{:^w$}|", col, w = *w)?;
        }
        writeln!(f)?;
        writeln!(f, "|{}|", "-".repeat(total))?;
        for row in &self.rows {
            write!(f, "|")?;
            for (i, value) in row.inputs.iter().chain(&row.outputs).enumerate() {
                let cell = if *value { "1" } else { "0" };
                write!(f, "{:^w$}|", cell, w = widths[i])?;
            }
            writeln!(f)?;
        }
        writeln!(f, "|{}|", "-".repeat(total))
    }
}

/// Widest table [`bitwise_counter`] can enumerate.
pub const MAX_COUNTER_BITS: usize = u64::BITS as usize - 1;

/// Every assignment of `bits` booleans in counting order, most significant
/// first.
///
/// Yields nothing when `bits` exceeds [`MAX_COUNTER_BITS`].
pub fn bitwise_counter(bits: usize) -> impl Iterator<Item = Vec<bool>> {
    let total = u32::try_from(bits)
        .ok()
        .filter(|b| *b as usize <= MAX_COUNTER_BITS)
        .and_then(|b| 1u64.checked_shl(b))
        .unwrap_or(0);
    (0..total).map(move |n| (0..bits).rev().map(|i| (n >> i) & 1 == 1).collect())
}

impl Circuit {
    /// Drive every combination of the top-level switches and record the
    /// settled state of every top-level indicator.
    ///
    /// The switches are restored to their prior values afterwards. Clocks
    /// are left alone.
    pub fn truth_table(&mut self) -> Result<TruthTable> {
        let mut switches: Vec<(ElementId, bool)> = Vec::new();
        let mut indicators: Vec<ElementId> = Vec::new();
        for &id in &self.top_level {
            match &self.entry(id)?.element {
                Element::Switch(s) => switches.push((id, s.state)),
                Element::Indicator(_) => indicators.push(id),
                _ => {}
            }
        }

        let limit = self.config.max_truth_table_inputs.min(MAX_COUNTER_BITS);
        if switches.len() > limit {
            return Err(LogicError::TruthTableTooWide {
                inputs: switches.len(),
                limit,
            });
        }

        let inputs = switches
            .iter()
            .map(|(id, _)| self.entry(*id).map(|e| e.key.clone()))
            .collect::<Result<Vec<_>>>()?;
        let outputs = indicators
            .iter()
            .map(|id| self.entry(*id).map(|e| e.key.clone()))
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::new();
        for assignment in bitwise_counter(switches.len()) {
            for ((id, _), value) in switches.iter().zip(&assignment) {
                self.drive(*id, 0, *value);
            }
            let settled = indicators.iter().map(|id| self.input_value(*id, 0)).collect();
            rows.push(TruthRow {
                inputs: assignment,
                outputs: settled,
            });
        }

        for (id, value) in &switches {
            self.drive(*id, 0, *value);
        }
        debug!(inputs = switches.len(), outputs = indicators.len(), "truth table built");

        Ok(TruthTable {
            inputs,
            outputs,
            rows,
        })
    }
}
