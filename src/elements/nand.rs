//! The universal NAND gate.

/// Two-input, one-output NAND.
///
/// With both inputs low the output starts high.
#[derive(Debug, Clone)]
pub struct Nand {
    pub inputs: [bool; 2],
    pub state: bool,
}

impl Nand {
    pub fn new() -> Self {
        Self {
            inputs: [false, false],
            state: true,
        }
    }

    /// Combinational rule: `NOT(in0 AND in1)`.
    pub fn eval(&self) -> bool {
        !(self.inputs[0] && self.inputs[1])
    }
}

impl Default for Nand {
    fn default() -> Self {
        Self::new()
    }
}
