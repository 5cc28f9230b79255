//! General-purpose register file and comparison latch.
//!
//! There are 16 signed 8-bit registers, R0 through R15. Instructions name
//! registers with a 4-bit field, so every index an instruction can produce
//! is valid.

use serde::{Serialize, Deserialize};

/// Number of general-purpose registers.
pub const REGISTER_COUNT: usize = 16;

/// The register file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    cells: [i8; REGISTER_COUNT],
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self {
            cells: [0; REGISTER_COUNT],
        }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        self.cells = [0; REGISTER_COUNT];
    }

    /// Read a register. Only the low nibble of `index` is used.
    #[inline]
    pub fn get(&self, index: u8) -> i8 {
        self.cells[(index & 0xF) as usize]
    }

    /// Write a register. Only the low nibble of `index` is used.
    #[inline]
    pub fn set(&mut self, index: u8, value: i8) {
        self.cells[(index & 0xF) as usize] = value;
    }
}

/// Register indices latched by Compare and consumed by Branch.
///
/// Only the indices are stored; Branch reads the registers when it runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub lhs: u8,
    pub rhs: u8,
}

impl Comparison {
    /// Current values of the latched registers.
    pub fn operands(&self, regs: &Registers) -> (i8, i8) {
        (regs.get(self.lhs), regs.get(self.rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut regs = Registers::new();
        regs.set(3, -7);
        regs.set(15, 127);

        assert_eq!(regs.get(3), -7);
        assert_eq!(regs.get(15), 127);
        assert_eq!(regs.get(0), 0);
    }

    #[test]
    fn test_index_uses_low_nibble() {
        let mut regs = Registers::new();
        regs.set(0x12, 9);

        assert_eq!(regs.get(2), 9);
    }

    #[test]
    fn test_reset() {
        let mut regs = Registers::new();
        regs.set(4, 1);
        regs.reset();

        assert_eq!(regs, Registers::new());
    }

    #[test]
    fn test_comparison_reads_live_values() {
        let mut regs = Registers::new();
        let cmp = Comparison { lhs: 1, rhs: 2 };
        regs.set(1, 5);
        regs.set(2, 6);
        assert_eq!(cmp.operands(&regs), (5, 6));

        regs.set(2, 5);
        assert_eq!(cmp.operands(&regs), (5, 5));
    }
}
