//! Instruction decoder.
//!
//! Every instruction is two bytes. The high nibble of the first byte is the
//! opcode; the remaining 12 bits are split into operand fields depending on
//! the opcode:
//!
//! ```text
//!   byte 0          byte 1
//!   [ op | R ]      [ S | T ]     register forms
//!   [ op | R ]      [  XY   ]     immediate/address forms
//!   [ op | C ]      [  XY   ]     branch (C = condition code)
//! ```

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Decoded instruction.
///
/// Register fields are 4-bit indices. `addr`, `value`, `amount` and `target`
/// are the second instruction byte read as a signed 8-bit number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Stop with success status.
    Halt,

    /// R := [addr]
    Read { r: u8, addr: i8 },

    /// [addr] := R
    Write { r: u8, addr: i8 },

    /// R := value (sign-extended immediate)
    Copy { r: u8, value: i8 },

    /// R := S
    Duplicate { r: u8, s: u8 },

    /// R := S + T, wrapping
    Add { r: u8, s: u8, t: u8 },

    /// R := S - T, wrapping
    Subtract { r: u8, s: u8, t: u8 },

    /// Shift R left by `amount`, or arithmetically right by `-amount`.
    Shift { r: u8, amount: i8 },

    /// R := !S
    Not { r: u8, s: u8 },

    /// R := S & T
    And { r: u8, s: u8, t: u8 },

    /// R := S | T
    Or { r: u8, s: u8, t: u8 },

    /// R := S ^ T
    Xor { r: u8, s: u8, t: u8 },

    /// Latch register indices for the next Branch.
    Compare { lhs: u8, rhs: u8 },

    /// PC := target when `cond` holds for the latched registers.
    ///
    /// The condition code is kept raw; codes 7-F are rejected at execution.
    Branch { cond: u8, target: i8 },

    /// R := next value from the input port
    Input { r: u8 },

    /// Write R to the output port.
    Output { r: u8 },
}

struct Opcode;

impl Opcode {
    const HALT: u8 = 0x0;
    const READ: u8 = 0x1;
    const WRITE: u8 = 0x2;
    const COPY: u8 = 0x3;
    const DUPLICATE: u8 = 0x4;
    const ADD: u8 = 0x5;
    const SUBTRACT: u8 = 0x6;
    const SHIFT: u8 = 0x7;
    const NOT: u8 = 0x8;
    const AND: u8 = 0x9;
    const OR: u8 = 0xA;
    const XOR: u8 = 0xB;
    const COMPARE: u8 = 0xC;
    const BRANCH: u8 = 0xD;
    const INPUT: u8 = 0xE;
    const OUTPUT: u8 = 0xF;
}

/// Decode a two-byte instruction word.
///
/// All 16 opcodes are defined, so decoding never fails.
pub fn decode(word: [u8; 2]) -> Instruction {
    let [b0, b1] = word;

    let op = b0 >> 4;
    let r = b0 & 0xF;
    let s = b1 >> 4;
    let t = b1 & 0xF;
    let xy = b1 as i8;

    match op {
        Opcode::HALT => Instruction::Halt,
        Opcode::READ => Instruction::Read { r, addr: xy },
        Opcode::WRITE => Instruction::Write { r, addr: xy },
        Opcode::COPY => Instruction::Copy { r, value: xy },
        Opcode::DUPLICATE => Instruction::Duplicate { r, s },
        Opcode::ADD => Instruction::Add { r, s, t },
        Opcode::SUBTRACT => Instruction::Subtract { r, s, t },
        Opcode::SHIFT => Instruction::Shift { r, amount: xy },
        Opcode::NOT => Instruction::Not { r, s },
        Opcode::AND => Instruction::And { r, s, t },
        Opcode::OR => Instruction::Or { r, s, t },
        Opcode::XOR => Instruction::Xor { r, s, t },
        Opcode::COMPARE => Instruction::Compare { lhs: s, rhs: r },
        Opcode::BRANCH => Instruction::Branch { cond: r, target: xy },
        Opcode::INPUT => Instruction::Input { r },
        // Opcode::OUTPUT is the only nibble value left.
        _ => Instruction::Output { r },
    }
}

/// Encode an instruction back to its two-byte form.
pub fn encode(instr: &Instruction) -> [u8; 2] {
    let nib = |hi: u8, lo: u8| ((hi & 0xF) << 4) | (lo & 0xF);

    match *instr {
        Instruction::Halt => [nib(Opcode::HALT, 0), 0],
        Instruction::Read { r, addr } => [nib(Opcode::READ, r), addr as u8],
        Instruction::Write { r, addr } => [nib(Opcode::WRITE, r), addr as u8],
        Instruction::Copy { r, value } => [nib(Opcode::COPY, r), value as u8],
        Instruction::Duplicate { r, s } => [nib(Opcode::DUPLICATE, r), nib(s, 0)],
        Instruction::Add { r, s, t } => [nib(Opcode::ADD, r), nib(s, t)],
        Instruction::Subtract { r, s, t } => [nib(Opcode::SUBTRACT, r), nib(s, t)],
        Instruction::Shift { r, amount } => [nib(Opcode::SHIFT, r), amount as u8],
        Instruction::Not { r, s } => [nib(Opcode::NOT, r), nib(s, 0)],
        Instruction::And { r, s, t } => [nib(Opcode::AND, r), nib(s, t)],
        Instruction::Or { r, s, t } => [nib(Opcode::OR, r), nib(s, t)],
        Instruction::Xor { r, s, t } => [nib(Opcode::XOR, r), nib(s, t)],
        Instruction::Compare { lhs, rhs } => [nib(Opcode::COMPARE, rhs), nib(lhs, 0)],
        Instruction::Branch { cond, target } => [nib(Opcode::BRANCH, cond), target as u8],
        Instruction::Input { r } => [nib(Opcode::INPUT, r), 0],
        Instruction::Output { r } => [nib(Opcode::OUTPUT, r), 0],
    }
}

/// Branch condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Always,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
}

impl Condition {
    /// Evaluate the condition on two signed register values.
    pub fn holds(self, lhs: i8, rhs: i8) -> bool {
        match self {
            Condition::Always => true,
            Condition::Equal => lhs == rhs,
            Condition::NotEqual => lhs != rhs,
            Condition::Less => lhs < rhs,
            Condition::Greater => lhs > rhs,
            Condition::LessOrEqual => lhs <= rhs,
            Condition::GreaterOrEqual => lhs >= rhs,
        }
    }

    /// Relational operator for trace output.
    pub fn symbol(self) -> &'static str {
        match self {
            Condition::Always => "*",
            Condition::Equal => "==",
            Condition::NotEqual => "!=",
            Condition::Less => "<",
            Condition::Greater => ">",
            Condition::LessOrEqual => "<=",
            Condition::GreaterOrEqual => ">=",
        }
    }
}

impl TryFrom<u8> for Condition {
    type Error = DecodeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0x0 => Condition::Always,
            0x1 => Condition::Equal,
            0x2 => Condition::NotEqual,
            0x3 => Condition::Less,
            0x4 => Condition::Greater,
            0x5 => Condition::LessOrEqual,
            0x6 => Condition::GreaterOrEqual,
            _ => return Err(DecodeError::InvalidCondition(code)),
        })
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid branch condition: 0x{0:X}")]
    InvalidCondition(u8),
}
