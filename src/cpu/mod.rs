//! CPU emulation.
//!
//! The machine model:
//! - 128 signed 8-bit memory cells
//! - 16 signed 8-bit general registers, R0-R15
//! - an 8-bit program counter and a sign-encoded status register
//! - 16 two-byte instructions

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

pub use memory::{Memory, MemoryError, MEMORY_SIZE};
pub use registers::{Comparison, Registers, REGISTER_COUNT};
pub use decode::{decode, encode, Condition, DecodeError, Instruction};
pub use execute::{Cpu, CpuError, CpuState, Fault};
