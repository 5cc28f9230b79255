//! # Nibble
//!
//! A small virtual CPU for teaching how instruction sets work.
//!
//! Programs are raw binary images of at most 128 bytes. Each instruction is
//! two bytes; the CPU fetches, decodes and executes them one at a time until
//! it halts or hits a fault.

pub mod cpu;
pub mod image;
pub mod port;

// Re-export commonly used types
pub use cpu::{Cpu, CpuError, CpuState, Fault, Instruction, Memory, Registers};
pub use image::{load_image, ImageError, ProgramImage};
pub use port::{Port, StdioPort};
