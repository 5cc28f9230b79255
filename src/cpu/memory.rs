//! Flat byte-addressed memory.
//!
//! The machine has 128 signed 8-bit cells at addresses 0-127. Programs are
//! loaded at address 0 and share the same space as their data.

use serde::{Serialize, Deserialize};

/// The number of memory cells.
pub const MEMORY_SIZE: usize = 128;

/// Main memory: 128 signed byte cells.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<i8>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Read using an address taken from an instruction operand.
    pub fn read_addr(&self, addr: i8) -> Result<i8, MemoryError> {
        let index = Self::addr_to_index(addr as i16)?;
        Ok(self.cells[index])
    }

    /// Write using an address taken from an instruction operand.
    pub fn write_addr(&mut self, addr: i8, value: i8) -> Result<(), MemoryError> {
        let index = Self::addr_to_index(addr as i16)?;
        self.cells[index] = value;
        Ok(())
    }

    /// Fetch the two instruction bytes at `pc` and `pc + 1`.
    ///
    /// Both cells must lie inside memory, so a fetch at the last cell fails
    /// instead of reading past the end.
    pub fn fetch(&self, pc: i8) -> Result<[u8; 2], MemoryError> {
        let hi = Self::addr_to_index(pc as i16)?;
        let lo = Self::addr_to_index(pc as i16 + 1)?;
        Ok([self.cells[hi] as u8, self.cells[lo] as u8])
    }

    fn addr_to_index(addr: i16) -> Result<usize, MemoryError> {
        if addr < 0 || addr as usize >= MEMORY_SIZE {
            return Err(MemoryError::AddressOutOfRange(addr));
        }
        Ok(addr as usize)
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Copy a raw image into memory starting at address 0.
    ///
    /// Bytes past the end of memory are dropped. Returns the number of bytes
    /// actually copied.
    pub fn load_image(&mut self, image: &[u8]) -> usize {
        let len = image.len().min(MEMORY_SIZE);
        for (cell, &byte) in self.cells.iter_mut().zip(&image[..len]) {
            *cell = byte as i8;
        }
        len
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// Address is outside valid memory range.
    AddressOutOfRange(i16),
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryError::AddressOutOfRange(addr) => {
                write!(f, "memory address {} out of range (0 to {})", addr, MEMORY_SIZE - 1)
            }
        }
    }
}

impl std::error::Error for MemoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();

        mem.write_addr(10, -42).unwrap();
        assert_eq!(mem.read_addr(10).unwrap(), -42);
    }

    #[test]
    fn test_memory_signed_addr() {
        let mut mem = Memory::new();

        mem.write_addr(127, 99).unwrap();
        assert_eq!(mem.read_addr(127).unwrap(), 99);
        assert_eq!(mem.read_addr(-1), Err(MemoryError::AddressOutOfRange(-1)));
        assert_eq!(mem.write_addr(-128, 1), Err(MemoryError::AddressOutOfRange(-128)));
    }

    #[test]
    fn test_fetch_bounds() {
        let mut mem = Memory::new();
        mem.write_addr(126, 0x30).unwrap();
        mem.write_addr(127, 0x05).unwrap();

        assert_eq!(mem.fetch(126).unwrap(), [0x30, 0x05]);
        // The second byte would be cell 128.
        assert_eq!(mem.fetch(127), Err(MemoryError::AddressOutOfRange(128)));
        assert!(mem.fetch(-2).is_err());
    }

    #[test]
    fn test_load_image() {
        let mut mem = Memory::new();

        assert_eq!(mem.load_image(&[0x30, 0x05, 0xF0]), 3);
        assert_eq!(mem.read_addr(0).unwrap(), 0x30);
        assert_eq!(mem.read_addr(2).unwrap(), 0xF0u8 as i8);
        assert_eq!(mem.read_addr(3).unwrap(), 0);
    }

    #[test]
    fn test_load_image_truncates() {
        let mut mem = Memory::new();
        let image = vec![7u8; MEMORY_SIZE + 10];

        assert_eq!(mem.load_image(&image), MEMORY_SIZE);
        assert_eq!(mem.read_addr(127).unwrap(), 7);
    }
}
