//! CPU execution engine.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::cpu::{Memory, Registers};
use crate::cpu::decode::{self, Condition, Instruction};
use crate::cpu::registers::Comparison;
use crate::port::Port;
use log::debug;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Why the CPU stopped with a failure status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fault {
    /// Read or Write named an address outside memory.
    BadAddress(i8),
    /// The program counter no longer points at a whole instruction.
    BadFetch(i8),
    /// Branch used a condition code other than 0-6.
    BadCondition(u8),
    /// Input was requested after the input stream ended.
    InputExhausted,
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fault::BadAddress(addr) => write!(f, "invalid memory address {}", addr),
            Fault::BadFetch(pc) => write!(f, "cannot fetch instruction at {}", pc),
            Fault::BadCondition(code) => write!(f, "invalid branch condition 0x{:X}", code),
            Fault::InputExhausted => f.write_str("input exhausted"),
        }
    }
}

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU executed Halt.
    Halted,
    /// CPU stopped on a runtime fault.
    Failed(Fault),
}

impl CpuState {
    /// The sign-encoded status register: 1 running, 0 halted, -1 failed.
    pub fn status_register(&self) -> i8 {
        match self {
            CpuState::Running => 1,
            CpuState::Halted => 0,
            CpuState::Failed(_) => -1,
        }
    }
}

/// The virtual CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// General-purpose registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Program counter.
    pub pc: i8,
    /// Register indices latched by the last Compare.
    pub compare: Comparison,
    /// Current execution state.
    pub state: CpuState,
    /// Instruction count.
    pub cycles: u64,
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU with zeroed state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            pc: 0,
            compare: Comparison::default(),
            state: CpuState::Running,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Reset the CPU to initial state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.pc = 0;
        self.compare = Comparison::default();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Copy a program image into memory at address 0.
    ///
    /// Returns the number of bytes loaded; anything past the end of memory
    /// is dropped.
    pub fn load_image(&mut self, image: &[u8]) -> usize {
        let loaded = self.mem.load_image(image);
        debug!("loaded {} of {} bytes", loaded, image.len());
        loaded
    }

    /// Execute a single instruction.
    ///
    /// Runtime faults are not errors: they move the CPU into
    /// [`CpuState::Failed`] and the new state is returned.
    pub fn step<P: Port + ?Sized>(&mut self, port: &mut P) -> Result<CpuState, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        // Fetch
        let word = match self.mem.fetch(self.pc) {
            Ok(word) => word,
            Err(_) => {
                self.fail(Fault::BadFetch(self.pc));
                return Ok(self.state);
            }
        };

        // Advance PC before execute (taken branches override)
        self.pc = self.pc.wrapping_add(2);

        // Decode
        let instr = decode::decode(word);

        // Execute
        self.execute(instr, port)?;

        self.cycles += 1;
        self.last_instr = Some(instr);

        Ok(self.state)
    }

    /// Run until halt or fault.
    ///
    /// Returns the number of instructions executed.
    pub fn run<P: Port + ?Sized>(&mut self, port: &mut P) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step(port)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited<P: Port + ?Sized>(
        &mut self,
        port: &mut P,
        max_cycles: u64,
    ) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);

        while self.state == CpuState::Running && self.cycles < limit {
            self.step(port)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Execute a decoded instruction.
    fn execute<P: Port + ?Sized>(&mut self, instr: Instruction, port: &mut P) -> Result<(), CpuError> {
        match instr {
            Instruction::Halt => {
                self.state = CpuState::Halted;
                debug!("Halt");
            }

            // ==================== Memory ====================

            Instruction::Read { r, addr } => match self.mem.read_addr(addr) {
                Ok(value) => {
                    self.regs.set(r, value);
                    debug!("{} -> R{} = {}", addr, r, value);
                }
                Err(_) => self.fail(Fault::BadAddress(addr)),
            },

            Instruction::Write { r, addr } => {
                let value = self.regs.get(r);
                match self.mem.write_addr(addr, value) {
                    Ok(()) => debug!("R{} -> {} = {}", r, addr, value),
                    Err(_) => self.fail(Fault::BadAddress(addr)),
                }
            }

            // ==================== Registers ====================

            Instruction::Copy { r, value } => {
                self.regs.set(r, value);
                debug!("{} -> R{} = {}", value, r, value);
            }

            Instruction::Duplicate { r, s } => {
                let value = self.regs.get(s);
                self.regs.set(r, value);
                debug!("R{} -> R{} = {}", s, r, value);
            }

            // ==================== Arithmetic ====================

            Instruction::Add { r, s, t } => {
                let result = self.regs.get(s).wrapping_add(self.regs.get(t));
                self.regs.set(r, result);
                debug!("R{} + R{} -> R{} = {}", s, t, r, result);
            }

            Instruction::Subtract { r, s, t } => {
                let result = self.regs.get(s).wrapping_sub(self.regs.get(t));
                self.regs.set(r, result);
                debug!("R{} - R{} -> R{} = {}", s, t, r, result);
            }

            Instruction::Shift { r, amount } => {
                let result = shift(self.regs.get(r), amount);
                self.regs.set(r, result);
                debug!("R{} << {} = {}", r, amount, result);
            }

            // ==================== Logic ====================

            Instruction::Not { r, s } => {
                let result = !self.regs.get(s);
                self.regs.set(r, result);
                debug!("NOT R{} -> R{} = {}", s, r, result);
            }

            Instruction::And { r, s, t } => {
                let result = self.regs.get(s) & self.regs.get(t);
                self.regs.set(r, result);
                debug!("R{} AND R{} -> R{} = {}", s, t, r, result);
            }

            Instruction::Or { r, s, t } => {
                let result = self.regs.get(s) | self.regs.get(t);
                self.regs.set(r, result);
                debug!("R{} OR R{} -> R{} = {}", s, t, r, result);
            }

            Instruction::Xor { r, s, t } => {
                let result = self.regs.get(s) ^ self.regs.get(t);
                self.regs.set(r, result);
                debug!("R{} XOR R{} -> R{} = {}", s, t, r, result);
            }

            // ==================== Control Flow ====================

            Instruction::Compare { lhs, rhs } => {
                self.compare = Comparison { lhs, rhs };
                debug!("R{} <=> R{}", lhs, rhs);
            }

            Instruction::Branch { cond, target } => match Condition::try_from(cond) {
                Ok(condition) => {
                    let (lhs, rhs) = self.compare.operands(&self.regs);
                    if condition.holds(lhs, rhs) {
                        self.pc = target;
                        debug!("PC = {}", target);
                    }
                    if condition != Condition::Always {
                        debug!("R{} {} R{}", self.compare.lhs, condition.symbol(), self.compare.rhs);
                    }
                }
                Err(_) => self.fail(Fault::BadCondition(cond)),
            },

            // ==================== I/O ====================

            Instruction::Input { r } => match port.input()? {
                Some(value) => {
                    self.regs.set(r, value);
                    debug!("IN R{} <- {}", r, value);
                }
                None => self.fail(Fault::InputExhausted),
            },

            Instruction::Output { r } => {
                let value = self.regs.get(r);
                port.output(value)?;
                debug!("OUT R{} -> {}", r, value);
            }
        }

        Ok(())
    }

    fn fail(&mut self, fault: Fault) {
        debug!("fault: {}", fault);
        self.state = CpuState::Failed(fault);
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// The sign-encoded status register.
    pub fn status_register(&self) -> i8 {
        self.state.status_register()
    }

    /// The fault that stopped the CPU, if any.
    pub fn fault(&self) -> Option<Fault> {
        match self.state {
            CpuState::Failed(fault) => Some(fault),
            _ => None,
        }
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU stopped on a fault.
    pub fn is_failed(&self) -> bool {
        matches!(self.state, CpuState::Failed(_))
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

/// Shift left by a non-negative amount, arithmetic shift right by a negative one.
///
/// Shifting left by 8 or more clears the value. Right shifts saturate at 7,
/// which leaves only the sign (0 or -1); -128 is treated as a shift of 128.
fn shift(value: i8, amount: i8) -> i8 {
    if amount >= 0 {
        value.checked_shl(amount as u32).unwrap_or(0)
    } else {
        value >> amount.unsigned_abs().min(7)
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("pc", &self.pc)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
