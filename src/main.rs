//! Nibble - CLI Entry Point
//!
//! `nibble [OPTIONS] <PROGRAM>` loads a raw program image and runs it,
//! with Input/Output instructions attached to the terminal.

use clap::Parser;
use log::LevelFilter;
use nibble::{load_image, Cpu, StdioPort};
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "nibble")]
#[command(version)]
#[command(about = "A virtual CPU for a 16-instruction, 8-bit teaching ISA")]
struct Cli {
    /// Path to the program image (at most 128 bytes are loaded)
    program: PathBuf,
    /// Enable debugging output (trace every executed instruction)
    #[arg(short, long)]
    debug: bool,
    /// Stop after this many instructions
    #[arg(short, long)]
    max_cycles: Option<u64>,
    /// Print the final CPU state as JSON
    #[arg(long)]
    dump_state: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug { LevelFilter::Debug } else { LevelFilter::Warn };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let image = match load_image(&cli.program) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut cpu = Cpu::new();
    cpu.load_image(&image.bytes);

    let mut port = StdioPort::stdio();
    let result = match cli.max_cycles {
        Some(max_cycles) => cpu.run_limited(&mut port, max_cycles),
        None => cpu.run(&mut port),
    };

    if let Err(e) = result {
        eprintln!("Error: {} (PC={})", e, cpu.pc);
        return ExitCode::FAILURE;
    }

    log::debug!(
        "stopped after {} cycles: {:?}, last instruction {:?}",
        cpu.cycles,
        cpu.state,
        cpu.last_instruction()
    );

    if let Some(fault) = cpu.fault() {
        log::warn!("{} (PC={}, SR={})", fault, cpu.pc, cpu.status_register());
    }

    if cli.dump_state {
        match serde_json::to_string_pretty(&cpu) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    if finished(&cpu) {
        ExitCode::SUCCESS
    } else {
        log::warn!("reached cycle limit with the program still running");
        ExitCode::FAILURE
    }
}

/// A halted CPU is a normal end of run whatever its status register says.
fn finished(cpu: &Cpu) -> bool {
    !cpu.is_running()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nibble::cpu::{encode, Instruction};
    use nibble::Fault;
    use std::io::Cursor;

    fn run_program(instructions: &[Instruction]) -> Cpu {
        let image: Vec<u8> = instructions.iter().flat_map(encode).collect();
        let mut cpu = Cpu::new();
        cpu.load_image(&image);
        let mut port = StdioPort::new(Cursor::new(Vec::new()), Vec::new());
        cpu.run_limited(&mut port, 100).unwrap();
        cpu
    }

    #[test]
    fn test_failed_halt_still_finishes() {
        // Copy R0, 5 then Branch with condition 7.
        let cpu = run_program(&[
            Instruction::Copy { r: 0, value: 5 },
            Instruction::Branch { cond: 7, target: 0 },
        ]);

        assert_eq!(cpu.fault(), Some(Fault::BadCondition(7)));
        assert_eq!(cpu.status_register(), -1);
        assert!(finished(&cpu));
    }

    #[test]
    fn test_normal_halt_finishes() {
        let cpu = run_program(&[Instruction::Halt]);
        assert!(finished(&cpu));
    }

    #[test]
    fn test_cycle_limit_does_not_finish() {
        let cpu = run_program(&[Instruction::Branch { cond: 0, target: 0 }]);
        assert!(!finished(&cpu));
    }
}
