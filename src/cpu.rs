use crate::decoder::{CodecError, Decoder, RECORD_LEN};
use crate::exec::{Executor, UvmExecutor};
use crate::isa::uvm::UvmCodec;
use crate::memory::{Bus, SparseMemory};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cpu {
    pub pc: usize,    // byte offset of the next record
    pub retired: u64, // instructions executed so far
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Trap {
    #[error("Truncated program: {len} trailing byte(s) at offset {offset:#x}, records are {} bytes", RECORD_LEN)]
    TruncatedProgram { offset: usize, len: usize },
    #[error("Unknown opcode {raw} at offset {offset:#x}")]
    UnknownOpcode { offset: usize, raw: u8 },
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.pc = 0;
        self.retired = 0;
    }

    pub fn finished(&self, program: &[u8]) -> bool {
        self.pc >= program.len()
    }

    /// Executes the record at `pc`. Calling this once the program is
    /// exhausted is a no-op.
    pub fn step<B: Bus, D: Decoder, X: Executor>(
        &mut self,
        program: &[u8],
        bus: &mut B,
        dec: &D,
        exec: &X,
    ) -> Result<(), Trap> {
        let pc = self.pc;
        let Some(rest) = program.get(pc..).filter(|r| !r.is_empty()) else {
            return Ok(());
        };
        let insn = dec.decode(rest).map_err(|e| match e {
            CodecError::UnknownOpcode { raw } => Trap::UnknownOpcode { offset: pc, raw },
            _ => Trap::TruncatedProgram {
                offset: pc,
                len: rest.len(),
            },
        })?;
        self.pc = pc + RECORD_LEN;
        exec.exec(bus, insn);
        self.retired += 1;
        Ok(())
    }

    /// Runs from `pc` to the end of `program`.
    pub fn run<B: Bus, D: Decoder, X: Executor>(
        &mut self,
        program: &[u8],
        bus: &mut B,
        dec: &D,
        exec: &X,
    ) -> Result<(), Trap> {
        while !self.finished(program) {
            self.step(program, bus, dec, exec)?;
        }
        info!(retired = self.retired, "program finished");
        Ok(())
    }
}

/// Executes `program` against fresh memory and returns the final state.
pub fn run_program(program: &[u8]) -> Result<SparseMemory, Trap> {
    let mut mem = SparseMemory::new();
    let mut cpu = Cpu::new();
    cpu.run(program, &mut mem, &UvmCodec::new(), &UvmExecutor)?;
    Ok(mem)
}
