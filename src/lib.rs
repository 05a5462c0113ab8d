pub mod assembler;
pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod exec;
pub mod instructions;
pub mod memory;
pub mod report;

pub mod isa {
    pub mod uvm; // 11-byte record codec
}

pub use assembler::{assemble_source, AsmError, AssemblyUnit, AuditRow};
pub use cpu::{run_program, Cpu, Trap};
pub use decoder::{CodecError, Instruction, OperandError, RECORD_LEN};
pub use instructions::Opcode;
pub use isa::uvm::{decode, encode, UvmCodec};
pub use memory::{Bus, Cell, SparseMemory};
pub use report::ReportFormat;
