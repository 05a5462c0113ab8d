use tracing::debug;

use crate::decoder::Instruction;
use crate::memory::Bus;

pub trait Executor {
    fn exec<B: Bus>(&self, bus: &mut B, insn: Instruction);
}

/// Reference semantics of the four UVM instructions.
pub struct UvmExecutor;

impl Executor for UvmExecutor {
    fn exec<B: Bus>(&self, bus: &mut B, insn: Instruction) {
        match insn {
            Instruction::Load { b, c } => {
                bus.write(b, c.into());
                debug!(dst = b, value = c, "LOAD");
            }
            Instruction::Write { b, c } => {
                let val = bus.read(b);
                bus.write(c, val);
                debug!(src = b, dst = c, value = val, "WRITE");
            }
            Instruction::Read { b, c } => {
                // c holds a pointer; load through it
                let ptr = bus.read(c);
                let val = bus.read(ptr);
                bus.write(b, val);
                debug!(dst = b, ptr_at = c, ptr, value = val, "READ");
            }
            Instruction::Le { b, c, d } => {
                let (lhs, rhs) = (bus.read(c), bus.read(d));
                let res = u32::from(lhs <= rhs);
                bus.write(b, res);
                debug!(dst = b, lhs, rhs, result = res, "LE");
            }
        }
    }
}
