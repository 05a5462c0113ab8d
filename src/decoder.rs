use serde::{Deserialize, Serialize};

use crate::instructions::{Field, Opcode, FIELDS};

/// Size in bytes of one encoded instruction.
pub const RECORD_LEN: usize = 11;

/// A decoded instruction. `b` is always the destination address.
///
/// Address fields are `u32` but only 28 bits wide in the record, so values
/// coming in through serde are width-checked before they become an
/// `Instruction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "UPPERCASE", try_from = "RawInstruction")]
pub enum Instruction {
    /// `mem[b] := c`
    Load { b: u32, c: u16 },
    /// `mem[c] := mem[b]`
    Write { b: u32, c: u32 },
    /// `mem[b] := mem[mem[c]]`
    Read { b: u32, c: u32 },
    /// `mem[b] := mem[c] <= mem[d]`
    Le { b: u32, c: u32, d: u32 },
}

// Unchecked mirror of `Instruction` for deserialization.
#[derive(Deserialize)]
#[serde(tag = "op", rename_all = "UPPERCASE")]
enum RawInstruction {
    Load { b: u32, c: u16 },
    Write { b: u32, c: u32 },
    Read { b: u32, c: u32 },
    Le { b: u32, c: u32, d: u32 },
}

impl TryFrom<RawInstruction> for Instruction {
    type Error = OperandError;

    fn try_from(raw: RawInstruction) -> Result<Self, Self::Error> {
        let insn = match raw {
            RawInstruction::Load { b, c } => Instruction::Load { b, c },
            RawInstruction::Write { b, c } => Instruction::Write { b, c },
            RawInstruction::Read { b, c } => Instruction::Read { b, c },
            RawInstruction::Le { b, c, d } => Instruction::Le { b, c, d },
        };
        insn.check()?;
        Ok(insn)
    }
}

/// Operand problems found while building an instruction.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OperandError {
    #[error("{op} takes {expected} operands, got {got}")]
    WrongArity {
        op: Opcode,
        expected: usize,
        got: usize,
    },
    #[error("operand {value} does not fit the {bits}-bit {field} field of {op}")]
    OperandOutOfRange {
        op: Opcode,
        value: u64,
        field: Field,
        bits: u32,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unknown opcode {raw}")]
    UnknownOpcode { raw: u8 },
    #[error("{op} takes {expected} operands, got {got}")]
    WrongArity {
        op: Opcode,
        expected: usize,
        got: usize,
    },
    #[error("operand {value} does not fit the {bits}-bit {field} field of {op}")]
    OperandOutOfRange {
        op: Opcode,
        value: u64,
        field: Field,
        bits: u32,
    },
    #[error("truncated record: {len} of {} bytes", RECORD_LEN)]
    TruncatedRecord { len: usize },
}

impl From<OperandError> for CodecError {
    fn from(err: OperandError) -> Self {
        match err {
            OperandError::WrongArity { op, expected, got } => {
                CodecError::WrongArity { op, expected, got }
            }
            OperandError::OperandOutOfRange {
                op,
                value,
                field,
                bits,
            } => CodecError::OperandOutOfRange {
                op,
                value,
                field,
                bits,
            },
        }
    }
}

impl Instruction {
    /// Builds an instruction from raw operands, checking arity and field widths.
    pub fn from_operands(op: Opcode, operands: &[u64]) -> Result<Self, OperandError> {
        let widths = op.desc().widths;
        if operands.len() != widths.len() {
            return Err(OperandError::WrongArity {
                op,
                expected: widths.len(),
                got: operands.len(),
            });
        }
        for ((&value, &bits), &field) in operands.iter().zip(widths).zip(FIELDS.iter()) {
            if value >> bits != 0 {
                return Err(OperandError::OperandOutOfRange {
                    op,
                    value,
                    field,
                    bits,
                });
            }
        }
        // widths are all <= 28 bits, so the narrowing casts below are lossless
        let addr = |i: usize| operands[i] as u32;
        Ok(match op {
            Opcode::Load => Instruction::Load {
                b: addr(0),
                c: operands[1] as u16,
            },
            Opcode::Write => Instruction::Write { b: addr(0), c: addr(1) },
            Opcode::Read => Instruction::Read { b: addr(0), c: addr(1) },
            Opcode::Le => Instruction::Le {
                b: addr(0),
                c: addr(1),
                d: addr(2),
            },
        })
    }

    /// Re-checks field widths. Variants built by hand or through serde can
    /// hold address values wider than their 28-bit slot.
    pub fn check(&self) -> Result<(), OperandError> {
        Instruction::from_operands(self.opcode(), &self.operands()).map(|_| ())
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Load { .. } => Opcode::Load,
            Instruction::Write { .. } => Opcode::Write,
            Instruction::Read { .. } => Opcode::Read,
            Instruction::Le { .. } => Opcode::Le,
        }
    }

    pub fn operands(&self) -> Vec<u64> {
        match *self {
            Instruction::Load { b, c } => vec![b.into(), c.into()],
            Instruction::Write { b, c } | Instruction::Read { b, c } => vec![b.into(), c.into()],
            Instruction::Le { b, c, d } => vec![b.into(), c.into(), d.into()],
        }
    }
}

pub trait Decoder {
    fn decode(&self, record: &[u8]) -> Result<Instruction, CodecError>;
}
