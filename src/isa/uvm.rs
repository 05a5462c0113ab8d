use bitvec::prelude::*;

use crate::decoder::{CodecError, Decoder, Instruction, OperandError, RECORD_LEN};
use crate::instructions::Opcode;

/// Bit layout of an 11-byte record, little-endian from bit 0:
///
/// ```text
///  0..3   opcode
///  3..31  B        destination address
/// 31..47  C        LOAD immediate
/// 31..59  C        WRITE/READ/LE address
/// 59..87  D        LE second address
/// 87      unused, zero
/// ```
type Record = BitArray<[u8; RECORD_LEN], Lsb0>;

const OPCODE: std::ops::Range<usize> = 0..3;
const FIELD_B: std::ops::Range<usize> = 3..31;
const FIELD_C_CONST: std::ops::Range<usize> = 31..47;
const FIELD_C_ADDR: std::ops::Range<usize> = 31..59;
const FIELD_D: std::ops::Range<usize> = 59..87;

/// Encoder/decoder for the UVM record format.
#[derive(Debug, Default, Clone, Copy)]
pub struct UvmCodec;

impl UvmCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for UvmCodec {
    fn decode(&self, record: &[u8]) -> Result<Instruction, CodecError> {
        decode(record)
    }
}

impl Instruction {
    /// Packs the instruction into its record. Address fields wider than
    /// 28 bits are rejected rather than truncated by the store.
    pub fn encode(&self) -> Result<[u8; RECORD_LEN], OperandError> {
        self.check()?;
        let mut bits = Record::ZERO;
        bits[OPCODE].store_le(self.opcode() as u8);
        match *self {
            Instruction::Load { b, c } => {
                bits[FIELD_B].store_le(b);
                bits[FIELD_C_CONST].store_le(c);
            }
            Instruction::Write { b, c } | Instruction::Read { b, c } => {
                bits[FIELD_B].store_le(b);
                bits[FIELD_C_ADDR].store_le(c);
            }
            Instruction::Le { b, c, d } => {
                bits[FIELD_B].store_le(b);
                bits[FIELD_C_ADDR].store_le(c);
                bits[FIELD_D].store_le(d);
            }
        }
        Ok(bits.into_inner())
    }
}

/// Validates `operands` against `op` and packs them into one record.
pub fn encode(op: Opcode, operands: &[u64]) -> Result<[u8; RECORD_LEN], CodecError> {
    let insn = Instruction::from_operands(op, operands)?;
    Ok(insn.encode()?)
}

/// Decodes the record at the start of `bytes`. Bytes past the first record are ignored.
pub fn decode(bytes: &[u8]) -> Result<Instruction, CodecError> {
    let raw: [u8; RECORD_LEN] = bytes
        .get(..RECORD_LEN)
        .and_then(|s| s.try_into().ok())
        .ok_or(CodecError::TruncatedRecord { len: bytes.len() })?;
    let bits = Record::new(raw);

    let op_raw = bits[OPCODE].load_le::<u8>();
    let op = Opcode::from_raw(op_raw).ok_or(CodecError::UnknownOpcode { raw: op_raw })?;
    let b = bits[FIELD_B].load_le::<u32>();
    Ok(match op {
        Opcode::Load => Instruction::Load {
            b,
            c: bits[FIELD_C_CONST].load_le::<u16>(),
        },
        Opcode::Write => Instruction::Write {
            b,
            c: bits[FIELD_C_ADDR].load_le::<u32>(),
        },
        Opcode::Read => Instruction::Read {
            b,
            c: bits[FIELD_C_ADDR].load_le::<u32>(),
        },
        Opcode::Le => Instruction::Le {
            b,
            c: bits[FIELD_C_ADDR].load_le::<u32>(),
            d: bits[FIELD_D].load_le::<u32>(),
        },
    })
}
