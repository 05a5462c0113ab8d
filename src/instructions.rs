use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of every address operand slot.
pub const ADDR_BITS: u32 = 28;
/// Width of the LOAD immediate.
pub const CONST_BITS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    Load = 2,
    Write = 3,
    Read = 4,
    Le = 6,
}

/// Operand slot of an instruction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    B,
    C,
    D,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::B => f.write_str("B"),
            Field::C => f.write_str("C"),
            Field::D => f.write_str("D"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub op: Opcode,
    pub mnemonic: &'static str,
    /// Bit width of each operand, in B, C, D order.
    pub widths: &'static [u32],
}

pub const TABLE: &[InstrDesc] = &[
    InstrDesc {
        op: Opcode::Load,
        mnemonic: "LOAD",
        widths: &[ADDR_BITS, CONST_BITS],
    },
    InstrDesc {
        op: Opcode::Write,
        mnemonic: "WRITE",
        widths: &[ADDR_BITS, ADDR_BITS],
    },
    InstrDesc {
        op: Opcode::Read,
        mnemonic: "READ",
        widths: &[ADDR_BITS, ADDR_BITS],
    },
    InstrDesc {
        op: Opcode::Le,
        mnemonic: "LE",
        widths: &[ADDR_BITS, ADDR_BITS, ADDR_BITS],
    },
];

pub const FIELDS: [Field; 3] = [Field::B, Field::C, Field::D];

impl Opcode {
    pub fn desc(self) -> &'static InstrDesc {
        match self {
            Opcode::Load => &TABLE[0],
            Opcode::Write => &TABLE[1],
            Opcode::Read => &TABLE[2],
            Opcode::Le => &TABLE[3],
        }
    }

    pub fn mnemonic(self) -> &'static str {
        self.desc().mnemonic
    }

    pub fn arity(self) -> usize {
        self.desc().widths.len()
    }

    /// Case-insensitive mnemonic lookup.
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        TABLE
            .iter()
            .find(|d| d.mnemonic.eq_ignore_ascii_case(name))
            .map(|d| d.op)
    }

    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            2 => Some(Opcode::Load),
            3 => Some(Opcode::Write),
            4 => Some(Opcode::Read),
            6 => Some(Opcode::Le),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Opcode::from_raw(raw).ok_or(raw)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
