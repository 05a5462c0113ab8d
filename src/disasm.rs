use serde::Serialize;
use std::fmt;

use crate::decoder::{CodecError, Instruction, RECORD_LEN};
use crate::isa::uvm::decode;

pub fn fmt_instruction(insn: &Instruction) -> String {
    match *insn {
        Instruction::Load { b, c } => format!("LOAD {}, {}", b, c),
        Instruction::Write { b, c } => format!("WRITE {}, {}", b, c),
        Instruction::Read { b, c } => format!("READ {}, {}", b, c),
        Instruction::Le { b, c, d } => format!("LE {}, {}, {}", b, c, d),
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&fmt_instruction(self))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingLine {
    pub offset: usize,
    pub bytes: Vec<u8>,
    pub insn: Option<Instruction>,
    pub text: String,
}

impl ListingLine {
    pub fn render(&self, show_bytes: bool) -> String {
        if show_bytes {
            let hex: Vec<String> = self.bytes.iter().map(|b| format!("{:02x}", b)).collect();
            format!("{:#08x}: {:<32}  {}", self.offset, hex.join(" "), self.text)
        } else {
            format!("{:#08x}: {}", self.offset, self.text)
        }
    }
}

/// Decodes every record of `program`. Undecodable records are kept in the
/// listing as raw bytes so the offsets of later records stay correct.
pub fn listing(program: &[u8]) -> Vec<ListingLine> {
    program
        .chunks(RECORD_LEN)
        .enumerate()
        .map(|(i, chunk)| {
            let (insn, text) = match decode(chunk) {
                Ok(insn) => (Some(insn), fmt_instruction(&insn)),
                Err(CodecError::UnknownOpcode { raw }) => {
                    (None, format!(".record ; unknown opcode {}", raw))
                }
                Err(e) => (None, format!(".bytes ; {}", e)),
            };
            ListingLine {
                offset: i * RECORD_LEN,
                bytes: chunk.to_vec(),
                insn,
                text,
            }
        })
        .collect()
}
