//! Line-oriented assembler for UVM source text.
//!
//! ```text
//! MNEMONIC operand, operand [, operand]   ; comment
//! ```
//!
//! - Mnemonics are matched case-insensitively (`LOAD`, `WRITE`, `READ`, `LE`).
//! - Operands are non-negative decimal or `0x` hex literals, separated by
//!   commas and/or whitespace.
//! - `;` or `#` starts a comment that runs to end of line.
//! - Blank and comment-only lines do not emit a record.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, trace};

use crate::decoder::{Instruction, OperandError, RECORD_LEN};
use crate::instructions::{Field, Opcode, FIELDS};
use crate::report::{render_log, ReportFormat};

const COMMENT_CHARS: &[char] = &[';', '#'];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("unknown opcode `{name}` on line {line}")]
    UnknownOpcode { name: String, line: usize },
    #[error("{op} expects {expected} operand(s), got {got} on line {line}")]
    WrongArity {
        op: Opcode,
        expected: usize,
        got: usize,
        line: usize,
    },
    #[error("invalid operand `{text}` on line {line}")]
    InvalidOperand { text: String, line: usize },
    #[error("operand {value} does not fit the {bits}-bit {field} field on line {line}")]
    OperandOutOfRange {
        value: String,
        field: Field,
        bits: u32,
        line: usize,
    },
}

impl AsmError {
    /// 1-based source line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            AsmError::UnknownOpcode { line, .. }
            | AsmError::WrongArity { line, .. }
            | AsmError::InvalidOperand { line, .. }
            | AsmError::OperandOutOfRange { line, .. } => *line,
        }
    }

    fn from_operand(err: OperandError, line: usize) -> Self {
        match err {
            OperandError::WrongArity { op, expected, got } => AsmError::WrongArity {
                op,
                expected,
                got,
                line,
            },
            OperandError::OperandOutOfRange {
                value, field, bits, ..
            } => AsmError::OperandOutOfRange {
                value: value.to_string(),
                field,
                bits,
                line,
            },
        }
    }
}

/// One audit log entry per emitted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRow {
    pub source: String,
    pub opcode: Opcode,
    pub bytes: [u8; RECORD_LEN],
}

/// Result of assembling a source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyUnit {
    /// Concatenated records, no header or padding.
    pub bytes: Vec<u8>,
    pub log: Vec<AuditRow>,
}

impl AssemblyUnit {
    pub fn instruction_count(&self) -> usize {
        self.log.len()
    }

    /// Writes the binary and the audit log. Both go to `.partial` siblings
    /// first and are renamed into place only once both writes succeeded, so
    /// a failure leaves neither file behind.
    pub fn write_to(&self, output: &Path, log: &Path, format: ReportFormat) -> anyhow::Result<()> {
        let rendered = render_log(&self.log, format)?;
        let (bin_tmp, log_tmp) = (partial_path(output), partial_path(log));

        let staged = fs::write(&bin_tmp, &self.bytes)
            .with_context(|| format!("writing binary to {}", output.display()))
            .and_then(|()| {
                fs::write(&log_tmp, rendered)
                    .with_context(|| format!("writing log to {}", log.display()))
            })
            .and_then(|()| {
                fs::rename(&bin_tmp, output)
                    .with_context(|| format!("moving binary to {}", output.display()))
            });
        if let Err(e) = staged {
            let _ = fs::remove_file(&bin_tmp);
            let _ = fs::remove_file(&log_tmp);
            return Err(e);
        }
        if let Err(e) = fs::rename(&log_tmp, log) {
            let _ = fs::remove_file(&log_tmp);
            let _ = fs::remove_file(output);
            return Err(e).with_context(|| format!("moving log to {}", log.display()));
        }
        Ok(())
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT_CHARS) {
        Some(p) => &line[..p],
        None => line,
    }
}

fn parse_literal(text: &str, line: usize) -> Result<Option<u64>, AsmError> {
    let (digits, radix) = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (text, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(AsmError::InvalidOperand {
            text: text.to_string(),
            line,
        });
    }
    // digits only, so the only failure left is overflow
    Ok(u64::from_str_radix(digits, radix).ok())
}

/// Parses one source line. `Ok(None)` for blank and comment-only lines.
pub(crate) fn parse_line(line: &str, line_no: usize) -> Result<Option<Instruction>, AsmError> {
    let code = strip_comment(line).trim();
    let mut tokens = code
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty());
    let Some(name) = tokens.next() else {
        if !code.is_empty() {
            return Err(AsmError::UnknownOpcode {
                name: code.to_string(),
                line: line_no,
            });
        }
        return Ok(None);
    };
    let op = Opcode::from_mnemonic(name).ok_or_else(|| AsmError::UnknownOpcode {
        name: name.to_string(),
        line: line_no,
    })?;

    let texts: Vec<&str> = tokens.collect();
    if texts.len() != op.arity() {
        return Err(AsmError::WrongArity {
            op,
            expected: op.arity(),
            got: texts.len(),
            line: line_no,
        });
    }

    let mut operands = Vec::with_capacity(texts.len());
    for (i, text) in texts.iter().enumerate() {
        let value = parse_literal(text, line_no)?.ok_or_else(|| AsmError::OperandOutOfRange {
            value: text.to_string(),
            field: FIELDS[i],
            bits: op.desc().widths[i],
            line: line_no,
        })?;
        operands.push(value);
    }

    Instruction::from_operands(op, &operands)
        .map(Some)
        .map_err(|e| AsmError::from_operand(e, line_no))
}

/// Assembles a whole source text. Stops at the first bad line.
pub fn assemble_source(source: &str) -> Result<AssemblyUnit, AsmError> {
    let mut unit = AssemblyUnit::default();
    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let Some(insn) = parse_line(line, line_no)? else {
            trace!(line = line_no, "skipping blank/comment line");
            continue;
        };
        let rec = insn.encode().map_err(|e| AsmError::from_operand(e, line_no))?;
        unit.bytes.extend_from_slice(&rec);
        unit.log.push(AuditRow {
            source: line.trim().to_string(),
            opcode: insn.opcode(),
            bytes: rec,
        });
    }
    info!(
        instructions = unit.instruction_count(),
        bytes = unit.bytes.len(),
        "assembled"
    );
    Ok(unit)
}

/// Formats a compiler-style diagnostic pointing at the failing line.
pub fn render_diagnostic(file: &str, source: &str, err: &AsmError) -> String {
    let line = err.line();
    let mut diag = String::new();
    let _ = writeln!(diag, "error: {err}");
    let _ = writeln!(diag, " --> {file}:{line}");
    if let Some(raw) = source.lines().nth(line.saturating_sub(1)) {
        let _ = writeln!(diag, "  |");
        let _ = writeln!(diag, "{:>4} | {}", line, raw.trim_end_matches('\r'));
        let _ = writeln!(diag, "  |");
    }
    diag
}
