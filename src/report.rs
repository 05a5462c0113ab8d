use serde::{Deserialize, Serialize, Serializer as _};
use std::borrow::Cow;
use std::fmt::Write as _;
use std::io;

use crate::assembler::AuditRow;
use crate::memory::Cell;

pub const LOG_HEADER: &str = "instruction,bytes";
pub const DUMP_HEADER: &str = "address,value";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum ReportFormat {
    /// Header row plus one comma-separated row per entry
    #[default]
    Csv,
    /// Pretty-printed JSON array
    Json,
}

/// `0xB2, 0x0A, ...`
pub fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("0x{:02X}", b))
        .collect::<Vec<_>>()
        .join(", ")
}

// RFC 4180 quoting: only when the field needs it
fn csv_field(s: &str) -> Cow<'_, str> {
    if s.contains(&[',', '"', '\n', '\r'][..]) {
        Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(s)
    }
}

pub fn render_log(rows: &[AuditRow], format: ReportFormat) -> serde_json::Result<String> {
    match format {
        ReportFormat::Csv => {
            let mut out = String::new();
            let _ = writeln!(out, "{LOG_HEADER}");
            for row in rows {
                let _ = writeln!(
                    out,
                    "{},{}",
                    csv_field(&row.source),
                    csv_field(&hex_bytes(&row.bytes))
                );
            }
            Ok(out)
        }
        ReportFormat::Json => serde_json::to_string_pretty(rows),
    }
}

/// Streams dump rows into `w` one at a time; the range is never buffered.
pub fn write_dump<W: io::Write>(
    mut w: W,
    cells: impl IntoIterator<Item = Cell>,
    format: ReportFormat,
) -> io::Result<()> {
    match format {
        ReportFormat::Csv => {
            writeln!(w, "{DUMP_HEADER}")?;
            for c in cells {
                writeln!(w, "{},{}", c.address, c.value)?;
            }
        }
        ReportFormat::Json => {
            let mut ser = serde_json::Serializer::pretty(&mut w);
            (&mut ser).collect_seq(cells)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::Opcode;
    use pretty_assertions::assert_eq;

    #[test]
    fn csv_log_quotes_byte_list_and_commas_in_source() {
        let rows = vec![AuditRow {
            source: "LOAD 342, 262".into(),
            opcode: Opcode::Load,
            bytes: [0xB2, 0x0A, 0, 0, 0x83, 0, 0, 0, 0, 0, 0],
        }];
        let out = render_log(&rows, ReportFormat::Csv).unwrap();
        assert_eq!(
            out,
            "instruction,bytes\n\"LOAD 342, 262\",\"0xB2, 0x0A, 0x00, 0x00, 0x83, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00\"\n"
        );
    }

    #[test]
    fn csv_field_escapes_quotes() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a \"b\""), "\"a \"\"b\"\"\"");
    }

    #[test]
    fn dump_json_is_an_array_of_cells() {
        let cells = [Cell { address: 7, value: 1 }, Cell { address: 8, value: 0 }];
        let mut out = Vec::new();
        write_dump(&mut out, cells, ReportFormat::Json).unwrap();
        let back: Vec<Cell> = serde_json::from_slice(&out).unwrap();
        assert_eq!(back, cells.to_vec());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            serde_json::to_string_pretty(&cells).unwrap()
        );
    }

    #[test]
    fn dump_csv_streams_rows_from_an_iterator() {
        let cells = (0..3u32).map(|address| Cell { address, value: address * 2 });
        let mut out = Vec::new();
        write_dump(&mut out, cells, ReportFormat::Csv).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "address,value\n0,0\n1,2\n2,4\n");
    }

    #[test]
    fn empty_dump_still_has_a_header_or_array() {
        let mut csv = Vec::new();
        write_dump(&mut csv, std::iter::empty(), ReportFormat::Csv).unwrap();
        assert_eq!(csv, b"address,value\n");
        let mut json = Vec::new();
        write_dump(&mut json, std::iter::empty(), ReportFormat::Json).unwrap();
        assert_eq!(json, b"[]");
    }
}
