use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::path::Path;

use uvm_rs::disasm::{fmt_instruction, listing};
use uvm_rs::isa::uvm::decode;

use uvm_disasm::load_raw_bin;

#[derive(Parser, Debug)]
#[command(author, version, about = "UVM disassembler CLI", long_about=None)]
struct Cli {
    /// Skip N bytes at start of file before loading
    #[arg(long, default_value_t = 0usize)]
    skip: usize,
    /// Input binary path
    #[arg(value_name = "BINFILE")]
    input: String,
    /// Limit bytes loaded (default: to EOF after --skip)
    #[arg(long)]
    len: Option<usize>,
    /// Subcommand
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Size, record count and trailing bytes of the loaded payload
    Info,
    /// Disassemble every record
    List {
        /// Show record bytes
        #[arg(long)]
        show_bytes: bool,
        /// Output format: text or json
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
    /// Decode the single record at a byte offset (hex or dec)
    Record { offset: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_usize(s: &str) -> Result<usize> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(usize::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<usize>()?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let img = load_raw_bin(Path::new(&cli.input), cli.skip, cli.len)?;

    match cli.cmd {
        Command::Info => {
            let s = img.summary();
            println!("{:<10} {:<10} {:<10}", "bytes", "records", "trailing");
            println!("{:<10} {:<10} {:<10}", s.bytes, s.records, s.trailing);
        }
        Command::List {
            show_bytes,
            format,
            out,
        } => {
            let lines = listing(&img.bytes);
            let buf = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&lines)?,
                OutputFormat::Text => {
                    let mut buf = String::new();
                    for l in &lines {
                        let _ = writeln!(buf, "{}", l.render(show_bytes));
                    }
                    buf
                }
            };
            if let Some(path) = out {
                std::fs::write(path, buf)?;
            } else {
                print!("{}", buf);
            }
        }
        Command::Record { offset } => {
            let offset = parse_usize(&offset)?;
            let Some(rec) = img.record(offset) else {
                anyhow::bail!("no complete record at offset {offset:#x}");
            };
            let insn = decode(rec)?;
            println!("{offset:#08x}: {}", fmt_instruction(&insn));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_usize_hex_and_dec() {
        assert_eq!(parse_usize("0x16").unwrap(), 0x16);
        assert_eq!(parse_usize("22").unwrap(), 22);
        assert!(parse_usize("-1").is_err());
    }

    #[test]
    fn cli_accepts_list_with_json() {
        let cli = Cli::try_parse_from(["uvm-disasm", "prog.bin", "list", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.cmd,
            Command::List { format: OutputFormat::Json, .. }
        ));
    }
}
