use anyhow::{anyhow, ensure, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use uvm_rs::assembler::{assemble_source, render_diagnostic};
use uvm_rs::report::{write_dump, ReportFormat};
use uvm_rs::run_program;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Assemble and run programs for the UVM memory-to-memory machine"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble a source file into a binary and an audit log
    Assemble {
        /// Assembly source (one instruction or comment per line)
        input: PathBuf,
        /// Output binary (11-byte records, no header)
        output: PathBuf,
        /// Audit log mapping source lines to emitted bytes
        log: PathBuf,
        /// Audit log format
        #[arg(long, value_enum, default_value_t = ReportFormat::Csv)]
        format: ReportFormat,
    },
    /// Run a binary and dump an inclusive memory range
    Run {
        /// Binary produced by `assemble`
        input: PathBuf,
        /// Memory dump output
        output: PathBuf,
        /// First address to dump (hex or dec)
        start: String,
        /// Last address to dump, inclusive (hex or dec)
        end: String,
        /// Dump format
        #[arg(long, value_enum, default_value_t = ReportFormat::Csv)]
        format: ReportFormat,
    },
}

fn parse_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u32::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u32>()?)
    }
}

/// Assembles `input`; on a bad line the error carries the rendered diagnostic
/// and nothing is written.
fn assemble(input: &Path, output: &Path, log: &Path, format: ReportFormat) -> Result<()> {
    let source =
        fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let unit = assemble_source(&source).map_err(|err| {
        let diag = render_diagnostic(&input.display().to_string(), &source, &err);
        anyhow!(diag.trim_end().to_string())
    })?;
    unit.write_to(output, log, format)?;
    println!(
        "assembled {} instruction(s) from {} into {} (log: {})",
        unit.instruction_count(),
        input.display(),
        output.display(),
        log.display()
    );
    Ok(())
}

fn run(input: &Path, output: &Path, start: &str, end: &str, format: ReportFormat) -> Result<()> {
    let start = parse_u32(start).with_context(|| format!("bad start address `{start}`"))?;
    let end = parse_u32(end).with_context(|| format!("bad end address `{end}`"))?;
    ensure!(end >= start, "end must be >= start");

    let program = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let mem = run_program(&program).with_context(|| format!("executing {}", input.display()))?;

    let file =
        File::create(output).with_context(|| format!("creating {}", output.display()))?;
    let mut w = BufWriter::new(file);
    write_dump(&mut w, mem.dump(start, end), format)
        .and_then(|()| w.flush())
        .with_context(|| format!("writing {}", output.display()))?;
    println!(
        "ran {} and wrote addresses {start}..={end} to {}",
        input.display(),
        output.display()
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.cmd {
        Command::Assemble {
            input,
            output,
            log,
            format,
        } => assemble(&input, &output, &log, format),
        Command::Run {
            input,
            output,
            start,
            end,
            format,
        } => run(&input, &output, &start, &end, format),
    };
    if let Err(err) = result {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}
