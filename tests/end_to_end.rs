use std::path::PathBuf;

use pretty_assertions::assert_eq;
use uvm_rs::disasm::listing;
use uvm_rs::report::{write_dump, ReportFormat};
use uvm_rs::{assemble_source, run_program, Cell, RECORD_LEN};

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("uvm_e2e_{}_{}", std::process::id(), name))
}

#[test]
fn assemble_write_run_dump() {
    let src = "LOAD 16 42 ; answer\nWRITE 16 32\nLOAD 40 16\nREAD 48 40\nLE 8 48 16\n";
    let (bin, log, out) = (scratch("p.bin"), scratch("p.log"), scratch("p.csv"));

    let unit = assemble_source(src).unwrap();
    unit.write_to(&bin, &log, ReportFormat::Csv).unwrap();

    let log_text = std::fs::read_to_string(&log).unwrap();
    assert_eq!(log_text.lines().count(), 6);
    assert!(log_text
        .lines()
        .nth(1)
        .unwrap()
        .starts_with("LOAD 16 42 ; answer,\"0x82, "));

    let program = std::fs::read(&bin).unwrap();
    assert_eq!(program.len(), 5 * RECORD_LEN);
    let mem = run_program(&program).unwrap();
    let file = std::fs::File::create(&out).unwrap();
    write_dump(std::io::BufWriter::new(file), mem.dump(8, 10), ReportFormat::Csv).unwrap();
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "address,value\n8,1\n9,0\n10,0\n"
    );
    assert_eq!(mem.dump(48, 48).collect::<Vec<_>>(), vec![Cell { address: 48, value: 42 }]);

    for p in [bin, log, out] {
        let _ = std::fs::remove_file(p);
    }
}

#[test]
fn json_reports_carry_the_same_rows() {
    let unit = assemble_source("LOAD 1 3\nLE 2 1 0").unwrap();
    let mem = run_program(&unit.bytes).unwrap();
    let mut json = Vec::new();
    write_dump(&mut json, mem.dump(0, 2), ReportFormat::Json).unwrap();
    let cells: Vec<Cell> = serde_json::from_slice(&json).unwrap();
    assert_eq!(
        cells.iter().map(|c| c.value).collect::<Vec<_>>(),
        vec![0, 3, 0]
    );
}

#[test]
fn failed_write_leaves_neither_artifact() {
    let bin = scratch("orphan.bin");
    let log = scratch("missing_dir").join("orphan.log");
    let unit = assemble_source("WRITE 1 2").unwrap();
    assert!(unit.write_to(&bin, &log, ReportFormat::Json).is_err());
    assert!(!bin.exists());
    assert!(!log.exists());
}

#[test]
fn listing_matches_source() {
    let unit = assemble_source("load 1, 2\nwrite 3 4\nread 5 6\nle 7 8 9").unwrap();
    let text: Vec<String> = listing(&unit.bytes).into_iter().map(|l| l.text).collect();
    assert_eq!(text, vec!["LOAD 1, 2", "WRITE 3, 4", "READ 5, 6", "LE 7, 8, 9"]);
}

#[test]
fn listing_keeps_offsets_past_bad_records() {
    let mut bytes = vec![0x05; RECORD_LEN];
    bytes.extend(assemble_source("LOAD 1 2").unwrap().bytes);
    bytes.extend([0x02, 0x00]);
    let lines = listing(&bytes);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].insn.is_none());
    assert_eq!(lines[1].offset, RECORD_LEN);
    assert_eq!(lines[1].text, "LOAD 1, 2");
    assert!(lines[2].text.contains("truncated record"));
}
