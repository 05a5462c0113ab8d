use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use uvm_rs::RECORD_LEN;

#[derive(Debug, Clone)]
pub struct Image {
    /// File offset the payload was taken from.
    pub skip: usize,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub bytes: usize,
    pub records: usize,
    pub trailing: usize,
}

pub fn load_raw_bin(path: &Path, skip: usize, len: Option<usize>) -> Result<Image> {
    let file = std::fs::read(path)?;
    anyhow::ensure!(skip <= file.len(), "--skip exceeds file size");
    let mut payload = &file[skip..];
    if let Some(lim) = len {
        anyhow::ensure!(lim <= payload.len(), "--len exceeds remaining file size after skip");
        payload = &payload[..lim];
    }
    Ok(Image { skip, bytes: payload.to_vec() })
}

impl Image {
    pub fn summary(&self) -> Summary {
        Summary {
            bytes: self.bytes.len(),
            records: self.bytes.len() / RECORD_LEN,
            trailing: self.bytes.len() % RECORD_LEN,
        }
    }

    /// The complete record starting at `offset`, if there is one.
    pub fn record(&self, offset: usize) -> Option<&[u8]> {
        self.bytes.get(offset..offset.checked_add(RECORD_LEN)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn loader_maps_skip_and_len() {
        let path = std::env::temp_dir().join("_uvm_disasm_loader.bin");
        std::fs::write(&path, [0u8, 1, 2, 3, 4, 5]).unwrap();
        let img = load_raw_bin(&path, 2, Some(3)).unwrap();
        assert_eq!(img.skip, 2);
        assert_eq!(img.bytes, vec![2, 3, 4]);
        assert!(load_raw_bin(&path, 7, None).is_err());
        assert!(load_raw_bin(&path, 2, Some(5)).is_err());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn summary_counts_whole_records_and_tail() {
        let img = Image { skip: 0, bytes: vec![0; RECORD_LEN * 2 + 3] };
        assert_eq!(img.summary(), Summary { bytes: 25, records: 2, trailing: 3 });
        assert!(img.record(RECORD_LEN).is_some());
        assert!(img.record(RECORD_LEN * 2).is_none());
    }
}
