use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type Addr = u32;
pub type Word = u32;

pub trait Bus {
    /// Reads `addr`; addresses never written read as zero.
    fn read(&self, addr: Addr) -> Word;
    fn write(&mut self, addr: Addr, val: Word);
}

/// One row of a memory dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub address: Addr,
    pub value: Word,
}

/// Sparse address -> value store. Owned by a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseMemory {
    cells: BTreeMap<Addr, Word>,
}

impl SparseMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of addresses that have been written at least once.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Every address in `start..=end` in ascending order, zero-filled.
    /// Rows are produced lazily; an inverted range yields none.
    pub fn dump(&self, start: Addr, end: Addr) -> impl Iterator<Item = Cell> + '_ {
        (start..=end).map(move |address| Cell {
            address,
            value: self.read(address),
        })
    }
}

impl Bus for SparseMemory {
    fn read(&self, addr: Addr) -> Word {
        self.cells.get(&addr).copied().unwrap_or(0)
    }

    fn write(&mut self, addr: Addr, val: Word) {
        self.cells.insert(addr, val);
    }
}
