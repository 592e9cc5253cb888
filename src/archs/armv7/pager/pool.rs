// SPDX-License-Identifier: Unlicense

//! Fixed pool of second-level tables.
//!
//! Tables are handed out from a free stack and reclaimed when the last page
//! they map is unmapped. Each table records the L1 entry that refers to it,
//! so the owner can be found without turning physical addresses back into
//! pointers.

use super::table::{l1_index, L2Table, L2_ENTRIES};
use crate::pager::{PhysAddr, VirtAddr};

#[derive(Copy, Clone, Debug)]
struct TableStatus {
    owner: Option<u16>,
    entries: u16,
}

impl TableStatus {
    const fn free() -> Self {
        Self {
            owner: None,
            entries: 0,
        }
    }
}

/// A pool of `N` second-level tables.
pub struct L2TablePool<const N: usize> {
    tables: [L2Table; N],
    status: [TableStatus; N],
    free: [u16; N],
    free_count: usize,
}

impl<const N: usize> L2TablePool<N> {
    /// Every table free, index 0 first out.
    pub const fn new() -> Self {
        let mut free = [0u16; N];
        let mut i = 0;
        while i < N {
            free[i] = (N - 1 - i) as u16;
            i += 1;
        }
        Self {
            tables: [L2Table::new(); N],
            status: [TableStatus::free(); N],
            free,
            free_count: N,
        }
    }

    /// Take a free table to translate the 1MB region holding `virt_addr`.
    ///
    /// Panics when the pool is exhausted: the pool is sized for the platform
    /// and running out is a configuration error.
    pub fn assign(&mut self, virt_addr: VirtAddr) -> usize {
        assert_gt!(self.free_count, 0, "L2 table pool exhausted");
        self.free_count -= 1;
        let idx = self.free[self.free_count] as usize;
        assert_eq!(0, self.status[idx].entries);
        self.status[idx].owner = Some(l1_index(virt_addr) as u16);
        self.tables[idx] = L2Table::new();
        idx
    }

    /// Return a table to the pool, yielding the L1 index that referred to it.
    pub fn release(&mut self, idx: usize) -> Option<usize> {
        let owner = self.status[idx].owner.take();
        self.status[idx].entries = 0;
        self.free[self.free_count] = idx as u16;
        self.free_count += 1;
        owner.map(usize::from)
    }

    /// Count a newly written entry.
    pub fn inc(&mut self, idx: usize) {
        let status = &mut self.status[idx];
        assert_lt!(status.entries as usize, L2_ENTRIES);
        status.entries += 1;
    }

    /// Count a cleared entry. Releases the table when its last entry goes,
    /// yielding the owning L1 index.
    pub fn dec(&mut self, idx: usize) -> Option<usize> {
        let status = &mut self.status[idx];
        assert_gt!(status.entries, 0);
        status.entries -= 1;
        if status.entries == 0 {
            self.release(idx)
        } else {
            None
        }
    }

    /// The table owned by an L1 entry, if any.
    pub fn find(&self, l1_index: usize) -> Option<usize> {
        self.status
            .iter()
            .position(|status| status.owner == Some(l1_index as u16))
    }

    /// A table by pool index.
    pub fn table(&self, idx: usize) -> &L2Table {
        &self.tables[idx]
    }

    /// A table by pool index, for writing.
    pub fn table_mut(&mut self, idx: usize) -> &mut L2Table {
        &mut self.tables[idx]
    }

    /// Physical address of a table under the identity mapping.
    pub fn phys_addr(&self, idx: usize) -> PhysAddr {
        PhysAddr::from_ptr(&self.tables[idx])
    }

    /// Tables available for assignment.
    pub fn free_count(&self) -> usize {
        self.free_count
    }

    /// Tables assigned to an L1 entry, counted from their status records.
    pub fn in_use(&self) -> usize {
        self.status
            .iter()
            .filter(|status| status.owner.is_some())
            .count()
    }

    /// Live entries in a table.
    pub fn entries(&self, idx: usize) -> usize {
        self.status[idx].entries as usize
    }
}
