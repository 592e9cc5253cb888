// SPDX-License-Identifier: Unlicense

//! Type-checked virtual addresses.

use super::{PhysAddr, PAGESIZE_BYTES};

use core::fmt::{Debug, Error, Formatter};

/// A 32-bit virtual address.
#[derive(Copy, Clone, PartialOrd, Ord, PartialEq, Eq)]
pub struct VirtAddr(u32);

impl Debug for VirtAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "VirtAddr(0x{:08x})", self.0)
    }
}

impl VirtAddr {
    /// Construct bottom of virtual address range.
    pub const fn null() -> Self {
        Self(0)
    }

    /// Construct at literal address.
    pub const fn at(addr: u32) -> Self {
        Self(addr)
    }

    /// The virtual address of a physical address under the kernel's identity mapping.
    pub const fn identity_mapped(phys_addr: PhysAddr) -> Self {
        Self(phys_addr.get())
    }

    /// Get the offset from memory base in bytes.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// True for the null address.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// A virtual address that is higher than this by a given number of bytes.
    pub const fn increment(self, offset: u32) -> Self {
        Self(self.0 + offset)
    }

    /// Number of bytes from this address up to a higher one.
    pub const fn increment_to(self, higher: VirtAddr) -> u32 {
        higher.0 - self.0
    }

    /// Nearest lower or equal address with given alignment.
    pub const fn align_down(self, align: u32) -> Self {
        Self(self.0 & !(align - 1))
    }

    /// Offset of the address above the nearest lower alignment boundary.
    pub const fn offset_within(self, align: u32) -> u32 {
        self.0 & (align - 1)
    }

    /// Aligned on a byte boundary.
    pub const fn is_aligned(self, align: u32) -> bool {
        self.offset_within(align) == 0
    }
}

/// A virtual address range.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct VirtAddrRange {
    base: VirtAddr,
    length: usize,
}

impl Debug for VirtAddrRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(
            f,
            "VirtAddr(0x{:08x}..0x{:08x}, 0x{:08x})",
            self.base.0,
            self.base.0 as u64 + self.length as u64,
            self.length
        )
    }
}

impl VirtAddrRange {
    /// Construct from base and length.
    pub const fn new(base: VirtAddr, length: usize) -> Self {
        Self { base, length }
    }

    /// Range between two addresses.
    pub const fn between(base: VirtAddr, top: VirtAddr) -> Self {
        Self {
            base,
            length: base.increment_to(top) as usize,
        }
    }

    /// Get the base of the range.
    pub const fn base(self) -> VirtAddr {
        self.base
    }

    /// Length of the range in bytes.
    pub const fn length(self) -> usize {
        self.length
    }

    /// True if the range covers no bytes.
    pub const fn is_empty(self) -> bool {
        self.length == 0
    }

    /// One past the last byte, widened so a range may end at 4GB.
    pub const fn top(self) -> u64 {
        self.base.0 as u64 + self.length as u64
    }

    /// True if the range lies within the 32-bit address space.
    pub const fn fits(self) -> bool {
        self.top() <= 1u64 << 32
    }

    /// True iff the address lies within the range.
    pub const fn contains(self, virt_addr: VirtAddr) -> bool {
        self.base.0 <= virt_addr.0 && (virt_addr.0 as u64) < self.top()
    }

    /// Length of the range in pages, counting partial pages at either end.
    pub const fn length_in_pages(self) -> usize {
        let first = self.base.align_down(PAGESIZE_BYTES as u32).0 as u64;
        ((self.top() - first + PAGESIZE_BYTES as u64 - 1) / PAGESIZE_BYTES as u64) as usize
    }

    /// Iterate over the base of every page the range touches.
    pub const fn pages(self) -> PageIterator {
        PageIterator {
            next: self.base.align_down(PAGESIZE_BYTES as u32).0 as u64,
            top: self.top(),
        }
    }
}

/// An iterator over the pages of a virtual address range.
pub struct PageIterator {
    next: u64,
    top: u64,
}

impl Iterator for PageIterator {
    type Item = VirtAddr;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.top {
            return None;
        }
        let result = VirtAddr(self.next as u32);
        self.next += PAGESIZE_BYTES as u64;
        Some(result)
    }
}
