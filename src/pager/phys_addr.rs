// SPDX-License-Identifier: Unlicense

use super::VirtAddr;

use core::fmt::{Debug, Error, Formatter};

/// A 32-bit physical address.
#[derive(Copy, Clone, PartialOrd, Ord, PartialEq, Eq)]
pub struct PhysAddr(u32);

impl Debug for PhysAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::result::Result<(), Error> {
        write!(f, "PhysAddr(0x{:08x})", self.0)
    }
}

impl PhysAddr {
    /// Construct bottom of physical address range.
    pub const fn null() -> Self {
        Self(0)
    }

    /// At literal address.
    pub const fn at(addr: u32) -> Self {
        Self(addr)
    }

    /// At virtual address, assuming identity mapping.
    pub const fn identity_mapped(virt_addr: VirtAddr) -> Self {
        Self(virt_addr.get())
    }

    /// Construct from a pointer to kernel storage.
    ///
    /// The kernel image is identity mapped so its pointers are physical
    /// addresses. Host builds truncate to the low 32 bits.
    pub fn from_ptr<T>(p: *const T) -> Self {
        Self(p as usize as u32)
    }

    /// Get address as an integer.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// A physical address that is higher than this by a given number of bytes.
    pub const fn increment(self, offset: u32) -> Self {
        Self(self.0 + offset)
    }

    /// Nearest lower or equal address with given alignment.
    pub const fn align_down(self, align: u32) -> Self {
        Self(self.0 & !(align - 1))
    }

    /// Aligned on a byte boundary.
    pub const fn is_aligned(self, align: u32) -> bool {
        self.0 & (align - 1) == 0
    }
}

/// A physical address range.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct PhysAddrRange {
    base: PhysAddr,
    length: usize,
}

impl Debug for PhysAddrRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::result::Result<(), Error> {
        write!(
            f,
            "PhysAddr(0x{:08x}..0x{:08x}, 0x{:08x})",
            self.base.0,
            self.base.0 as u64 + self.length as u64,
            self.length
        )
    }
}

impl PhysAddrRange {
    /// Construct from base and length.
    pub const fn new(base: PhysAddr, length: usize) -> Self {
        Self { base, length }
    }

    /// Get the base of the range.
    pub const fn base(self) -> PhysAddr {
        self.base
    }

    /// Length of the range in bytes.
    pub const fn length(self) -> usize {
        self.length
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
    pub const fn contains(self, phys_addr: PhysAddr) -> bool {
        self.base.0 <= phys_addr.0 && (phys_addr.0 as u64) < self.top()
    }
}
