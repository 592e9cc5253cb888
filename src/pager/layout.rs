// SPDX-License-Identifier: Unlicense

//! Regions mapped at boot: the kernel image and the platform's devices and RAM.

use super::{Attributes, PhysAddr, PhysAddrRange, VirtAddr, VirtAddrRange};
use crate::archs::{arch::Arch, PagerTrait};

use core::fmt::{Debug, Formatter};

/// A part of the kernel image, identity mapped at boot.
#[derive(Copy, Clone)]
pub struct FlatRange {
    /// Name for logging.
    pub name: &'static str,
    /// First byte.
    pub start: VirtAddr,
    /// One past the last byte.
    pub end: VirtAddr,
    /// Requested attributes.
    pub attrs: Attributes,
}

impl Debug for FlatRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "FlatRange {{ {}, 0x{:08x}..0x{:08x}, {:?} }}",
            self.name,
            self.start.get(),
            self.end.get(),
            self.attrs
        )
    }
}

impl FlatRange {
    /// The range as virtual addresses.
    pub const fn virt_addr_range(&self) -> VirtAddrRange {
        VirtAddrRange::between(self.start, self.end)
    }
}

/// A platform region, described by the board, always mapped with small pages.
#[derive(Copy, Clone, Debug)]
pub struct MappingRegion {
    /// Name for logging.
    pub name: &'static str,
    /// Physical base.
    pub base_pa: PhysAddr,
    /// Virtual base.
    pub base_va: VirtAddr,
    /// Length in bytes.
    pub size: usize,
    /// Requested attributes.
    pub attrs: Attributes,
}

impl MappingRegion {
    /// The region's physical extent.
    pub const fn phys_addr_range(&self) -> PhysAddrRange {
        PhysAddrRange::new(self.base_pa, self.size)
    }

    /// The region's virtual extent.
    pub const fn virt_addr_range(&self) -> VirtAddrRange {
        VirtAddrRange::new(self.base_va, self.size)
    }
}

/// Part of the kernel image and how to map it.
struct KernelExtent {
    name: &'static str,
    virt_addr_range: fn() -> VirtAddrRange,
    attributes: Attributes,
}

const KERNEL_DATA: KernelExtent = KernelExtent {
    name: "kernel_data",
    virt_addr_range: <Arch as PagerTrait>::data_image,
    attributes: Attributes::KERNEL_DATA,
};

const KERNEL_CODE: KernelExtent = KernelExtent {
    name: "kernel_code",
    virt_addr_range: <Arch as PagerTrait>::text_image,
    attributes: Attributes::KERNEL_CODE,
};

const KERNEL_RODATA: KernelExtent = KernelExtent {
    name: "kernel_rodata",
    virt_addr_range: <Arch as PagerTrait>::static_image,
    attributes: Attributes::KERNEL_RODATA,
};

#[cfg(not(feature = "nocache_memory"))]
const LAYOUT: [KernelExtent; 3] = [KERNEL_DATA, KERNEL_CODE, KERNEL_RODATA];

#[cfg(feature = "nocache_memory")]
const LAYOUT: [KernelExtent; 4] = [
    KERNEL_DATA,
    KERNEL_CODE,
    KERNEL_RODATA,
    KernelExtent {
        name: "nocache_data",
        virt_addr_range: <Arch as PagerTrait>::nocache_image,
        attributes: Attributes::NOCACHE_DATA,
    },
];

/// Iterate over the kernel image's flat ranges.
pub fn kernel_image() -> impl Iterator<Item = FlatRange> {
    LAYOUT.iter().map(|extent| {
        let range = (extent.virt_addr_range)();
        FlatRange {
            name: extent.name,
            start: range.base(),
            end: range.base().increment(range.length() as u32),
            attrs: extent.attributes,
        }
    })
}
