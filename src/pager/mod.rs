// SPDX-License-Identifier: Unlicense

//! Managing virtual address space and address translation.
//!
//! The kernel owns one page directory, set up once at boot and changed at
//! runtime through `map` and `unmap`.

mod attributes;
mod layout;
mod phys_addr;
mod virt_addr;

pub use attributes::*;
pub use layout::*;
pub use phys_addr::*;
pub use virt_addr::*;

pub use crate::archs::armv7::pager::PermAttrs;

use crate::archs::{arch::Arch, armv7::PageDirectory};
use crate::util::locked::Locked;
use crate::Result;

/// Number of bytes in a small page.
pub const PAGESIZE_BYTES: usize = 4096;

/// Number of bytes mapped by a first-level section.
pub const SECTION_BYTES: usize = 1 << 20;

/// Second-level tables reserved for the kernel.
pub const NUM_L2_TABLES: usize = 32;

/// The kernel's translation tables.
pub static KERNEL_PAGE_DIRECTORY: Locked<PageDirectory<Arch, NUM_L2_TABLES>> =
    Locked::new(PageDirectory::new(Arch::new()));

/// Map the kernel image and the platform's regions, then enable translation.
pub fn init(platform: &[MappingRegion]) -> Result<()> {
    KERNEL_PAGE_DIRECTORY
        .lock()
        .init(layout::kernel_image(), platform)
}

/// Map `size` bytes of physical memory at `virt_addr`.
///
/// Panics if the range is invalid: callers pass ranges from the kernel's own
/// memory manager.
pub fn map(virt_addr: VirtAddr, phys_addr: PhysAddr, size: usize, flags: MapFlags) {
    let result = KERNEL_PAGE_DIRECTORY
        .lock()
        .map(virt_addr, phys_addr, size, flags);
    if let Err(e) = result {
        error!("map {:?} to {:?} failed: {:?}", virt_addr, phys_addr, e);
        panic!("pager::map");
    }
}

/// Remove the mappings of `size` bytes at `virt_addr`; failures are logged.
pub fn unmap(virt_addr: VirtAddr, size: usize) {
    let result = KERNEL_PAGE_DIRECTORY.lock().unmap(virt_addr, size);
    if let Err(e) = result {
        error!("unmap {:?} failed: {:?}", virt_addr, e);
    }
}

/// The physical address `virt_addr` translates to.
pub fn resolve(virt_addr: VirtAddr) -> Result<PhysAddr> {
    KERNEL_PAGE_DIRECTORY.lock().resolve(virt_addr)
}

/// Log the kernel's translation tables, unless they are locked.
pub fn dump() {
    match KERNEL_PAGE_DIRECTORY.try_lock() {
        Some(page_directory) => page_directory.dump(),
        None => warn!("page directory locked, not dumped"),
    }
}
