// SPDX-License-Identifier: Unlicense

//! Interface for paging functions.

use crate::pager::VirtAddrRange;

/// Each architecture must supply the following entry points for paging.
///
/// The image ranges come from the linker script. The register accessors act
/// on the running CPU, so a page directory owns an instance through which all
/// of its system register traffic flows.
pub trait PagerTrait {
    /// Kernel code.
    fn text_image() -> VirtAddrRange;

    /// Kernel read-only data.
    fn static_image() -> VirtAddrRange;

    /// Kernel data, bss and noinit.
    fn data_image() -> VirtAddrRange;

    /// Kernel data that bypasses the caches.
    fn nocache_image() -> VirtAddrRange;

    /// Invalidate every unified TLB entry and wait for completion.
    fn invalidate_tlb_all(&mut self);

    /// Read the system control register.
    fn read_sctlr(&self) -> u32;

    /// Write the system control register.
    fn write_sctlr(&mut self, value: u32);

    /// Write translation table base register 0.
    fn write_ttbr0(&mut self, value: u32);

    /// Write the translation table base control register.
    fn write_ttbcr(&mut self, value: u32);

    /// Write the domain access control register.
    fn write_dacr(&mut self, value: u32);
}
