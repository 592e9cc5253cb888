// SPDX-License-Identifier: Unlicense

//! Live CP15 and CPSR access for ARMv7-A.

use core::arch::asm;
use core::ptr::addr_of;

use crate::archs::{HandlerTrait, PagerTrait};
use crate::pager::{VirtAddr, VirtAddrRange};

// CPSR IRQ mask
const CPSR_I: u32 = 1 << 7;

extern "C" {
    static text_base: u8;
    static text_end: u8;
    static static_base: u8;
    static static_end: u8;
    static data_base: u8;
    static data_end: u8;
    static nocache_base: u8;
    static nocache_end: u8;
}

/// Range between two linker symbols.
fn linker_range(base: *const u8, end: *const u8) -> VirtAddrRange {
    VirtAddrRange::between(
        VirtAddr::at(base as usize as u32),
        VirtAddr::at(end as usize as u32),
    )
}

/// The running CPU.
pub struct Arch {}

impl Arch {
    /// Handle on the running CPU.
    pub const fn new() -> Self {
        Self {}
    }
}

impl PagerTrait for Arch {
    fn text_image() -> VirtAddrRange {
        unsafe { linker_range(addr_of!(text_base), addr_of!(text_end)) }
    }

    fn static_image() -> VirtAddrRange {
        unsafe { linker_range(addr_of!(static_base), addr_of!(static_end)) }
    }

    fn data_image() -> VirtAddrRange {
        unsafe { linker_range(addr_of!(data_base), addr_of!(data_end)) }
    }

    fn nocache_image() -> VirtAddrRange {
        unsafe { linker_range(addr_of!(nocache_base), addr_of!(nocache_end)) }
    }

    fn invalidate_tlb_all(&mut self) {
        unsafe {
            asm!(
                "dsb",
                "mcr p15, 0, {}, c8, c7, 0", // TLBIALL
                "dsb",
                "isb",
                in(reg) 0u32,
                options(nostack, preserves_flags)
            );
        }
    }

    fn read_sctlr(&self) -> u32 {
        let value: u32;
        unsafe {
            asm!("mrc p15, 0, {}, c1, c0, 0", out(reg) value, options(nomem, nostack, preserves_flags));
        }
        value
    }

    fn write_sctlr(&mut self, value: u32) {
        unsafe {
            asm!(
                "mcr p15, 0, {}, c1, c0, 0",
                "isb",
                in(reg) value,
                options(nostack, preserves_flags)
            );
        }
    }

    fn write_ttbr0(&mut self, value: u32) {
        unsafe {
            asm!(
                "mcr p15, 0, {}, c2, c0, 0",
                "isb",
                in(reg) value,
                options(nostack, preserves_flags)
            );
        }
    }

    fn write_ttbcr(&mut self, value: u32) {
        unsafe {
            asm!(
                "mcr p15, 0, {}, c2, c0, 2",
                "isb",
                in(reg) value,
                options(nostack, preserves_flags)
            );
        }
    }

    fn write_dacr(&mut self, value: u32) {
        unsafe {
            asm!(
                "mcr p15, 0, {}, c3, c0, 0",
                "isb",
                in(reg) value,
                options(nostack, preserves_flags)
            );
        }
    }
}

impl HandlerTrait for Arch {
    fn irq_lock(&mut self) -> u32 {
        let key: u32;
        unsafe {
            asm!("mrs {}, cpsr", "cpsid i", out(reg) key, options(nostack, preserves_flags));
        }
        key
    }

    fn irq_unlock(&mut self, key: u32) {
        if key & CPSR_I == 0 {
            unsafe {
                asm!("cpsie i", options(nostack, preserves_flags));
            }
        }
    }

    fn wait_forever() -> ! {
        loop {
            unsafe { asm!("wfi", options(nomem, nostack, preserves_flags)) }
        }
    }
}
